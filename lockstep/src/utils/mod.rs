//! Internal data structures.
//!
//! Currently only the [`Slab`] allocator the executor stores task futures
//! in: indexed storage with reuse of freed slots.

mod slab;

pub(crate) use slab::Slab;
