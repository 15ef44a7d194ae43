//! Core runtime components.
//!
//! This module contains the single-threaded host the primitives run on:
//! - executing local tasks on the calling thread,
//! - keeping the ready queue wakers push to,
//! - providing the thread-local runtime context,
//! - enabling cooperative multitasking via yielding.
//!
//! Most users will interact with higher-level APIs built on top of
//! these components rather than using this module directly.

mod core;
mod executor;

pub(crate) mod builder;
pub(crate) mod context;
pub(crate) mod yield_now;

pub mod task;

pub use core::Runtime;
pub(crate) use core::Core;
