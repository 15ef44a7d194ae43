//! Local task executor.
//!
//! This module contains the components that run spawned tasks on the
//! runtime thread:
//! - [`core`]: task storage and polling,
//! - [`ready`]: the queue of woken tasks, shared with wakers.

pub(crate) mod core;
pub(crate) mod ready;

pub(crate) use core::Executor;
pub(crate) use ready::ReadyQueue;
