//! Local task primitives.
//!
//! This module defines how the runtime represents and schedules tasks:
//! - task state management and scheduling headers,
//! - custom waker integration,
//! - join handles for awaiting task completion.
//!
//! Most users will interact with this module through [`spawn`] and
//! [`JoinHandle`]; the lower-level components are used internally by the
//! executor.

pub(crate) mod handle;
pub(crate) mod state;
pub(crate) mod waker;

mod core;

pub(crate) use core::{Task, TaskId};
pub(crate) use handle::JoinState;

pub use core::{spawn, try_spawn};
pub use handle::JoinHandle;
