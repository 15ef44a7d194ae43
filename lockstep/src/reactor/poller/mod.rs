//! Platform-specific thread parking.
//!
//! The runtime thread parks here whenever no task is ready, until either
//! the nearest timer deadline is reached or a waker fires, possibly from
//! another OS thread.
//!
//! Both backends expose the same interface:
//! - `Parker::new()` creates the primitive,
//! - `Parker::park(timeout)` blocks the runtime thread,
//! - `Parker::unparker()` hands out the `Send + Sync` wake side.
//!
//! The concrete implementation is selected at compile time.

#[cfg(target_os = "linux")]
mod epoll;

#[cfg(not(target_os = "linux"))]
mod condvar;

#[cfg(target_os = "linux")]
pub(crate) use epoll::{Parker, Unparker};

#[cfg(not(target_os = "linux"))]
pub(crate) use condvar::{Parker, Unparker};
