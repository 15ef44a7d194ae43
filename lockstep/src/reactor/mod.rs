//! Timer driver and thread parking.
//!
//! The reactor lives on the runtime thread and is responsible for:
//! - keeping the timer queue ordered by deadline,
//! - firing expired timers (running expiry callbacks, waking tasks),
//! - parking the thread until the next deadline or an external wake-up.
//!
//! Most runtime users do not interact with the reactor directly;
//! it is an internal component used by [`sleep`](crate::time::sleep),
//! the mutex acquisition timeout and the interval scheduler.

mod core;
mod poller;

pub(crate) mod timer;

pub(crate) use core::Reactor;
pub(crate) use poller::Unparker;
