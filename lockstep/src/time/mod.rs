//! Time utilities.
//!
//! This module provides time-related asynchronous utilities that
//! integrate with the runtime reactor.
//!
//! It includes:
//! - [`sleep`] for scheduling timers,
//! - [`timeout`] for bounding future execution time,
//! - [`instrumented`] for measuring how long a future takes,
//! - [`Interval`] for running a periodic callback that never overlaps
//!   itself.

mod instrumented;
mod interval;
mod sleep;
mod timeout;

#[doc(inline)]
pub use instrumented::{Instrumented, instrumented};

#[doc(inline)]
pub use interval::{Cadence, FaultPolicy, Interval, IntervalBuilder};

#[doc(inline)]
pub use sleep::{Sleep, sleep};

#[doc(inline)]
pub use timeout::{Timeout, timeout};
