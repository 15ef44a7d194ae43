use super::{Cadence, FaultPolicy, Interval, boxed};
use crate::error::Result;

use std::future::Future;
use std::time::Duration;

/// Builder for [`Interval`].
///
/// # Examples
///
/// ```rust,ignore
/// let interval = Interval::builder(Duration::from_secs(1))
///     .cadence(Cadence::Spaced)
///     .fault_policy(FaultPolicy::Stop)
///     .auto_start(None)
///     .build(|| async { poll_upstream().await })?;
/// ```
#[derive(Clone, Debug)]
pub struct IntervalBuilder {
    period: Duration,
    cadence: Cadence,
    policy: FaultPolicy,

    /// `Some(repeat)` starts the interval as soon as it is built.
    auto_start: Option<Option<u32>>,
}

impl IntervalBuilder {
    pub(crate) fn new(period: Duration) -> Self {
        Self {
            period,
            cadence: Cadence::default(),
            policy: FaultPolicy::default(),
            auto_start: None,
        }
    }

    /// Sets how the wait between ticks is measured.
    ///
    /// Defaults to [`Cadence::FixedDelay`].
    pub fn cadence(mut self, cadence: Cadence) -> Self {
        self.cadence = cadence;
        self
    }

    /// Sets what happens when the callback fails.
    ///
    /// Defaults to [`FaultPolicy::Continue`].
    pub fn fault_policy(mut self, policy: FaultPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Starts the interval from [`build`](Self::build), as
    /// [`Interval::start`] would with `repeat`.
    pub fn auto_start(mut self, repeat: Option<u32>) -> Self {
        self.auto_start = Some(repeat);
        self
    }

    /// Creates the interval.
    ///
    /// # Errors
    ///
    /// Fails with [`Error::NoRuntime`](crate::Error::NoRuntime) when
    /// auto-start was requested outside of a runtime.
    pub fn build<F, Fut, E>(self, callback: F) -> Result<Interval>
    where
        F: FnMut() -> Fut + 'static,
        Fut: Future<Output = std::result::Result<(), E>> + 'static,
        E: Into<Box<dyn std::error::Error>> + 'static,
    {
        let interval = Interval::with_parts(self.period, self.cadence, self.policy, boxed(callback));

        if let Some(repeat) = self.auto_start {
            interval.start(repeat)?;
        }

        Ok(interval)
    }
}
