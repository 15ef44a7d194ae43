//! Periodic callback scheduling.
//!
//! An [`Interval`] owns a callback and drives it from a single background
//! task. Invocation `n + 1` never starts before invocation `n` has
//! completed, whatever the cadence, and a second [`Interval::start`] while
//! the loop is alive only updates the state that loop observes.

mod builder;
mod run;

pub use builder::IntervalBuilder;

use crate::error::{Error, Result};
use crate::runtime::task;

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::task::Waker;
use std::time::{Duration, Instant};

/// How the wait between two ticks is measured.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Cadence {
    /// Wait the full period after each invocation completes.
    Spaced,

    /// Start ticks a period apart, measured from the start of the previous
    /// tick. The time the callback took is subtracted from the wait; a
    /// callback slower than the period is followed by a single yield.
    #[default]
    FixedDelay,
}

/// What the loop does when the callback returns an error.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FaultPolicy {
    /// Record the error and keep ticking.
    #[default]
    Continue,

    /// Record the error and stop the loop.
    Stop,
}

type TickFuture = Pin<Box<dyn Future<Output = std::result::Result<(), Box<dyn std::error::Error>>>>>;
type Callback = Box<dyn FnMut() -> TickFuture>;

/// State shared between the handles and the loop task.
pub(crate) struct Shared {
    period: Duration,
    cadence: Cadence,
    policy: FaultPolicy,
    callback: RefCell<Callback>,

    /// The loop should keep ticking.
    active: Cell<bool>,

    /// A loop task is alive.
    locked: Cell<bool>,

    last_tick: Cell<Option<Instant>>,
    remaining: Cell<Option<u32>>,
    ticks: Cell<u64>,

    /// Callback failures not yet collected by `take_errors`, oldest first.
    errors: RefCell<VecDeque<Error>>,

    /// Waker of the loop while it waits between two ticks.
    waker: RefCell<Option<Waker>>,
}

impl Shared {
    /// Stores a callback failure, discarding the oldest one when full.
    fn record_error(&self, err: Error) {
        let mut errors = self.errors.borrow_mut();

        if errors.len() == Interval::ERROR_CAPACITY {
            errors.pop_front();
            log::warn!("interval error channel full, oldest error discarded");
        }

        errors.push_back(err);
    }
}

/// A periodic, non-overlapping callback.
///
/// `Interval` is a cheap handle: clones share the same loop and state. The
/// loop itself runs as a task on the runtime current when
/// [`start`](Self::start) is called. Once every handle has been dropped an
/// unbounded loop ends at its next tick boundary; a bounded one still runs
/// its remaining invocations.
///
/// # Examples
///
/// ```rust,ignore
/// use lockstep::time::{Cadence, Interval};
/// use std::time::Duration;
///
/// let interval = Interval::new(Duration::from_millis(100), Cadence::FixedDelay, || async {
///     println!("tick");
///     Ok::<_, std::io::Error>(())
/// });
///
/// interval.start(Some(3))?;
/// ```
#[derive(Clone)]
pub struct Interval {
    shared: Rc<Shared>,
}

impl Interval {
    /// Callback failures kept before the oldest are discarded.
    pub const ERROR_CAPACITY: usize = 64;

    /// Creates a stopped interval.
    ///
    /// The callback is invoked once per tick and awaited before the next
    /// wait begins. An `Err` it returns ends the tick and is handled
    /// according to the [`FaultPolicy`] (`Continue` here; use
    /// [`builder`](Self::builder) to change it).
    pub fn new<F, Fut, E>(period: Duration, cadence: Cadence, callback: F) -> Self
    where
        F: FnMut() -> Fut + 'static,
        Fut: Future<Output = std::result::Result<(), E>> + 'static,
        E: Into<Box<dyn std::error::Error>> + 'static,
    {
        Self::with_parts(period, cadence, FaultPolicy::default(), boxed(callback))
    }

    /// Returns a builder for an interval ticking every `period`.
    pub fn builder(period: Duration) -> IntervalBuilder {
        IntervalBuilder::new(period)
    }

    fn with_parts(period: Duration, cadence: Cadence, policy: FaultPolicy, callback: Callback) -> Self {
        Self {
            shared: Rc::new(Shared {
                period,
                cadence,
                policy,
                callback: RefCell::new(callback),
                active: Cell::new(false),
                locked: Cell::new(false),
                last_tick: Cell::new(None),
                remaining: Cell::new(None),
                ticks: Cell::new(0),
                errors: RefCell::new(VecDeque::new()),
                waker: RefCell::new(None),
            }),
        }
    }

    /// Activates the interval.
    ///
    /// With `Some(n)`, `n > 0`, the loop stops by itself after `n` more
    /// invocations; `None` and `Some(0)` run until [`stop`](Self::stop).
    ///
    /// A loop task is spawned on the current runtime only if none is
    /// alive. Otherwise the running loop picks up the new state at its
    /// next tick boundary, so two invocations never overlap.
    ///
    /// # Errors
    ///
    /// [`Error::NoRuntime`] if a loop has to be spawned outside of a
    /// runtime. The interval is left stopped in that case.
    pub fn start(&self, repeat: Option<u32>) -> Result<()> {
        let shared = &self.shared;

        shared.remaining.set(repeat.filter(|n| *n > 0));
        shared.active.set(true);

        if shared.locked.get() {
            log::trace!("interval already running, state updated");
            return Ok(());
        }

        shared.locked.set(true);

        match task::try_spawn(run::run(shared.clone())) {
            Ok(_detached) => {
                log::debug!(
                    "interval started: every {:?} ({:?}), repeat {:?}",
                    shared.period,
                    shared.cadence,
                    shared.remaining.get()
                );
                Ok(())
            }
            Err(err) => {
                shared.locked.set(false);
                shared.active.set(false);
                Err(err)
            }
        }
    }

    /// Asks the loop to end.
    ///
    /// An invocation in flight runs to completion; a loop waiting for its
    /// next tick is woken and exits without invoking the callback again.
    pub fn stop(&self) {
        if !self.shared.active.replace(false) {
            return;
        }

        log::debug!("interval stop requested");

        let waker = self.shared.waker.borrow_mut().take();
        if let Some(waker) = waker {
            waker.wake();
        }
    }

    /// Whether the interval is meant to keep ticking.
    pub fn is_active(&self) -> bool {
        self.shared.active.get()
    }

    /// Whether a loop task is alive for this interval.
    pub fn is_locked(&self) -> bool {
        self.shared.locked.get()
    }

    /// Start time of the most recent invocation.
    pub fn last_tick(&self) -> Option<Instant> {
        self.shared.last_tick.get()
    }

    /// Invocations left before the loop stops, if bounded.
    pub fn remaining(&self) -> Option<u32> {
        self.shared.remaining.get()
    }

    pub fn cadence(&self) -> Cadence {
        self.shared.cadence
    }

    pub fn is_spaced(&self) -> bool {
        self.shared.cadence == Cadence::Spaced
    }

    pub fn period(&self) -> Duration {
        self.shared.period
    }

    /// Number of completed invocations, failed ones included.
    pub fn ticks(&self) -> u64 {
        self.shared.ticks.get()
    }

    /// Drains the errors returned by the callback so far, oldest first.
    ///
    /// At most [`ERROR_CAPACITY`](Self::ERROR_CAPACITY) errors are kept
    /// between two calls.
    pub fn take_errors(&self) -> Vec<Error> {
        self.shared.errors.take().into()
    }
}

fn boxed<F, Fut, E>(mut callback: F) -> Callback
where
    F: FnMut() -> Fut + 'static,
    Fut: Future<Output = std::result::Result<(), E>> + 'static,
    E: Into<Box<dyn std::error::Error>> + 'static,
{
    Box::new(move || {
        let tick = callback();
        Box::pin(async move { tick.await.map_err(Into::into) })
    })
}
