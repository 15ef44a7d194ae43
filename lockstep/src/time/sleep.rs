use crate::reactor::timer::Timer;
use crate::runtime::context;

use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll};
use std::time::{Duration, Instant};

/// Creates a future that completes after the given duration.
///
/// The returned sleep future registers a timer with the current
/// runtime and completes once the duration has elapsed. It never
/// completes early; it may complete late if the runtime is busy.
///
/// # Panics
///
/// Panics if polled outside of a running runtime.
///
/// # Examples
///
/// ```rust,ignore
/// use std::time::Duration;
///
/// sleep(Duration::from_millis(10)).await;
/// ```
pub fn sleep(duration: Duration) -> Sleep {
    Sleep::new(duration)
}

/// A future that completes once a specific deadline is reached.
///
/// The deadline is fixed when the future is **created**; the timer is
/// registered with the runtime on the first poll. Dropping the future
/// cancels the timer.
#[must_use = "futures do nothing unless awaited"]
pub struct Sleep {
    /// Absolute point in time when the sleep completes.
    deadline: Instant,

    /// Timer registered with the reactor, once polled.
    timer: Option<Rc<Timer>>,
}

impl Sleep {
    /// Creates a new `Sleep` future that completes after `duration`.
    pub(crate) fn new(duration: Duration) -> Self {
        Self {
            deadline: Instant::now() + duration,
            timer: None,
        }
    }

    /// The instant this sleep completes at.
    pub fn deadline(&self) -> Instant {
        self.deadline
    }

    /// Returns `true` once the deadline has been reached.
    pub fn is_elapsed(&self) -> bool {
        self.timer.as_ref().is_some_and(|t| t.has_fired()) || Instant::now() >= self.deadline
    }
}

impl Future for Sleep {
    type Output = ();

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();

        if this.is_elapsed() {
            return Poll::Ready(());
        }

        match &this.timer {
            Some(timer) => timer.register(cx.waker()),
            None => {
                let core = context::current().expect("Sleep polled outside of runtime");

                let timer = Timer::new();
                timer.register(cx.waker());
                core.schedule_timer(this.deadline, timer.clone());

                this.timer = Some(timer);
            }
        }

        Poll::Pending
    }
}

impl Drop for Sleep {
    /// Cancels the timer so an abandoned sleep never wakes its task.
    fn drop(&mut self) {
        if let Some(timer) = &self.timer {
            timer.cancel();
        }
    }
}
