use super::{Cadence, FaultPolicy, Shared};
use crate::error::Error;
use crate::runtime::yield_now::yield_now;
use crate::time::instrumented::instrumented;
use crate::time::sleep::{Sleep, sleep};

use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll};
use std::time::Instant;

/// Clears the re-entrancy flag when the loop ends, whether it returns,
/// is dropped with the runtime or unwinds out of the callback.
struct Running<'a> {
    shared: &'a Shared,
}

impl Drop for Running<'_> {
    fn drop(&mut self) {
        self.shared.locked.set(false);
        self.shared.waker.borrow_mut().take();

        log::debug!("interval loop ended after {} tick(s)", self.shared.ticks.get());
    }
}

/// Body of the loop task spawned by `Interval::start`.
pub(super) async fn run(shared: Rc<Shared>) {
    let _running = Running { shared: &shared };

    while shared.active.get() {
        // Every handle is gone and no repeat count will end the loop.
        if shared.remaining.get().is_none() && Rc::strong_count(&shared) == 1 {
            shared.active.set(false);
            break;
        }

        shared.last_tick.set(Some(Instant::now()));

        let tick = {
            let mut callback = shared.callback.borrow_mut();
            (*callback)()
        };
        let (result, elapsed) = instrumented(tick).await;

        let count = shared.ticks.get() + 1;
        shared.ticks.set(count);
        log::trace!("interval tick {count} took {elapsed:?}");

        if let Err(err) = result {
            log::warn!("interval callback failed on tick {count}: {err}");
            shared.record_error(Error::Callback(err));

            if shared.policy == FaultPolicy::Stop {
                shared.active.set(false);
            }
        }

        if let Some(left) = shared.remaining.get() {
            let left = left.saturating_sub(1);
            shared.remaining.set(Some(left));

            if left == 0 {
                shared.active.set(false);
            }
        }

        if !shared.active.get() {
            break;
        }

        let wait = match shared.cadence {
            Cadence::Spaced => shared.period,
            Cadence::FixedDelay => shared.period.saturating_sub(elapsed),
        };

        if wait.is_zero() {
            yield_now().await;
        } else {
            Pause {
                sleep: sleep(wait),
                shared: &shared,
            }
            .await;
        }
    }
}

/// Wait between two ticks, cut short by `Interval::stop`.
struct Pause<'a> {
    sleep: Sleep,
    shared: &'a Shared,
}

impl Future for Pause<'_> {
    type Output = ();

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        let this = self.get_mut();

        if !this.shared.active.get() || Pin::new(&mut this.sleep).poll(cx).is_ready() {
            this.shared.waker.borrow_mut().take();
            return Poll::Ready(());
        }

        *this.shared.waker.borrow_mut() = Some(cx.waker().clone());
        Poll::Pending
    }
}
