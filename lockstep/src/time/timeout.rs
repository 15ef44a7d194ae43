use crate::error::{Error, Result};
use crate::time::sleep::{Sleep, sleep};

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;

/// Bounds the execution time of a future.
///
/// Resolves to `Ok(output)` when `future` completes first and to
/// `Err(Error::Elapsed)` once `duration` has passed. The wrapped future
/// is polled before the deadline is checked, so a future ready at the
/// deadline still wins.
///
/// # Examples
///
/// ```rust,ignore
/// match timeout(Duration::from_millis(20), slow_call()).await {
///     Ok(value) => println!("got {value}"),
///     Err(err) => println!("gave up: {err}"),
/// }
/// ```
pub fn timeout<F>(duration: Duration, future: F) -> Timeout<F>
where
    F: Future,
{
    Timeout::new(duration, future)
}

/// Future returned by [`timeout`].
#[must_use = "futures do nothing unless awaited"]
pub struct Timeout<F> {
    future: F,
    sleep: Sleep,
}

impl<F> Timeout<F> {
    pub(crate) fn new(duration: Duration, future: F) -> Self {
        Timeout {
            future,
            sleep: sleep(duration),
        }
    }
}

impl<F> Future for Timeout<F>
where
    F: Future,
{
    type Output = Result<F::Output>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        // Safety: `future` is never moved out of the pinned `Timeout`.
        let this = unsafe { self.get_unchecked_mut() };

        let future = unsafe { Pin::new_unchecked(&mut this.future) };
        if let Poll::Ready(val) = future.poll(cx) {
            return Poll::Ready(Ok(val));
        }

        if Pin::new(&mut this.sleep).poll(cx).is_ready() {
            return Poll::Ready(Err(Error::Elapsed));
        }

        Poll::Pending
    }
}
