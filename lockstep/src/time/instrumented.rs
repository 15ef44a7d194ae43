use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::{Duration, Instant};

/// Wraps a future and measures the time it takes to complete.
///
/// The returned future resolves to `(output, elapsed)`, timing from the
/// **first poll**, not from construction. The interval scheduler uses it
/// to time each callback invocation.
///
/// # Examples
///
/// ```rust,ignore
/// let (value, elapsed) = instrumented(async { 42 }).await;
/// println!("Completed in {:?}", elapsed);
/// ```
pub fn instrumented<F>(future: F) -> Instrumented<F> {
    Instrumented {
        future,
        start: None,
    }
}

/// A future that measures the execution time of another future.
///
/// Dropping it before completion discards the measurement.
#[must_use = "futures do nothing unless awaited"]
pub struct Instrumented<F> {
    future: F,

    /// Instant of the first poll.
    start: Option<Instant>,
}

impl<F> Instrumented<F> {
    /// Instant of the first poll, `None` until then.
    pub fn started_at(&self) -> Option<Instant> {
        self.start
    }
}

impl<F: Future> Future for Instrumented<F> {
    type Output = (F::Output, Duration);

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        // Safety: the wrapped future is never moved after being pinned.
        let this = unsafe { self.get_unchecked_mut() };

        let start = *this.start.get_or_insert_with(Instant::now);

        match unsafe { Pin::new_unchecked(&mut this.future) }.poll(cx) {
            Poll::Pending => Poll::Pending,
            Poll::Ready(output) => Poll::Ready((output, start.elapsed())),
        }
    }
}
