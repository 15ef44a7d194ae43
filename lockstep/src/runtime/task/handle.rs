use std::cell::{Cell, RefCell};
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll, Waker};

/// Output slot shared between a spawned task and its [`JoinHandle`].
pub(crate) struct JoinState<T> {
    /// The task output, until the handle takes it.
    value: RefCell<Option<T>>,

    /// Whether the task has produced its output.
    finished: Cell<bool>,

    /// Waker of the task awaiting the handle.
    waiter: RefCell<Option<Waker>>,
}

impl<T> JoinState<T> {
    pub(crate) fn new() -> Rc<Self> {
        Rc::new(Self {
            value: RefCell::new(None),
            finished: Cell::new(false),
            waiter: RefCell::new(None),
        })
    }

    /// Stores the task output and wakes the awaiting task, if any.
    pub(crate) fn complete(&self, value: T) {
        *self.value.borrow_mut() = Some(value);
        self.finished.set(true);

        let waiter = self.waiter.borrow_mut().take();
        if let Some(waker) = waiter {
            waker.wake();
        }
    }
}

/// A handle to a spawned task.
///
/// `JoinHandle` resolves to the task output once it completes.
///
/// Dropping the handle does **not** cancel the task; it only discards
/// the ability to observe its result.
pub struct JoinHandle<T> {
    pub(crate) state: Rc<JoinState<T>>,
}

impl<T> JoinHandle<T> {
    /// Returns `true` once the task has produced its output.
    pub fn is_finished(&self) -> bool {
        self.state.finished.get()
    }
}

impl<T> Future for JoinHandle<T> {
    type Output = T;

    /// # Panics
    ///
    /// Panics if polled again after it returned the output.
    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<T> {
        if self.state.finished.get() {
            let value = self
                .state
                .value
                .borrow_mut()
                .take()
                .expect("JoinHandle polled after completion");
            return Poll::Ready(value);
        }

        *self.state.waiter.borrow_mut() = Some(cx.waker().clone());
        Poll::Pending
    }
}
