use super::waiter::{Waiter, WaiterState};
use crate::error::{Error, Result};
use crate::reactor::timer::Timer;
use crate::runtime::context;

use std::cell::{Cell, RefCell, UnsafeCell};
use std::collections::VecDeque;
use std::future::Future;
use std::ops::{Deref, DerefMut};
use std::pin::Pin;
use std::rc::{Rc, Weak};
use std::task::{Context, Poll};
use std::time::{Duration, Instant};

/// An asynchronous, strictly FIFO mutex.
///
/// Every request joins a queue in arrival order; the head of the queue is
/// the holder. Releasing the lock hands it to the next waiter that has
/// not given up, so a waiter that arrived later is never granted ahead of
/// an earlier one.
///
/// A request may carry a timeout: if it is still waiting when the timeout
/// fires it is refused, and [`acquire`](Self::acquire) resolves to `None`.
/// Refusal is an ordinary outcome, not an error.
///
/// The mutex is meant to be shared between the local tasks of one
/// runtime, typically through an `Rc`.
///
/// # Examples
///
/// ```rust,ignore
/// let mutex = Rc::new(Mutex::new(Vec::new()));
///
/// match mutex.acquire(Some(Duration::from_millis(50))).await {
///     Some(mut guard) => guard.push(1),
///     None => println!("gave up"),
/// }
/// ```
pub struct Mutex<T = ()> {
    /// Holder first, then pending and refused waiters in arrival order.
    waiters: RefCell<VecDeque<Rc<Waiter>>>,

    next_id: Cell<u64>,

    /// The protected value. Only the holder's guard reaches it.
    data: UnsafeCell<T>,
}

impl<T> Mutex<T> {
    /// Creates an unlocked mutex wrapping `value`.
    pub fn new(value: T) -> Self {
        Self {
            waiters: RefCell::new(VecDeque::new()),
            next_id: Cell::new(0),
            data: UnsafeCell::new(value),
        }
    }

    /// Requests the lock.
    ///
    /// The request joins the queue immediately, not on first poll, and is
    /// granted right away if the queue was empty. Otherwise the returned
    /// future waits for its turn.
    ///
    /// With `Some(timeout)` and a non-zero duration, a request still
    /// waiting once `timeout` has passed is refused and the future
    /// resolves to `None`. `None` and `Some(Duration::ZERO)` wait for as
    /// long as it takes. A request granted on arrival never times out.
    ///
    /// Dropping the future before it resolves withdraws the request; if it
    /// had already been granted, the lock passes on.
    ///
    /// # Panics
    ///
    /// Polling a request with a timeout outside of a runtime panics.
    pub fn acquire(&self, timeout: Option<Duration>) -> Acquire<'_, T> {
        let id = self.next_id.get();
        self.next_id.set(id + 1);

        let mut waiters = self.waiters.borrow_mut();

        let (state, deadline) = if waiters.is_empty() {
            log::trace!("mutex: waiter {id} granted on arrival");
            (WaiterState::Granted, None)
        } else {
            let deadline = timeout
                .filter(|timeout| !timeout.is_zero())
                .map(|timeout| Instant::now() + timeout);
            (WaiterState::Pending, deadline)
        };

        let waiter = Waiter::new(id, state);
        waiters.push_back(waiter.clone());

        Acquire {
            mutex: self,
            waiter,
            deadline,
            done: false,
        }
    }

    /// Waits for the lock without a timeout.
    pub fn lock(&self) -> Lock<'_, T> {
        Lock {
            acquire: self.acquire(None),
        }
    }

    /// Takes the lock only if nobody holds or waits for it.
    ///
    /// # Errors
    ///
    /// [`Error::WouldBlock`] if the queue is not empty. The call never
    /// joins the queue.
    pub fn try_lock(&self) -> Result<MutexGuard<'_, T>> {
        if !self.waiters.borrow().is_empty() {
            return Err(Error::WouldBlock);
        }

        let mut acquire = self.acquire(None);
        debug_assert_eq!(acquire.waiter.state(), WaiterState::Granted);
        acquire.done = true;

        Ok(self.guard())
    }

    /// Runs `on_granted` while holding the lock, or `on_refused` if the
    /// request times out.
    ///
    /// The lock is held for the whole of `on_granted` and released exactly
    /// once afterwards, also when `on_granted` panics or the returned
    /// future is dropped midway.
    ///
    /// # Examples
    ///
    /// ```rust,ignore
    /// let saved = mutex
    ///     .acquire_with(
    ///         Some(Duration::from_millis(100)),
    ///         || async { save().await; true },
    ///         || async { false },
    ///     )
    ///     .await;
    /// ```
    pub async fn acquire_with<G, GF, R, RF, O>(
        &self,
        timeout: Option<Duration>,
        on_granted: G,
        on_refused: R,
    ) -> O
    where
        G: FnOnce() -> GF,
        GF: Future<Output = O>,
        R: FnOnce() -> RF,
        RF: Future<Output = O>,
    {
        match self.acquire(timeout).await {
            Some(guard) => {
                let output = on_granted().await;
                guard.release();
                output
            }
            None => on_refused().await,
        }
    }

    /// Returns `true` while someone holds or waits for the lock.
    pub fn locked(&self) -> bool {
        self.queue_len() > 0
    }

    /// Number of requests holding or waiting for the lock.
    ///
    /// Requests that timed out or were withdrawn are not counted, even
    /// before they leave the queue.
    pub fn queue_len(&self) -> usize {
        self.waiters
            .borrow()
            .iter()
            .filter(|waiter| !waiter.is_refused())
            .count()
    }

    /// Consumes the mutex, returning the protected value.
    pub fn into_inner(self) -> T {
        self.data.into_inner()
    }

    /// Exclusive access without locking, statically guaranteed by `&mut`.
    pub fn get_mut(&mut self) -> &mut T {
        self.data.get_mut()
    }

    fn guard(&self) -> MutexGuard<'_, T> {
        MutexGuard { mutex: self }
    }

    /// Removes the holder and grants the next waiter still pending.
    ///
    /// Refused waiters met on the way are discarded: they will never
    /// release a lock they did not get.
    fn release(&self) {
        let next = {
            let mut waiters = self.waiters.borrow_mut();

            let Some(holder) = waiters.pop_front() else {
                debug_assert!(false, "mutex released while unlocked");
                log::error!("mutex: release called on an empty queue");
                return;
            };
            log::trace!("mutex: waiter {} released", holder.id());

            loop {
                match waiters.front() {
                    Some(waiter) if waiter.is_refused() => {
                        log::trace!("mutex: skipping refused waiter {}", waiter.id());
                        waiters.pop_front();
                    }
                    next => break next.cloned(),
                }
            }
        };

        if let Some(waiter) = next {
            if waiter.grant() {
                log::trace!("mutex: waiter {} granted", waiter.id());
            }
        }
    }

    /// Drops a settled-against waiter from wherever it sits in the queue.
    fn remove(&self, waiter: &Rc<Waiter>) {
        let mut waiters = self.waiters.borrow_mut();

        if let Some(index) = waiters.iter().position(|w| Rc::ptr_eq(w, waiter)) {
            waiters.remove(index);
        }
    }
}

impl<T: Default> Default for Mutex<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

/// Future returned by [`Mutex::acquire`].
///
/// Resolves to `Some(guard)` once granted, `None` once refused.
#[must_use = "dropping the request withdraws it from the queue"]
pub struct Acquire<'a, T> {
    mutex: &'a Mutex<T>,
    waiter: Rc<Waiter>,

    /// Refusal deadline, until the timer is armed on first poll.
    deadline: Option<Instant>,

    /// The outcome was handed to the caller.
    done: bool,
}

impl<'a, T> Future for Acquire<'a, T> {
    type Output = Option<MutexGuard<'a, T>>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        assert!(!this.done, "Acquire polled after completion");

        match this.waiter.state() {
            WaiterState::Granted => {
                this.done = true;
                Poll::Ready(Some(this.mutex.guard()))
            }
            WaiterState::Refused => {
                this.done = true;
                this.mutex.remove(&this.waiter);
                Poll::Ready(None)
            }
            WaiterState::Pending => {
                this.waiter.register(cx.waker());

                if let Some(deadline) = this.deadline.take() {
                    let core = context::current().expect("Acquire polled outside of runtime");

                    let waiter = Rc::downgrade(&this.waiter);
                    let timer = Timer::with_callback(move || refuse_on_timeout(&waiter));

                    this.waiter.arm(timer.clone());
                    core.schedule_timer(deadline, timer);
                }

                Poll::Pending
            }
        }
    }
}

impl<T> Drop for Acquire<'_, T> {
    fn drop(&mut self) {
        if self.done {
            return;
        }

        match self.waiter.state() {
            WaiterState::Pending => {
                self.waiter.refuse();
                log::trace!("mutex: waiter {} withdrawn", self.waiter.id());
                self.mutex.remove(&self.waiter);
            }
            // Granted but never observed: the lock is ours to pass on.
            WaiterState::Granted => self.mutex.release(),
            WaiterState::Refused => self.mutex.remove(&self.waiter),
        }
    }
}

fn refuse_on_timeout(waiter: &Weak<Waiter>) {
    if let Some(waiter) = waiter.upgrade() {
        if waiter.refuse() {
            log::trace!("mutex: waiter {} timed out", waiter.id());
        }
    }
}

/// Future returned by [`Mutex::lock`].
#[must_use = "dropping the request withdraws it from the queue"]
pub struct Lock<'a, T> {
    acquire: Acquire<'a, T>,
}

impl<'a, T> Future for Lock<'a, T> {
    type Output = MutexGuard<'a, T>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match Pin::new(&mut self.acquire).poll(cx) {
            Poll::Ready(Some(guard)) => Poll::Ready(guard),
            Poll::Ready(None) => unreachable!("a request without timeout is never refused"),
            Poll::Pending => Poll::Pending,
        }
    }
}

/// Proof of holding the lock, giving access to the protected value.
///
/// The lock is released when the guard is dropped, or explicitly through
/// [`release`](Self::release).
#[must_use = "if unused the mutex is released immediately"]
pub struct MutexGuard<'a, T> {
    mutex: &'a Mutex<T>,
}

impl<T> MutexGuard<'_, T> {
    /// Releases the lock, granting it to the next waiter.
    pub fn release(self) {
        drop(self);
    }
}

impl<T> Drop for MutexGuard<'_, T> {
    fn drop(&mut self) {
        self.mutex.release();
    }
}

impl<T> Deref for MutexGuard<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        // Safety: the guard exists only while its waiter heads the queue,
        // and there is a single head.
        unsafe { &*self.mutex.data.get() }
    }
}

impl<T> DerefMut for MutexGuard<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        // Safety: see `deref`; `&mut self` rules out a second borrow
        // through this guard.
        unsafe { &mut *self.mutex.data.get() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::task::Waker;

    fn poll_once<F: Future + Unpin>(future: &mut F) -> Poll<F::Output> {
        let mut cx = Context::from_waker(Waker::noop());
        Pin::new(future).poll(&mut cx)
    }

    #[test]
    fn release_skips_refused_waiters() {
        let mutex = Mutex::new(());
        let holder = mutex.try_lock().unwrap();

        let mut second = mutex.acquire(None);
        let mut third = mutex.acquire(None);
        assert!(poll_once(&mut second).is_pending());
        assert!(poll_once(&mut third).is_pending());

        // What the deadline timer does when it fires.
        second.waiter.refuse();
        assert_eq!(mutex.queue_len(), 2);

        holder.release();

        assert_eq!(second.waiter.state(), WaiterState::Refused);
        assert_eq!(third.waiter.state(), WaiterState::Granted);
        assert_eq!(mutex.waiters.borrow().len(), 1);

        assert!(matches!(poll_once(&mut second), Poll::Ready(None)));
        let guard = match poll_once(&mut third) {
            Poll::Ready(Some(guard)) => guard,
            _ => panic!("third waiter should hold the lock"),
        };

        assert_eq!(mutex.queue_len(), 1);
        drop(guard);
        assert!(!mutex.locked());
    }

    #[test]
    fn release_with_only_refused_waiters_unlocks() {
        let mutex = Mutex::new(());
        let holder = mutex.try_lock().unwrap();

        let second = mutex.acquire(None);
        second.waiter.refuse();

        holder.release();

        assert!(mutex.waiters.borrow().is_empty());
        assert!(!mutex.locked());
    }

    #[test]
    fn dropping_an_unobserved_grant_passes_the_lock_on() {
        let mutex = Mutex::new(());
        let holder = mutex.try_lock().unwrap();

        let second = mutex.acquire(None);
        let mut third = mutex.acquire(None);

        holder.release();
        assert_eq!(second.waiter.state(), WaiterState::Granted);

        drop(second);

        assert!(matches!(poll_once(&mut third), Poll::Ready(Some(_))));
    }

    #[test]
    fn withdrawn_waiter_leaves_the_queue() {
        let mutex = Mutex::new(());
        let _holder = mutex.try_lock().unwrap();

        let second = mutex.acquire(None);
        assert_eq!(mutex.queue_len(), 2);

        drop(second);

        assert_eq!(mutex.queue_len(), 1);
        assert_eq!(mutex.waiters.borrow().len(), 1);
    }

    #[test]
    fn try_lock_never_joins_the_queue() {
        let mutex = Mutex::new(5);
        let guard = mutex.try_lock().unwrap();

        assert!(matches!(mutex.try_lock(), Err(Error::WouldBlock)));
        assert_eq!(mutex.queue_len(), 1);
        assert_eq!(*guard, 5);
    }

    #[test]
    fn exclusive_access_without_locking() {
        let mut mutex = Mutex::new(String::from("a"));
        mutex.get_mut().push('b');

        assert_eq!(mutex.into_inner(), "ab");
    }
}
