use crate::reactor::timer::Timer;

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::task::Waker;

/// Outcome of a lock request.
///
/// `Granted` and `Refused` are terminal: the first transition out of
/// `Pending` wins, and a late grant or timeout aimed at a settled waiter
/// is a no-op.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum WaiterState {
    Pending,
    Granted,
    Refused,
}

/// One request for the lock, queued in arrival order.
pub(crate) struct Waiter {
    /// Arrival number, only used in log lines.
    id: u64,
    state: Cell<WaiterState>,
    waker: RefCell<Option<Waker>>,

    /// Deadline timer, while armed.
    timer: RefCell<Option<Rc<Timer>>>,
}

impl Waiter {
    pub(crate) fn new(id: u64, state: WaiterState) -> Rc<Self> {
        Rc::new(Self {
            id,
            state: Cell::new(state),
            waker: RefCell::new(None),
            timer: RefCell::new(None),
        })
    }

    pub(crate) fn id(&self) -> u64 {
        self.id
    }

    pub(crate) fn state(&self) -> WaiterState {
        self.state.get()
    }

    pub(crate) fn is_refused(&self) -> bool {
        self.state.get() == WaiterState::Refused
    }

    pub(crate) fn register(&self, waker: &Waker) {
        let mut slot = self.waker.borrow_mut();

        match slot.as_ref() {
            Some(current) if current.will_wake(waker) => {}
            _ => *slot = Some(waker.clone()),
        }
    }

    pub(crate) fn arm(&self, timer: Rc<Timer>) {
        *self.timer.borrow_mut() = Some(timer);
    }

    /// Hands the lock to a pending waiter and wakes it.
    ///
    /// Returns `false` if the waiter had already settled.
    pub(crate) fn grant(&self) -> bool {
        self.settle(WaiterState::Granted)
    }

    /// Gives up on a pending waiter and wakes it.
    ///
    /// Returns `false` if the waiter had already settled.
    pub(crate) fn refuse(&self) -> bool {
        self.settle(WaiterState::Refused)
    }

    fn settle(&self, outcome: WaiterState) -> bool {
        if self.state.get() != WaiterState::Pending {
            return false;
        }

        self.state.set(outcome);

        let timer = self.timer.borrow_mut().take();
        if let Some(timer) = timer {
            timer.cancel();
        }

        let waker = self.waker.borrow_mut().take();
        if let Some(waker) = waker {
            waker.wake();
        }

        true
    }
}
