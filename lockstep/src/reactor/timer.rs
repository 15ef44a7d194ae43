use std::cell::{Cell, RefCell};
use std::cmp::Ordering;
use std::rc::Rc;
use std::task::Waker;
use std::time::Instant;

/// Lifecycle of a [`Timer`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum TimerState {
    /// Waiting for its deadline.
    Armed,
    /// The deadline was reached and the timer fired.
    Fired,
    /// The owner gave up on the timer before it fired.
    Cancelled,
}

/// A one-shot timer shared between its owner and the reactor.
///
/// When the deadline is reached the reactor runs the optional expiry
/// callback first, then wakes the registered waker. Both happen at most
/// once, and never after [`cancel`](Self::cancel).
pub(crate) struct Timer {
    state: Cell<TimerState>,
    waker: RefCell<Option<Waker>>,
    on_expire: RefCell<Option<Box<dyn FnOnce()>>>,
}

impl Timer {
    /// Creates an armed timer that only wakes its owner.
    pub(crate) fn new() -> Rc<Self> {
        Rc::new(Self {
            state: Cell::new(TimerState::Armed),
            waker: RefCell::new(None),
            on_expire: RefCell::new(None),
        })
    }

    /// Creates an armed timer running `on_expire` when it fires.
    pub(crate) fn with_callback(on_expire: impl FnOnce() + 'static) -> Rc<Self> {
        let timer = Self::new();
        *timer.on_expire.borrow_mut() = Some(Box::new(on_expire));
        timer
    }

    pub(crate) fn state(&self) -> TimerState {
        self.state.get()
    }

    pub(crate) fn has_fired(&self) -> bool {
        self.state.get() == TimerState::Fired
    }

    /// Replaces the waker notified when the timer fires.
    pub(crate) fn register(&self, waker: &Waker) {
        let mut slot = self.waker.borrow_mut();

        match slot.as_ref() {
            Some(current) if current.will_wake(waker) => {}
            _ => *slot = Some(waker.clone()),
        }
    }

    /// Disarms the timer. Has no effect once it fired.
    pub(crate) fn cancel(&self) {
        if self.state.get() == TimerState::Armed {
            self.state.set(TimerState::Cancelled);
            self.waker.borrow_mut().take();
            self.on_expire.borrow_mut().take();
        }
    }

    /// Fires the timer if it is still armed.
    pub(crate) fn fire(&self) {
        if self.state.get() != TimerState::Armed {
            return;
        }

        self.state.set(TimerState::Fired);

        let callback = self.on_expire.borrow_mut().take();
        if let Some(callback) = callback {
            callback();
        }

        let waker = self.waker.borrow_mut().take();
        if let Some(waker) = waker {
            waker.wake();
        }
    }
}

/// An entry in the reactor timer queue.
///
/// Entries are ordered by deadline, then by registration order, so timers
/// sharing a deadline fire in the order they were scheduled.
pub(crate) struct TimerEntry {
    /// The time at which the timer should fire.
    pub(crate) deadline: Instant,

    /// Registration sequence number, breaks deadline ties.
    pub(crate) sequence: u64,

    /// The timer to fire.
    pub(crate) timer: Rc<Timer>,
}

impl Eq for TimerEntry {}

impl PartialEq for TimerEntry {
    fn eq(&self, other: &Self) -> bool {
        self.deadline == other.deadline && self.sequence == other.sequence
    }
}

impl Ord for TimerEntry {
    /// Reversed so that a `BinaryHeap<TimerEntry>` pops the earliest
    /// deadline first.
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .deadline
            .cmp(&self.deadline)
            .then_with(|| other.sequence.cmp(&self.sequence))
    }
}

impl PartialOrd for TimerEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
