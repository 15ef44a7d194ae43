use super::poller::{Parker, Unparker};
use super::timer::{Timer, TimerEntry, TimerState};

use std::cell::{Cell, RefCell};
use std::collections::BinaryHeap;
use std::io;
use std::rc::Rc;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Timer queue and parking primitive of a runtime.
///
/// Unlike a multi-threaded reactor, this one is driven directly by the
/// runtime thread between two executor ticks, so no command channel is
/// needed: timers are pushed into the heap in place.
pub(crate) struct Reactor {
    /// Pending timers, earliest deadline on top.
    timers: RefCell<BinaryHeap<TimerEntry>>,

    /// Next registration sequence number.
    sequence: Cell<u64>,

    /// OS primitive the thread blocks on while idle.
    parker: RefCell<Parker>,
}

impl Reactor {
    /// Creates a reactor and returns the wake side of its parker.
    pub(crate) fn new() -> io::Result<(Self, Arc<Unparker>)> {
        let parker = Parker::new()?;
        let unparker = parker.unparker();

        Ok((
            Self {
                timers: RefCell::new(BinaryHeap::new()),
                sequence: Cell::new(0),
                parker: RefCell::new(parker),
            },
            unparker,
        ))
    }

    /// Schedules `timer` to fire at `deadline`.
    pub(crate) fn schedule(&self, deadline: Instant, timer: Rc<Timer>) {
        let sequence = self.sequence.get();
        self.sequence.set(sequence.wrapping_add(1));

        self.timers.borrow_mut().push(TimerEntry {
            deadline,
            sequence,
            timer,
        });
    }

    /// Fires every timer whose deadline has passed.
    ///
    /// Expired entries are collected first and fired once the heap borrow
    /// is released, since an expiry callback may schedule new timers.
    /// Returns the number of timers that actually fired.
    pub(crate) fn fire_expired(&self) -> usize {
        let now = Instant::now();
        let mut expired = Vec::new();

        {
            let mut timers = self.timers.borrow_mut();
            while let Some(entry) = timers.peek() {
                if entry.deadline > now {
                    break;
                }

                if let Some(entry) = timers.pop() {
                    expired.push(entry.timer);
                }
            }
        }

        let mut fired = 0;
        for timer in expired {
            if timer.state() == TimerState::Armed {
                timer.fire();
                fired += 1;
            }
        }

        if fired > 0 {
            log::trace!("reactor fired {fired} timer(s)");
        }

        fired
    }

    /// Time left until the nearest armed timer, `None` if there is none.
    ///
    /// Cancelled entries sitting on top of the heap are discarded here.
    pub(crate) fn next_timeout(&self) -> Option<Duration> {
        let mut timers = self.timers.borrow_mut();

        while let Some(entry) = timers.peek() {
            if entry.timer.state() == TimerState::Armed {
                return Some(entry.deadline.saturating_duration_since(Instant::now()));
            }
            timers.pop();
        }

        None
    }

    /// Number of entries still in the timer queue, cancelled ones included.
    #[cfg(test)]
    pub(crate) fn pending(&self) -> usize {
        self.timers.borrow().len()
    }

    /// Parks the runtime thread until an unpark or the nearest deadline.
    pub(crate) fn park(&self) -> io::Result<()> {
        let timeout = self.next_timeout();
        log::trace!("runtime parking (timeout: {timeout:?})");

        self.parker.borrow_mut().park(timeout)
    }

    /// Drops every pending timer without firing it.
    pub(crate) fn clear(&self) -> Vec<Rc<Timer>> {
        self.timers
            .borrow_mut()
            .drain()
            .map(|entry| entry.timer)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fire_expired_skips_future_and_cancelled_timers() {
        let (reactor, _unparker) = Reactor::new().unwrap();
        let now = Instant::now();

        let due = Timer::new();
        let cancelled = Timer::new();
        let later = Timer::new();

        reactor.schedule(now, due.clone());
        reactor.schedule(now, cancelled.clone());
        reactor.schedule(now + Duration::from_secs(60), later.clone());
        cancelled.cancel();

        assert_eq!(reactor.fire_expired(), 1);
        assert!(due.has_fired());
        assert_eq!(later.state(), TimerState::Armed);
        assert_eq!(reactor.pending(), 1);
    }

    #[test]
    fn next_timeout_ignores_cancelled_head() {
        let (reactor, _unparker) = Reactor::new().unwrap();
        let now = Instant::now();

        let first = Timer::new();
        reactor.schedule(now + Duration::from_millis(5), first.clone());
        reactor.schedule(now + Duration::from_secs(30), Timer::new());
        first.cancel();

        let timeout = reactor.next_timeout().unwrap();
        assert!(timeout > Duration::from_secs(20));
        assert_eq!(reactor.pending(), 1);
    }

    #[test]
    fn callback_may_schedule_another_timer() {
        let (reactor, _unparker) = Reactor::new().unwrap();
        let reactor = Rc::new(reactor);
        let follow_up = Timer::new();

        let timer = Timer::with_callback({
            let reactor = reactor.clone();
            let follow_up = follow_up.clone();
            move || reactor.schedule(Instant::now() + Duration::from_secs(1), follow_up)
        });
        reactor.schedule(Instant::now(), timer);

        assert_eq!(reactor.fire_expired(), 1);
        assert_eq!(reactor.pending(), 1);
        assert_eq!(follow_up.state(), TimerState::Armed);
    }
}
