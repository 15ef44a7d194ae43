//! Portable parker backed by a `Condvar`.

use std::io;
use std::sync::{Arc, Condvar, Mutex, PoisonError};
use std::time::Duration;

/// Wake side of the parker, shared with every task waker.
pub(crate) struct Unparker {
    /// Whether a wake-up is pending.
    notified: Mutex<bool>,

    /// Signalled on every unpark.
    condvar: Condvar,
}

impl Unparker {
    /// Wakes the parked runtime thread, or makes its next park return
    /// immediately.
    pub(crate) fn unpark(&self) {
        let mut notified = self.notified.lock().unwrap_or_else(PoisonError::into_inner);
        *notified = true;
        self.condvar.notify_one();
    }
}

/// Parker used on targets without `epoll`.
pub(crate) struct Parker {
    unparker: Arc<Unparker>,
}

impl Parker {
    pub(crate) fn new() -> io::Result<Self> {
        Ok(Self {
            unparker: Arc::new(Unparker {
                notified: Mutex::new(false),
                condvar: Condvar::new(),
            }),
        })
    }

    pub(crate) fn unparker(&self) -> Arc<Unparker> {
        self.unparker.clone()
    }

    /// Blocks until an unpark happens or `timeout` expires.
    pub(crate) fn park(&mut self, timeout: Option<Duration>) -> io::Result<()> {
        let unparker = &self.unparker;
        let mut notified = unparker
            .notified
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        if !*notified {
            notified = match timeout {
                Some(timeout) => {
                    unparker
                        .condvar
                        .wait_timeout_while(notified, timeout, |n| !*n)
                        .unwrap_or_else(PoisonError::into_inner)
                        .0
                }
                None => unparker
                    .condvar
                    .wait_while(notified, |n| !*n)
                    .unwrap_or_else(PoisonError::into_inner),
            };
        }

        *notified = false;

        Ok(())
    }
}
