use crate::reactor::Unparker;
use crate::runtime::task::TaskId;

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};

/// Queue of tasks ready to be polled.
///
/// This is the only piece of executor state reachable from wakers, which
/// may fire on any thread. Pushing a task also unparks the runtime thread
/// in case it is blocked waiting for timers.
pub(crate) struct ReadyQueue {
    /// Woken tasks, polled in FIFO order.
    queue: Mutex<VecDeque<TaskId>>,

    /// Wake side of the runtime parker.
    unparker: Arc<Unparker>,
}

impl ReadyQueue {
    pub(crate) fn new(unparker: Arc<Unparker>) -> Self {
        Self {
            queue: Mutex::new(VecDeque::new()),
            unparker,
        }
    }

    /// Pushes a task to the back of the queue and unparks the runtime.
    pub(crate) fn push(&self, id: TaskId) {
        self.queue
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(id);

        self.unparker.unpark();
    }

    /// Pops the next task to poll, `None` if the queue is empty.
    pub(crate) fn pop(&self) -> Option<TaskId> {
        self.queue
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.queue
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_empty()
    }
}
