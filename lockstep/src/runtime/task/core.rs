use super::JoinHandle;
use super::state::{COMPLETED, IDLE, NOTIFIED, QUEUED, RUNNING};
use crate::error::{Error, Result};
use crate::runtime::context;
use crate::runtime::executor::ReadyQueue;

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Identifies a task slot in the executor.
///
/// The generation distinguishes successive tasks stored in the same slab
/// slot, so a stale waker can never poll a newer task.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct TaskId {
    pub(crate) index: usize,
    pub(crate) generation: u64,
}

impl TaskId {
    /// Identifier reserved for the future driven by `block_on`.
    pub(crate) const ROOT: TaskId = TaskId {
        index: usize::MAX,
        generation: 0,
    };
}

/// Scheduling header of a task.
///
/// The future itself stays in the executor slab on the runtime thread;
/// the header only carries what a waker needs, which makes it safe to
/// share across threads.
pub(crate) struct Task {
    /// Slot of the task in the executor.
    pub(crate) id: TaskId,

    /// Current lifecycle state (IDLE, QUEUED, RUNNING, ...).
    state: AtomicUsize,

    /// Queue the task is pushed to when woken.
    ready: Arc<ReadyQueue>,
}

impl Task {
    /// Creates a header in the `IDLE` state.
    pub(crate) fn new(id: TaskId, ready: Arc<ReadyQueue>) -> Arc<Self> {
        Arc::new(Self {
            id,
            state: AtomicUsize::new(IDLE),
            ready,
        })
    }

    /// Signals the task to be polled again.
    ///
    /// An `IDLE` task moves to `QUEUED` and is pushed to the ready queue.
    /// A `RUNNING` task moves to `NOTIFIED` and is re-queued when its
    /// current poll ends. Queued, notified and completed tasks are left
    /// alone.
    pub(crate) fn schedule(&self) {
        loop {
            match self.state.load(Ordering::Acquire) {
                IDLE => {
                    if self
                        .state
                        .compare_exchange(IDLE, QUEUED, Ordering::AcqRel, Ordering::Acquire)
                        .is_ok()
                    {
                        self.ready.push(self.id);
                        return;
                    }
                }
                RUNNING => {
                    if self
                        .state
                        .compare_exchange(RUNNING, NOTIFIED, Ordering::AcqRel, Ordering::Acquire)
                        .is_ok()
                    {
                        return;
                    }
                }
                _ => return,
            }
        }
    }

    /// Moves a queued task to `RUNNING`.
    ///
    /// Returns `false` when the task is not runnable, e.g. a duplicate
    /// entry left in the ready queue.
    pub(crate) fn begin_poll(&self) -> bool {
        self.state
            .compare_exchange(QUEUED, RUNNING, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// Ends a poll that returned `Pending`.
    ///
    /// Returns to `IDLE`, unless a wake-up arrived while running, in which
    /// case the task is queued again right away.
    pub(crate) fn end_poll(&self) {
        if self
            .state
            .compare_exchange(RUNNING, IDLE, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            self.state.store(QUEUED, Ordering::Release);
            self.ready.push(self.id);
        }
    }

    /// Marks the task as finished; later wake-ups are ignored.
    pub(crate) fn complete(&self) {
        self.state.store(COMPLETED, Ordering::Release);
    }
}

/// Spawns a future as a task onto the runtime entered on this thread.
///
/// The future does not need to be `Send`: it is only ever polled by the
/// thread running [`Runtime::block_on`](crate::Runtime::block_on). Tasks
/// run in the order they were spawned or woken.
///
/// # Panics
///
/// Panics if called outside the context of a running runtime. Use
/// [`try_spawn`] to get an error instead.
///
/// # Examples
///
/// ```rust,ignore
/// let handle = task::spawn(async { 6 * 7 });
/// assert_eq!(handle.await, 42);
/// ```
pub fn spawn<F>(future: F) -> JoinHandle<F::Output>
where
    F: Future + 'static,
    F::Output: 'static,
{
    match try_spawn(future) {
        Ok(handle) => handle,
        Err(err) => panic!("spawn must be called within the context of a runtime: {err}"),
    }
}

/// Spawns a future onto the current runtime, or fails with
/// [`Error::NoRuntime`] when called outside of one.
pub fn try_spawn<F>(future: F) -> Result<JoinHandle<F::Output>>
where
    F: Future + 'static,
    F::Output: 'static,
{
    let core = context::current().ok_or(Error::NoRuntime)?;
    Ok(core.spawn(future))
}
