use super::ReadyQueue;
use crate::runtime::task::waker::make_waker;
use crate::runtime::task::{Task, TaskId};
use crate::utils::Slab;

use std::cell::{Cell, RefCell};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll, Waker};

type LocalFuture = Pin<Box<dyn Future<Output = ()>>>;

/// A spawned task as stored by the executor.
struct TaskSlot {
    /// Scheduling header, shared with the task waker.
    task: Arc<Task>,

    /// Waker handed to the future on every poll.
    waker: Waker,

    /// The future, `None` while it is being polled.
    future: Option<LocalFuture>,
}

/// Single-threaded task executor.
///
/// The `Executor` owns every spawned future and polls them one at a time
/// on the runtime thread, in the order their ids come out of the ready
/// queue.
pub(crate) struct Executor {
    /// Spawned futures, indexed by `TaskId::index`.
    tasks: RefCell<Slab<TaskSlot>>,

    /// Woken task ids waiting to be polled.
    ready: Arc<ReadyQueue>,

    /// Generation given to the next spawned task.
    generation: Cell<u64>,
}

impl Executor {
    pub(crate) fn new(ready: Arc<ReadyQueue>) -> Self {
        Self {
            tasks: RefCell::new(Slab::new(64)),
            ready,
            generation: Cell::new(1),
        }
    }

    pub(crate) fn ready(&self) -> Arc<ReadyQueue> {
        self.ready.clone()
    }

    /// Stores a new task and queues it for its first poll.
    pub(crate) fn spawn(&self, future: impl Future<Output = ()> + 'static) {
        let generation = self.generation.get();
        self.generation.set(generation.wrapping_add(1));

        let mut task = None;

        self.tasks.borrow_mut().insert_with(|index| {
            let header = Task::new(TaskId { index, generation }, self.ready.clone());
            task = Some(header.clone());

            TaskSlot {
                waker: make_waker(header.clone()),
                task: header,
                future: Some(Box::pin(future)),
            }
        });

        if let Some(task) = task {
            task.schedule();
        }
    }

    /// Pops the next ready task id.
    pub(crate) fn next(&self) -> Option<TaskId> {
        self.ready.pop()
    }

    /// Returns `true` when no task is waiting to be polled.
    pub(crate) fn is_idle(&self) -> bool {
        self.ready.is_empty()
    }

    /// Polls the task identified by `id` once.
    ///
    /// The future is taken out of its slot for the duration of the poll,
    /// so the task is free to spawn other tasks. Stale ids (completed or
    /// replaced tasks) and duplicate queue entries are ignored.
    pub(crate) fn run(&self, id: TaskId) {
        let (task, waker, mut future) = {
            let mut tasks = self.tasks.borrow_mut();

            let Some(slot) = tasks.get_mut(id.index) else {
                return;
            };

            if slot.task.id != id {
                return;
            }

            let Some(future) = slot.future.take() else {
                return;
            };

            (slot.task.clone(), slot.waker.clone(), future)
        };

        if !task.begin_poll() {
            if let Some(slot) = self.tasks.borrow_mut().get_mut(id.index) {
                slot.future = Some(future);
            }
            return;
        }

        let mut cx = Context::from_waker(&waker);

        match future.as_mut().poll(&mut cx) {
            Poll::Pending => {
                if let Some(slot) = self.tasks.borrow_mut().get_mut(id.index) {
                    slot.future = Some(future);
                }
                task.end_poll();
            }
            Poll::Ready(()) => {
                task.complete();
                let slot = self.tasks.borrow_mut().remove(id.index);

                drop(future);
                drop(slot);
            }
        }
    }

    /// Number of tasks that have not completed yet.
    pub(crate) fn len(&self) -> usize {
        self.tasks.borrow().len()
    }

    /// Drops every remaining task.
    ///
    /// Futures are dropped after the slab borrow is released, since their
    /// destructors may release locks and wake other tasks.
    pub(crate) fn shutdown(&self) {
        let slots = self.tasks.borrow_mut().drain();

        for slot in &slots {
            slot.task.complete();
        }

        drop(slots);
    }
}
