use super::context::enter_context;
use super::executor::{Executor, ReadyQueue};
use super::task::waker::make_waker;
use super::task::{JoinHandle, JoinState, Task, TaskId};
use crate::error::Result;
use crate::reactor::Reactor;
use crate::reactor::timer::Timer;

use std::future::Future;
use std::pin::pin;
use std::rc::Rc;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Instant;

/// State shared by a runtime and every handle to it.
pub(crate) struct Core {
    /// Spawned tasks and the ready queue.
    pub(crate) executor: Executor,

    /// Timers and thread parking.
    pub(crate) reactor: Reactor,

    /// Maximum number of polls between two timer sweeps.
    tick_budget: usize,
}

impl Core {
    /// Spawns a future and returns a handle to its output.
    pub(crate) fn spawn<F>(&self, future: F) -> JoinHandle<F::Output>
    where
        F: Future + 'static,
        F::Output: 'static,
    {
        let state = JoinState::new();
        let output = state.clone();

        self.executor.spawn(async move {
            let value = future.await;
            output.complete(value);
        });

        JoinHandle { state }
    }

    /// Schedules `timer` to fire at `deadline`.
    pub(crate) fn schedule_timer(&self, deadline: Instant, timer: Rc<Timer>) {
        self.reactor.schedule(deadline, timer);
    }
}

/// The main runtime handle.
///
/// `Runtime` is responsible for:
/// - spawning local tasks,
/// - driving task execution on the calling thread,
/// - firing timers and parking the thread while idle,
/// - providing a synchronous entry point via [`block_on`](Self::block_on).
///
/// The runtime is single-threaded: every task runs on the thread calling
/// `block_on`, one at a time, and only switches at `.await` points.
///
/// Dropping the runtime drops every task that has not completed.
pub struct Runtime {
    core: Rc<Core>,
}

impl Runtime {
    /// Creates a new runtime instance.
    pub(crate) fn new(tick_budget: usize) -> Result<Self> {
        let (reactor, unparker) = Reactor::new()?;
        let ready = Arc::new(ReadyQueue::new(unparker));

        Ok(Self {
            core: Rc::new(Core {
                executor: Executor::new(ready),
                reactor,
                tick_budget,
            }),
        })
    }

    /// Spawns a future onto the runtime.
    ///
    /// The task starts running on the next call to
    /// [`block_on`](Self::block_on).
    ///
    /// # Examples
    ///
    /// ```rust,ignore
    /// let handle = runtime.spawn(async { 1 + 1 });
    /// assert_eq!(runtime.block_on(handle), 2);
    /// ```
    pub fn spawn<F>(&self, future: F) -> JoinHandle<F::Output>
    where
        F: Future + 'static,
        F::Output: 'static,
    {
        self.core.spawn(future)
    }

    /// Runs a future to completion on the current thread.
    ///
    /// While the future is pending, spawned tasks are polled and timers
    /// fired; when nothing is ready the thread parks until the nearest
    /// timer deadline or a wake-up.
    ///
    /// The future does not need to be `Send` or `'static`.
    ///
    /// # Examples
    ///
    /// ```rust,ignore
    /// let result = runtime.block_on(async {
    ///     42
    /// });
    /// assert_eq!(result, 42);
    /// ```
    pub fn block_on<F: Future>(&self, future: F) -> F::Output {
        let core = self.core.clone();

        enter_context(core.clone(), move || {
            let mut future = pin!(future);

            let root = Task::new(TaskId::ROOT, core.executor.ready());
            let waker = make_waker(root.clone());
            let mut cx = Context::from_waker(&waker);

            root.schedule();

            loop {
                for _ in 0..core.tick_budget {
                    let Some(id) = core.executor.next() else {
                        break;
                    };

                    if id != TaskId::ROOT {
                        core.executor.run(id);
                        continue;
                    }

                    if !root.begin_poll() {
                        continue;
                    }

                    if let Poll::Ready(output) = future.as_mut().poll(&mut cx) {
                        root.complete();
                        return output;
                    }

                    root.end_poll();
                }

                core.reactor.fire_expired();

                if core.executor.is_idle() {
                    if let Err(err) = core.reactor.park() {
                        log::error!("failed to park the runtime thread: {err}");
                    }

                    core.reactor.fire_expired();
                }
            }
        })
    }
}

impl Drop for Runtime {
    /// Shuts down the runtime.
    ///
    /// Remaining tasks are dropped inside the runtime context, so their
    /// destructors can still reach it, then pending timers are discarded.
    fn drop(&mut self) {
        let pending = self.core.executor.len();
        if pending > 0 {
            log::debug!("runtime dropped with {pending} unfinished task(s)");
        }

        enter_context(self.core.clone(), || {
            self.core.executor.shutdown();
            drop(self.core.reactor.clear());
        });
    }
}
