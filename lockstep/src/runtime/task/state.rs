/// Task is idle: not queued, waiting to be woken.
pub(crate) const IDLE: usize = 0;

/// Task sits in the ready queue.
pub(crate) const QUEUED: usize = 1;

/// Task is being polled by the runtime thread.
pub(crate) const RUNNING: usize = 2;

/// Task was woken while being polled.
///
/// It is re-queued as soon as the current poll returns `Pending`.
pub(crate) const NOTIFIED: usize = 3;

/// The future returned `Poll::Ready` and is never polled again.
pub(crate) const COMPLETED: usize = 4;
