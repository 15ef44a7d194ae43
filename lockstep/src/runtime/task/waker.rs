use crate::runtime::task::Task;

use std::mem;
use std::sync::Arc;
use std::task::{RawWaker, RawWakerVTable, Waker};

/// Vtable shared by every task waker.
///
/// The data pointer always originates from `Arc::<Task>::into_raw`, so
/// each function only has to keep the reference count balanced.
static VTABLE: RawWakerVTable = RawWakerVTable::new(clone_raw, wake_raw, wake_by_ref_raw, drop_raw);

/// Creates a [`Waker`] that re-queues `task` when woken.
///
/// The waker only touches the task header, which is `Send + Sync`, so it
/// may be moved to and fired from any thread even though the task's
/// future itself never leaves the runtime thread.
pub(crate) fn make_waker(task: Arc<Task>) -> Waker {
    unsafe { Waker::from_raw(RawWaker::new(Arc::into_raw(task) as *const (), &VTABLE)) }
}

fn clone_raw(ptr: *const ()) -> RawWaker {
    let arc = unsafe { Arc::<Task>::from_raw(ptr as *const Task) };
    let cloned = arc.clone();
    mem::forget(arc);

    RawWaker::new(Arc::into_raw(cloned) as *const (), &VTABLE)
}

fn wake_raw(ptr: *const ()) {
    let arc = unsafe { Arc::<Task>::from_raw(ptr as *const Task) };
    arc.schedule();
}

fn wake_by_ref_raw(ptr: *const ()) {
    let arc = unsafe { Arc::<Task>::from_raw(ptr as *const Task) };
    arc.schedule();
    mem::forget(arc);
}

fn drop_raw(ptr: *const ()) {
    unsafe { drop(Arc::<Task>::from_raw(ptr as *const Task)) };
}
