use crate::runtime::core::Core;

use std::cell::RefCell;
use std::rc::Rc;

thread_local! {
    /// Runtime entered on the current thread.
    ///
    /// Set for the duration of `Runtime::block_on`, it lets timers and
    /// spawned tasks reach the executor and reactor without explicit
    /// parameter passing.
    static CURRENT: RefCell<Option<Rc<Core>>> = const { RefCell::new(None) };
}

/// Restores the previously entered runtime when dropped, including while
/// unwinding out of a panicking task.
struct ContextGuard {
    previous: Option<Rc<Core>>,
}

impl Drop for ContextGuard {
    fn drop(&mut self) {
        let previous = self.previous.take();
        CURRENT.with(|cell| *cell.borrow_mut() = previous);
    }
}

/// Runs `f` with `core` installed as the current runtime of this thread.
pub(crate) fn enter_context<R>(core: Rc<Core>, f: impl FnOnce() -> R) -> R {
    let previous = CURRENT.with(|cell| cell.replace(Some(core)));
    let _guard = ContextGuard { previous };

    f()
}

/// Returns the runtime entered on this thread, if any.
pub(crate) fn current() -> Option<Rc<Core>> {
    CURRENT.with(|cell| cell.borrow().clone())
}
