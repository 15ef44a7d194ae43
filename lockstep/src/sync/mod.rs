//! Synchronization primitives for Lockstep.
//!
//! The current primitives include:
//! - [`Mutex`]: a FIFO mutex whose waiters may give up after a timeout.
//!
//! ## Design notes
//!
//! - The primitives are local to one runtime: they are `!Sync` and keep
//!   their state in `Cell`/`RefCell`. Share them between tasks with `Rc`.
//! - Tasks that cannot acquire a lock are suspended and woken when it is
//!   their turn or when they give up.
//! - Every waiter settles exactly once, as granted or refused; whichever
//!   of "release" and "timeout" comes first decides.

mod mutex;
mod waiter;

pub use mutex::{Acquire, Lock, Mutex, MutexGuard};
