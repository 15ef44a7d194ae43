use std::io;

use thiserror::Error;

/// Errors reported by the runtime and its primitives.
///
/// A mutex waiter that gives up (timeout or cancellation) is **not** an
/// error: [`Mutex::acquire`](crate::sync::Mutex::acquire) resolves to `None`
/// in that case.
#[derive(Debug, Error)]
pub enum Error {
    /// The operation needs a runtime, but none is entered on this thread.
    #[error("no runtime is running on the current thread")]
    NoRuntime,

    /// [`Mutex::try_lock`](crate::sync::Mutex::try_lock) found the lock held
    /// or contended.
    #[error("the mutex is currently held")]
    WouldBlock,

    /// A [`timeout`](crate::time::timeout) deadline elapsed first.
    #[error("deadline has elapsed")]
    Elapsed,

    /// An interval callback returned an error.
    #[error("interval callback failed: {0}")]
    Callback(Box<dyn std::error::Error>),

    /// The OS parking primitive could not be set up.
    #[error("runtime i/o error: {0}")]
    Io(#[from] io::Error),
}

/// Result type used across the crate.
pub type Result<T> = std::result::Result<T, Error>;
