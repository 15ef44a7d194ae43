//! # Lockstep
//!
//! **Lockstep** is a single-threaded async runtime for Rust, built around two
//! coordination primitives that need strict ordering guarantees:
//!
//! - a **queued mutex** ([`sync::Mutex`]) granting the lock in strict arrival
//!   order, with optional per-waiter timeouts,
//! - an **interval scheduler** ([`time::Interval`]) running a periodic callback
//!   that never overlaps itself and can be stopped between ticks.
//!
//! Everything runs on the thread that calls [`Runtime::block_on`]. Concurrency
//! only comes from interleaving suspended tasks, so the primitives keep their
//! state in plain `Cell`/`RefCell` and are meant to be shared through `Rc`.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use lockstep::sync::Mutex;
//! use lockstep::task;
//! use std::rc::Rc;
//! use std::time::Duration;
//!
//! #[lockstep::main]
//! async fn main() {
//!     let mutex = Rc::new(Mutex::new(0u32));
//!
//!     let worker = task::spawn({
//!         let mutex = mutex.clone();
//!         async move {
//!             if let Some(mut guard) = mutex.acquire(Some(Duration::from_millis(50))).await {
//!                 *guard += 1;
//!             }
//!         }
//!     });
//!
//!     worker.await;
//!     assert_eq!(*mutex.lock().await, 1);
//! }
//! ```
//!
//! ## Modules
//!
//! - [`sync`]: The queued mutex
//! - [`time`]: Sleep, timeout, instrumentation and the interval scheduler
//! - [`task`]: Spawning local tasks and awaiting their output
//!
//! ## Getting Started
//!
//! Add Lockstep to your `Cargo.toml`, pointing at a local checkout:
//!
//! ```toml
//! [dependencies]
//! lockstep = { path = "../lockstep/lockstep" }
//! ```

mod error;
mod reactor;
mod runtime;
mod utils;

pub mod sync;
pub mod time;

pub use error::{Error, Result};
pub use runtime::Runtime;
pub use runtime::builder::RuntimeBuilder;
pub use runtime::task;
pub use runtime::yield_now::yield_now;

pub use lockstep_macros::*;
