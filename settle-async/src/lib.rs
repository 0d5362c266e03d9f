//! Runtime abstraction layer for the settle primitives.
//!
//! Every other crate in the workspace goes through this crate instead of
//! naming tokio directly, so the executor-facing surface stays in one place:
//!
//! - `runtime`: entering a runtime (`block_on`) and looking up the current one
//! - `task`: spawning concurrent work
//! - `time`: sleeping, measuring elapsed time, and the cancellable one-shot
//!   [`Timer`](time::Timer) that races are built on
//! - `sync`: channel primitives used to hand results back to awaiting code
//!
//! # Examples
//!
//! ```rust
//! use settle_async::time::{Duration, Timer};
//!
//! #[settle_async::main]
//! async fn main() {
//!     let timer = Timer::start(Duration::from_millis(10), || println!("fired"))
//!         .expect("inside a runtime");
//!     timer.cancel();
//! }
//! ```

// Re-export the async entry-point/test macros so downstream crates never need
// direct tokio dependencies.
pub use settle_async_macros::{main, test};

pub mod runtime;
pub mod sync;
pub mod task;
pub mod time;

pub use runtime::RuntimeUnavailable;
pub use task::spawn;
pub use time::{sleep, Duration, Instant, Timer};
