//! Task spawning.
//!
//! Thin wrapper over `tokio::task` so callers stay executor-agnostic.
//!
//! # Examples
//!
//! ```rust
//! use settle_async::task;
//!
//! # #[settle_async::main]
//! # async fn main() {
//! let handle = task::spawn(async { 42 });
//! assert_eq!(handle.await.unwrap(), 42);
//! # }
//! ```

pub use tokio::task::JoinHandle;

/// Spawns a new asynchronous task on the current runtime.
///
/// The spawned task may run on a different thread.
///
/// # Panics
///
/// Panics when called outside of a runtime context, like `tokio::spawn`.
pub fn spawn<F>(future: F) -> JoinHandle<F::Output>
where
    F: std::future::Future + Send + 'static,
    F::Output: Send + 'static,
{
    tokio::task::spawn(future)
}

