//! Runtime utilities that abstract over the underlying async executor.
//!
//! We wrap tokio's runtime primitives so that downstream crates never need to
//! depend on tokio directly.

use std::fmt;
use std::future::Future;

pub use tokio::runtime::{Builder, Handle, Runtime};

/// Runs the provided future to completion on a current-thread runtime.
pub fn block_on<F>(future: F) -> F::Output
where
    F: Future,
{
    Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("settle_async::runtime::block_on: failed to build tokio runtime")
        .block_on(future)
}

/// Runs the provided future to completion on a multi-thread runtime.
///
/// Timers and listeners may then fire on different worker threads, which is
/// what the race tests use to exercise concurrent triggers.
pub fn block_on_multi_thread<F>(future: F) -> F::Output
where
    F: Future,
{
    Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .expect("settle_async::runtime::block_on_multi_thread: failed to build tokio runtime")
        .block_on(future)
}

/// Returns a handle to the runtime driving the current thread.
///
/// # Errors
///
/// Returns [`RuntimeUnavailable`] when called outside of a runtime context.
pub fn current() -> Result<Handle, RuntimeUnavailable> {
    Handle::try_current().map_err(|_| RuntimeUnavailable)
}

/// Error returned when an operation needs a running runtime and none is
/// entered on the current thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuntimeUnavailable;

impl fmt::Display for RuntimeUnavailable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "no async runtime is running on this thread")
    }
}

impl std::error::Error for RuntimeUnavailable {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn current_fails_outside_runtime() {
        assert_eq!(current().unwrap_err(), RuntimeUnavailable);
    }

    #[test]
    fn current_succeeds_inside_block_on() {
        assert!(block_on(async { current().is_ok() }));
    }

    #[test]
    fn multi_thread_block_on_returns_output() {
        assert_eq!(block_on_multi_thread(async { 7 }), 7);
    }
}
