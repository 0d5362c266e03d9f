//! Time-related abstractions.
//!
//! Re-exports tokio's sleep/timeout plus the standard monotonic clock types,
//! and adds [`Timer`], a cancellable one-shot callback timer in the spirit of
//! `setTimeout`/`clearTimeout`.
//!
//! # Examples
//!
//! ```rust
//! use settle_async::time::{sleep, Duration, Instant};
//!
//! async fn example() {
//!     let start = Instant::now();
//!
//!     sleep(Duration::from_millis(10)).await;
//!
//!     let elapsed = start.elapsed();
//!     println!("Took {:?}", elapsed);
//! }
//! ```

use tokio_util::sync::CancellationToken;
use tracing::trace;

use crate::runtime::{self, RuntimeUnavailable};

pub use std::time::{Duration, Instant};
pub use tokio::time::{sleep, timeout, Sleep, Timeout};

/// A one-shot timer that invokes a callback once its duration elapses unless
/// it was cancelled first.
///
/// The callback runs on a spawned task of the runtime that was current when
/// the timer started. Dropping the `Timer` does not cancel it; call
/// [`Timer::cancel`].
#[derive(Debug)]
pub struct Timer {
    token: CancellationToken,
    deadline: Instant,
}

impl Timer {
    /// Arms a timer that calls `on_expire` after `duration`.
    ///
    /// # Errors
    ///
    /// Returns [`RuntimeUnavailable`] when no runtime is entered on the
    /// calling thread; nothing is scheduled in that case.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use settle_async::time::{Duration, Timer};
    ///
    /// # #[settle_async::main]
    /// # async fn main() {
    /// let timer = Timer::start(Duration::from_millis(50), || println!("expired"))
    ///     .expect("inside a runtime");
    /// timer.cancel();
    /// # }
    /// ```
    pub fn start<F>(duration: Duration, on_expire: F) -> Result<Self, RuntimeUnavailable>
    where
        F: FnOnce() + Send + 'static,
    {
        let handle = runtime::current()?;
        let token = CancellationToken::new();
        let cancelled = token.clone();

        handle.spawn(async move {
            tokio::select! {
                biased;
                _ = cancelled.cancelled() => {
                    trace!(?duration, "timer cancelled before expiry");
                }
                _ = sleep(duration) => {
                    if !cancelled.is_cancelled() {
                        on_expire();
                    }
                }
            }
        });

        Ok(Self {
            token,
            deadline: Instant::now() + duration,
        })
    }

    /// Cancels the timer. Idempotent; a no-op once the callback has run.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Returns true once [`Timer::cancel`] has been called.
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// The instant at which the callback is due.
    pub fn deadline(&self) -> Instant {
        self.deadline
    }
}
