//! Outcomes a settlement can fail with.
//!
//! Setup problems (bad arguments, no runtime) are reported synchronously as
//! [`settle_runtime::Error`]. Everything here only ever surfaces through a
//! [`Settlement`](crate::Settlement).

use std::fmt;
use std::time::Duration;

use serde_json::{Map, Value};
use thiserror::Error;

/// Why a timed wait did not resolve.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum WaitError {
    /// The timer won the race against the awaited event.
    #[error("Timed out after {} milliseconds waiting for event \"{}\"", millis(.interval), .name)]
    TimedOut { name: String, interval: Duration },

    /// The event fired while waiting for it not to.
    #[error("Emitter emitted event \"{name}\"")]
    EventEmitted { name: String, value: Value },

    /// Both the listener and the timer were dropped without settling, e.g.
    /// because the emitter itself was dropped.
    #[error("Wait was abandoned before it settled")]
    Abandoned,
}

impl WaitError {
    /// Name of the event involved, if any.
    pub fn event_name(&self) -> Option<&str> {
        match self {
            WaitError::TimedOut { name, .. } | WaitError::EventEmitted { name, .. } => Some(name),
            WaitError::Abandoned => None,
        }
    }
}

// Whole milliseconds print as integers, anything finer as a decimal
// without trailing zeros ("50", "1.5", "0.25").
fn millis(interval: &Duration) -> String {
    let nanos = interval.as_nanos();
    if nanos % 1_000_000 == 0 {
        return (nanos / 1_000_000).to_string();
    }
    (nanos as f64 / 1_000_000.0).to_string()
}

/// Reported when a callback-style function drops its completion without
/// calling it.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("Completion was dropped without being called")]
pub struct CompletionDropped;

/// Rejection produced by a promisified function: the reported error plus any
/// results attached under the names in `reject_multiple`.
#[derive(Debug)]
pub struct Rejection {
    error: anyhow::Error,
    fields: Map<String, Value>,
}

impl Rejection {
    pub fn new(error: impl Into<anyhow::Error>) -> Self {
        Self {
            error: error.into(),
            fields: Map::new(),
        }
    }

    pub fn with_field(mut self, name: impl Into<String>, value: Value) -> Self {
        self.fields.insert(name.into(), value);
        self
    }

    /// The error reported by the wrapped function, unmodified.
    pub fn error(&self) -> &anyhow::Error {
        &self.error
    }

    pub fn into_error(self) -> anyhow::Error {
        self.error
    }

    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// Attached fields in `reject_multiple` order.
    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    pub fn downcast_ref<E>(&self) -> Option<&E>
    where
        E: fmt::Display + fmt::Debug + Send + Sync + 'static,
    {
        self.error.downcast_ref::<E>()
    }
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.error, f)
    }
}

impl std::error::Error for Rejection {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&*self.error)
    }
}

/// Error value a settlement resolves to when its producer goes away.
pub trait Abandon {
    fn abandoned() -> Self;
}

impl Abandon for WaitError {
    fn abandoned() -> Self {
        WaitError::Abandoned
    }
}

impl Abandon for Rejection {
    fn abandoned() -> Self {
        Rejection::new(CompletionDropped)
    }
}
