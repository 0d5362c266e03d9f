//! # Promise Adapter
//!
//! Turns a callback-style function, one that reports its outcome by calling
//! a trailing completion with `(error, results...)`, into a function
//! returning a [`Settlement`].
//!
//! ## Shaping results
//!
//! [`AdapterOptions`] decide how the reported values become a single
//! settled value:
//!
//! | options | success | failure |
//! |---|---|---|
//! | defaults | first result (`Null` if none) | the error, no fields |
//! | `return_array` | every result as a JSON array | the error, no fields |
//! | `resolve_multiple = [a, b]` | `{"a": r0, "b": r1}` | |
//! | `reject_multiple = [code]` | | the error with field `code = r0` |
//!
//! Missing positional results become `Null`; surplus results are dropped.
//!
//! ## Usage
//!
//! ```rust
//! use serde_json::json;
//! use settle_runtime::config::AdapterOptions;
//! use settle_waits::{promisify, Completion};
//!
//! # #[settle_async::main]
//! # async fn main() -> anyhow::Result<()> {
//! let exec = promisify(
//!     |cmd: String, done: Completion| done.succeed(vec![json!(cmd), json!("")]),
//!     AdapterOptions::new().with_resolve_multiple(["stdout", "stderr"]),
//! )?;
//!
//! let output = exec.call("ls".to_string()).await?;
//! assert_eq!(output, json!({ "stdout": "ls", "stderr": "" }));
//! # Ok(())
//! # }
//! ```

use std::fmt;
use std::sync::Arc;

use serde_json::{Map, Value};
use settle_runtime::config::AdapterOptions;
use settle_runtime::Result;
use tracing::debug;

use crate::error::Rejection;
use crate::settlement::{self, Settler, Settlement};

/// Completion handed to a callback-style function. Calling any of its
/// methods consumes it, so the outcome is reported at most once. Dropping it
/// uncalled rejects the settlement with
/// [`CompletionDropped`](crate::CompletionDropped).
pub struct Completion {
    settler: Settler<Value, Rejection>,
    options: Arc<AdapterOptions>,
}

impl Completion {
    /// Reports the outcome Node-style: an error (possibly with results to
    /// attach to it) or `None` and the results.
    pub fn complete(self, error: Option<anyhow::Error>, results: Vec<Value>) {
        let outcome = match error {
            Some(error) => {
                let rejection = shape_rejection(&self.options, error, results);
                debug!(error = %rejection, "promisified call rejected");
                Err(rejection)
            }
            None => Ok(shape_resolution(&self.options, results)),
        };
        self.settler.settle(outcome);
    }

    pub fn succeed(self, results: Vec<Value>) {
        self.complete(None, results);
    }

    pub fn fail(self, error: impl Into<anyhow::Error>, results: Vec<Value>) {
        self.complete(Some(error.into()), results);
    }
}

impl fmt::Debug for Completion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Completion")
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

type CallbackFn<A> = dyn Fn(A, Completion) + Send + Sync;

/// A callback-style function adapted to return settlements.
pub struct Promisified<A> {
    func: Arc<CallbackFn<A>>,
    options: Arc<AdapterOptions>,
}

impl<A> Promisified<A> {
    /// Invokes the wrapped function immediately with `args` and a fresh
    /// completion. Each call is an independent cycle.
    pub fn call(&self, args: A) -> Settlement<Value, Rejection> {
        let (settler, settlement) = settlement::channel();
        let completion = Completion {
            settler,
            options: Arc::clone(&self.options),
        };
        (self.func)(args, completion);
        settlement
    }

    pub fn options(&self) -> &AdapterOptions {
        &self.options
    }
}

impl<A> Clone for Promisified<A> {
    fn clone(&self) -> Self {
        Self {
            func: Arc::clone(&self.func),
            options: Arc::clone(&self.options),
        }
    }
}

impl<A> fmt::Debug for Promisified<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Promisified")
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

/// Adapts `func` so that calling it returns a [`Settlement`].
///
/// # Errors
///
/// Returns [`settle_runtime::Error::InvalidArgument`] if any name in
/// `options` is empty. Nothing is called in that case.
pub fn promisify<A, F>(func: F, options: AdapterOptions) -> Result<Promisified<A>>
where
    F: Fn(A, Completion) + Send + Sync + 'static,
{
    options.validate()?;
    Ok(Promisified {
        func: Arc::new(func),
        options: Arc::new(options),
    })
}

fn shape_resolution(options: &AdapterOptions, results: Vec<Value>) -> Value {
    if !options.resolve_multiple.is_empty() {
        return Value::Object(zip_named(&options.resolve_multiple, results));
    }
    if options.return_array {
        return Value::Array(results);
    }
    results.into_iter().next().unwrap_or(Value::Null)
}

fn shape_rejection(options: &AdapterOptions, error: anyhow::Error, results: Vec<Value>) -> Rejection {
    zip_named(&options.reject_multiple, results)
        .into_iter()
        .fold(Rejection::new(error), |rejection, (name, value)| {
            rejection.with_field(name, value)
        })
}

fn zip_named(names: &[String], results: Vec<Value>) -> Map<String, Value> {
    let mut results = results.into_iter();
    names
        .iter()
        .map(|name| (name.clone(), results.next().unwrap_or(Value::Null)))
        .collect()
}
