//! # Configuration
//!
//! Option records for the settle primitives.
//!
//! ## Overview
//!
//! Options are plain structs with `with_*` builder methods and a `validate`
//! step that fails fast with an actionable [`Error`] before any asynchronous
//! work starts. Both records can also be loaded from JSON:
//!
//! - [`AdapterOptions`] controls how `promisify` maps the extra values a
//!   callback-style function reports into a single settled value.
//! - [`LoggerOptions`] controls which subscribers a new pub/sub logger starts
//!   with and its initial level.
//!
//! ## Usage
//!
//! ```rust
//! use settle_runtime::config::AdapterOptions;
//! use serde_json::json;
//!
//! let options = AdapterOptions::new().with_resolve_multiple(["stdout", "stderr"]);
//! options.validate().expect("valid options");
//!
//! // Dynamic options are shape-checked; keys may be camel, kebab or snake case.
//! let options = AdapterOptions::from_value(&json!({ "reject-multiple": ["code"] }))?;
//! assert_eq!(options.reject_multiple, vec!["code".to_string()]);
//!
//! let err = AdapterOptions::from_value(&json!({ "rejectMultiple": "code" })).unwrap_err();
//! assert!(err.to_string().contains("options.rejectMultiple"));
//! # Ok::<(), settle_runtime::Error>(())
//! ```

use serde::Deserialize;
use serde_json::Value;

use crate::checks;
use crate::error::{Error, Result};
use crate::logging::LogLevel;
use crate::strings::camel_case;

/// How `promisify` shapes the values reported through a completion.
///
/// With both name lists empty the adapter uses the single-value behavior:
/// resolve with the first result, reject with the error unmodified.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AdapterOptions {
    /// Names under which successful results are collected into an object,
    /// positionally.
    pub resolve_multiple: Vec<String>,

    /// Names under which results reported alongside an error are attached to
    /// the rejection, positionally.
    pub reject_multiple: Vec<String>,

    /// Resolve with every result as an array instead of only the first.
    /// Ignored when `resolve_multiple` is non-empty.
    pub return_array: bool,
}

impl AdapterOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_resolve_multiple<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.resolve_multiple = names.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_reject_multiple<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.reject_multiple = names.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_return_array(mut self, return_array: bool) -> Self {
        self.return_array = return_array;
        self
    }

    /// Checks that every field name is a non-empty string.
    pub fn validate(&self) -> Result<()> {
        for (field, names) in [
            ("options.resolveMultiple", &self.resolve_multiple),
            ("options.rejectMultiple", &self.reject_multiple),
        ] {
            for (index, name) in names.iter().enumerate() {
                checks::ensure_non_empty_string(name, &format!("{field}[{index}]"))?;
            }
        }
        Ok(())
    }

    /// Builds options from a loosely typed JSON value, checking each field's
    /// shape the way a dynamic caller would expect.
    ///
    /// `Null` yields the defaults. Unknown keys are ignored.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidArgument`] naming the offending field when `value` is
    /// not an object, a name list is not an array of strings, or
    /// `returnArray` is not a boolean.
    pub fn from_value(value: &Value) -> Result<Self> {
        if value.is_null() {
            return Ok(Self::default());
        }

        let mut options = Self::default();
        for (key, field) in checks::ensure_object(value, "options")? {
            match camel_case(key).as_str() {
                "resolveMultiple" => {
                    options.resolve_multiple =
                        checks::ensure_array_of_strings(field, "options.resolveMultiple")?;
                }
                "rejectMultiple" => {
                    options.reject_multiple =
                        checks::ensure_array_of_strings(field, "options.rejectMultiple")?;
                }
                "returnArray" => {
                    options.return_array = checks::ensure_boolean(field, "options.returnArray")?;
                }
                _ => {}
            }
        }

        options.validate()?;
        Ok(options)
    }
}

/// Initial setup of a pub/sub logger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LoggerOptions {
    /// Minimum level printed by the console subscriber.
    pub level: LogLevel,

    /// Register a subscriber printing records to stdout.
    pub console: bool,

    /// Register a subscriber forwarding records to `tracing`.
    pub tracing: bool,
}

impl Default for LoggerOptions {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            console: false,
            tracing: true,
        }
    }
}

impl LoggerOptions {
    pub fn with_level(mut self, level: LogLevel) -> Self {
        self.level = level;
        self
    }

    pub fn with_console(mut self, console: bool) -> Self {
        self.console = console;
        self
    }

    pub fn with_tracing(mut self, tracing: bool) -> Self {
        self.tracing = tracing;
        self
    }

    /// Parses options from JSON, e.g. `{"level": "warn", "console": true}`.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| Error::Config(format!("Invalid logger options: {}", e)))
    }
}
