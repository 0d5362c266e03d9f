//! # Logging & Tracing Infrastructure
//!
//! Two halves:
//!
//! - **Process logging**: [`init_logging`] installs a `tracing-subscriber`
//!   registry (Pretty, JSON or Compact output, `EnvFilter` filtering). All
//!   settle crates log through `tracing` macros.
//! - **Pub/sub logger**: [`Logger`] is a named logger owning an explicit
//!   registry of subscriber functions. [`Logger::register`] returns a
//!   [`Registration`] capability used to deregister. Optional stock
//!   subscribers forward records to `tracing` or print them to stdout above
//!   a level threshold.
//!
//! The two halves meet in [`LoggingConfig::with_logger`]: every `tracing`
//! event that survives filtering is mirrored into the logger's subscribers.
//!
//! ## Usage
//!
//! ```ignore
//! use settle_runtime::config::LoggerOptions;
//! use settle_runtime::logging::{init_logging, LogFormat, LogLevel, Logger, LoggingConfig};
//!
//! let logger = Logger::new("jobs", LoggerOptions::default().with_tracing(false))?;
//! let registration = logger.register(|record| eprintln!("{}", record.message));
//!
//! init_logging(
//!     LoggingConfig::default()
//!         .with_format(LogFormat::Compact)
//!         .with_level(LogLevel::Debug)
//!         .with_logger(logger.clone()),
//! )?;
//!
//! logger.warn("queue is backing up");
//! tracing::info!("mirrored into the logger too");
//! registration.deregister();
//! ```

use std::cell::Cell;
use std::collections::HashMap;
use std::fmt;
use std::io::{self, Write};
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use chrono::{DateTime, Utc};
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use tracing::field::{Field, Visit};
use tracing::{Event, Subscriber as TracingSubscriber};
use tracing_subscriber::{
    filter::EnvFilter,
    layer::{Context, SubscriberExt},
    registry::LookupSpan,
    util::SubscriberInitExt,
    Layer,
};

use crate::checks;
use crate::config::LoggerOptions;
use crate::error::{Error, Result};

/// `tracing` target used by the stock subscriber that forwards logger
/// records. [`LoggerLayer`] skips it so records never loop back.
pub const LOGGER_TARGET: &str = "settle_runtime::logger";

/// Log level
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LogLevel {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "trace" => Ok(LogLevel::Trace),
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" => Ok(LogLevel::Warn),
            "error" => Ok(LogLevel::Error),
            other => Err(Error::InvalidArgument(format!("Invalid level \"{}\"", other))),
        }
    }
}

impl From<tracing::Level> for LogLevel {
    fn from(level: tracing::Level) -> Self {
        match level {
            tracing::Level::TRACE => LogLevel::Trace,
            tracing::Level::DEBUG => LogLevel::Debug,
            tracing::Level::INFO => LogLevel::Info,
            tracing::Level::WARN => LogLevel::Warn,
            tracing::Level::ERROR => LogLevel::Error,
        }
    }
}

// ============================================================================
// Pub/sub logger
// ============================================================================

/// Structured record delivered to logger subscribers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogRecord {
    pub level: LogLevel,
    pub timestamp: DateTime<Utc>,
    /// Name of the logger that published the record
    pub logger: String,
    /// Origin of the record: the logger name, or the `tracing` target when
    /// mirrored by [`LoggerLayer`]
    pub target: String,
    pub message: String,
    pub fields: HashMap<String, String>,
}

impl LogRecord {
    pub fn new(
        level: LogLevel,
        logger: impl Into<String>,
        target: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            level,
            timestamp: Utc::now(),
            logger: logger.into(),
            target: target.into(),
            message: message.into(),
            fields: HashMap::new(),
        }
    }

    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }
}

/// A function receiving every record published by a [`Logger`].
pub type Subscriber = Arc<dyn Fn(&LogRecord) + Send + Sync>;

struct LoggerInner {
    name: String,
    level: Arc<RwLock<LogLevel>>,
    subscribers: Mutex<Vec<(u64, Subscriber)>>,
    next_id: AtomicU64,
}

impl LoggerInner {
    fn add(&self, subscriber: Subscriber) -> u64 {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.subscribers.lock().push((id, subscriber));
        id
    }
}

/// Named pub/sub logger.
///
/// Cloning yields another handle to the same registry.
#[derive(Clone)]
pub struct Logger {
    inner: Arc<LoggerInner>,
}

impl Logger {
    /// Creates a logger, registering the stock subscribers requested by
    /// `options`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if `name` is empty.
    pub fn new(name: impl Into<String>, options: LoggerOptions) -> Result<Self> {
        let name = name.into();
        checks::ensure_non_empty_string(&name, "name")?;

        let logger = Self {
            inner: Arc::new(LoggerInner {
                name,
                level: Arc::new(RwLock::new(options.level)),
                subscribers: Mutex::new(Vec::new()),
                next_id: AtomicU64::new(0),
            }),
        };

        if options.tracing {
            logger.inner.add(Arc::new(forward_to_tracing));
        }
        if options.console {
            logger.inner.add(console_subscriber(
                Arc::clone(&logger.inner.level),
                Arc::new(Mutex::new(io::stdout())),
            ));
        }

        Ok(logger)
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Current threshold of the console subscriber.
    pub fn level(&self) -> LogLevel {
        *self.inner.level.read()
    }

    pub fn set_level(&self, level: LogLevel) {
        *self.inner.level.write() = level;
    }

    /// Adds `subscriber` to the registry. It receives every record,
    /// regardless of the logger level.
    pub fn register<F>(&self, subscriber: F) -> Registration
    where
        F: Fn(&LogRecord) + Send + Sync + 'static,
    {
        let id = self.inner.add(Arc::new(subscriber));
        Registration {
            id,
            logger: Arc::downgrade(&self.inner),
        }
    }

    /// Number of registered subscribers, stock ones included.
    pub fn subscriber_count(&self) -> usize {
        self.inner.subscribers.lock().len()
    }

    /// Delivers `record` to every subscriber registered at the time of the
    /// call. Subscribers added or removed during delivery do not affect it.
    pub fn publish(&self, record: &LogRecord) {
        let subscribers: Vec<Subscriber> = self
            .inner
            .subscribers
            .lock()
            .iter()
            .map(|(_, s)| Arc::clone(s))
            .collect();

        for subscriber in subscribers {
            subscriber(record);
        }
    }

    pub fn log(&self, level: LogLevel, message: impl Into<String>) {
        let record = LogRecord::new(level, self.name(), self.name(), message);
        self.publish(&record);
    }

    pub fn trace(&self, message: impl Into<String>) {
        self.log(LogLevel::Trace, message);
    }

    pub fn debug(&self, message: impl Into<String>) {
        self.log(LogLevel::Debug, message);
    }

    pub fn info(&self, message: impl Into<String>) {
        self.log(LogLevel::Info, message);
    }

    pub fn warn(&self, message: impl Into<String>) {
        self.log(LogLevel::Warn, message);
    }

    pub fn error(&self, message: impl Into<String>) {
        self.log(LogLevel::Error, message);
    }
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger")
            .field("name", &self.inner.name)
            .field("level", &self.level())
            .field("subscriber_count", &self.subscriber_count())
            .finish()
    }
}

/// Capability returned by [`Logger::register`].
#[derive(Debug)]
pub struct Registration {
    id: u64,
    logger: Weak<LoggerInner>,
}

impl Registration {
    /// Removes the subscriber. Idempotent; a no-op once the logger is gone.
    pub fn deregister(&self) {
        let Some(logger) = self.logger.upgrade() else {
            return;
        };
        logger.subscribers.lock().retain(|(id, _)| *id != self.id);
    }

    /// Whether the subscriber is still registered.
    pub fn is_registered(&self) -> bool {
        let Some(logger) = self.logger.upgrade() else {
            return false;
        };
        let registered = logger.subscribers.lock().iter().any(|(id, _)| *id == self.id);
        registered
    }
}

impl fmt::Debug for LoggerInner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoggerInner")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

fn forward_to_tracing(record: &LogRecord) {
    let logger = record.logger.as_str();
    let message = record.message.as_str();
    match record.level {
        LogLevel::Trace => tracing::trace!(target: LOGGER_TARGET, logger, "{}", message),
        LogLevel::Debug => tracing::debug!(target: LOGGER_TARGET, logger, "{}", message),
        LogLevel::Info => tracing::info!(target: LOGGER_TARGET, logger, "{}", message),
        LogLevel::Warn => tracing::warn!(target: LOGGER_TARGET, logger, "{}", message),
        LogLevel::Error => tracing::error!(target: LOGGER_TARGET, logger, "{}", message),
    }
}

fn console_subscriber<W>(threshold: Arc<RwLock<LogLevel>>, out: Arc<Mutex<W>>) -> Subscriber
where
    W: Write + Send + 'static,
{
    Arc::new(move |record: &LogRecord| {
        if record.level < *threshold.read() {
            return;
        }
        let mut out = out.lock();
        if let Err(err) = writeln!(out, "{}", record.message) {
            eprintln!("console subscriber error: {}", err);
        }
    })
}

// ============================================================================
// tracing-subscriber setup
// ============================================================================

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable pretty format with colors
    Pretty,
    /// Structured JSON format for machine parsing
    Json,
    /// Compact format for production
    Compact,
}

impl Default for LogFormat {
    fn default() -> Self {
        #[cfg(debug_assertions)]
        return Self::Pretty;

        #[cfg(not(debug_assertions))]
        return Self::Json;
    }
}

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Output format
    pub format: LogFormat,
    /// Minimum log level
    pub level: LogLevel,
    /// Custom filter string (e.g., "settle_waits=trace,settle_runtime=debug")
    pub filter: Option<String>,
    /// Pub/sub logger mirroring every filtered event
    pub logger: Option<Logger>,
    /// Enable span contexts
    pub enable_spans: bool,
    /// Display target module in logs
    pub display_target: bool,
    /// Display thread info
    pub display_thread_info: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::default(),
            level: LogLevel::Info,
            filter: None,
            logger: None,
            enable_spans: true,
            display_target: true,
            display_thread_info: false,
        }
    }
}

impl LoggingConfig {
    /// Set log format
    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    /// Set minimum log level
    pub fn with_level(mut self, level: LogLevel) -> Self {
        self.level = level;
        self
    }

    /// Set custom filter string
    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = Some(filter.into());
        self
    }

    /// Mirror events into a pub/sub logger.
    ///
    /// Events emitted by a subscriber while it handles a mirrored record
    /// still reach the fmt output but are not mirrored again.
    pub fn with_logger(mut self, logger: Logger) -> Self {
        self.logger = Some(logger);
        self
    }

    /// Enable or disable span contexts
    pub fn with_spans(mut self, enable: bool) -> Self {
        self.enable_spans = enable;
        self
    }

    /// Enable or disable target display
    pub fn with_target(mut self, display: bool) -> Self {
        self.display_target = display;
        self
    }

    /// Enable or disable thread info
    pub fn with_thread_info(mut self, display: bool) -> Self {
        self.display_thread_info = display;
        self
    }
}

/// Initialize the logging system
///
/// This should be called once during application startup. Subsequent calls
/// will return an error.
///
/// # Errors
///
/// Returns [`Error::Config`] if:
/// - Logging is already initialized
/// - The filter string is invalid
pub fn init_logging(config: LoggingConfig) -> Result<()> {
    let filter = build_filter(&config)?;

    match config.format {
        LogFormat::Pretty => init_pretty_logging(config, filter),
        LogFormat::Json => init_json_logging(config, filter),
        LogFormat::Compact => init_compact_logging(config, filter),
    }
}

fn build_filter(config: &LoggingConfig) -> Result<EnvFilter> {
    let filter_string = if let Some(custom_filter) = &config.filter {
        custom_filter.clone()
    } else {
        // Our crates at the configured level, everything else at warn
        let level = config.level.as_str();
        format!(
            "warn,{}={level},settle_async={level},settle_runtime={level},settle_waits={level}",
            env!("CARGO_PKG_NAME").replace('-', "_"),
        )
    };

    EnvFilter::try_new(filter_string)
        .map_err(|e| Error::Config(format!("Invalid log filter: {}", e)))
}

fn init_pretty_logging(config: LoggingConfig, filter: EnvFilter) -> Result<()> {
    let fmt_layer = tracing_subscriber::fmt::layer()
        .pretty()
        .with_target(config.display_target)
        .with_thread_ids(config.display_thread_info)
        .with_thread_names(config.display_thread_info)
        .with_span_events(if config.enable_spans {
            tracing_subscriber::fmt::format::FmtSpan::ACTIVE
        } else {
            tracing_subscriber::fmt::format::FmtSpan::NONE
        })
        .with_writer(io::stdout);

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .with(LoggerLayer::new(config.logger))
        .try_init()
        .map_err(|e| Error::Config(format!("Failed to initialize logging: {}", e)))
}

fn init_json_logging(config: LoggingConfig, filter: EnvFilter) -> Result<()> {
    let fmt_layer = tracing_subscriber::fmt::layer()
        .json()
        .flatten_event(true)
        .with_current_span(config.enable_spans)
        .with_span_list(config.enable_spans)
        .with_target(config.display_target)
        .with_thread_ids(config.display_thread_info)
        .with_thread_names(config.display_thread_info)
        .with_writer(io::stdout);

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .with(LoggerLayer::new(config.logger))
        .try_init()
        .map_err(|e| Error::Config(format!("Failed to initialize logging: {}", e)))
}

fn init_compact_logging(config: LoggingConfig, filter: EnvFilter) -> Result<()> {
    let fmt_layer = tracing_subscriber::fmt::layer()
        .compact()
        .with_target(config.display_target)
        .with_thread_ids(config.display_thread_info)
        .with_thread_names(config.display_thread_info)
        .with_writer(io::stdout);

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .with(LoggerLayer::new(config.logger))
        .try_init()
        .map_err(|e| Error::Config(format!("Failed to initialize logging: {}", e)))
}

/// Layer that mirrors `tracing` events into a pub/sub [`Logger`].
pub struct LoggerLayer {
    logger: Option<Logger>,
}

impl LoggerLayer {
    pub fn new(logger: Option<Logger>) -> Self {
        Self { logger }
    }
}

impl<S> Layer<S> for LoggerLayer
where
    S: TracingSubscriber + for<'a> LookupSpan<'a>,
{
    fn on_event(&self, event: &Event<'_>, ctx: Context<'_, S>) {
        let Some(logger) = self.logger.as_ref() else {
            return;
        };

        let metadata = event.metadata();
        if metadata.target() == LOGGER_TARGET {
            return;
        }
        let Some(_guard) = MirrorGuard::enter() else {
            return;
        };

        let mut visitor = RecordVisitor::default();
        event.record(&mut visitor);

        let message = visitor
            .message
            .unwrap_or_else(|| metadata.name().to_string());

        let mut record = LogRecord::new(
            LogLevel::from(*metadata.level()),
            logger.name(),
            metadata.target(),
            message,
        );
        record.fields = visitor.fields;

        if let Some(span) = ctx.lookup_current() {
            record = record.with_field("span", span.name());
        }

        logger.publish(&record);
    }
}

thread_local! {
    static MIRRORING: Cell<bool> = const { Cell::new(false) };
}

/// Marks the current thread as delivering a mirrored record.
struct MirrorGuard;

impl MirrorGuard {
    fn enter() -> Option<Self> {
        if MIRRORING.with(|mirroring| mirroring.replace(true)) {
            return None;
        }
        Some(MirrorGuard)
    }
}

impl Drop for MirrorGuard {
    fn drop(&mut self) {
        MIRRORING.with(|mirroring| mirroring.set(false));
    }
}

#[derive(Default)]
struct RecordVisitor {
    message: Option<String>,
    fields: HashMap<String, String>,
}

impl RecordVisitor {
    fn record_value(&mut self, field: &Field, value: String) {
        if field.name() == "message" {
            self.message = Some(value);
        } else {
            self.fields.insert(field.name().to_string(), value);
        }
    }
}

impl Visit for RecordVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        self.record_value(field, value.to_string());
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.record_value(field, value.to_string());
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.record_value(field, value.to_string());
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.record_value(field, value.to_string());
    }

    fn record_f64(&mut self, field: &Field, value: f64) {
        self.record_value(field, value.to_string());
    }

    fn record_error(&mut self, field: &Field, value: &(dyn std::error::Error + 'static)) {
        self.record_value(field, value.to_string());
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        self.record_value(field, format!("{:?}", value));
    }
}
