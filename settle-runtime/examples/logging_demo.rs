//! Logging system demonstration
//!
//! Shows process-wide `tracing` output alongside a pub/sub logger that
//! mirrors every event.
//!
//! Run with:
//! ```bash
//! # Pretty format (default in debug)
//! cargo run -p settle-runtime --example logging_demo
//!
//! # JSON format
//! cargo run -p settle-runtime --example logging_demo -- json
//!
//! # Compact format with custom filter
//! cargo run -p settle-runtime --example logging_demo -- compact "logging_demo=trace"
//! ```

use std::env;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use settle_runtime::config::LoggerOptions;
use settle_runtime::logging::{init_logging, LogFormat, LogLevel, Logger, LoggingConfig};
use tracing::{debug, error, info, span, trace, warn, Level};

fn main() -> Result<(), settle_runtime::Error> {
    let args: Vec<String> = env::args().collect();

    let format = match args.get(1).map(String::as_str) {
        Some("json") => LogFormat::Json,
        Some("compact") => LogFormat::Compact,
        Some("pretty") => LogFormat::Pretty,
        _ => LogFormat::default(),
    };

    // Console output of the pub/sub logger only shows warn and above.
    let logger = Logger::new(
        "demo",
        LoggerOptions::default()
            .with_level(LogLevel::Warn)
            .with_console(true)
            .with_tracing(false),
    )?;

    let mirrored = Arc::new(AtomicUsize::new(0));
    let counter = mirrored.clone();
    let registration = logger.register(move |_| {
        counter.fetch_add(1, Ordering::Relaxed);
    });

    let mut config = LoggingConfig::default()
        .with_format(format)
        .with_level(LogLevel::Trace)
        .with_spans(true)
        .with_logger(logger.clone());
    if let Some(filter) = args.get(2) {
        config = config.with_filter(filter.clone());
    }
    init_logging(config)?;

    info!(format = ?format, "Logging initialized");

    demo_log_levels();
    demo_structured_logging();

    logger.error("published directly to the logger");

    registration.deregister();
    info!(
        mirrored = mirrored.load(Ordering::Relaxed),
        "Demo complete"
    );
    Ok(())
}

fn demo_log_levels() {
    let span = span!(Level::INFO, "log_levels");
    let _enter = span.enter();

    trace!("This is a TRACE level log");
    debug!("This is a DEBUG level log");
    info!("This is an INFO level log");
    warn!("This is a WARN level log");
    error!("This is an ERROR level log");
}

fn demo_structured_logging() {
    let span = span!(Level::INFO, "structured_logging");
    let _enter = span.enter();

    info!(event = "ready", interval_ms = 500, "Waiting for event");
    debug!(settled = true, "Race settled");
}
