//! # Settle Runtime
//!
//! Foundational pieces shared by the settle crates:
//! - Error type and argument checks
//! - Option records for the adapters and loggers
//! - The event-source contract and an in-process emitter
//! - Logging: `tracing-subscriber` setup and a pub/sub logger
//!
//! ## Overview
//!
//! Nothing in this crate is asynchronous. The waiting primitives in
//! `settle-waits` are written against [`events::EventSource`] and report
//! setup failures through [`Error`].

pub mod checks;
pub mod config;
pub mod error;
pub mod events;
pub mod logging;
pub mod strings;

pub use error::{Error, Result};
