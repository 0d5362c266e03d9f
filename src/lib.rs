//! Workspace facade crate.
//!
//! Re-exports the settle crates so host applications can depend on
//! `settle-workspace` alone:
//!
//! - [`waits`]: `promisify`, timed event races, `wait_for_event`,
//!   `wait_for_non_event` and `delay`
//! - [`runtime`]: errors, options, event sources and logging
//! - [`rt`]: the async runtime abstraction (`block_on`, `spawn`, timers)

pub use settle_async as rt;
pub use settle_runtime as runtime;
pub use settle_waits as waits;

pub use settle_runtime::events::{EventEmitter, EventSource};
pub use settle_runtime::{Error, Result};
pub use settle_waits::{
    attach_timed_event_callback, delay, promisify, wait_for_event, wait_for_non_event,
    Completion, Rejection, Settlement, TimedEvent, TimeoutSpec, WaitError,
};
