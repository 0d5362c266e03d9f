//! # Settle Waits
//!
//! Small primitives for waiting on asynchronous outcomes:
//!
//! - [`promisify`]: adapt a callback-style function so each call returns a
//!   [`Settlement`]
//! - [`race::attach_timed_event_callback`]: race one named event against one
//!   timer, winner takes all
//! - [`wait_for_event`] / [`wait_for_non_event`]: the race as a settlement
//! - [`delay`]: sleep and report the elapsed time
//!
//! Setup functions validate their arguments up front and return
//! [`settle_runtime::Error`]; race outcomes are only ever reported through
//! the returned settlement.

pub mod error;
pub mod promisify;
pub mod race;
pub mod settlement;
pub mod waits;

pub use error::{Abandon, CompletionDropped, Rejection, WaitError};
pub use promisify::{promisify, Completion, Promisified};
pub use race::{attach_timed_event_callback, TimedEvent, TimeoutSpec};
pub use settlement::Settlement;
pub use waits::{delay, wait_for_event, wait_for_non_event, Delay};
