//! Synchronization primitives.
//!
//! Channels used to hand a settled value from a callback (listener, timer,
//! completion) back to the task awaiting it.

pub use tokio::sync::oneshot;
