//! # Event Sources
//!
//! The contract the timed-event race is written against, plus an in-process
//! named-event emitter implementing it.
//!
//! ## Overview
//!
//! An [`EventSource`] only has to do two things: register a listener that is
//! invoked at most once for a named event, and remove a previously registered
//! listener. Listeners are compared by identity (`Arc::ptr_eq`), so the same
//! [`Listener`] handle that was registered must be passed to
//! [`EventSource::remove_listener`].
//!
//! [`EventEmitter`] is the stock implementation: persistent (`on`) and
//! one-shot (`once`) listeners keyed by event name, with arguments passed as
//! `serde_json::Value`s.
//!
//! ## Usage
//!
//! ```rust
//! use settle_runtime::events::{listener, EventEmitter, EventSource};
//! use serde_json::json;
//!
//! let emitter = EventEmitter::new();
//! emitter.once("ready", listener(|args| println!("ready with {:?}", args)));
//!
//! assert!(emitter.emit("ready", &[json!(1)]));
//! assert!(!emitter.emit("ready", &[json!(2)])); // one-shot, already consumed
//! ```
//!
//! ## Re-entrancy
//!
//! `emit` snapshots the listeners to invoke and releases its lock before
//! calling them, so a listener may register, remove or emit on the same
//! emitter. One-shot listeners are removed before they run.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::Value;
use tracing::trace;

/// A shared, identity-comparable event handler.
pub type Listener = Arc<dyn Fn(&[Value]) + Send + Sync>;

/// Wraps a closure into a [`Listener`].
pub fn listener<F>(handler: F) -> Listener
where
    F: Fn(&[Value]) + Send + Sync + 'static,
{
    Arc::new(handler)
}

/// Anything that can register one-shot named-event listeners and remove them.
///
/// The source is owned by the caller and may be shared with other listeners;
/// implementations must not assume a single subscriber per event name.
pub trait EventSource: Send + Sync {
    /// Registers `listener` to be invoked at most once, with the emitted
    /// arguments, the next time `name` is emitted.
    fn once(&self, name: &str, listener: Listener);

    /// Deregisters `listener` for `name`. A no-op when it is not registered
    /// (already fired or already removed).
    fn remove_listener(&self, name: &str, listener: &Listener);
}

struct Entry {
    listener: Listener,
    once: bool,
}

/// In-process named-event emitter.
#[derive(Default)]
pub struct EventEmitter {
    listeners: Mutex<HashMap<String, Vec<Entry>>>,
}

impl EventEmitter {
    /// Creates an emitter with no listeners.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a persistent listener for `name`.
    pub fn on(&self, name: impl Into<String>, listener: Listener) {
        self.add(name.into(), listener, false);
    }

    /// Invokes every listener registered for `name` with `args`, in
    /// registration order.
    ///
    /// Returns true if the event had listeners.
    pub fn emit(&self, name: &str, args: &[Value]) -> bool {
        let to_call: Vec<Listener> = {
            let mut listeners = self.listeners.lock();
            let Some(entries) = listeners.get_mut(name) else {
                return false;
            };
            let to_call = entries.iter().map(|e| Arc::clone(&e.listener)).collect();
            entries.retain(|e| !e.once);
            if entries.is_empty() {
                listeners.remove(name);
            }
            to_call
        };

        trace!(event = name, listeners = to_call.len(), "emitting event");

        for listener in &to_call {
            listener(args);
        }
        !to_call.is_empty()
    }

    /// Number of listeners currently registered for `name`.
    pub fn listener_count(&self, name: &str) -> usize {
        self.listeners.lock().get(name).map_or(0, Vec::len)
    }

    /// Names of events that currently have listeners.
    pub fn event_names(&self) -> Vec<String> {
        self.listeners.lock().keys().cloned().collect()
    }

    fn add(&self, name: String, listener: Listener, once: bool) {
        self.listeners
            .lock()
            .entry(name)
            .or_default()
            .push(Entry { listener, once });
    }
}

impl EventSource for EventEmitter {
    fn once(&self, name: &str, listener: Listener) {
        self.add(name.to_owned(), listener, true);
    }

    fn remove_listener(&self, name: &str, listener: &Listener) {
        let mut listeners = self.listeners.lock();
        let Some(entries) = listeners.get_mut(name) else {
            return;
        };
        if let Some(index) = entries
            .iter()
            .position(|e| Arc::ptr_eq(&e.listener, listener))
        {
            entries.remove(index);
        }
        if entries.is_empty() {
            listeners.remove(name);
        }
    }
}

impl fmt::Debug for EventEmitter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let listeners = self.listeners.lock();
        let counts: HashMap<&str, usize> = listeners
            .iter()
            .map(|(name, entries)| (name.as_str(), entries.len()))
            .collect();
        f.debug_struct("EventEmitter")
            .field("listeners", &counts)
            .finish()
    }
}
