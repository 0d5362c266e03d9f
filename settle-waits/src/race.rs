//! # Timed Event Race
//!
//! Races one named event on an [`EventSource`] against one timer. Exactly
//! one side wins: either the event callback or the timeout callback runs,
//! never both, even when the emitter fires right at expiry or keeps emitting
//! after its listener was removed.
//!
//! ## How it works
//!
//! Each race owns a small shared state:
//!
//! ```text
//!   armed ──(CAS)──► settled
//!     │                 ▲
//!     ├── listener fires: CAS, cancel timer, event callback
//!     └── timer expires:  CAS, remove listener, timeout callback
//! ```
//!
//! The compare-and-swap is the first thing either trigger does, so the
//! loser bails out before touching anything. The winner cleans up the other
//! side: a fired listener was already consumed by `once`, and the timer path
//! removes the listener explicitly.
//!
//! ## Usage
//!
//! ```rust
//! use std::sync::Arc;
//! use std::time::Duration;
//! use settle_runtime::events::EventEmitter;
//! use settle_waits::race::{attach_timed_event_callback, TimedEvent, TimeoutSpec};
//!
//! # #[settle_async::main]
//! # async fn main() -> settle_runtime::Result<()> {
//! let emitter = Arc::new(EventEmitter::new());
//! attach_timed_event_callback(
//!     TimedEvent::new(emitter.clone(), "ready", |args| println!("ready: {:?}", args)),
//!     TimeoutSpec::after(Duration::from_millis(100), || println!("gave up")),
//! )?;
//! emitter.emit("ready", &[]);
//! # Ok(())
//! # }
//! ```

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use serde_json::Value;
use settle_async::Timer;
use settle_runtime::checks;
use settle_runtime::events::{listener, EventSource, Listener};
use settle_runtime::{Error, Result};
use tracing::{debug, trace};

type EventCallback = Box<dyn FnOnce(Vec<Value>) + Send>;
type TimeoutCallback = Box<dyn FnOnce() + Send>;

/// The event side of a race.
pub struct TimedEvent {
    /// Source the listener is registered on. Shared with the caller.
    pub emitter: Arc<dyn EventSource>,
    /// Event name; must be non-empty.
    pub name: String,
    /// Runs with the emitted arguments if the event wins.
    pub callback: EventCallback,
}

impl TimedEvent {
    pub fn new<F>(emitter: Arc<dyn EventSource>, name: impl Into<String>, callback: F) -> Self
    where
        F: FnOnce(Vec<Value>) + Send + 'static,
    {
        Self {
            emitter,
            name: name.into(),
            callback: Box::new(callback),
        }
    }
}

impl fmt::Debug for TimedEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TimedEvent")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// The timer side of a race.
pub struct TimeoutSpec {
    /// Time to wait for the event. `None` arms no timer: the race can then
    /// only end by the event firing.
    pub interval: Option<Duration>,
    /// Runs if the timer wins.
    pub callback: TimeoutCallback,
}

impl TimeoutSpec {
    pub fn new<F>(interval: Option<Duration>, callback: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        Self {
            interval,
            callback: Box::new(callback),
        }
    }

    pub fn after<F>(interval: Duration, callback: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        Self::new(Some(interval), callback)
    }

    /// No timer; the event is awaited indefinitely.
    pub fn never() -> Self {
        Self::new(None, || {})
    }
}

impl fmt::Debug for TimeoutSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TimeoutSpec")
            .field("interval", &self.interval)
            .finish_non_exhaustive()
    }
}

/// State shared by the listener and the timer of one race. Armed until
/// `settled` flips; the flip is the only way to reach a consumer callback.
struct RaceState {
    name: String,
    settled: AtomicBool,
    timer: Mutex<Option<Timer>>,
    on_event: Mutex<Option<EventCallback>>,
    on_timeout: Mutex<Option<TimeoutCallback>>,
}

impl RaceState {
    fn new(name: String, on_event: EventCallback, on_timeout: TimeoutCallback) -> Self {
        Self {
            name,
            settled: AtomicBool::new(false),
            timer: Mutex::new(None),
            on_event: Mutex::new(Some(on_event)),
            on_timeout: Mutex::new(Some(on_timeout)),
        }
    }

    /// Moves the race from armed to settled. Only the first caller wins.
    fn try_settle(&self) -> bool {
        self.settled
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    fn is_settled(&self) -> bool {
        self.settled.load(Ordering::Acquire)
    }

    fn on_event(&self, args: &[Value]) {
        if !self.try_settle() {
            trace!(event = %self.name, "event after race settled, ignoring");
            return;
        }

        let timer = self.timer.lock().take();
        if let Some(timer) = timer {
            timer.cancel();
        }
        debug!(event = %self.name, args = args.len(), "race settled by event");

        let callback = self.on_event.lock().take();
        self.on_timeout.lock().take();
        if let Some(callback) = callback {
            callback(args.to_vec());
        }
    }

    fn on_timeout(&self, emitter: &dyn EventSource, listener: &Listener) {
        if !self.try_settle() {
            trace!(event = %self.name, "timer after race settled, ignoring");
            return;
        }

        self.timer.lock().take();
        emitter.remove_listener(&self.name, listener);
        debug!(event = %self.name, "race settled by timeout");

        let callback = self.on_timeout.lock().take();
        self.on_event.lock().take();
        if let Some(callback) = callback {
            callback();
        }
    }
}

/// Races `event` against `timeout`; whichever fires first runs its
/// callback and the other never does.
///
/// # Errors
///
/// Everything is checked before a listener is registered or a timer armed:
///
/// - [`Error::InvalidArgument`] if `event.name` is empty or
///   `timeout.interval` is zero.
/// - [`Error::CapabilityMissing`] if an interval is given but no async
///   runtime is running on the calling thread.
pub fn attach_timed_event_callback(event: TimedEvent, timeout: TimeoutSpec) -> Result<()> {
    checks::ensure_non_empty_string(&event.name, "event.name")?;
    if let Some(interval) = timeout.interval {
        checks::ensure_positive_duration(interval, "timeout.interval")?;
        settle_async::runtime::current().map_err(timer_unavailable)?;
    }

    let TimedEvent {
        emitter,
        name,
        callback,
    } = event;
    let state = Arc::new(RaceState::new(name, callback, timeout.callback));

    let race_listener = {
        let state = Arc::clone(&state);
        listener(move |args| state.on_event(args))
    };

    if let Some(interval) = timeout.interval {
        let expired = {
            let state = Arc::clone(&state);
            let emitter = Arc::clone(&emitter);
            let race_listener = Arc::clone(&race_listener);
            move || state.on_timeout(emitter.as_ref(), &race_listener)
        };
        let timer = Timer::start(interval, expired).map_err(timer_unavailable)?;
        *state.timer.lock() = Some(timer);
    }

    emitter.once(&state.name, Arc::clone(&race_listener));

    // A very short timer may expire on another worker before the listener
    // is registered; keep registrations balanced.
    if state.is_settled() {
        emitter.remove_listener(&state.name, &race_listener);
    }

    debug!(event = %state.name, interval = ?timeout.interval, "race armed");
    Ok(())
}

fn timer_unavailable(err: settle_async::RuntimeUnavailable) -> Error {
    Error::CapabilityMissing {
        capability: "Timer".to_string(),
        message: err.to_string(),
    }
}
