//! Future-returning waits built on the timed event race, plus [`delay`].

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;

use serde_json::Value;
use settle_async::time::{sleep, Instant, Sleep};
use settle_runtime::events::EventSource;
use settle_runtime::Result;

use crate::error::WaitError;
use crate::race::{attach_timed_event_callback, TimedEvent, TimeoutSpec};
use crate::settlement::{self, Settlement};

/// Waits for `name` to be emitted.
///
/// Resolves with the first emitted argument (`Null` if the event carried
/// none). With an `interval`, rejects with [`WaitError::TimedOut`] if the
/// event does not arrive in time; without one, it may stay pending forever.
///
/// # Errors
///
/// Same preconditions as
/// [`attach_timed_event_callback`](crate::race::attach_timed_event_callback).
///
/// # Examples
///
/// ```rust
/// use std::sync::Arc;
/// use std::time::Duration;
/// use serde_json::json;
/// use settle_runtime::events::EventEmitter;
/// use settle_waits::wait_for_event;
///
/// # #[settle_async::main]
/// # async fn main() -> anyhow::Result<()> {
/// let emitter = Arc::new(EventEmitter::new());
/// let ready = wait_for_event(emitter.clone(), "ready", Some(Duration::from_secs(1)))?;
///
/// emitter.emit("ready", &[json!("go"), json!("ignored")]);
/// assert_eq!(ready.await?, json!("go"));
/// # Ok(())
/// # }
/// ```
pub fn wait_for_event(
    emitter: Arc<dyn EventSource>,
    name: impl Into<String>,
    interval: Option<Duration>,
) -> Result<Settlement<Value, WaitError>> {
    let name = name.into();
    let (settler, settlement) = settlement::channel();

    let on_timeout = {
        let settler = settler.clone();
        let name = name.clone();
        let waited = interval.unwrap_or_default();
        move || {
            settler.settle(Err(WaitError::TimedOut {
                name,
                interval: waited,
            }));
        }
    };
    let on_event = move |args: Vec<Value>| {
        settler.settle(Ok(args.into_iter().next().unwrap_or(Value::Null)));
    };

    attach_timed_event_callback(
        TimedEvent::new(emitter, name, on_event),
        TimeoutSpec::new(interval, on_timeout),
    )?;
    Ok(settlement)
}

/// Waits for `name` *not* to be emitted within `interval`.
///
/// Resolves with `()` once the interval passes quietly; rejects with
/// [`WaitError::EventEmitted`], carrying the first emitted argument, if the
/// event fires first. Without an interval it can only ever reject.
///
/// # Errors
///
/// Same preconditions as
/// [`attach_timed_event_callback`](crate::race::attach_timed_event_callback).
pub fn wait_for_non_event(
    emitter: Arc<dyn EventSource>,
    name: impl Into<String>,
    interval: Option<Duration>,
) -> Result<Settlement<(), WaitError>> {
    let name = name.into();
    let (settler, settlement) = settlement::channel();

    let on_timeout = {
        let settler = settler.clone();
        move || {
            settler.settle(Ok(()));
        }
    };
    let on_event = {
        let name = name.clone();
        move |args: Vec<Value>| {
            settler.settle(Err(WaitError::EventEmitted {
                name,
                value: args.into_iter().next().unwrap_or(Value::Null),
            }));
        }
    };

    attach_timed_event_callback(
        TimedEvent::new(emitter, name, on_event),
        TimeoutSpec::new(interval, on_timeout),
    )?;
    Ok(settlement)
}

/// Resolves after `interval` with the time actually elapsed since the call.
///
/// The deadline is fixed when `delay` is called; the timer itself is only
/// registered with the runtime on first poll.
pub fn delay(interval: Duration) -> Delay {
    Delay {
        started: Instant::now(),
        interval,
        sleep: None,
    }
}

/// Future returned by [`delay`].
#[derive(Debug)]
#[must_use = "futures do nothing unless awaited or polled"]
pub struct Delay {
    started: Instant,
    interval: Duration,
    sleep: Option<Pin<Box<Sleep>>>,
}

impl Future for Delay {
    type Output = Duration;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Duration> {
        let this = &mut *self;
        let (started, interval) = (this.started, this.interval);
        let timer = this
            .sleep
            .get_or_insert_with(|| Box::pin(sleep(interval.saturating_sub(started.elapsed()))));
        futures::ready!(timer.as_mut().poll(cx));
        Poll::Ready(started.elapsed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use settle_async::time::timeout;
    use settle_runtime::events::EventEmitter;

    #[tokio::test]
    async fn resolves_with_first_argument() {
        let emitter = Arc::new(EventEmitter::new());
        let waiting = wait_for_event(emitter.clone(), "foo", Some(Duration::from_millis(100)))
            .unwrap();

        emitter.emit("foo", &[json!("bar"), json!("baz")]);
        assert_eq!(waiting.await.unwrap(), json!("bar"));
    }

    #[tokio::test]
    async fn resolves_null_without_arguments() {
        let emitter = Arc::new(EventEmitter::new());
        let waiting = wait_for_event(emitter.clone(), "foo", None).unwrap();

        emitter.emit("foo", &[]);
        assert_eq!(waiting.await.unwrap(), Value::Null);
    }

    #[tokio::test]
    async fn times_out_with_message() {
        let emitter = Arc::new(EventEmitter::new());
        let err = wait_for_event(emitter.clone(), "foo", Some(Duration::from_millis(20)))
            .unwrap()
            .await
            .unwrap_err();

        assert_eq!(
            err.to_string(),
            "Timed out after 20 milliseconds waiting for event \"foo\""
        );
        assert_eq!(emitter.listener_count("foo"), 0);
    }

    #[tokio::test]
    async fn non_event_resolves_when_quiet() {
        let emitter = Arc::new(EventEmitter::new());
        let quiet = wait_for_non_event(emitter.clone(), "foo", Some(Duration::from_millis(20)))
            .unwrap();
        assert_eq!(quiet.await, Ok(()));
    }

    #[tokio::test]
    async fn non_event_rejects_with_value() {
        let emitter = Arc::new(EventEmitter::new());
        let quiet = wait_for_non_event(emitter.clone(), "foo", Some(Duration::from_millis(100)))
            .unwrap();

        emitter.emit("foo", &[json!("bar")]);
        let err = quiet.await.unwrap_err();
        assert_eq!(
            err,
            WaitError::EventEmitted {
                name: "foo".to_string(),
                value: json!("bar"),
            }
        );
        assert_eq!(err.to_string(), "Emitter emitted event \"foo\"");
    }

    #[tokio::test]
    async fn non_event_without_interval_never_resolves() {
        let emitter = Arc::new(EventEmitter::new());
        let quiet = wait_for_non_event(emitter.clone(), "foo", None).unwrap();
        assert!(timeout(Duration::from_millis(30), quiet).await.is_err());
    }

    #[tokio::test]
    async fn dropped_emitter_abandons_wait() {
        let emitter = Arc::new(EventEmitter::new());
        let waiting = wait_for_event(emitter.clone(), "foo", None).unwrap();
        drop(emitter);
        assert_eq!(waiting.await, Err(WaitError::Abandoned));
    }

    #[tokio::test]
    async fn invalid_arguments_fail_synchronously() {
        let emitter = Arc::new(EventEmitter::new());
        assert!(wait_for_event(emitter.clone(), "", None).is_err());
        assert!(wait_for_non_event(emitter.clone(), "foo", Some(Duration::ZERO)).is_err());
        assert!(emitter.event_names().is_empty());
    }

    #[tokio::test]
    async fn delay_reports_elapsed_time() {
        let elapsed = delay(Duration::from_millis(20)).await;
        assert!(elapsed >= Duration::from_millis(20));
    }

    #[test]
    fn delay_can_be_created_outside_runtime() {
        let pending = delay(Duration::from_millis(5));
        let elapsed = settle_async::runtime::block_on(pending);
        assert!(elapsed >= Duration::from_millis(5));
    }
}
