//! Timing behavior of the waits against a real emitter.

use std::sync::Arc;

use serde_json::{json, Value};
use settle_async::time::{sleep, timeout, Duration, Instant};
use settle_runtime::events::EventEmitter;
use settle_waits::{delay, wait_for_event, wait_for_non_event, WaitError};

fn emit_after(emitter: &Arc<EventEmitter>, after: Duration, name: &'static str, value: Value) {
    let emitter = emitter.clone();
    settle_async::spawn(async move {
        sleep(after).await;
        emitter.emit(name, &[value]);
    });
}

#[settle_async::test]
async fn test_wait_for_event_resolves_with_first_emission() {
    let emitter = Arc::new(EventEmitter::new());
    let waiting = wait_for_event(emitter.clone(), "foo", None).unwrap();

    emit_after(&emitter, Duration::from_millis(10), "foo", json!("bar"));
    emit_after(&emitter, Duration::from_millis(20), "foo", json!("later"));

    assert_eq!(waiting.await.unwrap(), json!("bar"));
}

#[settle_async::test]
async fn test_wait_for_event_without_interval_stays_pending() {
    let emitter = Arc::new(EventEmitter::new());
    let waiting = wait_for_event(emitter.clone(), "foo", None).unwrap();

    assert!(timeout(Duration::from_millis(100), waiting).await.is_err());
}

#[settle_async::test]
async fn test_wait_for_event_times_out_before_late_emission() {
    let emitter = Arc::new(EventEmitter::new());
    let start = Instant::now();
    let waiting = wait_for_event(emitter.clone(), "foo", Some(Duration::from_millis(50))).unwrap();
    emit_after(&emitter, Duration::from_millis(100), "foo", json!("late"));

    let err = waiting.await.unwrap_err();
    let elapsed = start.elapsed();

    assert!(matches!(err, WaitError::TimedOut { .. }));
    assert!(err.to_string().starts_with("Timed out after 50 milliseconds"));
    assert!(elapsed >= Duration::from_millis(50));
    assert!(elapsed < Duration::from_millis(100));

    // The late emission finds nothing of ours to call.
    sleep(Duration::from_millis(80)).await;
    assert_eq!(emitter.listener_count("foo"), 0);
}

#[settle_async::test]
async fn test_sub_millisecond_timeout_reports_exact_interval() {
    let emitter = Arc::new(EventEmitter::new());
    let err = wait_for_event(emitter.clone(), "foo", Some(Duration::from_micros(1500)))
        .unwrap()
        .await
        .unwrap_err();

    assert_eq!(
        err.to_string(),
        "Timed out after 1.5 milliseconds waiting for event \"foo\""
    );
}

#[settle_async::test]
async fn test_wait_for_non_event_rejects_on_early_emission() {
    let emitter = Arc::new(EventEmitter::new());
    let start = Instant::now();
    let quiet = wait_for_non_event(emitter.clone(), "foo", Some(Duration::from_millis(50))).unwrap();
    emit_after(&emitter, Duration::from_millis(25), "foo", json!("bar"));

    let err = quiet.await.unwrap_err();

    assert!(start.elapsed() < Duration::from_millis(50));
    match err {
        WaitError::EventEmitted { name, value } => {
            assert_eq!(name, "foo");
            assert_eq!(value, json!("bar"));
        }
        other => panic!("unexpected outcome: {other:?}"),
    }
}

#[settle_async::test]
async fn test_wait_for_non_event_resolves_after_interval() {
    let emitter = Arc::new(EventEmitter::new());
    let start = Instant::now();
    let quiet = wait_for_non_event(emitter.clone(), "foo", Some(Duration::from_millis(50))).unwrap();

    assert_eq!(quiet.await, Ok(()));
    assert!(start.elapsed() >= Duration::from_millis(50));
}

#[settle_async::test]
async fn test_delay_elapsed_within_bounds() {
    let elapsed = delay(Duration::from_millis(50)).await;
    assert!(elapsed > Duration::from_millis(30), "elapsed {elapsed:?}");
    assert!(elapsed < Duration::from_millis(100), "elapsed {elapsed:?}");
}

#[settle_async::test]
async fn test_concurrent_waits_on_shared_emitter() {
    let emitter = Arc::new(EventEmitter::new());
    let first = wait_for_event(emitter.clone(), "foo", Some(Duration::from_millis(200))).unwrap();
    let second = wait_for_event(emitter.clone(), "foo", Some(Duration::from_millis(200))).unwrap();
    let other = wait_for_event(emitter.clone(), "other", Some(Duration::from_millis(30))).unwrap();

    emit_after(&emitter, Duration::from_millis(10), "foo", json!(1));

    let (first, second, other) = futures::join!(first, second, other);
    assert_eq!(first.unwrap(), json!(1));
    assert_eq!(second.unwrap(), json!(1));
    assert!(matches!(other, Err(WaitError::TimedOut { .. })));
    assert!(emitter.event_names().is_empty());
}
