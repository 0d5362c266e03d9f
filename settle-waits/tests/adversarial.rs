//! Exactly-once behavior of the race against emitters that misbehave.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use mockall::mock;
use parking_lot::Mutex;
use serde_json::{json, Value};
use settle_async::time::{sleep, Duration};
use settle_runtime::events::{EventEmitter, EventSource, Listener};
use settle_waits::race::{attach_timed_event_callback, TimedEvent, TimeoutSpec};
use settle_waits::{wait_for_event, WaitError};

mock! {
    pub Source {}

    impl EventSource for Source {
        fn once(&self, name: &str, listener: Listener);
        fn remove_listener(&self, name: &str, listener: &Listener);
    }
}

#[derive(Default)]
struct Tally {
    events: AtomicUsize,
    timeouts: AtomicUsize,
}

impl Tally {
    fn total(&self) -> usize {
        self.events.load(Ordering::SeqCst) + self.timeouts.load(Ordering::SeqCst)
    }
}

fn attach(emitter: Arc<dyn EventSource>, interval: Duration, tally: &Arc<Tally>) {
    let on_event = tally.clone();
    let on_timeout = tally.clone();
    attach_timed_event_callback(
        TimedEvent::new(emitter, "ready", move |_| {
            on_event.events.fetch_add(1, Ordering::SeqCst);
        }),
        TimeoutSpec::after(interval, move || {
            on_timeout.timeouts.fetch_add(1, Ordering::SeqCst);
        }),
    )
    .unwrap();
}

/// Emitter that keeps every listener it was handed and can invoke them
/// regardless of removal.
fn capturing_source(captured: &Arc<Mutex<Option<Listener>>>) -> MockSource {
    let slot = captured.clone();
    let mut source = MockSource::new();
    source
        .expect_once()
        .withf(|name, _| name == "ready")
        .times(1)
        .returning(move |_, listener| *slot.lock() = Some(listener));
    source
}

#[tokio::test]
async fn test_emission_after_timeout_is_ignored() {
    let captured = Arc::new(Mutex::new(None));
    let mut source = capturing_source(&captured);
    source
        .expect_remove_listener()
        .withf(|name, _| name == "ready")
        .times(1)
        .return_const(());

    let source = Arc::new(source);
    let tally = Arc::new(Tally::default());
    attach(source.clone(), Duration::from_millis(10), &tally);
    sleep(Duration::from_millis(40)).await;

    let listener = captured.lock().clone().expect("listener registered");
    listener(&[json!("late")]);
    listener(&[json!("later")]);

    assert_eq!(tally.timeouts.load(Ordering::SeqCst), 1);
    assert_eq!(tally.events.load(Ordering::SeqCst), 0);
    // Last handle: expectations are verified here.
    drop(source);
}

#[tokio::test]
async fn test_timer_after_emission_is_ignored() {
    let captured = Arc::new(Mutex::new(None));
    let mut source = capturing_source(&captured);
    source.expect_remove_listener().never();

    let source = Arc::new(source);
    let tally = Arc::new(Tally::default());
    attach(source.clone(), Duration::from_millis(10), &tally);

    let listener = captured.lock().clone().expect("listener registered");
    listener(&[]);
    listener(&[]);
    sleep(Duration::from_millis(40)).await;

    assert_eq!(tally.events.load(Ordering::SeqCst), 1);
    assert_eq!(tally.timeouts.load(Ordering::SeqCst), 0);
    drop(source);
}

#[tokio::test]
async fn test_removed_listener_identity_matches_registered() {
    let registered: Arc<Mutex<Option<Listener>>> = Arc::new(Mutex::new(None));
    let removed: Arc<Mutex<Option<Listener>>> = Arc::new(Mutex::new(None));
    let mut source = capturing_source(&registered);
    let sink = removed.clone();
    source
        .expect_remove_listener()
        .times(1)
        .returning(move |_, listener| *sink.lock() = Some(listener.clone()));

    let tally = Arc::new(Tally::default());
    attach(Arc::new(source), Duration::from_millis(5), &tally);
    sleep(Duration::from_millis(30)).await;

    let registered = registered.lock().clone().expect("registered");
    let removed = removed.lock().clone().expect("removed");
    assert!(Arc::ptr_eq(&registered, &removed));
}

#[tokio::test]
async fn test_wait_for_event_ignores_emission_after_timeout() {
    let captured = Arc::new(Mutex::new(None));
    let mut source = capturing_source(&captured);
    source.expect_remove_listener().times(1).return_const(());

    let waiting = wait_for_event(Arc::new(source), "ready", Some(Duration::from_millis(10))).unwrap();
    let err = waiting.await.unwrap_err();
    assert!(matches!(err, WaitError::TimedOut { .. }));

    // Late emission after the settlement was consumed.
    let listener = captured.lock().clone().expect("listener registered");
    listener(&[Value::Bool(true)]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_emission_racing_expiry_settles_once() {
    let emitter = Arc::new(EventEmitter::new());
    let mut tallies = Vec::new();

    for round in 0..200u64 {
        let tally = Arc::new(Tally::default());
        let interval = Duration::from_millis(5 + round % 5);
        attach(emitter.clone(), interval, &tally);
        tallies.push(tally);

        let emitter = emitter.clone();
        settle_async::spawn(async move {
            sleep(interval).await;
            emitter.emit("ready", &[json!(round)]);
        });
    }

    sleep(Duration::from_millis(200)).await;

    for tally in &tallies {
        assert_eq!(tally.total(), 1);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_late_registration_is_removed_again() {
    let captured: Arc<Mutex<Option<Listener>>> = Arc::new(Mutex::new(None));
    let removals = Arc::new(AtomicUsize::new(0));

    let mut source = MockSource::new();
    let slot = captured.clone();
    source.expect_once().times(1).returning(move |_, listener| {
        // The timer expires on a worker while this blocks.
        std::thread::sleep(std::time::Duration::from_millis(50));
        *slot.lock() = Some(listener);
    });
    let counter = removals.clone();
    source
        .expect_remove_listener()
        .withf(|name, _| name == "ready")
        .times(2)
        .returning(move |_, _| {
            counter.fetch_add(1, Ordering::SeqCst);
        });
    let source = Arc::new(source);

    // Attach from a blocking thread so the timer task is free to run on a
    // worker while `once` is still blocked.
    let tally = Arc::new(Tally::default());
    let attached = {
        let source = source.clone();
        let tally = tally.clone();
        tokio::task::spawn_blocking(move || attach(source, Duration::from_millis(1), &tally))
    };
    attached.await.unwrap();

    assert_eq!(tally.timeouts.load(Ordering::SeqCst), 1);
    assert_eq!(removals.load(Ordering::SeqCst), 2);

    let listener = captured.lock().clone().expect("listener registered");
    listener(&[json!("late")]);
    assert_eq!(tally.events.load(Ordering::SeqCst), 0);

    sleep(Duration::from_millis(20)).await;
    drop(source);
}
