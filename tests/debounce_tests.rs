// Integration tests for the trailing-edge debounce controller
use headit_sync::DebounceController;
use std::time::Duration;
use tokio::time::{Instant, advance, timeout};

/// Test that a burst fires once, after the last event, with the last payload
#[tokio::test(start_paused = true)]
async fn test_burst_coalesces_to_last_payload() {
    let mut debounce = DebounceController::new(Duration::from_millis(500));
    let start = Instant::now();

    for i in 1..=5 {
        debounce.schedule(i);
        advance(Duration::from_millis(100)).await;
    }
    assert!(debounce.is_pending());

    let payload = debounce.fired().await;
    assert_eq!(payload, 5);
    // last schedule at t=400ms, so the quiet period ends at t=900ms
    let elapsed = start.elapsed();
    assert!(
        elapsed >= Duration::from_millis(900) && elapsed < Duration::from_millis(910),
        "fired after {elapsed:?}"
    );
    assert!(!debounce.is_pending());

    let idle = timeout(Duration::from_secs(10), debounce.fired()).await;
    assert!(idle.is_err(), "idle controller must not fire");
}

/// Test that cancel returns the payload and leaves the controller idle
#[tokio::test(start_paused = true)]
async fn test_cancel() {
    let mut debounce = DebounceController::new(Duration::from_millis(500));
    debounce.schedule("draft");
    assert_eq!(debounce.cancel(), Some("draft"));
    assert_eq!(debounce.cancel(), None);
    assert!(!debounce.is_pending());
}

/// Test that dropping an unfinished wait keeps the pending payload
#[tokio::test(start_paused = true)]
async fn test_fired_is_cancel_safe() {
    let mut debounce = DebounceController::new(Duration::from_millis(500));
    debounce.schedule(1);

    let early = timeout(Duration::from_millis(200), debounce.fired()).await;
    assert!(early.is_err());
    assert!(debounce.is_pending());

    assert_eq!(debounce.fired().await, 1);
}

/// Test that events spaced wider than the quiet interval each fire
#[tokio::test(start_paused = true)]
async fn test_separate_bursts_fire_separately() {
    let mut debounce = DebounceController::new(Duration::from_millis(500));

    debounce.schedule('a');
    assert_eq!(debounce.fired().await, 'a');

    debounce.schedule('b');
    assert_eq!(debounce.fired().await, 'b');
}
