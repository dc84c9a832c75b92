use greenwire::task;
use greenwire::time::{instrumented, sleep, timeout};
use std::time::{Duration, Instant};

#[greenwire::test]
async fn test_sleep_basic() {
    let start = Instant::now();
    sleep(Duration::from_millis(50)).await;

    assert!(
        start.elapsed() >= Duration::from_millis(50),
        "Sleep should wait at least the specified duration"
    );
}

#[greenwire::test]
async fn test_sleep_zero_duration() {
    let start = Instant::now();
    sleep(Duration::ZERO).await;

    assert!(
        start.elapsed() < Duration::from_millis(10),
        "Zero duration sleep should be fast"
    );
}

#[greenwire::test]
async fn test_sleep_deadline() {
    let before = Instant::now();
    let sleep = sleep(Duration::from_millis(30));

    assert!(sleep.deadline() >= before + Duration::from_millis(30));
    sleep.await;
    assert!(Instant::now() >= before + Duration::from_millis(30));
}

#[greenwire::test]
async fn test_timeout_completes_before_deadline() {
    let handle = task::spawn(async {
        sleep(Duration::from_millis(10)).await;
        123
    });

    let result = timeout(Duration::from_millis(200), handle).await;

    assert_eq!(result, Ok(123), "Timeout should return Ok(123)");
}

#[greenwire::test]
async fn test_timeout_expires() {
    let handle = task::spawn(async {
        sleep(Duration::from_millis(100)).await;
        456
    });

    let result = timeout(Duration::from_millis(20), handle).await;

    let err = result.unwrap_err();
    assert_eq!(err.to_string(), "deadline has elapsed");
}

#[greenwire::test]
async fn test_cancelled_timer_does_not_stall() {
    // The abandoned 10s timer must not keep the loop from finishing.
    let _ = timeout(Duration::from_millis(10), sleep(Duration::from_secs(10))).await;

    let start = Instant::now();
    sleep(Duration::from_millis(5)).await;
    assert!(start.elapsed() < Duration::from_secs(1));
}

#[greenwire::test]
async fn test_instrumented_measures_sleep() {
    let (value, elapsed) = instrumented(async {
        sleep(Duration::from_millis(50)).await;
        7
    })
    .await;

    assert_eq!(value, 7);
    assert!(
        elapsed >= Duration::from_millis(50),
        "Instrumented should measure at least the sleep duration"
    );
}
