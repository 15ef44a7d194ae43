use lockstep::time::{instrumented, sleep};
use std::time::Duration;

#[lockstep::test]
async fn test_time_wrapper_with_sleep() {
    let (_, elapsed) = instrumented(sleep(Duration::from_millis(50))).await;

    assert!(
        elapsed >= Duration::from_millis(50),
        "Time wrapper should measure at least the sleep duration"
    );
}

#[lockstep::test]
async fn test_time_wrapper_starts_on_first_poll() {
    let wrapped = instrumented(async { 7 });
    assert!(wrapped.started_at().is_none());

    sleep(Duration::from_millis(30)).await;
    let (value, elapsed) = wrapped.await;

    assert_eq!(value, 7);
    assert!(elapsed < Duration::from_millis(30));
}
