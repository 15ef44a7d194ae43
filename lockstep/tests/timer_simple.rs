use lockstep::time::sleep;
use lockstep::{RuntimeBuilder, task};
use std::time::{Duration, Instant};

#[lockstep::test]
async fn test_sleep_basic() {
    let start = Instant::now();
    sleep(Duration::from_millis(50)).await;
    let elapsed = start.elapsed();

    assert!(
        elapsed >= Duration::from_millis(50),
        "Sleep should wait at least the specified duration"
    );
}

#[lockstep::test]
async fn test_sleep_zero_duration() {
    let start = Instant::now();
    sleep(Duration::ZERO).await;
    let elapsed = start.elapsed();

    assert!(
        elapsed < Duration::from_millis(10),
        "Zero duration sleep should be fast"
    );
}

#[lockstep::test]
async fn test_sleeps_wake_in_deadline_order() {
    let late = task::spawn(async {
        sleep(Duration::from_millis(40)).await;
        Instant::now()
    });
    let early = task::spawn(async {
        sleep(Duration::from_millis(10)).await;
        Instant::now()
    });

    let late = late.await;
    let early = early.await;

    assert!(early < late);
}

#[lockstep::test]
async fn test_dropped_sleep_does_not_block_the_runtime() {
    let start = Instant::now();

    drop(sleep(Duration::from_secs(5)));
    let pending = lockstep::time::timeout(Duration::from_millis(10), sleep(Duration::from_secs(5))).await;

    assert!(pending.is_err());
    assert!(start.elapsed() < Duration::from_secs(1));
}

#[test]
fn test_sleep_deadline_is_fixed_at_creation() {
    let rt = RuntimeBuilder::new().build();

    let sleep = sleep(Duration::from_millis(30));
    let deadline = sleep.deadline();

    std::thread::sleep(Duration::from_millis(30));
    let start = Instant::now();
    rt.block_on(sleep);

    assert!(Instant::now() >= deadline);
    assert!(start.elapsed() < Duration::from_millis(20));
}
