use lockstep::time::sleep;
use lockstep::{RuntimeBuilder, join};
use std::cell::RefCell;
use std::rc::Rc;
use std::time::{Duration, Instant};

#[test]
fn test_join_single_future() {
    let rt = RuntimeBuilder::new().build();

    let result = rt.block_on(async { join!(async { 42 }) });

    assert_eq!(result, 42);
}

#[test]
fn test_join_three_futures() {
    let rt = RuntimeBuilder::new().build();

    let result = rt.block_on(async {
        let (a, b, c) = join!(async { "hello" }, async { 42 }, async { true });
        (a, b, c)
    });

    assert_eq!(result, ("hello", 42, true));
}

#[test]
fn test_join_with_trailing_comma() {
    let rt = RuntimeBuilder::new().build();

    let result = rt.block_on(async {
        let (a, b) = join!(async { 1 }, async { 2 },);
        a + b
    });

    assert_eq!(result, 3);
}

#[lockstep::test]
async fn test_join_runs_futures_concurrently() {
    let start = Instant::now();

    let (a, b) = join!(
        async {
            sleep(Duration::from_millis(40)).await;
            "slow"
        },
        async {
            sleep(Duration::from_millis(40)).await;
            "also slow"
        }
    );

    assert_eq!((a, b), ("slow", "also slow"));
    assert!(
        start.elapsed() < Duration::from_millis(75),
        "Both sleeps should overlap"
    );
}

#[lockstep::test]
async fn test_join_interleaves_at_await_points() {
    let order = Rc::new(RefCell::new(Vec::new()));

    join!(
        async {
            order.borrow_mut().push("a1");
            sleep(Duration::from_millis(20)).await;
            order.borrow_mut().push("a2");
        },
        async {
            order.borrow_mut().push("b1");
            sleep(Duration::from_millis(5)).await;
            order.borrow_mut().push("b2");
        }
    );

    assert_eq!(*order.borrow(), vec!["a1", "b1", "b2", "a2"]);
}

#[test]
fn test_join_with_result_types() {
    let rt = RuntimeBuilder::new().build();

    let result = rt.block_on(async {
        join!(async { Ok::<i32, &str>(100) }, async {
            Err::<i32, &str>("error")
        })
    });

    assert_eq!(result.0, Ok(100));
    assert_eq!(result.1, Err("error"));
}
