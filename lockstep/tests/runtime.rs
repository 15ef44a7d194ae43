use lockstep::sync::Mutex;
use lockstep::time::sleep;
use lockstep::{Error, RuntimeBuilder, task, yield_now};
use std::cell::RefCell;
use std::future::poll_fn;
use std::rc::Rc;
use std::task::Poll;
use std::thread;
use std::time::Duration;

#[test]
fn test_block_on_returns_the_output() {
    let rt = RuntimeBuilder::new().build();

    assert_eq!(rt.block_on(async { 6 * 7 }), 42);
}

#[test]
fn test_runtime_spawn_runs_on_block_on() {
    let rt = RuntimeBuilder::new().tick_budget(4).build();

    let handle = rt.spawn(async { "spawned" });
    assert!(!handle.is_finished());

    assert_eq!(rt.block_on(handle), "spawned");
}

#[test]
fn test_try_spawn_outside_runtime() {
    assert!(matches!(task::try_spawn(async {}), Err(Error::NoRuntime)));
}

#[test]
#[should_panic(expected = "tick_budget must be > 0")]
fn test_zero_tick_budget_is_rejected() {
    let _ = RuntimeBuilder::new().tick_budget(0);
}

#[lockstep::test(tick_budget = 2)]
async fn test_tasks_run_in_spawn_order() {
    let order = Rc::new(RefCell::new(Vec::new()));

    let handles: Vec<_> = (0..5)
        .map(|i| {
            let order = order.clone();
            task::spawn(async move { order.borrow_mut().push(i) })
        })
        .collect();

    for handle in handles {
        handle.await;
    }

    assert_eq!(*order.borrow(), vec![0, 1, 2, 3, 4]);
}

#[lockstep::test]
async fn test_yield_now_lets_other_tasks_run() {
    let order = Rc::new(RefCell::new(Vec::new()));

    let other = task::spawn({
        let order = order.clone();
        async move { order.borrow_mut().push("other") }
    });

    order.borrow_mut().push("before");
    yield_now().await;
    order.borrow_mut().push("after");

    other.await;
    assert_eq!(*order.borrow(), vec!["before", "other", "after"]);
}

#[lockstep::test]
async fn test_waker_from_another_thread() {
    let mut sent = false;

    let value = poll_fn(|cx| {
        if sent {
            return Poll::Ready(7);
        }

        sent = true;
        let waker = cx.waker().clone();
        thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            waker.wake();
        });

        Poll::Pending
    })
    .await;

    assert_eq!(value, 7);
}

#[test]
fn test_dropping_the_runtime_releases_task_guards() {
    let mutex = Rc::new(Mutex::new(()));

    {
        let rt = RuntimeBuilder::new().build();
        let mutex = mutex.clone();

        rt.block_on(async move {
            task::spawn({
                let mutex = mutex.clone();
                async move {
                    let _guard = mutex.lock().await;
                    sleep(Duration::from_secs(10)).await;
                }
            });

            sleep(Duration::from_millis(5)).await;
            assert!(mutex.locked());
        });
    }

    assert!(!mutex.locked());
}

#[test]
#[should_panic(expected = "boom")]
fn test_task_panic_unwinds_through_block_on() {
    let rt = RuntimeBuilder::new().build();

    rt.block_on(async {
        task::spawn(async { panic!("boom") }).await;
    });
}
