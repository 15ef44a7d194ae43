use lockstep::time::{Cadence, FaultPolicy, Interval, sleep};
use lockstep::{Error, RuntimeBuilder};
use std::cell::{Cell, RefCell};
use std::io;
use std::panic::{self, AssertUnwindSafe};
use std::pin::Pin;
use std::rc::Rc;
use std::time::{Duration, Instant};

type Tick = Pin<Box<dyn Future<Output = io::Result<()>>>>;

/// Records the start instant of every invocation, each one taking `work`.
fn recorder(work: Duration) -> (Rc<RefCell<Vec<Instant>>>, impl FnMut() -> Tick) {
    let starts = Rc::new(RefCell::new(Vec::new()));

    let callback = {
        let starts = starts.clone();
        move || {
            let starts = starts.clone();
            Box::pin(async move {
                starts.borrow_mut().push(Instant::now());
                sleep(work).await;
                Ok(())
            }) as Tick
        }
    };

    (starts, callback)
}

fn gaps(starts: &[Instant]) -> Vec<Duration> {
    starts.windows(2).map(|w| w[1] - w[0]).collect()
}

#[lockstep::test]
async fn test_fixed_delay_subtracts_callback_time() {
    let (starts, callback) = recorder(Duration::from_millis(30));
    let interval = Interval::new(Duration::from_millis(100), Cadence::FixedDelay, callback);

    interval.start(Some(3)).unwrap();
    sleep(Duration::from_millis(350)).await;

    let starts = starts.borrow();
    assert_eq!(starts.len(), 3);

    for gap in gaps(&starts) {
        assert!(gap >= Duration::from_millis(70), "gap {gap:?} too short");
        assert!(gap < Duration::from_millis(130), "gap {gap:?} too long");
    }
}

#[lockstep::test]
async fn test_spaced_waits_full_period() {
    let (starts, callback) = recorder(Duration::from_millis(30));
    let interval = Interval::new(Duration::from_millis(100), Cadence::Spaced, callback);

    interval.start(Some(3)).unwrap();
    sleep(Duration::from_millis(450)).await;

    let starts = starts.borrow();
    assert_eq!(starts.len(), 3);

    for gap in gaps(&starts) {
        assert!(gap >= Duration::from_millis(100), "gap {gap:?} too short");
    }
}

#[lockstep::test]
async fn test_repeat_count_stops_the_loop() {
    let calls = Rc::new(Cell::new(0));
    let interval = Interval::new(Duration::from_millis(5), Cadence::FixedDelay, {
        let calls = calls.clone();
        move || {
            calls.set(calls.get() + 1);
            async { Ok::<_, io::Error>(()) }
        }
    });

    interval.start(Some(4)).unwrap();
    assert!(interval.is_active());
    assert!(interval.is_locked());
    assert_eq!(interval.remaining(), Some(4));

    sleep(Duration::from_millis(80)).await;

    assert_eq!(calls.get(), 4);
    assert_eq!(interval.ticks(), 4);
    assert_eq!(interval.remaining(), Some(0));
    assert!(!interval.is_active());
    assert!(!interval.is_locked());
    assert!(interval.last_tick().is_some());
}

#[lockstep::test]
async fn test_stop_during_wait_prevents_next_tick() {
    let calls = Rc::new(Cell::new(0));
    let interval = Interval::new(Duration::from_millis(50), Cadence::Spaced, {
        let calls = calls.clone();
        move || {
            calls.set(calls.get() + 1);
            async { Ok::<_, io::Error>(()) }
        }
    });

    interval.start(None).unwrap();
    sleep(Duration::from_millis(20)).await;
    assert_eq!(calls.get(), 1);

    let stopped_at = Instant::now();
    interval.stop();
    assert!(!interval.is_active());

    sleep(Duration::from_millis(5)).await;
    assert!(!interval.is_locked(), "loop should exit without waiting out the period");
    assert!(stopped_at.elapsed() < Duration::from_millis(40));

    sleep(Duration::from_millis(100)).await;
    assert_eq!(calls.get(), 1);
}

#[lockstep::test]
async fn test_stop_lets_in_flight_callback_finish() {
    let finished = Rc::new(Cell::new(0));
    let interval = Interval::new(Duration::from_millis(10), Cadence::FixedDelay, {
        let finished = finished.clone();
        move || {
            let finished = finished.clone();
            async move {
                sleep(Duration::from_millis(30)).await;
                finished.set(finished.get() + 1);
                Ok::<_, io::Error>(())
            }
        }
    });

    interval.start(None).unwrap();
    sleep(Duration::from_millis(10)).await;

    interval.stop();
    assert!(interval.is_locked(), "the callback is still running");

    sleep(Duration::from_millis(40)).await;
    assert_eq!(finished.get(), 1);
    assert!(!interval.is_locked());
}

#[lockstep::test]
async fn test_second_start_never_overlaps() {
    let running = Rc::new(Cell::new(false));
    let overlaps = Rc::new(Cell::new(0));
    let calls = Rc::new(Cell::new(0));

    let interval = Interval::new(Duration::from_millis(5), Cadence::FixedDelay, {
        let (running, overlaps, calls) = (running.clone(), overlaps.clone(), calls.clone());
        move || {
            let (running, overlaps, calls) = (running.clone(), overlaps.clone(), calls.clone());
            async move {
                if running.replace(true) {
                    overlaps.set(overlaps.get() + 1);
                }
                calls.set(calls.get() + 1);
                sleep(Duration::from_millis(10)).await;
                running.set(false);
                Ok::<_, io::Error>(())
            }
        }
    });

    interval.start(None).unwrap();
    interval.start(None).unwrap();
    sleep(Duration::from_millis(3)).await;
    interval.start(Some(2)).unwrap();

    sleep(Duration::from_millis(80)).await;

    assert_eq!(overlaps.get(), 0);
    assert_eq!(calls.get(), 2);
    assert!(!interval.is_locked());
}

#[lockstep::test]
async fn test_restart_after_stop_spawns_a_fresh_loop() {
    let calls = Rc::new(Cell::new(0));
    let interval = Interval::new(Duration::from_millis(5), Cadence::Spaced, {
        let calls = calls.clone();
        move || {
            calls.set(calls.get() + 1);
            async { Ok::<_, io::Error>(()) }
        }
    });

    interval.start(Some(1)).unwrap();
    sleep(Duration::from_millis(10)).await;
    assert!(!interval.is_locked());

    interval.start(Some(2)).unwrap();
    sleep(Duration::from_millis(30)).await;

    assert_eq!(calls.get(), 3);
}

#[lockstep::test]
async fn test_callback_errors_are_collected() {
    let interval = Interval::new(Duration::from_millis(5), Cadence::FixedDelay, || async {
        Err::<(), _>(io::Error::other("upstream down"))
    });

    interval.start(Some(3)).unwrap();
    sleep(Duration::from_millis(40)).await;

    let errors = interval.take_errors();
    assert_eq!(errors.len(), 3);
    assert!(matches!(&errors[0], Error::Callback(err) if err.to_string() == "upstream down"));
    assert!(interval.take_errors().is_empty());
    assert!(!interval.is_locked());
}

#[lockstep::test]
async fn test_error_channel_keeps_the_newest_errors() {
    let extra = 6;
    let calls = Rc::new(Cell::new(0));
    let interval = Interval::new(Duration::ZERO, Cadence::FixedDelay, {
        let calls = calls.clone();
        move || {
            calls.set(calls.get() + 1);
            let tick = calls.get();
            async move { Err::<(), _>(io::Error::other(format!("tick {tick} failed"))) }
        }
    });

    interval
        .start(Some((Interval::ERROR_CAPACITY + extra) as u32))
        .unwrap();
    sleep(Duration::from_millis(20)).await;

    assert!(!interval.is_locked());
    assert_eq!(interval.ticks(), (Interval::ERROR_CAPACITY + extra) as u64);

    let errors = interval.take_errors();
    assert_eq!(errors.len(), Interval::ERROR_CAPACITY);

    let first = format!("tick {} failed", extra + 1);
    let last = format!("tick {} failed", Interval::ERROR_CAPACITY + extra);
    assert!(matches!(&errors[0], Error::Callback(err) if err.to_string() == first));
    assert!(matches!(errors.last(), Some(Error::Callback(err)) if err.to_string() == last));
}

#[lockstep::test]
async fn test_stop_fault_policy_ends_the_loop() {
    let calls = Rc::new(Cell::new(0));
    let interval = Interval::builder(Duration::from_millis(5))
        .fault_policy(FaultPolicy::Stop)
        .build({
            let calls = calls.clone();
            move || {
                calls.set(calls.get() + 1);
                let fail = calls.get() == 2;
                async move {
                    if fail {
                        Err("second tick failed")
                    } else {
                        Ok(())
                    }
                }
            }
        })
        .unwrap();

    interval.start(None).unwrap();
    sleep(Duration::from_millis(50)).await;

    assert_eq!(calls.get(), 2);
    assert!(!interval.is_active());
    assert!(!interval.is_locked());
    assert_eq!(interval.take_errors().len(), 1);
}

#[lockstep::test]
async fn test_builder_auto_start() {
    let calls = Rc::new(Cell::new(0));
    let interval = Interval::builder(Duration::from_millis(100))
        .cadence(Cadence::Spaced)
        .auto_start(Some(1))
        .build({
            let calls = calls.clone();
            move || {
                calls.set(calls.get() + 1);
                async { Ok::<_, io::Error>(()) }
            }
        })
        .unwrap();

    assert!(interval.is_spaced());
    assert_eq!(interval.period(), Duration::from_millis(100));
    assert!(interval.is_locked());

    sleep(Duration::from_millis(10)).await;
    assert_eq!(calls.get(), 1);
    assert!(!interval.is_active());
}

#[lockstep::test]
async fn test_dropped_handle_finishes_its_repeat_count() {
    let calls = Rc::new(Cell::new(0));

    {
        let _interval = Interval::builder(Duration::from_millis(5))
            .auto_start(Some(3))
            .build({
                let calls = calls.clone();
                move || {
                    calls.set(calls.get() + 1);
                    async { Ok::<_, io::Error>(()) }
                }
            })
            .unwrap();
    }

    sleep(Duration::from_millis(50)).await;
    assert_eq!(calls.get(), 3);
}

#[lockstep::test]
async fn test_dropped_handles_end_an_unbounded_loop() {
    let calls = Rc::new(Cell::new(0));

    {
        let interval = Interval::new(Duration::from_millis(5), Cadence::FixedDelay, {
            let calls = calls.clone();
            move || {
                calls.set(calls.get() + 1);
                async { Ok::<_, io::Error>(()) }
            }
        });
        let other = interval.clone();

        interval.start(None).unwrap();
        sleep(Duration::from_millis(12)).await;
        drop(other);
    }

    sleep(Duration::from_millis(10)).await;
    let seen = calls.get();
    assert!(seen >= 1);

    sleep(Duration::from_millis(40)).await;
    assert_eq!(calls.get(), seen, "the loop kept ticking without a handle");
}

#[test]
fn test_panicking_callback_unlocks_the_interval() {
    let calls = Rc::new(Cell::new(0));
    let interval = Interval::new(Duration::from_millis(5), Cadence::FixedDelay, {
        let calls = calls.clone();
        move || {
            calls.set(calls.get() + 1);
            let tick = calls.get();
            async move {
                if tick == 2 {
                    panic!("tick failed");
                }
                Ok::<_, io::Error>(())
            }
        }
    });

    let rt = RuntimeBuilder::new().build();
    let caught = panic::catch_unwind(AssertUnwindSafe(|| {
        rt.block_on(async {
            interval.start(None).unwrap();
            sleep(Duration::from_millis(50)).await;
        })
    }));
    drop(rt);

    assert!(caught.is_err());
    assert_eq!(calls.get(), 2);
    assert!(!interval.is_locked());
}

#[test]
fn test_start_outside_runtime_fails() {
    let interval = Interval::new(Duration::from_millis(5), Cadence::FixedDelay, || async {
        Ok::<_, io::Error>(())
    });

    assert!(matches!(interval.start(None), Err(Error::NoRuntime)));
    assert!(!interval.is_active());
    assert!(!interval.is_locked());

    let built = Interval::builder(Duration::from_millis(5))
        .auto_start(None)
        .build(|| async { Ok::<_, io::Error>(()) });
    assert!(matches!(built, Err(Error::NoRuntime)));
}

#[test]
fn test_dropping_the_runtime_unlocks_the_interval() {
    let interval = Interval::new(Duration::from_secs(10), Cadence::Spaced, || async {
        Ok::<_, io::Error>(())
    });

    {
        let rt = RuntimeBuilder::new().build();
        rt.block_on(async {
            interval.start(None).unwrap();
            sleep(Duration::from_millis(5)).await;
        });
        assert!(interval.is_locked());
    }

    assert!(!interval.is_locked());
    assert_eq!(interval.ticks(), 1);
}
