use greenwire::time::sleep;
use greenwire::{RuntimeBuilder, task, yield_now};

use std::cell::RefCell;
use std::future::poll_fn;
use std::rc::Rc;
use std::sync::{Arc, Mutex};
use std::task::{Poll, Waker};
use std::thread;
use std::time::{Duration, Instant};

#[greenwire::test]
async fn test_spawn_returns_output() {
    let handle = task::spawn(async { "done" });
    assert_eq!(handle.await, "done");
}

#[greenwire::test]
async fn test_tasks_interleave_on_yield() {
    let log = Rc::new(RefCell::new(Vec::new()));

    let handles: Vec<_> = ["a", "b"]
        .into_iter()
        .map(|name| {
            let log = log.clone();
            task::spawn(async move {
                for round in 0..2 {
                    log.borrow_mut().push(format!("{name}{round}"));
                    yield_now().await;
                }
            })
        })
        .collect();

    for handle in handles {
        handle.await;
    }

    assert_eq!(*log.borrow(), ["a0", "b0", "a1", "b1"]);
}

#[greenwire::test]
async fn test_is_finished() {
    let handle = task::spawn(async {
        sleep(Duration::from_millis(10)).await;
    });

    assert!(!handle.is_finished());
    sleep(Duration::from_millis(30)).await;
    assert!(handle.is_finished());
    handle.await;
}

#[test]
fn test_runtime_spawn_before_block_on() {
    let rt = RuntimeBuilder::new().task_capacity(4).build();

    let handles: Vec<_> = (0..16).map(|i| rt.spawn(async move { i * 2 })).collect();

    let total = rt.block_on(async {
        let mut total = 0;
        for handle in handles {
            total += handle.await;
        }
        total
    });

    assert_eq!(total, (0..16).map(|i| i * 2).sum::<i32>());
}

#[test]
fn test_wake_from_another_thread() {
    let rt = RuntimeBuilder::new().build();
    let slot: Arc<Mutex<(bool, Option<Waker>)>> = Arc::default();

    let remote = slot.clone();
    let waker_thread = thread::spawn(move || {
        thread::sleep(Duration::from_millis(30));
        let mut slot = remote.lock().unwrap();
        slot.0 = true;
        if let Some(waker) = slot.1.take() {
            waker.wake();
        }
    });

    let start = Instant::now();
    rt.block_on(poll_fn(|cx| {
        let mut slot = slot.lock().unwrap();
        if slot.0 {
            return Poll::Ready(());
        }
        slot.1 = Some(cx.waker().clone());
        Poll::Pending
    }));

    assert!(start.elapsed() >= Duration::from_millis(30));
    waker_thread.join().unwrap();
}

#[test]
#[should_panic(expected = "no greenwire runtime in context")]
fn test_spawn_outside_runtime_panics() {
    let _ = task::spawn(async {});
}
