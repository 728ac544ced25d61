//! End-to-end pacing behavior under tokio's paused test clock.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tollbooth::{Limiter, LimiterConfig};

#[derive(Debug, Clone, PartialEq, Eq)]
struct TestError(&'static str);

impl std::fmt::Display for TestError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "TestError: {}", self.0)
    }
}

impl std::error::Error for TestError {}

fn limiter(max_requests: u32, window_ms: u64) -> Limiter {
    Limiter::new(
        LimiterConfig::new("svc", max_requests, Duration::from_millis(window_ms))
            .expect("valid test config"),
    )
}

#[tokio::test(start_paused = true)]
async fn burst_up_to_capacity_is_not_delayed() {
    let limiter = limiter(2, 1000);
    let started = tokio::time::Instant::now();

    let first = limiter.submit(|| async { Ok::<_, TestError>(1) });
    let second = limiter.submit(|| async { Ok::<_, TestError>(2) });

    assert_eq!(first.await.unwrap(), 1);
    assert_eq!(second.await.unwrap(), 2);
    assert!(started.elapsed() < Duration::from_millis(50));
}

#[tokio::test(start_paused = true)]
async fn call_past_capacity_waits_one_token_period() {
    let limiter = limiter(2, 1000);
    let started = tokio::time::Instant::now();

    let first = limiter.submit(|| async { Ok::<_, TestError>(()) });
    let second = limiter.submit(|| async { Ok::<_, TestError>(()) });
    let third = limiter.submit(|| async { Ok::<_, TestError>(()) });

    first.await.unwrap();
    second.await.unwrap();
    third.await.unwrap();

    // One token period is 1000 / 2 = 500ms, plus the loop's wake epsilon.
    let elapsed = started.elapsed();
    assert!(elapsed >= Duration::from_millis(500), "third call ran early: {elapsed:?}");
    assert!(elapsed <= Duration::from_millis(600), "third call ran late: {elapsed:?}");
}

#[tokio::test(start_paused = true)]
async fn completions_follow_submission_order() {
    let limiter = limiter(2, 200);
    let order = Arc::new(Mutex::new(Vec::new()));

    let handles: Vec<_> = (0..6usize)
        .map(|i| {
            let order = Arc::clone(&order);
            limiter.submit(move || {
                let order = Arc::clone(&order);
                async move {
                    order.lock().unwrap().push(i);
                    Ok::<_, TestError>(i)
                }
            })
        })
        .collect();

    for (i, handle) in handles.into_iter().enumerate() {
        assert_eq!(handle.await.unwrap(), i);
    }
    assert_eq!(*order.lock().unwrap(), (0..6).collect::<Vec<_>>());
}

#[tokio::test(start_paused = true)]
async fn failure_only_rejects_its_own_future() {
    let limiter = limiter(10, 1000);

    let ok_before = limiter.submit(|| async { Ok::<u32, TestError>(1) });
    let failing = limiter.submit(|| async { Err::<u32, _>(TestError("boom")) });
    let ok_after = limiter.submit(|| async { Ok::<u32, TestError>(3) });

    assert_eq!(ok_before.await.unwrap(), 1);
    let err = failing.await.unwrap_err();
    assert_eq!(err.into_inner(), Some(TestError("boom")));
    assert_eq!(ok_after.await.unwrap(), 3);
}

#[tokio::test(start_paused = true)]
async fn tokens_converge_to_capacity_while_idle() {
    let limiter = limiter(4, 1000);

    for _ in 0..4 {
        limiter.execute(|| async { Ok::<_, TestError>(()) }).await.unwrap();
    }
    assert_eq!(limiter.status().tokens, 0);

    tokio::time::advance(Duration::from_millis(1000)).await;
    assert_eq!(limiter.status().tokens, 4);

    // Idling longer never pushes tokens past capacity.
    tokio::time::advance(Duration::from_secs(60)).await;
    let status = limiter.status();
    assert_eq!(status.tokens, 4);
    assert_eq!(status.queue_len, 0);
}

#[tokio::test(start_paused = true)]
async fn concurrent_burst_drains_like_a_single_loop() {
    let limiter = limiter(5, 1000);
    let started = tokio::time::Instant::now();
    let ran = Arc::new(AtomicUsize::new(0));

    let mut tasks = Vec::new();
    for i in 0..12u32 {
        let limiter = limiter.clone();
        let ran = Arc::clone(&ran);
        tasks.push(tokio::spawn(async move {
            limiter
                .execute(move || async move {
                    ran.fetch_add(1, Ordering::SeqCst);
                    Ok::<_, TestError>(i)
                })
                .await
        }));
    }

    let results = futures::future::join_all(tasks).await;
    assert!(results.iter().all(|r| r.as_ref().unwrap().is_ok()));
    assert_eq!(ran.load(Ordering::SeqCst), 12);

    // 7 calls past the burst capacity, each gated on a fresh whole token
    // (period 200ms). Anything faster would mean a second drain loop was
    // consuming tokens in parallel.
    let elapsed = started.elapsed();
    assert!(elapsed >= Duration::from_millis(7 * 200), "burst drained too fast: {elapsed:?}");
    assert!(elapsed <= Duration::from_millis(1700), "burst drained too slow: {elapsed:?}");
}

#[tokio::test(start_paused = true)]
async fn two_per_second_scenario() {
    let limiter = Limiter::new(
        LimiterConfig::new("svc", 2, Duration::from_secs(1)).expect("valid test config"),
    );
    let started = tokio::time::Instant::now();

    let a = limiter.submit(|| async { Ok::<_, TestError>("a") });
    let b = limiter.submit(|| async { Ok::<_, TestError>("b") });
    let c = limiter.submit(|| async { Ok::<_, TestError>("c") });

    assert_eq!(a.await.unwrap(), "a");
    assert_eq!(b.await.unwrap(), "b");
    assert!(started.elapsed() < Duration::from_millis(50));

    assert_eq!(c.await.unwrap(), "c");
    let elapsed = started.elapsed();
    assert!(
        (Duration::from_millis(500)..=Duration::from_millis(600)).contains(&elapsed),
        "third call should land one token period in: {elapsed:?}"
    );

    // The bucket is momentarily empty, then climbs back to capacity.
    assert_eq!(limiter.status().tokens, 0);
    tokio::time::advance(Duration::from_millis(1000)).await;
    assert_eq!(limiter.status().tokens, 2);
}

#[tokio::test(start_paused = true)]
async fn caller_supplied_deadline_is_that_calls_own_failure() {
    let limiter = limiter(2, 1000);

    // The limiter provides no timeouts; a caller wraps its own and the
    // expiry is delivered as that submission's error, nothing else's.
    let slow = limiter.submit(|| async {
        match tokio::time::timeout(Duration::from_millis(50), std::future::pending::<()>()).await
        {
            Ok(()) => Ok("finished"),
            Err(_) => Err(TestError("deadline")),
        }
    });
    let after = limiter.submit(|| async { Ok::<_, TestError>("fine") });

    assert_eq!(slow.await.unwrap_err().into_inner(), Some(TestError("deadline")));
    assert_eq!(after.await.unwrap(), "fine");
}

#[tokio::test(start_paused = true)]
async fn limiters_are_independent() {
    let fast = Limiter::with_rate("fast", 25, Duration::from_secs(1)).unwrap();
    let slow = Limiter::with_rate("slow", 1, Duration::from_secs(60)).unwrap();

    slow.execute(|| async { Ok::<_, TestError>(()) }).await.unwrap();
    assert_eq!(slow.status().tokens, 0);

    // Draining one service leaves the other untouched.
    let started = tokio::time::Instant::now();
    for _ in 0..25 {
        fast.execute(|| async { Ok::<_, TestError>(()) }).await.unwrap();
    }
    assert!(started.elapsed() < Duration::from_millis(50));
    assert_eq!(fast.status().name, "fast");
    assert_eq!(slow.status().name, "slow");
}
