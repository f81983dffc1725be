//! Integration tests for retry functionality.

use super::*;
use crate::testing::{FailureLog, Flaky};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq)]
struct TestError(u32);

#[tokio::test]
async fn test_always_failing_runs_every_attempt() {
    let flaky = Flaky::always_failing("boom");
    let wrapped = with_retries({
        let flaky = flaky.clone();
        move |args: (i32, i32)| {
            let result = flaky.attempt(args);
            async move { result.map(|_| 0) }
        }
    })
    .with_max_retries(2)
    .with_max_interval(Duration::ZERO);

    let result = wrapped.call((1, 2)).await;

    let err = result.unwrap_err();
    assert_eq!(err.kind(), RetryErrorKind::Exhausted);
    assert_eq!(err.attempts(), 3); // 1 initial + 2 retries
    assert_eq!(err.cause(), Some(&"boom"));
    assert_eq!(flaky.calls(), 3);
    assert_eq!(flaky.inputs(), vec![(1, 2), (1, 2), (1, 2)]);
}

#[tokio::test]
async fn test_stops_retrying_after_success() {
    let flaky = Flaky::failing(1, "transient");
    let wrapped = with_retries({
        let flaky = flaky.clone();
        move |(a, b): (i32, i32)| {
            let result = flaky.attempt((a, b));
            async move { result.map(|_| a + b) }
        }
    })
    .with_max_retries(2)
    .with_max_interval(Duration::ZERO);

    assert_eq!(wrapped.call((1, 2)).await, Ok(3));
    assert_eq!(flaky.calls(), 2);
    assert_eq!(flaky.inputs(), vec![(1, 2), (1, 2)]);
}

#[tokio::test]
async fn test_succeeds_on_final_attempt() {
    let flaky = Flaky::failing(3, TestError(1));
    let wrapped = with_retries_sync({
        let flaky = flaky.clone();
        move |_: ()| flaky.attempt(()).map(|_| "done")
    })
    .with_max_retries(3)
    .with_max_interval(Duration::ZERO);

    assert_eq!(wrapped.call(()).await, Ok("done"));
    assert_eq!(flaky.calls(), 4);
}

#[tokio::test]
async fn test_stop_predicate_ends_retrying() {
    let attempts_before_stopping = Arc::new(AtomicU32::new(2));
    let calls = Arc::new(AtomicU32::new(0));

    let wrapped = with_retries_sync({
        let attempts_before_stopping = attempts_before_stopping.clone();
        let calls = calls.clone();
        move |_: (i32, i32)| {
            calls.fetch_add(1, Ordering::SeqCst);
            attempts_before_stopping.fetch_sub(1, Ordering::SeqCst);
            Err::<(), _>(TestError(0))
        }
    })
    .with_max_retries(2)
    .with_max_interval(Duration::ZERO)
    .stop_when({
        let attempts_before_stopping = attempts_before_stopping.clone();
        move |_: &TestError| attempts_before_stopping.load(Ordering::SeqCst) == 0
    });

    let err = wrapped.call((1, 2)).await.unwrap_err();

    assert!(err.is_stopped());
    assert_eq!(err.attempts(), 2);
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_stop_predicate_skips_observer_for_stopping_failure() {
    let log = FailureLog::new();
    let calls = Arc::new(AtomicU32::new(0));

    let wrapped = with_retries_sync({
        let calls = calls.clone();
        move |_: ()| Err::<(), _>(TestError(calls.fetch_add(1, Ordering::SeqCst) + 1))
    })
    .with_max_retries(5)
    .with_max_interval(Duration::ZERO)
    .with_observer(log.clone())
    .stop_when(|e: &TestError| e.0 == 3);

    let err = wrapped.call(()).await.unwrap_err();

    assert!(err.is_stopped());
    assert_eq!(err.cause(), Some(&TestError(3)));
    assert_eq!(calls.load(Ordering::SeqCst), 3);
    assert_eq!(log.errors(), vec![TestError(1), TestError(2)]);
}

#[tokio::test]
async fn test_async_stop_predicate() {
    let calls = Arc::new(AtomicU32::new(0));

    let wrapped = with_retries({
        let calls = calls.clone();
        move |_: ()| {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move { Err::<(), _>(TestError(n)) }
        }
    })
    .with_max_retries(10)
    .with_max_interval(Duration::ZERO)
    .stop_when_async(|e: &TestError| {
        let n = e.0;
        async move {
            tokio::task::yield_now().await;
            n >= 1
        }
    });

    let err = wrapped.call(()).await.unwrap_err();

    assert!(err.is_stopped());
    assert_eq!(err.into_cause(), Some(TestError(1)));
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_stop_predicate_not_consulted_on_last_attempt() {
    let predicate_calls = Arc::new(AtomicU32::new(0));

    let wrapped = with_retries_sync(|_: ()| Err::<(), _>(TestError(0)))
        .with_max_retries(2)
        .with_max_interval(Duration::ZERO)
        .stop_when({
            let predicate_calls = predicate_calls.clone();
            move |_: &TestError| {
                predicate_calls.fetch_add(1, Ordering::SeqCst);
                false
            }
        });

    let err = wrapped.call(()).await.unwrap_err();

    assert!(err.is_exhausted());
    assert_eq!(predicate_calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_observer_called_for_each_retried_failure() {
    let log = FailureLog::new();
    let calls = Arc::new(AtomicU32::new(0));

    let wrapped = with_retries_sync({
        let calls = calls.clone();
        move |_: (i32, i32)| Err::<(), _>(TestError(calls.fetch_add(1, Ordering::SeqCst)))
    })
    .with_max_retries(2)
    .with_max_interval(Duration::ZERO)
    .with_observer(log.clone());

    let err = wrapped.call((1, 2)).await.unwrap_err();

    assert!(err.is_exhausted());
    // Never called for the final failure
    assert_eq!(log.errors(), vec![TestError(0), TestError(1)]);
    assert_eq!(err.cause(), Some(&TestError(2)));
}

#[tokio::test]
async fn test_observer_not_called_on_success() {
    let log = FailureLog::<TestError>::new();

    let wrapped = with_retries(|n: u32| async move { Ok::<_, TestError>(n + 1) })
        .with_observer(log.clone());

    assert_eq!(wrapped.call(41).await, Ok(42));
    assert!(log.is_empty());
}

#[tokio::test]
async fn test_on_failure_closure() {
    let seen = Arc::new(Mutex::new(Vec::new()));

    let wrapped = with_retries_sync(|_: ()| Err::<(), _>("flaky"))
        .with_max_retries(3)
        .with_max_interval(Duration::ZERO)
        .on_failure({
            let seen = seen.clone();
            move |e: &&str| seen.lock().unwrap().push(e.to_string())
        });

    let _ = wrapped.call(()).await;

    assert_eq!(seen.lock().unwrap().len(), 3);
}

#[tokio::test]
async fn test_zero_retries_runs_once() {
    let flaky = Flaky::always_failing(TestError(9));
    let wrapped = with_retries_sync({
        let flaky = flaky.clone();
        move |_: ()| flaky.attempt(())
    })
    .with_max_retries(0);

    let err = wrapped.call(()).await.unwrap_err();

    assert!(err.is_exhausted());
    assert_eq!(err.attempts(), 1);
    assert_eq!(flaky.calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_delays_between_attempts_are_bounded() {
    let times = Arc::new(Mutex::new(Vec::new()));
    let previous = Arc::new(Mutex::new(tokio::time::Instant::now()));

    let wrapped = with_retries_sync({
        let times = times.clone();
        let previous = previous.clone();
        move |_: (i32, i32)| {
            let now = tokio::time::Instant::now();
            let mut previous = previous.lock().unwrap();
            times.lock().unwrap().push(now - *previous);
            *previous = now;
            Err::<(), _>(TestError(0))
        }
    })
    .with_max_retries(10)
    .with_max_interval(Duration::from_millis(100));

    let err = wrapped.call((1, 2)).await.unwrap_err();
    assert!(err.is_exhausted());

    let times = times.lock().unwrap();
    assert_eq!(times.len(), 11);
    // No delay before the first attempt
    assert_eq!(times[0], Duration::ZERO);
    for delay in &times[1..] {
        assert!(*delay <= Duration::from_millis(102), "delay {:?} too long", delay);
    }
}

#[tokio::test(start_paused = true)]
async fn test_no_delay_after_final_attempt() {
    let wrapped = with_retries_sync(|_: ()| Err::<(), _>(TestError(0)))
        .with_max_retries(0)
        .with_max_interval(Duration::from_secs(60));

    let start = tokio::time::Instant::now();
    let err = wrapped.call(()).await.unwrap_err();

    assert!(err.is_exhausted());
    assert_eq!(start.elapsed(), Duration::ZERO);
    assert_eq!(err.elapsed(), Duration::ZERO);
}

#[tokio::test(start_paused = true)]
async fn test_no_delay_after_stop() {
    let wrapped = with_retries_sync(|_: ()| Err::<(), _>(TestError(0)))
        .with_max_retries(5)
        .with_max_interval(Duration::from_secs(60))
        .stop_when(|_: &TestError| true);

    let start = tokio::time::Instant::now();
    let err = wrapped.call(()).await.unwrap_err();

    assert!(err.is_stopped());
    assert_eq!(err.attempts(), 1);
    assert_eq!(start.elapsed(), Duration::ZERO);
}

#[tokio::test]
async fn test_calls_are_independent() {
    let calls = Arc::new(AtomicU32::new(0));

    let wrapped = with_retries({
        let calls = calls.clone();
        move |fail_first: bool| {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if fail_first && n % 2 == 0 {
                    Err(TestError(n))
                } else {
                    Ok(n)
                }
            }
        }
    })
    .with_max_retries(1)
    .with_max_interval(Duration::ZERO);

    // Each call gets a fresh retry budget.
    for _ in 0..3 {
        assert!(wrapped.call(true).await.is_ok());
    }
    assert_eq!(calls.load(Ordering::SeqCst), 6);
}

#[tokio::test]
async fn test_concurrent_calls_share_nothing() {
    let wrapped = with_retries(|id: u32| async move {
        tokio::task::yield_now().await;
        Err::<u32, _>(TestError(id))
    })
    .with_max_retries(3)
    .with_max_interval(Duration::from_millis(2));

    let (a, b) = tokio::join!(wrapped.call(1), wrapped.call(2));

    let (a, b) = (a.unwrap_err(), b.unwrap_err());
    assert_eq!(a.attempts(), 4);
    assert_eq!(b.attempts(), 4);
    assert_eq!(a.into_cause(), Some(TestError(1)));
    assert_eq!(b.into_cause(), Some(TestError(2)));
}

#[tokio::test]
async fn test_into_fn_spawns_on_runtime() {
    let flaky = Flaky::failing(1, TestError(0));
    let call = with_retries_sync({
        let flaky = flaky.clone();
        move |s: String| flaky.attempt(()).map(|_| s.len())
    })
    .with_max_interval(Duration::ZERO)
    .into_fn();

    let handles: Vec<_> = ["a", "bb"]
        .into_iter()
        .map(|s| tokio::spawn(call(s.to_string())))
        .collect();

    let mut lengths = Vec::new();
    for handle in handles {
        lengths.push(handle.await.unwrap().unwrap());
    }
    lengths.sort();

    assert_eq!(lengths, vec![1, 2]);
    assert_eq!(flaky.calls(), 3);
}

#[tokio::test]
#[should_panic(expected = "observer exploded")]
async fn test_observer_panic_propagates() {
    let wrapped = with_retries_sync(|_: ()| Err::<(), _>(TestError(0)))
        .with_max_interval(Duration::ZERO)
        .on_failure(|_: &TestError| panic!("observer exploded"));

    let _ = wrapped.call(()).await;
}

fn exploding_check() -> bool {
    panic!("predicate exploded")
}

#[tokio::test]
#[should_panic(expected = "predicate exploded")]
async fn test_stop_predicate_panic_propagates() {
    let wrapped = with_retries_sync(|_: ()| Err::<(), _>(TestError(0)))
        .with_max_retries(1)
        .with_max_interval(Duration::ZERO)
        .stop_when(|_: &TestError| panic!("predicate exploded"));

    let _ = wrapped.call(()).await;
}

#[tokio::test]
#[should_panic(expected = "predicate exploded")]
async fn test_async_stop_predicate_panic_propagates() {
    let wrapped = with_retries_sync(|_: ()| Err::<(), _>(TestError(0)))
        .with_max_retries(1)
        .with_max_interval(Duration::ZERO)
        .stop_when_async(|_: &TestError| async {
            tokio::task::yield_now().await;
            exploding_check()
        });

    let _ = wrapped.call(()).await;
}

#[tokio::test]
async fn test_with_config_applies_both_bounds() {
    let flaky = Flaky::always_failing(TestError(0));
    let wrapped = with_retries_sync({
        let flaky = flaky.clone();
        move |_: ()| flaky.attempt(())
    })
    .with_config(RetryConfig::new().with_max_retries(4).with_max_interval_ms(0));

    let err = wrapped.call(()).await.unwrap_err();

    assert_eq!(err.attempts(), 5);
    assert_eq!(flaky.calls(), 5);
}

#[cfg(feature = "tracing")]
mod tracing_tests {
    use super::*;
    use tracing_test::traced_test;

    #[tokio::test]
    #[traced_test]
    async fn test_logs_retries_and_give_up() {
        let wrapped = with_retries_sync(|_: ()| Err::<(), _>("unreachable host"))
            .with_max_retries(1)
            .with_max_interval(Duration::ZERO)
            .with_observer(LogFailure);

        let _ = wrapped.call(()).await;

        assert!(logs_contain("attempt failed, retrying"));
        assert!(logs_contain("unreachable host"));
        assert!(logs_contain("giving up"));
    }
}
