//! Retry Patterns Example
//!
//! Demonstrates wrapping operations with retries. Shows practical patterns
//! including:
//! - Basic retry of a transiently failing async call
//! - Wrapping a synchronous function
//! - Stopping early on permanent errors
//! - Observing retried failures
//! - Turning a wrapper into a plain function for spawned tasks
//!
//! Run with: cargo run --example retry_patterns --features tracing

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use with_retries::prelude::*;

// ==================== Basic Retry ====================

/// Example 1: Basic retry
///
/// An async operation that fails twice before succeeding.
async fn example_basic_retry() {
    println!("\n=== Example 1: Basic Retry ===");

    let attempts = Arc::new(AtomicU32::new(0));

    let add = with_retries({
        let attempts = attempts.clone();
        move |(a, b): (i32, i32)| {
            let n = attempts.fetch_add(1, Ordering::SeqCst);
            async move {
                println!("  Attempt {}", n + 1);
                if n < 2 {
                    Err("transient failure")
                } else {
                    Ok(a + b)
                }
            }
        }
    })
    .with_max_retries(5)
    .with_max_interval(Duration::from_millis(100));

    match add.call((1, 2)).await {
        Ok(sum) => println!("Success after {} attempts: {}", attempts.load(Ordering::SeqCst), sum),
        Err(err) => println!("Failed: {}", err),
    }
}

// ==================== Synchronous Operations ====================

/// Example 2: Wrapping a synchronous function
async fn example_sync_operation() {
    println!("\n=== Example 2: Synchronous Operation ===");

    let parse_port = with_retries_sync(|s: &str| s.trim().parse::<u16>())
        .with_max_retries(1)
        .with_max_interval(Duration::from_millis(10));

    println!("  parse(\" 8080 \") = {:?}", parse_port.call(" 8080 ").await);

    let err = parse_port.call("eighty").await.unwrap_err();
    println!("  parse(\"eighty\") gave up: {}", err);
}

// ==================== Early Stop ====================

#[derive(Debug, Clone, PartialEq)]
enum ApiError {
    Unavailable,
    Unauthorized,
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApiError::Unavailable => write!(f, "503 service unavailable"),
            ApiError::Unauthorized => write!(f, "401 unauthorized"),
        }
    }
}

/// Example 3: Stop retrying on permanent errors
///
/// Unauthorized will never succeed on retry, so give up right away.
async fn example_stop_when() {
    println!("\n=== Example 3: Stop When ===");

    let attempts = Arc::new(AtomicU32::new(0));

    let fetch = with_retries({
        let attempts = attempts.clone();
        move |token: &'static str| {
            let n = attempts.fetch_add(1, Ordering::SeqCst);
            async move {
                println!("  Attempt {} with token {:?}", n + 1, token);
                if token.is_empty() {
                    Err::<(), _>(ApiError::Unauthorized)
                } else {
                    Err(ApiError::Unavailable)
                }
            }
        }
    })
    .with_max_retries(4)
    .with_max_interval(Duration::from_millis(20))
    .stop_when(|e: &ApiError| *e == ApiError::Unauthorized);

    let err: RetryError<ApiError> = fetch.call("").await.unwrap_err();
    println!(
        "  {:?} after {} attempt(s), cause: {:?}",
        err.kind(),
        err.attempts(),
        err.cause()
    );
}

/// Example 4: Async stop predicate
///
/// The predicate can await, for example to check a health endpoint.
async fn example_stop_when_async() {
    println!("\n=== Example 4: Async Stop Predicate ===");

    let fetch = with_retries(|_: ()| async { Err::<(), _>(ApiError::Unavailable) })
        .with_max_retries(10)
        .with_max_interval(Duration::from_millis(5))
        .stop_when_async(|_: &ApiError| async {
            tokio::time::sleep(Duration::from_millis(1)).await;
            println!("  Health check says the service is down for maintenance");
            true
        });

    let err = fetch.call(()).await.unwrap_err();
    println!("  Gave up after {} attempt(s)", err.attempts());
}

// ==================== Observability ====================

/// Example 5: Observing failures
///
/// The observer sees every failure that is retried, but not the final one.
async fn example_on_failure() {
    println!("\n=== Example 5: Observing Failures ===");

    let fetch = with_retries(|_: ()| async { Err::<(), _>(ApiError::Unavailable) })
        .with_config(RetryConfig::new().with_max_retries(3).with_max_interval_ms(50))
        .on_failure(|e: &ApiError| println!("  Retrying after: {}", e));

    match fetch.call(()).await {
        Ok(()) => println!("  Unexpected success"),
        Err(err) => println!("  {} (took {:?})", err, err.elapsed()),
    }
}

/// Example 6: Logging failures with tracing
#[cfg(feature = "tracing")]
async fn example_log_failure() {
    use with_retries::LogFailure;

    println!("\n=== Example 6: Logging Failures ===");

    let fetch = with_retries(|_: ()| async { Err::<(), _>(ApiError::Unavailable) })
        .with_max_retries(2)
        .with_max_interval(Duration::from_millis(10))
        .with_observer(LogFailure);

    let _ = fetch.call(()).await;
}

// ==================== Spawned Tasks ====================

/// Example 7: A retrying function shared by spawned tasks
async fn example_into_fn() {
    println!("\n=== Example 7: Spawned Tasks ===");

    let attempts = Arc::new(AtomicU32::new(0));

    let lookup = with_retries({
        let attempts = attempts.clone();
        move |user_id: u64| {
            let n = attempts.fetch_add(1, Ordering::SeqCst);
            async move {
                if n % 3 == 0 {
                    Err(format!("lookup {} timed out", user_id))
                } else {
                    Ok(format!("user-{}", user_id))
                }
            }
        }
    })
    .with_max_interval(Duration::from_millis(10))
    .into_fn();

    let handles: Vec<_> = (1..=4).map(|id| tokio::spawn(lookup(id))).collect();
    for handle in handles {
        match handle.await {
            Ok(Ok(user)) => println!("  Found {}", user),
            Ok(Err(err)) => println!("  Lookup failed: {}", err),
            Err(join_err) => println!("  Task panicked: {}", join_err),
        }
    }
    println!("  Total attempts: {}", attempts.load(Ordering::SeqCst));
}

#[tokio::main]
async fn main() {
    #[cfg(feature = "tracing")]
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    println!("======================================");
    println!("  Retry Patterns");
    println!("======================================");

    example_basic_retry().await;
    example_sync_operation().await;
    example_stop_when().await;
    example_stop_when_async().await;
    example_on_failure().await;
    #[cfg(feature = "tracing")]
    example_log_failure().await;
    example_into_fn().await;

    println!("\n======================================");
    println!("  Done");
    println!("======================================");
}
