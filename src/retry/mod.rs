//! Retry any fallible operation with bounded attempts and random backoff.
//!
//! - **Data**: [`RetryConfig`] holds the retry budget and the delay bound. It
//!   is plain data and easy to load from configuration.
//! - **Hooks**: [`FailureObserver`] and [`StopPredicate`] are optional
//!   capabilities; plain closures implement both.
//! - **Combinator**: [`with_retries`] wraps the operation and returns a
//!   [`WithRetries`] whose `call` behaves like the original operation but
//!   retries failures.
//!
//! # Quick Start
//!
//! ```rust
//! use with_retries::{with_retries, RetryErrorKind};
//! use std::time::Duration;
//!
//! # tokio_test::block_on(async {
//! let fetch = with_retries(|id: u32| async move { Err::<String, _>(format!("user {} not found", id)) })
//!     .with_max_retries(3)
//!     .with_max_interval(Duration::from_millis(5))
//!     .stop_when(|e: &String| e.contains("not found"));
//!
//! let err = fetch.call(7).await.unwrap_err();
//! assert_eq!(err.kind(), RetryErrorKind::Stopped);
//! assert_eq!(err.attempts(), 1);
//! assert_eq!(err.cause().map(String::as_str), Some("user 7 not found"));
//! # });
//! ```
//!
//! # Backoff
//!
//! Between a failed attempt and the next one the call sleeps for a uniformly
//! random whole number of milliseconds in `[0, max_interval]`. There is no
//! delay before the first attempt and none after the last.
//!
//! # Error Types
//!
//! - [`RetryError`]: returned when a call gives up; holds the last failure
//!   and metadata about the attempts
//! - [`RetryErrorKind`]: why the call gave up

mod combinator;
mod config;
mod error;
mod hooks;

pub use combinator::{with_retries, with_retries_sync, WithRetries};
pub use config::{RetryConfig, DEFAULT_MAX_INTERVAL_MS, DEFAULT_MAX_RETRIES};
pub use error::{RetryError, RetryErrorKind};
#[cfg(feature = "tracing")]
pub use hooks::LogFailure;
pub use hooks::{AsyncStop, FailureObserver, StopPredicate};

#[cfg(test)]
mod tests;
