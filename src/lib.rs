//! # with-retries
//!
//! Wrap an async (or sync) fallible operation so that failures are retried a
//! bounded number of times, with a random pause between attempts.
//!
//! ## Quick Example
//!
//! ```rust
//! use with_retries::{with_retries, RetryConfig};
//! use std::sync::atomic::{AtomicU32, Ordering};
//! use std::sync::Arc;
//!
//! # tokio_test::block_on(async {
//! let attempts = Arc::new(AtomicU32::new(0));
//!
//! let connect = with_retries({
//!     let attempts = attempts.clone();
//!     move |host: &'static str| {
//!         let n = attempts.fetch_add(1, Ordering::SeqCst);
//!         async move {
//!             if n < 2 {
//!                 Err(format!("{} refused the connection", host))
//!             } else {
//!                 Ok(format!("connected to {}", host))
//!             }
//!         }
//!     }
//! })
//! .with_config(RetryConfig::new().with_max_retries(3).with_max_interval_ms(10))
//! .on_failure(|e: &String| eprintln!("retrying: {}", e));
//!
//! assert_eq!(connect.call("db.local").await.unwrap(), "connected to db.local");
//! assert_eq!(attempts.load(Ordering::SeqCst), 3);
//! # });
//! ```
//!
//! ## Features
//!
//! - `tracing`: log retries and give-ups, and enable the `LogFailure`
//!   observer
//! - `serde`: serialize and deserialize [`RetryConfig`]
//! - `proptest`: `Arbitrary` for [`RetryConfig`]
//!
//! A tokio runtime with the time driver enabled must be running when a
//! wrapped operation is called.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]

pub mod delay;
pub mod retry;
pub mod testing;

// Re-exports
#[cfg(feature = "tracing")]
pub use retry::LogFailure;
pub use retry::{
    with_retries, with_retries_sync, AsyncStop, FailureObserver, RetryConfig, RetryError,
    RetryErrorKind, StopPredicate, WithRetries,
};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::retry::{
        with_retries, with_retries_sync, FailureObserver, RetryConfig, RetryError,
        RetryErrorKind, StopPredicate, WithRetries,
    };
}
