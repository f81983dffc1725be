//! Testing utilities for code that retries.
//!
//! This module provides a scripted flaky operation, a recording failure
//! observer, assertion macros and property-based testing support.
//!
//! # Examples
//!
//! ## Flaky operations
//!
//! ```rust
//! use with_retries::testing::Flaky;
//! use with_retries::with_retries_sync;
//! use std::time::Duration;
//!
//! # tokio_test::block_on(async {
//! let flaky = Flaky::failing(2, "timeout");
//! let wrapped = with_retries_sync({
//!     let flaky = flaky.clone();
//!     move |n: u32| flaky.attempt(n).map(|_| n * 10)
//! })
//! .with_max_interval(Duration::ZERO);
//!
//! assert_eq!(wrapped.call(4).await, Ok(40));
//! assert_eq!(flaky.calls(), 3);
//! assert_eq!(flaky.inputs(), vec![4, 4, 4]);
//! # });
//! ```
//!
//! ## Assertion Macros
//!
//! ```rust
//! use with_retries::{assert_retry_exhausted, with_retries_sync};
//! use std::time::Duration;
//!
//! # tokio_test::block_on(async {
//! let wrapped = with_retries_sync(|_: ()| Err::<(), _>("down"))
//!     .with_max_interval(Duration::ZERO);
//!
//! assert_retry_exhausted!(wrapped.call(()).await, attempts = 3);
//! # });
//! ```

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::retry::FailureObserver;

/// A scripted operation that fails a fixed number of times.
///
/// Clones share their call counter and input log, so a clone can be moved
/// into the wrapped closure while the original is kept for assertions.
#[derive(Debug)]
pub struct Flaky<E, I = ()> {
    failures: Option<u32>,
    error: E,
    calls: Arc<AtomicU32>,
    inputs: Arc<Mutex<Vec<I>>>,
}

impl<E, I> Flaky<E, I> {
    /// Fail the first `times` attempts with `error`, then succeed.
    pub fn failing(times: u32, error: E) -> Self {
        Self {
            failures: Some(times),
            error,
            calls: Arc::new(AtomicU32::new(0)),
            inputs: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Fail every attempt with `error`.
    pub fn always_failing(error: E) -> Self {
        Self {
            failures: None,
            error,
            calls: Arc::new(AtomicU32::new(0)),
            inputs: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Number of attempts made so far.
    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    fn inputs_guard(&self) -> MutexGuard<'_, Vec<I>> {
        self.inputs.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl<E: Clone, I> Flaky<E, I> {
    /// Record one attempt with `input` and report whether it succeeded.
    pub fn attempt(&self, input: I) -> Result<(), E> {
        self.inputs_guard().push(input);
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        match self.failures {
            Some(times) if n >= times => Ok(()),
            _ => Err(self.error.clone()),
        }
    }
}

impl<E, I: Clone> Flaky<E, I> {
    /// Every input passed to [`attempt`](Self::attempt), in call order.
    pub fn inputs(&self) -> Vec<I> {
        self.inputs_guard().clone()
    }
}

impl<E: Clone, I> Clone for Flaky<E, I> {
    fn clone(&self) -> Self {
        Self {
            failures: self.failures,
            error: self.error.clone(),
            calls: Arc::clone(&self.calls),
            inputs: Arc::clone(&self.inputs),
        }
    }
}

/// A failure observer that keeps every error it is shown.
///
/// Clones share the same log.
///
/// # Example
///
/// ```rust
/// use with_retries::testing::FailureLog;
/// use with_retries::with_retries_sync;
/// use std::time::Duration;
///
/// # tokio_test::block_on(async {
/// let log = FailureLog::new();
/// let wrapped = with_retries_sync(|_: ()| Err::<(), _>("nope"))
///     .with_max_interval(Duration::ZERO)
///     .with_observer(log.clone());
///
/// let _ = wrapped.call(()).await;
/// assert_eq!(log.errors(), vec!["nope", "nope"]);
/// # });
/// ```
#[derive(Debug)]
pub struct FailureLog<E> {
    errors: Arc<Mutex<Vec<E>>>,
}

impl<E> FailureLog<E> {
    /// Create an empty log.
    pub fn new() -> Self {
        Self {
            errors: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Number of errors observed.
    pub fn len(&self) -> usize {
        self.guard().len()
    }

    /// Returns true if nothing has been observed.
    pub fn is_empty(&self) -> bool {
        self.guard().is_empty()
    }

    fn guard(&self) -> MutexGuard<'_, Vec<E>> {
        self.errors.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl<E: Clone> FailureLog<E> {
    /// Every observed error, in order.
    pub fn errors(&self) -> Vec<E> {
        self.guard().clone()
    }
}

impl<E> Default for FailureLog<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> Clone for FailureLog<E> {
    fn clone(&self) -> Self {
        Self {
            errors: Arc::clone(&self.errors),
        }
    }
}

impl<E: Clone + Send> FailureObserver<E> for FailureLog<E> {
    fn on_failure(&self, error: &E) {
        self.guard().push(error.clone());
    }
}

/// Assert that a wrapped call gave up because its retries ran out.
///
/// Optionally checks the number of attempts made.
///
/// # Example
///
/// ```rust
/// use with_retries::{assert_retry_exhausted, RetryError, RetryErrorKind};
/// use std::time::Duration;
///
/// let result: Result<(), _> = Err(RetryError::new(RetryErrorKind::Exhausted, "e", 3, Duration::ZERO));
/// assert_retry_exhausted!(result, attempts = 3);
/// ```
#[macro_export]
macro_rules! assert_retry_exhausted {
    ($result:expr) => {
        match $result {
            Err(err) if err.is_exhausted() => {}
            Err(err) => panic!("Expected exhausted retries, got {:?}", err.kind()),
            Ok(_) => panic!("Expected exhausted retries, got Ok"),
        }
    };
    ($result:expr, attempts = $attempts:expr) => {
        match $result {
            Err(err) if err.is_exhausted() => {
                assert_eq!(err.attempts(), $attempts, "unexpected number of attempts");
            }
            Err(err) => panic!("Expected exhausted retries, got {:?}", err.kind()),
            Ok(_) => panic!("Expected exhausted retries, got Ok"),
        }
    };
}

/// Assert that a wrapped call gave up because its stop predicate fired.
///
/// Optionally checks the number of attempts made.
///
/// # Example
///
/// ```rust
/// use with_retries::{assert_retry_stopped, RetryError, RetryErrorKind};
/// use std::time::Duration;
///
/// let result: Result<(), _> = Err(RetryError::new(RetryErrorKind::Stopped, "e", 1, Duration::ZERO));
/// assert_retry_stopped!(result, attempts = 1);
/// ```
#[macro_export]
macro_rules! assert_retry_stopped {
    ($result:expr) => {
        match $result {
            Err(err) if err.is_stopped() => {}
            Err(err) => panic!("Expected stopped retries, got {:?}", err.kind()),
            Ok(_) => panic!("Expected stopped retries, got Ok"),
        }
    };
    ($result:expr, attempts = $attempts:expr) => {
        match $result {
            Err(err) if err.is_stopped() => {
                assert_eq!(err.attempts(), $attempts, "unexpected number of attempts");
            }
            Err(err) => panic!("Expected stopped retries, got {:?}", err.kind()),
            Ok(_) => panic!("Expected stopped retries, got Ok"),
        }
    };
}

#[cfg(feature = "proptest")]
use proptest::prelude::*;

#[cfg(feature = "proptest")]
impl Arbitrary for crate::RetryConfig {
    type Parameters = ();
    type Strategy = BoxedStrategy<Self>;

    fn arbitrary_with(_: Self::Parameters) -> Self::Strategy {
        (0u32..=16, 0u64..=50)
            .prop_map(|(retries, interval_ms)| {
                crate::RetryConfig::new()
                    .with_max_retries(retries)
                    .with_max_interval_ms(interval_ms)
            })
            .boxed()
    }
}
