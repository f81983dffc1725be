//! Hooks a wrapped call consults when an attempt fails.
//!
//! - [`FailureObserver`] sees every failure that will be retried.
//! - [`StopPredicate`] decides whether to give up early.
//!
//! Both are implemented for plain closures, so most callers never name these
//! traits directly:
//!
//! ```rust
//! use with_retries::with_retries_sync;
//!
//! let wrapped = with_retries_sync(|n: u32| Err::<u32, _>(format!("bad input {}", n)))
//!     .on_failure(|e: &String| eprintln!("retrying after: {}", e))
//!     .stop_when(|e: &String| e.contains("fatal"));
//! ```

use std::future::Future;

use futures::future::BoxFuture;

/// Observes failed attempts that are about to be retried.
///
/// Called synchronously, once per failure, before the backoff delay. It is
/// never called on success or for the failure that ends the call. A panic
/// inside the observer is not caught and unwinds out of the wrapped call.
pub trait FailureObserver<E>: Send + Sync {
    /// Handle the error of a failed attempt.
    fn on_failure(&self, error: &E);
}

impl<E, F> FailureObserver<E> for F
where
    F: Fn(&E) + Send + Sync,
{
    fn on_failure(&self, error: &E) {
        self(error)
    }
}

/// Decides whether a failure should end retrying immediately.
///
/// Synchronous closures `Fn(&E) -> bool` implement this directly. Use
/// [`AsyncStop`] for predicates that need to await something.
pub trait StopPredicate<E>: Send + Sync {
    /// Resolve to `true` to give up without using the remaining retries.
    fn should_stop<'a>(&'a self, error: &'a E) -> BoxFuture<'a, bool>;
}

impl<E, F> StopPredicate<E> for F
where
    F: Fn(&E) -> bool + Send + Sync,
{
    fn should_stop<'a>(&'a self, error: &'a E) -> BoxFuture<'a, bool> {
        Box::pin(futures::future::ready(self(error)))
    }
}

/// Adapts an async closure into a [`StopPredicate`].
///
/// The returned future cannot borrow the error; clone what it needs first.
///
/// # Examples
///
/// ```rust
/// use with_retries::{AsyncStop, StopPredicate};
///
/// # tokio_test::block_on(async {
/// let predicate = AsyncStop::new(|code: &u16| {
///     let code = *code;
///     async move { code == 401 || code == 403 }
/// });
///
/// assert!(predicate.should_stop(&401).await);
/// assert!(!predicate.should_stop(&503).await);
/// # });
/// ```
#[derive(Debug, Clone)]
pub struct AsyncStop<F>(F);

impl<F> AsyncStop<F> {
    /// Wrap an async predicate.
    pub fn new(predicate: F) -> Self {
        Self(predicate)
    }
}

impl<E, F, Fut> StopPredicate<E> for AsyncStop<F>
where
    F: Fn(&E) -> Fut + Send + Sync,
    Fut: Future<Output = bool> + Send + 'static,
{
    fn should_stop<'a>(&'a self, error: &'a E) -> BoxFuture<'a, bool> {
        Box::pin((self.0)(error))
    }
}

/// Failure observer that logs each retried failure at `WARN` level.
///
/// # Examples
///
/// ```rust
/// use with_retries::{with_retries_sync, LogFailure};
/// use std::time::Duration;
///
/// # tokio_test::block_on(async {
/// let wrapped = with_retries_sync(|_: ()| Err::<(), _>("connection refused"))
///     .with_max_retries(1)
///     .with_max_interval(Duration::ZERO)
///     .with_observer(LogFailure);
///
/// assert!(wrapped.call(()).await.is_err());
/// # });
/// ```
#[cfg(feature = "tracing")]
#[derive(Debug, Clone, Copy, Default)]
pub struct LogFailure;

#[cfg(feature = "tracing")]
impl<E: std::fmt::Display> FailureObserver<E> for LogFailure {
    fn on_failure(&self, error: &E) {
        tracing::warn!(error = %error, "attempt failed, will retry");
    }
}
