//! The retry combinator.
//!
//! [`with_retries`] wraps an operation `Fn(I) -> Future<Output = Result<T, E>>`
//! and returns a [`WithRetries`] whose [`call`](WithRetries::call) has the
//! same input and success types. Operations that take several arguments take
//! them as a tuple.
//!
//! A call moves through a small state machine:
//!
//! ```text
//! Attempting(0) ──ok──▶ Succeeded
//!      │err
//!      ▼
//!   give up? ──yes──▶ Failed(RetryError)
//!      │no
//!      ▼
//!  Delaying(0) ──▶ Attempting(1) ──▶ ...
//! ```
//!
//! Every call owns its attempt counter, so concurrent calls through the same
//! wrapper never affect each other.

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use futures::future::{BoxFuture, Ready};
use tokio::time::Instant;

use crate::delay::{random_delay, sleep};
use crate::retry::config::RetryConfig;
use crate::retry::error::{RetryError, RetryErrorKind};
use crate::retry::hooks::{AsyncStop, FailureObserver, StopPredicate};

/// Wrap an async operation with retries.
///
/// The wrapper starts with [`RetryConfig::default`] (2 retries, up to 500ms
/// between attempts) and no hooks.
///
/// # Examples
///
/// ```rust
/// use with_retries::with_retries;
/// use std::sync::atomic::{AtomicU32, Ordering};
/// use std::sync::Arc;
/// use std::time::Duration;
///
/// # tokio_test::block_on(async {
/// let calls = Arc::new(AtomicU32::new(0));
/// let add = with_retries({
///     let calls = calls.clone();
///     move |(a, b): (i32, i32)| {
///         let n = calls.fetch_add(1, Ordering::SeqCst);
///         async move {
///             if n == 0 {
///                 Err("flaky")
///             } else {
///                 Ok(a + b)
///             }
///         }
///     }
/// })
/// .with_max_interval(Duration::from_millis(10));
///
/// assert_eq!(add.call((1, 2)).await, Ok(3));
/// assert_eq!(calls.load(Ordering::SeqCst), 2);
/// # });
/// ```
pub fn with_retries<Op, I, Fut, T, E>(operation: Op) -> WithRetries<Op, E>
where
    Op: Fn(I) -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    WithRetries {
        operation,
        config: RetryConfig::default(),
        observer: None,
        stop: None,
    }
}

/// Wrap a synchronous operation with retries.
///
/// The operation still runs on the calling task; only the backoff between
/// attempts is asynchronous.
///
/// # Examples
///
/// ```rust
/// use with_retries::with_retries_sync;
/// use std::time::Duration;
///
/// # tokio_test::block_on(async {
/// let parse = with_retries_sync(|s: &str| s.parse::<u16>())
///     .with_max_retries(1)
///     .with_max_interval(Duration::ZERO);
///
/// assert_eq!(parse.call("8080").await, Ok(8080));
///
/// let err = parse.call("http").await.unwrap_err();
/// assert_eq!(err.attempts(), 2);
/// # });
/// ```
pub fn with_retries_sync<Op, I, T, E>(
    operation: Op,
) -> WithRetries<impl Fn(I) -> Ready<Result<T, E>>, E>
where
    Op: Fn(I) -> Result<T, E>,
{
    with_retries(move |input: I| futures::future::ready(operation(input)))
}

/// What a call does after a failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    Retry,
    GiveUp(RetryErrorKind),
}

/// An operation wrapped with retry behavior.
///
/// Built with [`with_retries`] or [`with_retries_sync`] and configured with
/// the builder methods below. Once built it is immutable; every
/// [`call`](Self::call) runs an independent attempt loop.
pub struct WithRetries<Op, E> {
    operation: Op,
    config: RetryConfig,
    observer: Option<Arc<dyn FailureObserver<E>>>,
    stop: Option<Arc<dyn StopPredicate<E>>>,
}

impl<Op, E> WithRetries<Op, E> {
    /// Replace the retry configuration.
    pub fn with_config(mut self, config: RetryConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the number of retries after the first attempt.
    pub fn with_max_retries(mut self, n: u32) -> Self {
        self.config = self.config.with_max_retries(n);
        self
    }

    /// Set the inclusive upper bound of the random delay between attempts.
    pub fn with_max_interval(mut self, max: Duration) -> Self {
        self.config = self.config.with_max_interval(max);
        self
    }

    /// The configuration this wrapper runs with.
    pub fn config(&self) -> &RetryConfig {
        &self.config
    }

    /// Call `f` with the error of every attempt that will be retried.
    ///
    /// Replaces any observer set before.
    pub fn on_failure<F>(self, f: F) -> Self
    where
        F: Fn(&E) + Send + Sync + 'static,
    {
        self.with_observer(f)
    }

    /// Install a [`FailureObserver`].
    ///
    /// Replaces any observer set before.
    pub fn with_observer(mut self, observer: impl FailureObserver<E> + 'static) -> Self {
        self.observer = Some(Arc::new(observer));
        self
    }

    /// Give up early when `predicate` returns true for a failure.
    ///
    /// Replaces any stop predicate set before.
    pub fn stop_when<P>(self, predicate: P) -> Self
    where
        P: Fn(&E) -> bool + Send + Sync + 'static,
    {
        self.with_stop_predicate(predicate)
    }

    /// Give up early when the future returned by `predicate` resolves to true.
    ///
    /// Replaces any stop predicate set before.
    pub fn stop_when_async<P, Fut>(self, predicate: P) -> Self
    where
        P: Fn(&E) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = bool> + Send + 'static,
    {
        self.with_stop_predicate(AsyncStop::new(predicate))
    }

    /// Install a [`StopPredicate`].
    ///
    /// Replaces any stop predicate set before.
    pub fn with_stop_predicate(mut self, predicate: impl StopPredicate<E> + 'static) -> Self {
        self.stop = Some(Arc::new(predicate));
        self
    }

    /// Run the operation with `input`, retrying failures.
    ///
    /// `input` is cloned for every attempt. Returns the first successful
    /// result, or a [`RetryError`] holding the last failure once the retry
    /// budget is spent or the stop predicate gives up. The stop predicate is
    /// not consulted for the final permitted attempt.
    pub async fn call<I, Fut, T>(&self, input: I) -> Result<T, RetryError<E>>
    where
        Op: Fn(I) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        I: Clone,
    {
        let start = Instant::now();

        for attempt in 0..=self.config.max_retries() {
            let error = match (self.operation)(input.clone()).await {
                Ok(value) => return Ok(value),
                Err(error) => error,
            };

            match self.after_failure(attempt, &error).await {
                Step::GiveUp(kind) => {
                    #[cfg(feature = "tracing")]
                    tracing::warn!(attempts = attempt + 1, reason = kind.message(), "giving up");
                    return Err(RetryError::new(kind, error, attempt + 1, start.elapsed()));
                }
                Step::Retry => {
                    if let Some(observer) = &self.observer {
                        observer.on_failure(&error);
                    }
                    let delay = random_delay(self.config.max_interval());
                    #[cfg(feature = "tracing")]
                    tracing::debug!(
                        attempt = attempt + 1,
                        delay_ms = delay.as_millis() as u64,
                        "attempt failed, retrying"
                    );
                    sleep(delay).await;
                }
            }
        }

        // The loop returns on the final attempt, so this is never reached.
        Err(RetryError::escaped(
            self.config.total_attempts(),
            start.elapsed(),
        ))
    }

    /// Turn the wrapper into a plain function with the same input type.
    ///
    /// The returned closure is cheap to clone and every call runs its own
    /// attempt loop.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use with_retries::with_retries;
    ///
    /// # tokio_test::block_on(async {
    /// let double = with_retries(|n: u64| async move { Ok::<_, String>(n * 2) }).into_fn();
    ///
    /// let handle = tokio::spawn(double(21));
    /// assert_eq!(handle.await.unwrap(), Ok(42));
    /// # });
    /// ```
    pub fn into_fn<I, Fut, T>(
        self,
    ) -> impl Fn(I) -> BoxFuture<'static, Result<T, RetryError<E>>> + Clone
    where
        Op: Fn(I) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
        I: Clone + Send + 'static,
        T: Send + 'static,
        E: Send + Sync + 'static,
    {
        let this = Arc::new(self);
        move |input: I| {
            let this = Arc::clone(&this);
            Box::pin(async move { this.call(input).await })
                as BoxFuture<'static, Result<T, RetryError<E>>>
        }
    }

    async fn after_failure(&self, attempt: u32, error: &E) -> Step {
        let max_retries = self.config.max_retries();
        let stop_requested = match &self.stop {
            Some(stop) if attempt < max_retries => stop.should_stop(error).await,
            _ => false,
        };
        let step = next_step(attempt, max_retries, stop_requested);
        #[cfg(feature = "tracing")]
        if step == Step::GiveUp(RetryErrorKind::Stopped) {
            tracing::debug!(attempt = attempt + 1, "stop predicate ended retrying");
        }
        step
    }
}

/// Decide what follows the failure of 0-indexed `attempt`.
///
/// The final permitted attempt always exhausts, whatever `stop_requested` says.
fn next_step(attempt: u32, max_retries: u32, stop_requested: bool) -> Step {
    if attempt >= max_retries {
        Step::GiveUp(RetryErrorKind::Exhausted)
    } else if stop_requested {
        Step::GiveUp(RetryErrorKind::Stopped)
    } else {
        Step::Retry
    }
}

impl<Op: Clone, E> Clone for WithRetries<Op, E> {
    fn clone(&self) -> Self {
        Self {
            operation: self.operation.clone(),
            config: self.config,
            observer: self.observer.clone(),
            stop: self.stop.clone(),
        }
    }
}

impl<Op, E> fmt::Debug for WithRetries<Op, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WithRetries")
            .field("config", &self.config)
            .field("has_observer", &self.observer.is_some())
            .field("has_stop_predicate", &self.stop.is_some())
            .finish_non_exhaustive()
    }
}
