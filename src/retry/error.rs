//! Error type returned when a wrapped call gives up.

use std::time::Duration;

/// Why a wrapped call stopped retrying.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RetryErrorKind {
    /// The final permitted attempt failed.
    Exhausted,
    /// The stop predicate asked to give up before the retry budget ran out.
    Stopped,
    /// The attempt loop ended without a result. Never produced unless the
    /// loop bounds are broken.
    Escaped,
}

impl RetryErrorKind {
    /// The fixed message carried by errors of this kind.
    pub fn message(self) -> &'static str {
        match self {
            RetryErrorKind::Exhausted => "retries exhausted",
            RetryErrorKind::Stopped => "stopped retrying",
            RetryErrorKind::Escaped => "retry loop exited without a result",
        }
    }
}

/// Error returned by a wrapped call that did not succeed.
///
/// Carries the error from the most recent failed attempt as its cause, along
/// with how many attempts were made and how long they took.
///
/// # Examples
///
/// ```rust
/// use with_retries::{with_retries_sync, RetryErrorKind};
/// use std::time::Duration;
///
/// # tokio_test::block_on(async {
/// let wrapped = with_retries_sync(|_: ()| Err::<(), _>("always fails"))
///     .with_max_retries(2)
///     .with_max_interval(Duration::ZERO);
///
/// let err = wrapped.call(()).await.unwrap_err();
/// assert_eq!(err.kind(), RetryErrorKind::Exhausted);
/// assert_eq!(err.cause(), Some(&"always fails"));
/// assert_eq!(err.attempts(), 3); // 1 initial + 2 retries
/// # });
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryError<E> {
    kind: RetryErrorKind,
    cause: Option<E>,
    attempts: u32,
    elapsed: Duration,
}

impl<E> RetryError<E> {
    /// Create an error wrapping the last failure.
    pub fn new(kind: RetryErrorKind, cause: E, attempts: u32, elapsed: Duration) -> Self {
        Self {
            kind,
            cause: Some(cause),
            attempts,
            elapsed,
        }
    }

    /// Create the error for a loop that ended without a result.
    pub fn escaped(attempts: u32, elapsed: Duration) -> Self {
        Self {
            kind: RetryErrorKind::Escaped,
            cause: None,
            attempts,
            elapsed,
        }
    }

    /// Why retrying ended.
    pub fn kind(&self) -> RetryErrorKind {
        self.kind
    }

    /// Fixed human-readable message for this error's kind.
    pub fn message(&self) -> &'static str {
        self.kind.message()
    }

    /// The error from the last failed attempt.
    pub fn cause(&self) -> Option<&E> {
        self.cause.as_ref()
    }

    /// Extract the error from the last failed attempt, discarding metadata.
    pub fn into_cause(self) -> Option<E> {
        self.cause
    }

    /// Total number of attempts made (initial + retries).
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Time from the first attempt until giving up.
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// Returns true if every permitted attempt failed.
    pub fn is_exhausted(&self) -> bool {
        self.kind == RetryErrorKind::Exhausted
    }

    /// Returns true if the stop predicate ended retrying.
    pub fn is_stopped(&self) -> bool {
        self.kind == RetryErrorKind::Stopped
    }
}

impl<E: std::fmt::Display> std::fmt::Display for RetryError<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let plural = if self.attempts == 1 { "" } else { "s" };
        match &self.cause {
            Some(cause) => write!(
                f,
                "{} after {} attempt{}: {}",
                self.message(),
                self.attempts,
                plural,
                cause
            ),
            None => write!(f, "{} after {} attempt{}", self.message(), self.attempts, plural),
        }
    }
}

impl<E: std::error::Error + 'static> std::error::Error for RetryError<E> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.cause
            .as_ref()
            .map(|cause| cause as &(dyn std::error::Error + 'static))
    }
}
