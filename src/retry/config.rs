//! Retry configuration.

use std::time::Duration;

/// Retries after the first attempt when nothing else is configured.
pub const DEFAULT_MAX_RETRIES: u32 = 2;

/// Upper bound of the backoff delay, in milliseconds, when nothing else is
/// configured.
pub const DEFAULT_MAX_INTERVAL_MS: u64 = 500;

/// How many times to retry and how long to wait in between.
///
/// This is plain data: it describes the retry behavior but does not run
/// anything, so it can be cloned, compared and (with the `serde` feature)
/// loaded from a config file.
///
/// The backoff before each retry is drawn uniformly from
/// `[0, max_interval]`. There is never a delay before the first attempt.
///
/// # Examples
///
/// ```rust
/// use with_retries::RetryConfig;
/// use std::time::Duration;
///
/// let config = RetryConfig::new();
/// assert_eq!(config.max_retries(), 2);
/// assert_eq!(config.max_interval(), Duration::from_millis(500));
///
/// let config = RetryConfig::new()
///     .with_max_retries(5)
///     .with_max_interval(Duration::from_millis(100));
/// assert_eq!(config.total_attempts(), 6);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct RetryConfig {
    max_retries: u32,
    max_interval_ms: u64,
}

impl RetryConfig {
    /// Create a configuration with the default bounds (2 retries, 500ms).
    pub fn new() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            max_interval_ms: DEFAULT_MAX_INTERVAL_MS,
        }
    }

    /// Set the number of retries after the first attempt.
    ///
    /// `with_max_retries(3)` allows up to 4 attempts in total. Zero means the
    /// operation runs exactly once.
    pub fn with_max_retries(mut self, n: u32) -> Self {
        self.max_retries = n;
        self
    }

    /// Set the inclusive upper bound of the backoff delay.
    ///
    /// Truncated to whole milliseconds.
    pub fn with_max_interval(mut self, max: Duration) -> Self {
        self.max_interval_ms = u64::try_from(max.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Set the inclusive upper bound of the backoff delay in milliseconds.
    pub fn with_max_interval_ms(mut self, ms: u64) -> Self {
        self.max_interval_ms = ms;
        self
    }

    /// Number of retries after the first attempt.
    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Upper bound of the backoff delay.
    pub fn max_interval(&self) -> Duration {
        Duration::from_millis(self.max_interval_ms)
    }

    /// Upper bound of the backoff delay in milliseconds.
    pub fn max_interval_ms(&self) -> u64 {
        self.max_interval_ms
    }

    /// Maximum number of times the operation runs (initial + retries).
    pub fn total_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self::new()
    }
}
