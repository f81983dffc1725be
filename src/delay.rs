//! Backoff delay helpers: a uniform random delay generator and a
//! cooperative sleep.
//!
//! Both are thin wrappers over ambient services. Randomness comes from the
//! thread-local generator returned by [`rand::rng`], and suspension uses the
//! tokio timer, so a sleeping retry loop never blocks other tasks.
//!
//! # Examples
//!
//! ```rust
//! use with_retries::delay::{random_delay, sleep};
//! use std::time::Duration;
//!
//! # tokio_test::block_on(async {
//! let delay = random_delay(Duration::from_millis(20));
//! assert!(delay <= Duration::from_millis(20));
//!
//! sleep(delay).await;
//! # });
//! ```

use std::time::Duration;

use rand::Rng;

/// Pick a random integer in `[min, max]`, inclusive on both ends.
///
/// `min` is rounded up and `max` is rounded down before sampling, so
/// fractional bounds only ever shrink the range. If the rounded range is
/// empty (`max < min`) the rounded `min` is returned.
///
/// # Examples
///
/// ```rust
/// use with_retries::delay::random_in_range;
///
/// let n = random_in_range(0.0, 10.0);
/// assert!((0..=10).contains(&n));
///
/// // 0.2 rounds up to 1, 3.9 rounds down to 3
/// let n = random_in_range(0.2, 3.9);
/// assert!((1..=3).contains(&n));
///
/// assert_eq!(random_in_range(7.0, 7.0), 7);
/// ```
pub fn random_in_range(min: f64, max: f64) -> i64 {
    let min = min.ceil() as i64;
    let max = max.floor() as i64;
    if max <= min {
        return min;
    }
    rand::rng().random_range(min..=max)
}

/// Pick a uniform whole-millisecond delay in `[0, max]`.
///
/// Anything below one millisecond of `max` is dropped, so a `max` shorter
/// than 1ms always yields [`Duration::ZERO`].
pub fn random_delay(max: Duration) -> Duration {
    let max_ms = u64::try_from(max.as_millis()).unwrap_or(u64::MAX);
    if max_ms == 0 {
        return Duration::ZERO;
    }
    Duration::from_millis(rand::rng().random_range(0..=max_ms))
}

/// Suspend the current task for at least `duration`.
///
/// A zero duration still yields to the scheduler once before completing,
/// giving other ready tasks a chance to run.
pub async fn sleep(duration: Duration) {
    if duration.is_zero() {
        tokio::task::yield_now().await;
    } else {
        tokio::time::sleep(duration).await;
    }
}

/// [`sleep`] for a number of milliseconds.
pub async fn sleep_ms(ms: u64) {
    sleep(Duration::from_millis(ms)).await
}
