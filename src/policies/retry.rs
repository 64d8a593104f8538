//! # Retry policy for delivery attempts.
//!
//! [`RetryPolicy`] bounds a delivery's attempt sequence and controls how retry
//! delays grow after repeated transient failures. It is parameterized by:
//! - [`RetryPolicy::max_attempts`] the attempt bound (count-based);
//! - [`RetryPolicy::factor`] the multiplicative growth factor;
//! - [`RetryPolicy::first`] the initial delay;
//! - [`RetryPolicy::max`] the maximum delay cap;
//! - [`RetryPolicy::jitter`] the randomization applied on top.
//!
//! The delay for attempt `n` is computed as `first × factor^n`, clamped to
//! `max`, then jitter is applied. Because the base delay is derived purely
//! from the attempt number, jitter output never feeds back into subsequent
//! calculations, which prevents the negative feedback loop that makes delays
//! shrink over time.
//!
//! # Example
//! ```rust
//! use std::time::Duration;
//! use relaybus::{JitterPolicy, RetryPolicy};
//!
//! let retry = RetryPolicy {
//!     first: Duration::from_millis(100),
//!     max: Duration::from_secs(10),
//!     factor: 2.0,
//!     jitter: JitterPolicy::None,
//!     max_attempts: 5,
//! };
//!
//! // Attempt 0 — uses 'first' (100ms)
//! assert_eq!(retry.delay(0), Duration::from_millis(100));
//!
//! // Attempt 1 — first × factor^1 = 200ms
//! assert_eq!(retry.delay(1), Duration::from_millis(200));
//!
//! // Attempt 10 — 100ms × 2^10 = 102_400ms → capped at max=10s
//! assert_eq!(retry.delay(10), Duration::from_secs(10));
//! ```

use std::time::Duration;

use rand::Rng;

/// Randomization applied to a computed backoff delay.
///
/// When a subscriber comes back after an outage, every delivery that failed
/// against it retries on the same exponential schedule; jitter spreads those
/// retries out so the subscriber is not hit by a synchronized burst.
///
/// Delays are attempt-indexed in this crate, so only stateless strategies
/// are offered; each delay randomizes independently of the previous one.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum JitterPolicy {
    /// No randomization; the exact computed delay is used.
    ///
    /// Predictable timing, appropriate for tests and for brokers with few
    /// deliveries in flight per subscriber.
    #[default]
    None,

    /// Uniform random delay in `[0, computed]`.
    ///
    /// Maximum spread; individual retries may fire almost immediately.
    Full,

    /// Half the computed delay plus a uniform random half: `[d/2, d]`.
    ///
    /// Keeps at least 50% of the backoff while still de-synchronizing
    /// retries. The recommended choice for busy brokers.
    Equal,
}

impl JitterPolicy {
    /// Spreads `base` according to the policy.
    pub fn spread(&self, base: Duration) -> Duration {
        match self {
            JitterPolicy::None => base,
            JitterPolicy::Full => base.mul_f64(rand::rng().random_range(0.0..=1.0)),
            JitterPolicy::Equal => {
                let half = base / 2;
                half + half.mul_f64(rand::rng().random_range(0.0..=1.0))
            }
        }
    }
}

/// Delivery retry policy.
///
/// Encapsulates parameters that determine how many attempts a delivery gets
/// and how the delays between them grow:
/// - [`RetryPolicy::max_attempts`] — attempt bound;
/// - [`RetryPolicy::factor`] — multiplicative growth factor;
/// - [`RetryPolicy::first`] — the initial delay;
/// - [`RetryPolicy::max`] — the maximum delay cap.
#[derive(Clone, Copy, Debug)]
pub struct RetryPolicy {
    /// Initial delay before the first retry.
    pub first: Duration,
    /// Maximum delay cap for retries.
    pub max: Duration,
    /// Multiplicative growth factor (`>= 1.0` recommended).
    pub factor: f64,
    /// Jitter policy to prevent thundering herd.
    pub jitter: JitterPolicy,
    /// Maximum number of delivery attempts before the delivery is abandoned
    /// (minimum 1; a transient failure on the final attempt is not retried).
    pub max_attempts: u32,
}

impl Default for RetryPolicy {
    /// Returns a policy with:
    /// - `first = 100ms`;
    /// - `max = 30s`;
    /// - `factor = 2.0` (exponential);
    /// - `max_attempts = 5`.
    fn default() -> Self {
        Self {
            first: Duration::from_millis(100),
            max: Duration::from_secs(30),
            factor: 2.0,
            jitter: JitterPolicy::None,
            max_attempts: 5,
        }
    }
}

impl RetryPolicy {
    /// Returns the attempt bound clamped to a minimum of 1.
    #[inline]
    pub fn attempts_clamped(&self) -> u32 {
        self.max_attempts.max(1)
    }

    /// Computes the delay for the given attempt number (0-indexed).
    ///
    /// The base delay is `first × factor^attempt`, clamped to
    /// [`RetryPolicy::max`]. Jitter is applied to the clamped base, but the
    /// result is **never** fed back into subsequent calculations — each
    /// attempt derives its base independently.
    ///
    /// # Notes
    /// - If `factor` is less than 1.0, delays decrease with higher attempts (not typical).
    /// - If `factor` equals 1.0, the delay stays constant at `first` (up to `max`).
    /// - If `factor` is greater than 1.0, delays grow exponentially up to `max`.
    pub fn delay(&self, attempt: u32) -> Duration {
        let max_secs = self.max.as_secs_f64();
        let clamped_exp = attempt.min(i32::MAX as u32) as i32;
        let unclamped_secs = self.first.as_secs_f64() * self.factor.powi(clamped_exp);

        let base =
            if !unclamped_secs.is_finite() || unclamped_secs < 0.0 || unclamped_secs > max_secs {
                self.max
            } else {
                Duration::from_secs_f64(unclamped_secs)
            };

        self.jitter.spread(base)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_attempt_zero_returns_first() {
        let policy = RetryPolicy {
            first: Duration::from_millis(100),
            max: Duration::from_secs(30),
            factor: 2.0,
            jitter: JitterPolicy::None,
            max_attempts: 5,
        };
        assert_eq!(policy.delay(0), Duration::from_millis(100));
    }

    #[test]
    fn test_exponential_growth_no_jitter() {
        let policy = RetryPolicy {
            first: Duration::from_millis(100),
            max: Duration::from_secs(30),
            factor: 2.0,
            jitter: JitterPolicy::None,
            max_attempts: 5,
        };

        assert_eq!(policy.delay(0), Duration::from_millis(100));
        assert_eq!(policy.delay(1), Duration::from_millis(200));
        assert_eq!(policy.delay(2), Duration::from_millis(400));
        assert_eq!(policy.delay(3), Duration::from_millis(800));
        assert_eq!(policy.delay(4), Duration::from_millis(1600));
    }

    #[test]
    fn test_constant_factor() {
        let policy = RetryPolicy {
            first: Duration::from_millis(500),
            max: Duration::from_secs(30),
            factor: 1.0,
            jitter: JitterPolicy::None,
            max_attempts: 5,
        };
        for attempt in 0..10 {
            assert_eq!(
                policy.delay(attempt),
                Duration::from_millis(500),
                "attempt {} should be constant at 500ms",
                attempt
            );
        }
    }

    #[test]
    fn test_clamped_to_max() {
        let policy = RetryPolicy {
            first: Duration::from_millis(100),
            max: Duration::from_secs(1),
            factor: 2.0,
            jitter: JitterPolicy::None,
            max_attempts: 5,
        };
        assert_eq!(policy.delay(10), Duration::from_secs(1));
    }

    #[test]
    fn test_first_exceeds_max() {
        let policy = RetryPolicy {
            first: Duration::from_secs(10),
            max: Duration::from_secs(5),
            factor: 2.0,
            jitter: JitterPolicy::None,
            max_attempts: 5,
        };
        assert_eq!(policy.delay(0), Duration::from_secs(5));
    }

    #[test]
    fn test_full_jitter_no_negative_feedback() {
        let policy = RetryPolicy {
            first: Duration::from_millis(100),
            max: Duration::from_secs(30),
            factor: 2.0,
            jitter: JitterPolicy::Full,
            max_attempts: 5,
        };

        for attempt in 5..15 {
            let base_ms = (100.0 * 2.0f64.powi(attempt as i32)).min(30_000.0);
            let delay = policy.delay(attempt);
            assert!(
                delay <= Duration::from_millis(base_ms.ceil() as u64),
                "attempt {}: delay {:?} exceeds base {}ms",
                attempt,
                delay,
                base_ms
            );
        }
    }

    #[test]
    fn test_equal_jitter_keeps_half_the_base() {
        let policy = RetryPolicy {
            first: Duration::from_millis(100),
            max: Duration::from_secs(30),
            factor: 2.0,
            jitter: JitterPolicy::Equal,
            max_attempts: 5,
        };

        for attempt in 0..15 {
            let base_ms = (100.0 * 2.0f64.powi(attempt as i32)).min(30_000.0);
            let delay = policy.delay(attempt);
            assert!(
                delay >= Duration::from_millis((base_ms / 2.0).floor() as u64),
                "attempt {}: delay {:?} < half of base {}ms",
                attempt,
                delay,
                base_ms
            );
            assert!(
                delay <= Duration::from_millis(base_ms.ceil() as u64),
                "attempt {}: delay {:?} > base {}ms",
                attempt,
                delay,
                base_ms
            );
        }
    }

    #[test]
    fn test_jitter_of_zero_delay_is_zero() {
        assert_eq!(JitterPolicy::Full.spread(Duration::ZERO), Duration::ZERO);
        assert_eq!(JitterPolicy::Equal.spread(Duration::ZERO), Duration::ZERO);
    }

    #[test]
    fn test_huge_attempt_clamps_to_max() {
        let policy = RetryPolicy {
            first: Duration::from_millis(100),
            max: Duration::from_secs(60),
            factor: 2.0,
            jitter: JitterPolicy::None,
            max_attempts: 5,
        };
        assert_eq!(policy.delay(100), Duration::from_secs(60));
    }

    #[test]
    fn test_non_finite_overflow_clamps_to_max() {
        let policy = RetryPolicy {
            first: Duration::from_millis(100),
            max: Duration::from_secs(10),
            factor: 2.0,
            jitter: JitterPolicy::None,
            max_attempts: 5,
        };
        assert_eq!(policy.delay(u32::MAX), Duration::from_secs(10));
    }

    #[test]
    fn test_attempts_clamped_minimum_one() {
        let policy = RetryPolicy {
            max_attempts: 0,
            ..Default::default()
        };
        assert_eq!(policy.attempts_clamped(), 1);
    }
}
