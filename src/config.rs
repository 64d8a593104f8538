//! # Global broker configuration.
//!
//! Provides [`BrokerConfig`], centralized settings for the broker runtime.
//!
//! ## Sentinel values
//! - `max_concurrent_deliveries = 0` → unlimited (no global semaphore created)
//! - `receive_timeout = 0s` → no per-attempt timeout

use std::time::Duration;

use crate::policies::RetryPolicy;

/// Global configuration for the broker runtime.
///
/// Defines:
/// - **Shutdown behavior**: grace period for draining in-flight deliveries
/// - **Concurrency limits**: max simultaneous delivery attempts
/// - **Event system**: bus capacity for observability events
/// - **Delivery defaults**: retry policy and per-attempt timeout
///
/// ## Field semantics
/// - `grace`: maximum wait for in-flight deliveries on shutdown (`0s` = cancel immediately)
/// - `max_concurrent_deliveries`: global delivery cap (`0` = unlimited)
/// - `bus_capacity`: event bus ring buffer size (min 1; clamped by the bus)
/// - `receive_timeout`: per-attempt receive timeout (`0s` = no timeout)
/// - `retry`: retry/backoff policy applied to every delivery
///
/// All fields are public for flexibility. Prefer the helper accessors to avoid
/// sprinkling sentinel checks (`0`) across the codebase.
#[derive(Clone, Debug)]
pub struct BrokerConfig {
    /// Maximum time to wait for in-flight deliveries to drain on shutdown.
    ///
    /// When shutdown is requested:
    /// - No new deliveries are started
    /// - The broker waits up to `grace` for workers to finish
    /// - If exceeded, workers are cancelled and `BrokerError::GraceExceeded`
    ///   is returned
    pub grace: Duration,

    /// Maximum number of delivery attempts running concurrently.
    ///
    /// - `0` = unlimited (no semaphore)
    /// - `n > 0` = at most `n` attempts in flight at once
    ///
    /// Applied globally across all subscribers and envelopes.
    pub max_concurrent_deliveries: usize,

    /// Capacity of the event bus broadcast ring buffer.
    ///
    /// Observers that lag behind more than `bus_capacity` events will
    /// observe `Lagged` and skip older items. Minimum value is 1.
    pub bus_capacity: usize,

    /// Per-attempt timeout for a single `receive` call.
    ///
    /// - `Duration::ZERO` = no timeout
    /// - `> 0` = the attempt is cut off and classified as transient
    pub receive_timeout: Duration,

    /// Retry/backoff policy for delivery attempts.
    pub retry: RetryPolicy,
}

impl BrokerConfig {
    /// Returns the global delivery concurrency limit as an `Option`.
    ///
    /// - `None` → unlimited (no semaphore)
    /// - `Some(n)` → at most `n` concurrent attempts
    #[inline]
    pub fn concurrency_limit(&self) -> Option<usize> {
        if self.max_concurrent_deliveries == 0 {
            None
        } else {
            Some(self.max_concurrent_deliveries)
        }
    }

    /// Returns the per-attempt receive timeout as an `Option`.
    ///
    /// - `None` → no timeout
    /// - `Some(d)` → timeout applied per attempt
    #[inline]
    pub fn attempt_timeout(&self) -> Option<Duration> {
        if self.receive_timeout == Duration::ZERO {
            None
        } else {
            Some(self.receive_timeout)
        }
    }

    /// Returns a bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }
}

impl Default for BrokerConfig {
    /// Default configuration:
    ///
    /// - `grace = 30s` (reasonable drain window)
    /// - `max_concurrent_deliveries = 0` (unlimited)
    /// - `bus_capacity = 1024` (good baseline)
    /// - `receive_timeout = 0s` (no timeout)
    /// - `retry = RetryPolicy::default()` (exponential, 5 attempts)
    fn default() -> Self {
        Self {
            grace: Duration::from_secs(30),
            max_concurrent_deliveries: 0,
            bus_capacity: 1024,
            receive_timeout: Duration::from_secs(0),
            retry: RetryPolicy::default(),
        }
    }
}
