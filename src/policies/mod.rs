//! Delivery retry policies.
//!
//! This module holds the knobs that control **how many** delivery attempts a
//! worker makes and **how long** it waits between them.
//!
//! ## Contents
//! - [`RetryPolicy`] — attempt bound and delay evolution (first / factor / max)
//! - [`JitterPolicy`] — randomization applied on top, to avoid thundering herd
//!
//! ## Quick wiring
//! ```text
//! BrokerConfig { retry: RetryPolicy, receive_timeout }
//!      └─► broker::worker::DeliveryWorker uses:
//!           - retry.max_attempts to decide retry/abandon
//!           - retry.delay(attempt) to schedule the next attempt
//! ```
//!
//! ## Defaults
//! - `RetryPolicy::default()` → first=100ms, factor=2.0, max=30s, 5 attempts,
//!   jitter=None.
//! - `JitterPolicy::None` by default; consider `Equal` for balanced randomness.

mod retry;

pub use retry::{JitterPolicy, RetryPolicy};
