//! # Events emitted by the broker and delivery workers.
//!
//! The [`EventKind`] enum classifies event types across four categories:
//! - **Subscription events**: registry changes (registered, unregistered, evicted)
//! - **Delivery events**: per-attempt delivery flow (starting, delivered, failed,
//!   timed out, backoff, abandoned)
//! - **Observer faults**: overflow and panic isolation reports
//! - **Shutdown events**: drain progress during broker shutdown
//!
//! The [`Event`] struct carries additional metadata such as timestamps,
//! subscriber id, message type, attempt counters, and backoff delays.
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases
//! monotonically. Use `seq` to restore the exact order when events are
//! observed out of order.

use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::sync::Arc;
use std::time::{Duration, SystemTime};

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of broker events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Subscription events ===
    /// A subscriber was added to (or replaced in) the registry for one
    /// message type.
    ///
    /// Sets:
    /// - `subscriber`: subscriber id
    /// - `message_type`: registered routing key
    SubscriberRegistered,

    /// A subscriber was removed from the registry for one message type.
    ///
    /// Sets:
    /// - `subscriber`: subscriber id
    /// - `message_type`: unregistered routing key
    SubscriberUnregistered,

    /// A subscriber was evicted from **all** message types after a delivery
    /// was abandoned (permanent failure or retry exhaustion).
    ///
    /// Sets:
    /// - `subscriber`: subscriber id
    /// - `reason`: the terminal failure label
    SubscriberEvicted,

    // === Delivery events ===
    /// A publish was accepted and fan-out initiated.
    ///
    /// Sets:
    /// - `message_type`: routing key
    /// - `attempt`: number of deliveries initiated (snapshot size)
    PublishAccepted,

    /// A delivery worker is starting an attempt.
    ///
    /// Sets:
    /// - `subscriber`: target subscriber id
    /// - `message_type`: routing key
    /// - `attempt`: attempt number (1-based)
    DeliveryStarting,

    /// An attempt succeeded; the delivery is terminal.
    ///
    /// Sets:
    /// - `subscriber`, `message_type`, `attempt`
    Delivered,

    /// An attempt failed (transient or permanent).
    ///
    /// Sets:
    /// - `subscriber`, `message_type`, `attempt`
    /// - `reason`: failure message
    DeliveryFailed,

    /// An attempt exceeded the configured receive timeout.
    /// Published **in addition to** `DeliveryFailed`.
    ///
    /// Sets:
    /// - `subscriber`, `message_type`, `attempt`
    /// - `timeout_ms`: configured attempt timeout (ms)
    DeliveryTimedOut,

    /// A retry was scheduled after a transient failure.
    ///
    /// Sets:
    /// - `subscriber`, `message_type`
    /// - `attempt`: the failed attempt number
    /// - `delay_ms`: delay before the next attempt (ms)
    /// - `reason`: last failure message
    BackoffScheduled,

    /// The delivery terminated without success (permanent failure, retry
    /// exhaustion, or cancellation during shutdown).
    ///
    /// Sets:
    /// - `subscriber`, `message_type`, `attempt`
    /// - `reason`: why the delivery was given up
    DeliveryAbandoned,

    // === Observer faults ===
    /// An observer dropped an event (queue full or worker closed).
    ///
    /// Sets:
    /// - `subscriber`: observer name
    /// - `reason`: "full" or "closed"
    ObserverOverflow,

    /// An observer panicked while handling an event.
    ///
    /// Sets:
    /// - `subscriber`: observer name
    /// - `reason`: panic info
    ObserverPanicked,

    // === Shutdown events ===
    /// Broker shutdown requested; no new deliveries will start.
    ///
    /// Sets:
    /// - `reason`: the OS signal name when the drain is signal-driven
    ShutdownRequested,

    /// All in-flight deliveries drained within the grace period.
    AllDrainedWithin,

    /// Grace period exceeded; remaining deliveries were cancelled.
    GraceExceeded,
}

/// Broker event with optional metadata.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
/// - other optional fields are set depending on the [`EventKind`]
#[derive(Clone, Debug)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,

    /// Subscriber id (or observer name for observer faults).
    pub subscriber: Option<Arc<str>>,
    /// Message type / routing key, if applicable.
    pub message_type: Option<Arc<str>>,
    /// Attempt count (starting from 1), or fan-out size for `PublishAccepted`.
    pub attempt: Option<u32>,
    /// Backoff delay before the next attempt in milliseconds (compact).
    pub delay_ms: Option<u32>,
    /// Attempt timeout in milliseconds (compact).
    pub timeout_ms: Option<u32>,
    /// Human-readable reason (errors, overflow details, etc.).
    pub reason: Option<Arc<str>>,
}

impl Event {
    /// Creates a new event of the given kind with the current timestamp and
    /// next sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            subscriber: None,
            message_type: None,
            attempt: None,
            delay_ms: None,
            timeout_ms: None,
            reason: None,
        }
    }

    /// Attaches a subscriber id (or observer name).
    #[inline]
    pub fn with_subscriber(mut self, id: impl Into<Arc<str>>) -> Self {
        self.subscriber = Some(id.into());
        self
    }

    /// Attaches a message type.
    #[inline]
    pub fn with_message_type(mut self, mt: impl Into<Arc<str>>) -> Self {
        self.message_type = Some(mt.into());
        self
    }

    /// Attaches an attempt count.
    #[inline]
    pub fn with_attempt(mut self, n: u32) -> Self {
        self.attempt = Some(n);
        self
    }

    /// Attaches a backoff delay (stored as milliseconds).
    #[inline]
    pub fn with_delay(mut self, d: Duration) -> Self {
        let ms = d.as_millis().min(u128::from(u32::MAX)) as u32;
        self.delay_ms = Some(ms);
        self
    }

    /// Attaches a timeout duration (stored as milliseconds).
    #[inline]
    pub fn with_timeout(mut self, d: Duration) -> Self {
        let ms = d.as_millis().min(u128::from(u32::MAX)) as u32;
        self.timeout_ms = Some(ms);
        self
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Creates an observer overflow event.
    #[inline]
    pub fn observer_overflow(observer: &'static str, reason: &'static str) -> Self {
        Event::new(EventKind::ObserverOverflow)
            .with_subscriber(observer)
            .with_reason(reason)
    }

    /// Creates an observer panic event.
    #[inline]
    pub fn observer_panicked(observer: &'static str, info: String) -> Self {
        Event::new(EventKind::ObserverPanicked)
            .with_subscriber(observer)
            .with_reason(info)
    }
}
