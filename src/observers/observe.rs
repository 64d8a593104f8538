//! # Core observer trait
//!
//! `Observe` is the extension point for plugging custom event handlers into
//! the broker. Each observer is driven by a dedicated worker loop fed by a
//! bounded queue owned by the [`ObserverSet`](crate::observers::ObserverSet).
//!
//! ## Contract
//! - Implementations may be slow (I/O, batching, retries) — they do **not**
//!   block the broker nor other observers.
//! - Each observer **declares** its preferred queue capacity via
//!   [`Observe::queue_capacity`]. If a queue overflows, events for that
//!   observer are **dropped** and an `ObserverOverflow` event is published.

use async_trait::async_trait;

use crate::events::Event;

/// Contract for broker event observers.
///
/// Called from an observer-dedicated worker task. Implementations should
/// avoid blocking the async runtime (prefer async I/O and cooperative waits).
///
/// ## Example
/// ```
/// use async_trait::async_trait;
/// use relaybus::{Event, EventKind, Observe};
///
/// struct Metrics;
///
/// #[async_trait]
/// impl Observe for Metrics {
///     async fn on_event(&self, event: &Event) {
///         if matches!(event.kind, EventKind::DeliveryAbandoned) {
///             // export a counter, fire an alert, etc.
///         }
///     }
///
///     fn name(&self) -> &'static str { "metrics" }
///     fn queue_capacity(&self) -> usize { 2048 }
/// }
/// ```
#[async_trait]
pub trait Observe: Send + Sync + 'static {
    /// Handles a single event for this observer.
    ///
    /// Events arrive in FIFO order per observer; panics are caught and
    /// published as `ObserverPanicked`.
    async fn on_event(&self, event: &Event);

    /// Human-readable name (for logs/metrics and fault events).
    ///
    /// Prefer short, descriptive names (e.g., "metrics", "audit", "slack").
    /// The default uses `type_name::<Self>()`, which can be verbose —
    /// override it when possible.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Preferred capacity of this observer's queue.
    ///
    /// On overflow, events for this observer are dropped and an
    /// `ObserverOverflow` is published. The runtime clamps capacity to a
    /// minimum of 1.
    ///
    /// Default: 1024.
    fn queue_capacity(&self) -> usize {
        1024
    }
}
