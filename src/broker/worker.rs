//! # Per-delivery worker: attempt loop, backoff, eviction.
//!
//! One [`DeliveryWorker`] exists per (envelope, subscriber) pair produced by a
//! publish fan-out. Workers are independent: a slow or failing subscriber
//! never delays delivery of the same envelope to its peers.
//!
//! ## State machine
//! ```text
//! Pending ──► Attempting ──ok──────────────► Delivered
//!                │ ▲
//!      transient │ │ backoff elapsed
//!                ▼ │
//!             Retrying ──cancelled─────────► Abandoned (no eviction)
//!                │
//!                │ permanent failure, or transient on the final attempt
//!                ▼
//!            Abandoned (subscriber evicted from all message types)
//! ```
//!
//! ## Rules
//! - Attempts are numbered from 1; a transient failure on attempt `n` waits
//!   `retry.delay(n - 1)` before attempt `n + 1`.
//! - Permanent failures never retry.
//! - Abandonment after failure evicts the subscriber registry-wide
//!   (`SubscriberEvicted`); cancellation during shutdown abandons **without**
//!   eviction so the subscriber survives a restart.

use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;

use crate::broker::attempt::deliver_once;
use crate::broker::registry::SubscriptionRegistry;
use crate::config::BrokerConfig;
use crate::envelope::Envelope;
use crate::events::{Bus, Event, EventKind};
use crate::policies::RetryPolicy;
use crate::subscriber::SubscriberHandle;

/// Lifecycle of one delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryState {
    /// Created, not yet attempting (may be waiting on the concurrency limit).
    Pending,
    /// A `receive` call is in flight.
    Attempting,
    /// Last attempt failed transiently; waiting out the backoff delay.
    Retrying,
    /// An attempt succeeded. Terminal.
    Delivered,
    /// Given up: permanent failure, retry exhaustion, or shutdown. Terminal.
    Abandoned,
}

impl DeliveryState {
    /// True for the two terminal states.
    pub fn is_terminal(&self) -> bool {
        matches!(self, DeliveryState::Delivered | DeliveryState::Abandoned)
    }
}

/// Drives one envelope to one subscriber until a terminal state.
pub(crate) struct DeliveryWorker {
    envelope: Envelope,
    handle: SubscriberHandle,
    retry: RetryPolicy,
    timeout: Option<std::time::Duration>,
    bus: Bus,
    registry: Arc<SubscriptionRegistry>,
    semaphore: Option<Arc<Semaphore>>,
}

impl DeliveryWorker {
    pub(crate) fn new(
        envelope: Envelope,
        handle: SubscriberHandle,
        cfg: &BrokerConfig,
        bus: Bus,
        registry: Arc<SubscriptionRegistry>,
        semaphore: Option<Arc<Semaphore>>,
    ) -> Self {
        Self {
            envelope,
            handle,
            retry: cfg.retry,
            timeout: cfg.attempt_timeout(),
            bus,
            registry,
            semaphore,
        }
    }

    /// Runs the delivery to completion or cancellation.
    ///
    /// Returns the terminal [`DeliveryState`].
    pub(crate) async fn run(self, token: CancellationToken) -> DeliveryState {
        let mut state = DeliveryState::Pending;

        // Respect the global concurrency limit before the first attempt.
        // The permit covers the whole delivery including backoff waits, so
        // the limit bounds live deliveries rather than just active calls.
        let _permit = match &self.semaphore {
            Some(sem) => {
                let acquired = tokio::select! {
                    permit = Arc::clone(sem).acquire_owned() => permit.ok(),
                    _ = token.cancelled() => {
                        return self.abandon_on_shutdown(state).await;
                    }
                };
                match acquired {
                    Some(p) => Some(p),
                    // Semaphore closed: the broker is gone.
                    None => return self.abandon_on_shutdown(state).await,
                }
            }
            None => None,
        };

        let max_attempts = self.retry.attempts_clamped();

        for attempt in 1..=max_attempts {
            if token.is_cancelled() {
                return self.abandon_on_shutdown(state).await;
            }
            state = DeliveryState::Attempting;

            let outcome = tokio::select! {
                res = deliver_once(&self.handle, &self.envelope, self.timeout, attempt, &self.bus) => res,
                _ = token.cancelled() => {
                    return self.abandon_on_shutdown(state).await;
                }
            };

            let err = match outcome {
                Ok(()) => return DeliveryState::Delivered,
                Err(err) => err,
            };

            if !err.is_transient() || attempt == max_attempts {
                return self.abandon_and_evict(attempt, err.as_label()).await;
            }

            state = DeliveryState::Retrying;
            let delay = self.retry.delay(attempt - 1);
            self.bus.publish(
                Event::new(EventKind::BackoffScheduled)
                    .with_subscriber(self.handle.id.as_str())
                    .with_message_type(self.envelope.message_type.as_str())
                    .with_attempt(attempt)
                    .with_delay(delay)
                    .with_reason(err.as_message()),
            );

            tokio::select! {
                _ = tokio::time::sleep(delay) => {}
                _ = token.cancelled() => {
                    return self.abandon_on_shutdown(state).await;
                }
            }
        }

        // Unreachable: the loop always returns on the final attempt.
        DeliveryState::Abandoned
    }

    /// Terminal failure path: report abandonment, then evict the subscriber
    /// from every message type so future publishes skip it.
    async fn abandon_and_evict(&self, attempt: u32, label: &'static str) -> DeliveryState {
        self.bus.publish(
            Event::new(EventKind::DeliveryAbandoned)
                .with_subscriber(self.handle.id.as_str())
                .with_message_type(self.envelope.message_type.as_str())
                .with_attempt(attempt)
                .with_reason(label),
        );

        let removed = self.registry.unregister_all(&self.handle.id).await;
        if !removed.is_empty() {
            self.bus.publish(
                Event::new(EventKind::SubscriberEvicted)
                    .with_subscriber(self.handle.id.as_str())
                    .with_reason(label),
            );
        }
        DeliveryState::Abandoned
    }

    /// Shutdown path: the delivery is dropped, but the subscriber keeps its
    /// registrations. Shutdown says nothing about subscriber health.
    async fn abandon_on_shutdown(&self, _from: DeliveryState) -> DeliveryState {
        self.bus.publish(
            Event::new(EventKind::DeliveryAbandoned)
                .with_subscriber(self.handle.id.as_str())
                .with_message_type(self.envelope.message_type.as_str())
                .with_reason("shutdown"),
        );
        DeliveryState::Abandoned
    }
}
