//! Single delivery attempt execution.
//!
//! Wraps one `receive()` call with the optional per-attempt timeout and
//! publishes exactly one terminal event per attempt (`Delivered`,
//! `DeliveryFailed`, or `DeliveryTimedOut` followed by `DeliveryFailed`
//! classification happens in the worker).

use std::time::Duration;

use crate::envelope::Envelope;
use crate::error::DeliveryError;
use crate::events::{Bus, Event, EventKind};
use crate::subscriber::SubscriberHandle;

/// Runs one delivery attempt against the subscriber's channel.
///
/// - Publishes `DeliveryStarting` before calling `receive()`.
/// - With `timeout` set, an attempt that outlives it is cut off and reported
///   as [`DeliveryError::Timeout`] (a transient failure); a `DeliveryTimedOut`
///   event is published for it.
/// - Publishes `Delivered` on success, `DeliveryFailed` on any error.
///
/// The caller (the delivery worker) owns retry/abandon decisions; this
/// function only reports what happened on this attempt.
pub(crate) async fn deliver_once(
    handle: &SubscriberHandle,
    envelope: &Envelope,
    timeout: Option<Duration>,
    attempt: u32,
    bus: &Bus,
) -> Result<(), DeliveryError> {
    bus.publish(
        Event::new(EventKind::DeliveryStarting)
            .with_subscriber(handle.id.as_str())
            .with_message_type(envelope.message_type.as_str())
            .with_attempt(attempt),
    );

    let result = match timeout {
        Some(limit) => match tokio::time::timeout(limit, handle.channel.receive(envelope)).await {
            Ok(res) => res,
            Err(_) => {
                bus.publish(
                    Event::new(EventKind::DeliveryTimedOut)
                        .with_subscriber(handle.id.as_str())
                        .with_message_type(envelope.message_type.as_str())
                        .with_attempt(attempt)
                        .with_timeout(limit),
                );
                Err(DeliveryError::Timeout { timeout: limit })
            }
        },
        None => handle.channel.receive(envelope).await,
    };

    match &result {
        Ok(()) => {
            bus.publish(
                Event::new(EventKind::Delivered)
                    .with_subscriber(handle.id.as_str())
                    .with_message_type(envelope.message_type.as_str())
                    .with_attempt(attempt),
            );
        }
        Err(err) => {
            bus.publish(
                Event::new(EventKind::DeliveryFailed)
                    .with_subscriber(handle.id.as_str())
                    .with_message_type(envelope.message_type.as_str())
                    .with_attempt(attempt)
                    .with_reason(err.as_message()),
            );
        }
    }

    result
}
