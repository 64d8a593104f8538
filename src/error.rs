//! Error types used by the broker, delivery workers, and listeners.
//!
//! This module defines three error enums:
//!
//! - [`DeliveryError`] — failures of a single delivery attempt to a subscriber.
//! - [`BrokerError`] — errors raised by the broker itself.
//! - [`ListenerError`] — errors from the subscriber-side transport listener.
//!
//! All types provide helper methods (`as_label`, `as_message`) for
//! logging/metrics, and [`DeliveryError::is_transient`] encodes the
//! transient-vs-permanent classification the retry loop depends on.

use std::time::Duration;
use thiserror::Error;

use crate::subscriber::ListenerState;

/// # Failures of one delivery attempt.
///
/// Raised by [`Receive::receive`](crate::Receive::receive) or produced by the
/// attempt layer (timeout). Transient failures are retried with backoff;
/// permanent failures abandon the delivery and evict the subscriber.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum DeliveryError {
    /// Subscriber could not be reached (transport fault, connection refused,
    /// momentary overload). Transient.
    #[error("subscriber unreachable: {reason}")]
    Unreachable {
        /// Transport-level detail.
        reason: String,
    },

    /// The receive call exceeded the configured per-attempt timeout. Transient.
    #[error("receive timed out after {timeout:?}")]
    Timeout {
        /// The timeout that was exceeded.
        timeout: Duration,
    },

    /// Subscriber explicitly reported it no longer wants this message type.
    /// Permanent.
    #[error("subscriber declined message type {message_type}")]
    Declined {
        /// The declined routing key.
        message_type: String,
    },

    /// Subscriber identity could not be resolved (instance gone for good).
    /// Permanent.
    #[error("unknown subscriber identity: {id}")]
    UnknownIdentity {
        /// The unresolvable identity.
        id: String,
    },
}

impl DeliveryError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use relaybus::DeliveryError;
    ///
    /// let err = DeliveryError::Unreachable { reason: "refused".into() };
    /// assert_eq!(err.as_label(), "delivery_unreachable");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            DeliveryError::Unreachable { .. } => "delivery_unreachable",
            DeliveryError::Timeout { .. } => "delivery_timeout",
            DeliveryError::Declined { .. } => "delivery_declined",
            DeliveryError::UnknownIdentity { .. } => "delivery_unknown_identity",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            DeliveryError::Unreachable { reason } => format!("unreachable: {reason}"),
            DeliveryError::Timeout { timeout } => format!("timeout: {timeout:?}"),
            DeliveryError::Declined { message_type } => format!("declined: {message_type}"),
            DeliveryError::UnknownIdentity { id } => format!("unknown identity: {id}"),
        }
    }

    /// Indicates whether the failure is safe to retry.
    ///
    /// Returns `true` for [`DeliveryError::Unreachable`] and
    /// [`DeliveryError::Timeout`]; `false` for the permanent kinds.
    ///
    /// # Example
    /// ```
    /// use relaybus::DeliveryError;
    ///
    /// let transient = DeliveryError::Unreachable { reason: "reset".into() };
    /// assert!(transient.is_transient());
    ///
    /// let permanent = DeliveryError::UnknownIdentity { id: "ghost".into() };
    /// assert!(!permanent.is_transient());
    /// ```
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            DeliveryError::Unreachable { .. } | DeliveryError::Timeout { .. }
        )
    }
}

/// # Errors produced by the broker.
///
/// Publishers never see delivery failures; these cover the two places the
/// broker itself can fail: rejecting invalid registration input, and a
/// shutdown drain that exceeded its grace period.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum BrokerError {
    /// Registration input was invalid (empty subscriber id or message type).
    /// Failed fast at the call site, never silently ignored.
    #[error("invalid registration: {reason}")]
    InvalidRegistration {
        /// What was wrong with the input.
        reason: &'static str,
    },

    /// Shutdown grace period was exceeded; remaining in-flight deliveries
    /// were cancelled and abandoned.
    #[error("shutdown grace {grace:?} exceeded; in-flight deliveries cancelled")]
    GraceExceeded {
        /// The configured grace duration.
        grace: Duration,
    },
}

impl BrokerError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            BrokerError::InvalidRegistration { .. } => "broker_invalid_registration",
            BrokerError::GraceExceeded { .. } => "broker_grace_exceeded",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            BrokerError::InvalidRegistration { reason } => {
                format!("invalid registration: {reason}")
            }
            BrokerError::GraceExceeded { grace } => {
                format!("grace exceeded after {grace:?}")
            }
        }
    }
}

/// # Errors from the subscriber transport listener.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum ListenerError {
    /// The requested transition is not valid from the current state
    /// (e.g. `open` on an already-opened or closed listener).
    #[error("invalid listener transition from {state:?}")]
    InvalidState {
        /// The state the listener was in.
        state: ListenerState,
    },

    /// The underlying endpoint failed to open.
    #[error("endpoint open failed: {reason}")]
    Endpoint {
        /// Transport-level detail.
        reason: String,
    },
}

impl ListenerError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            ListenerError::InvalidState { .. } => "listener_invalid_state",
            ListenerError::Endpoint { .. } => "listener_endpoint",
        }
    }
}
