//! # Message envelope and routing identifiers.
//!
//! The envelope is the immutable unit of transmission: a [`MessageType`]
//! used as the routing key plus an opaque [`Bytes`] payload. The broker never
//! inspects the payload; deserialization is the subscriber's business.
//!
//! ## Rules
//! - Two envelopes with the same [`MessageType`] are routed to the same
//!   subscriber set at publish time.
//! - Identifiers are cheap to clone (`Arc<str>` backed) and compare by value.

use std::fmt;
use std::sync::Arc;

use bytes::Bytes;

/// Stable identifier of a message type; the subscription registry key.
///
/// Typically a fully-qualified type name or a short tag like `"OrderCreated"`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MessageType(Arc<str>);

impl MessageType {
    /// Creates a new message type from any string-like value.
    pub fn new(name: impl Into<Arc<str>>) -> Self {
        Self(name.into())
    }

    /// Returns the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True if the identifier is empty (invalid as a registry key).
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<&str> for MessageType {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Stable identity of one subscriber.
///
/// Registry equality is by this id, not by channel instance, so a subscriber
/// that re-registers with a fresh channel replaces its old entry instead of
/// duplicating it.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriberId(Arc<str>);

impl SubscriberId {
    /// Creates a new subscriber id from any string-like value.
    pub fn new(id: impl Into<Arc<str>>) -> Self {
        Self(id.into())
    }

    /// Returns the identity as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True if the identity is empty (invalid for registration).
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<&str> for SubscriberId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl fmt::Display for SubscriberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One published unit: routing key plus opaque payload.
///
/// Immutable once published; delivery workers share it by cheap clone
/// (`Arc<str>` key, `Bytes` payload) and discard it when the delivery
/// sequence terminates.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Envelope {
    /// Routing key used to select the subscriber set.
    pub message_type: MessageType,
    /// Opaque payload; the broker never interprets it.
    pub payload: Bytes,
}

impl Envelope {
    /// Creates a new envelope.
    pub fn new(message_type: impl Into<MessageType>, payload: impl Into<Bytes>) -> Self {
        Self {
            message_type: message_type.into(),
            payload: payload.into(),
        }
    }
}

impl From<&str> for Envelope {
    /// Shorthand for tests/demos: `"type:payload"` is split on the first `:`.
    fn from(s: &str) -> Self {
        match s.split_once(':') {
            Some((t, p)) => Envelope::new(t, Bytes::copy_from_slice(p.as_bytes())),
            None => Envelope::new(s, Bytes::new()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_type_equality_is_by_value() {
        let a = MessageType::new("OrderCreated");
        let b = MessageType::from("OrderCreated");
        assert_eq!(a, b);
        assert_ne!(a, MessageType::new("OrderShipped"));
    }

    #[test]
    fn test_empty_identifiers_are_flagged() {
        assert!(MessageType::new("").is_empty());
        assert!(SubscriberId::new("").is_empty());
        assert!(!SubscriberId::new("svc-1").is_empty());
    }

    #[test]
    fn test_envelope_shorthand_split() {
        let env = Envelope::from("OrderCreated:order-42");
        assert_eq!(env.message_type.as_str(), "OrderCreated");
        assert_eq!(&env.payload[..], b"order-42");

        let bare = Envelope::from("Ping");
        assert_eq!(bare.message_type.as_str(), "Ping");
        assert!(bare.payload.is_empty());
    }
}
