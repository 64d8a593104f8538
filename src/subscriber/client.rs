//! # Subscriber-side registration client.
//!
//! [`SubscriberClient`] is the register/unregister half of the subscriber
//! contract: a subscriber process declares the message types it wants, then
//! calls [`register`](SubscriberClient::register) against the broker. Both
//! operations are idempotent — repeating them never duplicates registry
//! entries or deliveries, and unregistering while not registered is safe.
//!
//! ```text
//! SubscriberClient::register() ──► Broker::register(type, handle)  (per declared type)
//! SubscriberClient::unregister() ──► Broker::unregister(type, id)  (per declared type)
//! ```

use std::sync::Arc;

use crate::broker::Broker;
use crate::envelope::MessageType;
use crate::error::BrokerError;
use crate::subscriber::SubscriberHandle;

/// Registers one subscriber for its declared message types against one broker.
pub struct SubscriberClient {
    broker: Arc<Broker>,
    handle: SubscriberHandle,
    message_types: Vec<MessageType>,
}

impl SubscriberClient {
    /// Creates a client for the given handle and declared interest set.
    pub fn new(
        broker: Arc<Broker>,
        handle: SubscriberHandle,
        message_types: Vec<MessageType>,
    ) -> Self {
        Self {
            broker,
            handle,
            message_types,
        }
    }

    /// Returns the declared message types.
    pub fn message_types(&self) -> &[MessageType] {
        &self.message_types
    }

    /// Registers the subscriber for every declared message type.
    ///
    /// Idempotent: calling it again while already registered is a no-op on
    /// the registry. The whole declaration is validated before the first
    /// registry mutation, so an invalid entry anywhere in the set fails the
    /// call without leaving the subscriber partially registered.
    pub async fn register(&self) -> Result<(), BrokerError> {
        if self.message_types.is_empty() {
            return Err(BrokerError::InvalidRegistration {
                reason: "no message types declared",
            });
        }
        if self.handle.id.is_empty() {
            return Err(BrokerError::InvalidRegistration {
                reason: "empty subscriber id",
            });
        }
        if self.message_types.iter().any(MessageType::is_empty) {
            return Err(BrokerError::InvalidRegistration {
                reason: "empty message type",
            });
        }
        for mt in &self.message_types {
            self.broker
                .register(mt.clone(), self.handle.clone())
                .await?;
        }
        Ok(())
    }

    /// Removes the subscriber's entries for every declared message type.
    ///
    /// Idempotent: safe to call when not registered.
    pub async fn unregister(&self) -> Result<(), BrokerError> {
        for mt in &self.message_types {
            self.broker.unregister(mt, &self.handle.id).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::broker::Broker;
    use crate::config::BrokerConfig;
    use crate::envelope::Envelope;
    use crate::error::DeliveryError;
    use crate::subscriber::Receive;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[derive(Default)]
    struct Counting {
        received: AtomicU32,
    }

    #[async_trait]
    impl Receive for Counting {
        async fn receive(&self, _envelope: &Envelope) -> Result<(), DeliveryError> {
            self.received.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    fn client_for(
        broker: &Arc<Broker>,
        channel: Arc<Counting>,
        types: &[&str],
    ) -> SubscriberClient {
        SubscriberClient::new(
            broker.clone(),
            SubscriberHandle::new("svc-1", channel),
            types.iter().map(|t| MessageType::from(*t)).collect(),
        )
    }

    #[tokio::test]
    async fn test_register_covers_all_declared_types() {
        let broker = Broker::builder(BrokerConfig::default()).build();
        let channel = Arc::new(Counting::default());
        let client = client_for(&broker, channel, &["OrderCreated", "OrderShipped"]);

        client.register().await.unwrap();
        assert_eq!(broker.registry().snapshot(&"OrderCreated".into()).await.len(), 1);
        assert_eq!(broker.registry().snapshot(&"OrderShipped".into()).await.len(), 1);
    }

    #[tokio::test]
    async fn test_double_register_is_idempotent() {
        let broker = Broker::builder(BrokerConfig::default()).build();
        let channel = Arc::new(Counting::default());
        let client = client_for(&broker, channel, &["OrderCreated"]);

        client.register().await.unwrap();
        client.register().await.unwrap();
        assert_eq!(broker.registry().snapshot(&"OrderCreated".into()).await.len(), 1);
    }

    #[tokio::test]
    async fn test_unregister_is_idempotent() {
        let broker = Broker::builder(BrokerConfig::default()).build();
        let channel = Arc::new(Counting::default());
        let client = client_for(&broker, channel, &["OrderCreated"]);

        // Never registered: still fine.
        client.unregister().await.unwrap();

        client.register().await.unwrap();
        client.unregister().await.unwrap();
        client.unregister().await.unwrap();
        assert!(broker.registry().snapshot(&"OrderCreated".into()).await.is_empty());
    }

    #[tokio::test]
    async fn test_invalid_declared_type_registers_nothing() {
        let broker = Broker::builder(BrokerConfig::default()).build();
        let channel = Arc::new(Counting::default());
        let client = client_for(&broker, channel, &["OrderCreated", ""]);

        let err = client.register().await.unwrap_err();
        assert!(matches!(err, BrokerError::InvalidRegistration { .. }));
        // The valid entries must not have been applied either.
        assert!(broker.registry().is_empty().await);
    }

    #[tokio::test]
    async fn test_empty_declaration_fails_fast() {
        let broker = Broker::builder(BrokerConfig::default()).build();
        let channel = Arc::new(Counting::default());
        let client = client_for(&broker, channel, &[]);

        let err = client.register().await.unwrap_err();
        assert!(matches!(err, BrokerError::InvalidRegistration { .. }));
    }
}
