//! # Addressable reference to one registered subscriber.
//!
//! A [`SubscriberHandle`] pairs a stable [`SubscriberId`] with the channel
//! (an `Arc<dyn Receive>`) the broker invokes deliveries through. The registry
//! owns handles while registered and holds no other reference after
//! unregistration.
//!
//! ## Rules
//! - Equality is by **id only**: a re-registration with a fresh channel but
//!   the same identity replaces the old entry rather than duplicating it.
//! - [`SubscriberHandle::same_channel`] distinguishes "identical handle,
//!   no-op" from "same id, new channel, replace".

use std::fmt;
use std::sync::Arc;

use crate::envelope::SubscriberId;
use crate::subscriber::Receive;

/// Identity plus the means to invoke the subscriber's receive operation.
#[derive(Clone)]
pub struct SubscriberHandle {
    /// Stable identity; the registry's equality key.
    pub id: SubscriberId,
    /// Invocable reference implementing the receive contract.
    pub channel: Arc<dyn Receive>,
}

impl SubscriberHandle {
    /// Creates a new handle.
    pub fn new(id: impl Into<SubscriberId>, channel: Arc<dyn Receive>) -> Self {
        Self {
            id: id.into(),
            channel,
        }
    }

    /// True if `other` wraps the **same channel instance** (pointer equality).
    ///
    /// Used by the registry to make re-registration of an identical handle a
    /// no-op while a same-id/different-channel registration replaces.
    pub fn same_channel(&self, other: &SubscriberHandle) -> bool {
        Arc::ptr_eq(&self.channel, &other.channel)
    }
}

impl PartialEq for SubscriberHandle {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for SubscriberHandle {}

impl fmt::Debug for SubscriberHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubscriberHandle")
            .field("id", &self.id)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::envelope::Envelope;
    use crate::error::DeliveryError;
    use async_trait::async_trait;

    struct Sink;

    #[async_trait]
    impl Receive for Sink {
        async fn receive(&self, _envelope: &Envelope) -> Result<(), DeliveryError> {
            Ok(())
        }
    }

    #[test]
    fn test_equality_is_by_id_not_channel() {
        let a = SubscriberHandle::new("svc-1", Arc::new(Sink));
        let b = SubscriberHandle::new("svc-1", Arc::new(Sink));
        let c = SubscriberHandle::new("svc-2", Arc::new(Sink));

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert!(!a.same_channel(&b));
    }

    #[test]
    fn test_same_channel_detects_shared_instance() {
        let channel: Arc<dyn Receive> = Arc::new(Sink);
        let a = SubscriberHandle::new("svc-1", channel.clone());
        let b = SubscriberHandle::new("svc-1", channel);
        assert!(a.same_channel(&b));
    }
}
