//! # Subscription registry - the single source of truth for "who wants what".
//!
//! Maps message types to the set of currently registered subscriber handles.
//! The broker mutates it on register/unregister, delivery workers evict
//! through it, and every publish starts by taking a snapshot from it.
//!
//! ## Rules
//! - A given subscriber id appears **at most once** per message type
//!   (idempotent registration; same id with a new channel replaces)
//! - Mutations are serialized behind the write lock; a snapshot never
//!   observes a partially applied mutation
//! - Snapshots are cheap copies taken under the read lock — subscribers
//!   registered after a snapshot do not receive that publish, subscribers
//!   removed after it still receive the in-flight delivery
//! - The registry never evicts on its own; only delivery outcome does
//!   (via [`unregister_all`](SubscriptionRegistry::unregister_all))

use std::collections::HashMap;

use tokio::sync::RwLock;

use crate::envelope::{MessageType, SubscriberId};
use crate::subscriber::SubscriberHandle;

/// Outcome of a [`register`](SubscriptionRegistry::register) call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RegisterOutcome {
    /// New entry created for this (message type, id) pair.
    Added,
    /// Same id was present with a different channel; entry replaced.
    Replaced,
    /// Identical handle already present; nothing changed.
    Unchanged,
}

/// Message type → subscriber set mapping with snapshot reads.
pub struct SubscriptionRegistry {
    entries: RwLock<HashMap<MessageType, HashMap<SubscriberId, SubscriberHandle>>>,
}

impl SubscriptionRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Adds `handle` to the set for `message_type`.
    ///
    /// Idempotent: an identical handle (same id, same channel instance) is a
    /// no-op; the same id with a different channel replaces the old entry.
    /// Never fails for valid inputs (the broker validates before calling).
    pub(crate) async fn register(
        &self,
        message_type: MessageType,
        handle: SubscriberHandle,
    ) -> RegisterOutcome {
        let mut entries = self.entries.write().await;
        let set = entries.entry(message_type).or_default();
        match set.get(&handle.id) {
            Some(existing) if existing.same_channel(&handle) => RegisterOutcome::Unchanged,
            Some(_) => {
                set.insert(handle.id.clone(), handle);
                RegisterOutcome::Replaced
            }
            None => {
                set.insert(handle.id.clone(), handle);
                RegisterOutcome::Added
            }
        }
    }

    /// Removes the entry for (`message_type`, `id`) if present.
    ///
    /// Idempotent: double-unregister is not an error. Returns `true` if an
    /// entry was actually removed. Empty message-type sets are pruned.
    pub(crate) async fn unregister(&self, message_type: &MessageType, id: &SubscriberId) -> bool {
        let mut entries = self.entries.write().await;
        let Some(set) = entries.get_mut(message_type) else {
            return false;
        };
        let removed = set.remove(id).is_some();
        if set.is_empty() {
            entries.remove(message_type);
        }
        removed
    }

    /// Removes `id` from **every** message type's set.
    ///
    /// Used when delivery declares the subscriber permanently unreachable.
    /// Returns the message types the subscriber was removed from.
    pub(crate) async fn unregister_all(&self, id: &SubscriberId) -> Vec<MessageType> {
        let mut entries = self.entries.write().await;
        let mut removed = Vec::new();
        entries.retain(|message_type, set| {
            if set.remove(id).is_some() {
                removed.push(message_type.clone());
            }
            !set.is_empty()
        });
        removed
    }

    /// Returns an immutable copy of the current subscriber set for
    /// `message_type`, atomic with respect to concurrent mutations.
    ///
    /// This copy is what delivery fans out over. Empty when no subscriber is
    /// registered for the type.
    pub async fn snapshot(&self, message_type: &MessageType) -> Vec<SubscriberHandle> {
        let entries = self.entries.read().await;
        entries
            .get(message_type)
            .map(|set| set.values().cloned().collect())
            .unwrap_or_default()
    }

    /// Total number of (message type, subscriber) entries.
    pub async fn len(&self) -> usize {
        let entries = self.entries.read().await;
        entries.values().map(HashMap::len).sum()
    }

    /// True if no subscription exists at all.
    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

impl Default for SubscriptionRegistry {
    fn default() -> Self {
        Self::new()
    }
}
