//! # Subscriber transport listener: a scoped endpoint resource.
//!
//! [`SubscriberListener`] owns the process-wide endpoint through which the
//! broker reaches a subscriber. The transport itself (binding, addressing,
//! serialization) is an external collaborator behind the [`Endpoint`] trait;
//! the listener contributes the explicit lifecycle the hosting runtime drives:
//!
//! ```text
//! Created ──open()──► Opened ──close()──► Closed
//!    │                   │
//!    └───────abort()─────┴──────────────► Aborted
//! ```
//!
//! ## Rules
//! - `open` is valid only from `Created`; it returns the endpoint address.
//! - `close` is graceful and idempotent once terminal.
//! - `abort` is immediate, valid from any non-terminal state.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::ListenerError;

/// External transport endpoint the listener wraps.
///
/// Provided by the hosting runtime; the core only requires open/close/abort.
#[async_trait]
pub trait Endpoint: Send + Sync + 'static {
    /// Binds the endpoint and returns its reachable address.
    async fn open(&self) -> Result<String, ListenerError>;

    /// Gracefully stops accepting calls and drains in-flight ones.
    async fn close(&self);

    /// Terminates immediately; outstanding operations are cancelled.
    fn abort(&self);
}

/// Lifecycle state of a [`SubscriberListener`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ListenerState {
    /// Constructed, endpoint not yet bound.
    Created,
    /// Endpoint bound and reachable.
    Opened,
    /// Gracefully closed; terminal.
    Closed,
    /// Terminated immediately; terminal.
    Aborted,
}

impl ListenerState {
    /// True for the two terminal states.
    #[inline]
    pub fn is_terminal(&self) -> bool {
        matches!(self, ListenerState::Closed | ListenerState::Aborted)
    }
}

/// Scoped wrapper that tracks the endpoint lifecycle explicitly instead of a
/// mutable global.
pub struct SubscriberListener {
    endpoint: Arc<dyn Endpoint>,
    state: ListenerState,
}

impl SubscriberListener {
    /// Creates a listener in the `Created` state.
    pub fn new(endpoint: Arc<dyn Endpoint>) -> Self {
        Self {
            endpoint,
            state: ListenerState::Created,
        }
    }

    /// Returns the current lifecycle state.
    pub fn state(&self) -> ListenerState {
        self.state
    }

    /// Opens the endpoint and returns its address.
    ///
    /// Valid only from `Created`; any other state is an
    /// [`ListenerError::InvalidState`]. On endpoint failure the listener
    /// stays in `Created` and may be retried.
    pub async fn open(&mut self) -> Result<String, ListenerError> {
        if self.state != ListenerState::Created {
            return Err(ListenerError::InvalidState { state: self.state });
        }
        let addr = self.endpoint.open().await?;
        self.state = ListenerState::Opened;
        Ok(addr)
    }

    /// Gracefully closes the endpoint. Terminal.
    ///
    /// No-op if the listener is already terminal; from `Created` it merely
    /// records the transition (nothing was bound yet).
    pub async fn close(&mut self) {
        if self.state.is_terminal() {
            return;
        }
        if self.state == ListenerState::Opened {
            self.endpoint.close().await;
        }
        self.state = ListenerState::Closed;
    }

    /// Immediately terminates the endpoint. Terminal.
    ///
    /// No-op if already terminal.
    pub fn abort(&mut self) {
        if self.state.is_terminal() {
            return;
        }
        if self.state == ListenerState::Opened {
            self.endpoint.abort();
        }
        self.state = ListenerState::Aborted;
    }
}
