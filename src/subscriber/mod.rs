//! # Subscriber-side contract and hosting pieces.
//!
//! This module defines everything a subscriber service needs to take part in
//! the mesh:
//! - [`Receive`] — the receive half of the subscriber contract, invoked by
//!   delivery workers
//! - [`SubscriberHandle`] — an addressable reference to one registered
//!   subscriber (identity + channel)
//! - [`SubscriberClient`] — the register/unregister half of the contract,
//!   called by the subscriber itself
//! - [`SubscriberListener`] / [`Endpoint`] — the scoped transport endpoint
//!   resource through which the broker reaches the subscriber
//!
//! ## Architecture
//! ```text
//! Subscriber process:
//!   SubscriberListener::open() ──► Endpoint (transport, external)
//!   SubscriberClient::register() ──► Broker ──► SubscriptionRegistry
//!
//! Broker process:
//!   DeliveryWorker ──► SubscriberHandle.channel ──► Receive::receive(&Envelope)
//! ```

mod client;
mod handle;
mod listener;
mod receive;

pub use client::SubscriberClient;
pub use handle::SubscriberHandle;
pub use listener::{Endpoint, ListenerState, SubscriberListener};
pub use receive::Receive;
