//! Broker core: registry, fan-out, and delivery lifecycle.
//!
//! This module contains the broker side of the pub/sub layer. The public API
//! from this module is [`Broker`] (built via [`BrokerBuilder`]) and the
//! [`SubscriptionRegistry`] it owns.
//!
//! Internal modules:
//! - [`registry`]: message type → subscriber set, the single source of truth;
//! - [`attempt`]: executes one delivery attempt with timeout and event publishing;
//! - [`worker`]: per-(envelope, subscriber) retry loop with backoff and eviction;
//! - [`broker`]: orchestrates registration, publish fan-out, graceful drain,
//!   and the termination-signal wait.

mod attempt;
#[allow(clippy::module_inception)]
mod broker;
mod registry;
mod worker;

pub use broker::{Broker, BrokerBuilder};
pub use registry::SubscriptionRegistry;
pub use worker::DeliveryState;
