//! Broker events: types and broadcast bus.
//!
//! This module groups the event **data model** and the **bus** used to
//! publish/subscribe to events emitted by the broker, delivery workers,
//! and observer workers.
//!
//! ## Contents
//! - [`EventKind`], [`Event`] — event classification and payload metadata
//! - [`Bus`] — thin wrapper over `tokio::sync::broadcast`
//!
//! ## Quick reference
//! - **Publishers**: `Broker`, `DeliveryWorker`, `attempt::deliver_once`,
//!   `ObserverSet` workers (overflow/panic).
//! - **Consumers**: the broker's observer pump (fans out to
//!   `ObserverSet`) and tests.

mod bus;
mod event;

pub use bus::Bus;
pub use event::{Event, EventKind};
