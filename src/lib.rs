//! # relaybus
//!
//! **Relaybus** is a lightweight publish/subscribe messaging layer for Rust
//! services.
//!
//! It routes typed message envelopes from publishers to registered
//! subscribers with at-least-once delivery, per-subscriber retry with
//! backoff, and automatic eviction of permanently unreachable subscribers.
//! The crate is designed as a building block for service meshes and
//! actor-style systems that need decoupled messaging.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!     ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//!     │  publisher   │   │  publisher   │   │  publisher   │
//!     └──────┬───────┘   └──────┬───────┘   └──────┬───────┘
//!            ▼                  ▼                  ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  Broker                                                           │
//! │  - SubscriptionRegistry (message type ──► subscriber handles)     │
//! │  - Bus (broadcast events)                                         │
//! │  - TaskTracker (one task per in-flight delivery)                  │
//! │  - ObserverSet (fans events out to user observers)                │
//! └──────┬──────────────────┬──────────────────┬───────────────┬──────┘
//!        ▼ snapshot         ▼                  ▼               │
//!  ┌───────────────┐  ┌───────────────┐  ┌───────────────┐     │
//!  │ DeliveryWorker│  │ DeliveryWorker│  │ DeliveryWorker│     │
//!  │ (retry loop)  │  │ (retry loop)  │  │ (retry loop)  │     │
//!  └┬──────────────┘  └┬──────────────┘  └┬──────────────┘     │
//!   │ Publishes        │ Publishes        │ Publishes          │
//!   │ Events:          │ Events:          │ Events:            │
//!   │ - Delivery-      │ - Delivered      │ - DeliveryFailed   │
//!   │   Starting       │ - Backoff-       │ - Delivery-        │
//!   │ - Delivered      │   Scheduled      │   Abandoned        │
//!   ▼                  ▼                  ▼                    ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │                     Bus (broadcast channel)                       │
//! │               (capacity: BrokerConfig::bus_capacity)              │
//! └─────────────────────────────────┬─────────────────────────────────┘
//!                                   ▼
//!                         ┌───────────────────┐
//!                         │   observer pump   │
//!                         │    (in Broker)    │
//!                         └─────────┬─────────┘
//!                                   ▼
//!                              ObserverSet
//!                           (per-observer queues)
//!                         ┌─────────┼─────────┐
//!                         ▼         ▼         ▼
//!                       worker1   worker2   workerN
//!                         ▼         ▼         ▼
//!                      obs1.on   obs2.on   obsN.on
//!                      _event()  _event()  _event()
//! ```
//!
//! ### Delivery lifecycle
//! ```text
//! publish(envelope) ──► registry snapshot ──► DeliveryWorker::run() × N
//!
//! loop {
//!   ├─► attempt += 1
//!   ├─► acquire semaphore (optional, cancellable)
//!   ├─► publish DeliveryStarting{ subscriber, attempt }
//!   ├─► receive(envelope) with optional timeout
//!   │       │
//!   │       ├─ Ok ───► publish Delivered, exit
//!   │       │
//!   │       └─ Err ──► publish DeliveryFailed{ subscriber, error, attempt }
//!   │                  ├─ permanent, or attempt == max_attempts:
//!   │                  │    ├─ publish DeliveryAbandoned
//!   │                  │    ├─ evict subscriber from every message type
//!   │                  │    └─ publish SubscriberEvicted, exit
//!   │                  └─ transient:
//!   │                       ├─ delay = retry.delay(attempt - 1)
//!   │                       ├─ publish BackoffScheduled{ delay, attempt }
//!   │                       ├─ sleep(delay) (cancellable)
//!   │                       └─ continue
//!   │
//!   └─ cancelled (shutdown) ─► publish DeliveryAbandoned, no eviction, exit
//! }
//! ```
//!
//! ## Quickstart
//! ```no_run
//! use std::sync::Arc;
//!
//! use async_trait::async_trait;
//! use relaybus::{
//!     Broker, BrokerConfig, DeliveryError, Envelope, LogWriter, Receive,
//!     SubscriberClient, SubscriberHandle,
//! };
//!
//! struct OrderPrinter;
//!
//! #[async_trait]
//! impl Receive for OrderPrinter {
//!     async fn receive(&self, envelope: &Envelope) -> Result<(), DeliveryError> {
//!         println!("got {}", envelope.message_type);
//!         Ok(())
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let broker = Broker::builder(BrokerConfig::default())
//!         .with_observer(Arc::new(LogWriter::new()))
//!         .build();
//!
//!     let client = SubscriberClient::new(
//!         Arc::clone(&broker),
//!         SubscriberHandle::new("order-printer", Arc::new(OrderPrinter)),
//!         vec!["OrderCreated".into()],
//!     );
//!     client.register().await?;
//!
//!     broker.publish(Envelope::from("OrderCreated:order-42")).await?;
//!
//!     broker.run_until_shutdown().await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Guarantees
//! - **At-least-once**: a registered subscriber either receives the envelope
//!   or is abandoned after the configured attempts; a successful `receive`
//!   may still be observed more than once by downstream systems.
//! - **Snapshot fan-out**: the subscriber set is fixed at publish time;
//!   later registrations never see earlier envelopes.
//! - **Isolation**: deliveries are independent tasks; one slow subscriber
//!   never delays another.
//! - **No cross-envelope ordering**: deliveries to the same subscriber may
//!   complete out of publish order.

mod broker;
mod config;
mod envelope;
mod error;
mod events;
mod observers;
mod policies;
mod subscriber;

pub use broker::{Broker, BrokerBuilder, DeliveryState, SubscriptionRegistry};
pub use config::BrokerConfig;
pub use envelope::{Envelope, MessageType, SubscriberId};
pub use error::{BrokerError, DeliveryError, ListenerError};
pub use events::{Bus, Event, EventKind};
pub use observers::{LogWriter, Observe, ObserverSet};
pub use policies::{JitterPolicy, RetryPolicy};
pub use subscriber::{
    Endpoint, ListenerState, Receive, SubscriberClient, SubscriberHandle, SubscriberListener,
};
