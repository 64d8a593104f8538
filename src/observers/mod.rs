//! # Event observers for the broker.
//!
//! This module provides the [`Observe`] trait and the fan-out machinery for
//! handling broker events published through the [`Bus`](crate::events::Bus).
//! Observers are the observability extension point: logging, metrics export,
//! alerting — anything that reacts to registry and delivery lifecycle events
//! without touching the delivery path.
//!
//! ## Architecture
//! ```text
//! Event flow:
//!   Broker / DeliveryWorker ── publish(Event) ──► Bus ──► observer listener
//!                                                            │
//!                                                            ▼
//!                                                      ObserverSet
//!                                             ┌─────────┼─────────┐
//!                                             ▼         ▼         ▼
//!                                        [queue 1] [queue 2] [queue N]
//!                                             ▼         ▼         ▼
//!                                        worker 1  worker 2  worker N
//!                                             ▼         ▼         ▼
//!                                        obs1.on_event()  ...  obsN.on_event()
//! ```

mod log;
mod observe;
mod set;

pub use log::LogWriter;
pub use observe::Observe;
pub use set::ObserverSet;
