//! # Non-blocking event fan-out to multiple observers.
//!
//! Provides [`ObserverSet`] — distributes events to multiple observers
//! concurrently without blocking the publisher.
//!
//! ## Architecture
//! ```text
//! emit(event)
//!     │
//!     ├──► [queue 1] ──► worker 1 ──► observer1.on_event()
//!     │    (bounded)         └──────► panic → ObserverPanicked
//!     ├──► [queue 2] ──► worker 2 ──► observer2.on_event()
//!     │    (bounded)
//!     └──► [queue N] ──► worker N ──► observerN.on_event()
//!          (bounded)
//! ```
//!
//! ## Rules
//! - **No cross-observer ordering**: observer A may process event N while B processes N+5
//! - **Overflow**: event dropped for that observer only, `ObserverOverflow` published
//! - **Non-blocking**: `emit()` returns immediately (uses `try_send`)
//! - **Isolation**: a slow or panicking observer doesn't affect others
//! - **Per-observer FIFO**: each observer sees events in order
//!
//! ## Panic handling
//! Worker tasks use `catch_unwind` to isolate panics:
//! - The panic is caught and converted to an `ObserverPanicked` event
//! - The worker continues with the next event
//! - Other observers are unaffected
//!
//! **Warning**: `AssertUnwindSafe` is used, which can leave shared state
//! inconsistent if an observer panics while holding a lock.

use std::sync::Arc;

use futures::FutureExt;
use tokio::{sync::mpsc, task::JoinHandle};

use crate::events::{Bus, Event, EventKind};
use crate::observers::Observe;

/// Per-observer channel metadata.
struct ObserverChannel {
    name: &'static str,
    sender: mpsc::Sender<Arc<Event>>,
}

/// Fan-out coordinator for multiple event observers.
///
/// Manages per-observer queues and worker tasks, providing:
/// - **Concurrent delivery**: events sent to all observers simultaneously
/// - **Isolation**: each observer has a dedicated queue and worker
/// - **Panic safety**: panics caught and reported, never crash the broker
/// - **Overflow handling**: dropped events reported via `ObserverOverflow`
pub struct ObserverSet {
    channels: Vec<ObserverChannel>,
    workers: Vec<JoinHandle<()>>,
    bus: Bus,
}

impl ObserverSet {
    /// Creates a new set and spawns one worker task per observer.
    ///
    /// ### Per-observer setup
    /// - Bounded mpsc queue (capacity from [`Observe::queue_capacity`], min 1)
    /// - Dedicated worker task (runs until the queue closes)
    /// - Panic isolation via `catch_unwind`
    #[must_use]
    pub fn new(observers: Vec<Arc<dyn Observe>>, bus: Bus) -> Self {
        let mut channels = Vec::with_capacity(observers.len());
        let mut workers = Vec::with_capacity(observers.len());

        for obs in observers {
            let cap = obs.queue_capacity().max(1);
            let name = obs.name();
            let (tx, mut rx) = mpsc::channel::<Arc<Event>>(cap);
            let o = Arc::clone(&obs);
            let bus_for_worker = bus.clone();

            let handle = tokio::spawn(async move {
                while let Some(ev) = rx.recv().await {
                    let fut = o.on_event(ev.as_ref());

                    if let Err(panic_err) = std::panic::AssertUnwindSafe(fut).catch_unwind().await {
                        let info = {
                            let any = &*panic_err;
                            if let Some(msg) = any.downcast_ref::<&'static str>() {
                                (*msg).to_string()
                            } else if let Some(msg) = any.downcast_ref::<String>() {
                                msg.clone()
                            } else {
                                "unknown panic".to_string()
                            }
                        };
                        bus_for_worker.publish(Event::observer_panicked(o.name(), info));
                    }
                }
            });
            channels.push(ObserverChannel { name, sender: tx });
            workers.push(handle);
        }
        Self {
            channels,
            workers,
            bus,
        }
    }

    /// Emits an event to all observers (clones the event).
    ///
    /// Returns immediately (non-blocking). For hot paths, use
    /// [`emit_arc`](Self::emit_arc) to avoid cloning.
    pub fn emit(&self, event: &Event) {
        self.emit_arc(Arc::new(event.clone()));
    }

    /// Emits a pre-allocated `Arc<Event>` to all observers.
    ///
    /// - Uses `try_send` (non-blocking)
    /// - On queue full: drops the event, publishes `ObserverOverflow`
    /// - On queue closed: publishes `ObserverOverflow` with reason "closed"
    ///
    /// ### Overflow prevention
    /// `ObserverOverflow` events are not re-published when they themselves
    /// overflow, preventing an infinite loop.
    pub fn emit_arc(&self, event: Arc<Event>) {
        let is_overflow_evt = matches!(event.kind, EventKind::ObserverOverflow);

        for channel in &self.channels {
            match channel.sender.try_send(Arc::clone(&event)) {
                Ok(()) => {}
                Err(mpsc::error::TrySendError::Full(_)) => {
                    if !is_overflow_evt {
                        self.bus
                            .publish(Event::observer_overflow(channel.name, "full"));
                    }
                }
                Err(mpsc::error::TrySendError::Closed(_)) => {
                    if !is_overflow_evt {
                        self.bus
                            .publish(Event::observer_overflow(channel.name, "closed"));
                    }
                }
            }
        }
    }

    /// Gracefully shuts down all observer workers.
    ///
    /// 1. Drops all channel senders (workers see the channel closed)
    /// 2. Awaits all worker tasks
    pub async fn shutdown(self) {
        drop(self.channels);

        for h in self.workers {
            let _ = h.await;
        }
    }

    /// True if there are no observers.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    /// Number of observers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.channels.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;
    use tokio::time::timeout;

    #[derive(Default)]
    struct Counting {
        seen: AtomicU32,
    }

    #[async_trait]
    impl Observe for Counting {
        async fn on_event(&self, _event: &Event) {
            self.seen.fetch_add(1, Ordering::SeqCst);
        }

        fn name(&self) -> &'static str {
            "counting"
        }
    }

    struct Panicking;

    #[async_trait]
    impl Observe for Panicking {
        async fn on_event(&self, _event: &Event) {
            panic!("observer boom");
        }

        fn name(&self) -> &'static str {
            "panicking"
        }
    }

    #[tokio::test]
    async fn test_events_reach_every_observer() {
        let bus = Bus::new(16);
        let a = Arc::new(Counting::default());
        let b = Arc::new(Counting::default());
        let set = ObserverSet::new(vec![a.clone(), b.clone()], bus.clone());

        for _ in 0..3 {
            set.emit(&Event::new(EventKind::Delivered));
        }
        set.shutdown().await;

        assert_eq!(a.seen.load(Ordering::SeqCst), 3);
        assert_eq!(b.seen.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_panic_is_isolated_and_reported() {
        let bus = Bus::new(16);
        let mut rx = bus.subscribe();
        let healthy = Arc::new(Counting::default());
        let set = ObserverSet::new(vec![Arc::new(Panicking) as _, healthy.clone() as _], bus);

        set.emit(&Event::new(EventKind::Delivered));
        set.shutdown().await;

        assert_eq!(healthy.seen.load(Ordering::SeqCst), 1);

        let ev = timeout(Duration::from_millis(100), rx.recv())
            .await
            .expect("timed out")
            .expect("no event");
        assert_eq!(ev.kind, EventKind::ObserverPanicked);
        assert_eq!(ev.subscriber.as_deref(), Some("panicking"));
        assert_eq!(ev.reason.as_deref(), Some("observer boom"));
    }

    #[tokio::test]
    async fn test_empty_set_is_a_no_op() {
        let bus = Bus::new(4);
        let set = ObserverSet::new(Vec::new(), bus);
        assert!(set.is_empty());
        set.emit(&Event::new(EventKind::ShutdownRequested));
        set.shutdown().await;
    }
}
