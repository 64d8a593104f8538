//! # Broker: registration, publish fan-out, graceful drain.
//!
//! The [`Broker`] owns the subscription registry, the event bus, the observer
//! set, and the task tracker all delivery workers run inside. It is built via
//! [`BrokerBuilder`] and handed out as an `Arc`.
//!
//! ## Publish semantics
//! - `publish` snapshots the registry for the envelope's message type and
//!   spawns one independent [`DeliveryWorker`] per subscriber in the snapshot.
//! - It returns as soon as fan-out is initiated (fire-and-forget); the
//!   returned count is the snapshot size, **not** a delivery confirmation.
//! - A publish with no subscribers succeeds with a fan-out of zero.
//!
//! ## Shutdown
//! `shutdown` stops accepting new work, waits up to the configured grace for
//! in-flight deliveries to drain, and cancels whatever remains after that.
//! Cancelled deliveries are abandoned without evicting their subscribers.

use std::sync::{Arc, Mutex};

use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

use crate::broker::registry::{RegisterOutcome, SubscriptionRegistry};
use crate::broker::worker::DeliveryWorker;
use crate::config::BrokerConfig;
use crate::envelope::{Envelope, MessageType, SubscriberId};
use crate::error::BrokerError;
use crate::events::{Bus, Event, EventKind};
use crate::observers::{Observe, ObserverSet};
use crate::subscriber::SubscriberHandle;

/// Pub/sub broker handle.
///
/// Cheap to share (`Arc`); all methods take `&self`.
pub struct Broker {
    cfg: BrokerConfig,
    bus: Bus,
    registry: Arc<SubscriptionRegistry>,
    tracker: TaskTracker,
    runtime_token: CancellationToken,
    semaphore: Option<Arc<Semaphore>>,
    pump_token: CancellationToken,
    observer_pump: Mutex<Option<JoinHandle<()>>>,
}

impl Broker {
    /// Starts building a broker with the given configuration.
    pub fn builder(cfg: BrokerConfig) -> BrokerBuilder {
        BrokerBuilder::new(cfg)
    }

    /// Registers `handle` for `message_type`.
    ///
    /// Fails fast with [`BrokerError::InvalidRegistration`] on an empty id or
    /// message type. Re-registering an identical handle is a no-op; the same
    /// id with a new channel replaces the old entry.
    pub async fn register(
        &self,
        message_type: MessageType,
        handle: SubscriberHandle,
    ) -> Result<(), BrokerError> {
        if handle.id.is_empty() {
            return Err(BrokerError::InvalidRegistration {
                reason: "empty subscriber id",
            });
        }
        if message_type.is_empty() {
            return Err(BrokerError::InvalidRegistration {
                reason: "empty message type",
            });
        }

        let id = handle.id.clone();
        let outcome = self.registry.register(message_type.clone(), handle).await;
        if outcome != RegisterOutcome::Unchanged {
            self.bus.publish(
                Event::new(EventKind::SubscriberRegistered)
                    .with_subscriber(id.as_str())
                    .with_message_type(message_type.as_str()),
            );
        }
        Ok(())
    }

    /// Removes the registration of `id` for `message_type`.
    ///
    /// Idempotent: unregistering an absent pair is not an error.
    pub async fn unregister(
        &self,
        message_type: &MessageType,
        id: &SubscriberId,
    ) -> Result<(), BrokerError> {
        if id.is_empty() {
            return Err(BrokerError::InvalidRegistration {
                reason: "empty subscriber id",
            });
        }
        if message_type.is_empty() {
            return Err(BrokerError::InvalidRegistration {
                reason: "empty message type",
            });
        }

        if self.registry.unregister(message_type, id).await {
            self.bus.publish(
                Event::new(EventKind::SubscriberUnregistered)
                    .with_subscriber(id.as_str())
                    .with_message_type(message_type.as_str()),
            );
        }
        Ok(())
    }

    /// Publishes `envelope` to every subscriber currently registered for its
    /// message type.
    ///
    /// Fire-and-forget: returns the fan-out size once every delivery worker
    /// has been spawned. Delivery outcomes surface as events, never as a
    /// publish error. Zero subscribers is a success with fan-out 0.
    ///
    /// After `shutdown` has been requested no new deliveries are started;
    /// such a publish returns fan-out 0 without touching the registry.
    pub async fn publish(&self, envelope: Envelope) -> Result<usize, BrokerError> {
        if self.tracker.is_closed() {
            return Ok(0);
        }

        let snapshot = self.registry.snapshot(&envelope.message_type).await;
        let fanout = snapshot.len();

        self.bus.publish(
            Event::new(EventKind::PublishAccepted)
                .with_message_type(envelope.message_type.as_str())
                .with_attempt(u32::try_from(fanout).unwrap_or(u32::MAX)),
        );

        for handle in snapshot {
            let worker = DeliveryWorker::new(
                envelope.clone(),
                handle,
                &self.cfg,
                self.bus.clone(),
                Arc::clone(&self.registry),
                self.semaphore.clone(),
            );
            let token = self.runtime_token.clone();
            self.tracker.spawn(async move {
                worker.run(token).await;
            });
        }
        Ok(fanout)
    }

    /// The subscription registry, for snapshot-style introspection.
    pub fn registry(&self) -> &SubscriptionRegistry {
        &self.registry
    }

    /// The event bus; subscribe to observe the delivery stream directly.
    pub fn bus(&self) -> &Bus {
        &self.bus
    }

    /// Drains in-flight deliveries and shuts the broker down.
    ///
    /// 1. Publishes `ShutdownRequested` and closes the tracker. Deliveries
    ///    already spawned keep running.
    /// 2. Waits up to `grace` for all workers to finish. On success publishes
    ///    `AllDrainedWithin`.
    /// 3. On grace expiry cancels the runtime token (workers abandon without
    ///    eviction), publishes `GraceExceeded`, and returns
    ///    [`BrokerError::GraceExceeded`].
    ///
    /// The observer pipeline is drained last so every delivery event still
    /// reaches the observers. Idempotent: a second call drains nothing and
    /// returns `Ok`.
    pub async fn shutdown(self: Arc<Self>) -> Result<(), BrokerError> {
        self.drain(None).await
    }

    /// Runs until a termination signal arrives, then drains.
    ///
    /// The signal name is attached to the `ShutdownRequested` event. If
    /// signal listeners cannot be installed the broker drains immediately
    /// rather than running unstoppable.
    pub async fn run_until_shutdown(self: Arc<Self>) -> Result<(), BrokerError> {
        let signal = wait_for_termination().await;
        self.drain(Some(signal)).await
    }

    async fn drain(self: Arc<Self>, signal: Option<&'static str>) -> Result<(), BrokerError> {
        let mut requested = Event::new(EventKind::ShutdownRequested);
        if let Some(signal) = signal {
            requested = requested.with_reason(signal);
        }
        self.bus.publish(requested);
        self.tracker.close();

        let grace = self.cfg.grace;
        let result = match tokio::time::timeout(grace, self.tracker.wait()).await {
            Ok(()) => {
                self.bus.publish(Event::new(EventKind::AllDrainedWithin));
                Ok(())
            }
            Err(_) => {
                self.runtime_token.cancel();
                self.bus.publish(Event::new(EventKind::GraceExceeded));
                self.tracker.wait().await;
                Err(BrokerError::GraceExceeded { grace })
            }
        };

        // Stop the pump only after the final shutdown event is on the bus;
        // the pump drains remaining buffered events before exiting.
        self.pump_token.cancel();
        let pump = {
            let mut slot = self.observer_pump.lock().unwrap_or_else(|e| e.into_inner());
            slot.take()
        };
        if let Some(pump) = pump {
            let _ = pump.await;
        }
        result
    }
}

/// Waits for process termination and names the signal that arrived.
///
/// Listens for `SIGINT` (Ctrl-C), `SIGTERM` (systemd / Kubernetes), and
/// `SIGQUIT`. Listener registration failure is reported as its own reason so
/// the resulting drain is attributable in the event stream.
#[cfg(unix)]
async fn wait_for_termination() -> &'static str {
    use tokio::signal::unix::{signal, SignalKind};

    match (
        signal(SignalKind::interrupt()),
        signal(SignalKind::terminate()),
        signal(SignalKind::quit()),
    ) {
        (Ok(mut sigint), Ok(mut sigterm), Ok(mut sigquit)) => tokio::select! {
            _ = sigint.recv()  => "SIGINT",
            _ = sigterm.recv() => "SIGTERM",
            _ = sigquit.recv() => "SIGQUIT",
        },
        _ => "signal listeners unavailable",
    }
}

/// Waits for Ctrl-C (non-Unix platforms).
#[cfg(not(unix))]
async fn wait_for_termination() -> &'static str {
    let _ = tokio::signal::ctrl_c().await;
    "ctrl-c"
}

impl Drop for Broker {
    fn drop(&mut self) {
        // A broker dropped without shutdown() must not leave workers parked
        // on a dead registry.
        self.runtime_token.cancel();
        self.pump_token.cancel();
    }
}

/// Builder wiring the broker's bus, observers, and runtime pieces together.
pub struct BrokerBuilder {
    cfg: BrokerConfig,
    observers: Vec<Arc<dyn Observe>>,
}

impl BrokerBuilder {
    /// Creates a builder with no observers attached.
    pub fn new(cfg: BrokerConfig) -> Self {
        Self {
            cfg,
            observers: Vec::new(),
        }
    }

    /// Replaces the observer list.
    #[must_use]
    pub fn with_observers(mut self, observers: Vec<Arc<dyn Observe>>) -> Self {
        self.observers = observers;
        self
    }

    /// Appends one observer.
    #[must_use]
    pub fn with_observer(mut self, observer: Arc<dyn Observe>) -> Self {
        self.observers.push(observer);
        self
    }

    /// Builds the broker.
    ///
    /// When observers are attached, a pump task is spawned that forwards
    /// every bus event into the [`ObserverSet`]'s per-observer queues. A
    /// lagged bus reader skips ahead rather than stalling the broker.
    pub fn build(self) -> Arc<Broker> {
        let bus = Bus::new(self.cfg.bus_capacity_clamped());
        let semaphore = self
            .cfg
            .concurrency_limit()
            .map(|n| Arc::new(Semaphore::new(n)));
        let pump_token = CancellationToken::new();

        let observer_pump = if self.observers.is_empty() {
            None
        } else {
            let set = ObserverSet::new(self.observers, bus.clone());
            let mut rx = bus.subscribe();
            let token = pump_token.clone();
            Some(tokio::spawn(async move {
                use tokio::sync::broadcast::error::RecvError;
                loop {
                    tokio::select! {
                        // Pending events win over cancellation so nothing
                        // published before shutdown is lost.
                        biased;
                        res = rx.recv() => match res {
                            Ok(event) => set.emit_arc(Arc::new(event)),
                            Err(RecvError::Lagged(_)) => continue,
                            Err(RecvError::Closed) => break,
                        },
                        _ = token.cancelled() => break,
                    }
                }
                while let Ok(event) = rx.try_recv() {
                    set.emit_arc(Arc::new(event));
                }
                set.shutdown().await;
            }))
        };

        Arc::new(Broker {
            cfg: self.cfg,
            bus,
            registry: Arc::new(SubscriptionRegistry::new()),
            tracker: TaskTracker::new(),
            runtime_token: CancellationToken::new(),
            semaphore,
            pump_token,
            observer_pump: Mutex::new(observer_pump),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DeliveryError;
    use crate::policies::{JitterPolicy, RetryPolicy};
    use crate::subscriber::Receive;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;
    use tokio::time::{sleep, timeout};

    #[derive(Default)]
    struct Recording {
        seen: Mutex<Vec<String>>,
        calls: AtomicU32,
    }

    #[async_trait]
    impl Receive for Recording {
        async fn receive(&self, envelope: &Envelope) -> Result<(), DeliveryError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let payload = String::from_utf8_lossy(&envelope.payload).into_owned();
            self.seen
                .lock()
                .expect("lock")
                .push(format!("{}:{payload}", envelope.message_type));
            Ok(())
        }
    }

    struct Declining;

    #[async_trait]
    impl Receive for Declining {
        async fn receive(&self, envelope: &Envelope) -> Result<(), DeliveryError> {
            Err(DeliveryError::Declined {
                message_type: envelope.message_type.to_string(),
            })
        }
    }

    fn quick_cfg() -> BrokerConfig {
        BrokerConfig {
            grace: Duration::from_secs(5),
            retry: RetryPolicy {
                first: Duration::from_millis(1),
                max: Duration::from_millis(10),
                factor: 2.0,
                jitter: JitterPolicy::None,
                max_attempts: 3,
            },
            ..Default::default()
        }
    }

    async fn wait_until<F, Fut>(mut condition: F)
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = bool>,
    {
        timeout(Duration::from_secs(2), async {
            while !condition().await {
                sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("condition not reached in time");
    }

    #[tokio::test]
    async fn test_publish_reaches_only_matching_subscribers() {
        let broker = Broker::builder(quick_cfg()).build();
        let created = Arc::new(Recording::default());
        let shipped = Arc::new(Recording::default());

        broker
            .register(
                "OrderCreated".into(),
                SubscriberHandle::new("svc-created", created.clone()),
            )
            .await
            .expect("register");
        broker
            .register(
                "OrderShipped".into(),
                SubscriberHandle::new("svc-shipped", shipped.clone()),
            )
            .await
            .expect("register");

        let fanout = broker
            .publish(Envelope::from("OrderCreated:order-42"))
            .await
            .expect("publish");
        assert_eq!(fanout, 1);

        wait_until(|| async { created.calls.load(Ordering::SeqCst) == 1 }).await;
        assert_eq!(
            *created.seen.lock().expect("lock"),
            vec!["OrderCreated:order-42".to_string()]
        );
        assert_eq!(shipped.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_failing_subscriber_does_not_block_peers() {
        let broker = Broker::builder(quick_cfg()).build();
        let healthy = Arc::new(Recording::default());

        broker
            .register(
                "OrderCreated".into(),
                SubscriberHandle::new("svc-ok", healthy.clone()),
            )
            .await
            .expect("register");
        broker
            .register(
                "OrderCreated".into(),
                SubscriberHandle::new("svc-gone", Arc::new(Declining)),
            )
            .await
            .expect("register");

        let fanout = broker
            .publish(Envelope::from("OrderCreated:order-7"))
            .await
            .expect("publish");
        assert_eq!(fanout, 2);

        wait_until(|| async { healthy.calls.load(Ordering::SeqCst) == 1 }).await;
        // The permanently failing subscriber is evicted from the registry.
        wait_until(|| async {
            broker.registry().snapshot(&"OrderCreated".into()).await.len() == 1
        })
        .await;
    }

    #[tokio::test]
    async fn test_publish_without_subscribers_is_ok() {
        let broker = Broker::builder(quick_cfg()).build();
        let fanout = broker
            .publish(Envelope::from("Unrouted:nothing"))
            .await
            .expect("publish");
        assert_eq!(fanout, 0);
    }

    #[tokio::test]
    async fn test_duplicate_registration_delivers_once() {
        let broker = Broker::builder(quick_cfg()).build();
        let sub = Arc::new(Recording::default());
        let handle = SubscriberHandle::new("svc-1", sub.clone() as Arc<dyn Receive>);

        broker
            .register("OrderCreated".into(), handle.clone())
            .await
            .expect("register");
        broker
            .register("OrderCreated".into(), handle)
            .await
            .expect("register again");

        let fanout = broker
            .publish(Envelope::from("OrderCreated:one"))
            .await
            .expect("publish");
        assert_eq!(fanout, 1);

        wait_until(|| async { sub.calls.load(Ordering::SeqCst) == 1 }).await;
    }

    #[tokio::test]
    async fn test_invalid_registration_fails_fast() {
        let broker = Broker::builder(quick_cfg()).build();
        let sub: Arc<dyn Receive> = Arc::new(Recording::default());

        let err = broker
            .register("".into(), SubscriberHandle::new("svc-1", sub.clone()))
            .await
            .expect_err("empty message type");
        assert!(matches!(err, BrokerError::InvalidRegistration { .. }));

        let err = broker
            .register("OrderCreated".into(), SubscriberHandle::new("", sub))
            .await
            .expect_err("empty id");
        assert!(matches!(err, BrokerError::InvalidRegistration { .. }));

        assert!(broker.registry().is_empty().await);
    }

    #[tokio::test]
    async fn test_snapshot_taken_at_publish_time() {
        let broker = Broker::builder(quick_cfg()).build();
        let early = Arc::new(Recording::default());
        let late = Arc::new(Recording::default());

        broker
            .register(
                "OrderCreated".into(),
                SubscriberHandle::new("svc-early", early.clone()),
            )
            .await
            .expect("register");

        broker
            .publish(Envelope::from("OrderCreated:order-1"))
            .await
            .expect("publish");

        // Registered after the publish: must not receive order-1.
        broker
            .register(
                "OrderCreated".into(),
                SubscriberHandle::new("svc-late", late.clone()),
            )
            .await
            .expect("register");

        wait_until(|| async { early.calls.load(Ordering::SeqCst) == 1 }).await;
        assert_eq!(late.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_shutdown_drains_in_flight_deliveries() {
        struct SlowOk;

        #[async_trait]
        impl Receive for SlowOk {
            async fn receive(&self, _envelope: &Envelope) -> Result<(), DeliveryError> {
                sleep(Duration::from_millis(50)).await;
                Ok(())
            }
        }

        let broker = Broker::builder(quick_cfg()).build();
        let mut rx = broker.bus().subscribe();
        broker
            .register(
                "OrderCreated".into(),
                SubscriberHandle::new("svc-slow", Arc::new(SlowOk)),
            )
            .await
            .expect("register");
        broker
            .publish(Envelope::from("OrderCreated:order-9"))
            .await
            .expect("publish");

        broker.shutdown().await.expect("drained within grace");

        let mut saw_delivered = false;
        let mut saw_drained = false;
        while let Ok(ev) = rx.try_recv() {
            match ev.kind {
                EventKind::Delivered => saw_delivered = true,
                EventKind::AllDrainedWithin => saw_drained = true,
                _ => {}
            }
        }
        assert!(saw_delivered, "in-flight delivery must complete");
        assert!(saw_drained);
    }

    #[tokio::test]
    async fn test_shutdown_grace_exceeded_cancels_without_eviction() {
        struct Stuck;

        #[async_trait]
        impl Receive for Stuck {
            async fn receive(&self, _envelope: &Envelope) -> Result<(), DeliveryError> {
                sleep(Duration::from_secs(3600)).await;
                Ok(())
            }
        }

        let mut cfg = quick_cfg();
        cfg.grace = Duration::from_millis(20);
        let broker = Broker::builder(cfg).build();
        broker
            .register(
                "OrderCreated".into(),
                SubscriberHandle::new("svc-stuck", Arc::new(Stuck)),
            )
            .await
            .expect("register");
        broker
            .publish(Envelope::from("OrderCreated:order-13"))
            .await
            .expect("publish");

        let registry = Arc::clone(&broker.registry);
        let err = broker.shutdown().await.expect_err("grace must expire");
        assert!(matches!(err, BrokerError::GraceExceeded { .. }));
        // Cancellation is not a verdict on the subscriber.
        assert_eq!(registry.snapshot(&"OrderCreated".into()).await.len(), 1);
    }

    #[tokio::test]
    async fn test_publish_after_shutdown_spawns_nothing() {
        let broker = Broker::builder(quick_cfg()).build();
        let sub = Arc::new(Recording::default());

        broker
            .register(
                "OrderCreated".into(),
                SubscriberHandle::new("svc-1", sub.clone()),
            )
            .await
            .expect("register");
        Arc::clone(&broker).shutdown().await.expect("drained");

        let fanout = broker
            .publish(Envelope::from("OrderCreated:too-late"))
            .await
            .expect("publish");
        assert_eq!(fanout, 0);

        sleep(Duration::from_millis(20)).await;
        assert_eq!(sub.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_observers_see_the_delivery_stream() {
        use crate::observers::Observe;

        #[derive(Default)]
        struct Counting {
            delivered: AtomicU32,
        }

        #[async_trait]
        impl Observe for Counting {
            async fn on_event(&self, event: &Event) {
                if event.kind == EventKind::Delivered {
                    self.delivered.fetch_add(1, Ordering::SeqCst);
                }
            }

            fn name(&self) -> &'static str {
                "counting"
            }
        }

        let observer = Arc::new(Counting::default());
        let broker = Broker::builder(quick_cfg())
            .with_observer(observer.clone())
            .build();
        let sub = Arc::new(Recording::default());

        broker
            .register(
                "OrderCreated".into(),
                SubscriberHandle::new("svc-1", sub.clone()),
            )
            .await
            .expect("register");
        broker
            .publish(Envelope::from("OrderCreated:order-3"))
            .await
            .expect("publish");

        broker.shutdown().await.expect("drained");
        assert_eq!(observer.delivered.load(Ordering::SeqCst), 1);
    }
}
