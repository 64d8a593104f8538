//! # LogWriter — simple event printer
//!
//! A minimal observer that prints incoming [`Event`]s to stdout.
//! Use it for tests or demos.
//!
//! ## Example output
//! ```text
//! [registered] subscriber="svc-1" type="OrderCreated"
//! [publish] type="OrderCreated" fanout=2
//! [delivering] subscriber="svc-1" type="OrderCreated" attempt=1
//! [delivered] subscriber="svc-1" type="OrderCreated"
//! [backoff] subscriber="svc-2" delay_ms=200 after_attempt=1 err="unreachable: refused"
//! [abandoned] subscriber="svc-2" reason="delivery_unreachable"
//! [evicted] subscriber="svc-2"
//! [shutdown-requested]
//! [all-drained-within-grace]
//! ```

use async_trait::async_trait;

use crate::events::{Event, EventKind};
use crate::observers::Observe;

/// Event writer observer.
#[derive(Default)]
pub struct LogWriter;

impl LogWriter {
    /// Construct a new [`LogWriter`].
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Observe for LogWriter {
    async fn on_event(&self, e: &Event) {
        match e.kind {
            EventKind::SubscriberRegistered => {
                println!(
                    "[registered] subscriber={:?} type={:?}",
                    e.subscriber, e.message_type
                );
            }
            EventKind::SubscriberUnregistered => {
                println!(
                    "[unregistered] subscriber={:?} type={:?}",
                    e.subscriber, e.message_type
                );
            }
            EventKind::SubscriberEvicted => {
                println!(
                    "[evicted] subscriber={:?} reason={:?}",
                    e.subscriber, e.reason
                );
            }
            EventKind::PublishAccepted => {
                println!("[publish] type={:?} fanout={:?}", e.message_type, e.attempt);
            }
            EventKind::DeliveryStarting => {
                println!(
                    "[delivering] subscriber={:?} type={:?} attempt={:?}",
                    e.subscriber, e.message_type, e.attempt
                );
            }
            EventKind::Delivered => {
                println!(
                    "[delivered] subscriber={:?} type={:?}",
                    e.subscriber, e.message_type
                );
            }
            EventKind::DeliveryFailed => {
                println!(
                    "[failed] subscriber={:?} err={:?} attempt={:?}",
                    e.subscriber, e.reason, e.attempt
                );
            }
            EventKind::DeliveryTimedOut => {
                println!(
                    "[timeout] subscriber={:?} timeout_ms={:?}",
                    e.subscriber, e.timeout_ms
                );
            }
            EventKind::BackoffScheduled => {
                println!(
                    "[backoff] subscriber={:?} delay_ms={:?} after_attempt={:?} err={:?}",
                    e.subscriber, e.delay_ms, e.attempt, e.reason
                );
            }
            EventKind::DeliveryAbandoned => {
                println!(
                    "[abandoned] subscriber={:?} reason={:?}",
                    e.subscriber, e.reason
                );
            }
            EventKind::ObserverOverflow => {
                println!(
                    "[observer-overflow] observer={:?} reason={:?}",
                    e.subscriber, e.reason
                );
            }
            EventKind::ObserverPanicked => {
                println!(
                    "[observer-panicked] observer={} info={}",
                    e.subscriber.as_deref().unwrap_or("unknown"),
                    e.reason.as_deref().unwrap_or("unknown"),
                );
            }
            EventKind::ShutdownRequested => {
                println!("[shutdown-requested]");
            }
            EventKind::AllDrainedWithin => {
                println!("[all-drained-within-grace]");
            }
            EventKind::GraceExceeded => {
                println!("[grace-exceeded]");
            }
        }
    }

    fn name(&self) -> &'static str {
        "LogWriter"
    }
}
