//! # Core subscriber trait
//!
//! `Receive` is the boundary the broker calls through: one async operation
//! that accepts a published [`Envelope`] and acknowledges it by returning.
//! In the full system the implementation sits behind a transport adapter
//! (actor proxy, RPC client); in tests it is implemented directly.
//!
//! ## Contract
//! - Implementations must be safe to invoke **concurrently** with themselves:
//!   the broker may deliver several distinct envelopes to the same subscriber
//!   in parallel.
//! - No in-order delivery across different envelopes may be assumed.
//! - Returning `Ok(())` acknowledges the delivery; any error is classified by
//!   [`DeliveryError::is_transient`] and drives the retry loop.

use async_trait::async_trait;

use crate::envelope::Envelope;
use crate::error::DeliveryError;

/// # Receive half of the subscriber contract.
///
/// Called from a delivery worker task, once per attempt. Implementations
/// should avoid blocking the async runtime (prefer async I/O and cooperative
/// waits).
///
/// # Example
/// ```
/// use async_trait::async_trait;
/// use relaybus::{DeliveryError, Envelope, Receive};
///
/// struct OrderProjection;
///
/// #[async_trait]
/// impl Receive for OrderProjection {
///     async fn receive(&self, envelope: &Envelope) -> Result<(), DeliveryError> {
///         // apply the payload to a read model...
///         let _ = &envelope.payload;
///         Ok(())
///     }
/// }
/// ```
#[async_trait]
pub trait Receive: Send + Sync + 'static {
    /// Handles one delivered envelope.
    ///
    /// Success acknowledges the delivery. A transient error
    /// ([`DeliveryError::Unreachable`], [`DeliveryError::Timeout`]) schedules
    /// a retry; a permanent one abandons the delivery and evicts the
    /// subscriber from the registry.
    async fn receive(&self, envelope: &Envelope) -> Result<(), DeliveryError>;
}
