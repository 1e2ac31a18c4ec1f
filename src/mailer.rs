//! The transport capability consumed by the dispatch pipeline.

use async_trait::async_trait;
use thiserror::Error;

use crate::message::Message;

/// Errors raised while verifying transport connectivity.
///
/// The pipeline does not distinguish between variants: any error, like a
/// `false` verification result, means "not connected" and aborts the run
/// before a single send is attempted.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The transport could not be reached or refused the session.
    #[error("Transport unavailable: {0}")]
    Unavailable(String),

    /// The transport rejected the configured credentials.
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),
}

/// An individual delivery failure, carrying a human-readable detail string.
///
/// Delivery errors are recovered locally: they become the failed recipient's
/// outcome record and never propagate past the pipeline.
#[derive(Debug, Error)]
#[error("{detail}")]
pub struct DeliveryError {
    detail: String,
}

impl DeliveryError {
    #[must_use]
    pub fn new(detail: impl Into<String>) -> Self {
        Self {
            detail: detail.into(),
        }
    }

    #[must_use]
    pub fn detail(&self) -> &str {
        &self.detail
    }
}

/// A mail transport.
///
/// Both operations may suspend on network I/O. The pipeline assumes no
/// timeout; timeout policy, if any, belongs to the implementation. The
/// transport is shared read-only across all concurrent sends, so
/// implementations must be safe to call concurrently — the SMTP
/// implementation achieves this by opening a fresh connection per operation.
#[async_trait]
pub trait Mailer: Send + Sync {
    /// Check that the transport is reachable and willing to accept mail.
    ///
    /// # Errors
    ///
    /// Returns an error if the session could not be established; the caller
    /// treats this identically to an `Ok(false)` result.
    async fn verify_connection(&self) -> Result<bool, TransportError>;

    /// Deliver `message` to a single recipient.
    ///
    /// # Errors
    ///
    /// Returns a [`DeliveryError`] describing why this recipient's delivery
    /// failed. Other recipients are unaffected.
    async fn send(&self, recipient: &str, message: &Message) -> Result<(), DeliveryError>;
}
