//! The dispatch pipeline: connectivity gate and concurrent send fan-out.
//!
//! A run moves through validation (see [`crate::address`]), a single
//! connectivity check, then one concurrent send per valid recipient with no
//! cap on fan-out width. Each send is isolated: a failure is captured into
//! that recipient's outcome and never cancels, retries, or affects any other
//! in-flight send. The run completes only once every send has resolved, and
//! outcomes are aggregated in issue order regardless of completion order.

use std::sync::Arc;

use thiserror::Error;
use tokio::task::JoinSet;
use tracing::{error, info};

use crate::address::ValidationResult;
use crate::mailer::Mailer;
use crate::message::Message;

/// The per-recipient record of one send attempt. Created once the attempt
/// resolves; immutable afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryOutcome {
    pub recipient: String,
    pub succeeded: bool,
    pub error_detail: Option<String>,
}

/// Aggregate result of one batch.
///
/// Invariant: `attempted == succeeded + failed == outcomes.len()`, and
/// `outcomes` is in the order sends were issued.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchResult {
    pub attempted: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub outcomes: Vec<DeliveryOutcome>,
}

/// Run-level pipeline failures. Per-recipient delivery failures are not
/// errors; they land in [`BatchResult::outcomes`].
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Transport connectivity could not be established; the run aborted
    /// before any send was attempted.
    #[error("SMTP connection could not be verified")]
    ConnectionFailed,
}

/// Orchestrates one batch against a shared [`Mailer`].
pub struct DispatchPipeline {
    mailer: Arc<dyn Mailer>,
}

impl DispatchPipeline {
    #[must_use]
    pub fn new(mailer: Arc<dyn Mailer>) -> Self {
        Self { mailer }
    }

    /// Dispatch `message` to every valid recipient in `validation`.
    ///
    /// An empty valid list short-circuits to an all-zero [`BatchResult`]
    /// without touching the transport. Otherwise the transport is verified
    /// once; only then are sends fanned out.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::ConnectionFailed`] if connectivity could not
    /// be verified — whether the check returned `false` or failed outright —
    /// in which case zero sends were attempted.
    pub async fn run(
        &self,
        validation: ValidationResult,
        message: Message,
    ) -> Result<BatchResult, PipelineError> {
        let valid = validation.valid;

        if valid.is_empty() {
            info!("No valid recipient addresses; nothing to dispatch");
            return Ok(BatchResult::default());
        }

        match self.mailer.verify_connection().await {
            Ok(true) => info!("SMTP connection verified"),
            Ok(false) => {
                error!("SMTP connection could not be verified");
                return Err(PipelineError::ConnectionFailed);
            }
            Err(e) => {
                error!(error = %e, "SMTP connection failed");
                return Err(PipelineError::ConnectionFailed);
            }
        }

        let total = valid.len();
        info!(recipients = total, "Dispatching batch");

        let message = Arc::new(message);
        let mut sends: JoinSet<(usize, DeliveryOutcome)> = JoinSet::new();

        for (index, recipient) in valid.iter().cloned().enumerate() {
            let mailer = Arc::clone(&self.mailer);
            let message = Arc::clone(&message);

            sends.spawn(async move {
                let outcome = match mailer.send(&recipient, &message).await {
                    Ok(()) => {
                        info!(
                            recipient = %recipient,
                            sent = index + 1,
                            total,
                            "Email sent"
                        );
                        DeliveryOutcome {
                            recipient,
                            succeeded: true,
                            error_detail: None,
                        }
                    }
                    Err(e) => {
                        error!(recipient = %recipient, error = %e, "Failed to send email");
                        DeliveryOutcome {
                            recipient,
                            succeeded: false,
                            error_detail: Some(e.detail().to_string()),
                        }
                    }
                };

                (index, outcome)
            });
        }

        // Full join barrier: every send resolves before aggregation. Outcomes
        // are slotted by issue index, not completion order.
        let mut slots: Vec<Option<DeliveryOutcome>> = (0..total).map(|_| None).collect();
        while let Some(joined) = sends.join_next().await {
            match joined {
                Ok((index, outcome)) => slots[index] = Some(outcome),
                Err(e) => error!(error = %e, "Send task failed to complete"),
            }
        }

        let outcomes: Vec<DeliveryOutcome> = slots
            .into_iter()
            .enumerate()
            .map(|(index, slot)| {
                slot.unwrap_or_else(|| DeliveryOutcome {
                    recipient: valid[index].clone(),
                    succeeded: false,
                    error_detail: Some("send task aborted".to_string()),
                })
            })
            .collect();

        let succeeded = outcomes.iter().filter(|outcome| outcome.succeeded).count();
        let result = BatchResult {
            attempted: total,
            succeeded,
            failed: total - succeeded,
            outcomes,
        };

        info!(
            attempted = result.attempted,
            succeeded = result.succeeded,
            failed = result.failed,
            "Batch complete"
        );

        Ok(result)
    }
}
