//! Drives one batch and maps its outcome to a process exit status.

use std::future::Future;
use std::sync::Arc;

use tracing::{info, warn};

use crate::address;
use crate::config::Config;
use crate::mailer::Mailer;
use crate::message::Message;
use crate::pipeline::{DispatchPipeline, PipelineError};

/// How one invocation ended.
///
/// A batch with some failed deliveries is still a completed *run*: the
/// distinction between "did the batch run to completion" and "did every email
/// succeed" is made here, deliberately, and only here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitStatus {
    /// The batch ran to completion, regardless of per-recipient failures.
    Completed,
    /// No recipient survived validation. Success-with-warning, not fatal.
    NoRecipients,
    /// Connectivity verification failed; the run aborted before any send.
    ConnectionFailure,
    /// A termination signal arrived; in-flight sends were abandoned.
    Interrupted,
}

impl ExitStatus {
    /// The process exit code for this status.
    #[must_use]
    pub const fn code(self) -> i32 {
        match self {
            Self::Completed | Self::NoRecipients | Self::Interrupted => 0,
            Self::ConnectionFailure => 1,
        }
    }
}

/// Runs the dispatch pipeline exactly once.
pub struct Runner {
    config: Config,
    mailer: Arc<dyn Mailer>,
}

impl Runner {
    #[must_use]
    pub fn new(config: Config, mailer: Arc<dyn Mailer>) -> Self {
        Self { config, mailer }
    }

    /// Execute one batch, racing it against the given shutdown signal.
    ///
    /// When `shutdown` resolves first the runner returns
    /// [`ExitStatus::Interrupted`] immediately: in-flight sends are neither
    /// awaited nor cancelled, matching the abrupt-exit policy for termination
    /// signals.
    pub async fn execute(self, shutdown: impl Future<Output = ()> + Send) -> ExitStatus {
        tokio::select! {
            status = self.dispatch() => status,
            () = shutdown => {
                info!("Termination signal received, shutting down");
                ExitStatus::Interrupted
            }
        }
    }

    async fn dispatch(&self) -> ExitStatus {
        let validation = address::partition(self.config.recipients.clone());

        if validation.valid.is_empty() {
            warn!("No valid email addresses found");
            return ExitStatus::NoRecipients;
        }

        let message = Message::fixed(self.config.smtp.username.clone());
        let pipeline = DispatchPipeline::new(Arc::clone(&self.mailer));

        match pipeline.run(validation, message).await {
            Ok(_) => ExitStatus::Completed,
            Err(PipelineError::ConnectionFailed) => ExitStatus::ConnectionFailure,
        }
    }
}
