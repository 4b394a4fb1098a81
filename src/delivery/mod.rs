//! Fans a rendered message out to every recipient.
//!
//! Each recipient gets its own task. The dispatcher waits for all of them to
//! settle before summarizing; one failure never cancels or skips another.

pub mod smtp;

pub use smtp::{SmtpConfig, SmtpMailTransport};

use std::sync::Arc;

use async_trait::async_trait;
use futures::future::join_all;
use serde::Serialize;
use tracing::{info, warn};

use crate::error::{DatabaseError, DeliveryError};
use crate::render::RenderedMessage;

/// Read-only source of recipient addresses.
#[async_trait]
pub trait RecipientProvider: Send + Sync {
    async fn list_recipients(&self) -> Result<Vec<String>, DatabaseError>;
}

/// Sends one message to one recipient.
#[async_trait]
pub trait MailTransport: Send + Sync {
    async fn send(&self, message: &RenderedMessage, recipient: &str) -> Result<(), DeliveryError>;
}

/// Result of one recipient's send.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeliveryOutcome {
    pub recipient: String,
    pub succeeded: bool,
    pub reason: Option<String>,
}

/// Aggregate counts for one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub success_count: usize,
    pub failure_count: usize,
}

impl RunSummary {
    pub fn from_outcomes(outcomes: &[DeliveryOutcome]) -> Self {
        let success_count = outcomes.iter().filter(|o| o.succeeded).count();
        Self {
            success_count,
            failure_count: outcomes.len() - success_count,
        }
    }

    pub fn attempted(&self) -> usize {
        self.success_count + self.failure_count
    }
}

/// Sends a message to a snapshot of all recipients.
pub struct Dispatcher {
    recipients: Arc<dyn RecipientProvider>,
    transport: Arc<dyn MailTransport>,
}

impl Dispatcher {
    pub fn new(recipients: Arc<dyn RecipientProvider>, transport: Arc<dyn MailTransport>) -> Self {
        Self {
            recipients,
            transport,
        }
    }

    /// Deliver `message` to every current recipient once.
    ///
    /// Errors only if the recipient list cannot be read; per-recipient send
    /// failures land in the summary.
    pub async fn dispatch(&self, message: RenderedMessage) -> Result<RunSummary, DatabaseError> {
        let recipients = self.recipients.list_recipients().await?;
        if recipients.is_empty() {
            info!("No recipients subscribed, nothing to send");
            return Ok(RunSummary::default());
        }

        let outcomes = self.deliver_all(Arc::new(message), recipients).await;
        let summary = RunSummary::from_outcomes(&outcomes);
        info!(
            attempted = summary.attempted(),
            success = summary.success_count,
            failed = summary.failure_count,
            "Dispatch complete"
        );
        Ok(summary)
    }

    /// One task per recipient; waits for every task.
    pub async fn deliver_all(
        &self,
        message: Arc<RenderedMessage>,
        recipients: Vec<String>,
    ) -> Vec<DeliveryOutcome> {
        info!(count = recipients.len(), "Dispatching to recipients");

        let handles: Vec<_> = recipients
            .into_iter()
            .map(|recipient| {
                let transport = Arc::clone(&self.transport);
                let message = Arc::clone(&message);
                let task_recipient = recipient.clone();
                let handle = tokio::spawn(async move {
                    transport.send(&message, &task_recipient).await
                });
                (recipient, handle)
            })
            .collect();

        let settled = join_all(handles.into_iter().map(|(recipient, handle)| async move {
            let result = match handle.await {
                Ok(result) => result,
                Err(e) => Err(DeliveryError::Aborted(e.to_string())),
            };
            (recipient, result)
        }))
        .await;

        settled
            .into_iter()
            .map(|(recipient, result)| match result {
                Ok(()) => DeliveryOutcome {
                    recipient,
                    succeeded: true,
                    reason: None,
                },
                Err(e) => {
                    warn!(recipient = %recipient, error = %e, "Delivery failed");
                    DeliveryOutcome {
                        recipient,
                        succeeded: false,
                        reason: Some(e.to_string()),
                    }
                }
            })
            .collect()
    }
}
