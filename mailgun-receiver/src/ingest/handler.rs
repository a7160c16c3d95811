//! Ingestion of emails that made it past the delivery gate.
//!
//! ## Processing Flow
//!
//! ```text
//! raw MIME → MailProcessor → Ok  → Accepted
//!                          → Err → classify() → Rejected      → NotificationSender
//!                                             → AlertRequired → AlertSink
//! ```
//!
//! Whatever happens, the webhook is answered with `200 OK`. The email was
//! delivered; a non-success status would make Mailgun redeliver it and the
//! processor could create duplicate posts. Notice delivery and alert
//! reporting are bounded by [`IngestSettings::delivery_timeout`] so a stalled
//! broker cannot hold the response.

use std::sync::Arc;
use std::time::Duration;

use axum::http::StatusCode;
use tracing::{error, info, warn};

use super::classify::classify;
use super::error::FailureKind;
use super::outcome::{ProcessingOutcome, RejectionTemplate, TemplateArgs};
use super::rejection::RejectionContext;
use super::InboundRequest;
use crate::collab::{AlertSink, MailProcessor, NotificationSender};
use crate::Config;

/// Settings the ingestor needs from the configuration.
#[derive(Debug, Clone)]
pub struct IngestSettings {
    /// Log each processing failure with the raw MIME text
    pub log_failures: bool,
    /// Site display name for rejection notices
    pub site_name: String,
    /// Upper bound for delivering one notice or reporting one alert
    pub delivery_timeout: Duration,
}

impl IngestSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            log_failures: config.log_mail_processing_failures,
            site_name: config.title.clone(),
            delivery_timeout: config.publish_timeout(),
        }
    }
}

/// Result of handling one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HandleReport {
    pub status: StatusCode,
    /// Label of the [`ProcessingOutcome`] that was dispatched
    pub outcome: &'static str,
}

/// Runs an email through the processor and dispatches the outcome.
#[derive(Clone)]
pub struct Ingestor {
    processor: Arc<dyn MailProcessor>,
    sender: Arc<dyn NotificationSender>,
    alerts: Arc<dyn AlertSink>,
    settings: IngestSettings,
}

impl Ingestor {
    pub fn new(
        processor: Arc<dyn MailProcessor>,
        sender: Arc<dyn NotificationSender>,
        alerts: Arc<dyn AlertSink>,
        settings: IngestSettings,
    ) -> Self {
        Self {
            processor,
            sender,
            alerts,
            settings,
        }
    }

    /// Handle a gated request. Always reports `200 OK`.
    pub async fn handle(&self, request: &InboundRequest) -> HandleReport {
        let outcome = self.process(&request.body_mime).await;
        let label = outcome.label();

        self.dispatch(outcome, &request.body_mime).await;

        HandleReport {
            status: StatusCode::OK,
            outcome: label,
        }
    }

    /// Submit the email to the processor and classify any failure.
    pub async fn process(&self, raw_mime: &str) -> ProcessingOutcome {
        match self.processor.process(raw_mime).await {
            Ok(()) => ProcessingOutcome::Accepted,
            Err(e) => {
                if self.settings.log_failures {
                    warn!(
                        error = %e,
                        kind = %e.kind(),
                        mail = %raw_mime,
                        "mail_processing_failed"
                    );
                }
                classify(e, raw_mime)
            }
        }
    }

    async fn dispatch(&self, outcome: ProcessingOutcome, raw_mime: &str) {
        match outcome {
            ProcessingOutcome::Accepted => {
                info!(mime_length = raw_mime.len(), "mail_processed");
            }
            ProcessingOutcome::Rejected {
                reason,
                template,
                template_args,
            } => {
                self.reject(reason, template, template_args, raw_mime).await;
            }
            ProcessingOutcome::AlertRequired { error, context } => {
                let timeout = self.settings.delivery_timeout;
                if tokio::time::timeout(timeout, self.alerts.report(&error, &context))
                    .await
                    .is_err()
                {
                    let message = format!("{:#}", error);
                    error!(
                        error = %message,
                        timeout_ms = timeout.as_millis() as u64,
                        "operator_alert_publish_failed"
                    );
                }
            }
        }
    }

    /// Tell the sender why their email was not processed.
    async fn reject(
        &self,
        reason: FailureKind,
        template: RejectionTemplate,
        template_args: TemplateArgs,
        raw_mime: &str,
    ) {
        let context = match RejectionContext::from_raw_mime(raw_mime, &self.settings.site_name) {
            Ok(c) => c,
            Err(e) => {
                error!(
                    error = %e,
                    reason = %reason,
                    template = %template,
                    "rejection_context_failed"
                );
                return;
            }
        };

        let notice = self.sender.send_rejection(
            template,
            &context.sender,
            context.template_args(template_args),
        );

        let timeout = self.settings.delivery_timeout;
        let delivered = match tokio::time::timeout(timeout, self.sender.deliver(notice)).await {
            Ok(result) => result,
            Err(_) => Err(anyhow::anyhow!(
                "Rejection delivery timed out after {:?}",
                timeout
            )),
        };

        match delivered {
            Ok(()) => info!(
                reason = %reason,
                template = %template,
                to = %context.sender,
                "rejection_sent"
            ),
            Err(e) => error!(
                error = %e,
                reason = %reason,
                template = %template,
                to = %context.sender,
                "rejection_delivery_failed"
            ),
        }
    }
}
