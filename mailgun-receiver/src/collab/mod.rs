//! Collaborators the receiver hands work off to.
//!
//! The receiver owns none of mail parsing, post creation, notice rendering or
//! error tracking. It reaches them through these traits so the web layer can
//! be driven by real adapters in production and by fakes in tests.

pub mod http_processor;
pub mod queue_sinks;

use std::collections::BTreeMap;

use async_trait::async_trait;

use crate::ingest::{ProcessingError, RejectionTemplate, TemplateArgs};
use crate::queue::RejectionNotice;

pub use http_processor::HttpMailProcessor;
pub use queue_sinks::{QueueAlertSink, QueueNotificationSender};

/// Turns a raw MIME email into posts or replies.
#[async_trait]
pub trait MailProcessor: Send + Sync {
    async fn process(&self, raw_mime: &str) -> Result<(), ProcessingError>;
}

/// Renders and delivers rejection notices to senders.
#[async_trait]
pub trait NotificationSender: Send + Sync {
    /// Build the notice for `recipient` from a template and its arguments.
    fn send_rejection(
        &self,
        template: RejectionTemplate,
        recipient: &str,
        args: TemplateArgs,
    ) -> RejectionNotice {
        RejectionNotice::new(template, recipient, args)
    }

    /// Deliver a notice built by [`NotificationSender::send_rejection`].
    async fn deliver(&self, notice: RejectionNotice) -> anyhow::Result<()>;
}

/// Operator-facing error tracking.
#[async_trait]
pub trait AlertSink: Send + Sync {
    async fn report(&self, error: &anyhow::Error, context: &BTreeMap<String, String>);
}
