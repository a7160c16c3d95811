//! Mailgun Receiver - authenticated inbound-mail webhook.
//!
//! Mailgun routes forward inbound emails to `POST {mount}/mime`. The receiver
//! verifies the request signature, hands the raw MIME to the host
//! application's mail processor and turns any processing failure into either
//! a rejection notice for the sender or an alert for operators.
//!
//! ## Architecture
//!
//! ```text
//! Mailgun → DeliveryGate → Ingestor → MailProcessor
//!              │ 406          │ on failure: classify()
//!              ▼              ├→ rejection_notices queue → Mailer
//!           (no retry)        └→ operator_alerts queue   → Error tracking
//! ```

pub mod collab;
pub mod config;
pub mod ingest;
pub mod queue;
pub mod web;

#[cfg(test)]
mod testing;

// Re-export commonly used types
pub use collab::{
    AlertSink, HttpMailProcessor, MailProcessor, NotificationSender, QueueAlertSink,
    QueueNotificationSender,
};
pub use config::Config;
pub use ingest::{
    classify, FailureKind, InboundRequest, IngestSettings, Ingestor, ProcessingError,
    ProcessingOutcome, RejectionTemplate,
};
pub use queue::{OperatorAlert, Publisher, RejectionNotice, ALERT_QUEUE, REJECTION_QUEUE};
pub use web::{router, AppState, DeliveryGate};
