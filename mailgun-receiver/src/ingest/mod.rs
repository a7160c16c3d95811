//! Ingestion of inbound emails and classification of processing failures.

pub mod classify;
pub mod error;
pub mod handler;
pub mod outcome;
pub mod rejection;

pub use classify::classify;
pub use error::{FailureKind, ProcessingError};
pub use handler::{HandleReport, IngestSettings, Ingestor};
pub use outcome::{ProcessingOutcome, RejectionTemplate, TemplateArgs};
pub use rejection::RejectionContext;

/// One inbound webhook request, as Mailgun posted it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundRequest {
    /// Raw MIME text of the email
    pub body_mime: String,
    pub token: String,
    pub timestamp: String,
    /// Hex-encoded HMAC-SHA256 signature
    pub signature: String,
}
