//! Failures raised by the mail processing pipeline.

use std::fmt;

/// Error returned by a [`MailProcessor`](crate::collab::MailProcessor).
///
/// The named variants are the failures the receiver knows how to explain to
/// the sender. Everything else goes through [`ProcessingError::Other`] and is
/// escalated to operators instead.
#[derive(Debug, thiserror::Error)]
pub enum ProcessingError {
    #[error("sender does not have a sufficient trust level")]
    InsufficientTrustLevel,

    #[error("no account matches the sender")]
    UserNotFound,

    #[error("email body is empty")]
    EmptyEmail,

    #[error("email could not be parsed")]
    Unparsable,

    #[error("no email log matches the reply key")]
    EmailLogNotFound,

    #[error("destination address is not routable")]
    BadDestinationAddress,

    #[error("referenced topic does not exist")]
    TopicNotFound,

    #[error("referenced topic is closed")]
    TopicClosed,

    #[error("email was generated automatically")]
    AutoGenerated,

    #[error("sender is not allowed to create this content")]
    InvalidAccess,

    #[error("content creation was rolled back")]
    Rollback,

    #[error("{0}")]
    InvalidPost(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ProcessingError {
    /// The failure category of this error.
    pub fn kind(&self) -> FailureKind {
        match self {
            ProcessingError::InsufficientTrustLevel => FailureKind::InsufficientTrustLevel,
            ProcessingError::UserNotFound => FailureKind::UserNotFound,
            ProcessingError::EmptyEmail => FailureKind::EmptyEmail,
            ProcessingError::Unparsable => FailureKind::Unparsable,
            ProcessingError::EmailLogNotFound => FailureKind::EmailLogNotFound,
            ProcessingError::BadDestinationAddress => FailureKind::BadDestinationAddress,
            ProcessingError::TopicNotFound => FailureKind::TopicNotFound,
            ProcessingError::TopicClosed => FailureKind::TopicClosed,
            ProcessingError::AutoGenerated => FailureKind::AutoGenerated,
            ProcessingError::InvalidAccess => FailureKind::InvalidAccess,
            ProcessingError::Rollback => FailureKind::Rollback,
            ProcessingError::InvalidPost(_) => FailureKind::InvalidPost,
            ProcessingError::Other(_) => FailureKind::Unknown,
        }
    }
}

/// Failure categories of the processing pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    InsufficientTrustLevel,
    UserNotFound,
    EmptyEmail,
    Unparsable,
    EmailLogNotFound,
    BadDestinationAddress,
    TopicNotFound,
    TopicClosed,
    AutoGenerated,
    InvalidAccess,
    Rollback,
    InvalidPost,
    Unknown,
}

impl FailureKind {
    /// Wire name used by the host application's processor endpoint.
    pub fn as_str(self) -> &'static str {
        match self {
            FailureKind::InsufficientTrustLevel => "insufficient_trust_level",
            FailureKind::UserNotFound => "user_not_found",
            FailureKind::EmptyEmail => "empty_email",
            FailureKind::Unparsable => "unparsable",
            FailureKind::EmailLogNotFound => "email_log_not_found",
            FailureKind::BadDestinationAddress => "bad_destination_address",
            FailureKind::TopicNotFound => "topic_not_found",
            FailureKind::TopicClosed => "topic_closed",
            FailureKind::AutoGenerated => "auto_generated",
            FailureKind::InvalidAccess => "invalid_access",
            FailureKind::Rollback => "rollback",
            FailureKind::InvalidPost => "invalid_post",
            FailureKind::Unknown => "unknown",
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
