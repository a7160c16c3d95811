//! Outcome of a single processing attempt.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::error::FailureKind;

/// Named arguments handed to a rejection template.
pub type TemplateArgs = BTreeMap<String, String>;

/// Template argument keys understood by the rejection templates.
pub const ARG_FORMER_TITLE: &str = "former_title";
pub const ARG_DESTINATION: &str = "destination";
pub const ARG_SITE_NAME: &str = "site_name";
pub const ARG_POST_ERROR: &str = "post_error";

/// Rejection notice templates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectionTemplate {
    EmailRejectTrustLevel,
    EmailRejectNoAccount,
    EmailRejectEmpty,
    EmailRejectParsing,
    EmailRejectReplyKey,
    EmailRejectDestination,
    EmailRejectTopicNotFound,
    EmailRejectTopicClosed,
    EmailRejectAutoGenerated,
    EmailRejectInvalidAccess,
    EmailRejectPostError,
    EmailRejectPostErrorSpecified,
}

impl RejectionTemplate {
    pub fn as_str(self) -> &'static str {
        match self {
            RejectionTemplate::EmailRejectTrustLevel => "email_reject_trust_level",
            RejectionTemplate::EmailRejectNoAccount => "email_reject_no_account",
            RejectionTemplate::EmailRejectEmpty => "email_reject_empty",
            RejectionTemplate::EmailRejectParsing => "email_reject_parsing",
            RejectionTemplate::EmailRejectReplyKey => "email_reject_reply_key",
            RejectionTemplate::EmailRejectDestination => "email_reject_destination",
            RejectionTemplate::EmailRejectTopicNotFound => "email_reject_topic_not_found",
            RejectionTemplate::EmailRejectTopicClosed => "email_reject_topic_closed",
            RejectionTemplate::EmailRejectAutoGenerated => "email_reject_auto_generated",
            RejectionTemplate::EmailRejectInvalidAccess => "email_reject_invalid_access",
            RejectionTemplate::EmailRejectPostError => "email_reject_post_error",
            RejectionTemplate::EmailRejectPostErrorSpecified => {
                "email_reject_post_error_specified"
            }
        }
    }
}

impl fmt::Display for RejectionTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What happened to an email that made it past the gate.
#[derive(Debug)]
pub enum ProcessingOutcome {
    /// Processed successfully; nothing else to do.
    Accepted,
    /// The sender gets a rejection notice rendered from `template`.
    Rejected {
        reason: FailureKind,
        template: RejectionTemplate,
        template_args: TemplateArgs,
    },
    /// Unrecognized failure; operators are alerted, the sender hears nothing.
    AlertRequired {
        error: anyhow::Error,
        context: BTreeMap<String, String>,
    },
}

impl ProcessingOutcome {
    /// Short label used in logs and in the webhook response body.
    pub fn label(&self) -> &'static str {
        match self {
            ProcessingOutcome::Accepted => "accepted",
            ProcessingOutcome::Rejected { .. } => "rejected",
            ProcessingOutcome::AlertRequired { .. } => "alerted",
        }
    }
}
