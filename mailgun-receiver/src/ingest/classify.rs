//! Maps processing failures to an outcome.

use std::collections::BTreeMap;

use super::error::ProcessingError;
use super::outcome::{ProcessingOutcome, RejectionTemplate, TemplateArgs, ARG_POST_ERROR};

/// Validation messages shorter than this are not worth showing to the sender.
const MIN_SPECIFIED_POST_ERROR_CHARS: usize = 6;

/// Description attached to alerts for unrecognized failures.
pub const UNRECOGNIZED_ERROR_DESCRIPTION: &str =
    "Unrecognized error type when processing incoming email";

/// Classify a processing failure.
///
/// Known failures become a rejection notice for the sender. Anything else
/// requires an operator alert, with the raw MIME attached as context.
pub fn classify(error: ProcessingError, raw_mime: &str) -> ProcessingOutcome {
    let reason = error.kind();
    let mut template_args = TemplateArgs::new();

    let template = match error {
        ProcessingError::InsufficientTrustLevel => RejectionTemplate::EmailRejectTrustLevel,
        ProcessingError::UserNotFound => RejectionTemplate::EmailRejectNoAccount,
        ProcessingError::EmptyEmail => RejectionTemplate::EmailRejectEmpty,
        ProcessingError::Unparsable => RejectionTemplate::EmailRejectParsing,
        ProcessingError::EmailLogNotFound => RejectionTemplate::EmailRejectReplyKey,
        ProcessingError::BadDestinationAddress => RejectionTemplate::EmailRejectDestination,
        ProcessingError::TopicNotFound => RejectionTemplate::EmailRejectTopicNotFound,
        ProcessingError::TopicClosed => RejectionTemplate::EmailRejectTopicClosed,
        ProcessingError::AutoGenerated => RejectionTemplate::EmailRejectAutoGenerated,
        ProcessingError::InvalidAccess => RejectionTemplate::EmailRejectInvalidAccess,
        ProcessingError::Rollback => RejectionTemplate::EmailRejectPostError,
        ProcessingError::InvalidPost(message) => {
            if message.chars().count() < MIN_SPECIFIED_POST_ERROR_CHARS {
                RejectionTemplate::EmailRejectPostError
            } else {
                template_args.insert(ARG_POST_ERROR.to_string(), message);
                RejectionTemplate::EmailRejectPostErrorSpecified
            }
        }
        ProcessingError::Other(error) => {
            let mut context = BTreeMap::new();
            context.insert(
                "description".to_string(),
                UNRECOGNIZED_ERROR_DESCRIPTION.to_string(),
            );
            context.insert("mail".to_string(), raw_mime.to_string());
            return ProcessingOutcome::AlertRequired { error, context };
        }
    };

    ProcessingOutcome::Rejected {
        reason,
        template,
        template_args,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::error::FailureKind;

    const RAW: &str = "From: a@example.com\r\nSubject: hi\r\n\r\nbody";

    fn rejected_template(error: ProcessingError) -> (RejectionTemplate, TemplateArgs) {
        match classify(error, RAW) {
            ProcessingOutcome::Rejected {
                template,
                template_args,
                ..
            } => (template, template_args),
            other => panic!("Expected Rejected, got {:?}", other),
        }
    }

    #[test]
    fn test_known_failures_map_to_templates() {
        let cases = [
            (
                ProcessingError::InsufficientTrustLevel,
                RejectionTemplate::EmailRejectTrustLevel,
            ),
            (ProcessingError::UserNotFound, RejectionTemplate::EmailRejectNoAccount),
            (ProcessingError::EmptyEmail, RejectionTemplate::EmailRejectEmpty),
            (ProcessingError::Unparsable, RejectionTemplate::EmailRejectParsing),
            (ProcessingError::EmailLogNotFound, RejectionTemplate::EmailRejectReplyKey),
            (
                ProcessingError::BadDestinationAddress,
                RejectionTemplate::EmailRejectDestination,
            ),
            (ProcessingError::TopicNotFound, RejectionTemplate::EmailRejectTopicNotFound),
            (ProcessingError::TopicClosed, RejectionTemplate::EmailRejectTopicClosed),
            (ProcessingError::AutoGenerated, RejectionTemplate::EmailRejectAutoGenerated),
            (ProcessingError::InvalidAccess, RejectionTemplate::EmailRejectInvalidAccess),
            (ProcessingError::Rollback, RejectionTemplate::EmailRejectPostError),
        ];

        for (error, expected) in cases {
            let (template, args) = rejected_template(error);
            assert_eq!(template, expected);
            assert!(args.is_empty());
        }
    }

    #[test]
    fn test_reason_is_preserved() {
        match classify(ProcessingError::TopicClosed, RAW) {
            ProcessingOutcome::Rejected { reason, .. } => {
                assert_eq!(reason, FailureKind::TopicClosed)
            }
            other => panic!("Expected Rejected, got {:?}", other),
        }
    }

    #[test]
    fn test_short_invalid_post_message() {
        let (template, args) = rejected_template(ProcessingError::InvalidPost("nope".to_string()));

        assert_eq!(template, RejectionTemplate::EmailRejectPostError);
        assert!(!args.contains_key(ARG_POST_ERROR));
    }

    #[test]
    fn test_invalid_post_threshold_is_six_chars() {
        let (template, _) = rejected_template(ProcessingError::InvalidPost("12345".to_string()));
        assert_eq!(template, RejectionTemplate::EmailRejectPostError);

        let (template, args) =
            rejected_template(ProcessingError::InvalidPost("123456".to_string()));
        assert_eq!(template, RejectionTemplate::EmailRejectPostErrorSpecified);
        assert_eq!(args.get(ARG_POST_ERROR).map(String::as_str), Some("123456"));
    }

    #[test]
    fn test_invalid_post_threshold_counts_chars_not_bytes() {
        // Five characters, ten bytes
        let (template, _) = rejected_template(ProcessingError::InvalidPost("ééééé".to_string()));

        assert_eq!(template, RejectionTemplate::EmailRejectPostError);
    }

    #[test]
    fn test_unrecognized_error_requires_alert() {
        let error = ProcessingError::from(anyhow::anyhow!("connection reset"));

        match classify(error, RAW) {
            ProcessingOutcome::AlertRequired { error, context } => {
                assert_eq!(error.to_string(), "connection reset");
                assert_eq!(context.get("mail").map(String::as_str), Some(RAW));
                assert_eq!(
                    context.get("description").map(String::as_str),
                    Some(UNRECOGNIZED_ERROR_DESCRIPTION)
                );
            }
            other => panic!("Expected AlertRequired, got {:?}", other),
        }
    }
}
