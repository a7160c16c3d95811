//! Queue message types for notices and alerts.
//!
//! The receiver does not render or send mail itself. Rejection notices and
//! operator alerts are published as JSON for downstream consumers:
//! - `rejection_notices` queue: notices to render and mail back to senders
//! - `operator_alerts` queue: unrecognized processing failures

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::ingest::{RejectionTemplate, TemplateArgs};

/// Queue name for rejection notices.
pub const REJECTION_QUEUE: &str = "rejection_notices";

/// Queue name for operator alerts.
pub const ALERT_QUEUE: &str = "operator_alerts";

/// A rejection notice ready to be rendered and delivered to the sender.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RejectionNotice {
    /// Template to render
    pub template: RejectionTemplate,
    /// Sender of the rejected email
    pub to: String,
    /// Template arguments
    pub args: TemplateArgs,
}

impl RejectionNotice {
    pub fn new(template: RejectionTemplate, to: impl Into<String>, args: TemplateArgs) -> Self {
        Self {
            template,
            to: to.into(),
            args,
        }
    }
}

/// An unrecognized processing failure escalated to operators.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperatorAlert {
    /// Error message including its cause chain
    pub error: String,
    /// Contextual information (raw MIME, description)
    #[serde(default)]
    pub context: BTreeMap<String, String>,
}
