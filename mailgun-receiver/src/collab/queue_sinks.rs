//! Notice and alert collaborators backed by the RabbitMQ publisher.

use std::collections::BTreeMap;

use async_trait::async_trait;
use tracing::{error, warn};

use super::{AlertSink, NotificationSender};
use crate::queue::{OperatorAlert, Publisher, RejectionNotice};

/// Hands rejection notices to the mailer through the rejection_notices queue.
#[derive(Clone)]
pub struct QueueNotificationSender {
    publisher: Publisher,
}

impl QueueNotificationSender {
    pub fn new(publisher: Publisher) -> Self {
        Self { publisher }
    }
}

#[async_trait]
impl NotificationSender for QueueNotificationSender {
    async fn deliver(&self, notice: RejectionNotice) -> anyhow::Result<()> {
        self.publisher.publish_rejection(&notice).await
    }
}

/// Logs unrecognized failures and publishes them to the operator_alerts queue.
#[derive(Clone)]
pub struct QueueAlertSink {
    publisher: Publisher,
}

impl QueueAlertSink {
    pub fn new(publisher: Publisher) -> Self {
        Self { publisher }
    }
}

#[async_trait]
impl AlertSink for QueueAlertSink {
    async fn report(&self, err: &anyhow::Error, context: &BTreeMap<String, String>) {
        let message = format!("{:#}", err);

        error!(
            error = %message,
            description = ?context.get("description"),
            "operator_alert"
        );

        let alert = OperatorAlert {
            error: message,
            context: context.clone(),
        };

        if let Err(e) = self.publisher.publish_alert(&alert).await {
            warn!(error = %e, "operator_alert_publish_failed");
        }
    }
}
