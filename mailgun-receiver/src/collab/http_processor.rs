//! Mail processor backed by the host application's HTTP endpoint.
//!
//! The raw MIME is posted as `message/rfc822`. A `422` response carries a JSON
//! body naming the failure, e.g. `{"error": "topic_closed"}` or
//! `{"error": "invalid_post", "message": "Body is too short"}`.

use std::time::Duration;

use anyhow::{anyhow, Context};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tracing::{info, warn};

use super::MailProcessor;
use crate::ingest::ProcessingError;
use crate::Config;

/// Failure body returned by the processor endpoint.
#[derive(Debug, Deserialize)]
struct FailureBody {
    error: String,
    #[serde(default)]
    message: String,
}

/// Forwards raw emails to the host application's mail processor.
#[derive(Clone)]
pub struct HttpMailProcessor {
    client: Client,
    url: String,
    timeout: Duration,
}

impl HttpMailProcessor {
    pub fn new(client: Client, url: String, timeout: Duration) -> Self {
        Self {
            client,
            url,
            timeout,
        }
    }

    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let client = Client::builder()
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self::new(
            client,
            config.mail_processor_url.clone(),
            Duration::from_millis(config.mail_processor_timeout_ms),
        ))
    }
}

#[async_trait]
impl MailProcessor for HttpMailProcessor {
    async fn process(&self, raw_mime: &str) -> Result<(), ProcessingError> {
        info!(
            url = %self.url,
            mime_length = raw_mime.len(),
            "mail_processor_request_starting"
        );

        let response = self
            .client
            .post(&self.url)
            .timeout(self.timeout)
            .header(reqwest::header::CONTENT_TYPE, "message/rfc822")
            .body(raw_mime.to_string())
            .send()
            .await
            .context("Mail processor request failed")?;

        let status = response.status();
        if status.is_success() {
            info!(status_code = status.as_u16(), "mail_processor_request_complete");
            return Ok(());
        }

        let body = response
            .text()
            .await
            .context("Failed to read mail processor response")?;

        warn!(
            status_code = status.as_u16(),
            body_preview = %truncate(&body, 200),
            "mail_processor_request_failed"
        );

        Err(failure_from_response(status, &body))
    }
}

/// Map a non-success processor response to a processing error.
fn failure_from_response(status: StatusCode, body: &str) -> ProcessingError {
    if status != StatusCode::UNPROCESSABLE_ENTITY {
        return anyhow!("Mail processor responded with {}", status).into();
    }

    let failure: FailureBody = match serde_json::from_str(body) {
        Ok(f) => f,
        Err(e) => {
            return anyhow!(e)
                .context("Mail processor returned an unreadable failure body")
                .into()
        }
    };

    match failure.error.as_str() {
        "insufficient_trust_level" => ProcessingError::InsufficientTrustLevel,
        "user_not_found" => ProcessingError::UserNotFound,
        "empty_email" => ProcessingError::EmptyEmail,
        "unparsable" => ProcessingError::Unparsable,
        "email_log_not_found" => ProcessingError::EmailLogNotFound,
        "bad_destination_address" => ProcessingError::BadDestinationAddress,
        "topic_not_found" => ProcessingError::TopicNotFound,
        "topic_closed" => ProcessingError::TopicClosed,
        "auto_generated" => ProcessingError::AutoGenerated,
        "invalid_access" => ProcessingError::InvalidAccess,
        "rollback" => ProcessingError::Rollback,
        "invalid_post" => ProcessingError::InvalidPost(failure.message),
        other => anyhow!(
            "Mail processor reported unknown failure '{}': {}",
            other,
            failure.message
        )
        .into(),
    }
}

fn truncate(s: &str, max_chars: usize) -> String {
    s.chars().take(max_chars).collect()
}
