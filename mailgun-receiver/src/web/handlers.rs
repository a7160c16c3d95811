//! Webhook endpoint handlers.
//!
//! The mime handler only:
//! 1. Runs the delivery gate (406 on rejection, including bodies that are not
//!    a urlencoded form)
//! 2. Hands the email to the ingestor
//! 3. Returns 200 OK, whatever the processing outcome

use std::sync::Arc;

use axum::{
    extract::{rejection::FormRejection, Form, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::ingest::{InboundRequest, Ingestor};
use crate::web::gate::DeliveryGate;
use crate::Config;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub gate: DeliveryGate,
    pub ingestor: Ingestor,
}

impl AppState {
    pub fn new(config: Config, ingestor: Ingestor) -> Self {
        Self {
            gate: DeliveryGate::from_config(&config),
            config: Arc::new(config),
            ingestor,
        }
    }
}

// =============================================================================
// Health Check
// =============================================================================

/// Health check response.
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// Health check endpoint.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

// =============================================================================
// Mailgun MIME Webhook
// =============================================================================

/// Mailgun form payload for routes forwarding the full MIME message.
///
/// Field names use hyphens, which are aliased here. Every field defaults to
/// empty so a malformed post still reaches the gate and gets a 406.
#[derive(Debug, Default, Deserialize)]
pub struct MimeForm {
    #[serde(default, rename = "body-mime")]
    pub body_mime: String,
    #[serde(default)]
    pub token: String,
    #[serde(default)]
    pub timestamp: String,
    #[serde(default)]
    pub signature: String,
}

impl From<MimeForm> for InboundRequest {
    fn from(form: MimeForm) -> Self {
        InboundRequest {
            body_mime: form.body_mime,
            token: form.token,
            timestamp: form.timestamp,
            signature: form.signature,
        }
    }
}

/// Webhook response.
#[derive(Debug, Serialize)]
pub struct WebhookResponse {
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<&'static str>,
}

/// Mailgun MIME webhook endpoint.
pub async fn mime_webhook(
    State(state): State<AppState>,
    form: Result<Form<MimeForm>, FormRejection>,
) -> impl IntoResponse {
    // Anything that does not decode as the form is unauthenticated by definition
    let form = match form {
        Ok(Form(form)) => form,
        Err(rejection) => {
            warn!(
                error = %rejection,
                extractor_status = rejection.status().as_u16(),
                "mailgun_mime_malformed"
            );
            return (
                StatusCode::NOT_ACCEPTABLE,
                Json(WebhookResponse {
                    status: "not_acceptable",
                    reason: Some("malformed_form"),
                }),
            );
        }
    };

    info!(
        mime_length = form.body_mime.len(),
        has_signature = !form.signature.is_empty(),
        timestamp = %form.timestamp,
        "mailgun_mime_received"
    );

    let request = InboundRequest::from(form);

    if let Err(rejection) = state.gate.check(&request) {
        return (
            rejection.status(),
            Json(WebhookResponse {
                status: "not_acceptable",
                reason: Some(rejection.as_str()),
            }),
        );
    }

    let report = state.ingestor.handle(&request).await;

    info!(outcome = report.outcome, "mailgun_mime_handled");

    (
        report.status,
        Json(WebhookResponse {
            status: report.outcome,
            reason: None,
        }),
    )
}
