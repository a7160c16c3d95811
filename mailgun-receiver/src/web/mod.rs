//! Web server module for the Mailgun inbound webhook.
//!
//! This module provides the HTTP surface:
//! - `GET /health` for liveness probes
//! - `POST {mount}/mime` for Mailgun routes forwarding full MIME messages

pub mod gate;
pub mod handlers;
pub mod signature;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

pub use gate::{DeliveryGate, GateRejection};
pub use handlers::{health, mime_webhook, AppState, HealthResponse, MimeForm, WebhookResponse};
pub use signature::{compute_signature, is_timestamp_fresh, verify_mailgun_signature};

/// Build the application router with the Mailgun routes nested under the
/// configured mount path.
pub fn router(state: AppState) -> Router {
    let mailgun = Router::new().route("/mime", post(mime_webhook));

    Router::new()
        .route("/health", get(health))
        .nest(&state.config.mount_path, mailgun)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
