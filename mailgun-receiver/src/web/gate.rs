//! Delivery gate: preconditions checked before any processing happens.
//!
//! Every rejection maps to `406 Not Acceptable`, which tells Mailgun to stop
//! retrying the delivery. A disabled integration or a forged request will not
//! become acceptable on retry.

use axum::http::StatusCode;
use tracing::warn;

use crate::ingest::InboundRequest;
use crate::web::signature::{is_timestamp_fresh, verify_mailgun_signature};
use crate::Config;

/// Why a request was stopped at the gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateRejection {
    /// The integration is administratively disabled.
    Disabled,
    /// The signature did not match, or no API key is configured.
    InvalidSignature,
    /// The timestamp is outside the configured replay window.
    StaleTimestamp,
}

impl GateRejection {
    /// HTTP status returned for every gate rejection.
    pub fn status(self) -> StatusCode {
        StatusCode::NOT_ACCEPTABLE
    }

    pub fn as_str(self) -> &'static str {
        match self {
            GateRejection::Disabled => "disabled",
            GateRejection::InvalidSignature => "invalid_signature",
            GateRejection::StaleTimestamp => "stale_timestamp",
        }
    }
}

/// Precondition checks for inbound webhook requests.
#[derive(Debug, Clone)]
pub struct DeliveryGate {
    enabled: bool,
    api_key: Option<String>,
    max_age_seconds: Option<u64>,
}

impl DeliveryGate {
    pub fn new(enabled: bool, api_key: Option<String>, max_age_seconds: Option<u64>) -> Self {
        Self {
            enabled,
            api_key,
            max_age_seconds,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.mailgun_enabled,
            config.mailgun_api_key.clone(),
            config.mailgun_signature_max_age,
        )
    }

    /// Run the gate checks in order: enablement, signature, then replay window.
    pub fn check(&self, request: &InboundRequest) -> Result<(), GateRejection> {
        if !self.enabled {
            warn!("mailgun_received_while_disabled");
            return Err(GateRejection::Disabled);
        }

        let api_key = self.api_key.as_deref().unwrap_or_default();
        if !verify_mailgun_signature(
            api_key,
            &request.token,
            &request.timestamp,
            &request.signature,
        ) {
            warn!(
                api_key_configured = !api_key.is_empty(),
                "mailgun_token_unverified"
            );
            return Err(GateRejection::InvalidSignature);
        }

        if let Some(max_age) = self.max_age_seconds {
            if !is_timestamp_fresh(&request.timestamp, max_age) {
                warn!(timestamp = %request.timestamp, "mailgun_timestamp_rejected");
                return Err(GateRejection::StaleTimestamp);
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::web::signature::compute_signature;

    fn signed_request(secret: &str, token: &str, timestamp: &str) -> InboundRequest {
        InboundRequest {
            body_mime: "Subject: hi\r\n\r\nbody".to_string(),
            token: token.to_string(),
            timestamp: timestamp.to_string(),
            signature: compute_signature(secret, token, timestamp).unwrap(),
        }
    }

    #[test]
    fn test_disabled_rejects_valid_signature() {
        let gate = DeliveryGate::new(false, Some("s3cr3t".to_string()), None);
        let request = signed_request("s3cr3t", "abc", "1");

        assert_eq!(gate.check(&request), Err(GateRejection::Disabled));
    }

    #[test]
    fn test_disabled_rejects_invalid_signature() {
        let gate = DeliveryGate::new(false, Some("s3cr3t".to_string()), None);
        let request = signed_request("wrong", "abc", "1");

        assert_eq!(gate.check(&request), Err(GateRejection::Disabled));
    }

    #[test]
    fn test_enabled_rejects_invalid_signature() {
        let gate = DeliveryGate::new(true, Some("s3cr3t".to_string()), None);
        let request = signed_request("wrong", "abc", "1");

        assert_eq!(gate.check(&request), Err(GateRejection::InvalidSignature));
    }

    #[test]
    fn test_enabled_without_api_key_rejects() {
        let gate = DeliveryGate::new(true, None, None);
        let request = signed_request("s3cr3t", "abc", "1");

        assert_eq!(gate.check(&request), Err(GateRejection::InvalidSignature));
    }

    #[test]
    fn test_enabled_and_valid_passes() {
        let gate = DeliveryGate::new(true, Some("s3cr3t".to_string()), None);
        let request = signed_request("s3cr3t", "abc", "1");

        assert_eq!(gate.check(&request), Ok(()));
    }

    #[test]
    fn test_signed_empty_token_and_timestamp_pass() {
        let gate = DeliveryGate::new(true, Some("s3cr3t".to_string()), None);

        assert_eq!(gate.check(&signed_request("s3cr3t", "", "1")), Ok(()));
        assert_eq!(gate.check(&signed_request("s3cr3t", "abc", "")), Ok(()));
    }

    #[test]
    fn test_replay_window_rejects_stale_timestamp() {
        let gate = DeliveryGate::new(true, Some("s3cr3t".to_string()), Some(300));
        let request = signed_request("s3cr3t", "abc", "946684800");

        assert_eq!(gate.check(&request), Err(GateRejection::StaleTimestamp));
    }

    #[test]
    fn test_all_rejections_are_not_acceptable() {
        for rejection in [
            GateRejection::Disabled,
            GateRejection::InvalidSignature,
            GateRejection::StaleTimestamp,
        ] {
            assert_eq!(rejection.status(), StatusCode::NOT_ACCEPTABLE);
        }
    }
}
