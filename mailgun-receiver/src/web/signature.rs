//! Mailgun webhook signature verification.
//!
//! Mailgun signs webhook requests using HMAC-SHA256 keyed with the account's
//! API key.
//! Reference: https://documentation.mailgun.com/docs/mailgun/user-manual/events/webhooks/#securing-webhooks

use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::warn;

type HmacSha256 = Hmac<Sha256>;

/// Verify a Mailgun webhook signature.
///
/// Mailgun webhooks include three fields for signature verification:
/// - timestamp: Unix epoch seconds when the webhook was generated
/// - token: A randomly generated string
/// - signature: HMAC-SHA256 hex digest of timestamp + token
///
/// # Arguments
///
/// * `secret` - The Mailgun API key the request was signed with
/// * `token` - The 'token' field from the webhook payload
/// * `timestamp` - The 'timestamp' field from the webhook payload
/// * `signature` - The 'signature' field from the webhook payload
///
/// # Returns
///
/// `true` only if `signature` exactly matches the expected lowercase hex digest.
pub fn verify_mailgun_signature(
    secret: &str,
    token: &str,
    timestamp: &str,
    signature: &str,
) -> bool {
    // An empty key would let anyone compute a valid signature
    if secret.is_empty() || signature.is_empty() {
        warn!(
            has_secret = !secret.is_empty(),
            has_signature = !signature.is_empty(),
            "mailgun_signature_missing_fields"
        );
        return false;
    }

    let expected_signature = match compute_signature(secret, token, timestamp) {
        Some(s) => s,
        None => {
            warn!("mailgun_signature_invalid_key");
            return false;
        }
    };

    let valid = constant_time_compare(&expected_signature, signature);

    if !valid {
        warn!(
            expected_length = expected_signature.len(),
            actual_length = signature.len(),
            "mailgun_signature_mismatch"
        );
    }

    valid
}

/// Compute the hex signature Mailgun would send: HMAC-SHA256(secret, timestamp + token).
pub fn compute_signature(secret: &str, token: &str, timestamp: &str) -> Option<String> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).ok()?;
    mac.update(timestamp.as_bytes());
    mac.update(token.as_bytes());
    Some(hex::encode(mac.finalize().into_bytes()))
}

/// Check that a webhook timestamp lies within `max_age_seconds` of now.
///
/// Used as an optional replay window on top of the signature check.
pub fn is_timestamp_fresh(timestamp: &str, max_age_seconds: u64) -> bool {
    let webhook_time: u64 = match timestamp.parse() {
        Ok(t) => t,
        Err(_) => {
            warn!(timestamp = %timestamp, "mailgun_signature_invalid_timestamp");
            return false;
        }
    };

    let current_time = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs();

    let age = current_time.abs_diff(webhook_time);

    if age > max_age_seconds {
        warn!(
            webhook_time = webhook_time,
            current_time = current_time,
            age_seconds = age,
            max_age_seconds = max_age_seconds,
            "mailgun_signature_stale"
        );
        return false;
    }

    true
}

/// Constant-time string comparison to prevent timing attacks.
fn constant_time_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result = 0u8;
    for (x, y) in a.bytes().zip(b.bytes()) {
        result |= x ^ y;
    }
    result == 0
}
