//! HMAC-SHA256 signatures on the upload completion callback.
//!
//! The storage service signs each callback with a secret shared with this service:
//! - Signature is computed over: `{timestamp}.{raw body}`
//! - The signature is base64-encoded HMAC-SHA256, prefixed with its version: `v1,{signature}`
//! - Headers: `x-upload-timestamp` (unix seconds), `x-upload-signature`
//!
//! The signature header may carry several space-separated signatures while a secret is rotated;
//! the callback is accepted when any of them matches.

use std::time::Duration;

use axum::http::HeaderMap;
use base64::{Engine, engine::general_purpose::STANDARD as BASE64_STANDARD};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

pub const TIMESTAMP_HEADER: &str = "x-upload-timestamp";
pub const SIGNATURE_HEADER: &str = "x-upload-signature";

#[derive(Error, Debug, PartialEq, Eq)]
pub enum SignatureError {
    #[error("Missing {0} header")]
    MissingHeader(&'static str),

    #[error("Invalid x-upload-timestamp header")]
    InvalidTimestamp,

    #[error("Callback timestamp is outside the allowed tolerance")]
    Expired,

    #[error("Invalid callback signature")]
    Mismatch,
}

/// Sign a callback payload.
///
/// Returns the signature in format `v1,{base64-hmac-sha256}`.
pub fn sign_payload(timestamp: i64, payload: &[u8], secret: &str) -> Option<String> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).ok()?;
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(payload);
    let signature = mac.finalize().into_bytes();

    Some(format!("v1,{}", BASE64_STANDARD.encode(signature)))
}

/// Verify a signature header value against a payload.
pub fn verify_signature(timestamp: i64, payload: &[u8], signature: &str, secret: &str) -> bool {
    let Some(expected) = sign_payload(timestamp, payload, secret) else {
        return false;
    };
    let Some(expected_value) = expected.strip_prefix("v1,") else {
        return false;
    };

    signature
        .split_whitespace()
        .filter_map(|candidate| candidate.strip_prefix("v1,"))
        .any(|candidate| constant_time_eq(candidate.as_bytes(), expected_value.as_bytes()))
}

/// Check the signature headers of a callback request.
///
/// `now` is the current unix time in seconds.
pub fn verify_headers(headers: &HeaderMap, payload: &[u8], secret: &str, tolerance: Duration, now: i64) -> Result<(), SignatureError> {
    let timestamp = headers
        .get(TIMESTAMP_HEADER)
        .ok_or(SignatureError::MissingHeader(TIMESTAMP_HEADER))?
        .to_str()
        .ok()
        .and_then(|value| value.trim().parse::<i64>().ok())
        .ok_or(SignatureError::InvalidTimestamp)?;

    let signature = headers
        .get(SIGNATURE_HEADER)
        .ok_or(SignatureError::MissingHeader(SIGNATURE_HEADER))?
        .to_str()
        .map_err(|_| SignatureError::Mismatch)?;

    if now.abs_diff(timestamp) > tolerance.as_secs() {
        return Err(SignatureError::Expired);
    }

    if !verify_signature(timestamp, payload, signature, secret) {
        return Err(SignatureError::Mismatch);
    }

    Ok(())
}

/// Constant-time byte comparison to prevent timing attacks.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        result |= x ^ y;
    }
    result == 0
}
