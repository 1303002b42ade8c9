//! Verification of third-party webhook deliveries.
//!
//! The sender signs the raw request body with HMAC-SHA256 and sends the
//! base64 MAC in a header. The body must be verified exactly as it arrived;
//! it is only parsed after the signature checks out.

use serde::de::DeserializeOwned;

use super::error::AuthError;
use super::signature::{self, SignatureEncoding};

/// Header carrying the base64 signature unless configured otherwise.
pub const DEFAULT_SIGNATURE_HEADER: &str = "X-Hmac-Sha256";

/// A webhook delivery as received: untouched body bytes plus the header value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebhookMessage {
    raw_body: Vec<u8>,
    header_signature: String,
}

impl WebhookMessage {
    pub fn new(raw_body: Vec<u8>, header_signature: Option<&str>) -> Result<Self, AuthError> {
        let header_signature = header_signature
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or(AuthError::MissingCredentials("signature"))?
            .to_string();
        Ok(Self {
            raw_body,
            header_signature,
        })
    }

    pub fn raw_body(&self) -> &[u8] {
        &self.raw_body
    }

    pub fn header_signature(&self) -> &str {
        &self.header_signature
    }
}

/// Compute the header value a sender attaches to `raw_body`.
pub fn sign_webhook(secret: &[u8], raw_body: &[u8]) -> String {
    signature::sign(secret, raw_body, SignatureEncoding::Base64)
}

/// Check the header signature against the raw body.
pub fn verify_webhook(secret: &[u8], message: &WebhookMessage) -> Result<(), AuthError> {
    if signature::verify(
        secret,
        &message.raw_body,
        &message.header_signature,
        SignatureEncoding::Base64,
    ) {
        Ok(())
    } else {
        Err(AuthError::SignatureMismatch)
    }
}

/// Verify, then decode the body into `T`.
pub fn parse_verified<T: DeserializeOwned>(
    secret: &[u8],
    message: &WebhookMessage,
) -> Result<T, AuthError> {
    verify_webhook(secret, message)?;
    serde_json::from_slice(&message.raw_body)
        .map_err(|e| AuthError::MalformedPayload(e.to_string()))
}
