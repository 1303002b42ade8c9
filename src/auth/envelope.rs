//! Symmetric request/response signing.
//!
//! Requests carry their signature and timestamp in the `X-HMAC-Signature` and
//! `X-HMAC-Timestamp` headers next to a JSON body. Responses embed them in the
//! body as `{"data": .., "hmac": {"signature": .., "timestamp": ".."}}`.
//! Both sides sign `{<field>: payload, "timestamp": ts}` where the field is
//! `body` for requests and `data` for responses.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::canonical::{self, EnvelopeField};
use super::error::AuthError;
use super::replay;
use super::signature::{self, SignatureEncoding};

/// Request header carrying the hex signature.
pub const SIGNATURE_HEADER: &str = "X-HMAC-Signature";

/// Request header carrying the decimal millisecond timestamp.
pub const TIMESTAMP_HEADER: &str = "X-HMAC-Timestamp";

/// A payload bundled with its timestamp and signature.
#[derive(Debug, Clone, PartialEq)]
pub struct SignedEnvelope {
    field: EnvelopeField,
    payload: Value,
    timestamp: i64,
    signature: String,
}

impl SignedEnvelope {
    pub fn payload(&self) -> &Value {
        &self.payload
    }

    pub fn timestamp(&self) -> i64 {
        self.timestamp
    }

    pub fn signature(&self) -> &str {
        &self.signature
    }

    pub fn field(&self) -> EnvelopeField {
        self.field
    }

    pub fn into_payload(self) -> Value {
        self.payload
    }

    /// Header pairs for the request convention.
    pub fn to_headers(&self) -> [(&'static str, String); 2] {
        [
            (SIGNATURE_HEADER, self.signature.clone()),
            (TIMESTAMP_HEADER, self.timestamp.to_string()),
        ]
    }

    /// Body for the response convention.
    pub fn into_response_body(self) -> ResponseBody {
        ResponseBody {
            data: self.payload,
            hmac: ResponseSignature {
                signature: self.signature,
                timestamp: self.timestamp.to_string(),
            },
        }
    }
}

/// Wire shape of a signed response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseBody {
    pub data: Value,
    pub hmac: ResponseSignature,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseSignature {
    pub signature: String,
    pub timestamp: String,
}

fn seal(secret: &[u8], field: EnvelopeField, payload: Value, timestamp: i64) -> SignedEnvelope {
    let message = canonical::structured(field, &payload, timestamp);
    let signature = signature::sign(secret, &message, SignatureEncoding::Hex);
    SignedEnvelope {
        field,
        payload,
        timestamp,
        signature,
    }
}

/// Sign an outgoing request body.
pub fn sign_request(secret: &[u8], payload: Value, timestamp_ms: i64) -> SignedEnvelope {
    seal(secret, EnvelopeField::Body, payload, timestamp_ms)
}

/// Sign an outgoing response payload.
pub fn sign_response(secret: &[u8], payload: Value, timestamp_ms: i64) -> SignedEnvelope {
    seal(secret, EnvelopeField::Data, payload, timestamp_ms)
}

fn open(
    secret: &[u8],
    field: EnvelopeField,
    payload: Value,
    candidate: &str,
    timestamp: i64,
    now_ms: i64,
) -> Result<SignedEnvelope, AuthError> {
    let message = canonical::structured(field, &payload, timestamp);
    if !signature::verify(secret, &message, candidate, SignatureEncoding::Hex) {
        return Err(AuthError::SignatureMismatch);
    }
    replay::enforce(timestamp, now_ms)?;

    Ok(SignedEnvelope {
        field,
        payload,
        timestamp,
        signature: candidate.to_string(),
    })
}

fn require_signature(raw: Option<&str>) -> Result<&str, AuthError> {
    raw.map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or(AuthError::MissingCredentials("signature"))
}

fn parse_payload(body: &[u8]) -> Result<Value, AuthError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Null);
    }
    serde_json::from_slice(body).map_err(|e| AuthError::MalformedPayload(e.to_string()))
}

/// Verify a request signed with the header convention.
///
/// An empty body is treated as JSON `null`.
pub fn verify_request(
    secret: &[u8],
    signature_header: Option<&str>,
    timestamp_header: Option<&str>,
    body: &[u8],
    now_ms: i64,
) -> Result<SignedEnvelope, AuthError> {
    let candidate = require_signature(signature_header)?;
    let timestamp = replay::parse_timestamp(timestamp_header)?;
    let payload = parse_payload(body)?;
    open(secret, EnvelopeField::Body, payload, candidate, timestamp, now_ms)
}

#[derive(Deserialize)]
struct ReceivedResponse {
    #[serde(default)]
    data: Value,
    hmac: Option<ReceivedSignature>,
}

#[derive(Deserialize)]
struct ReceivedSignature {
    signature: Option<String>,
    timestamp: Option<Value>,
}

fn timestamp_field(value: Option<&Value>) -> Result<i64, AuthError> {
    match value {
        None | Some(Value::Null) => replay::parse_timestamp(None),
        Some(Value::String(s)) => replay::parse_timestamp(Some(s.as_str())),
        Some(Value::Number(n)) => n
            .as_i64()
            .ok_or_else(|| AuthError::MalformedTimestamp(n.to_string())),
        Some(other) => Err(AuthError::MalformedTimestamp(other.to_string())),
    }
}

/// Verify a response signed with the embedded convention, returning the
/// envelope whose payload is the `data` field.
pub fn verify_response(secret: &[u8], body: &[u8], now_ms: i64) -> Result<SignedEnvelope, AuthError> {
    let received: ReceivedResponse =
        serde_json::from_slice(body).map_err(|e| AuthError::MalformedPayload(e.to_string()))?;
    let hmac = received
        .hmac
        .ok_or(AuthError::MissingCredentials("signature"))?;
    let candidate = require_signature(hmac.signature.as_deref())?.to_string();
    let timestamp = timestamp_field(hmac.timestamp.as_ref())?;
    open(secret, EnvelopeField::Data, received.data, &candidate, timestamp, now_ms)
}

/// Whether inbound requests with this method must carry a valid envelope.
///
/// Read-only methods are exempt.
pub fn requires_envelope(method: &str) -> bool {
    !matches!(
        method.to_ascii_uppercase().as_str(),
        "GET" | "HEAD" | "OPTIONS"
    )
}
