//! Rejection kinds shared by every verification protocol.

use thiserror::Error;

/// Why a request failed authentication.
///
/// The variants are for operators. Callers on the other side of the trust
/// boundary only ever see [`UNAUTHORIZED_MESSAGE`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    /// A secret is missing at startup. Fatal.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A required signature or timestamp field is absent.
    #[error("Missing credentials: {0}")]
    MissingCredentials(&'static str),

    /// The timestamp is present but is not an integer.
    #[error("Malformed timestamp: {0:?}")]
    MalformedTimestamp(String),

    /// The timestamp parsed but lies outside the replay window.
    #[error("Timestamp outside replay window (drift: {drift_ms}ms)")]
    ExpiredTimestamp { drift_ms: i64 },

    /// Computed and supplied signatures differ.
    #[error("Signature verification failed")]
    SignatureMismatch,

    /// The body could not be decoded into the expected structure.
    #[error("Malformed payload: {0}")]
    MalformedPayload(String),
}

impl AuthError {
    /// Stable label for log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            AuthError::Configuration(_) => "configuration",
            AuthError::MissingCredentials(_) => "missing_credentials",
            AuthError::MalformedTimestamp(_) => "malformed_timestamp",
            AuthError::ExpiredTimestamp { .. } => "expired_timestamp",
            AuthError::SignatureMismatch => "signature_mismatch",
            AuthError::MalformedPayload(_) => "malformed_payload",
        }
    }

    /// Only configuration errors stop the process; everything else is a
    /// rejected request.
    pub fn is_fatal(&self) -> bool {
        matches!(self, AuthError::Configuration(_))
    }
}

/// The single message returned to callers for any rejection.
pub const UNAUTHORIZED_MESSAGE: &str = "unauthorized";
