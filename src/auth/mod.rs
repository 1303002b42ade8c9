//! Request authentication and integrity checks.
//!
//! Three protocols share one HMAC-SHA256 primitive:
//!
//! - [`envelope`]: symmetric signing of request bodies and response payloads
//!   with a replay window
//! - [`proxy`]: query parameters signed by a trusted forwarder
//! - [`webhook`]: base64 signature over a raw event body

pub mod canonical;
pub mod envelope;
mod error;
pub mod proxy;
pub mod replay;
pub mod signature;
pub mod webhook;

pub use canonical::EnvelopeField;
pub use envelope::{sign_request, sign_response, verify_request, verify_response, SignedEnvelope};
pub use error::{AuthError, UNAUTHORIZED_MESSAGE};
pub use proxy::{verify_proxy, ProxyQuery, VerifiedProxy};
pub use replay::{check_freshness, current_timestamp_ms, REPLAY_TOLERANCE_MS};
pub use signature::{generate_secret, SignatureEncoding};
pub use webhook::{verify_webhook, WebhookMessage};
