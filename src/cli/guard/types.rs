//! Request and response types for the guard server.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

use crate::auth::{SignedEnvelope, VerifiedProxy};

/// Body returned for every rejected or failed request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            success: false,
            error: message.into(),
        }
    }
}

/// Health check payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthStatus {
    /// Service status
    pub status: String,
    /// Uptime in seconds
    pub uptime_secs: u64,
    /// Crate version
    pub version: String,
}

/// A parsed HTTP/1.1 request.
#[derive(Debug, Clone, Default)]
pub struct HttpRequest {
    pub method: String,
    pub path: String,
    pub query: Option<String>,
    /// Lowercased names.
    pub headers: HashMap<String, String>,
    pub body: Vec<u8>,
}

impl HttpRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_lowercase()).map(String::as_str)
    }
}

/// Response ready to be written to the socket.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn json<T: Serialize>(status: u16, body: &T) -> Self {
        let body = serde_json::to_vec(body)
            .unwrap_or_else(|_| br#"{"success":false,"error":"internal error"}"#.to_vec());
        Self { status, body }
    }

    pub fn status_text(&self) -> &'static str {
        match self.status {
            200 => "OK",
            400 => "Bad Request",
            401 => "Unauthorized",
            404 => "Not Found",
            413 => "Payload Too Large",
            500 => "Internal Server Error",
            _ => "Unknown",
        }
    }
}

/// How a request earned the right to reach a handler.
#[derive(Debug, Clone, PartialEq)]
pub enum Trust {
    /// Read-only request; not authenticated.
    Exempt,
    /// Valid request envelope.
    Envelope(SignedEnvelope),
    /// Valid forwarder signature over the query. Only the query parameters
    /// and the identity are authenticated; the body arrives in
    /// [`VerifiedRequest::unverified_body`].
    Proxy(VerifiedProxy),
    /// Valid webhook signature over the raw body.
    Webhook,
}

/// What a handler sees once verification has passed.
#[derive(Debug, Clone, PartialEq)]
pub struct VerifiedRequest {
    pub method: String,
    pub path: String,
    pub trust: Trust,
    /// Parsed authenticated body. `null` when there is none, and always
    /// `null` for proxy requests.
    pub payload: Value,
    /// Raw body of a proxy request, which the forwarder does not sign.
    /// Empty for every other route.
    pub unverified_body: Vec<u8>,
}

impl VerifiedRequest {
    /// Tenant identity established by the forwarder, if any.
    pub fn identity(&self) -> Option<&str> {
        match &self.trust {
            Trust::Proxy(proxy) => proxy.identity.as_deref(),
            _ => None,
        }
    }
}
