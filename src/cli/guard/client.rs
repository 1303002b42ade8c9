//! HTTP client that signs requests and verifies signed responses.

use anyhow::{anyhow, Context, Result};
use reqwest::blocking::Client;
use serde_json::Value;
use std::time::Duration;

use super::types::HealthStatus;
use crate::auth::{current_timestamp_ms, sign_request, verify_response};
use crate::config::Secret;

/// Client side of the envelope protocol.
pub struct SignedClient {
    client: Client,
    base_url: String,
    secret: Secret,
}

impl SignedClient {
    /// Create a new client.
    ///
    /// # Arguments
    /// * `base_url` - Server root, e.g. `http://127.0.0.1:9800`
    /// * `secret` - Envelope secret shared with the server
    pub fn new(base_url: impl Into<String>, secret: Secret) -> Result<Self> {
        let client = Client::builder().timeout(Duration::from_secs(30)).build()?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            secret,
        })
    }

    /// POST a signed payload and return the verified response data.
    pub fn post(&self, path: &str, payload: Value) -> Result<Value> {
        let envelope = sign_request(self.secret.as_bytes(), payload, current_timestamp_ms());
        let body = serde_json::to_vec(envelope.payload())?;

        let mut req = self
            .client
            .post(format!("{}{}", self.base_url, path))
            .header("Content-Type", "application/json");
        for (name, value) in envelope.to_headers() {
            req = req.header(name, value);
        }

        let response = req.body(body).send()?;
        self.read_signed(response)
    }

    /// GET a read-only resource and return the verified response data.
    pub fn get(&self, path: &str) -> Result<Value> {
        let response = self
            .client
            .get(format!("{}{}", self.base_url, path))
            .send()?;
        self.read_signed(response)
    }

    /// Check that the server is reachable and signing with our secret.
    pub fn health_check(&self) -> Result<HealthStatus> {
        let data = self.get("/health")?;
        serde_json::from_value(data).context("Unexpected health payload")
    }

    fn read_signed(&self, response: reqwest::blocking::Response) -> Result<Value> {
        let status = response.status();
        let bytes = response.bytes()?;

        if !status.is_success() {
            return Err(anyhow!("Request failed with status: {}", status));
        }

        let envelope = verify_response(self.secret.as_bytes(), &bytes, current_timestamp_ms())
            .map_err(|e| anyhow!("Response failed verification: {}", e))?;
        Ok(envelope.into_payload())
    }
}
