//! `reqseal sign`: produce signatures for each protocol.

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use serde_json::Value;

use crate::auth::{canonical, current_timestamp_ms, proxy, sign_request, sign_response, webhook};
use crate::config::SecretArgs;

#[derive(Args)]
pub struct SignArgs {
    #[command(subcommand)]
    pub command: SignCommands,
}

#[derive(Subcommand)]
pub enum SignCommands {
    /// Sign a request body; prints the two headers to send with it
    Request {
        /// JSON payload
        #[arg(long)]
        payload: String,

        /// Timestamp in ms (default: now)
        #[arg(long)]
        timestamp: Option<i64>,

        #[command(flatten)]
        secrets: SecretArgs,
    },
    /// Sign a response payload; prints the signed body
    Response {
        /// JSON payload
        #[arg(long)]
        payload: String,

        /// Timestamp in ms (default: now)
        #[arg(long)]
        timestamp: Option<i64>,

        #[command(flatten)]
        secrets: SecretArgs,
    },
    /// Sign query parameters as the forwarder would; prints the full query
    Query {
        /// Query string without the signature, e.g. "shop=demo.example.com&path_prefix=/apps/x"
        #[arg(long)]
        query: String,

        #[command(flatten)]
        secrets: SecretArgs,
    },
    /// Sign a raw webhook body; prints the base64 header value
    Webhook {
        /// Raw body, signed byte-for-byte
        #[arg(long)]
        body: String,

        #[command(flatten)]
        secrets: SecretArgs,
    },
}

/// Run the sign command.
pub fn run_sign(args: SignArgs) -> Result<()> {
    let output = match args.command {
        SignCommands::Request {
            payload,
            timestamp,
            secrets,
        } => request_headers(secrets.envelope()?.as_bytes(), &payload, timestamp)?,
        SignCommands::Response {
            payload,
            timestamp,
            secrets,
        } => response_body(secrets.envelope()?.as_bytes(), &payload, timestamp)?,
        SignCommands::Query { query, secrets } => signed_query(secrets.proxy()?.as_bytes(), &query),
        SignCommands::Webhook { body, secrets } => {
            webhook::sign_webhook(secrets.webhook()?.as_bytes(), body.as_bytes())
        }
    };
    println!("{}", output);
    Ok(())
}

fn parse_payload(payload: &str) -> Result<Value> {
    serde_json::from_str(payload).context("Payload is not valid JSON")
}

fn request_headers(secret: &[u8], payload: &str, timestamp: Option<i64>) -> Result<String> {
    let envelope = sign_request(
        secret,
        parse_payload(payload)?,
        timestamp.unwrap_or_else(current_timestamp_ms),
    );
    Ok(envelope
        .to_headers()
        .iter()
        .map(|(name, value)| format!("{}: {}", name, value))
        .collect::<Vec<_>>()
        .join("\n"))
}

fn response_body(secret: &[u8], payload: &str, timestamp: Option<i64>) -> Result<String> {
    let envelope = sign_response(
        secret,
        parse_payload(payload)?,
        timestamp.unwrap_or_else(current_timestamp_ms),
    );
    Ok(serde_json::to_string_pretty(&envelope.into_response_body())?)
}

fn signed_query(secret: &[u8], query: &str) -> String {
    let query = query.strip_prefix('?').unwrap_or(query);
    let params = canonical::collect_params(url::form_urlencoded::parse(query.as_bytes()));
    let signature = proxy::sign_params(secret, &params);
    if query.is_empty() {
        format!("{}={}", proxy::SIGNATURE_PARAM, signature)
    } else {
        format!("{}&{}={}", query, proxy::SIGNATURE_PARAM, signature)
    }
}
