//! `reqseal verify`: check a signature from the command line.

use anyhow::{anyhow, Result};
use clap::{Args, Subcommand};

use crate::auth::proxy::DEFAULT_IDENTITY_PARAM;
use crate::auth::{
    current_timestamp_ms, verify_proxy, verify_request, verify_response, verify_webhook,
    AuthError, ProxyQuery, WebhookMessage,
};
use crate::config::SecretArgs;

#[derive(Args)]
pub struct VerifyArgs {
    #[command(subcommand)]
    pub command: VerifyCommands,
}

#[derive(Subcommand)]
pub enum VerifyCommands {
    /// Verify a request body against its signature and timestamp headers
    Request {
        /// JSON body exactly as sent
        #[arg(long)]
        payload: String,

        /// Value of X-HMAC-Signature
        #[arg(long)]
        signature: String,

        /// Value of X-HMAC-Timestamp
        #[arg(long)]
        timestamp: String,

        #[command(flatten)]
        secrets: SecretArgs,
    },
    /// Verify a signed response body
    Response {
        /// Response JSON
        #[arg(long)]
        body: String,

        #[command(flatten)]
        secrets: SecretArgs,
    },
    /// Verify a forwarded query string
    Query {
        /// Full query string including the signature
        #[arg(long)]
        query: String,

        /// Parameter holding the tenant identity
        #[arg(long, default_value = DEFAULT_IDENTITY_PARAM)]
        identity_param: String,

        #[command(flatten)]
        secrets: SecretArgs,
    },
    /// Verify a webhook body against its base64 signature
    Webhook {
        /// Raw body
        #[arg(long)]
        body: String,

        /// Signature header value
        #[arg(long)]
        signature: String,

        #[command(flatten)]
        secrets: SecretArgs,
    },
}

/// Run the verify command. Fails when the signature does not check out.
pub fn run_verify(args: VerifyArgs) -> Result<()> {
    let summary = check(args.command).map_err(|e| anyhow!("Invalid ({}): {}", e.kind(), e))?;
    println!("Valid: {}", summary);
    Ok(())
}

fn check(command: VerifyCommands) -> Result<String, AuthError> {
    let now = current_timestamp_ms();
    match command {
        VerifyCommands::Request {
            payload,
            signature,
            timestamp,
            secrets,
        } => {
            let envelope = verify_request(
                secrets.envelope()?.as_bytes(),
                Some(&signature),
                Some(&timestamp),
                payload.as_bytes(),
                now,
            )?;
            Ok(format!("request signed at {}", envelope.timestamp()))
        }
        VerifyCommands::Response { body, secrets } => {
            let envelope = verify_response(secrets.envelope()?.as_bytes(), body.as_bytes(), now)?;
            Ok(format!("response signed at {}", envelope.timestamp()))
        }
        VerifyCommands::Query {
            query,
            identity_param,
            secrets,
        } => {
            let query = ProxyQuery::from_query_string(&query)?;
            let verified = verify_proxy(secrets.proxy()?.as_bytes(), &query, &identity_param)?;
            Ok(match verified.identity {
                Some(identity) => format!("{}={}", identity_param, identity),
                None => format!("no {} parameter", identity_param),
            })
        }
        VerifyCommands::Webhook {
            body,
            signature,
            secrets,
        } => {
            let message = WebhookMessage::new(body.into_bytes(), Some(&signature))?;
            verify_webhook(secrets.webhook()?.as_bytes(), &message)?;
            Ok("webhook body".to_string())
        }
    }
}
