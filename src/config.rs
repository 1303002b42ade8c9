//! Runtime configuration.
//!
//! Secrets come from command-line flags or the environment (optionally
//! populated from a `.env` file). They are loaded once at startup and never
//! change afterwards; a missing secret stops the process before it accepts
//! any traffic.

use anyhow::{Context, Result};
use clap::Args;
use std::fmt;
use std::net::SocketAddr;
use std::path::Path;

use crate::auth::proxy::DEFAULT_IDENTITY_PARAM;
use crate::auth::webhook::DEFAULT_SIGNATURE_HEADER;
use crate::auth::AuthError;

/// Default listen address for the guard server.
pub const DEFAULT_LISTEN: &str = "127.0.0.1:9800";

/// Shared secret for one trust boundary. Never printed.
#[derive(Clone, PartialEq, Eq)]
pub struct Secret(Vec<u8>);

impl Secret {
    /// Wrap a configured value. Absent and empty values are configuration
    /// errors naming the missing setting.
    pub fn from_setting(name: &str, value: Option<&str>) -> Result<Self, AuthError> {
        match value {
            Some(v) if !v.is_empty() => Ok(Self(v.as_bytes().to_vec())),
            _ => Err(AuthError::Configuration(format!("{} is not set", name))),
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Secret(<{} bytes>)", self.0.len())
    }
}

/// Secret flags shared by every subcommand that signs or verifies.
#[derive(Args, Debug, Clone, Default)]
pub struct SecretArgs {
    /// Secret for request/response envelopes
    #[arg(long, env = "ENVELOPE_SECRET", hide_env_values = true)]
    pub envelope_secret: Option<String>,

    /// Secret shared with the upstream forwarder
    #[arg(long, env = "PROXY_SECRET", hide_env_values = true)]
    pub proxy_secret: Option<String>,

    /// Secret used by the webhook sender
    #[arg(long, env = "WEBHOOK_SECRET", hide_env_values = true)]
    pub webhook_secret: Option<String>,
}

impl SecretArgs {
    pub fn envelope(&self) -> Result<Secret, AuthError> {
        Secret::from_setting("ENVELOPE_SECRET", self.envelope_secret.as_deref())
    }

    pub fn proxy(&self) -> Result<Secret, AuthError> {
        Secret::from_setting("PROXY_SECRET", self.proxy_secret.as_deref())
    }

    pub fn webhook(&self) -> Result<Secret, AuthError> {
        Secret::from_setting("WEBHOOK_SECRET", self.webhook_secret.as_deref())
    }
}

/// Flags for `serve`.
#[derive(Args, Debug, Clone)]
pub struct ServeArgs {
    /// Address to listen on
    #[arg(long, env = "LISTEN", default_value = DEFAULT_LISTEN)]
    pub listen: SocketAddr,

    #[command(flatten)]
    pub secrets: SecretArgs,

    /// Header carrying the base64 webhook signature
    #[arg(long, env = "WEBHOOK_HEADER", default_value = DEFAULT_SIGNATURE_HEADER)]
    pub webhook_header: String,

    /// Query parameter carrying the tenant identity on proxied requests
    #[arg(long, env = "PROXY_IDENTITY_PARAM", default_value = DEFAULT_IDENTITY_PARAM)]
    pub proxy_identity_param: String,

    /// Reject proxied requests whose `timestamp` parameter is older than this
    /// many seconds (unset: no check)
    #[arg(long, env = "PROXY_MAX_AGE_SECS")]
    pub proxy_max_age_secs: Option<u64>,
}

/// Validated server configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub listen: SocketAddr,
    pub envelope_secret: Secret,
    pub proxy_secret: Secret,
    pub webhook_secret: Secret,
    /// Stored lowercase; header lookup is case-insensitive.
    pub webhook_header: String,
    pub proxy_identity_param: String,
    pub proxy_max_age_secs: Option<u64>,
}

impl Config {
    /// Validate flags into a configuration. Every secret must be present.
    pub fn from_args(args: &ServeArgs) -> Result<Self, AuthError> {
        let webhook_header = args.webhook_header.trim().to_lowercase();
        if webhook_header.is_empty() {
            return Err(AuthError::Configuration(
                "WEBHOOK_HEADER must not be empty".to_string(),
            ));
        }

        Ok(Self {
            listen: args.listen,
            envelope_secret: args.secrets.envelope()?,
            proxy_secret: args.secrets.proxy()?,
            webhook_secret: args.secrets.webhook()?,
            webhook_header,
            proxy_identity_param: args.proxy_identity_param.clone(),
            proxy_max_age_secs: args.proxy_max_age_secs,
        })
    }
}

/// Populate the environment from an env file before flags are parsed.
///
/// With no explicit path a `.env` in the working directory is used when
/// present. Variables already set in the environment win.
pub fn load_env_file(path: Option<&Path>) -> Result<()> {
    match path {
        Some(path) => {
            dotenvy::from_path(path)
                .with_context(|| format!("Failed to load env file {}", path.display()))?;
        }
        None => {
            let _ = dotenvy::dotenv();
        }
    }
    Ok(())
}
