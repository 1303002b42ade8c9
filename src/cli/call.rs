//! `reqseal call`: send one signed request to a guard server.

use anyhow::{Context, Result};
use clap::Args;

use super::guard::SignedClient;
use crate::config::SecretArgs;

#[derive(Args)]
pub struct CallArgs {
    /// Path to request, e.g. /api/address
    pub path: String,

    /// Server root
    #[arg(long, default_value = "http://127.0.0.1:9800")]
    pub url: String,

    /// JSON payload; sends a signed POST when given, a GET otherwise
    #[arg(long)]
    pub payload: Option<String>,

    #[command(flatten)]
    pub secrets: SecretArgs,
}

/// Run the call command and print the verified response data.
pub fn run_call(args: CallArgs) -> Result<()> {
    let client = SignedClient::new(args.url, args.secrets.envelope()?)?;

    let data = match args.payload {
        Some(payload) => {
            let payload = serde_json::from_str(&payload).context("Payload is not valid JSON")?;
            client.post(&args.path, payload)?
        }
        None => client.get(&args.path)?,
    };

    println!("{}", serde_json::to_string_pretty(&data)?);
    Ok(())
}
