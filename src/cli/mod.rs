use clap::{Parser, Subcommand};

pub mod call;
pub mod guard;
pub mod sign;
pub mod verify;

pub use call::{run_call, CallArgs};
pub use guard::run_serve;
pub use sign::{run_sign, SignArgs};
pub use verify::{run_verify, VerifyArgs};

use crate::config::ServeArgs;

#[derive(Parser)]
#[command(name = "reqseal")]
#[command(about = "HMAC request signing and verification at the trust boundary")]
#[command(version)]
pub struct Cli {
    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the verifying HTTP server
    Serve(ServeArgs),
    /// Compute a signature
    Sign(SignArgs),
    /// Check a signature
    Verify(VerifyArgs),
    /// Send a signed request and verify the response
    Call(CallArgs),
    /// Print a fresh random secret
    GenerateSecret,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_sign_query() {
        let cli = Cli::try_parse_from([
            "reqseal",
            "sign",
            "query",
            "--query",
            "shop=demo.example.com",
            "--proxy-secret",
            "p",
        ])
        .unwrap();
        match cli.command {
            Commands::Sign(SignArgs {
                command: sign::SignCommands::Query { query, secrets },
            }) => {
                assert_eq!(query, "shop=demo.example.com");
                assert_eq!(secrets.proxy_secret.as_deref(), Some("p"));
            }
            _ => panic!("expected sign query"),
        }
    }

    #[test]
    fn test_parse_generate_secret() {
        let cli = Cli::try_parse_from(["reqseal", "generate-secret", "--log-level", "debug"]).unwrap();
        assert!(matches!(cli.command, Commands::GenerateSecret));
        assert_eq!(cli.log_level, "debug");
    }
}
