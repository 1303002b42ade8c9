use clap::Parser;
use std::path::PathBuf;
use tracing::error;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use reqseal::auth::generate_secret;
use reqseal::cli::{run_call, run_serve, run_sign, run_verify, Cli, Commands};
use reqseal::config::load_env_file;
use reqseal::AuthError;

fn main() -> anyhow::Result<()> {
    // Env file first so clap sees its values
    let env_file = std::env::var_os("REQSEAL_ENV_FILE").map(PathBuf::from);
    load_env_file(env_file.as_deref())?;

    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("reqseal={},info", cli.log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let result = match cli.command {
        Commands::Serve(args) => run_serve(args),
        Commands::Sign(args) => run_sign(args),
        Commands::Verify(args) => run_verify(args),
        Commands::Call(args) => run_call(args),
        Commands::GenerateSecret => {
            println!("{}", generate_secret());
            Ok(())
        }
    };

    if let Err(e) = result {
        if log_if_fatal(&e) {
            std::process::exit(1);
        }
        return Err(e);
    }
    Ok(())
}

/// Log a fatal configuration error. Returns whether it was one, in which case
/// the caller exits without printing it again.
fn log_if_fatal(e: &anyhow::Error) -> bool {
    let fatal = e.downcast_ref::<AuthError>().is_some_and(AuthError::is_fatal);
    if fatal {
        error!("{}", e);
    }
    fatal
}
