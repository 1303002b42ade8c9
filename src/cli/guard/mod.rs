//! Guard server and signing client.
//!
//! The server sits at the trust boundary: it verifies envelopes, forwarder
//! signatures and webhook signatures, then hands the request to a
//! [`Handler`]. The client is the other end of the envelope protocol.

use anyhow::Result;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::info;

mod client;
mod server;
mod types;

pub use client::SignedClient;
pub use server::{read_request, EchoHandler, GuardServer, Handler, RequestError};
pub use types::*;

use crate::config::{Config, ServeArgs};

/// Run the `serve` command until Ctrl+C.
pub fn run_serve(args: ServeArgs) -> Result<()> {
    let config = Config::from_args(&args)?;
    info!(
        listen = %config.listen,
        webhook_header = %config.webhook_header,
        identity_param = %config.proxy_identity_param,
        proxy_max_age_secs = ?config.proxy_max_age_secs,
        "Configuration loaded"
    );

    let server = GuardServer::new(config, EchoHandler);
    let listener = server.bind()?;

    let shutdown = Arc::new(AtomicBool::new(false));
    ctrlc_handler(shutdown.clone());

    server.serve(listener, shutdown)?;
    info!("Guard server stopped");
    Ok(())
}

fn ctrlc_handler(shutdown: Arc<AtomicBool>) {
    let _ = ctrlc::set_handler(move || {
        info!("Received Ctrl+C, shutting down");
        shutdown.store(true, Ordering::SeqCst);
    });
}
