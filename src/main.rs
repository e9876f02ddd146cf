//! edge-headers demo server.
//!
//! Serves a JSON inspection endpoint behind the full middleware stack, so
//! the effect of proxy headers, credentials, CORS and security headers can
//! be observed with curl.
//!
//! ```text
//! curl -H 'Forwarded: proto=https;host=example.com' localhost:8080/foo
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use edge_headers::config::{load_config, validate_config, EdgeConfig};
use edge_headers::observability::init_logging;
use edge_headers::EdgeServer;

#[derive(Parser)]
#[command(name = "edge-headers")]
#[command(about = "HTTP edge middleware demo server", long_about = None)]
struct Cli {
    /// Path to a TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override listener.bind_address
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => EdgeConfig::default(),
    };
    if let Some(bind) = cli.bind {
        config.listener.bind_address = bind;
        validate_config(&config).map_err(|errors| {
            errors
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", ")
        })?;
    }

    init_logging(&config.observability)?;

    tracing::info!(
        bind_address = %config.listener.bind_address,
        default_scheme = %config.listener.default_scheme,
        trust_forwarded = config.forwarding.trust_forwarded,
        trust_x_forwarded = config.forwarding.trust_x_forwarded,
        "Configuration loaded"
    );

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let server = EdgeServer::new(config)?;
    server.run(listener).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
