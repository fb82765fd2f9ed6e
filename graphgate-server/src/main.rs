//! Graphgate Server
//!
//! Reference host exposing the social-graph login routes.
//!
//! # Running
//!
//! ```bash
//! cargo run -p graphgate-server -- --config server.toml
//! # or after install:
//! graphgated --listen 0.0.0.0:8080
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use graphgate_server::{AppState, ServerConfig, config, start_server};
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

#[derive(Parser, Debug)]
#[command(name = "graphgated")]
#[command(author, version, about = "Social-graph login server", long_about = None)]
struct Args {
    /// Configuration file (defaults to $GRAPHGATE_CONFIG, then the user config dir)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Address to listen on, overriding the configuration file
    #[arg(short, long)]
    listen: Option<SocketAddr>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = config::load_config(args.config.as_deref())?;
    if let Some(listen) = args.listen {
        config.listen_addr = listen;
    }

    init_logging(&config.log_level);
    info!("Loaded configuration from {:?}", config.config_path);

    run_server(config).await
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    fmt().with_env_filter(filter).with_target(false).init();
}

async fn run_server(config: ServerConfig) -> Result<()> {
    let client = config
        .client
        .validate()
        .context("Invalid [client] configuration")?;

    if !client.verify_state {
        warn!("OAuth state verification is disabled; callbacks are not checked against the issued state");
    }

    let state = AppState::with_sessions(client, config.session_registry());
    let server_handle = start_server(config.listen_addr, state, config.prefix()).await?;

    info!(
        "Serving /{}/auth/redirect and /{}/auth/oauth-callback on {}",
        config.prefix(),
        config.prefix(),
        server_handle.local_addr()
    );
    info!("Server running. Press Ctrl+C to stop.");

    tokio::signal::ctrl_c().await?;
    info!("Shutdown signal received, stopping server...");

    server_handle.stop().await?;

    info!("Server stopped");
    Ok(())
}
