//! BI Portal entry point.
//!
//! A thin web front-end for a WebFOCUS-style BI server, built with
//! Tokio and Axum.
//!
//! # Architecture Overview
//!
//! ```text
//!                    ┌──────────────────────────────────────────────┐
//!                    │                  BI PORTAL                    │
//!                    │                                               │
//!  Browser request   │  ┌────────┐   ┌──────────┐   ┌────────────┐  │
//!  ──────────────────┼─▶│ http   │──▶│ upstream │──▶│ upstream   │──┼──▶ BI server
//!                    │  │ server │   │ scope    │   │ session    │  │    (REST+XML)
//!                    │  └────────┘   └──────────┘   └─────┬──────┘  │
//!                    │                                     │         │
//!  Browser response  │  ┌────────┐   ┌──────────┐   ┌─────▼──────┐  │
//!  ◀─────────────────┼──│ render │◀──│ handlers │◀──│ xml parse  │  │
//!                    │  └────────┘   └──────────┘   └────────────┘  │
//!                    │                                               │
//!                    │  config · validation · tracing (cross-cutting)│
//!                    └──────────────────────────────────────────────┘
//! ```

// Core subsystems
pub mod config;
pub mod http;
pub mod render;
pub mod upstream;

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::loader::load_config;
use crate::config::PortalConfig;
use crate::http::PortalServer;

#[derive(Parser)]
#[command(name = "bi-portal")]
#[command(about = "Web front-end for a WebFOCUS-style BI server", long_about = None)]
struct Cli {
    /// Path to a TOML config file; built-in defaults are used when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing subscriber
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "bi_portal=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("bi-portal v0.1.0 starting");

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => PortalConfig::default(),
    };

    tracing::info!(
        bind_address = %config.listener.bind_address,
        upstream = %config.upstream.base_url(),
        upstream_timeout_secs = config.upstream.timeout_secs,
        "Configuration loaded"
    );

    // Bind TCP listener
    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    let local_addr = listener.local_addr()?;

    tracing::info!(
        address = %local_addr,
        "Listening for connections"
    );

    // Create and run HTTP server
    let server = PortalServer::new(config)?;
    server.run(listener).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
