//! Listing Gateway (v1)
//!
//! HTTP entry point for the real-estate listing platform's request defense
//! and media-ingestion pipeline.
//!
//! # Architecture Overview
//!
//! ```text
//!                    ┌───────────────────────────────────────────────────┐
//!                    │                 LISTING GATEWAY                    │
//!                    │                                                    │
//!   Client Request   │  ┌──────────┐   ┌──────────┐   ┌───────────────┐  │
//!   ─────────────────┼─▶│ decorator│──▶│   rate   │──▶│   sanitizer   │  │
//!                    │  │ + CORS   │   │  limiter │   │ (allow-list)  │  │
//!                    │  └──────────┘   └──────────┘   └───────┬───────┘  │
//!                    │                                        │          │
//!                    │                 uploads only           ▼          │
//!                    │  ┌──────────┐   ┌──────────┐   ┌───────────────┐  │
//!   Client Response  │  │  field   │◀──│  media   │◀──│ upload guard  │  │
//!   ◀────────────────┼──│normalizer│   │validator │   │ (own limit)   │  │
//!                    │  └──────────┘   └──────────┘   └───────────────┘  │
//!                    │                                                    │
//!                    │  config · observability · counter store           │
//!                    └───────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use listing_gateway::config::{self, GatewayConfig};
use listing_gateway::http::HttpServer;
use listing_gateway::observability::{logging, metrics};

#[derive(Parser, Debug)]
#[command(name = "listing-gateway", about = "Request defense pipeline for the listing API")]
struct Args {
    /// Path to a TOML configuration file. Defaults apply when omitted.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override the bind address from config.
    #[arg(long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    logging::init_tracing();

    let args = Args::parse();
    let mut config = match &args.config {
        Some(path) => config::load_config(path)?,
        None => {
            let mut config = GatewayConfig::default();
            config::apply_env_overrides(&mut config);
            config
        }
    };
    if let Some(bind) = args.bind {
        config.listener.bind_address = bind;
    }

    tracing::info!(
        bind_address = %config.listener.bind_address,
        max_requests = config.rate_limit.max_requests,
        window_secs = config.rate_limit.window_secs,
        max_images = config.media.max_images,
        max_videos = config.media.max_videos,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        if let Ok(addr) = config.observability.metrics_address.parse() {
            metrics::init_metrics(addr);
        } else {
            tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            );
        }
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    let local_addr = listener.local_addr()?;
    tracing::info!(address = %local_addr, "Listening for connections");

    let server = HttpServer::new(config);
    server.run(listener).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
