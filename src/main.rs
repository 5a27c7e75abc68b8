//! Bid relay
//!
//! HTTP front for submitting auction bids from a fixed pool of accounts.
//!
//! # Architecture Overview
//!
//! ```text
//!   POST /bid {identifier, amount}
//!        │
//!        ▼
//!   ┌──────────┐   ┌──────────────────┐   ┌────────────────────┐
//!   │  http    │──▶│ accounts         │──▶│ bidding::submitter │
//!   │  server  │   │ resolver         │   │ sign + broadcast   │
//!   └──────────┘   └──────────────────┘   └─────────┬──────────┘
//!        ▲                                          │
//!        │          tx hash | classified error      ▼
//!        └───────────────────────────────── blockchain::client (JSON-RPC)
//! ```

use std::path::PathBuf;

use bid_relay::config::load_config;
use bid_relay::http::HttpServer;
use bid_relay::lifecycle::{build_runtime, signals, Shutdown};
use bid_relay::observability::{logging, metrics};
use clap::Parser;
use tokio::net::TcpListener;

#[derive(Parser)]
#[command(name = "bid-relay")]
#[command(about = "Submit auction bids on behalf of pre-configured accounts", long_about = None)]
struct Args {
    /// Path to the TOML configuration file.
    #[arg(short, long, env = "BID_RELAY_CONFIG", default_value = "bid-relay.toml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // Private keys may live in a local .env file.
    if let Err(e) = dotenvy::dotenv() {
        if !e.not_found() {
            return Err(e.into());
        }
    }

    let config = load_config(&args.config)?;
    logging::init_logging(&config.observability);

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        config = %args.config.display(),
        "bid-relay starting"
    );

    tracing::info!(
        bind_address = %config.listener.bind_address,
        rpc_url = %config.network.rpc_url,
        chain_id = config.network.chain_id,
        accounts = config.accounts.len(),
        "Configuration loaded"
    );

    let runtime = build_runtime(&config).await?;

    if config.observability.metrics_enabled {
        // Address validated with the rest of the config.
        if let Ok(addr) = config.observability.metrics_address.parse() {
            metrics::init_metrics(addr);
        }
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;

    let shutdown = Shutdown::new();
    signals::spawn_signal_handler(shutdown.clone());

    let server = HttpServer::new(config, runtime);
    server.run(listener, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
