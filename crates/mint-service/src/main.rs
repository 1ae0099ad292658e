//! NFT Mint Service
//!
//! Whitelist proof API, sale watcher and optional mint submitter.

mod api;
mod contract;
mod minter;
mod state;
mod watcher;

use anyhow::{Context, Result};
use clap::Parser;
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use whitelist_proof::Whitelist;

/// Snapshots older than this many poll intervals mark the service degraded.
const STALE_POLLS: u32 = 3;

#[derive(Parser, Debug)]
#[command(name = "mint-service")]
#[command(about = "Whitelist proof API and mint submitter for the NFT sale")]
struct Args {
    /// Whitelist JSON file (array of address strings)
    #[arg(long, env = "WHITELIST_PATH", default_value = "whitelist.json")]
    whitelist: PathBuf,

    /// Ethereum RPC URL
    #[arg(long, env = "RPC_URL", default_value = "http://localhost:8545")]
    rpc_url: String,

    /// Mint contract address
    #[arg(long, env = "CONTRACT_ADDRESS")]
    contract_address: Option<String>,

    /// Private key for transaction signing (hex, without 0x prefix)
    #[arg(long, env = "PRIVATE_KEY")]
    private_key: Option<String>,

    /// Bearer token callers must send to `POST /mint`
    #[arg(long, env = "MINT_API_TOKEN")]
    mint_api_token: Option<String>,

    /// API listen address
    #[arg(long, default_value = "0.0.0.0:8080")]
    listen: String,

    /// Metrics listen address
    #[arg(long, default_value = "0.0.0.0:9090")]
    metrics_listen: SocketAddr,

    /// Contract polling interval in seconds
    #[arg(long, env = "POLL_INTERVAL_SECS", default_value = "12")]
    poll_interval_secs: u64,

    /// Confirmations to wait for after sending a mint
    #[arg(long, default_value = "1")]
    confirmations: u64,

    /// Refuse to send mints above this gas price
    #[arg(long, default_value = "100")]
    max_gas_price_gwei: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment from .env if present
    let _ = dotenvy::dotenv();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();

    tracing::info!("Starting mint service");
    tracing::info!(whitelist = %args.whitelist.display(), "Whitelist file");
    tracing::info!(listen = %args.listen, "API server");

    PrometheusBuilder::new()
        .with_http_listener(args.metrics_listen)
        .install()
        .context("Failed to install metrics exporter")?;

    // Build the tree once; everything downstream shares it read-only
    let whitelist = Whitelist::from_json_file(&args.whitelist)?;
    let tree = Arc::new(
        whitelist
            .build_tree()
            .context("Cannot build a whitelist tree")?,
    );
    tracing::info!(root = %tree.root(), leaves = tree.len(), "Whitelist tree built");

    let poll_interval = Duration::from_secs(args.poll_interval_secs);
    let reader = args
        .contract_address
        .as_deref()
        .map(|address| contract::ContractReader::new(&args.rpc_url, address))
        .transpose()?;

    let max_sync_age = reader.as_ref().map(|_| poll_interval * STALE_POLLS);
    let app_state = state::AppState::new(tree, max_sync_age);

    let minter = match (&reader, args.private_key) {
        (Some(_), Some(_)) if args.mint_api_token.is_none() => {
            tracing::warn!("Private key given without MINT_API_TOKEN, minting disabled");
            None
        }
        (Some(reader), Some(private_key)) => {
            let config = minter::MinterConfig {
                private_key,
                max_gas_price_gwei: args.max_gas_price_gwei,
                confirmations: args.confirmations,
            };
            Some(Arc::new(minter::Minter::new(
                config,
                reader.clone(),
                app_state.clone(),
            )?))
        }
        (None, Some(_)) => {
            tracing::warn!("Private key given without contract address, minting disabled");
            None
        }
        _ => None,
    };

    if let Some(reader) = reader {
        let watcher = watcher::SaleWatcher::new(
            watcher::WatcherConfig { poll_interval },
            reader,
            app_state.clone(),
        );
        tokio::spawn(async move { watcher.run().await });
    } else {
        tracing::warn!("No contract address configured, serving whitelist proofs only");
    }

    // Start API server
    let api_state = api::ApiState {
        app: app_state,
        minter,
        mint_token: args.mint_api_token.as_deref().map(Arc::from),
    };
    let api_handle = tokio::spawn(api::run_server(args.listen.clone(), api_state));

    // Wait for shutdown
    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Received shutdown signal");
        }
        result = api_handle => {
            match result {
                Ok(Err(e)) => tracing::error!(error = %e, "API server error"),
                Err(e) => tracing::error!(error = %e, "API server task failed"),
                Ok(Ok(())) => {}
            }
        }
    }

    Ok(())
}
