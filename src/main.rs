//! PetChain Node
//!
//! Main entry point: loads configuration, opens (or replays) the ledger
//! and serves the HTTP API until Ctrl+C.

use clap::Parser;
use petchain::config::load_config;
use petchain::constants::CHAIN_FULL_NAME;
use petchain::ledger::{LedgerError, LedgerService};
use petchain::logging::init_logging;
use petchain::rpc::start_rpc_server;
use petchain::storage::LedgerDb;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

#[derive(Debug, Parser)]
#[command(name = "petchain-node", version, about = "PetChain ledger node")]
struct Args {
    /// Path to the TOML config file
    #[arg(short, long, default_value = "petchain.toml")]
    config: PathBuf,

    /// Override the proof-of-work difficulty
    #[arg(long)]
    difficulty: Option<u32>,

    /// Override the API port
    #[arg(short, long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let mut config = load_config(&args.config)?;
    if let Some(difficulty) = args.difficulty {
        config.ledger.difficulty = difficulty;
    }
    if let Some(port) = args.port {
        config.rpc.port = port;
    }
    config.validate()?;

    init_logging(config.logging.log_format()?, &config.logging.level)?;
    info!(
        chain = CHAIN_FULL_NAME,
        difficulty = config.ledger.difficulty,
        persistent = config.storage.persistent,
        "starting node"
    );

    // Genesis mining and replay are CPU bound
    let ledger_config = config.ledger.clone();
    let storage = config.storage.clone();
    let ledger = tokio::task::spawn_blocking(move || -> Result<LedgerService, LedgerError> {
        if storage.persistent {
            let db = LedgerDb::open(&storage.path)?;
            LedgerService::open(&ledger_config, db)
        } else {
            LedgerService::in_memory(&ledger_config)
        }
    })
    .await??;
    let ledger = Arc::new(ledger);

    let stats = ledger.stats();
    info!(
        blocks = stats.chain_length,
        pets = stats.total_pets,
        valid = stats.chain_valid,
        "ledger ready"
    );

    let shutdown_ledger = Arc::clone(&ledger);
    let shutdown = async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("shutdown signal received, stopping node");
        }
        shutdown_ledger.cancel_mining();
    };

    start_rpc_server(ledger, &config.rpc.bind_address(), shutdown).await?;
    Ok(())
}
