//! Bank RPC server
//!
//! Serves the `bank.BankService` gRPC API over a shared account store.
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin bank-server
//! cargo run --bin bank-server -- --store memory --listen 127.0.0.1:50051
//! REDIS_HOST=redis cargo run --bin bank-server -- --workers 10 --max-retries 3
//! ```
//!
//! # Stores
//!
//! - **redis**: Accounts live in a Redis server shared by every instance (default)
//! - **memory**: Accounts live in this process only, useful for local trials
//!
//! # Exit Codes
//!
//! - 0: Clean shutdown (Ctrl-C)
//! - 1: Error (store unreachable, address in use, etc.)

use anyhow::Context;
use bank_rpc::cli::{self, StoreType};
use bank_rpc::rpc::{self, ServerConfig};
use bank_rpc::store::{MemoryStore, RedisStore};
use std::process;
use tracing::{error, info};

fn main() {
    // Parse command-line arguments using clap
    let args = cli::parse_server_args();
    cli::init_logging();

    let config = args.to_server_config();

    // One runtime thread per worker
    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .worker_threads(config.workers)
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("Error: failed to create tokio runtime: {}", e);
            process::exit(1);
        }
    };

    if let Err(e) = runtime.block_on(run(&args, &config)) {
        error!("{:#}", e);
        process::exit(1);
    }
}

async fn run(args: &cli::ServerArgs, config: &ServerConfig) -> anyhow::Result<()> {
    match args.store {
        StoreType::Memory => {
            info!("Using process-local memory store");
            rpc::serve(config, MemoryStore::new(), shutdown_signal()).await?;
        }
        StoreType::Redis => {
            let redis = args.to_redis_config();
            let store = RedisStore::connect(&redis)
                .await
                .with_context(|| format!("failed to connect to Redis at {}", redis.url()))?;
            rpc::serve(config, store, shutdown_signal()).await?;
        }
    }

    info!("Bank service stopped");
    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutdown requested"),
        Err(e) => {
            // Without a signal handler the server runs until killed
            error!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await
        }
    }
}
