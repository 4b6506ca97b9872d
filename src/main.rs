//! Tile Store - ops binary for the persistent tile cache.
//!
//! Provides `check`, `put`, and `get` subcommands for exercising a cache
//! database by hand.

use std::process::ExitCode;

use bytes::Bytes;
use clap::Parser;
use tracing::error;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tile_store::{
    config::{CheckArgs, Cli, Command, GetArgs, PutArgs, StoreArgs},
    PersistentTileCache, RawTileDecoder, StoreConfig, TilePosition, TileStore,
};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match cli.command {
        Command::Check(args) => run_check(args).await,
        Command::Put(args) => run_put(args).await,
        Command::Get(args) => run_get(args).await,
    }
}

/// Build a raw-bytes store from CLI arguments, reporting config errors.
fn open_store(args: &StoreArgs) -> Result<TileStore<RawTileDecoder>, ExitCode> {
    init_logging(args.verbose);

    let config: StoreConfig = match args.to_config() {
        Ok(config) => config,
        Err(e) => {
            error!("Configuration error: {}", e);
            return Err(ExitCode::FAILURE);
        }
    };

    TileStore::new(config, RawTileDecoder).map_err(|e| {
        error!("Configuration error: {}", e);
        ExitCode::FAILURE
    })
}

// =============================================================================
// Check Command
// =============================================================================

async fn run_check(args: CheckArgs) -> ExitCode {
    let store = match open_store(&args.store) {
        Ok(store) => store,
        Err(code) => return code,
    };

    println!("Tile Store Check");
    println!("════════════════");
    println!("Database: {}", args.store.connection_string);
    println!("Table:    {}", args.store.table);
    println!();

    if store.initialize().await {
        println!("✓ Store initialized (connections open, table ready)");
        ExitCode::SUCCESS
    } else {
        println!("✗ Store could not be initialized");
        println!();
        println!("Please check:");
        println!("  - The database path exists and is writable");
        println!("  - No other process holds an incompatible lock");
        ExitCode::FAILURE
    }
}

// =============================================================================
// Put Command
// =============================================================================

async fn run_put(args: PutArgs) -> ExitCode {
    let store = match open_store(&args.store) {
        Ok(store) => store,
        Err(code) => return code,
    };

    let data = match tokio::fs::read(&args.file).await {
        Ok(data) => Bytes::from(data),
        Err(e) => {
            error!("Failed to read {}: {}", args.file.display(), e);
            return ExitCode::FAILURE;
        }
    };

    let len = data.len();
    let pos = TilePosition::new(args.x, args.y);
    if store.put_tile(data, args.type_id, pos, args.zoom).await {
        println!(
            "✓ Cached tile type={} zoom={} {} ({} bytes)",
            args.type_id, args.zoom, pos, len
        );
        ExitCode::SUCCESS
    } else {
        println!("✗ Tile was not cached (already present, or store unavailable)");
        ExitCode::FAILURE
    }
}

// =============================================================================
// Get Command
// =============================================================================

async fn run_get(args: GetArgs) -> ExitCode {
    let store = match open_store(&args.store) {
        Ok(store) => store,
        Err(code) => return code,
    };

    let pos = TilePosition::new(args.x, args.y);
    match store.get_tile(args.type_id, pos, args.zoom).await {
        Some(data) => {
            if let Err(e) = tokio::fs::write(&args.output, &data).await {
                error!("Failed to write {}: {}", args.output.display(), e);
                return ExitCode::FAILURE;
            }
            println!(
                "✓ Wrote {} bytes to {}",
                data.len(),
                args.output.display()
            );
            ExitCode::SUCCESS
        }
        None => {
            println!(
                "✗ Cache miss for type={} zoom={} {}",
                args.type_id, args.zoom, pos
            );
            ExitCode::FAILURE
        }
    }
}

// =============================================================================
// Logging
// =============================================================================

/// Initialize the tracing/logging subsystem.
fn init_logging(verbose: bool) {
    let env_filter = if verbose {
        "tile_store=debug"
    } else {
        "tile_store=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| env_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
