//! SelfHub MCP Server
//!
//! Run with: selfhub-server

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use selfhub::error::{HubError, Result};
use selfhub::mcp::{HubHandler, McpServer};
use selfhub::seed::seed_sample_data;
use selfhub::types::*;
use selfhub::MemoryHub;

#[derive(Parser, Debug)]
#[command(name = "selfhub-server")]
#[command(about = "SelfHub MCP server for personal memory")]
struct Args {
    /// Storage backend (memory or sqlite)
    #[arg(long, env = "SELFHUB_BACKEND", default_value = "sqlite")]
    backend: String,

    /// Database path
    #[arg(
        long,
        env = "SELFHUB_DB_PATH",
        default_value = "~/.local/share/selfhub/selfhub.db"
    )]
    db_path: String,

    /// Storage mode (local or cloud-safe)
    #[arg(long, env = "SELFHUB_STORAGE_MODE", default_value = "local")]
    storage_mode: String,

    /// Insert the sample data set on startup
    #[arg(long, env = "SELFHUB_SEED")]
    seed: bool,
}

fn main() -> Result<()> {
    // Initialize logging to stderr (stdout is for MCP protocol)
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(false),
        )
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();

    let backend: BackendKind = args.backend.parse().map_err(HubError::Config)?;
    let storage_mode: StorageMode = args.storage_mode.parse().map_err(HubError::Config)?;

    // Expand ~ in path
    let db_path = shellexpand::tilde(&args.db_path).to_string();

    let config = StorageConfig {
        backend,
        db_path,
        storage_mode,
    };
    let hub = MemoryHub::open(&config)?;

    if args.seed {
        seed_sample_data(&hub)?;
    }

    tracing::info!(
        backend = hub.backend_name(),
        db_path = %config.db_path,
        "SelfHub MCP server starting..."
    );
    McpServer::new(HubHandler::new(hub)).run()?;

    Ok(())
}
