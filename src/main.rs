//! Waveboard server binary.
//!
//! Serves the game's score API and static assets, backed by SQLite.

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;
use waveboard::config::{ServerConfig, CONFIG_PATH};
use waveboard::server;
use waveboard::storage::{SqliteStore, Storage};

#[derive(Parser, Debug)]
#[command(name = "waveboard", version, about = "Score and stats server for a wave-based arcade game")]
struct Cli {
    /// Config file path
    #[arg(long, default_value = CONFIG_PATH)]
    config: PathBuf,

    /// Override the listen port
    #[arg(long)]
    port: Option<u16>,

    /// Override the SQLite database path
    #[arg(long)]
    db: Option<PathBuf>,

    /// Override the static assets directory
    #[arg(long)]
    static_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let mut config = ServerConfig::load(&cli.config);
    if let Some(port) = cli.port {
        config.port = port;
    }
    if let Some(db) = cli.db {
        config.db_path = db;
    }
    if let Some(dir) = cli.static_dir {
        config.static_dir = Some(dir);
    }

    info!("Waveboard v{} starting", env!("CARGO_PKG_VERSION"));

    let store: Arc<dyn Storage> = Arc::new(SqliteStore::open_at(&config.db_path)?);
    server::run(&config, store).await
}
