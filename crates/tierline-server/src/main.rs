//! tierline server binary.
//!
//! Reads `config.toml` (or the path specified with `--config`), opens the
//! SQLite account store, and serves the webhook endpoint over HTTP.
//!
//! # Checking a configuration
//!
//! ```
//! cargo run -p tierline-server -- --config config.toml --check
//! ```

use std::{path::PathBuf, sync::Arc};

use anyhow::Context as _;
use clap::Parser;
use tierline_core::event::Provider;
use tierline_server::{ServerConfig, config::expand_tilde};
use tierline_store_sqlite::SqliteStore;
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "tierline webhook reconciliation server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,

  /// Load and validate the configuration, print a summary, and exit.
  #[arg(long)]
  check: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  // Initialise tracing.
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  let server_cfg = ServerConfig::load(&cli.config)?;
  let store_path = expand_tilde(&server_cfg.store_path);

  if cli.check {
    println!("listen:  {}", server_cfg.address());
    println!("store:   {}", store_path.display());
    for provider in [Provider::Kiwify, Provider::Hotmart] {
      println!(
        "catalog: {provider} ({} products)",
        server_cfg.catalog.len(provider)
      );
    }
    return Ok(());
  }

  // Open SQLite store.
  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;

  let catalog = Arc::new(server_cfg.catalog.clone());
  for provider in [Provider::Kiwify, Provider::Hotmart] {
    if catalog.len(provider) == 0 {
      tracing::warn!(%provider, "no catalog entries; every product maps to basic");
    }
  }

  let app = tierline_server::app(Arc::new(store), catalog);
  let address = server_cfg.address();

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}
