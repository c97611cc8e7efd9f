//! vantage server binary.
//!
//! Reads `config.toml` (or the path specified with `--config`) layered under
//! `VANTAGE_*` environment variables, opens the SQLite store, and serves the
//! dashboard API over HTTP.

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use anyhow::Context as _;
use clap::Parser;
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;
use vantage_auth::{GoogleVerifier, SessionIssuer};
use vantage_core::clock::{Clock, SystemClock};
use vantage_server::{AppState, ServerConfig};
use vantage_store_sqlite::SqliteStore;

#[derive(Parser)]
#[command(author, version, about = "Vantage analytics dashboard API")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  let settings = config::Config::builder()
    .add_source(config::File::from(cli.config).required(false))
    .add_source(config::Environment::with_prefix("VANTAGE").try_parsing(true))
    .build()
    .context("failed to read configuration")?;

  let server_cfg: ServerConfig = settings
    .try_deserialize()
    .context("failed to deserialise ServerConfig")?;

  let clock: Arc<dyn Clock> = Arc::new(SystemClock);
  let sessions = SessionIssuer::new(server_cfg.secret_key.as_bytes(), Arc::clone(&clock))
    .context("unusable secret_key")?;

  if server_cfg.google_client_id.is_none() {
    tracing::warn!("google_client_id is not set; federated login is disabled");
  }
  let verifier = Arc::new(GoogleVerifier::new(server_cfg.google_client_id.clone()));

  let store_path = expand_tilde(&server_cfg.store_path);
  if let Some(parent) = store_path.parent()
    && !parent.as_os_str().is_empty()
  {
    std::fs::create_dir_all(parent)
      .with_context(|| format!("failed to create {parent:?}"))?;
  }

  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?
    .with_clock(Arc::clone(&clock));
  tracing::info!(path = %store_path.display(), "store opened");

  let state = AppState::new(Arc::new(store), sessions, verifier, clock);

  let app = vantage_server::router(state);
  let address = format!("{}:{}", server_cfg.host, server_cfg.port);

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
