//! lode-server binary.
//!
//! Reads `config.toml` (or the path given with `--config`) with `LODE_*`
//! environment variables layered on top, then opens the JSON user store
//! (seeding the administrator account on first run), warms the data
//! snapshot, and serves the JSON API.
//!
//! # Password hash generation
//!
//! To mint an argon2 PHC string by hand (e.g. to repair a store file):
//!
//! ```
//! cargo run -p lode-api --bin lode-server -- --hash-password
//! ```

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use anyhow::Context as _;
use argon2::{Argon2, PasswordHasher, password_hash::SaltString};
use clap::Parser;
use rand_core::OsRng;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

use lode_api::{AppState, ServerConfig, session::Sessions};
use lode_data::DataRepository;
use lode_store_json::JsonUserStore;

#[derive(Parser)]
#[command(author, version, about = "Lode minerals data server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,

  /// Print the argon2 hash for a password entered on stdin and exit.
  #[arg(long)]
  hash_password: bool,
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

  // Helper mode: hash a password and exit.
  if cli.hash_password {
    let password = read_password()?;
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
      .hash_password(password.as_bytes(), &salt)
      .map_err(|e| anyhow::anyhow!("argon2 error: {e}"))?
      .to_string();
    println!("{hash}");
    return Ok(());
  }

  // Load configuration.
  let settings = config::Config::builder()
    .add_source(config::File::from(cli.config).required(false))
    .add_source(config::Environment::with_prefix("LODE"))
    .build()
    .context("failed to read config file")?;

  let server_cfg: ServerConfig = settings
    .try_deserialize()
    .context("failed to deserialise ServerConfig")?;

  // Open the user store, seeding the administrator on first run.
  let users_path = expand_tilde(&server_cfg.users_file);
  let store = JsonUserStore::open(&users_path)
    .await
    .with_context(|| format!("failed to open user store at {users_path:?}"))?;

  // Warm the data snapshot so startup logs show what was found.
  let repo = Arc::new(DataRepository::new(expand_tilde(&server_cfg.data_dir)));
  let snapshot = repo.load().await;
  tracing::info!(
    countries = snapshot.countries.len(),
    minerals = snapshot.minerals.len(),
    production = snapshot.production.len(),
    sites = snapshot.sites.len(),
    "source tables loaded"
  );

  // Build application state.
  let state = AppState {
    store: Arc::new(store),
    repo,
    sessions: Arc::new(Sessions::default()),
    config: Arc::new(server_cfg.clone()),
  };

  let app = lode_api::router(state).layer(TraceLayer::new_for_http());
  let address = format!("{}:{}", server_cfg.host, server_cfg.port);

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}

/// Read a password from stdin.
fn read_password() -> anyhow::Result<String> {
  use std::io::{self, BufRead, Write};
  let stdin = io::stdin();
  print!("Password: ");
  io::stdout().flush().ok();
  let mut line = String::new();
  stdin.lock().read_line(&mut line)?;
  Ok(
    line
      .trim_end_matches('\n')
      .trim_end_matches('\r')
      .to_string(),
  )
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
