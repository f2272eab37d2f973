//! amour photo server binary.
//!
//! Reads `config.toml` (or the path given with `--config`) plus `AMOUR_*`
//! environment variables, opens the SQLite store and the configured asset
//! backend, and serves the photo API over HTTP.
//!
//! # Helper commands
//!
//! ```
//! cargo run -p amour-server --bin server -- hash-password
//! cargo run -p amour-server --bin server -- add-user --username alice
//! ```

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use amour_assets::{AnyAssetStore, AssetConfig};
use amour_core::{PhotoLifecycle, store::PhotoStore as _, user::Registration};
use amour_server::{AppState, ServerConfig, auth::hash_password};
use amour_store_sqlite::SqliteStore;
use anyhow::Context as _;
use clap::{Parser, Subcommand};
use tokio::net::TcpListener;
use tower_http::{services::ServeDir, trace::TraceLayer};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "amour photo server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,

  #[command(subcommand)]
  command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
  /// Serve the HTTP API (the default).
  Serve,
  /// Print the argon2 hash for a password entered on stdin and exit.
  HashPassword,
  /// Register a user, reading the password from stdin.
  AddUser {
    #[arg(long)]
    username: String,
  },
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
  let command = cli.command.unwrap_or(Command::Serve);

  if let Command::HashPassword = command {
    let password = read_password()?;
    let hash = hash_password(&password).map_err(|e| anyhow::anyhow!("argon2 error: {e}"))?;
    println!("{hash}");
    return Ok(());
  }

  let settings = config::Config::builder()
    .add_source(config::File::from(cli.config).required(false))
    .add_source(config::Environment::with_prefix("AMOUR").separator("__"))
    .build()
    .context("failed to read config file")?;

  let mut server_cfg: ServerConfig = settings
    .try_deserialize()
    .context("failed to deserialise ServerConfig")?;

  server_cfg.store_path = expand_tilde(&server_cfg.store_path);
  if let AssetConfig::Disk(disk) = &mut server_cfg.assets {
    disk.dir = expand_tilde(&disk.dir);
  }

  let store = SqliteStore::open(&server_cfg.store_path)
    .await
    .with_context(|| format!("failed to open store at {:?}", server_cfg.store_path))?;

  match command {
    Command::AddUser { username } => add_user(&store, username).await,
    _ => serve(store, server_cfg).await,
  }
}

async fn add_user(store: &SqliteStore, username: String) -> anyhow::Result<()> {
  let registration = Registration { username, password: read_password()? };
  registration.validate()?;

  let hash = hash_password(&registration.password)
    .map_err(|e| anyhow::anyhow!("argon2 error: {e}"))?;
  let user = store
    .add_user(registration.username, hash)
    .await
    .context("failed to add user")?;

  tracing::info!(user_id = %user.user_id, username = %user.username, "user added");
  println!("{}", user.user_id);
  Ok(())
}

async fn serve(store: SqliteStore, server_cfg: ServerConfig) -> anyhow::Result<()> {
  let assets = AnyAssetStore::from_config(server_cfg.assets.clone())
    .context("failed to initialise asset store")?;
  let media_dir = assets.as_disk().map(|d| d.dir().to_path_buf());

  let state = AppState {
    photos: PhotoLifecycle::new(Arc::new(store), Arc::new(assets)),
    config: Arc::new(server_cfg.clone()),
  };

  let mut app = amour_server::router(state);
  if let Some(dir) = media_dir {
    tracing::info!(dir = %dir.display(), "serving disk assets under /media");
    app = app.nest_service("/media", ServeDir::new(dir));
  }
  let app = app.layer(TraceLayer::new_for_http());

  let address = format!("{}:{}", server_cfg.host, server_cfg.port);

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}

/// Read a password line from stdin.
fn read_password() -> anyhow::Result<String> {
  use std::io::{self, BufRead, Write};
  print!("Password: ");
  io::stdout().flush().ok();
  let mut line = String::new();
  io::stdin().lock().read_line(&mut line)?;
  Ok(line.trim_end_matches(['\n', '\r']).to_owned())
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
