//! Server wiring for reel: configuration and the top-level router.

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use anyhow::Context as _;
use axum::{Router, http::HeaderName};
use reel_api::{ApiState, DEFAULT_ACTOR_HEADER, api_router};
use reel_store_sqlite::SqliteStore;
use serde::Deserialize;
use tower_http::trace::TraceLayer;

// ─── Configuration ───────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and `REEL_*`
/// environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:         String,
  #[serde(default = "default_port")]
  pub port:         u16,
  #[serde(default = "default_store_path")]
  pub store_path:   PathBuf,
  /// Request header holding the authenticated user id.
  #[serde(default = "default_actor_header")]
  pub actor_header: String,
}

fn default_host() -> String { "127.0.0.1".to_owned() }

fn default_port() -> u16 { 8000 }

fn default_store_path() -> PathBuf { PathBuf::from("~/.local/share/reel/reel.db") }

fn default_actor_header() -> String { DEFAULT_ACTOR_HEADER.to_owned() }

impl ServerConfig {
  pub fn address(&self) -> String { format!("{}:{}", self.host, self.port) }
}

/// Load configuration from an optional TOML file layered under the
/// environment.
pub fn load_config(path: &Path) -> anyhow::Result<ServerConfig> {
  config::Config::builder()
    .add_source(config::File::from(path).required(false))
    .add_source(config::Environment::with_prefix("REEL"))
    .build()
    .context("failed to read config file")?
    .try_deserialize()
    .context("failed to deserialise ServerConfig")
}

// ─── Application ─────────────────────────────────────────────────────────────

/// Build the served router: the API under `/api/v1` with request tracing.
pub fn app(config: &ServerConfig, store: Arc<SqliteStore>) -> anyhow::Result<Router> {
  let header = HeaderName::try_from(config.actor_header.as_str())
    .with_context(|| format!("invalid actor header name {:?}", config.actor_header))?;
  let state = ApiState::new(store).with_actor_header(header);
  Ok(
    Router::new()
      .nest("/api/v1", api_router(state))
      .layer(TraceLayer::new_for_http()),
  )
}

/// Expand a leading `~` to the user's home directory.
pub fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
