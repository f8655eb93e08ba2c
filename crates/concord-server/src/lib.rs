//! Concord HTTP server: configuration and application assembly.

use std::{
  path::{Path, PathBuf},
  sync::Arc,
  time::Duration,
};

use axum::Router;
use concord_api::ApiState;
use concord_store_sqlite::SqliteStore;
use serde::Deserialize;
use tower_http::trace::TraceLayer;

// ─── Configuration ────────────────────────────────────────────────────────────

/// Server settings, read from `config.toml` and `CONCORD_*` environment
/// variables.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:             String,
  #[serde(default = "default_port")]
  pub port:             u16,
  #[serde(default = "default_store_path")]
  pub store_path:       PathBuf,
  /// Seconds an untouched search cursor is kept before it is dropped.
  #[serde(default = "default_search_idle_secs")]
  pub search_idle_secs: u64,
}

fn default_host() -> String { "127.0.0.1".to_string() }

fn default_port() -> u16 { 8080 }

fn default_search_idle_secs() -> u64 { 30 * 60 }

fn default_store_path() -> PathBuf { PathBuf::from("~/.local/share/concord/concord.db") }

impl ServerConfig {
  /// Layer an optional TOML file under `CONCORD_*` environment variables.
  pub fn load(path: &Path) -> Result<Self, config::ConfigError> {
    config::Config::builder()
      .add_source(config::File::from(path).required(false))
      .add_source(config::Environment::with_prefix("CONCORD"))
      .build()?
      .try_deserialize()
  }

  pub fn address(&self) -> String { format!("{}:{}", self.host, self.port) }

  pub fn search_idle_ttl(&self) -> Duration { Duration::from_secs(self.search_idle_secs) }
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

// ─── Application ──────────────────────────────────────────────────────────────

/// The full application: the API router wrapped in request tracing.
pub fn app(store: Arc<SqliteStore>, search_idle_ttl: Duration) -> Router {
  concord_api::router(ApiState::with_search_ttl(store, search_idle_ttl))
    .layer(TraceLayer::new_for_http())
}
