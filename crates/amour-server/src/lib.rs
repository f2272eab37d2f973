//! HTTP layer for the amour photo service.
//!
//! Exposes an axum [`Router`] over a [`PhotoLifecycle`] backed by any
//! [`PhotoStore`] and [`AssetStore`]. Every route requires HTTP Basic
//! credentials; mutating routes additionally require the caller to be the
//! user named in the path.

pub mod auth;
pub mod error;
pub mod handlers;

pub use error::Error;

use std::{path::PathBuf, sync::Arc};

use amour_assets::AssetConfig;
use amour_core::{PhotoLifecycle, asset::AssetStore, store::PhotoStore};
use axum::{
  Router,
  extract::DefaultBodyLimit,
  routing::{get, post},
};
use serde::Deserialize;

use handlers::photos;

// ─── Configuration ────────────────────────────────────────────────────────────

fn default_host() -> String { "127.0.0.1".to_owned() }

fn default_port() -> u16 { 5000 }

fn default_max_upload_bytes() -> usize { 10 * 1024 * 1024 }

/// Runtime server configuration, deserialised from `config.toml` and
/// `AMOUR_*` environment variables.
#[derive(Deserialize, Clone)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:             String,
  #[serde(default = "default_port")]
  pub port:             u16,
  pub store_path:       PathBuf,
  /// Largest accepted request body for photo uploads.
  #[serde(default = "default_max_upload_bytes")]
  pub max_upload_bytes: usize,
  pub assets:           AssetConfig,
}

// ─── Application state ────────────────────────────────────────────────────────

/// Shared state threaded through all axum handlers.
pub struct AppState<S, A> {
  pub photos: PhotoLifecycle<S, A>,
  pub config: Arc<ServerConfig>,
}

impl<S, A> Clone for AppState<S, A> {
  fn clone(&self) -> Self {
    Self { photos: self.photos.clone(), config: Arc::clone(&self.config) }
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build an axum [`Router`] for the photo endpoints.
pub fn router<S, A>(state: AppState<S, A>) -> Router
where
  S: PhotoStore + 'static,
  A: AssetStore + 'static,
{
  let body_limit = state.config.max_upload_bytes;
  Router::new()
    .route(
      "/users/{user_id}/photos",
      get(photos::list::<S, A>).post(photos::create::<S, A>),
    )
    .route(
      "/users/{user_id}/photos/{id}",
      get(photos::get_one::<S, A>).delete(photos::delete_one::<S, A>),
    )
    .route("/users/{user_id}/photos/{id}/setMain", post(photos::set_main::<S, A>))
    .layer(DefaultBodyLimit::max(body_limit))
    .with_state(state)
}

// ─── Integration tests ────────────────────────────────────────────────────────
