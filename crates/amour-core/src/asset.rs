//! The `AssetStore` trait: the external image host.
//!
//! Implemented by `amour-assets`. Timeouts and retries are the backend's
//! concern; the lifecycle only sees success or an error.

use std::future::Future;

use serde::{Deserialize, Serialize};

use crate::photo::Upload;

/// What the asset host returns for a successful upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredAsset {
  pub url:      String,
  pub asset_id: String,
}

/// Outcome of a successful [`AssetStore::destroy`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Destroyed {
  Removed,
  /// The host had no such asset, e.g. a retried delete.
  AlreadyGone,
}

pub trait AssetStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Store the uploaded bytes and return where they can be fetched.
  fn upload(
    &self,
    upload: Upload,
  ) -> impl Future<Output = Result<StoredAsset, Self::Error>> + Send + '_;

  /// Remove a previously stored asset. An asset the host no longer has is
  /// reported as [`Destroyed::AlreadyGone`]; any other refusal is an error.
  fn destroy<'a>(
    &'a self,
    asset_id: &'a str,
  ) -> impl Future<Output = Result<Destroyed, Self::Error>> + Send + 'a;
}
