//! Local-directory asset storage.
//!
//! Each upload is written to `<dir>/<uuid>.<ext>`; the file name doubles as
//! the asset id and the url is `<base_url>/<file name>`. Serving the
//! directory under `base_url` is left to the HTTP layer.

use std::path::{Path, PathBuf};

use amour_core::{
  asset::{AssetStore, Destroyed, StoredAsset},
  photo::Upload,
};
use serde::Deserialize;
use tracing::debug;
use uuid::Uuid;

use crate::{Error, Result};

#[derive(Debug, Clone, Deserialize)]
pub struct DiskConfig {
  pub dir:      PathBuf,
  /// Public url prefix the directory is served under, e.g.
  /// `http://localhost:5000/media`.
  pub base_url: String,
}

#[derive(Debug, Clone)]
pub struct DiskStore {
  dir:      PathBuf,
  base_url: String,
}

impl DiskStore {
  pub fn new(config: DiskConfig) -> Self {
    Self {
      dir:      config.dir,
      base_url: config.base_url.trim_end_matches('/').to_owned(),
    }
  }

  pub fn dir(&self) -> &Path { &self.dir }

  /// Resolve `asset_id` inside the storage directory, refusing anything that
  /// is not a bare file name.
  fn path_for(&self, asset_id: &str) -> Result<PathBuf> {
    let bare = !asset_id.is_empty()
      && !asset_id.starts_with('.')
      && asset_id
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '.');
    if !bare {
      return Err(Error::InvalidAssetId(asset_id.to_owned()));
    }
    Ok(self.dir.join(asset_id))
  }
}

/// Lower-cased alphanumeric extension of `file_name`, or `bin`.
fn extension(file_name: &str) -> String {
  Path::new(file_name)
    .extension()
    .and_then(|e| e.to_str())
    .filter(|e| !e.is_empty() && e.len() <= 8 && e.chars().all(|c| c.is_ascii_alphanumeric()))
    .map(str::to_ascii_lowercase)
    .unwrap_or_else(|| "bin".to_owned())
}

impl AssetStore for DiskStore {
  type Error = Error;

  async fn upload(&self, upload: Upload) -> Result<StoredAsset> {
    let name = format!("{}.{}", Uuid::new_v4(), extension(&upload.file_name));
    let path = self.dir.join(&name);

    tokio::fs::create_dir_all(&self.dir).await?;
    tokio::fs::write(&path, &upload.bytes).await?;
    debug!(path = %path.display(), bytes = upload.bytes.len(), "stored asset on disk");

    Ok(StoredAsset { url: format!("{}/{name}", self.base_url), asset_id: name })
  }

  async fn destroy(&self, asset_id: &str) -> Result<Destroyed> {
    let path = self.path_for(asset_id)?;
    match tokio::fs::remove_file(&path).await {
      Ok(()) => {
        debug!(path = %path.display(), "removed asset from disk");
        Ok(Destroyed::Removed)
      }
      Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
        Ok(Destroyed::AlreadyGone)
      }
      Err(e) => Err(e.into()),
    }
  }
}
