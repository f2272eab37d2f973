//! Runtime selection between asset backends.

use amour_core::{
  asset::{AssetStore, Destroyed, StoredAsset},
  photo::Upload,
};
use serde::Deserialize;

use crate::{
  CloudinaryConfig, CloudinaryStore, DiskConfig, DiskStore, Result,
};

/// The `[assets]` config table; `backend` selects the variant.
#[derive(Clone, Deserialize)]
#[serde(tag = "backend", rename_all = "snake_case")]
pub enum AssetConfig {
  Cloudinary(CloudinaryConfig),
  Disk(DiskConfig),
}

/// One of the concrete asset backends, chosen at startup.
#[derive(Clone)]
pub enum AnyAssetStore {
  Cloudinary(CloudinaryStore),
  Disk(DiskStore),
}

impl AnyAssetStore {
  pub fn from_config(config: AssetConfig) -> Result<Self> {
    Ok(match config {
      AssetConfig::Cloudinary(c) => Self::Cloudinary(CloudinaryStore::new(c)?),
      AssetConfig::Disk(c) => Self::Disk(DiskStore::new(c)),
    })
  }

  /// The disk backend, if that is the one in use.
  pub fn as_disk(&self) -> Option<&DiskStore> {
    match self {
      Self::Disk(d) => Some(d),
      Self::Cloudinary(_) => None,
    }
  }
}

impl AssetStore for AnyAssetStore {
  type Error = crate::Error;

  async fn upload(&self, upload: Upload) -> Result<StoredAsset> {
    match self {
      Self::Cloudinary(c) => c.upload(upload).await,
      Self::Disk(d) => d.upload(upload).await,
    }
  }

  async fn destroy(&self, asset_id: &str) -> Result<Destroyed> {
    match self {
      Self::Cloudinary(c) => c.destroy(asset_id).await,
      Self::Disk(d) => d.destroy(asset_id).await,
    }
  }
}
