//! Photo types.
//!
//! A photo is created only from a successful asset upload, mutated only to
//! toggle its main flag, and destroyed only through an explicit delete.

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ─── Photo ───────────────────────────────────────────────────────────────────

/// One uploaded image owned by a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Photo {
  pub photo_id:    Uuid,
  /// The owning user; never reassigned.
  pub user_id:     Uuid,
  /// Externally resolvable address of the stored asset.
  pub url:         String,
  /// Identifier used to destroy the asset. `None` for externally hosted
  /// photos that have no deletable asset.
  pub asset_id:    Option<String>,
  pub description: Option<String>,
  /// At most one photo per user has this set in any committed state.
  pub is_main:     bool,
  pub added_at:    DateTime<Utc>,
}

// ─── PhotoView ───────────────────────────────────────────────────────────────

/// The external representation of a [`Photo`]. The asset id stays internal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhotoView {
  pub id:          Uuid,
  pub url:         String,
  pub description: Option<String>,
  pub added_at:    DateTime<Utc>,
  pub is_main:     bool,
}

impl From<&Photo> for PhotoView {
  fn from(p: &Photo) -> Self {
    Self {
      id:          p.photo_id,
      url:         p.url.clone(),
      description: p.description.clone(),
      added_at:    p.added_at,
      is_main:     p.is_main,
    }
  }
}

impl From<Photo> for PhotoView {
  fn from(p: Photo) -> Self {
    Self {
      id:          p.photo_id,
      url:         p.url,
      description: p.description,
      added_at:    p.added_at,
      is_main:     p.is_main,
    }
  }
}

// ─── Upload ──────────────────────────────────────────────────────────────────

/// A file submitted for a new photo.
#[derive(Debug, Clone)]
pub struct Upload {
  pub file_name:    String,
  pub content_type: Option<String>,
  pub bytes:        Bytes,
  pub description:  Option<String>,
}

impl Upload {
  pub fn new(file_name: impl Into<String>, bytes: impl Into<Bytes>) -> Self {
    Self {
      file_name:    file_name.into(),
      content_type: None,
      bytes:        bytes.into(),
      description:  None,
    }
  }

  pub fn is_empty(&self) -> bool { self.bytes.is_empty() }
}
