//! Encoding and decoding helpers between domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are RFC 3339 strings, UUIDs hyphenated lowercase strings, and
//! booleans `0`/`1` integers.

use amour_core::{photo::Photo, user::User};
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ────────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Row types ───────────────────────────────────────────────────────────────

pub const PHOTO_COLUMNS: &str =
  "photo_id, user_id, url, asset_id, description, is_main, added_at";

/// Raw values read directly from a `photos` row.
pub struct RawPhoto {
  pub photo_id:    String,
  pub user_id:     String,
  pub url:         String,
  pub asset_id:    Option<String>,
  pub description: Option<String>,
  pub is_main:     bool,
  pub added_at:    String,
}

impl RawPhoto {
  /// Map a row selected with [`PHOTO_COLUMNS`].
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      photo_id:    row.get(0)?,
      user_id:     row.get(1)?,
      url:         row.get(2)?,
      asset_id:    row.get(3)?,
      description: row.get(4)?,
      is_main:     row.get(5)?,
      added_at:    row.get(6)?,
    })
  }

  pub fn into_photo(self) -> Result<Photo> {
    Ok(Photo {
      photo_id:    decode_uuid(&self.photo_id)?,
      user_id:     decode_uuid(&self.user_id)?,
      url:         self.url,
      asset_id:    self.asset_id,
      description: self.description,
      is_main:     self.is_main,
      added_at:    decode_dt(&self.added_at)?,
    })
  }
}

/// Raw values read directly from a `users` row (without the password hash).
pub struct RawUser {
  pub user_id:    String,
  pub username:   String,
  pub created_at: String,
  pub version:    i64,
}

impl RawUser {
  pub fn into_user(self) -> Result<User> {
    Ok(User {
      user_id:    decode_uuid(&self.user_id)?,
      username:   self.username,
      created_at: decode_dt(&self.created_at)?,
      version:    u64::try_from(self.version)
        .map_err(|_| Error::Corrupt(format!("negative version: {}", self.version)))?,
    })
  }
}
