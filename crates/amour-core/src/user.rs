//! Users, caller identity, and registration input.
//!
//! Users are an external aggregate as far as the photo lifecycle is
//! concerned: it only needs to know that a user exists and which
//! concurrency version its photo set is at.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result};

/// A registered user. The password hash is never part of this value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
  pub user_id:    Uuid,
  pub username:   String,
  pub created_at: DateTime<Utc>,
  /// Bumped by every committed change to the user's photos.
  pub version:    u64,
}

/// The authenticated caller of a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Identity {
  pub user_id: Uuid,
}

impl Identity {
  pub fn new(user_id: Uuid) -> Self { Self { user_id } }

  /// Fail with [`Error::Unauthorized`] unless the caller is `user_id`.
  pub fn authorize(&self, user_id: Uuid) -> Result<()> {
    if self.user_id == user_id {
      Ok(())
    } else {
      Err(Error::Unauthorized(user_id))
    }
  }
}

/// Username and clear-text password submitted when registering a user.
#[derive(Debug, Clone, Deserialize)]
pub struct Registration {
  pub username: String,
  pub password: String,
}

impl Registration {
  pub const MIN_PASSWORD_LEN: usize = 4;
  pub const MAX_PASSWORD_LEN: usize = 8;

  pub fn validate(&self) -> Result<()> {
    if self.username.trim().is_empty() {
      return Err(Error::InvalidRegistration("username is required"));
    }
    let len = self.password.chars().count();
    if !(Self::MIN_PASSWORD_LEN..=Self::MAX_PASSWORD_LEN).contains(&len) {
      return Err(Error::InvalidRegistration(
        "password must be between 4 and 8 characters",
      ));
    }
    Ok(())
  }
}
