//! Error type for `amour-store-sqlite`.

use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum Error {
  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  #[error("corrupt row: {0}")]
  Corrupt(String),

  /// The user's photos changed since the changeset was built.
  #[error("photos of user {0} were modified concurrently; retry")]
  VersionConflict(Uuid),

  #[error("user not found: {0}")]
  UserNotFound(Uuid),

  /// A changeset referenced a photo the user does not own (or that is gone).
  #[error("photo not found: {0}")]
  PhotoNotFound(Uuid),

  #[error("username already taken: {0}")]
  UsernameTaken(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
