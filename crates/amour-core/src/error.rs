//! Error types for `amour-core`.

use thiserror::Error;
use uuid::Uuid;

/// A boxed backend error carried inside [`Error::AssetStore`] and
/// [`Error::Persistence`].
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Error)]
pub enum Error {
  #[error("could not find user {0}")]
  UserNotFound(Uuid),

  #[error("photo not found: {0}")]
  PhotoNotFound(Uuid),

  #[error("caller may not act on behalf of user {0}")]
  Unauthorized(Uuid),

  #[error("photo {0} is already the main photo")]
  AlreadyMain(Uuid),

  #[error("cannot delete main photo {0}")]
  CannotDeleteMain(Uuid),

  #[error("upload contains no file data")]
  EmptyUpload,

  #[error("invalid registration: {0}")]
  InvalidRegistration(&'static str),

  #[error("asset store error: {0}")]
  AssetStore(#[source] BoxError),

  #[error("persistence error: {0}")]
  Persistence(#[source] BoxError),
}

impl Error {
  /// Short, stable category name for the error; used in API error bodies.
  pub fn kind(&self) -> &'static str {
    match self {
      Self::UserNotFound(_) => "user_not_found",
      Self::PhotoNotFound(_) => "photo_not_found",
      Self::Unauthorized(_) => "unauthorized",
      Self::AlreadyMain(_) => "already_main",
      Self::CannotDeleteMain(_) => "cannot_delete_main",
      Self::EmptyUpload => "empty_upload",
      Self::InvalidRegistration(_) => "invalid_registration",
      Self::AssetStore(_) => "asset_store",
      Self::Persistence(_) => "persistence",
    }
  }

  pub(crate) fn persistence<E>(e: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::Persistence(Box::new(e))
  }

  pub(crate) fn asset_store<E>(e: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::AssetStore(Box::new(e))
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
