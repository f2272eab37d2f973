//! Error type for `amour-assets`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("http error: {0}")]
  Http(#[from] reqwest::Error),

  #[error("io error: {0}")]
  Io(#[from] std::io::Error),

  /// The asset host answered but refused the request.
  #[error("asset host rejected request: {0}")]
  Rejected(String),

  #[error("invalid asset id: {0:?}")]
  InvalidAssetId(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
