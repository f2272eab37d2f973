//! Error types and axum `IntoResponse` implementation.
//!
//! Every error body is `{"error": <message>, "kind": <category>}` so clients
//! can tell failure categories apart without parsing messages.

use amour_core::BoxError;
use axum::{
  Json,
  http::{HeaderValue, StatusCode, header},
  response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// Missing or invalid credentials.
  #[error("authentication required")]
  Unauthenticated,

  #[error(transparent)]
  Photo(#[from] amour_core::Error),

  #[error("bad request: {0}")]
  BadRequest(String),

  #[error("store error: {0}")]
  Store(#[source] BoxError),
}

impl Error {
  fn status_and_kind(&self) -> (StatusCode, &'static str) {
    use amour_core::Error as E;
    match self {
      Error::Unauthenticated => (StatusCode::UNAUTHORIZED, "unauthenticated"),
      Error::BadRequest(_) => (StatusCode::BAD_REQUEST, "bad_request"),
      Error::Store(_) => (StatusCode::INTERNAL_SERVER_ERROR, "store"),
      Error::Photo(e) => {
        let status = match e {
          E::PhotoNotFound(_) => StatusCode::NOT_FOUND,
          E::Unauthorized(_) => StatusCode::UNAUTHORIZED,
          E::UserNotFound(_)
          | E::AlreadyMain(_)
          | E::CannotDeleteMain(_)
          | E::EmptyUpload
          | E::InvalidRegistration(_)
          | E::AssetStore(_)
          | E::Persistence(_) => StatusCode::BAD_REQUEST,
        };
        (status, e.kind())
      }
    }
  }
}

impl Error {
  /// Failures of the database or the asset host, as opposed to requests
  /// refused by a lifecycle rule.
  fn is_backend_failure(&self) -> bool {
    matches!(
      self,
      Error::Store(_)
        | Error::Photo(amour_core::Error::Persistence(_) | amour_core::Error::AssetStore(_))
    )
  }
}

impl IntoResponse for Error {
  fn into_response(self) -> Response {
    let (status, kind) = self.status_and_kind();
    if status.is_server_error() {
      tracing::error!(error = %self, kind, "request failed");
    } else if self.is_backend_failure() {
      tracing::warn!(error = %self, kind, "backend failure");
    }

    let mut res =
      (status, Json(json!({ "error": self.to_string(), "kind": kind }))).into_response();
    if matches!(self, Error::Unauthenticated) {
      res.headers_mut().insert(
        header::WWW_AUTHENTICATE,
        HeaderValue::from_static("Basic realm=\"amour\""),
      );
    }
    res
  }
}
