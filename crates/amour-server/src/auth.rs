//! HTTP Basic-auth extractor resolving the caller's [`Identity`].

use amour_core::{asset::AssetStore, store::PhotoStore, user::Identity};
use argon2::{
  Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
  password_hash::SaltString,
};
use axum::extract::FromRequestParts;
use axum::http::{HeaderMap, request::Parts};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as B64;
use rand_core::OsRng;

use crate::{AppState, error::Error};

/// The authenticated caller. Present in a handler means the request carried
/// valid credentials for a registered user.
pub struct Caller(pub Identity);

/// Produce the argon2 PHC string stored for `password`.
pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
  let salt = SaltString::generate(&mut OsRng);
  Ok(Argon2::default().hash_password(password.as_bytes(), &salt)?.to_string())
}

/// Split the `Authorization: Basic …` header into username and password.
fn basic_credentials(headers: &HeaderMap) -> Result<(String, String), Error> {
  let header_val = headers
    .get(axum::http::header::AUTHORIZATION)
    .and_then(|v| v.to_str().ok())
    .ok_or(Error::Unauthenticated)?;

  let encoded = header_val
    .strip_prefix("Basic ")
    .ok_or(Error::Unauthenticated)?;

  let decoded = B64.decode(encoded).map_err(|_| Error::Unauthenticated)?;
  let creds   = String::from_utf8(decoded).map_err(|_| Error::Unauthenticated)?;

  let (username, password) = creds.split_once(':').ok_or(Error::Unauthenticated)?;
  Ok((username.to_owned(), password.to_owned()))
}

/// Verify the request's credentials against the store.
pub async fn authenticate<S>(headers: &HeaderMap, store: &S) -> Result<Identity, Error>
where
  S: PhotoStore,
{
  let (username, password) = basic_credentials(headers)?;

  let (user_id, hash) = store
    .find_credentials(&username)
    .await
    .map_err(|e| Error::Store(Box::new(e)))?
    .ok_or(Error::Unauthenticated)?;

  let parsed_hash = PasswordHash::new(&hash).map_err(|_| Error::Unauthenticated)?;
  Argon2::default()
    .verify_password(password.as_bytes(), &parsed_hash)
    .map_err(|_| Error::Unauthenticated)?;

  Ok(Identity::new(user_id))
}

impl<S, A> FromRequestParts<AppState<S, A>> for Caller
where
  S: PhotoStore + 'static,
  A: AssetStore + 'static,
{
  type Rejection = Error;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<S, A>,
  ) -> Result<Self, Self::Rejection> {
    let identity = authenticate(&parts.headers, state.photos.store().as_ref()).await?;
    Ok(Caller(identity))
  }
}
