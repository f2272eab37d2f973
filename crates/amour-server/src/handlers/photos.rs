//! Handlers for `/users/{user_id}/photos` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/users/{user_id}/photos` | Main photo first |
//! | `POST`   | `/users/{user_id}/photos` | Multipart `file` (+ optional `description`); 201 + `Location` |
//! | `GET`    | `/users/{user_id}/photos/{id}` | 404 if not found |
//! | `POST`   | `/users/{user_id}/photos/{id}/setMain` | 204 |
//! | `DELETE` | `/users/{user_id}/photos/{id}` | 200; the main photo cannot be deleted |

use amour_core::{
  asset::AssetStore,
  photo::{PhotoView, Upload},
  store::PhotoStore,
};
use axum::{
  Json,
  extract::{Multipart, Path, State},
  http::{StatusCode, header},
  response::IntoResponse,
};
use bytes::Bytes;
use uuid::Uuid;

use crate::{AppState, auth::Caller, error::Error};

/// Where a created photo can be fetched from.
pub fn photo_location(user_id: Uuid, photo_id: Uuid) -> String {
  format!("/users/{user_id}/photos/{photo_id}")
}

// ─── List ─────────────────────────────────────────────────────────────────────

/// `GET /users/{user_id}/photos`
pub async fn list<S, A>(
  State(state): State<AppState<S, A>>,
  _caller: Caller,
  Path(user_id): Path<Uuid>,
) -> Result<Json<Vec<PhotoView>>, Error>
where
  S: PhotoStore + 'static,
  A: AssetStore + 'static,
{
  Ok(Json(state.photos.list_photos(user_id).await?))
}

// ─── Get one ──────────────────────────────────────────────────────────────────

/// `GET /users/{user_id}/photos/{id}`
pub async fn get_one<S, A>(
  State(state): State<AppState<S, A>>,
  _caller: Caller,
  Path((user_id, photo_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<PhotoView>, Error>
where
  S: PhotoStore + 'static,
  A: AssetStore + 'static,
{
  Ok(Json(state.photos.retrieve_photo(user_id, photo_id).await?))
}

// ─── Create ───────────────────────────────────────────────────────────────────

/// Collect the `file` and optional `description` fields of the form.
async fn read_upload(mut multipart: Multipart) -> Result<Upload, Error> {
  let mut file: Option<(String, Option<String>, Bytes)> = None;
  let mut description = None;

  while let Some(field) = multipart
    .next_field()
    .await
    .map_err(|e| Error::BadRequest(e.body_text()))?
  {
    let name = field.name().map(str::to_owned);
    match name.as_deref() {
      Some("file") => {
        let file_name = field.file_name().unwrap_or("upload").to_owned();
        let content_type = field.content_type().map(str::to_owned);
        let bytes = field
          .bytes()
          .await
          .map_err(|e| Error::BadRequest(e.body_text()))?;
        file = Some((file_name, content_type, bytes));
      }
      Some("description") => {
        let text = field
          .text()
          .await
          .map_err(|e| Error::BadRequest(e.body_text()))?;
        description = Some(text).filter(|t| !t.trim().is_empty());
      }
      _ => {}
    }
  }

  let (file_name, content_type, bytes) =
    file.ok_or_else(|| Error::BadRequest("missing `file` field".to_owned()))?;
  Ok(Upload { file_name, content_type, bytes, description })
}

/// `POST /users/{user_id}/photos`: returns 201 + the new [`PhotoView`].
pub async fn create<S, A>(
  State(state): State<AppState<S, A>>,
  Caller(identity): Caller,
  Path(user_id): Path<Uuid>,
  multipart: Multipart,
) -> Result<impl IntoResponse, Error>
where
  S: PhotoStore + 'static,
  A: AssetStore + 'static,
{
  // Refuse the caller before reading a possibly large body.
  state.photos.check_add_photo(&identity, user_id).await?;
  let upload = read_upload(multipart).await?;
  let view = state.photos.add_photo(&identity, user_id, upload).await?;
  let location = photo_location(user_id, view.id);
  Ok((StatusCode::CREATED, [(header::LOCATION, location)], Json(view)))
}

// ─── Set main ─────────────────────────────────────────────────────────────────

/// `POST /users/{user_id}/photos/{id}/setMain`: 204 on success.
pub async fn set_main<S, A>(
  State(state): State<AppState<S, A>>,
  Caller(identity): Caller,
  Path((user_id, photo_id)): Path<(Uuid, Uuid)>,
) -> Result<StatusCode, Error>
where
  S: PhotoStore + 'static,
  A: AssetStore + 'static,
{
  state.photos.set_main_photo(&identity, user_id, photo_id).await?;
  Ok(StatusCode::NO_CONTENT)
}

// ─── Delete ───────────────────────────────────────────────────────────────────

/// `DELETE /users/{user_id}/photos/{id}`: 200 on success.
pub async fn delete_one<S, A>(
  State(state): State<AppState<S, A>>,
  Caller(identity): Caller,
  Path((user_id, photo_id)): Path<(Uuid, Uuid)>,
) -> Result<StatusCode, Error>
where
  S: PhotoStore + 'static,
  A: AssetStore + 'static,
{
  state.photos.delete_photo(&identity, user_id, photo_id).await?;
  Ok(StatusCode::OK)
}
