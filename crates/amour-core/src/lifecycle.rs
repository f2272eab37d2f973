//! The photo lifecycle manager.
//!
//! [`PhotoLifecycle`] orchestrates one request-scoped mutation at a time:
//! authorization checks, the asset-host call, and a single [`Changeset`]
//! commit. It keeps no state of its own between calls.
//!
//! Every user who owns at least one photo has exactly one main photo. The
//! rule is maintained incrementally: the first photo added becomes main,
//! promoting a photo demotes the previous main in the same commit, and the
//! main photo can never be deleted directly.

use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
  Error, Result,
  asset::{AssetStore, Destroyed, StoredAsset},
  photo::{Photo, PhotoView, Upload},
  store::{Changeset, PhotoStore},
  user::{Identity, User},
};

pub struct PhotoLifecycle<S, A> {
  store:  Arc<S>,
  assets: Arc<A>,
}

impl<S, A> Clone for PhotoLifecycle<S, A> {
  fn clone(&self) -> Self {
    Self { store: Arc::clone(&self.store), assets: Arc::clone(&self.assets) }
  }
}

impl<S, A> PhotoLifecycle<S, A>
where
  S: PhotoStore,
  A: AssetStore,
{
  pub fn new(store: Arc<S>, assets: Arc<A>) -> Self { Self { store, assets } }

  pub fn store(&self) -> &Arc<S> { &self.store }

  // ── Reads ─────────────────────────────────────────────────────────────

  /// Fetch one photo of `user_id`. Ownership of the caller is not checked.
  pub async fn retrieve_photo(
    &self,
    user_id: Uuid,
    photo_id: Uuid,
  ) -> Result<PhotoView> {
    self
      .store
      .get_photo_for_user(user_id, photo_id)
      .await
      .map_err(Error::persistence)?
      .map(PhotoView::from)
      .ok_or(Error::PhotoNotFound(photo_id))
  }

  /// All photos of `user_id`, main photo first.
  pub async fn list_photos(&self, user_id: Uuid) -> Result<Vec<PhotoView>> {
    self.require_user(user_id).await?;
    let photos = self
      .store
      .list_photos(user_id)
      .await
      .map_err(Error::persistence)?;
    Ok(photos.into_iter().map(PhotoView::from).collect())
  }

  // ── Add ───────────────────────────────────────────────────────────────

  /// The checks [`Self::add_photo`] runs before touching the upload, so a
  /// caller can be refused before the request body is read.
  pub async fn check_add_photo(&self, caller: &Identity, user_id: Uuid) -> Result<()> {
    self.require_user(user_id).await?;
    caller.authorize(user_id)
  }

  /// Upload a new photo for `user_id`.
  ///
  /// The user is resolved before the caller is checked. The new photo
  /// becomes main only if the user has no main photo at commit time.
  pub async fn add_photo(
    &self,
    caller: &Identity,
    user_id: Uuid,
    upload: Upload,
  ) -> Result<PhotoView> {
    self.check_add_photo(caller, user_id).await?;

    if upload.is_empty() {
      return Err(Error::EmptyUpload);
    }

    let description = upload.description.clone();
    let asset = self
      .assets
      .upload(upload)
      .await
      .map_err(Error::asset_store)?;

    match self.record_upload(user_id, &asset, description).await {
      Ok(photo) => {
        info!(
          user_id = %user_id,
          photo_id = %photo.photo_id,
          is_main = photo.is_main,
          "photo added"
        );
        Ok(PhotoView::from(photo))
      }
      Err(e) => {
        self.discard_asset(&asset.asset_id).await;
        Err(e)
      }
    }
  }

  /// The protected section of [`Self::add_photo`]: runs after the upload so
  /// the external call never overlaps the read-modify-write.
  async fn record_upload(
    &self,
    user_id: Uuid,
    asset: &StoredAsset,
    description: Option<String>,
  ) -> Result<Photo> {
    let user = self.require_user(user_id).await?;
    let has_main = self
      .store
      .get_main_photo(user_id)
      .await
      .map_err(Error::persistence)?
      .is_some();

    let photo = Photo {
      photo_id: Uuid::new_v4(),
      user_id: user.user_id,
      url: asset.url.clone(),
      asset_id: Some(asset.asset_id.clone()),
      description,
      is_main: !has_main,
      added_at: Utc::now(),
    };

    let mut changes = Changeset::new(&user);
    changes.insert(photo.clone());
    self.store.commit(changes).await.map_err(Error::persistence)?;

    Ok(photo)
  }

  async fn discard_asset(&self, asset_id: &str) {
    match self.assets.destroy(asset_id).await {
      Ok(_) => warn!(asset_id, "discarded uploaded asset after failed commit"),
      Err(e) => warn!(
        asset_id,
        error = %e,
        "failed to discard uploaded asset after failed commit"
      ),
    }
  }

  // ── Set main ──────────────────────────────────────────────────────────

  /// Make `photo_id` the main photo of `user_id`, demoting the current one
  /// in the same commit.
  pub async fn set_main_photo(
    &self,
    caller: &Identity,
    user_id: Uuid,
    photo_id: Uuid,
  ) -> Result<()> {
    caller.authorize(user_id)?;

    let user = self.require_user(user_id).await?;
    let photo = self.require_photo(user_id, photo_id).await?;
    if photo.is_main {
      return Err(Error::AlreadyMain(photo_id));
    }

    let mut changes = Changeset::new(&user);
    let current = self
      .store
      .get_main_photo(user_id)
      .await
      .map_err(Error::persistence)?;
    if let Some(current) = current
      && current.photo_id != photo.photo_id
    {
      changes.set_main(current.photo_id, false);
    }
    changes.set_main(photo.photo_id, true);

    self.store.commit(changes).await.map_err(Error::persistence)?;

    info!(user_id = %user_id, photo_id = %photo_id, "main photo changed");
    Ok(())
  }

  // ── Delete ────────────────────────────────────────────────────────────

  /// Delete a non-main photo, destroying its hosted asset first.
  ///
  /// If the asset host refuses the deletion the photo stays persisted and
  /// the call fails with [`Error::AssetStore`]. An asset the host no longer
  /// has does not block the delete, so a delete whose commit failed after the
  /// asset was destroyed can simply be retried.
  pub async fn delete_photo(
    &self,
    caller: &Identity,
    user_id: Uuid,
    photo_id: Uuid,
  ) -> Result<()> {
    caller.authorize(user_id)?;

    let user = self.require_user(user_id).await?;
    let photo = self.require_photo(user_id, photo_id).await?;
    if photo.is_main {
      return Err(Error::CannotDeleteMain(photo_id));
    }

    if let Some(asset_id) = photo.asset_id.as_deref() {
      let outcome = self
        .assets
        .destroy(asset_id)
        .await
        .map_err(Error::asset_store)?;
      if outcome == Destroyed::AlreadyGone {
        warn!(photo_id = %photo_id, asset_id, "asset already gone, removing photo");
      }
    }

    let mut changes = Changeset::new(&user);
    changes.delete(photo_id);
    if let Err(e) = self.store.commit(changes).await {
      if let Some(asset_id) = photo.asset_id.as_deref() {
        warn!(
          photo_id = %photo_id,
          asset_id,
          "photo kept after its asset was destroyed; retry the delete"
        );
      }
      return Err(Error::persistence(e));
    }

    info!(user_id = %user_id, photo_id = %photo_id, "photo deleted");
    Ok(())
  }

  // ── Helpers ───────────────────────────────────────────────────────────

  async fn require_user(&self, user_id: Uuid) -> Result<User> {
    self
      .store
      .get_user(user_id)
      .await
      .map_err(Error::persistence)?
      .ok_or(Error::UserNotFound(user_id))
  }

  async fn require_photo(&self, user_id: Uuid, photo_id: Uuid) -> Result<Photo> {
    self
      .store
      .get_photo_for_user(user_id, photo_id)
      .await
      .map_err(Error::persistence)?
      .ok_or(Error::PhotoNotFound(photo_id))
  }
}
