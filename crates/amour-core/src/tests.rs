//! Lifecycle tests against an in-memory store and a scriptable asset host.

use std::{collections::HashMap, sync::Arc};

use chrono::Utc;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::{
  Error, PhotoLifecycle,
  asset::{AssetStore, Destroyed, StoredAsset},
  photo::{Photo, Upload},
  store::{Change, Changeset, PhotoStore},
  user::{Identity, User},
};

// ─── In-memory store ─────────────────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
enum MemoryError {
  #[error("version conflict")]
  Conflict,
  #[error("commit refused")]
  Refused,
  #[error("user not found")]
  UserNotFound,
  #[error("photo not found")]
  PhotoNotFound,
  #[error("more than one main photo")]
  TwoMains,
}

#[derive(Default)]
struct MemoryState {
  users:       HashMap<Uuid, User>,
  photos:      HashMap<Uuid, Photo>,
  commits:     usize,
  refuse_next: bool,
}

#[derive(Default)]
struct MemoryStore {
  state: Mutex<MemoryState>,
}

impl MemoryStore {
  async fn photos_of(&self, user_id: Uuid) -> Vec<Photo> {
    let state = self.state.lock().await;
    state.photos.values().filter(|p| p.user_id == user_id).cloned().collect()
  }

  async fn commits(&self) -> usize { self.state.lock().await.commits }

  async fn refuse_next_commit(&self) { self.state.lock().await.refuse_next = true; }

  async fn bump_version(&self, user_id: Uuid) {
    let mut state = self.state.lock().await;
    if let Some(user) = state.users.get_mut(&user_id) {
      user.version += 1;
    }
  }

  /// Seed a photo directly, bypassing the lifecycle.
  async fn seed_photo(&self, user_id: Uuid, is_main: bool, asset: bool) -> Photo {
    let photo = Photo {
      photo_id: Uuid::new_v4(),
      user_id,
      url: "https://img.example/seed.jpg".into(),
      asset_id: asset.then(|| format!("seed-{}", Uuid::new_v4())),
      description: None,
      is_main,
      added_at: Utc::now(),
    };
    self.state.lock().await.photos.insert(photo.photo_id, photo.clone());
    photo
  }
}

impl PhotoStore for MemoryStore {
  type Error = MemoryError;

  async fn add_user(&self, username: String, _hash: String) -> Result<User, MemoryError> {
    let user = User {
      user_id: Uuid::new_v4(),
      username,
      created_at: Utc::now(),
      version: 0,
    };
    self.state.lock().await.users.insert(user.user_id, user.clone());
    Ok(user)
  }

  async fn get_user(&self, user_id: Uuid) -> Result<Option<User>, MemoryError> {
    Ok(self.state.lock().await.users.get(&user_id).cloned())
  }

  async fn find_credentials(&self, _: &str) -> Result<Option<(Uuid, String)>, MemoryError> {
    Ok(None)
  }

  async fn get_photo(&self, photo_id: Uuid) -> Result<Option<Photo>, MemoryError> {
    Ok(self.state.lock().await.photos.get(&photo_id).cloned())
  }

  async fn get_photo_for_user(
    &self,
    user_id: Uuid,
    photo_id: Uuid,
  ) -> Result<Option<Photo>, MemoryError> {
    let state = self.state.lock().await;
    Ok(state.photos.get(&photo_id).filter(|p| p.user_id == user_id).cloned())
  }

  async fn get_main_photo(&self, user_id: Uuid) -> Result<Option<Photo>, MemoryError> {
    let state = self.state.lock().await;
    Ok(
      state
        .photos
        .values()
        .find(|p| p.user_id == user_id && p.is_main)
        .cloned(),
    )
  }

  async fn list_photos(&self, user_id: Uuid) -> Result<Vec<Photo>, MemoryError> {
    Ok(self.photos_of(user_id).await)
  }

  async fn commit(&self, changeset: Changeset) -> Result<u64, MemoryError> {
    let mut state = self.state.lock().await;
    if std::mem::take(&mut state.refuse_next) {
      return Err(MemoryError::Refused);
    }
    let user = state
      .users
      .get(&changeset.user_id)
      .cloned()
      .ok_or(MemoryError::UserNotFound)?;
    if user.version != changeset.expected_version {
      return Err(MemoryError::Conflict);
    }

    let mut photos = state.photos.clone();
    for change in changeset.changes {
      match change {
        Change::Insert(photo) => {
          photos.insert(photo.photo_id, photo);
        }
        Change::SetMain { photo_id, is_main } => {
          photos
            .get_mut(&photo_id)
            .ok_or(MemoryError::PhotoNotFound)?
            .is_main = is_main;
        }
        Change::Delete(photo_id) => {
          photos.remove(&photo_id).ok_or(MemoryError::PhotoNotFound)?;
        }
      }
    }
    let mains = photos
      .values()
      .filter(|p| p.user_id == user.user_id && p.is_main)
      .count();
    if mains > 1 {
      return Err(MemoryError::TwoMains);
    }

    state.photos = photos;
    state.commits += 1;
    let entry = state.users.get_mut(&user.user_id).ok_or(MemoryError::UserNotFound)?;
    entry.version += 1;
    Ok(entry.version)
  }
}

// ─── Scriptable asset host ───────────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
#[error("asset host unavailable")]
struct AssetDown;

#[derive(Default)]
struct AssetState {
  uploads:      usize,
  destroyed:    Vec<String>,
  fail_upload:  bool,
  fail_destroy: bool,
}

#[derive(Default)]
struct FakeAssets {
  state: Mutex<AssetState>,
}

impl FakeAssets {
  async fn calls(&self) -> usize {
    let state = self.state.lock().await;
    state.uploads + state.destroyed.len()
  }
}

impl AssetStore for FakeAssets {
  type Error = AssetDown;

  async fn upload(&self, upload: Upload) -> Result<StoredAsset, AssetDown> {
    let mut state = self.state.lock().await;
    if state.fail_upload {
      return Err(AssetDown);
    }
    state.uploads += 1;
    let asset_id = format!("asset-{}", state.uploads);
    Ok(StoredAsset {
      url: format!("https://img.example/{asset_id}/{}", upload.file_name),
      asset_id,
    })
  }

  async fn destroy(&self, asset_id: &str) -> Result<Destroyed, AssetDown> {
    let mut state = self.state.lock().await;
    if state.fail_destroy {
      return Err(AssetDown);
    }
    if state.destroyed.iter().any(|d| d == asset_id) {
      return Ok(Destroyed::AlreadyGone);
    }
    state.destroyed.push(asset_id.to_owned());
    Ok(Destroyed::Removed)
  }
}

// ─── Fixtures ────────────────────────────────────────────────────────────────

struct Fixture {
  store:     Arc<MemoryStore>,
  assets:    Arc<FakeAssets>,
  lifecycle: PhotoLifecycle<MemoryStore, FakeAssets>,
  user:      User,
  me:        Identity,
}

async fn fixture() -> Fixture {
  let store = Arc::new(MemoryStore::default());
  let assets = Arc::new(FakeAssets::default());
  let user = store.add_user("alice".into(), String::new()).await.unwrap();
  Fixture {
    lifecycle: PhotoLifecycle::new(store.clone(), assets.clone()),
    me: Identity::new(user.user_id),
    store,
    assets,
    user,
  }
}

fn jpeg() -> Upload { Upload::new("me.jpg", vec![0xff, 0xd8, 0xff]) }

async fn mains(store: &MemoryStore, user_id: Uuid) -> usize {
  store.photos_of(user_id).await.iter().filter(|p| p.is_main).count()
}

// ─── AddPhoto ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn first_photo_becomes_main() {
  let f = fixture().await;
  let view = f.lifecycle.add_photo(&f.me, f.user.user_id, jpeg()).await.unwrap();

  assert!(view.is_main);
  assert!(view.url.starts_with("https://img.example/asset-1/"));
  assert_eq!(f.store.commits().await, 1);
}

#[tokio::test]
async fn later_photos_are_not_main() {
  let f = fixture().await;
  f.lifecycle.add_photo(&f.me, f.user.user_id, jpeg()).await.unwrap();
  let second = f.lifecycle.add_photo(&f.me, f.user.user_id, jpeg()).await.unwrap();

  assert!(!second.is_main);
  assert_eq!(mains(&f.store, f.user.user_id).await, 1);
}

#[tokio::test]
async fn add_photo_keeps_description_and_asset_id() {
  let f = fixture().await;
  let mut upload = jpeg();
  upload.description = Some("at the beach".into());
  let view = f.lifecycle.add_photo(&f.me, f.user.user_id, upload).await.unwrap();

  let stored = f.store.get_photo(view.id).await.unwrap().unwrap();
  assert_eq!(stored.description.as_deref(), Some("at the beach"));
  assert_eq!(stored.asset_id.as_deref(), Some("asset-1"));
  assert_eq!(stored.user_id, f.user.user_id);
}

#[tokio::test]
async fn add_photo_for_unknown_user_is_not_found() {
  let f = fixture().await;
  let ghost = Uuid::new_v4();
  let err = f
    .lifecycle
    .add_photo(&Identity::new(ghost), ghost, jpeg())
    .await
    .unwrap_err();
  assert!(matches!(err, Error::UserNotFound(id) if id == ghost));
}

#[tokio::test]
async fn add_photo_rejects_empty_file_before_upload() {
  let f = fixture().await;
  let err = f
    .lifecycle
    .add_photo(&f.me, f.user.user_id, Upload::new("empty.jpg", Vec::new()))
    .await
    .unwrap_err();
  assert!(matches!(err, Error::EmptyUpload));
  assert_eq!(f.assets.calls().await, 0);
  assert_eq!(f.store.commits().await, 0);
}

#[tokio::test]
async fn failed_upload_commits_nothing() {
  let f = fixture().await;
  f.assets.state.lock().await.fail_upload = true;

  let err = f.lifecycle.add_photo(&f.me, f.user.user_id, jpeg()).await.unwrap_err();
  assert!(matches!(err, Error::AssetStore(_)));
  assert!(f.store.photos_of(f.user.user_id).await.is_empty());
}

#[tokio::test]
async fn failed_commit_discards_uploaded_asset() {
  let f = fixture().await;
  f.store.refuse_next_commit().await;

  let err = f.lifecycle.add_photo(&f.me, f.user.user_id, jpeg()).await.unwrap_err();
  assert!(matches!(err, Error::Persistence(_)));
  assert!(f.store.photos_of(f.user.user_id).await.is_empty());
  assert_eq!(f.assets.state.lock().await.destroyed, vec!["asset-1".to_owned()]);
}

// ─── Authorization ───────────────────────────────────────────────────────────

#[tokio::test]
async fn check_add_photo_resolves_user_then_caller() {
  let f = fixture().await;
  f.lifecycle.check_add_photo(&f.me, f.user.user_id).await.unwrap();

  let mallory = Identity::new(Uuid::new_v4());
  let other = f.lifecycle.check_add_photo(&mallory, f.user.user_id).await;
  assert!(matches!(other, Err(Error::Unauthorized(_))));

  let ghost = f.lifecycle.check_add_photo(&mallory, Uuid::new_v4()).await;
  assert!(matches!(ghost, Err(Error::UserNotFound(_))));
}

#[tokio::test]
async fn other_callers_are_rejected_before_any_side_effect() {
  let f = fixture().await;
  let main = f.store.seed_photo(f.user.user_id, true, true).await;
  let other = f.store.seed_photo(f.user.user_id, false, true).await;
  let mallory = Identity::new(Uuid::new_v4());

  let add = f.lifecycle.add_photo(&mallory, f.user.user_id, jpeg()).await;
  let set = f.lifecycle.set_main_photo(&mallory, f.user.user_id, other.photo_id).await;
  let del = f.lifecycle.delete_photo(&mallory, f.user.user_id, other.photo_id).await;

  assert!(matches!(add, Err(Error::Unauthorized(_))));
  assert!(matches!(set, Err(Error::Unauthorized(_))));
  assert!(matches!(del, Err(Error::Unauthorized(_))));
  assert_eq!(f.assets.calls().await, 0);
  assert_eq!(f.store.commits().await, 0);

  let stored = f.store.get_photo(main.photo_id).await.unwrap().unwrap();
  assert!(stored.is_main);
  assert!(f.store.get_photo(other.photo_id).await.unwrap().is_some());
}

#[tokio::test]
async fn photo_of_another_user_cannot_be_promoted_or_deleted() {
  let f = fixture().await;
  let bob = f.store.add_user("bob".into(), String::new()).await.unwrap();
  let bobs = f.store.seed_photo(bob.user_id, false, true).await;

  let set = f.lifecycle.set_main_photo(&f.me, f.user.user_id, bobs.photo_id).await;
  let del = f.lifecycle.delete_photo(&f.me, f.user.user_id, bobs.photo_id).await;

  assert!(matches!(set, Err(Error::PhotoNotFound(_))));
  assert!(matches!(del, Err(Error::PhotoNotFound(_))));
  assert!(!f.store.get_photo(bobs.photo_id).await.unwrap().unwrap().is_main);
  assert_eq!(f.assets.calls().await, 0);
}

// ─── SetMainPhoto ────────────────────────────────────────────────────────────

#[tokio::test]
async fn set_main_swaps_flags_in_one_commit() {
  let f = fixture().await;
  let a = f.lifecycle.add_photo(&f.me, f.user.user_id, jpeg()).await.unwrap();
  let b = f.lifecycle.add_photo(&f.me, f.user.user_id, jpeg()).await.unwrap();
  let before = f.store.commits().await;

  f.lifecycle.set_main_photo(&f.me, f.user.user_id, b.id).await.unwrap();

  assert_eq!(f.store.commits().await, before + 1);
  assert!(!f.store.get_photo(a.id).await.unwrap().unwrap().is_main);
  assert!(f.store.get_photo(b.id).await.unwrap().unwrap().is_main);

  let again = f.lifecycle.set_main_photo(&f.me, f.user.user_id, b.id).await;
  assert!(matches!(again, Err(Error::AlreadyMain(id)) if id == b.id));
  assert_eq!(f.store.commits().await, before + 1);
  assert!(f.store.get_photo(b.id).await.unwrap().unwrap().is_main);
  assert!(!f.store.get_photo(a.id).await.unwrap().unwrap().is_main);
}

#[tokio::test]
async fn set_main_without_existing_main_sets_only_target() {
  let f = fixture().await;
  let lone = f.store.seed_photo(f.user.user_id, false, false).await;

  f.lifecycle.set_main_photo(&f.me, f.user.user_id, lone.photo_id).await.unwrap();
  assert_eq!(mains(&f.store, f.user.user_id).await, 1);
}

#[tokio::test]
async fn set_main_on_missing_photo_is_not_found() {
  let f = fixture().await;
  let err = f
    .lifecycle
    .set_main_photo(&f.me, f.user.user_id, Uuid::new_v4())
    .await
    .unwrap_err();
  assert!(matches!(err, Error::PhotoNotFound(_)));
}

#[tokio::test]
async fn failed_set_main_commit_leaves_flags_untouched() {
  let f = fixture().await;
  let a = f.lifecycle.add_photo(&f.me, f.user.user_id, jpeg()).await.unwrap();
  let b = f.lifecycle.add_photo(&f.me, f.user.user_id, jpeg()).await.unwrap();
  f.store.refuse_next_commit().await;

  let err = f.lifecycle.set_main_photo(&f.me, f.user.user_id, b.id).await.unwrap_err();
  assert!(matches!(err, Error::Persistence(_)));
  assert!(f.store.get_photo(a.id).await.unwrap().unwrap().is_main);
  assert!(!f.store.get_photo(b.id).await.unwrap().unwrap().is_main);
}

#[tokio::test]
async fn stale_version_is_a_persistence_error() {
  let f = fixture().await;
  f.lifecycle.add_photo(&f.me, f.user.user_id, jpeg()).await.unwrap();
  let b = f.lifecycle.add_photo(&f.me, f.user.user_id, jpeg()).await.unwrap();

  let user = f.store.get_user(f.user.user_id).await.unwrap().unwrap();
  f.store.bump_version(f.user.user_id).await;

  let mut stale = Changeset::new(&user);
  stale.set_main(b.id, true);
  assert!(matches!(f.store.commit(stale).await, Err(MemoryError::Conflict)));
  assert_eq!(mains(&f.store, f.user.user_id).await, 1);
}

// ─── DeletePhoto ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn main_photo_cannot_be_deleted() {
  let f = fixture().await;
  let a = f.lifecycle.add_photo(&f.me, f.user.user_id, jpeg()).await.unwrap();

  let err = f.lifecycle.delete_photo(&f.me, f.user.user_id, a.id).await.unwrap_err();
  assert!(matches!(err, Error::CannotDeleteMain(id) if id == a.id));

  let stored = f.store.get_photo(a.id).await.unwrap().unwrap();
  assert!(stored.is_main);
  assert!(f.assets.state.lock().await.destroyed.is_empty());
}

#[tokio::test]
async fn delete_destroys_asset_then_removes_photo() {
  let f = fixture().await;
  f.lifecycle.add_photo(&f.me, f.user.user_id, jpeg()).await.unwrap();
  let b = f.lifecycle.add_photo(&f.me, f.user.user_id, jpeg()).await.unwrap();

  f.lifecycle.delete_photo(&f.me, f.user.user_id, b.id).await.unwrap();

  assert!(f.store.get_photo(b.id).await.unwrap().is_none());
  assert_eq!(f.assets.state.lock().await.destroyed, vec!["asset-2".to_owned()]);
  assert_eq!(mains(&f.store, f.user.user_id).await, 1);
}

#[tokio::test]
async fn delete_without_asset_skips_asset_host() {
  let f = fixture().await;
  f.store.seed_photo(f.user.user_id, true, false).await;
  let legacy = f.store.seed_photo(f.user.user_id, false, false).await;

  f.lifecycle.delete_photo(&f.me, f.user.user_id, legacy.photo_id).await.unwrap();

  assert!(f.store.get_photo(legacy.photo_id).await.unwrap().is_none());
  assert_eq!(f.assets.calls().await, 0);
}

#[tokio::test]
async fn asset_host_failure_keeps_photo() {
  let f = fixture().await;
  f.store.seed_photo(f.user.user_id, true, true).await;
  let c = f.store.seed_photo(f.user.user_id, false, true).await;
  f.assets.state.lock().await.fail_destroy = true;

  let err = f.lifecycle.delete_photo(&f.me, f.user.user_id, c.photo_id).await.unwrap_err();
  assert!(matches!(err, Error::AssetStore(_)));
  assert_eq!(f.store.get_photo(c.photo_id).await.unwrap(), Some(c));
  assert_eq!(f.store.commits().await, 0);
}

#[tokio::test]
async fn delete_can_be_retried_after_commit_fails() {
  let f = fixture().await;
  f.lifecycle.add_photo(&f.me, f.user.user_id, jpeg()).await.unwrap();
  let b = f.lifecycle.add_photo(&f.me, f.user.user_id, jpeg()).await.unwrap();
  f.store.refuse_next_commit().await;

  let err = f.lifecycle.delete_photo(&f.me, f.user.user_id, b.id).await.unwrap_err();
  assert!(matches!(err, Error::Persistence(_)));
  assert!(f.store.get_photo(b.id).await.unwrap().is_some());
  assert_eq!(f.assets.state.lock().await.destroyed, vec!["asset-2".to_owned()]);

  f.lifecycle.delete_photo(&f.me, f.user.user_id, b.id).await.unwrap();
  assert!(f.store.get_photo(b.id).await.unwrap().is_none());
  assert_eq!(mains(&f.store, f.user.user_id).await, 1);
}

#[tokio::test]
async fn delete_missing_photo_is_not_found() {
  let f = fixture().await;
  let err = f
    .lifecycle
    .delete_photo(&f.me, f.user.user_id, Uuid::new_v4())
    .await
    .unwrap_err();
  assert!(matches!(err, Error::PhotoNotFound(_)));
}

// ─── Reads and the single-main property ──────────────────────────────────────

#[tokio::test]
async fn retrieve_is_scoped_to_the_path_user() {
  let f = fixture().await;
  let a = f.lifecycle.add_photo(&f.me, f.user.user_id, jpeg()).await.unwrap();

  let fetched = f.lifecycle.retrieve_photo(f.user.user_id, a.id).await.unwrap();
  assert_eq!(fetched, a);

  let elsewhere = f.lifecycle.retrieve_photo(Uuid::new_v4(), a.id).await;
  assert!(matches!(elsewhere, Err(Error::PhotoNotFound(_))));
}

#[tokio::test]
async fn list_photos_of_unknown_user_is_not_found() {
  let f = fixture().await;
  let err = f.lifecycle.list_photos(Uuid::new_v4()).await.unwrap_err();
  assert!(matches!(err, Error::UserNotFound(_)));
}

#[tokio::test]
async fn exactly_one_main_survives_a_mixed_sequence() {
  let f = fixture().await;
  let uid = f.user.user_id;
  let mut ids = Vec::new();
  for _ in 0..4 {
    ids.push(f.lifecycle.add_photo(&f.me, uid, jpeg()).await.unwrap().id);
    assert_eq!(mains(&f.store, uid).await, 1);
  }

  f.lifecycle.set_main_photo(&f.me, uid, ids[2]).await.unwrap();
  assert_eq!(mains(&f.store, uid).await, 1);

  f.lifecycle.delete_photo(&f.me, uid, ids[0]).await.unwrap();
  f.lifecycle.delete_photo(&f.me, uid, ids[1]).await.unwrap();
  assert!(f.lifecycle.delete_photo(&f.me, uid, ids[2]).await.is_err());
  f.lifecycle.set_main_photo(&f.me, uid, ids[3]).await.unwrap();
  f.lifecycle.delete_photo(&f.me, uid, ids[2]).await.unwrap();

  let left = f.lifecycle.list_photos(uid).await.unwrap();
  assert_eq!(left.len(), 1);
  assert!(left[0].is_main);
  assert_eq!(left[0].id, ids[3]);
}
