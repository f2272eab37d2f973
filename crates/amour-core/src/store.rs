//! The `PhotoStore` trait and the [`Changeset`] unit of work.
//!
//! The trait is implemented by storage backends (e.g. `amour-store-sqlite`).
//! Reads are plain queries; every write goes through [`PhotoStore::commit`],
//! which applies one [`Changeset`] atomically or not at all.

use std::future::Future;

use uuid::Uuid;

use crate::{photo::Photo, user::User};

// ─── Changeset ───────────────────────────────────────────────────────────────

/// A single mutation inside a [`Changeset`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Change {
  Insert(Photo),
  SetMain { photo_id: Uuid, is_main: bool },
  Delete(Uuid),
}

/// An ordered batch of photo mutations for one user.
///
/// `expected_version` is the [`User::version`] observed when the batch was
/// built. A store must refuse the commit if the user has moved on since.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Changeset {
  pub user_id:          Uuid,
  pub expected_version: u64,
  pub changes:          Vec<Change>,
}

impl Changeset {
  pub fn new(user: &User) -> Self {
    Self {
      user_id:          user.user_id,
      expected_version: user.version,
      changes:          Vec::new(),
    }
  }

  pub fn insert(&mut self, photo: Photo) -> &mut Self {
    self.changes.push(Change::Insert(photo));
    self
  }

  pub fn set_main(&mut self, photo_id: Uuid, is_main: bool) -> &mut Self {
    self.changes.push(Change::SetMain { photo_id, is_main });
    self
  }

  pub fn delete(&mut self, photo_id: Uuid) -> &mut Self {
    self.changes.push(Change::Delete(photo_id));
    self
  }

  pub fn is_empty(&self) -> bool { self.changes.is_empty() }
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over the persistence layer for users and their photos.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait PhotoStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Users ─────────────────────────────────────────────────────────────

  /// Register a user with an already-hashed password. Returns an error if
  /// the username is taken.
  fn add_user(
    &self,
    username: String,
    password_hash: String,
  ) -> impl Future<Output = Result<User, Self::Error>> + Send + '_;

  /// Retrieve a user by UUID. Returns `None` if not found.
  fn get_user(
    &self,
    user_id: Uuid,
  ) -> impl Future<Output = Result<Option<User>, Self::Error>> + Send + '_;

  /// Look up the id and stored password hash for `username`.
  fn find_credentials<'a>(
    &'a self,
    username: &'a str,
  ) -> impl Future<Output = Result<Option<(Uuid, String)>, Self::Error>> + Send + 'a;

  // ── Photos ────────────────────────────────────────────────────────────

  /// Retrieve a photo by id regardless of owner. Mutating paths go through
  /// [`Self::get_photo_for_user`] instead.
  fn get_photo(
    &self,
    photo_id: Uuid,
  ) -> impl Future<Output = Result<Option<Photo>, Self::Error>> + Send + '_;

  /// Retrieve a photo only if it belongs to `user_id`.
  fn get_photo_for_user(
    &self,
    user_id: Uuid,
    photo_id: Uuid,
  ) -> impl Future<Output = Result<Option<Photo>, Self::Error>> + Send + '_;

  /// The user's current main photo, if any.
  fn get_main_photo(
    &self,
    user_id: Uuid,
  ) -> impl Future<Output = Result<Option<Photo>, Self::Error>> + Send + '_;

  /// All photos of a user, main photo first, then oldest first.
  fn list_photos(
    &self,
    user_id: Uuid,
  ) -> impl Future<Output = Result<Vec<Photo>, Self::Error>> + Send + '_;

  // ── Writes ────────────────────────────────────────────────────────────

  /// Apply `changeset` atomically and return the user's new version.
  ///
  /// Fails without applying anything if the user's version no longer equals
  /// `changeset.expected_version`, or if the result would give the user more
  /// than one main photo.
  fn commit(
    &self,
    changeset: Changeset,
  ) -> impl Future<Output = Result<u64, Self::Error>> + Send + '_;
}
