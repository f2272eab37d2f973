//! [`SqliteStore`]: the SQLite implementation of [`PhotoStore`].

use std::path::Path;

use chrono::Utc;
use rusqlite::OptionalExtension as _;
use tracing::debug;
use uuid::Uuid;

use amour_core::{
  photo::Photo,
  store::{Change, Changeset, PhotoStore},
  user::User,
};

use crate::{
  Error, Result,
  encode::{PHOTO_COLUMNS, RawPhoto, RawUser, decode_uuid, encode_dt, encode_uuid},
  schema::SCHEMA,
};

// ─── Commit outcome ──────────────────────────────────────────────────────────

/// What happened inside the commit transaction. Anything but `Committed`
/// means the transaction was rolled back.
enum CommitOutcome {
  Committed(i64),
  Conflict,
  UserMissing,
  PhotoMissing(Uuid),
}

// ─── Store ───────────────────────────────────────────────────────────────────

/// A photo store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Run a photo query that yields at most one row.
  async fn query_photo(
    &self,
    filter: &'static str,
    params: Vec<String>,
  ) -> Result<Option<Photo>> {
    let raw: Option<RawPhoto> = self
      .conn
      .call(move |conn| {
        let sql = format!("SELECT {PHOTO_COLUMNS} FROM photos WHERE {filter}");
        Ok(
          conn
            .query_row(
              &sql,
              rusqlite::params_from_iter(params.iter()),
              RawPhoto::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawPhoto::into_photo).transpose()
  }
}

// ─── PhotoStore impl ─────────────────────────────────────────────────────────

impl PhotoStore for SqliteStore {
  type Error = Error;

  // ── Users ─────────────────────────────────────────────────────────────────

  async fn add_user(&self, username: String, password_hash: String) -> Result<User> {
    let user = User {
      user_id:    Uuid::new_v4(),
      username:   username.clone(),
      created_at: Utc::now(),
      version:    0,
    };

    let id_str = encode_uuid(user.user_id);
    let at_str = encode_dt(user.created_at);
    let name   = username.clone();

    let inserted: bool = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let taken = tx
          .query_row(
            "SELECT 1 FROM users WHERE username = ?1",
            rusqlite::params![name],
            |_| Ok(true),
          )
          .optional()?
          .unwrap_or(false);
        if taken {
          return Ok(false);
        }
        tx.execute(
          "INSERT INTO users (user_id, username, password_hash, created_at, version)
           VALUES (?1, ?2, ?3, ?4, 0)",
          rusqlite::params![id_str, name, password_hash, at_str],
        )?;
        tx.commit()?;
        Ok(true)
      })
      .await?;

    if !inserted {
      return Err(Error::UsernameTaken(username));
    }
    Ok(user)
  }

  async fn get_user(&self, user_id: Uuid) -> Result<Option<User>> {
    let id_str = encode_uuid(user_id);

    let raw: Option<RawUser> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT user_id, username, created_at, version FROM users WHERE user_id = ?1",
              rusqlite::params![id_str],
              |row| {
                Ok(RawUser {
                  user_id:    row.get(0)?,
                  username:   row.get(1)?,
                  created_at: row.get(2)?,
                  version:    row.get(3)?,
                })
              },
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawUser::into_user).transpose()
  }

  async fn find_credentials(&self, username: &str) -> Result<Option<(Uuid, String)>> {
    let name = username.to_owned();

    let raw: Option<(String, String)> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT user_id, password_hash FROM users WHERE username = ?1",
              rusqlite::params![name],
              |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?,
        )
      })
      .await?;

    raw
      .map(|(id, hash)| Ok((decode_uuid(&id)?, hash)))
      .transpose()
  }

  // ── Photos ────────────────────────────────────────────────────────────────

  async fn get_photo(&self, photo_id: Uuid) -> Result<Option<Photo>> {
    self
      .query_photo("photo_id = ?1", vec![encode_uuid(photo_id)])
      .await
  }

  async fn get_photo_for_user(
    &self,
    user_id:  Uuid,
    photo_id: Uuid,
  ) -> Result<Option<Photo>> {
    self
      .query_photo(
        "photo_id = ?1 AND user_id = ?2",
        vec![encode_uuid(photo_id), encode_uuid(user_id)],
      )
      .await
  }

  async fn get_main_photo(&self, user_id: Uuid) -> Result<Option<Photo>> {
    self
      .query_photo("user_id = ?1 AND is_main = 1", vec![encode_uuid(user_id)])
      .await
  }

  async fn list_photos(&self, user_id: Uuid) -> Result<Vec<Photo>> {
    let id_str = encode_uuid(user_id);

    let raws: Vec<RawPhoto> = self
      .conn
      .call(move |conn| {
        let sql = format!(
          "SELECT {PHOTO_COLUMNS} FROM photos
           WHERE user_id = ?1
           ORDER BY is_main DESC, rowid ASC"
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params![id_str], RawPhoto::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawPhoto::into_photo).collect()
  }

  // ── Writes ────────────────────────────────────────────────────────────────

  async fn commit(&self, changeset: Changeset) -> Result<u64> {
    let user_id  = changeset.user_id;
    let expected = i64::try_from(changeset.expected_version)
      .map_err(|_| Error::VersionConflict(user_id))?;
    let user_str = encode_uuid(user_id);
    let changes  = changeset.changes;
    let count    = changes.len();

    let outcome = self
      .conn
      .call(move |conn| {
        // Dropping `tx` without committing rolls everything back.
        let tx = conn.transaction()?;

        let bumped = tx.execute(
          "UPDATE users SET version = version + 1 WHERE user_id = ?1 AND version = ?2",
          rusqlite::params![user_str, expected],
        )?;
        if bumped == 0 {
          let exists = tx
            .query_row(
              "SELECT 1 FROM users WHERE user_id = ?1",
              rusqlite::params![user_str],
              |_| Ok(true),
            )
            .optional()?
            .unwrap_or(false);
          return Ok(if exists {
            CommitOutcome::Conflict
          } else {
            CommitOutcome::UserMissing
          });
        }

        for change in changes {
          match change {
            Change::Insert(photo) => {
              tx.execute(
                &format!(
                  "INSERT INTO photos ({PHOTO_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)"
                ),
                rusqlite::params![
                  encode_uuid(photo.photo_id),
                  user_str,
                  photo.url,
                  photo.asset_id,
                  photo.description,
                  photo.is_main,
                  encode_dt(photo.added_at),
                ],
              )?;
            }
            Change::SetMain { photo_id, is_main } => {
              let updated = tx.execute(
                "UPDATE photos SET is_main = ?1 WHERE photo_id = ?2 AND user_id = ?3",
                rusqlite::params![is_main, encode_uuid(photo_id), user_str],
              )?;
              if updated == 0 {
                return Ok(CommitOutcome::PhotoMissing(photo_id));
              }
            }
            Change::Delete(photo_id) => {
              let deleted = tx.execute(
                "DELETE FROM photos WHERE photo_id = ?1 AND user_id = ?2",
                rusqlite::params![encode_uuid(photo_id), user_str],
              )?;
              if deleted == 0 {
                return Ok(CommitOutcome::PhotoMissing(photo_id));
              }
            }
          }
        }

        tx.commit()?;
        Ok(CommitOutcome::Committed(expected + 1))
      })
      .await?;

    match outcome {
      CommitOutcome::Committed(version) => {
        debug!(user_id = %user_id, version, changes = count, "changeset committed");
        Ok(version as u64)
      }
      CommitOutcome::Conflict => Err(Error::VersionConflict(user_id)),
      CommitOutcome::UserMissing => Err(Error::UserNotFound(user_id)),
      CommitOutcome::PhotoMissing(photo_id) => Err(Error::PhotoNotFound(photo_id)),
    }
  }
}
