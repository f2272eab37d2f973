//! SQL schema for the amour SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS users (
    user_id       TEXT PRIMARY KEY,
    username      TEXT NOT NULL UNIQUE,
    password_hash TEXT NOT NULL,     -- argon2 PHC string
    created_at    TEXT NOT NULL,
    version       INTEGER NOT NULL DEFAULT 0   -- bumped by every photo commit
);

CREATE TABLE IF NOT EXISTS photos (
    photo_id    TEXT PRIMARY KEY,
    user_id     TEXT NOT NULL REFERENCES users(user_id),
    url         TEXT NOT NULL,
    asset_id    TEXT,                -- NULL for photos without a hosted asset
    description TEXT,
    is_main     INTEGER NOT NULL DEFAULT 0 CHECK (is_main IN (0, 1)),
    added_at    TEXT NOT NULL        -- ISO 8601 UTC; server-assigned
);

CREATE INDEX IF NOT EXISTS photos_user_idx ON photos(user_id);

-- At most one main photo per user.
CREATE UNIQUE INDEX IF NOT EXISTS photos_one_main_idx
    ON photos(user_id) WHERE is_main = 1;

PRAGMA user_version = 1;
";
