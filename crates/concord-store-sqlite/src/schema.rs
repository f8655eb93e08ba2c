//! SQL schema for the Concord SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS users (
    user_id     INTEGER PRIMARY KEY,
    goal        TEXT NOT NULL,   -- 'chat' | 'date' | 'both'
    gender      TEXT NOT NULL,   -- 'male' | 'female'
    birth_date  TEXT NOT NULL,   -- YYYY-MM-DD
    country     TEXT,
    city        TEXT,
    updated_at  TEXT NOT NULL
);

-- has_photo is derived from the presence of a row here.
CREATE TABLE IF NOT EXISTS photos (
    user_id  INTEGER NOT NULL REFERENCES users(user_id) ON DELETE CASCADE,
    file_id  TEXT NOT NULL,
    PRIMARY KEY (user_id, file_id)
);

CREATE TABLE IF NOT EXISTS items (
    item_id     INTEGER PRIMARY KEY,
    created_at  TEXT NOT NULL
);

-- One row per (voter, item); re-votes overwrite in place.
CREATE TABLE IF NOT EXISTS votes (
    voter_id  INTEGER NOT NULL REFERENCES users(user_id) ON DELETE CASCADE,
    item_id   INTEGER NOT NULL REFERENCES items(item_id) ON DELETE CASCADE,
    value     INTEGER NOT NULL CHECK (value IN (-1, 0, 1)),
    voted_at  TEXT NOT NULL,
    PRIMARY KEY (voter_id, item_id)
);

-- Candidates already surfaced to a seeker; upserts refresh shown_at.
CREATE TABLE IF NOT EXISTS shown (
    seeker_id  INTEGER NOT NULL REFERENCES users(user_id) ON DELETE CASCADE,
    shown_id   INTEGER NOT NULL REFERENCES users(user_id) ON DELETE CASCADE,
    shown_at   TEXT NOT NULL,
    PRIMARY KEY (seeker_id, shown_id)
);

CREATE INDEX IF NOT EXISTS votes_item_value_idx ON votes(item_id, value);
CREATE INDEX IF NOT EXISTS shown_shown_idx      ON shown(shown_id);

PRAGMA user_version = 1;
";
