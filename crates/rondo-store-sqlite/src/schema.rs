//! SQL schema for the Rondo SQLite store.
//!
//! Executed once at connection startup via `PRAGMA user_version`. Future
//! migrations will be gated on that version number.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

-- Rotation history is global across rounds. Rows are created lazily the
-- first time a pair of participants co-occurs in a round's pool and are
-- never deleted.
CREATE TABLE IF NOT EXISTS pair_history (
    giver            TEXT NOT NULL,
    receiver         TEXT NOT NULL,
    used_in_cycle    INTEGER NOT NULL DEFAULT 0,
    total_count      INTEGER NOT NULL DEFAULT 0,
    last_assigned_at TEXT,            -- ISO 8601 UTC or NULL
    PRIMARY KEY (giver, receiver),
    CHECK  (giver != receiver)
);

-- Forbidden pairs for one round; replaced wholesale on every config save.
CREATE TABLE IF NOT EXISTS exclusions (
    round_id TEXT NOT NULL,
    giver    TEXT NOT NULL,
    receiver TEXT NOT NULL,
    PRIMARY KEY (round_id, giver, receiver),
    CHECK  (giver != receiver)
);

-- One row per giver per drawn round; a re-draw replaces the round's set.
CREATE TABLE IF NOT EXISTS assignments (
    round_id    TEXT NOT NULL,
    giver       TEXT NOT NULL,
    receiver    TEXT NOT NULL,
    revealed    INTEGER NOT NULL DEFAULT 0,
    assigned_at TEXT NOT NULL,       -- ISO 8601 UTC
    PRIMARY KEY (round_id, giver),
    CHECK  (giver != receiver)
);

CREATE INDEX IF NOT EXISTS exclusions_round_idx  ON exclusions(round_id);
CREATE INDEX IF NOT EXISTS assignments_round_idx ON assignments(round_id);

PRAGMA user_version = 1;
";
