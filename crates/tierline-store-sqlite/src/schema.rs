//! SQL schema for the tierline SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

-- One row per customer email. Never deleted.
CREATE TABLE IF NOT EXISTS identities (
    identity_id     TEXT PRIMARY KEY,
    email           TEXT NOT NULL UNIQUE COLLATE NOCASE,
    email_confirmed INTEGER NOT NULL,
    metadata        TEXT NOT NULL,   -- JSON IdentityMetadata
    created_at      TEXT NOT NULL    -- ISO 8601 UTC
);

-- Current subscription state; every upsert replaces the whole row.
CREATE TABLE IF NOT EXISTS profiles (
    identity_id TEXT PRIMARY KEY REFERENCES identities(identity_id),
    email       TEXT NOT NULL,
    tier        TEXT NOT NULL,   -- 'basic' | 'plus' | 'elite'
    status      TEXT NOT NULL,   -- 'active' | 'inactive' | 'canceled'
    source      TEXT NOT NULL,   -- 'kiwify' | 'hotmart'
    raw_payload TEXT NOT NULL,   -- webhook body as received
    updated_at  TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS profiles_status_idx ON profiles(status);

PRAGMA user_version = 1;
";
