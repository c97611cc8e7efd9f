//! SQL schema for the Vantage SQLite store.
//!
//! Executed once at connection startup via `PRAGMA user_version`. Future
//! migrations will be gated on that version number.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
///
/// Timestamps are fixed-width RFC 3339 UTC strings with microseconds
/// (`2024-03-01T09:30:00.000000Z`), so string comparison is time comparison.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS users (
    user_id       TEXT PRIMARY KEY,
    name          TEXT NOT NULL,
    email         TEXT NOT NULL UNIQUE,
    password_hash TEXT,              -- argon2 PHC string; NULL for federated-only
    federated_id  TEXT UNIQUE,       -- identity provider subject; NULL for password-only
    created_at    TEXT NOT NULL,
    CHECK (password_hash IS NOT NULL OR federated_id IS NOT NULL)
);

-- Events are strictly append-only.
-- No UPDATE or DELETE is ever issued against this table.
CREATE TABLE IF NOT EXISTS events (
    event_id    TEXT PRIMARY KEY,
    occurred_at TEXT NOT NULL,
    event_type  TEXT NOT NULL,       -- 'page_view' | 'user_login' | 'new_registration' | ...
    user_id     TEXT,                -- weak reference, deliberately no FOREIGN KEY
    device      TEXT,
    location    TEXT,
    value       REAL NOT NULL DEFAULT 1.0
);

-- At most one row, replaced wholesale.
CREATE TABLE IF NOT EXISTS summary_snapshot (
    id                  INTEGER PRIMARY KEY CHECK (id = 1),
    views               TEXT NOT NULL,
    views_change        TEXT NOT NULL,
    views_type          TEXT NOT NULL,   -- 'increase' | 'decrease'
    visits              TEXT NOT NULL,
    visits_change       TEXT NOT NULL,
    visits_type         TEXT NOT NULL,
    new_users           TEXT NOT NULL,
    new_users_change    TEXT NOT NULL,
    new_users_type      TEXT NOT NULL,
    active_users        TEXT NOT NULL,
    active_users_change TEXT NOT NULL,
    active_users_type   TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS users_created_idx     ON users(created_at);
CREATE INDEX IF NOT EXISTS events_occurred_idx   ON events(occurred_at);
CREATE INDEX IF NOT EXISTS events_type_idx       ON events(event_type, occurred_at);
CREATE INDEX IF NOT EXISTS events_user_idx       ON events(user_id);
CREATE INDEX IF NOT EXISTS events_device_idx     ON events(device);
CREATE INDEX IF NOT EXISTS events_location_idx   ON events(location);

PRAGMA user_version = 1;
";
