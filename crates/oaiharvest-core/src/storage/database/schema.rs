use rusqlite::Connection;

use crate::error::Result;

pub const SCHEMA_VERSION: u32 = 1;

pub fn apply_pragmas(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        PRAGMA journal_mode = WAL;
        PRAGMA synchronous = NORMAL;
        PRAGMA foreign_keys = ON;
        ",
    )?;
    Ok(())
}

pub fn create_tables(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS schema_migrations (
            version    INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS groups (
            id          TEXT PRIMARY KEY,
            name        TEXT UNIQUE NOT NULL,
            title       TEXT NOT NULL DEFAULT '',
            description TEXT NOT NULL DEFAULT '',
            state       TEXT NOT NULL DEFAULT 'active'
        );

        CREATE TABLE IF NOT EXISTS packages (
            id                TEXT PRIMARY KEY,
            name              TEXT UNIQUE NOT NULL,
            title             TEXT NOT NULL DEFAULT '',
            owner_org         TEXT REFERENCES groups(id) ON DELETE SET NULL,
            private           INTEGER NOT NULL DEFAULT 0,
            state             TEXT NOT NULL DEFAULT 'active',
            metadata_created  TEXT NOT NULL,
            metadata_modified TEXT NOT NULL,
            record            TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS package_extras (
            package_id TEXT NOT NULL REFERENCES packages(id) ON DELETE CASCADE,
            key        TEXT NOT NULL,
            value      TEXT NOT NULL,
            state      TEXT NOT NULL DEFAULT 'active',
            PRIMARY KEY (package_id, key)
        );
        ",
    )?;
    Ok(())
}

pub fn create_indexes(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE INDEX IF NOT EXISTS idx_packages_state     ON packages(state);
        CREATE INDEX IF NOT EXISTS idx_packages_owner_org ON packages(owner_org);
        CREATE INDEX IF NOT EXISTS idx_packages_modified  ON packages(metadata_modified);
        CREATE INDEX IF NOT EXISTS idx_extras_value       ON package_extras(value);
        ",
    )?;
    Ok(())
}
