// src/db/schema.rs

//! Catalog schema definitions and migrations
//!
//! Three tables hold the catalog: `packages` (one row per installed
//! package), `scripts` (lifecycle scripts keyed by package and phase) and
//! `files` (every path a package owns, directories included).

use crate::error::{Error, Result};
use rusqlite::Connection;
use tracing::{debug, info};

/// Current schema version
pub const SCHEMA_VERSION: i32 = 1;

/// Initialize the schema version tracking table
fn init_schema_version(conn: &Connection) -> Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
        )",
        [],
    )?;
    Ok(())
}

/// Get the current schema version from the database
pub fn get_schema_version(conn: &Connection) -> Result<i32> {
    init_schema_version(conn)?;

    let version = conn
        .query_row(
            "SELECT version FROM schema_version ORDER BY version DESC LIMIT 1",
            [],
            |row| row.get(0),
        )
        .unwrap_or(0);

    Ok(version)
}

fn set_schema_version(conn: &Connection, version: i32) -> Result<()> {
    conn.execute(
        "INSERT INTO schema_version (version) VALUES (?1)",
        [version],
    )?;
    Ok(())
}

/// Apply all pending migrations to bring the database up to date
pub fn migrate(conn: &Connection) -> Result<()> {
    let current_version = get_schema_version(conn)?;
    debug!("Current catalog schema version: {}", current_version);

    if current_version >= SCHEMA_VERSION {
        return Ok(());
    }

    for version in (current_version + 1)..=SCHEMA_VERSION {
        info!("Applying catalog migration to version {}", version);
        apply_migration(conn, version)?;
        set_schema_version(conn, version)?;
    }

    Ok(())
}

fn apply_migration(conn: &Connection, version: i32) -> Result<()> {
    match version {
        1 => migrate_v1(conn),
        _ => Err(Error::Catalog(format!(
            "Unknown catalog migration version: {}",
            version
        ))),
    }
}

/// Initial schema
fn migrate_v1(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE packages (
            name TEXT PRIMARY KEY,
            version TEXT NOT NULL,
            installed_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
        );

        CREATE TABLE scripts (
            package TEXT NOT NULL REFERENCES packages(name),
            phase TEXT NOT NULL,
            body TEXT NOT NULL,
            PRIMARY KEY (package, phase)
        );

        -- checksum is '-' for directories, symlinks hash their target
        CREATE TABLE files (
            path TEXT PRIMARY KEY,
            package TEXT NOT NULL REFERENCES packages(name),
            kind TEXT NOT NULL CHECK(kind IN ('file', 'dir', 'slink')),
            checksum TEXT NOT NULL,
            uid INTEGER NOT NULL DEFAULT 0,
            gid INTEGER NOT NULL DEFAULT 0,
            flags INTEGER NOT NULL DEFAULT 0,
            mode INTEGER NOT NULL DEFAULT 0
        );

        CREATE INDEX idx_files_package ON files(package);
        ",
    )?;

    Ok(())
}
