// src/db/mod.rs

//! Catalog database layer
//!
//! SQLite storage for installed packages, their lifecycle scripts and their
//! file records. Connections are opened per command; the schema is created
//! and upgraded by `schema::migrate`.

pub mod models;
pub mod paths;
pub mod schema;

use crate::error::Result;
use rusqlite::{Connection, Transaction};
use std::path::Path;
use tracing::{debug, info};

/// Create the database file (and its directory) and bring the schema up
/// to date
pub fn init(db_path: &Path) -> Result<()> {
    if let Some(parent) = db_path.parent()
        && !parent.as_os_str().is_empty()
        && !parent.exists()
    {
        std::fs::create_dir_all(parent)?;
        debug!("Created catalog directory {}", parent.display());
    }

    let conn = open(db_path)?;
    schema::migrate(&conn)?;
    info!("Catalog initialized at {}", db_path.display());
    Ok(())
}

/// Open an existing catalog database
pub fn open(db_path: &Path) -> Result<Connection> {
    let conn = Connection::open(db_path)?;
    configure(&conn)?;
    Ok(conn)
}

/// Open a private in-memory catalog with the current schema
pub fn open_in_memory() -> Result<Connection> {
    let conn = Connection::open_in_memory()?;
    configure(&conn)?;
    schema::migrate(&conn)?;
    Ok(conn)
}

fn configure(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "PRAGMA foreign_keys = ON;
         PRAGMA busy_timeout = 5000;",
    )?;
    Ok(())
}

/// Run `f` inside a transaction, committing on success
///
/// The transaction rolls back when `f` returns an error.
pub fn transaction<T, F>(conn: &mut Connection, f: F) -> Result<T>
where
    F: FnOnce(&Transaction) -> Result<T>,
{
    let tx = conn.transaction()?;
    let value = f(&tx)?;
    tx.commit()?;
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_init_creates_parent_and_schema() {
        let temp = TempDir::new().unwrap();
        let db_path = temp.path().join("var/db/pkgtools/catalog.db");

        init(&db_path).unwrap();
        assert!(db_path.exists());

        let conn = open(&db_path).unwrap();
        assert_eq!(schema::get_schema_version(&conn).unwrap(), schema::SCHEMA_VERSION);
    }

    #[test]
    fn test_transaction_rolls_back_on_error() {
        let mut conn = open_in_memory().unwrap();

        let result: Result<()> = transaction(&mut conn, |tx| {
            tx.execute(
                "INSERT INTO packages (name, version) VALUES ('a', '1')",
                [],
            )?;
            Err(crate::Error::Catalog("boom".to_string()))
        });
        assert!(result.is_err());

        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM packages", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 0);
    }
}
