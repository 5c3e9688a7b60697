// src/db/models/script_entry.rs

//! ScriptEntry model - lifecycle scripts stored per package

use crate::error::Result;
use rusqlite::{Connection, Row, params};

/// One lifecycle script of an installed package
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptEntry {
    pub package: String,
    /// Phase name as it appears in the manifest (`pre-install`, `upgrade`, ...)
    pub phase: String,
    pub body: String,
}

impl ScriptEntry {
    pub fn new(package: String, phase: String, body: String) -> Self {
        Self {
            package,
            phase,
            body,
        }
    }

    pub fn insert(&self, conn: &Connection) -> Result<()> {
        conn.execute(
            "INSERT INTO scripts (package, phase, body) VALUES (?1, ?2, ?3)",
            params![&self.package, &self.phase, &self.body],
        )?;
        Ok(())
    }

    /// All scripts of a package, ordered by phase name
    pub fn find_by_package(conn: &Connection, package: &str) -> Result<Vec<Self>> {
        let mut stmt = conn.prepare(
            "SELECT package, phase, body FROM scripts WHERE package = ?1 ORDER BY phase",
        )?;
        let scripts = stmt
            .query_map([package], Self::from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(scripts)
    }

    /// Delete every script of a package
    pub fn delete_by_package(conn: &Connection, package: &str) -> Result<usize> {
        let removed = conn.execute("DELETE FROM scripts WHERE package = ?1", [package])?;
        Ok(removed)
    }

    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            package: row.get(0)?,
            phase: row.get(1)?,
            body: row.get(2)?,
        })
    }
}
