// src/db/models/package.rs

//! Package model - one row per installed package

use crate::error::Result;
use rusqlite::{Connection, OptionalExtension, Row, params};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Package {
    pub name: String,
    pub version: String,
    pub installed_at: Option<String>,
}

impl Package {
    pub fn new(name: String, version: String) -> Self {
        Self {
            name,
            version,
            installed_at: None,
        }
    }

    /// Insert this package into the database
    pub fn insert(&mut self, conn: &Connection) -> Result<()> {
        conn.execute(
            "INSERT INTO packages (name, version) VALUES (?1, ?2)",
            params![&self.name, &self.version],
        )?;
        Ok(())
    }

    /// Find a package by name
    pub fn find_by_name(conn: &Connection, name: &str) -> Result<Option<Self>> {
        let mut stmt =
            conn.prepare("SELECT name, version, installed_at FROM packages WHERE name = ?1")?;
        let package = stmt.query_row([name], Self::from_row).optional()?;
        Ok(package)
    }

    /// List all installed packages ordered by name
    pub fn list_all(conn: &Connection) -> Result<Vec<Self>> {
        let mut stmt =
            conn.prepare("SELECT name, version, installed_at FROM packages ORDER BY name")?;
        let packages = stmt
            .query_map([], Self::from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(packages)
    }

    /// Move `name` from version `from` to `to`
    ///
    /// Returns the number of rows changed, zero when no package with that
    /// name and version is installed.
    pub fn update_version(conn: &Connection, name: &str, from: &str, to: &str) -> Result<usize> {
        let changed = conn.execute(
            "UPDATE packages SET version = ?3, installed_at = CURRENT_TIMESTAMP
             WHERE name = ?1 AND version = ?2",
            params![name, from, to],
        )?;
        Ok(changed)
    }

    pub fn delete(conn: &Connection, name: &str) -> Result<()> {
        conn.execute("DELETE FROM packages WHERE name = ?1", [name])?;
        Ok(())
    }

    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            name: row.get(0)?,
            version: row.get(1)?,
            installed_at: row.get(2)?,
        })
    }
}
