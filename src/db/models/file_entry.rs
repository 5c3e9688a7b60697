// src/db/models/file_entry.rs

//! FileEntry model - paths owned by installed packages

use crate::error::Result;
use rusqlite::{Connection, OptionalExtension, Row, params};

/// `kind` value of directory rows
pub const KIND_DIRECTORY: &str = "dir";

/// A path owned by a package, as recorded at install time
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    /// Logical path (prefix applied, destination root not)
    pub path: String,
    pub package: String,
    /// `file`, `dir` or `slink`
    pub kind: String,
    pub checksum: String,
    pub uid: u32,
    pub gid: u32,
    pub flags: u32,
    pub mode: u32,
}

impl FileEntry {
    /// Insert, replacing any existing row for the same path
    pub fn upsert(&self, conn: &Connection) -> Result<()> {
        conn.execute(
            "INSERT OR REPLACE INTO files (path, package, kind, checksum, uid, gid, flags, mode)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                &self.path,
                &self.package,
                &self.kind,
                &self.checksum,
                self.uid,
                self.gid,
                self.flags,
                self.mode,
            ],
        )?;
        Ok(())
    }

    pub fn find_by_path(conn: &Connection, path: &str) -> Result<Option<Self>> {
        let mut stmt = conn.prepare(
            "SELECT path, package, kind, checksum, uid, gid, flags, mode
             FROM files WHERE path = ?1",
        )?;
        let file = stmt.query_row([path], Self::from_row).optional()?;
        Ok(file)
    }

    /// All rows of a package, ordered by path
    pub fn find_by_package(conn: &Connection, package: &str) -> Result<Vec<Self>> {
        let mut stmt = conn.prepare(
            "SELECT path, package, kind, checksum, uid, gid, flags, mode
             FROM files WHERE package = ?1 ORDER BY path",
        )?;
        let files = stmt
            .query_map([package], Self::from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(files)
    }

    /// Delete a single path, returning how many rows went away
    pub fn delete(conn: &Connection, path: &str) -> Result<usize> {
        let removed = conn.execute("DELETE FROM files WHERE path = ?1", [path])?;
        Ok(removed)
    }

    /// Delete the non-directory rows of a package
    pub fn delete_files_by_package(conn: &Connection, package: &str) -> Result<usize> {
        let removed = conn.execute(
            "DELETE FROM files WHERE package = ?1 AND kind != ?2",
            params![package, KIND_DIRECTORY],
        )?;
        Ok(removed)
    }

    /// Delete the directory rows of a package
    pub fn delete_directories_by_package(conn: &Connection, package: &str) -> Result<usize> {
        let removed = conn.execute(
            "DELETE FROM files WHERE package = ?1 AND kind = ?2",
            params![package, KIND_DIRECTORY],
        )?;
        Ok(removed)
    }

    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            path: row.get(0)?,
            package: row.get(1)?,
            kind: row.get(2)?,
            checksum: row.get(3)?,
            uid: row.get(4)?,
            gid: row.get(5)?,
            flags: row.get(6)?,
            mode: row.get(7)?,
        })
    }
}
