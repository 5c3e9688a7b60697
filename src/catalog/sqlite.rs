// src/catalog/sqlite.rs

//! SQLite-backed catalog

use super::{Catalog, FileRecord, PackageRecord};
use crate::db::{
    self,
    models::{FileEntry, Package, ScriptEntry},
};
use crate::error::{Error, Result};
use crate::filesystem::ExtractedEntry;
use crate::scriptlet::ScriptTable;
use rusqlite::{Connection, Transaction};
use std::path::Path;
use tracing::{debug, info};

/// Catalog stored in a SQLite database
pub struct SqliteCatalog {
    conn: Connection,
}

impl SqliteCatalog {
    /// Open the catalog at `db_path`, creating it if needed
    pub fn open(db_path: &Path) -> Result<Self> {
        db::init(db_path)?;
        Ok(Self {
            conn: db::open(db_path)?,
        })
    }

    /// A fresh catalog that lives only as long as this value
    pub fn in_memory() -> Result<Self> {
        Ok(Self {
            conn: db::open_in_memory()?,
        })
    }

    /// Wrap a connection whose schema is already current
    pub fn from_connection(conn: Connection) -> Self {
        Self { conn }
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }
}

fn insert_scripts(tx: &Transaction, name: &str, scripts: &ScriptTable) -> Result<()> {
    for (phase, body) in scripts.iter() {
        ScriptEntry::new(name.to_string(), phase.to_string(), body.to_string()).insert(tx)?;
    }
    Ok(())
}

impl Catalog for SqliteCatalog {
    fn find_package(&self, name: &str) -> Result<Option<PackageRecord>> {
        Ok(Package::find_by_name(&self.conn, name)?.map(|p| PackageRecord {
            name: p.name,
            version: p.version,
        }))
    }

    fn find_scripts(&self, name: &str) -> Result<Option<ScriptTable>> {
        if Package::find_by_name(&self.conn, name)?.is_none() {
            return Ok(None);
        }
        let rows = ScriptEntry::find_by_package(&self.conn, name)?;
        Ok(Some(ScriptTable::from_raw(
            rows.into_iter().map(|row| (row.phase, row.body)),
        )))
    }

    fn add_package(&mut self, name: &str, version: &str, scripts: &ScriptTable) -> Result<()> {
        db::transaction(&mut self.conn, |tx| {
            Package::new(name.to_string(), version.to_string()).insert(tx)?;
            insert_scripts(tx, name, scripts)
        })?;
        info!("Registered {}-{}", name, version);
        Ok(())
    }

    fn update_package(
        &mut self,
        name: &str,
        from: &str,
        to: &str,
        scripts: &ScriptTable,
    ) -> Result<()> {
        db::transaction(&mut self.conn, |tx| {
            if Package::update_version(tx, name, from, to)? == 0 {
                return Err(Error::Catalog(format!(
                    "{} is not installed at version {}",
                    name, from
                )));
            }
            ScriptEntry::delete_by_package(tx, name)?;
            insert_scripts(tx, name, scripts)
        })?;
        info!("Updated {} from {} to {}", name, from, to);
        Ok(())
    }

    fn remove_package(&mut self, name: &str) -> Result<()> {
        Package::delete(&self.conn, name)
    }

    fn remove_package_files(&mut self, name: &str) -> Result<()> {
        let removed = FileEntry::delete_files_by_package(&self.conn, name)?;
        debug!("Removed {} file records of {}", removed, name);
        Ok(())
    }

    fn remove_package_directories(&mut self, name: &str) -> Result<()> {
        let removed = FileEntry::delete_directories_by_package(&self.conn, name)?;
        debug!("Removed {} directory records of {}", removed, name);
        Ok(())
    }

    fn remove_package_scripts(&mut self, name: &str) -> Result<()> {
        ScriptEntry::delete_by_package(&self.conn, name)?;
        Ok(())
    }

    fn remove_file_entry(&mut self, path: &str) -> Result<()> {
        FileEntry::delete(&self.conn, path)?;
        Ok(())
    }

    fn add_files_bulk(&mut self, package: &str, entries: &[ExtractedEntry]) -> Result<()> {
        db::transaction(&mut self.conn, |tx| {
            for entry in entries {
                let record = FileRecord::from_extracted(package, entry);
                FileEntry {
                    path: record.path,
                    package: record.package,
                    kind: record.kind,
                    checksum: record.checksum,
                    uid: record.uid,
                    gid: record.gid,
                    flags: record.flags,
                    mode: record.mode,
                }
                .upsert(tx)?;
            }
            Ok(())
        })?;
        debug!("Registered {} entries for {}", entries.len(), package);
        Ok(())
    }

    fn list_packages(&self) -> Result<Vec<PackageRecord>> {
        Ok(Package::list_all(&self.conn)?
            .into_iter()
            .map(|p| PackageRecord {
                name: p.name,
                version: p.version,
            })
            .collect())
    }

    fn package_files(&self, name: &str) -> Result<Vec<FileRecord>> {
        Ok(FileEntry::find_by_package(&self.conn, name)?
            .into_iter()
            .map(|f| FileRecord {
                path: f.path,
                package: f.package,
                kind: f.kind,
                checksum: f.checksum,
                uid: f.uid,
                gid: f.gid,
                flags: f.flags,
                mode: f.mode,
            })
            .collect())
    }
}
