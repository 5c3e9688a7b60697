// src/catalog/mod.rs

//! Installed-package catalog
//!
//! The installer only talks to the catalog through the `Catalog` trait:
//! look up an installed package and its scripts, write the package row,
//! register extracted entries in bulk, and remove what an upgrade replaces.
//! `SqliteCatalog` is the persistent implementation, `MemoryCatalog` keeps
//! everything in process.

mod memory;
mod sqlite;

pub use memory::MemoryCatalog;
pub use sqlite::SqliteCatalog;

use crate::error::Result;
use crate::filesystem::ExtractedEntry;
use crate::hash::HASH_NOT_COMPUTED;
use crate::scriptlet::ScriptTable;

/// An installed package
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageRecord {
    pub name: String,
    pub version: String,
}

/// A path registered to an installed package
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRecord {
    pub path: String,
    pub package: String,
    /// `file`, `dir` or `slink`
    pub kind: String,
    /// Hex SHA-256, or `-` when there is nothing to hash
    pub checksum: String,
    pub uid: u32,
    pub gid: u32,
    pub flags: u32,
    pub mode: u32,
}

impl FileRecord {
    pub fn from_extracted(package: &str, entry: &ExtractedEntry) -> Self {
        let checksum = if entry.hash.is_empty() {
            HASH_NOT_COMPUTED.to_string()
        } else {
            entry.hash.clone()
        };
        Self {
            path: entry.path.clone(),
            package: package.to_string(),
            kind: entry.kind.catalog_kind().to_string(),
            checksum,
            uid: entry.uid,
            gid: entry.gid,
            flags: entry.flags,
            mode: entry.mode,
        }
    }

    pub fn is_directory(&self) -> bool {
        self.kind == crate::db::models::KIND_DIRECTORY
    }
}

/// Storage of installed packages, their scripts and their files
pub trait Catalog {
    fn find_package(&self, name: &str) -> Result<Option<PackageRecord>>;

    /// Scripts of an installed package; `None` when it is not installed
    fn find_scripts(&self, name: &str) -> Result<Option<ScriptTable>>;

    /// Record a new package at `version` together with its scripts
    fn add_package(&mut self, name: &str, version: &str, scripts: &ScriptTable) -> Result<()>;

    /// Move an installed package from `from` to `to`, replacing its scripts
    ///
    /// Fails when `name` is not installed at `from`.
    fn update_package(
        &mut self,
        name: &str,
        from: &str,
        to: &str,
        scripts: &ScriptTable,
    ) -> Result<()>;

    fn remove_package(&mut self, name: &str) -> Result<()>;

    /// Remove every non-directory record of a package
    fn remove_package_files(&mut self, name: &str) -> Result<()>;

    /// Remove the directory records of a package
    fn remove_package_directories(&mut self, name: &str) -> Result<()>;

    fn remove_package_scripts(&mut self, name: &str) -> Result<()>;

    /// Remove the record of a single path, whoever owns it
    fn remove_file_entry(&mut self, path: &str) -> Result<()>;

    /// Register extracted entries against `package` in one call
    ///
    /// A record for an already registered path is replaced.
    fn add_files_bulk(&mut self, package: &str, entries: &[ExtractedEntry]) -> Result<()>;

    /// All installed packages, ordered by name
    fn list_packages(&self) -> Result<Vec<PackageRecord>>;

    /// Records of a package, ordered by path
    fn package_files(&self, name: &str) -> Result<Vec<FileRecord>>;
}

impl<C: Catalog + ?Sized> Catalog for &mut C {
    fn find_package(&self, name: &str) -> Result<Option<PackageRecord>> {
        (**self).find_package(name)
    }

    fn find_scripts(&self, name: &str) -> Result<Option<ScriptTable>> {
        (**self).find_scripts(name)
    }

    fn add_package(&mut self, name: &str, version: &str, scripts: &ScriptTable) -> Result<()> {
        (**self).add_package(name, version, scripts)
    }

    fn update_package(
        &mut self,
        name: &str,
        from: &str,
        to: &str,
        scripts: &ScriptTable,
    ) -> Result<()> {
        (**self).update_package(name, from, to, scripts)
    }

    fn remove_package(&mut self, name: &str) -> Result<()> {
        (**self).remove_package(name)
    }

    fn remove_package_files(&mut self, name: &str) -> Result<()> {
        (**self).remove_package_files(name)
    }

    fn remove_package_directories(&mut self, name: &str) -> Result<()> {
        (**self).remove_package_directories(name)
    }

    fn remove_package_scripts(&mut self, name: &str) -> Result<()> {
        (**self).remove_package_scripts(name)
    }

    fn remove_file_entry(&mut self, path: &str) -> Result<()> {
        (**self).remove_file_entry(path)
    }

    fn add_files_bulk(&mut self, package: &str, entries: &[ExtractedEntry]) -> Result<()> {
        (**self).add_files_bulk(package, entries)
    }

    fn list_packages(&self) -> Result<Vec<PackageRecord>> {
        (**self).list_packages()
    }

    fn package_files(&self, name: &str) -> Result<Vec<FileRecord>> {
        (**self).package_files(name)
    }
}
