// src/catalog/memory.rs

//! In-process catalog

use super::{Catalog, FileRecord, PackageRecord};
use crate::error::{Error, Result};
use crate::filesystem::ExtractedEntry;
use crate::scriptlet::ScriptTable;
use std::collections::BTreeMap;

#[derive(Debug, Clone)]
struct Installed {
    version: String,
    scripts: ScriptTable,
}

/// Catalog held entirely in memory
#[derive(Debug, Clone, Default)]
pub struct MemoryCatalog {
    packages: BTreeMap<String, Installed>,
    files: BTreeMap<String, FileRecord>,
}

impl MemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record of a single path, whoever owns it
    pub fn file(&self, path: &str) -> Option<&FileRecord> {
        self.files.get(path)
    }

    fn retain_files(&mut self, keep: impl Fn(&FileRecord) -> bool) {
        self.files.retain(|_, record| keep(record));
    }
}

impl Catalog for MemoryCatalog {
    fn find_package(&self, name: &str) -> Result<Option<PackageRecord>> {
        Ok(self.packages.get(name).map(|p| PackageRecord {
            name: name.to_string(),
            version: p.version.clone(),
        }))
    }

    fn find_scripts(&self, name: &str) -> Result<Option<ScriptTable>> {
        Ok(self.packages.get(name).map(|p| p.scripts.clone()))
    }

    fn add_package(&mut self, name: &str, version: &str, scripts: &ScriptTable) -> Result<()> {
        if self.packages.contains_key(name) {
            return Err(Error::Catalog(format!("{} is already installed", name)));
        }
        self.packages.insert(
            name.to_string(),
            Installed {
                version: version.to_string(),
                scripts: scripts.clone(),
            },
        );
        Ok(())
    }

    fn update_package(
        &mut self,
        name: &str,
        from: &str,
        to: &str,
        scripts: &ScriptTable,
    ) -> Result<()> {
        match self.packages.get_mut(name) {
            Some(installed) if installed.version == from => {
                installed.version = to.to_string();
                installed.scripts = scripts.clone();
                Ok(())
            }
            _ => Err(Error::Catalog(format!(
                "{} is not installed at version {}",
                name, from
            ))),
        }
    }

    fn remove_package(&mut self, name: &str) -> Result<()> {
        self.packages.remove(name);
        Ok(())
    }

    fn remove_package_files(&mut self, name: &str) -> Result<()> {
        self.retain_files(|r| r.package != name || r.is_directory());
        Ok(())
    }

    fn remove_package_directories(&mut self, name: &str) -> Result<()> {
        self.retain_files(|r| r.package != name || !r.is_directory());
        Ok(())
    }

    fn remove_package_scripts(&mut self, name: &str) -> Result<()> {
        if let Some(installed) = self.packages.get_mut(name) {
            installed.scripts = ScriptTable::new();
        }
        Ok(())
    }

    fn remove_file_entry(&mut self, path: &str) -> Result<()> {
        self.files.remove(path);
        Ok(())
    }

    fn add_files_bulk(&mut self, package: &str, entries: &[ExtractedEntry]) -> Result<()> {
        if !self.packages.contains_key(package) {
            return Err(Error::Catalog(format!("{} is not installed", package)));
        }
        for entry in entries {
            self.files
                .insert(entry.path.clone(), FileRecord::from_extracted(package, entry));
        }
        Ok(())
    }

    fn list_packages(&self) -> Result<Vec<PackageRecord>> {
        Ok(self
            .packages
            .iter()
            .map(|(name, p)| PackageRecord {
                name: name.clone(),
                version: p.version.clone(),
            })
            .collect())
    }

    fn package_files(&self, name: &str) -> Result<Vec<FileRecord>> {
        Ok(self
            .files
            .values()
            .filter(|r| r.package == name)
            .cloned()
            .collect())
    }
}
