// src/install/batch.rs

//! Sequential installation of several packages
//!
//! Packages are installed one after another in the order given. The first
//! failure stops the batch; packages installed before it stay installed.

use super::{InstallReport, Installer};
use crate::catalog::Catalog;
use crate::compression::CompressionFormat;
use crate::error::{Error, Result};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};
use strum::IntoEnumIterator;
use tracing::{error, info};

/// Something that can hand out a package archive to install
pub trait PackageSource {
    /// Name used in progress and error messages
    fn name(&self) -> &str;

    /// Open the archive for reading
    fn open(&self) -> Result<Box<dyn Read + '_>>;
}

/// A package archive on disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageFile {
    pub name: String,
    pub path: PathBuf,
}

impl PackageFile {
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
        }
    }

    /// Package file named after its file name (`pkgA-1.0.txz` -> `pkgA-1.0`)
    pub fn from_path(path: &Path) -> Self {
        let file_name = path
            .file_name()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        let name = CompressionFormat::iter()
            .find_map(|format| file_name.strip_suffix(format.package_suffix()))
            .map(str::to_string)
            .unwrap_or(file_name);
        Self::new(name, path)
    }
}

impl PackageSource for PackageFile {
    fn name(&self) -> &str {
        &self.name
    }

    fn open(&self) -> Result<Box<dyn Read + '_>> {
        let file = File::open(&self.path)?;
        Ok(Box::new(BufReader::new(file)))
    }
}

/// Runs an `Installer` over an ordered list of packages
pub struct BatchInstaller<'i, 'a, C: Catalog> {
    installer: &'i mut Installer<'a, C>,
}

impl<'i, 'a, C: Catalog> BatchInstaller<'i, 'a, C> {
    pub fn new(installer: &'i mut Installer<'a, C>) -> Self {
        Self { installer }
    }

    /// Install every source in order, stopping at the first failure
    pub fn install_all<S: PackageSource>(&mut self, sources: &[S]) -> Result<Vec<InstallReport>> {
        let total = sources.len();
        let mut reports = Vec::with_capacity(total);

        for (index, source) in sources.iter().enumerate() {
            info!("Installing {} ({}/{})", source.name(), index + 1, total);

            let result = source
                .open()
                .and_then(|reader| self.installer.install_reader(reader, source.name()));

            match result {
                Ok(report) => reports.push(report),
                Err(e) => {
                    error!("Unable to install package {}: {}", source.name(), e);
                    return Err(Error::BatchFailed {
                        package: source.name().to_string(),
                        source: Box::new(e),
                    });
                }
            }
        }

        info!("Installed {} package(s)", reports.len());
        Ok(reports)
    }
}
