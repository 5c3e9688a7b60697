// src/commands/install.rs
//! Package installation command

use anyhow::{Context, Result};
use pkgtools::catalog::SqliteCatalog;
use pkgtools::config::InstallerConfig;
use pkgtools::container::ChrootRunner;
use pkgtools::install::{BatchInstaller, Installer, PackageFile};
use std::path::{Path, PathBuf};
use tracing::info;

/// Install `packages` onto `root` in the order given
pub fn cmd_install(
    packages: &[PathBuf],
    root: &Path,
    db_path: &Path,
    config: &InstallerConfig,
) -> Result<()> {
    let catalog = SqliteCatalog::open(db_path)
        .with_context(|| format!("Failed to open catalog {}", db_path.display()))?;
    let runner = ChrootRunner::new();
    let mut installer = Installer::new(root, config, catalog, &runner);

    let sources: Vec<PackageFile> = packages
        .iter()
        .map(|path| PackageFile::from_path(path))
        .collect();

    info!(
        "Installing {} package(s) into {}",
        sources.len(),
        root.display()
    );
    let reports = BatchInstaller::new(&mut installer)
        .install_all(&sources)
        .context("Installation failed")?;

    for report in &reports {
        println!(
            "{}-{}: {} entries ({})",
            report.name,
            report.version,
            report.entries.len(),
            report.mode
        );
    }
    Ok(())
}
