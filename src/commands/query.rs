// src/commands/query.rs
//! Catalog inspection commands

use anyhow::{Context, Result};
use pkgtools::catalog::{Catalog, SqliteCatalog};
use std::path::Path;

fn open_catalog(db_path: &Path) -> Result<SqliteCatalog> {
    let conn = pkgtools::db::open(db_path)
        .with_context(|| format!("Failed to open catalog {}", db_path.display()))?;
    Ok(SqliteCatalog::from_connection(conn))
}

/// List installed packages
pub fn cmd_list(db_path: &Path) -> Result<()> {
    let catalog = open_catalog(db_path)?;
    let packages = catalog.list_packages()?;

    if packages.is_empty() {
        println!("No packages installed.");
    } else {
        for package in &packages {
            println!("{}-{}", package.name, package.version);
        }
        println!("\nTotal: {} package(s)", packages.len());
    }
    Ok(())
}

/// List the files recorded for `name`
pub fn cmd_files(name: &str, db_path: &Path) -> Result<()> {
    let catalog = open_catalog(db_path)?;
    if catalog.find_package(name)?.is_none() {
        anyhow::bail!("Package {} is not installed", name);
    }

    for file in catalog.package_files(name)? {
        println!(
            "{:<5} {:o} {}:{} {} {}",
            file.kind,
            file.mode & 0o7777,
            file.uid,
            file.gid,
            pkgtools::filesystem::flags::describe(file.flags),
            file.path
        );
    }
    Ok(())
}
