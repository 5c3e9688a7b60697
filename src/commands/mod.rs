// src/commands/mod.rs
//! Command handlers for the pkgtools CLI

mod install;
mod query;

pub use install::cmd_install;
pub use query::{cmd_files, cmd_list};

use anyhow::{Context, Result};
use std::path::Path;
use tracing::info;

/// Create the catalog database
pub fn cmd_init(db_path: &Path) -> Result<()> {
    info!("Initializing catalog at: {}", db_path.display());
    pkgtools::db::init(db_path)
        .with_context(|| format!("Failed to initialize catalog at {}", db_path.display()))?;
    println!("Catalog initialized at: {}", db_path.display());
    Ok(())
}
