// src/db/paths.rs
//! Path derivation for the catalog database

use std::path::{Path, PathBuf};

/// Catalog location relative to a destination root
pub const CATALOG_RELATIVE_PATH: &str = "var/db/pkgtools/catalog.db";

/// Default catalog database for a destination root
pub fn default_db_path(root: &Path) -> PathBuf {
    root.join(CATALOG_RELATIVE_PATH)
}

/// Get the directory containing the database
pub fn db_dir(db_path: &Path) -> PathBuf {
    db_path
        .parent()
        .unwrap_or(Path::new("/var/db/pkgtools"))
        .to_path_buf()
}
