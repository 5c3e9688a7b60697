// src/lib.rs

//! pkgtools: manifest-driven package installation
//!
//! Installs package archives onto a destination root (the running system or
//! an image being assembled) and records the result in a package catalog.
//!
//! # Architecture
//!
//! - `packages`: archive reading and `+MANIFEST` decoding
//! - `filesystem`: member extraction, path resolution, ownership/mode/flags
//! - `scriptlet` + `container`: lifecycle scripts, confined to the root
//! - `catalog` + `db`: installed packages, their scripts and files
//! - `install`: per-package mode selection and sequencing, batch installs

pub mod catalog;
pub mod compression;
pub mod config;
pub mod container;
pub mod db;
mod error;
pub mod filesystem;
pub mod hash;
pub mod install;
pub mod packages;
pub mod scriptlet;

pub use catalog::{Catalog, FileRecord, MemoryCatalog, PackageRecord, SqliteCatalog};
pub use config::InstallerConfig;
pub use error::{Error, Result};
pub use install::{BatchInstaller, InstallMode, InstallReport, Installer, PackageFile, PackageSource};
