// src/filesystem/mod.rs

//! Filesystem operations for package installation
//!
//! This module provides:
//! - Install path resolution for archive members (root + prefix + name)
//! - BSD file flag parsing from archive extended headers
//! - Ownership/mode/flag application and flag-aware removal helpers
//! - The archive extractor that writes members and reports them for the catalog

pub mod extractor;
pub mod flags;
pub mod path;
pub mod posix;

pub use extractor::{EntryKind, ExtractedEntry, Extraction, Extractor};
pub use posix::EntryMeta;
