// src/db/models/mod.rs

//! Data models for catalog tables
//!
//! Each struct mirrors one table and carries its own insert/find/delete
//! queries.

mod file_entry;
mod package;
mod script_entry;

pub use file_entry::{FileEntry, KIND_DIRECTORY};
pub use package::Package;
pub use script_entry::ScriptEntry;
