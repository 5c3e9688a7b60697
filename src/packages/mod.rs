// src/packages/mod.rs

//! Package archive support
//!
//! A package is a tar archive (plain, gzip, xz or zstd) whose leading
//! `+`-prefixed members carry metadata. `archive` reads the stream and
//! `manifest` decodes `+MANIFEST` into a `PackageDescriptor`.

pub mod archive;
pub mod manifest;

pub use archive::{PackageStream, open_archive};
pub use manifest::{DeltaDescriptor, PackageDescriptor, decode};
