// src/packages/manifest.rs

//! `+MANIFEST` decoding
//!
//! The manifest is a JSON object. Only the fields the installer consumes are
//! decoded; everything else (dependencies, options, annotations) is ignored.

use crate::config::InstallerConfig;
use crate::error::{Error, Result};
use crate::scriptlet::ScriptTable;
use serde::Deserialize;
use std::collections::BTreeMap;
use tracing::debug;

/// Name of the manifest member inside a package archive
pub const MANIFEST_MEMBER: &str = "+MANIFEST";

/// Only whole-file deltas are understood
pub const DELTA_STYLE_FILE: &str = "file";

/// Delta information: which installed version this package upgrades
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeltaDescriptor {
    pub base_version: String,
    pub style: String,
}

/// Decoded package manifest
#[derive(Debug, Clone, PartialEq)]
pub struct PackageDescriptor {
    pub name: String,
    pub version: String,
    pub prefix: Option<String>,
    pub arch: Option<String>,
    /// Path to hex SHA-256 digest, or `"-"` when not computed
    pub files: BTreeMap<String, String>,
    /// `directories` and `dirs` merged; values are opaque metadata
    pub directories: BTreeMap<String, serde_json::Value>,
    pub scripts: ScriptTable,
    pub delta: Option<DeltaDescriptor>,
    pub removed_files: Vec<String>,
    pub removed_directories: Vec<String>,
}

impl PackageDescriptor {
    pub fn is_delta(&self) -> bool {
        self.delta.is_some()
    }

    /// `name-version`, as printed during installs
    pub fn display_name(&self) -> String {
        format!("{}-{}", self.name, self.version)
    }
}

#[derive(Debug, Deserialize)]
struct RawDelta {
    version: Option<String>,
    style: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawManifest {
    name: Option<String>,
    version: Option<String>,
    prefix: Option<String>,
    arch: Option<String>,
    #[serde(default)]
    scripts: BTreeMap<String, String>,
    #[serde(default)]
    files: BTreeMap<String, String>,
    #[serde(default)]
    directories: BTreeMap<String, serde_json::Value>,
    #[serde(default)]
    dirs: BTreeMap<String, serde_json::Value>,
    #[serde(rename = "delta-version")]
    delta_version: Option<RawDelta>,
    #[serde(rename = "removed-files", default)]
    removed_files: Vec<String>,
    #[serde(rename = "removed-directories", default)]
    removed_directories: Vec<String>,
}

/// Decode manifest bytes into a descriptor
///
/// Fails on malformed JSON, a missing name or version, an architecture
/// outside `config.valid_architectures`, or a delta style other than `file`.
pub fn decode(raw: &[u8], config: &InstallerConfig) -> Result<PackageDescriptor> {
    let manifest: RawManifest = serde_json::from_slice(raw)?;

    let name = manifest
        .name
        .ok_or_else(|| Error::MalformedManifest("missing name".to_string()))?;
    let version = manifest
        .version
        .ok_or_else(|| Error::MalformedManifest(format!("{} is missing version", name)))?;

    if let Some(arch) = &manifest.arch
        && !config.is_valid_architecture(arch)
    {
        return Err(Error::InvalidArchitecture(arch.clone()));
    }

    if let Some(prefix) = &manifest.prefix {
        debug!("prefix = {}", prefix);
    }

    let (delta, removed_files, removed_directories) = match manifest.delta_version {
        Some(raw_delta) => {
            let style = raw_delta.style.ok_or_else(|| {
                Error::MalformedManifest(format!("{} delta-version is missing style", name))
            })?;
            if style != DELTA_STYLE_FILE {
                return Err(Error::UnsupportedDeltaStyle(style));
            }
            let base_version = raw_delta.version.ok_or_else(|| {
                Error::MalformedManifest(format!("{} delta-version is missing version", name))
            })?;
            debug!(
                "Deleted files = {:?}, deleted dirs = {:?}",
                manifest.removed_files, manifest.removed_directories
            );
            (
                Some(DeltaDescriptor { base_version, style }),
                manifest.removed_files,
                manifest.removed_directories,
            )
        }
        // Removal lists only mean something for deltas
        None => (None, Vec::new(), Vec::new()),
    };

    let mut directories = manifest.directories;
    directories.extend(manifest.dirs);

    Ok(PackageDescriptor {
        name,
        version,
        prefix: manifest.prefix,
        arch: manifest.arch,
        files: manifest.files,
        directories,
        scripts: ScriptTable::from_raw(manifest.scripts),
        delta,
        removed_files,
        removed_directories,
    })
}
