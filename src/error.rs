// src/error.rs

//! Error types for pkgtools
//!
//! Errors are grouped the way an install fails: decode errors abort before
//! anything touches the destination root, structural extraction errors abort
//! the current package with whatever was already extracted left in place, and
//! catalog errors abort without rolling back the filesystem.

use thiserror::Error;

/// Result type used throughout the library
pub type Result<T> = std::result::Result<T, Error>;

/// Errors produced by the installation engine
#[derive(Error, Debug)]
pub enum Error {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Catalog database error
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Manifest JSON could not be parsed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Installer configuration could not be parsed
    #[error("configuration error: {0}")]
    Config(#[from] toml::de::Error),

    /// The package archive has no `+MANIFEST` member
    #[error("no manifest found in package {0}")]
    MissingManifest(String),

    /// The manifest is present but lacks a required field
    #[error("malformed manifest: {0}")]
    MalformedManifest(String),

    /// The manifest names an architecture outside the allow-list
    #[error("architecture {0} is not valid")]
    InvalidArchitecture(String),

    /// Delta packages only support the "file" style
    #[error("unsupported delta style: {0}")]
    UnsupportedDeltaStyle(String),

    /// The package archive could not be opened or read
    #[error("unreadable package archive: {0}")]
    Archive(String),

    /// A package member is not a file, directory, symlink or hard link
    #[error("unknown archive entry type for {path}: {kind}")]
    UnknownEntryType { path: String, kind: String },

    /// A hard link member points at a source that cannot be linked
    #[error("could not link {source_path} to {target}: {reason}")]
    LinkResolution {
        source_path: String,
        target: String,
        reason: String,
    },

    /// An archive member tried to escape the destination root
    #[error("path traversal detected: {0}")]
    PathTraversal(String),

    /// Content hash mismatch (only raised under the abort policy)
    #[error("{path} hash does not match manifest: expected {expected}, got {actual}")]
    HashMismatch {
        path: String,
        expected: String,
        actual: String,
    },

    /// Delta package cannot upgrade the installed version
    #[error("delta package {base}->{target} cannot upgrade installed version {installed}")]
    DeltaVersionMismatch {
        base: String,
        target: String,
        installed: String,
    },

    /// Removing the previous package from the catalog failed
    #[error("could not remove {what} for package {package}")]
    CatalogRemoval { package: String, what: String },

    /// A catalog registration or update failed
    #[error("catalog error: {0}")]
    Catalog(String),

    /// Lifecycle script could not be materialized or run
    #[error("scriptlet error: {0}")]
    ScriptletError(String),

    /// A package in a batch failed; earlier packages stay installed
    #[error("unable to install package {package}: {source}")]
    BatchFailed {
        package: String,
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    /// Whether this error was raised before anything was written to the
    /// destination root or catalog
    pub fn is_decode_error(&self) -> bool {
        matches!(
            self,
            Self::Json(_)
                | Self::MissingManifest(_)
                | Self::MalformedManifest(_)
                | Self::InvalidArchitecture(_)
                | Self::UnsupportedDeltaStyle(_)
        )
    }
}
