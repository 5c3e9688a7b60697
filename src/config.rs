// src/config.rs

//! Installer configuration
//!
//! Every component receives an `InstallerConfig` at construction instead of
//! consulting process-wide debug/verbose state. The config can be loaded from
//! a TOML file; missing keys fall back to the defaults below.

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Architectures a package manifest may declare
pub const DEFAULT_VALID_ARCHITECTURES: &[&str] = &["freebsd:9:x86:64", "freebsd:10:x86:64"];

/// Default timeout for a single lifecycle script (seconds)
pub const DEFAULT_SCRIPT_TIMEOUT_SECS: u64 = 300;

/// What to do with a lifecycle script when the destination root requires a
/// changed root but the process is not privileged
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum UnprivilegedScripts {
    /// Log an error and skip the script without materializing it
    #[default]
    Skip,
    /// Log an error and carry on past the script: it is written to the
    /// destination root and removed again without being executed
    LogAndContinue,
}

/// How a content-hash mismatch is treated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HashMismatchPolicy {
    /// Log the mismatch and install the entry anyway
    #[default]
    Warn,
    /// Fail the package install
    Abort,
}

/// How regular file content is moved from the archive to disk
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExtractionMode {
    /// Read the whole member into memory, hash, then write
    #[default]
    Buffered,
    /// Hash while writing; memory use is bounded by the copy buffer
    Streaming,
}

/// Configuration threaded through the extractor, script runner and installer
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct InstallerConfig {
    /// Debug level (0 = off); higher levels log per-entry detail
    pub debug: u8,
    /// Verbose progress logging
    pub verbose: bool,
    /// Architectures accepted in the manifest `arch` field
    pub valid_architectures: Vec<String>,
    /// Script policy when not privileged enough to change root
    pub unprivileged_scripts: UnprivilegedScripts,
    /// Content-hash mismatch policy
    pub hash_mismatch: HashMismatchPolicy,
    /// Shell used to interpret lifecycle scripts
    pub shell: PathBuf,
    /// Pass `-x` to the shell
    pub trace_scripts: bool,
    /// Per-script timeout in seconds (0 waits forever)
    pub script_timeout_secs: u64,
    /// File content extraction mode
    pub extraction: ExtractionMode,
}

impl Default for InstallerConfig {
    fn default() -> Self {
        Self {
            debug: 0,
            verbose: false,
            valid_architectures: DEFAULT_VALID_ARCHITECTURES
                .iter()
                .map(|s| s.to_string())
                .collect(),
            unprivileged_scripts: UnprivilegedScripts::default(),
            hash_mismatch: HashMismatchPolicy::default(),
            shell: PathBuf::from("/bin/sh"),
            trace_scripts: true,
            script_timeout_secs: DEFAULT_SCRIPT_TIMEOUT_SECS,
            extraction: ExtractionMode::default(),
        }
    }
}

impl InstallerConfig {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse configuration from TOML text
    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Script timeout, `None` when disabled
    pub fn script_timeout(&self) -> Option<Duration> {
        match self.script_timeout_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        }
    }

    /// Whether `arch` is on the allow-list
    pub fn is_valid_architecture(&self, arch: &str) -> bool {
        self.valid_architectures.iter().any(|a| a == arch)
    }

    /// Default log filter directive derived from debug/verbose
    pub fn log_directive(&self) -> &'static str {
        match (self.debug, self.verbose) {
            (d, _) if d >= 2 => "trace",
            (1, _) | (_, true) => "debug",
            _ => "info",
        }
    }
}
