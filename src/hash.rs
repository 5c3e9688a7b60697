// src/hash.rs

//! Content hashing for manifest verification
//!
//! Package manifests record a lowercase hex SHA-256 digest per path, or the
//! sentinel `"-"` when the packager did not compute one.

use sha2::{Digest, Sha256};
use std::fmt;
use std::io::{self, Write};

/// Manifest value meaning "hash not computed"; verification is skipped
pub const HASH_NOT_COMPUTED: &str = "-";

/// Compute the SHA-256 hex digest of a byte slice
pub fn sha256(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    format!("{:x}", hasher.finalize())
}

/// Whether a manifest hash asks for verification
#[inline]
pub fn is_computed(manifest_hash: &str) -> bool {
    manifest_hash != HASH_NOT_COMPUTED
}

/// A recorded digest that did not match the content
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mismatch {
    pub expected: String,
    pub actual: String,
}

impl fmt::Display for Mismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sha256 mismatch: expected {}, got {}", self.expected, self.actual)
    }
}

/// Compare a computed digest against the manifest value
///
/// Returns `None` when they match or when the manifest holds the sentinel.
pub fn check(manifest_hash: &str, actual: &str) -> Option<Mismatch> {
    if !is_computed(manifest_hash) || manifest_hash.eq_ignore_ascii_case(actual) {
        None
    } else {
        Some(Mismatch {
            expected: manifest_hash.to_string(),
            actual: actual.to_string(),
        })
    }
}

/// Writer adapter that hashes everything passing through it
pub struct Sha256Writer<W> {
    inner: W,
    hasher: Sha256,
}

impl<W: Write> Sha256Writer<W> {
    pub fn new(inner: W) -> Self {
        Self {
            inner,
            hasher: Sha256::new(),
        }
    }

    /// Return the inner writer and the hex digest of all bytes written
    pub fn finish(self) -> (W, String) {
        (self.inner, format!("{:x}", self.hasher.finalize()))
    }
}

impl<W: Write> Write for Sha256Writer<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.inner.write(buf)?;
        self.hasher.update(&buf[..n]);
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}
