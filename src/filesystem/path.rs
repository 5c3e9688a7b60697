// src/filesystem/path.rs

//! Install path resolution for archive members
//!
//! Archive member names come in two shapes, `./usr/bin/foo` or
//! `/usr/bin/foo` (or bare `usr/bin/foo`). The resolved install path is
//! `root`, `prefix`, and the member name concatenated with exactly one
//! separator at each seam. The same rule produces the logical path recorded
//! in the catalog, which is the name joined to the prefix only.

use crate::error::{Error, Result};
use std::path::{Component, Path};

/// Strip a leading `./` and reject names that climb out of the root
///
/// # Examples
///
/// ```
/// use pkgtools::filesystem::path::normalize_entry_name;
///
/// assert_eq!(normalize_entry_name("./usr/bin/foo").unwrap(), "usr/bin/foo");
/// assert_eq!(normalize_entry_name("/usr/bin/foo").unwrap(), "/usr/bin/foo");
/// assert!(normalize_entry_name("usr/../../etc/passwd").is_err());
/// ```
pub fn normalize_entry_name(name: &str) -> Result<&str> {
    let stripped = name.strip_prefix("./").unwrap_or(name);

    if Path::new(stripped)
        .components()
        .any(|c| matches!(c, Component::ParentDir))
    {
        return Err(Error::PathTraversal(name.to_string()));
    }

    Ok(stripped)
}

/// Join two path strings with a single separator
///
/// No separator is inserted when `base` already ends with one or `tail`
/// already starts with one; when both do, one of them is dropped.
pub fn join_separated(base: &str, tail: &str) -> String {
    match (base.ends_with('/'), tail.strip_prefix('/')) {
        (true, Some(rest)) => format!("{base}{rest}"),
        (true, None) | (false, Some(_)) => format!("{base}{tail}"),
        (false, None) => format!("{base}/{tail}"),
    }
}

/// The catalog path for a normalized member name
///
/// Absolute names are kept as-is; relative names are placed under the
/// package prefix when there is one.
pub fn logical_path(name: &str, prefix: Option<&str>) -> String {
    match prefix {
        Some(prefix) if !name.starts_with('/') => join_separated(prefix, name),
        _ => name.to_string(),
    }
}

/// The absolute install path for a logical path under `root`
pub fn install_path(root: &str, logical: &str) -> String {
    join_separated(root, logical)
}

/// Resolve a raw member name to `(logical path, install path)`
pub fn resolve(name: &str, prefix: Option<&str>, root: &str) -> Result<(String, String)> {
    let normalized = normalize_entry_name(name)?;
    let logical = logical_path(normalized, prefix);
    let full = install_path(root, &logical);
    Ok((logical, full))
}

fn toggle_leading_slash(path: &str) -> String {
    match path.strip_prefix('/') {
        Some(rest) => rest.to_string(),
        None => format!("/{path}"),
    }
}

/// Keys under which a member may appear in the manifest tables
///
/// Manifests may record relative or absolute paths, and tar strips leading
/// slashes, so the member name is tried raw, normalized, prefixed, and each
/// of those with the leading slash flipped. Order is lookup priority;
/// duplicates are dropped.
pub fn lookup_candidates(name: &str, prefix: Option<&str>) -> Vec<String> {
    let normalized = name.strip_prefix("./").unwrap_or(name);
    let mut candidates: Vec<String> = Vec::with_capacity(6);

    let mut push = |candidate: String| {
        if !candidates.contains(&candidate) {
            candidates.push(candidate);
        }
    };

    push(name.to_string());
    push(normalized.to_string());
    push(toggle_leading_slash(normalized));
    if let Some(prefix) = prefix {
        let prefixed = join_separated(prefix, normalized);
        push(toggle_leading_slash(&prefixed));
        push(prefixed);
    }

    candidates
}
