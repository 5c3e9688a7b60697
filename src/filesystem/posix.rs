// src/filesystem/posix.rs

//! Ownership, permission and flag handling for extracted entries
//!
//! Flags are set with `lchflags(2)` on BSD-family systems. Elsewhere there is
//! no equivalent, so a nonzero flag set is logged and skipped.

use crate::error::Result;
use std::fs::{self, DirBuilder, Permissions};
use std::io;
use std::os::unix::fs::{DirBuilderExt, PermissionsExt};
use std::path::Path;
use tracing::{debug, trace};

/// Ownership, permission bits and flags read from an archive header
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EntryMeta {
    pub uid: u32,
    pub gid: u32,
    /// Permission bits only (`S_IMODE`)
    pub mode: u32,
    pub flags: u32,
}

/// Whether the process runs with an effective uid of 0
pub fn is_root() -> bool {
    nix::unistd::geteuid().is_root()
}

fn is_errno(err: &io::Error, errno: i32) -> bool {
    err.raw_os_error() == Some(errno)
}

#[cfg(any(target_os = "freebsd", target_os = "dragonfly", target_os = "macos"))]
mod platform {
    use std::ffi::CString;
    use std::io;
    use std::os::unix::ffi::OsStrExt;
    use std::path::Path;

    pub fn get_flags(path: &Path) -> io::Result<u32> {
        #[cfg(target_os = "freebsd")]
        use std::os::freebsd::fs::MetadataExt;
        #[cfg(target_os = "dragonfly")]
        use std::os::dragonfly::fs::MetadataExt;
        #[cfg(target_os = "macos")]
        use std::os::macos::fs::MetadataExt;

        Ok(std::fs::symlink_metadata(path)?.st_flags())
    }

    pub fn set_flags(path: &Path, flags: u32) -> io::Result<()> {
        let c_path = CString::new(path.as_os_str().as_bytes())
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
        // SAFETY: c_path is a valid NUL-terminated string for the call's duration
        let rc = unsafe { libc::lchflags(c_path.as_ptr(), flags as _) };
        if rc == 0 {
            Ok(())
        } else {
            Err(io::Error::last_os_error())
        }
    }
}

#[cfg(not(any(target_os = "freebsd", target_os = "dragonfly", target_os = "macos")))]
mod platform {
    use std::io;
    use std::path::Path;
    use tracing::debug;

    pub fn get_flags(path: &Path) -> io::Result<u32> {
        std::fs::symlink_metadata(path).map(|_| 0)
    }

    pub fn set_flags(path: &Path, flags: u32) -> io::Result<()> {
        if flags != 0 {
            debug!(
                "File flags {:#x} on {} not supported on this platform, skipping",
                flags,
                path.display()
            );
        }
        Ok(())
    }
}

/// Current flags of a path (not following symlinks)
pub fn get_flags(path: &Path) -> io::Result<u32> {
    platform::get_flags(path)
}

/// Set flags on a path (not following symlinks)
pub fn set_flags(path: &Path, flags: u32) -> io::Result<()> {
    platform::set_flags(path, flags)
}

/// Best-effort flag reset so the path can be written or removed
pub fn clear_flags(path: &Path) {
    if let Err(e) = set_flags(path, 0) {
        trace!("Could not clear flags on {}: {}", path.display(), e);
    }
}

/// Apply ownership, mode and flags to an extracted path
///
/// Ownership and flag errors are tolerated when the process is not root or
/// the error is `EPERM`. Mode is not applied to symlinks.
pub fn apply_metadata(path: &Path, meta: &EntryMeta, is_symlink: bool) -> Result<()> {
    let am_root = is_root();

    if let Err(e) = std::os::unix::fs::lchown(path, Some(meta.uid), Some(meta.gid)) {
        if am_root && !is_errno(&e, libc::EPERM) {
            return Err(e.into());
        }
        trace!(
            "lchown {}:{} on {} not permitted: {}",
            meta.uid,
            meta.gid,
            path.display(),
            e
        );
    }

    if !is_symlink {
        fs::set_permissions(path, Permissions::from_mode(meta.mode))?;
    }

    if meta.flags != 0
        && let Err(e) = set_flags(path, meta.flags)
    {
        if am_root && !is_errno(&e, libc::EPERM) {
            return Err(e.into());
        }
        debug!("Could not set flags on {}: {}", path.display(), e);
    }

    Ok(())
}

/// Create missing parent directories with mode 0755
pub fn make_parent_dirs(path: &Path) {
    let Some(parent) = path.parent() else {
        return;
    };
    if parent.is_dir() {
        return;
    }
    if let Err(e) = DirBuilder::new().recursive(true).mode(0o755).create(parent) {
        debug!("Could not create {}: {}", parent.display(), e);
    }
}

/// Remove a file, clearing flags first
///
/// A path that is already gone counts as removed.
pub fn remove_file(path: &Path) -> bool {
    clear_flags(path);
    match fs::remove_file(path) {
        Ok(()) => true,
        Err(e) if e.kind() == io::ErrorKind::NotFound => true,
        Err(e) => {
            debug!("RemoveFile({}): {}", path.display(), e);
            false
        }
    }
}

/// Remove an empty directory, clearing flags first
///
/// On failure (typically not empty) the original flags are restored.
pub fn remove_directory(path: &Path) -> bool {
    let Ok(original) = get_flags(path) else {
        return false;
    };
    clear_flags(path);
    match fs::remove_dir(path) {
        Ok(()) => true,
        Err(e) => {
            trace!("RemoveDirectory({}): {}", path.display(), e);
            if original != 0 {
                let _ = set_flags(path, original);
            }
            false
        }
    }
}
