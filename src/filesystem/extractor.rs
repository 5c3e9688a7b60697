// src/filesystem/extractor.rs

//! Archive member extraction onto a destination root
//!
//! Each content member is looked up in the manifest tables; members the
//! manifest does not list are skipped. Listed members are written with their
//! ownership, mode and flags and returned as `ExtractedEntry` records for the
//! catalog. Extraction is lazy: `Extraction` pulls one member at a time from
//! the package stream and stops for good at the first structural error.

use crate::config::{ExtractionMode, HashMismatchPolicy, InstallerConfig};
use crate::error::{Error, Result};
use crate::filesystem::flags::{self, PAX_FFLAGS_KEY};
use crate::filesystem::path::{install_path, lookup_candidates, normalize_entry_name, resolve};
use crate::filesystem::posix::{self, EntryMeta};
use crate::hash::{self, HASH_NOT_COMPUTED, Sha256Writer};
use crate::packages::archive::{PackageStream, member_name};
use crate::packages::manifest::PackageDescriptor;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use tar::{Entry, EntryType};
use tracing::{debug, error, trace};

/// Kind of an extracted member
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Directory,
    Symlink,
    HardLink,
}

impl EntryKind {
    /// Kind string stored in the catalog; hard links are recorded as files
    pub fn catalog_kind(&self) -> &'static str {
        match self {
            Self::File | Self::HardLink => "file",
            Self::Directory => "dir",
            Self::Symlink => "slink",
        }
    }
}

/// One installed member, as handed to the catalog
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedEntry {
    /// Path relative to the destination root, prefix applied
    pub path: String,
    pub kind: EntryKind,
    /// Content digest; empty for directories and symlinks, the manifest
    /// value for hard links
    pub hash: String,
    pub uid: u32,
    pub gid: u32,
    pub flags: u32,
    pub mode: u32,
}

/// Read ownership, permission bits and flags from a member header
fn entry_meta<R: Read>(entry: &mut Entry<'_, R>) -> Result<EntryMeta> {
    let header = entry.header();
    let uid = header.uid()? as u32;
    let gid = header.gid()? as u32;
    let mode = header.mode()? & 0o7777;

    let mut flags = 0;
    if let Some(extensions) = entry.pax_extensions()? {
        for extension in extensions {
            let extension = extension?;
            if extension.key() == Ok(PAX_FFLAGS_KEY)
                && let Ok(value) = extension.value()
            {
                flags = flags::parse_fflags(value);
            }
        }
    }

    Ok(EntryMeta {
        uid,
        gid,
        mode,
        flags,
    })
}

/// Largest up-front reservation for a buffered member; bigger members grow
/// the buffer as they are read
const MAX_PREALLOCATION: u64 = 1 << 20;

/// Initial buffer size for a member whose header claims `size` bytes
fn buffer_capacity(size: u64) -> usize {
    size.min(MAX_PREALLOCATION) as usize
}

fn sibling(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(suffix);
    PathBuf::from(name)
}

/// Write a file in place, or beside it and rename over it when the target
/// cannot be opened (busy or immutable)
fn write_with_fallback<T>(
    target: &Path,
    write: impl FnOnce(&mut File) -> io::Result<T>,
) -> Result<T> {
    match File::create(target) {
        Ok(mut file) => Ok(write(&mut file)?),
        Err(e) => {
            let newfile = sibling(target, ".new");
            debug!(
                "Cannot open {} ({}), writing {} instead",
                target.display(),
                e,
                newfile.display()
            );
            let mut file = File::create(&newfile)?;
            let value = write(&mut file)?;
            drop(file);

            if let Err(e) = fs::rename(&newfile, target) {
                let backup = sibling(target, ".old");
                debug!(
                    "Rename onto {} failed ({}), moving it to {}",
                    target.display(),
                    e,
                    backup.display()
                );
                fs::rename(target, &backup)?;
                fs::rename(&newfile, target)?;
            }
            Ok(value)
        }
    }
}

/// Extracts package members under one destination root
pub struct Extractor<'d> {
    root: String,
    prefix: Option<&'d str>,
    files: &'d BTreeMap<String, String>,
    directories: &'d BTreeMap<String, Value>,
    config: &'d InstallerConfig,
}

impl<'d> Extractor<'d> {
    pub fn new(
        root: &str,
        prefix: Option<&'d str>,
        files: &'d BTreeMap<String, String>,
        directories: &'d BTreeMap<String, Value>,
        config: &'d InstallerConfig,
    ) -> Self {
        Self {
            root: root.to_string(),
            prefix,
            files,
            directories,
            config,
        }
    }

    /// Extractor for the tables of a decoded package
    pub fn for_package(
        root: &str,
        package: &'d PackageDescriptor,
        config: &'d InstallerConfig,
    ) -> Self {
        Self::new(
            root,
            package.prefix.as_deref(),
            &package.files,
            &package.directories,
            config,
        )
    }

    /// Manifest hash for a member, `"-"` for listed directories, `None` when
    /// the member is not part of the package
    pub fn membership(&self, name: &str) -> Option<String> {
        let candidates = lookup_candidates(name, self.prefix);

        if let Some(hash) = candidates.iter().find_map(|c| self.files.get(c)) {
            return Some(hash.clone());
        }
        // Directory keys may or may not carry a trailing slash
        if candidates.iter().any(|c| {
            self.directories.contains_key(c)
                || match c.strip_suffix('/') {
                    Some(bare) => self.directories.contains_key(bare),
                    None => self.directories.contains_key(&format!("{c}/")),
                }
        }) {
            return Some(HASH_NOT_COMPUTED.to_string());
        }
        None
    }

    /// Lazily extract every remaining member of `stream`
    pub fn extract<'a, R: Read + 'a>(self, stream: PackageStream<'a, R>) -> Extraction<'a, 'd, R> {
        Extraction {
            extractor: self,
            stream,
            done: false,
        }
    }

    /// Extract a single member; `Ok(None)` when it is skipped
    pub fn extract_entry<R: Read>(&self, mut entry: Entry<'_, R>) -> Result<Option<ExtractedEntry>> {
        let name = member_name(&entry);
        let entry_type = entry.header().entry_type();

        if entry_type == EntryType::XGlobalHeader {
            trace!("Ignoring global extended header {}", name);
            return Ok(None);
        }

        let Some(manifest_hash) = self.membership(&name) else {
            trace!("{} is not part of the package, skipping", name);
            return Ok(None);
        };

        let (logical, full) = resolve(&name, self.prefix, &self.root)?;
        let full_path = PathBuf::from(&full);
        debug!("{}: will be extracted as {}", name, full);

        let meta = entry_meta(&mut entry)?;
        posix::make_parent_dirs(&full_path);

        let (kind, hash) = match entry_type {
            EntryType::Regular | EntryType::Continuous => {
                let digest = self.extract_file(&name, &mut entry, &full_path, &manifest_hash)?;
                posix::apply_metadata(&full_path, &meta, false)?;
                (EntryKind::File, digest)
            }
            EntryType::Directory => {
                if let Err(e) = fs::create_dir(&full_path)
                    && e.kind() != io::ErrorKind::AlreadyExists
                {
                    error!("Could not create directory {}: {}", full, e);
                    return Err(e.into());
                }
                posix::apply_metadata(&full_path, &meta, false)?;
                (EntryKind::Directory, String::new())
            }
            EntryType::Symlink => {
                let target = link_target(&entry, &name)?;
                self.extract_symlink(&name, &target, &full_path, &manifest_hash)?;
                posix::apply_metadata(&full_path, &meta, true)?;
                (EntryKind::Symlink, String::new())
            }
            EntryType::Link => {
                let target = link_target(&entry, &name)?;
                self.extract_hard_link(&target, &full_path)?;
                (EntryKind::HardLink, manifest_hash)
            }
            other => {
                error!("Unknown archive entry type {:?} for {}", other, name);
                return Err(Error::UnknownEntryType {
                    path: name,
                    kind: format!("{:?}", other),
                });
            }
        };

        Ok(Some(ExtractedEntry {
            path: logical,
            kind,
            hash,
            uid: meta.uid,
            gid: meta.gid,
            flags: meta.flags,
            mode: meta.mode,
        }))
    }

    fn check_hash(&self, name: &str, manifest_hash: &str, actual: &str) -> Result<()> {
        let Some(mismatch) = hash::check(manifest_hash, actual) else {
            return Ok(());
        };
        error!("{} hash does not match manifest ({})", name, mismatch);
        match self.config.hash_mismatch {
            HashMismatchPolicy::Warn => Ok(()),
            HashMismatchPolicy::Abort => Err(Error::HashMismatch {
                path: name.to_string(),
                expected: mismatch.expected,
                actual: mismatch.actual,
            }),
        }
    }

    /// Write a regular file and return the digest of its content
    fn extract_file<R: Read>(
        &self,
        name: &str,
        entry: &mut Entry<'_, R>,
        target: &Path,
        manifest_hash: &str,
    ) -> Result<String> {
        match self.config.extraction {
            ExtractionMode::Buffered => {
                let mut buffer = Vec::with_capacity(buffer_capacity(entry.size()));
                entry
                    .read_to_end(&mut buffer)
                    .map_err(|e| Error::Archive(format!("{}: {}", name, e)))?;
                let digest = hash::sha256(&buffer);
                self.check_hash(name, manifest_hash, &digest)?;

                posix::clear_flags(target);
                write_with_fallback(target, |file| file.write_all(&buffer))?;
                Ok(digest)
            }
            ExtractionMode::Streaming => {
                posix::clear_flags(target);
                let digest = write_with_fallback(target, |file| {
                    let mut writer = Sha256Writer::new(file);
                    io::copy(entry, &mut writer)?;
                    Ok(writer.finish().1)
                })?;
                // Content is already on disk; an abort still fails the package
                self.check_hash(name, manifest_hash, &digest)?;
                Ok(digest)
            }
        }
    }

    fn extract_symlink(
        &self,
        name: &str,
        target: &str,
        link: &Path,
        manifest_hash: &str,
    ) -> Result<()> {
        if hash::is_computed(manifest_hash) {
            // Link targets are hashed without their leading slash
            let digest = hash::sha256(target.strip_prefix('/').unwrap_or(target).as_bytes());
            self.check_hash(name, manifest_hash, &digest)?;
        }

        if let Err(e) = fs::remove_file(link)
            && e.kind() != io::ErrorKind::NotFound
        {
            error!("Couldn't unlink {}: {}", link.display(), e);
            return Err(e.into());
        }
        std::os::unix::fs::symlink(target, link)?;
        Ok(())
    }

    fn extract_hard_link(&self, target: &str, link: &Path) -> Result<()> {
        let source = install_path(&self.root, normalize_entry_name(target)?);
        let source_path = Path::new(&source);

        let link_error = |reason: String| {
            error!("Could not link {} to {}: {}", source, link.display(), reason);
            Error::LinkResolution {
                source_path: source.clone(),
                target: link.display().to_string(),
                reason,
            }
        };

        let original_flags = posix::get_flags(source_path).map_err(|e| link_error(e.to_string()))?;
        posix::clear_flags(source_path);
        posix::clear_flags(link);
        let _ = fs::remove_file(link);

        fs::hard_link(source_path, link).map_err(|e| link_error(e.to_string()))?;

        if original_flags != 0 {
            posix::set_flags(source_path, original_flags).map_err(|e| link_error(e.to_string()))?;
        }
        Ok(())
    }
}

fn link_target<R: Read>(entry: &Entry<'_, R>, name: &str) -> Result<String> {
    entry
        .link_name_bytes()
        .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
        .ok_or_else(|| Error::Archive(format!("{} has no link target", name)))
}

/// Lazy, single-pass extraction over a package stream
///
/// Yields one `ExtractedEntry` per installed member. After the first error
/// the sequence ends.
pub struct Extraction<'a, 'd, R: Read + 'a> {
    extractor: Extractor<'d>,
    stream: PackageStream<'a, R>,
    done: bool,
}

impl<'a, 'd, R: Read + 'a> Iterator for Extraction<'a, 'd, R> {
    type Item = Result<ExtractedEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        loop {
            let result = match self.stream.next() {
                None => {
                    self.done = true;
                    return None;
                }
                Some(Err(e)) => Err(e),
                Some(Ok(entry)) => match self.extractor.extract_entry(entry) {
                    Ok(None) => continue,
                    Ok(Some(extracted)) => Ok(extracted),
                    Err(e) => Err(e),
                },
            };
            if result.is_err() {
                self.done = true;
            }
            return Some(result);
        }
    }
}

impl<'a, 'd, R: Read + 'a> std::iter::FusedIterator for Extraction<'a, 'd, R> {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::os::unix::fs::MetadataExt;
    use tar::{Archive, Builder, Header};
    use tempfile::TempDir;

    enum Member<'a> {
        File(&'a str, &'a [u8]),
        Dir(&'a str),
        Symlink(&'a str, &'a str),
        HardLink(&'a str, &'a str),
        Fifo(&'a str),
        Flagged(&'a str, &'a [u8], &'a str),
        /// Name written straight into the header, bypassing path checks
        RawName(&'a str, &'a [u8]),
    }

    fn header(kind: EntryType, mode: u32, size: u64) -> Header {
        let mut header = Header::new_ustar();
        header.set_entry_type(kind);
        header.set_mode(mode);
        header.set_size(size);
        header.set_uid(nix::unistd::geteuid().as_raw() as u64);
        header.set_gid(nix::unistd::getegid().as_raw() as u64);
        header
    }

    fn build(members: &[Member<'_>]) -> Vec<u8> {
        let mut builder = Builder::new(Vec::new());
        let mut manifest = header(EntryType::Regular, 0o644, 2);
        builder
            .append_data(&mut manifest, "+MANIFEST", &b"{}"[..])
            .unwrap();
        for member in members {
            match member {
                Member::File(name, data) => {
                    let mut h = header(EntryType::Regular, 0o644, data.len() as u64);
                    builder.append_data(&mut h, name, *data).unwrap();
                }
                Member::Dir(name) => {
                    let mut h = header(EntryType::Directory, 0o755, 0);
                    builder.append_data(&mut h, name, io::empty()).unwrap();
                }
                Member::Symlink(name, target) => {
                    let mut h = header(EntryType::Symlink, 0o777, 0);
                    h.set_link_name(target).unwrap();
                    builder.append_data(&mut h, name, io::empty()).unwrap();
                }
                Member::HardLink(name, target) => {
                    let mut h = header(EntryType::Link, 0o644, 0);
                    h.set_link_name(target).unwrap();
                    builder.append_data(&mut h, name, io::empty()).unwrap();
                }
                Member::Fifo(name) => {
                    let mut h = header(EntryType::Fifo, 0o644, 0);
                    builder.append_data(&mut h, name, io::empty()).unwrap();
                }
                Member::Flagged(name, data, fflags) => {
                    builder
                        .append_pax_extensions([(PAX_FFLAGS_KEY, fflags.as_bytes())])
                        .unwrap();
                    let mut h = header(EntryType::Regular, 0o600, data.len() as u64);
                    builder.append_data(&mut h, name, *data).unwrap();
                }
                Member::RawName(name, data) => {
                    let mut h = header(EntryType::Regular, 0o644, data.len() as u64);
                    h.as_old_mut().name[..name.len()].copy_from_slice(name.as_bytes());
                    h.set_cksum();
                    builder.append(&h, *data).unwrap();
                }
            }
        }
        builder.into_inner().unwrap()
    }

    struct Fixture {
        root: TempDir,
        files: BTreeMap<String, String>,
        dirs: BTreeMap<String, Value>,
        config: InstallerConfig,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                root: TempDir::new().unwrap(),
                files: BTreeMap::new(),
                dirs: BTreeMap::new(),
                config: InstallerConfig::default(),
            }
        }

        fn file(mut self, path: &str, hash: &str) -> Self {
            self.files.insert(path.to_string(), hash.to_string());
            self
        }

        fn dir(mut self, path: &str) -> Self {
            self.dirs.insert(path.to_string(), Value::String("y".to_string()));
            self
        }

        fn root_str(&self) -> String {
            self.root.path().to_string_lossy().into_owned()
        }

        fn run(&self, prefix: Option<&str>, bytes: &[u8]) -> Result<Vec<ExtractedEntry>> {
            let mut archive = Archive::new(bytes);
            let stream = PackageStream::open(&mut archive, "test")?;
            let root = self.root_str();
            Extractor::new(&root, prefix, &self.files, &self.dirs, &self.config)
                .extract(stream)
                .collect()
        }
    }

    #[test]
    fn test_buffer_capacity_ignores_oversized_headers() {
        assert_eq!(buffer_capacity(0), 0);
        assert_eq!(buffer_capacity(4096), 4096);
        assert_eq!(buffer_capacity(u64::MAX), MAX_PREALLOCATION as usize);
    }

    #[test]
    fn test_extracts_file_and_records_digest() {
        let fx = Fixture::new().file("bin/a", &hash::sha256(b"hello"));
        let entries = fx.run(None, &build(&[Member::File("bin/a", b"hello")])).unwrap();

        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].path, "bin/a");
        assert_eq!(entries[0].kind, EntryKind::File);
        assert_eq!(entries[0].hash, hash::sha256(b"hello"));
        assert_eq!(entries[0].mode, 0o644);

        let on_disk = fx.root.path().join("bin/a");
        assert_eq!(fs::read(&on_disk).unwrap(), b"hello");
        assert_eq!(fs::metadata(&on_disk).unwrap().mode() & 0o7777, 0o644);
    }

    #[test]
    fn test_skips_members_not_in_manifest() {
        let fx = Fixture::new().file("bin/a", "-");
        let entries = fx
            .run(
                None,
                &build(&[Member::File("bin/a", b"a"), Member::File("bin/extra", b"x")]),
            )
            .unwrap();

        assert_eq!(entries.len(), 1);
        assert!(!fx.root.path().join("bin/extra").exists());
    }

    #[test]
    fn test_prefix_and_absolute_manifest_keys() {
        let fx = Fixture::new().file("/usr/local/bin/a", "-");
        let entries = fx
            .run(Some("/usr/local"), &build(&[Member::File("./bin/a", b"a")]))
            .unwrap();

        assert_eq!(entries[0].path, "/usr/local/bin/a");
        assert!(fx.root.path().join("usr/local/bin/a").is_file());
    }

    #[test]
    fn test_hash_mismatch_warns_and_installs() {
        let fx = Fixture::new().file("bin/a", &"0".repeat(64));
        let entries = fx.run(None, &build(&[Member::File("bin/a", b"data")])).unwrap();

        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].hash, hash::sha256(b"data"));
        assert_eq!(fs::read(fx.root.path().join("bin/a")).unwrap(), b"data");
    }

    #[test]
    fn test_hash_mismatch_abort_policy() {
        let mut fx = Fixture::new().file("bin/a", &"0".repeat(64));
        fx.config.hash_mismatch = HashMismatchPolicy::Abort;

        let err = fx
            .run(None, &build(&[Member::File("bin/a", b"data")]))
            .unwrap_err();
        assert!(matches!(err, Error::HashMismatch { .. }));
        // Buffered mode verifies before writing
        assert!(!fx.root.path().join("bin/a").exists());
    }

    #[test]
    fn test_streaming_mode_matches_buffered() {
        let mut fx = Fixture::new().file("bin/a", &hash::sha256(b"streamed"));
        fx.config.extraction = ExtractionMode::Streaming;

        let entries = fx
            .run(None, &build(&[Member::File("bin/a", b"streamed")]))
            .unwrap();
        assert_eq!(entries[0].hash, hash::sha256(b"streamed"));
        assert_eq!(fs::read(fx.root.path().join("bin/a")).unwrap(), b"streamed");
    }

    #[test]
    fn test_directory_member() {
        let fx = Fixture::new().dir("share/doc/");
        fs::create_dir_all(fx.root.path().join("share/doc")).unwrap();

        // Existing directory is not an error
        let entries = fx.run(None, &build(&[Member::Dir("share/doc")])).unwrap();
        assert_eq!(entries[0].kind, EntryKind::Directory);
        assert_eq!(entries[0].kind.catalog_kind(), "dir");
        assert!(entries[0].hash.is_empty());
    }

    #[test]
    fn test_symlink_replaced_not_accumulated() {
        let target_hash = hash::sha256(b"usr/lib/libfoo.so.2");
        let fx = Fixture::new().file("lib/libfoo.so", &target_hash);
        fs::create_dir_all(fx.root.path().join("lib")).unwrap();
        std::os::unix::fs::symlink("libfoo.so.1", fx.root.path().join("lib/libfoo.so")).unwrap();

        let entries = fx
            .run(
                None,
                &build(&[Member::Symlink("lib/libfoo.so", "/usr/lib/libfoo.so.2")]),
            )
            .unwrap();

        assert_eq!(entries[0].kind.catalog_kind(), "slink");
        assert!(entries[0].hash.is_empty());
        assert_eq!(
            fs::read_link(fx.root.path().join("lib/libfoo.so")).unwrap(),
            PathBuf::from("/usr/lib/libfoo.so.2")
        );
    }

    #[test]
    fn test_hard_link() {
        let fx = Fixture::new().file("bin/a", "-").file("bin/b", "abc");
        let entries = fx
            .run(
                None,
                &build(&[Member::File("bin/a", b"shared"), Member::HardLink("bin/b", "bin/a")]),
            )
            .unwrap();

        assert_eq!(entries[1].kind, EntryKind::HardLink);
        assert_eq!(entries[1].kind.catalog_kind(), "file");
        assert_eq!(entries[1].hash, "abc");

        let a = fs::metadata(fx.root.path().join("bin/a")).unwrap();
        let b = fs::metadata(fx.root.path().join("bin/b")).unwrap();
        assert_eq!(a.ino(), b.ino());
    }

    #[test]
    fn test_hard_link_missing_source_stops_extraction() {
        let fx = Fixture::new().file("bin/b", "-").file("bin/c", "-");
        let bytes = build(&[
            Member::HardLink("bin/b", "bin/missing"),
            Member::File("bin/c", b"c"),
        ]);

        let mut archive = Archive::new(bytes.as_slice());
        let stream = PackageStream::open(&mut archive, "test").unwrap();
        let root = fx.root_str();
        let mut extraction =
            Extractor::new(&root, None, &fx.files, &fx.dirs, &fx.config).extract(stream);

        assert!(matches!(
            extraction.next(),
            Some(Err(Error::LinkResolution { .. }))
        ));
        assert!(extraction.next().is_none());
        assert!(!fx.root.path().join("bin/c").exists());
    }

    #[test]
    fn test_unknown_entry_type() {
        let fx = Fixture::new().file("dev/fifo", "-");
        let err = fx.run(None, &build(&[Member::Fifo("dev/fifo")])).unwrap_err();
        assert!(matches!(err, Error::UnknownEntryType { .. }));
    }

    #[test]
    fn test_path_traversal_rejected() {
        let fx = Fixture::new().file("../escape", "-");
        let err = fx
            .run(None, &build(&[Member::RawName("../escape", b"x")]))
            .unwrap_err();

        assert!(matches!(err, Error::PathTraversal(_)));
        assert!(!fx.root.path().parent().unwrap().join("escape").exists());
    }

    #[test]
    fn test_pax_flags_recorded() {
        let fx = Fixture::new().file("boot/kernel", "-");
        let entries = fx
            .run(None, &build(&[Member::Flagged("boot/kernel", b"k", "schg,nodump")]))
            .unwrap();

        assert_eq!(entries[0].flags, flags::SF_IMMUTABLE | flags::UF_NODUMP);
        assert_eq!(entries[0].mode, 0o600);
    }

    #[test]
    fn test_reinstall_is_idempotent() {
        let fx = Fixture::new().file("etc/motd", &hash::sha256(b"welcome"));
        let bytes = build(&[Member::File("etc/motd", b"welcome")]);

        let first = fx.run(None, &bytes).unwrap();
        let second = fx.run(None, &bytes).unwrap();

        assert_eq!(first, second);
        assert_eq!(fs::read(fx.root.path().join("etc/motd")).unwrap(), b"welcome");
    }

    #[test]
    fn test_membership_dirs_fallback() {
        let files = BTreeMap::new();
        let mut dirs = BTreeMap::new();
        dirs.insert("/usr/local/share/x/".to_string(), Value::Null);
        let config = InstallerConfig::default();
        let extractor = Extractor::new("/", Some("/usr/local"), &files, &dirs, &config);

        assert_eq!(extractor.membership("share/x/"), Some("-".to_string()));
        assert_eq!(extractor.membership("share/y/"), None);
    }
}
