// src/packages/archive.rs

//! Sequential reading of package archives
//!
//! A package is a (possibly compressed) tar stream whose leading members are
//! `+`-prefixed metadata files, `+MANIFEST` among them. Content members
//! follow. The stream is consumed once, front to back: the metadata members
//! are read when the stream is opened and the first content member is held
//! back until the extractor asks for it.

use crate::compression::{self, CompressionFormat};
use crate::error::{Error, Result};
use crate::packages::manifest::MANIFEST_MEMBER;
use std::io::Read;
use tar::{Archive, Entries, Entry};
use tracing::{debug, trace};

/// Marker prefix of metadata members
pub const METADATA_MARKER: char = '+';

/// Open a package archive, detecting its compression
pub fn open_archive<'a, R: Read + 'a>(
    reader: R,
) -> Result<(CompressionFormat, Archive<Box<dyn Read + 'a>>)> {
    let (format, decoder) = compression::open_decoder(reader)?;
    debug!("Package compression: {}", format);
    Ok((format, Archive::new(decoder)))
}

/// Raw member name as stored in the header
pub fn member_name<R: Read>(entry: &Entry<'_, R>) -> String {
    String::from_utf8_lossy(&entry.path_bytes()).into_owned()
}

/// Archive positioned past its metadata members
pub struct PackageStream<'a, R: Read + 'a> {
    source: String,
    entries: Entries<'a, R>,
    pending: Option<Entry<'a, R>>,
    manifest: Vec<u8>,
    metadata_members: Vec<String>,
}

impl<'a, R: Read + 'a> PackageStream<'a, R> {
    /// Read the metadata members of `archive`
    ///
    /// `source` names the package in error messages. Fails with
    /// `MissingManifest` when no `+MANIFEST` member precedes the content.
    pub fn open(archive: &'a mut Archive<R>, source: &str) -> Result<Self> {
        let mut entries = archive
            .entries()
            .map_err(|e| Error::Archive(format!("{}: {}", source, e)))?;

        let mut manifest = None;
        let mut metadata_members = Vec::new();
        let mut pending = None;

        for entry in entries.by_ref() {
            let mut entry = entry.map_err(|e| Error::Archive(format!("{}: {}", source, e)))?;
            let name = member_name(&entry);
            let bare = name.strip_prefix("./").unwrap_or(&name);

            if !bare.starts_with(METADATA_MARKER) {
                pending = Some(entry);
                break;
            }

            trace!("Metadata member {}", bare);
            if bare == MANIFEST_MEMBER {
                let mut buf = Vec::new();
                entry
                    .read_to_end(&mut buf)
                    .map_err(|e| Error::Archive(format!("{}: {}: {}", source, bare, e)))?;
                manifest = Some(buf);
            }
            metadata_members.push(bare.to_string());
        }

        let manifest = manifest.ok_or_else(|| Error::MissingManifest(source.to_string()))?;

        Ok(Self {
            source: source.to_string(),
            entries,
            pending,
            manifest,
            metadata_members,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Bytes of the `+MANIFEST` member
    pub fn manifest_bytes(&self) -> &[u8] {
        &self.manifest
    }

    /// Names of all metadata members seen, in archive order
    pub fn metadata_members(&self) -> &[String] {
        &self.metadata_members
    }
}

impl<'a, R: Read + 'a> Iterator for PackageStream<'a, R> {
    type Item = Result<Entry<'a, R>>;

    /// Next content member
    fn next(&mut self) -> Option<Self::Item> {
        if let Some(entry) = self.pending.take() {
            return Some(Ok(entry));
        }
        let source = &self.source;
        self.entries
            .next()
            .map(|r| r.map_err(|e| Error::Archive(format!("{}: {}", source, e))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tar::{Builder, EntryType, Header};

    fn append(builder: &mut Builder<Vec<u8>>, name: &str, data: &[u8]) {
        let mut header = Header::new_gnu();
        header.set_entry_type(EntryType::Regular);
        header.set_size(data.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        builder.append_data(&mut header, name, data).unwrap();
    }

    fn package(members: &[(&str, &[u8])]) -> Vec<u8> {
        let mut builder = Builder::new(Vec::new());
        for (name, data) in members {
            append(&mut builder, name, data);
        }
        builder.into_inner().unwrap()
    }

    #[test]
    fn test_reads_manifest_and_holds_first_content_member() {
        let bytes = package(&[
            ("+COMPACT_MANIFEST", b"{}"),
            ("+MANIFEST", br#"{"name":"a"}"#),
            ("bin/a", b"A"),
            ("bin/b", b"B"),
        ]);
        let mut archive = Archive::new(bytes.as_slice());
        let stream = PackageStream::open(&mut archive, "a.txz").unwrap();

        assert_eq!(stream.manifest_bytes(), br#"{"name":"a"}"#);
        assert_eq!(
            stream.metadata_members(),
            &["+COMPACT_MANIFEST".to_string(), "+MANIFEST".to_string()]
        );

        let names: Vec<String> = stream.map(|e| member_name(&e.unwrap())).collect();
        assert_eq!(names, vec!["bin/a".to_string(), "bin/b".to_string()]);
    }

    #[test]
    fn test_missing_manifest() {
        let bytes = package(&[("+COMPACT_MANIFEST", b"{}"), ("bin/a", b"A")]);
        let mut archive = Archive::new(bytes.as_slice());
        assert!(matches!(
            PackageStream::open(&mut archive, "a.txz"),
            Err(Error::MissingManifest(ref s)) if s == "a.txz"
        ));
    }

    #[test]
    fn test_manifest_after_content_is_not_found() {
        let bytes = package(&[("bin/a", b"A"), ("+MANIFEST", b"{}")]);
        let mut archive = Archive::new(bytes.as_slice());
        assert!(PackageStream::open(&mut archive, "late").is_err());
    }

    #[test]
    fn test_metadata_only_package() {
        let bytes = package(&[("+MANIFEST", b"{}")]);
        let mut archive = Archive::new(bytes.as_slice());
        let mut stream = PackageStream::open(&mut archive, "meta").unwrap();
        assert!(stream.next().is_none());
    }

    #[test]
    fn test_open_archive_gzip() {
        use flate2::{Compression, write::GzEncoder};
        use std::io::Write;

        let tar_bytes = package(&[("+MANIFEST", b"{}"), ("bin/a", b"A")]);
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(&tar_bytes).unwrap();
        let compressed = encoder.finish().unwrap();

        let (format, mut archive) = open_archive(compressed.as_slice()).unwrap();
        assert_eq!(format, CompressionFormat::Gzip);
        let stream = PackageStream::open(&mut archive, "a.tgz").unwrap();
        assert_eq!(stream.count(), 1);
    }
}
