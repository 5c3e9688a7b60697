// tests/common/mod.rs

//! Shared helpers for integration tests: in-memory package archives, a
//! catalog that can be told to fail, and a script runner that writes into a
//! shared event log.

#![allow(dead_code)]

use pkgtools::catalog::{Catalog, FileRecord, MemoryCatalog, PackageRecord};
use pkgtools::container::{ConfinedRunner, ScriptExit, ScriptInvocation};
use pkgtools::filesystem::ExtractedEntry;
use pkgtools::scriptlet::ScriptTable;
use pkgtools::{Error, Result};
use serde_json::{Value, json};
use sha2::{Digest, Sha256};
use std::sync::{Arc, Mutex};
use tar::{Builder, EntryType, Header};

pub fn sha256_hex(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    format!("{:x}", hasher.finalize())
}

fn owner() -> (u64, u64) {
    (
        nix::unistd::geteuid().as_raw() as u64,
        nix::unistd::getegid().as_raw() as u64,
    )
}

enum Member {
    File { name: String, data: Vec<u8>, mode: u32 },
    Flagged { name: String, data: Vec<u8>, fflags: String },
    Dir { name: String },
    Symlink { name: String, target: String },
    HardLink { name: String, target: String },
}

/// Builds a package archive in memory
///
/// Files added with `file` are listed in the manifest with their real
/// digest; `file_with_hash` lists them with whatever hash is given.
pub struct PackageBuilder {
    manifest: Value,
    members: Vec<Member>,
}

impl PackageBuilder {
    pub fn new(name: &str, version: &str) -> Self {
        Self {
            manifest: json!({
                "name": name,
                "version": version,
                "files": {},
                "scripts": {},
            }),
            members: Vec::new(),
        }
    }

    pub fn prefix(mut self, prefix: &str) -> Self {
        self.manifest["prefix"] = json!(prefix);
        self
    }

    pub fn script(mut self, phase: &str, body: &str) -> Self {
        self.manifest["scripts"][phase] = json!(body);
        self
    }

    pub fn file(self, name: &str, data: &[u8]) -> Self {
        let hash = sha256_hex(data);
        self.file_with_hash(name, data, &hash)
    }

    pub fn file_with_hash(mut self, name: &str, data: &[u8], hash: &str) -> Self {
        self.manifest["files"][name] = json!(hash);
        self.members.push(Member::File {
            name: name.to_string(),
            data: data.to_vec(),
            mode: 0o644,
        });
        self
    }

    pub fn file_with_mode(mut self, name: &str, data: &[u8], mode: u32) -> Self {
        self.manifest["files"][name] = json!(sha256_hex(data));
        self.members.push(Member::File {
            name: name.to_string(),
            data: data.to_vec(),
            mode,
        });
        self
    }

    /// A file listed in the manifest under `key` but stored as `member`
    ///
    /// Member names starting with `/` or `./` are written into the header
    /// verbatim.
    pub fn file_as(mut self, member: &str, key: &str, data: &[u8]) -> Self {
        self.manifest["files"][key] = json!(sha256_hex(data));
        self.members.push(Member::File {
            name: member.to_string(),
            data: data.to_vec(),
            mode: 0o644,
        });
        self
    }

    /// A file carrying BSD flag mnemonics in a PAX extended header
    pub fn flagged_file(mut self, name: &str, data: &[u8], fflags: &str) -> Self {
        self.manifest["files"][name] = json!(sha256_hex(data));
        self.members.push(Member::Flagged {
            name: name.to_string(),
            data: data.to_vec(),
            fflags: fflags.to_string(),
        });
        self
    }

    /// A member present in the archive but not in the manifest
    pub fn unlisted_file(mut self, name: &str, data: &[u8]) -> Self {
        self.members.push(Member::File {
            name: name.to_string(),
            data: data.to_vec(),
            mode: 0o644,
        });
        self
    }

    pub fn dir(mut self, name: &str) -> Self {
        self.manifest["directories"][format!("{name}/")] = json!("y");
        self.members.push(Member::Dir {
            name: name.to_string(),
        });
        self
    }

    pub fn symlink(mut self, name: &str, target: &str) -> Self {
        let digest = sha256_hex(target.trim_start_matches('/').as_bytes());
        self.manifest["files"][name] = json!(digest);
        self.members.push(Member::Symlink {
            name: name.to_string(),
            target: target.to_string(),
        });
        self
    }

    pub fn hard_link(mut self, name: &str, target: &str) -> Self {
        self.manifest["files"][name] = json!("-");
        self.members.push(Member::HardLink {
            name: name.to_string(),
            target: target.to_string(),
        });
        self
    }

    pub fn delta(mut self, base_version: &str, removed_files: &[&str], removed_dirs: &[&str]) -> Self {
        self.manifest["delta-version"] = json!({"version": base_version, "style": "file"});
        self.manifest["removed-files"] = json!(removed_files);
        self.manifest["removed-directories"] = json!(removed_dirs);
        self
    }

    /// Override or add any manifest field
    pub fn manifest_field(mut self, key: &str, value: Value) -> Self {
        self.manifest[key] = value;
        self
    }

    pub fn build(self) -> Vec<u8> {
        let (uid, gid) = owner();
        let mut builder = Builder::new(Vec::new());

        let manifest = self.manifest.to_string();
        append(&mut builder, "+COMPACT_MANIFEST", b"{}", 0o644, uid, gid);
        append(&mut builder, "+MANIFEST", manifest.as_bytes(), 0o644, uid, gid);

        for member in &self.members {
            match member {
                Member::File { name, data, mode } => {
                    append(&mut builder, name, data, *mode, uid, gid);
                }
                Member::Flagged { name, data, fflags } => {
                    builder
                        .append_pax_extensions([("SCHILY.fflags", fflags.as_bytes())])
                        .unwrap();
                    append(&mut builder, name, data, 0o644, uid, gid);
                }
                Member::Dir { name } => {
                    let mut header = Header::new_gnu();
                    header.set_entry_type(EntryType::Directory);
                    header.set_size(0);
                    header.set_mode(0o755);
                    header.set_uid(uid);
                    header.set_gid(gid);
                    header.set_cksum();
                    builder
                        .append_data(&mut header, name, std::io::empty())
                        .unwrap();
                }
                Member::Symlink { name, target } => {
                    link(&mut builder, EntryType::Symlink, name, target, uid, gid);
                }
                Member::HardLink { name, target } => {
                    link(&mut builder, EntryType::Link, name, target, uid, gid);
                }
            }
        }
        builder.into_inner().unwrap()
    }
}

fn append(builder: &mut Builder<Vec<u8>>, name: &str, data: &[u8], mode: u32, uid: u64, gid: u64) {
    let mut header = Header::new_gnu();
    header.set_entry_type(EntryType::Regular);
    header.set_size(data.len() as u64);
    header.set_mode(mode);
    header.set_uid(uid);
    header.set_gid(gid);

    if name.starts_with('/') || name.starts_with("./") {
        // tar::Builder normalizes these spellings away
        header.as_old_mut().name[..name.len()].copy_from_slice(name.as_bytes());
        header.set_cksum();
        builder.append(&header, data).unwrap();
    } else {
        header.set_cksum();
        builder.append_data(&mut header, name, data).unwrap();
    }
}

fn link(
    builder: &mut Builder<Vec<u8>>,
    kind: EntryType,
    name: &str,
    target: &str,
    uid: u64,
    gid: u64,
) {
    let mut header = Header::new_gnu();
    header.set_entry_type(kind);
    header.set_size(0);
    header.set_mode(0o777);
    header.set_uid(uid);
    header.set_gid(gid);
    header.set_link_name(target).unwrap();
    builder
        .append_data(&mut header, name, std::io::empty())
        .unwrap();
}

/// Ordered record of what scripts and the catalog did
pub type EventLog = Arc<Mutex<Vec<String>>>;

pub fn new_log() -> EventLog {
    Arc::new(Mutex::new(Vec::new()))
}

pub fn events(log: &EventLog) -> Vec<String> {
    log.lock().unwrap().clone()
}

fn push(log: &EventLog, event: String) {
    log.lock().unwrap().push(event);
}

/// Runner that logs `script:<phase>[:<ARG>]:<body>` instead of running
pub struct LoggingRunner {
    pub log: EventLog,
}

impl ConfinedRunner for LoggingRunner {
    fn can_confine(&self) -> bool {
        true
    }

    fn run(&self, invocation: &ScriptInvocation) -> Result<ScriptExit> {
        let body = std::fs::read_to_string(&invocation.script_path).unwrap_or_default();
        let mut event = format!("script:{}", invocation.phase);
        if let Some(argument) = invocation.argument {
            event.push_str(&format!(":{}", argument));
        }
        event.push_str(&format!(":{}", body.trim()));
        push(&self.log, event);
        Ok(ScriptExit::Exited(0))
    }
}

/// In-memory catalog that logs mutating calls and can fail one of them
pub struct TestCatalog {
    pub inner: MemoryCatalog,
    pub log: EventLog,
    pub fail_on: Option<&'static str>,
}

impl TestCatalog {
    pub fn new(log: EventLog) -> Self {
        Self {
            inner: MemoryCatalog::new(),
            log,
            fail_on: None,
        }
    }

    fn call(&self, op: &'static str) -> Result<()> {
        push(&self.log, format!("catalog:{}", op));
        if self.fail_on == Some(op) {
            return Err(Error::Catalog(format!("{} failed", op)));
        }
        Ok(())
    }
}

impl Catalog for TestCatalog {
    fn find_package(&self, name: &str) -> Result<Option<PackageRecord>> {
        self.inner.find_package(name)
    }

    fn find_scripts(&self, name: &str) -> Result<Option<ScriptTable>> {
        self.inner.find_scripts(name)
    }

    fn add_package(&mut self, name: &str, version: &str, scripts: &ScriptTable) -> Result<()> {
        self.call("add_package")?;
        self.inner.add_package(name, version, scripts)
    }

    fn update_package(
        &mut self,
        name: &str,
        from: &str,
        to: &str,
        scripts: &ScriptTable,
    ) -> Result<()> {
        self.call("update_package")?;
        self.inner.update_package(name, from, to, scripts)
    }

    fn remove_package(&mut self, name: &str) -> Result<()> {
        self.call("remove_package")?;
        self.inner.remove_package(name)
    }

    fn remove_package_files(&mut self, name: &str) -> Result<()> {
        self.call("remove_package_files")?;
        self.inner.remove_package_files(name)
    }

    fn remove_package_directories(&mut self, name: &str) -> Result<()> {
        self.call("remove_package_directories")?;
        self.inner.remove_package_directories(name)
    }

    fn remove_package_scripts(&mut self, name: &str) -> Result<()> {
        self.call("remove_package_scripts")?;
        self.inner.remove_package_scripts(name)
    }

    fn remove_file_entry(&mut self, path: &str) -> Result<()> {
        self.call("remove_file_entry")?;
        self.inner.remove_file_entry(path)
    }

    fn add_files_bulk(&mut self, package: &str, entries: &[ExtractedEntry]) -> Result<()> {
        self.call("add_files_bulk")?;
        self.inner.add_files_bulk(package, entries)
    }

    fn list_packages(&self) -> Result<Vec<PackageRecord>> {
        self.inner.list_packages()
    }

    fn package_files(&self, name: &str) -> Result<Vec<FileRecord>> {
        self.inner.package_files(name)
    }
}
