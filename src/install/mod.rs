// src/install/mod.rs

//! Package installation
//!
//! One package file goes through a fixed sequence of states:
//!
//! ```text
//! Decoded -> OldPackageLookup -> ModeSelected -> ScriptsRun -> Extracted -> Cataloged -> Done
//! ```
//!
//! with `Failed` reachable from any of them. The mode decides which
//! lifecycle scripts run and what happens to the previous installation:
//!
//! - `Fresh`: nothing installed under this name
//! - `Delta`: the package patches a specific installed version in place,
//!   with upgrade scripts when both script tables are upgrade-aware and
//!   install scripts otherwise
//! - `UpgradeAware`: old and new scripts both handle upgrades, so the old
//!   package is replaced without being deinstalled
//! - `NonUpgradeFallback`: the old package is deinstalled first
//!
//! The package row is written before extraction starts. Nothing is rolled
//! back on failure: a failed install leaves whatever was already extracted
//! or recorded in place.

pub mod batch;

pub use batch::{BatchInstaller, PackageFile, PackageSource};

use crate::catalog::{Catalog, PackageRecord};
use crate::config::InstallerConfig;
use crate::container::ConfinedRunner;
use crate::error::{Error, Result};
use crate::filesystem::{ExtractedEntry, Extractor, path::join_separated, posix};
use crate::packages::{PackageDescriptor, PackageStream, decode, open_archive};
use crate::scriptlet::{PhaseArgument, ScriptOutcome, ScriptPhase, ScriptRunner, ScriptTable};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};
use strum_macros::Display;
use tracing::{debug, error, info, warn};

/// How a package relates to what is already installed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "kebab-case")]
pub enum InstallMode {
    Fresh,
    Delta,
    UpgradeAware,
    NonUpgradeFallback,
}

/// Progress of a single package install
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "kebab-case")]
pub enum InstallState {
    /// Manifest decoded, nothing touched yet
    Decoded,
    OldPackageLookup,
    ModeSelected,
    /// Previous package handled, package row written, pre-scripts done
    ScriptsRun,
    Extracted,
    Cataloged,
    Done,
    Failed,
}

/// Choose the install mode
///
/// A delta package is always installed as a delta; whether it fits the
/// installed version is checked separately by `check_delta_base`.
pub fn select_mode(
    installed: Option<&PackageRecord>,
    old_scripts: &ScriptTable,
    package: &PackageDescriptor,
) -> InstallMode {
    if package.is_delta() {
        return InstallMode::Delta;
    }
    match installed {
        None => InstallMode::Fresh,
        Some(_) if old_scripts.is_upgrade_aware() && package.scripts.is_upgrade_aware() => {
            InstallMode::UpgradeAware
        }
        Some(_) => InstallMode::NonUpgradeFallback,
    }
}

/// Verify that a delta package applies to the installed version
pub fn check_delta_base(
    installed: Option<&PackageRecord>,
    package: &PackageDescriptor,
) -> Result<()> {
    let Some(delta) = &package.delta else {
        return Ok(());
    };
    let installed_version = installed.map(|p| p.version.as_str());
    if installed_version == Some(delta.base_version.as_str()) {
        return Ok(());
    }

    let installed = installed_version.unwrap_or("(none)").to_string();
    error!(
        "Delta package {}->{} cannot upgrade current version {}",
        delta.base_version, package.version, installed
    );
    Err(Error::DeltaVersionMismatch {
        base: delta.base_version.clone(),
        target: package.version.clone(),
        installed,
    })
}

/// What an install did
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallReport {
    pub name: String,
    pub version: String,
    pub mode: InstallMode,
    /// Entries registered in the catalog, in archive order
    pub entries: Vec<ExtractedEntry>,
    /// Scripts that were present for a requested phase, in run order
    pub scripts: Vec<(ScriptPhase, ScriptOutcome)>,
}

/// Installs package files onto one destination root
pub struct Installer<'a, C: Catalog> {
    root: PathBuf,
    config: &'a InstallerConfig,
    catalog: C,
    runner: &'a dyn ConfinedRunner,
}

impl<'a, C: Catalog> Installer<'a, C> {
    pub fn new(
        root: impl Into<PathBuf>,
        config: &'a InstallerConfig,
        catalog: C,
        runner: &'a dyn ConfinedRunner,
    ) -> Self {
        Self {
            root: root.into(),
            config,
            catalog,
            runner,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn catalog(&self) -> &C {
        &self.catalog
    }

    pub fn into_catalog(self) -> C {
        self.catalog
    }

    /// Install the package file at `path`
    pub fn install_path(&mut self, path: &Path) -> Result<InstallReport> {
        let file = File::open(path)?;
        self.install_reader(BufReader::new(file), &path.display().to_string())
    }

    /// Install a package read from `reader`; `source` names it in messages
    pub fn install_reader<R: Read>(&mut self, reader: R, source: &str) -> Result<InstallReport> {
        let (_, mut archive) = open_archive(reader)?;
        let stream = PackageStream::open(&mut archive, source)?;
        let package = decode(stream.manifest_bytes(), self.config)?;

        let mut state = InstallState::Decoded;
        match self.install_decoded(&package, stream, &mut state) {
            Ok(report) => Ok(report),
            Err(e) => {
                error!(
                    "Installing {} failed after {}: {}",
                    package.display_name(),
                    state,
                    e
                );
                Err(e)
            }
        }
    }

    fn install_decoded<R: Read>(
        &mut self,
        package: &PackageDescriptor,
        stream: PackageStream<'_, R>,
        state: &mut InstallState,
    ) -> Result<InstallReport> {
        info!("{}", package.display_name());
        debug!("installation target = {}", self.root.display());

        advance(state, InstallState::OldPackageLookup);
        let installed = self.catalog.find_package(&package.name)?;
        let old_scripts = match &installed {
            Some(_) => self
                .catalog
                .find_scripts(&package.name)?
                .unwrap_or_default(),
            None => ScriptTable::new(),
        };

        let mode = select_mode(installed.as_ref(), &old_scripts, package);
        advance(state, InstallState::ModeSelected);
        info!("{}: install mode {}", package.name, mode);
        if mode == InstallMode::Delta {
            check_delta_base(installed.as_ref(), package)?;
        }

        // Deltas only get upgrade scripts when both sides speak upgrade
        let delta_upgrade_aware =
            old_scripts.is_upgrade_aware() && package.scripts.is_upgrade_aware();

        let runner = ScriptRunner::new(Some(self.root.as_path()), self.config, self.runner);
        let prefix = package.prefix.as_deref();
        let mut scripts = Vec::new();
        let mut run = |table: &ScriptTable, phase: ScriptPhase, argument: Option<PhaseArgument>| {
            match runner.run(table, phase, argument, prefix) {
                Ok(ScriptOutcome::NotPresent) => {}
                Ok(outcome) => scripts.push((phase, outcome)),
                Err(e) => error!("{} script for {} failed: {}", phase, package.name, e),
            }
        };

        match mode {
            InstallMode::Fresh => {
                self.catalog
                    .add_package(&package.name, &package.version, &package.scripts)?;
                run(&package.scripts, ScriptPhase::PreInstall, None);
                run(&package.scripts, ScriptPhase::Install, Some(PhaseArgument::PreInstall));
            }
            InstallMode::Delta => {
                if delta_upgrade_aware {
                    run(&old_scripts, ScriptPhase::PreUpgrade, None);
                    run(&old_scripts, ScriptPhase::Upgrade, Some(PhaseArgument::PreUpgrade));
                }
                remove_delta_paths(&mut self.catalog, &self.root, package)?;
                let base = package
                    .delta
                    .as_ref()
                    .map(|d| d.base_version.as_str())
                    .unwrap_or_default();
                self.catalog
                    .update_package(&package.name, base, &package.version, &package.scripts)?;
                debug!(
                    "Updated package {} from {} to {} in catalog",
                    package.name, base, package.version
                );
                if !delta_upgrade_aware {
                    run(&package.scripts, ScriptPhase::PreInstall, None);
                    run(&package.scripts, ScriptPhase::Install, Some(PhaseArgument::PreInstall));
                }
            }
            InstallMode::UpgradeAware => {
                run(&old_scripts, ScriptPhase::PreUpgrade, None);
                run(&old_scripts, ScriptPhase::Upgrade, Some(PhaseArgument::PreUpgrade));
                remove_catalog_records(&mut self.catalog, &package.name)?;
                self.catalog
                    .add_package(&package.name, &package.version, &package.scripts)?;
            }
            InstallMode::NonUpgradeFallback => {
                run(&old_scripts, ScriptPhase::PreDeinstall, None);
                run(&old_scripts, ScriptPhase::Deinstall, Some(PhaseArgument::Deinstall));
                remove_catalog_records(&mut self.catalog, &package.name)?;
                run(&old_scripts, ScriptPhase::PostDeinstall, None);
                run(&old_scripts, ScriptPhase::Install, Some(PhaseArgument::PostDeinstall));

                self.catalog
                    .add_package(&package.name, &package.version, &package.scripts)?;
                run(&package.scripts, ScriptPhase::PreInstall, None);
                run(&package.scripts, ScriptPhase::Install, Some(PhaseArgument::PreInstall));
            }
        }
        advance(state, InstallState::ScriptsRun);

        let root = self.root.to_string_lossy();
        let entries = Extractor::for_package(&root, package, self.config)
            .extract(stream)
            .collect::<Result<Vec<_>>>()?;
        advance(state, InstallState::Extracted);

        if !entries.is_empty() {
            self.catalog.add_files_bulk(&package.name, &entries)?;
        }
        advance(state, InstallState::Cataloged);

        let upgrade_scripts = match mode {
            InstallMode::UpgradeAware => true,
            InstallMode::Delta => delta_upgrade_aware,
            InstallMode::Fresh | InstallMode::NonUpgradeFallback => false,
        };
        if upgrade_scripts {
            run(&package.scripts, ScriptPhase::PostUpgrade, None);
            run(&package.scripts, ScriptPhase::Upgrade, Some(PhaseArgument::PostUpgrade));
        } else {
            run(&package.scripts, ScriptPhase::PostInstall, None);
            run(&package.scripts, ScriptPhase::Install, Some(PhaseArgument::PostInstall));
        }
        advance(state, InstallState::Done);

        Ok(InstallReport {
            name: package.name.clone(),
            version: package.version.clone(),
            mode,
            entries,
            scripts,
        })
    }
}

/// Remove every catalog trace of the installed package, leaving its
/// files on disk
fn remove_catalog_records<C: Catalog>(catalog: &mut C, name: &str) -> Result<()> {
    let removal_error = |what: &str, e: Error| {
        error!("Could not remove {} from package {}: {}", what, name, e);
        Error::CatalogRemoval {
            package: name.to_string(),
            what: what.to_string(),
        }
    };

    catalog
        .remove_package_files(name)
        .map_err(|e| removal_error("files", e))?;
    catalog
        .remove_package_directories(name)
        .map_err(|e| removal_error("directories", e))?;
    catalog
        .remove_package_scripts(name)
        .map_err(|e| removal_error("scripts", e))?;
    catalog
        .remove_package(name)
        .map_err(|e| removal_error("package record", e))?;
    Ok(())
}

/// Delete the paths a delta package drops, from disk and from the catalog
fn remove_delta_paths<C: Catalog>(
    catalog: &mut C,
    root: &Path,
    package: &PackageDescriptor,
) -> Result<()> {
    let root = root.to_string_lossy();

    for file in &package.removed_files {
        debug!("Deleting file {}", file);
        let full_path = join_separated(&root, file);
        if !posix::remove_file(Path::new(&full_path)) {
            warn!("Could not remove file {}", full_path);
        }
        catalog.remove_file_entry(file)?;
    }

    for dir in &package.removed_directories {
        debug!("Attempting to remove directory {}", dir);
        let full_path = join_separated(&root, dir);
        // Directories still holding other files stay
        posix::remove_directory(Path::new(&full_path));
        catalog.remove_file_entry(dir)?;
    }
    Ok(())
}

fn advance(state: &mut InstallState, next: InstallState) {
    debug!("install state {} -> {}", state, next);
    *state = next;
}
