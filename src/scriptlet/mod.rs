// src/scriptlet/mod.rs

//! Lifecycle script execution for package install/upgrade/deinstall hooks
//!
//! Packages carry shell scripts keyed by phase (`pre-install`, `upgrade`,
//! ...). A script is written to a transient `<pid>-<phase>` file inside the
//! destination root and run there with the shell, confined to the root when
//! one is given. Key properties:
//!
//! - A missing phase is a silent no-op
//! - The phase argument token (`PRE-INSTALL`, ...) is appended when supplied
//! - The transient file is removed on every exit path
//! - A nonzero exit status is logged, never returned as an error
//! - Unprivileged runs against a destination root follow the configured
//!   `UnprivilegedScripts` policy

use crate::config::{InstallerConfig, UnprivilegedScripts};
use crate::container::{ConfinedRunner, ScriptExit, ScriptInvocation};
use crate::error::{Error, Result};
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::Write;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use strum_macros::{AsRefStr, Display, EnumIter, EnumString};
use tracing::{debug, error, info, warn};

/// Lifecycle phase keys recognized in a manifest's `scripts` table
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Display, EnumString, AsRefStr, EnumIter,
)]
#[strum(serialize_all = "kebab-case")]
pub enum ScriptPhase {
    PreInstall,
    Install,
    PostInstall,
    PreDeinstall,
    Deinstall,
    PostDeinstall,
    PreUpgrade,
    Upgrade,
    PostUpgrade,
    PreDelta,
    PostDelta,
}

impl ScriptPhase {
    /// Phases whose presence makes a package upgrade-aware
    pub const UPGRADE_PHASES: [ScriptPhase; 3] =
        [Self::PreUpgrade, Self::Upgrade, Self::PostUpgrade];
}

/// Argument token passed to the combined `install`/`deinstall`/`upgrade`
/// scripts so they know which step they are running for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, AsRefStr)]
pub enum PhaseArgument {
    #[strum(serialize = "PRE-INSTALL")]
    PreInstall,
    #[strum(serialize = "POST-INSTALL")]
    PostInstall,
    #[strum(serialize = "DEINSTALL")]
    Deinstall,
    #[strum(serialize = "POST-DEINSTALL")]
    PostDeinstall,
    #[strum(serialize = "PRE-UPGRADE")]
    PreUpgrade,
    #[strum(serialize = "POST-UPGRADE")]
    PostUpgrade,
}

/// Script bodies keyed by phase
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScriptTable {
    scripts: BTreeMap<ScriptPhase, String>,
}

impl ScriptTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a table from raw manifest keys, dropping keys that are not
    /// lifecycle phases
    pub fn from_raw<I, K, V>(raw: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut table = Self::new();
        for (key, body) in raw {
            match ScriptPhase::from_str(key.as_ref()) {
                Ok(phase) => {
                    table.insert(phase, body);
                }
                Err(_) => warn!("Ignoring unknown script key {}", key.as_ref()),
            }
        }
        table
    }

    pub fn insert(&mut self, phase: ScriptPhase, body: impl Into<String>) -> &mut Self {
        self.scripts.insert(phase, body.into());
        self
    }

    pub fn get(&self, phase: ScriptPhase) -> Option<&str> {
        self.scripts.get(&phase).map(String::as_str)
    }

    pub fn contains(&self, phase: ScriptPhase) -> bool {
        self.scripts.contains_key(&phase)
    }

    pub fn is_empty(&self) -> bool {
        self.scripts.is_empty()
    }

    pub fn len(&self) -> usize {
        self.scripts.len()
    }

    /// Whether any of pre-upgrade, upgrade or post-upgrade is present
    pub fn is_upgrade_aware(&self) -> bool {
        ScriptPhase::UPGRADE_PHASES.iter().any(|p| self.contains(*p))
    }

    pub fn iter(&self) -> impl Iterator<Item = (ScriptPhase, &str)> {
        self.scripts.iter().map(|(p, body)| (*p, body.as_str()))
    }
}

impl FromIterator<(ScriptPhase, String)> for ScriptTable {
    fn from_iter<T: IntoIterator<Item = (ScriptPhase, String)>>(iter: T) -> Self {
        Self {
            scripts: iter.into_iter().collect(),
        }
    }
}

/// What happened when a phase was requested
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptOutcome {
    /// The table has no script for the phase
    NotPresent,
    /// The script exists but was not run (unprivileged against a root)
    Skipped,
    /// The script ran and exited with this status
    Exited(i32),
    /// The script was killed after the configured timeout
    TimedOut,
}

/// Transient script file, removed when dropped
struct TransientScript {
    path: PathBuf,
}

impl TransientScript {
    fn create(path: PathBuf, body: &str) -> Result<Self> {
        let mut file = File::create(&path).map_err(|e| {
            Error::ScriptletError(format!("Cannot write script {}: {}", path.display(), e))
        })?;
        // From here on the guard owns cleanup
        let guard = Self { path };
        file.write_all(body.as_bytes())?;

        let mut perms = file.metadata()?.permissions();
        perms.set_mode(0o700);
        fs::set_permissions(&guard.path, perms)?;

        Ok(guard)
    }
}

impl Drop for TransientScript {
    fn drop(&mut self) {
        if let Err(e) = fs::remove_file(&self.path) {
            warn!("Could not remove script {}: {}", self.path.display(), e);
        }
    }
}

/// Runs lifecycle scripts for one destination root
pub struct ScriptRunner<'a> {
    /// `None` for the running system's own root
    root: Option<PathBuf>,
    config: &'a InstallerConfig,
    runner: &'a dyn ConfinedRunner,
}

impl<'a> ScriptRunner<'a> {
    /// Create a runner for `root`; `None`, an empty path or `/` mean the
    /// running system's own root
    pub fn new(
        root: Option<&Path>,
        config: &'a InstallerConfig,
        runner: &'a dyn ConfinedRunner,
    ) -> Self {
        let root = root
            .filter(|r| !r.as_os_str().is_empty() && *r != Path::new("/"))
            .map(Path::to_path_buf);
        Self {
            root,
            config,
            runner,
        }
    }

    pub fn root(&self) -> Option<&Path> {
        self.root.as_deref()
    }

    /// Run the script for `phase` from `table`, if there is one
    pub fn run(
        &self,
        table: &ScriptTable,
        phase: ScriptPhase,
        argument: Option<PhaseArgument>,
        prefix: Option<&str>,
    ) -> Result<ScriptOutcome> {
        let Some(body) = table.get(phase) else {
            debug!("No {} script to run", phase);
            return Ok(ScriptOutcome::NotPresent);
        };

        let script_name = format!("{}-{}", std::process::id(), phase);

        let (host_dir, confine_to) = match &self.root {
            None => (std::env::temp_dir(), None),
            Some(root) if self.runner.can_confine() => (root.clone(), Some(root.clone())),
            Some(root) => {
                error!(
                    "Installation root is set, and process is not root. Cannot run script {}",
                    phase
                );
                if self.config.unprivileged_scripts == UnprivilegedScripts::LogAndContinue {
                    // Never executed: the host is not the destination root
                    let script = TransientScript::create(root.join(&script_name), body)?;
                    debug!("Not executing {}", script.path.display());
                }
                return Ok(ScriptOutcome::Skipped);
            }
        };

        let script = TransientScript::create(host_dir.join(&script_name), body)?;

        // Confined runs see the script at the root of their filesystem
        let script_arg = if confine_to.is_some() {
            format!("/{script_name}")
        } else {
            script.path.to_string_lossy().into_owned()
        };

        let mut args = Vec::with_capacity(3);
        if self.config.trace_scripts {
            args.push("-x".to_string());
        }
        args.push(script_arg);
        if let Some(argument) = argument {
            args.push(argument.to_string());
        }

        let mut env = Vec::new();
        if let Some(prefix) = prefix {
            env.push(("PKG_PREFIX".to_string(), prefix.to_string()));
        }

        let invocation = ScriptInvocation {
            phase,
            argument,
            program: self.config.shell.clone(),
            args,
            script_path: script.path.clone(),
            root: confine_to,
            env,
            timeout: self.config.script_timeout(),
        };

        info!(
            "script (chroot to {}): {} {:?}",
            invocation
                .root
                .as_deref()
                .unwrap_or(Path::new("/"))
                .display(),
            invocation.program.display(),
            invocation.args
        );
        debug!("{}", body);

        let outcome = match self.runner.run(&invocation)? {
            ScriptExit::Exited(0) => {
                info!("{} script completed successfully", phase);
                ScriptOutcome::Exited(0)
            }
            ScriptExit::Exited(code) => {
                error!("{} script exited with status {}", phase, code);
                ScriptOutcome::Exited(code)
            }
            ScriptExit::TimedOut => {
                error!(
                    "{} script timed out after {} seconds",
                    phase, self.config.script_timeout_secs
                );
                ScriptOutcome::TimedOut
            }
        };

        drop(script);
        Ok(outcome)
    }
}
