// src/container/mod.rs

//! Confined subprocess execution for lifecycle scripts
//!
//! Scripts targeting a destination root run with that root as their
//! filesystem root (`chroot` + `chdir /` in the child before exec). The
//! `ConfinedRunner` trait is the seam: `ChrootRunner` does the real work,
//! `RecordingRunner` records invocations so installs can be exercised
//! without root.

use crate::error::{Error, Result};
use crate::scriptlet::{PhaseArgument, ScriptPhase};
use nix::sys::signal::{Signal, killpg};
use nix::unistd::Pid;
use std::ffi::CString;
use std::io::{BufRead, BufReader, Read};
use std::os::unix::ffi::OsStrExt;
use std::os::unix::process::CommandExt;
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};
use wait_timeout::ChildExt;

/// Everything needed to start one lifecycle script
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptInvocation {
    pub phase: ScriptPhase,
    pub argument: Option<PhaseArgument>,
    /// Shell interpreter (resolved inside the confined root)
    pub program: PathBuf,
    /// Shell arguments: optional `-x`, script path, optional phase argument
    pub args: Vec<String>,
    /// Host-side location of the transient script file
    pub script_path: PathBuf,
    /// Root to confine the child to
    pub root: Option<PathBuf>,
    pub env: Vec<(String, String)>,
    pub timeout: Option<Duration>,
}

/// How a script process ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptExit {
    /// Exit status; `-1` when killed by a signal
    Exited(i32),
    TimedOut,
}

/// Runs a script invocation as a child process and waits for it
pub trait ConfinedRunner {
    /// Whether this runner can confine a child to a different root
    fn can_confine(&self) -> bool;

    /// Run the invocation to completion
    fn run(&self, invocation: &ScriptInvocation) -> Result<ScriptExit>;
}

/// Real runner: spawns the shell, chrooted when a root is given
#[derive(Debug, Default, Clone, Copy)]
pub struct ChrootRunner;

impl ChrootRunner {
    pub fn new() -> Self {
        Self
    }
}

fn drain<R: Read + Send + 'static>(
    stream: Option<R>,
    phase: ScriptPhase,
    is_stderr: bool,
) -> Option<JoinHandle<()>> {
    let stream = stream?;
    Some(std::thread::spawn(move || {
        for line in BufReader::new(stream).lines().map_while(|l| l.ok()) {
            if is_stderr {
                warn!("[{}] {}", phase, line);
            } else {
                info!("[{}] {}", phase, line);
            }
        }
    }))
}

/// How long output readers may outlive the script before they are left behind
const DRAIN_GRACE: Duration = Duration::from_secs(2);

/// Join the output readers, giving up on any still blocked at the deadline
///
/// A reader stays blocked while some process that escaped the script's
/// process group still holds the pipe open.
fn join_drains(handles: [Option<JoinHandle<()>>; 2], grace: Duration) {
    let deadline = Instant::now() + grace;
    for handle in handles.into_iter().flatten() {
        while !handle.is_finished() && Instant::now() < deadline {
            std::thread::sleep(Duration::from_millis(10));
        }
        if handle.is_finished() {
            let _ = handle.join();
        } else {
            warn!("Script output is still open after the script ended, not waiting for it");
        }
    }
}

impl ConfinedRunner for ChrootRunner {
    fn can_confine(&self) -> bool {
        nix::unistd::geteuid().is_root()
    }

    fn run(&self, invocation: &ScriptInvocation) -> Result<ScriptExit> {
        let mut cmd = Command::new(&invocation.program);
        cmd.args(&invocation.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        for (key, value) in &invocation.env {
            cmd.env(key, value);
        }

        // Own process group, so a timeout takes down everything the script
        // started
        cmd.process_group(0);

        if let Some(root) = &invocation.root {
            let root_cstr = CString::new(root.as_os_str().as_bytes())
                .map_err(|e| Error::ScriptletError(format!("Invalid root path: {}", e)))?;
            // SAFETY: only async-signal-safe libc calls run between fork and exec
            unsafe {
                cmd.pre_exec(move || {
                    if libc::chroot(root_cstr.as_ptr()) != 0 {
                        return Err(std::io::Error::last_os_error());
                    }
                    if libc::chdir(c"/".as_ptr()) != 0 {
                        return Err(std::io::Error::last_os_error());
                    }
                    Ok(())
                });
            }
        }

        let mut child = cmd.spawn().map_err(|e| {
            Error::ScriptletError(format!(
                "Failed to spawn {} script: {}",
                invocation.phase, e
            ))
        })?;
        debug!("Spawned {} script as pid {}", invocation.phase, child.id());

        let readers = [
            drain(child.stdout.take(), invocation.phase, false),
            drain(child.stderr.take(), invocation.phase, true),
        ];

        let status = match invocation.timeout {
            Some(timeout) => child.wait_timeout(timeout)?,
            None => Some(child.wait()?),
        };

        let exit = match status {
            Some(status) => ScriptExit::Exited(status.code().unwrap_or(-1)),
            None => {
                if let Err(e) = killpg(Pid::from_raw(child.id() as i32), Signal::SIGKILL) {
                    warn!("Could not kill {} script process group: {}", invocation.phase, e);
                    let _ = child.kill();
                }
                let _ = child.wait();
                ScriptExit::TimedOut
            }
        };

        join_drains(readers, DRAIN_GRACE);

        Ok(exit)
    }
}

/// An invocation captured by `RecordingRunner`, with the script body as it
/// was on disk when the run started
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedScript {
    pub invocation: ScriptInvocation,
    pub body: Option<String>,
}

/// Test double that records invocations instead of running them
#[derive(Debug, Clone)]
pub struct RecordingRunner {
    confine: bool,
    exit: ScriptExit,
    fail: bool,
    calls: Arc<Mutex<Vec<RecordedScript>>>,
}

impl Default for RecordingRunner {
    fn default() -> Self {
        Self {
            confine: true,
            exit: ScriptExit::Exited(0),
            fail: false,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

impl RecordingRunner {
    /// A runner that reports it can confine and every script exits 0
    pub fn new() -> Self {
        Self::default()
    }

    /// A runner that reports it cannot confine
    pub fn unprivileged() -> Self {
        Self {
            confine: false,
            ..Self::default()
        }
    }

    /// Report this exit for every run
    pub fn with_exit(mut self, exit: ScriptExit) -> Self {
        self.exit = exit;
        self
    }

    /// Fail every run as if the process could not be spawned
    pub fn failing(mut self) -> Self {
        self.fail = true;
        self
    }

    /// Invocations recorded so far, in order
    pub fn invocations(&self) -> Vec<RecordedScript> {
        self.calls
            .lock()
            .map(|calls| calls.clone())
            .unwrap_or_default()
    }

    /// Phases recorded so far with their arguments, in order
    pub fn phases(&self) -> Vec<(ScriptPhase, Option<PhaseArgument>)> {
        self.invocations()
            .iter()
            .map(|c| (c.invocation.phase, c.invocation.argument))
            .collect()
    }

    /// Bodies of the scripts run so far, in order
    pub fn bodies(&self) -> Vec<String> {
        self.invocations()
            .into_iter()
            .filter_map(|c| c.body)
            .collect()
    }
}

impl ConfinedRunner for RecordingRunner {
    fn can_confine(&self) -> bool {
        self.confine
    }

    fn run(&self, invocation: &ScriptInvocation) -> Result<ScriptExit> {
        let body = std::fs::read_to_string(&invocation.script_path).ok();
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(RecordedScript {
                invocation: invocation.clone(),
                body,
            });
        }

        if self.fail {
            return Err(Error::ScriptletError(format!(
                "Failed to spawn {} script: recording runner set to fail",
                invocation.phase
            )));
        }
        Ok(self.exit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn invocation(dir: &TempDir, body: &str) -> ScriptInvocation {
        let script_path = dir.path().join("script");
        std::fs::write(&script_path, body).unwrap();
        ScriptInvocation {
            phase: ScriptPhase::PostInstall,
            argument: Some(PhaseArgument::PostInstall),
            program: PathBuf::from("/bin/sh"),
            args: vec![
                script_path.to_string_lossy().into_owned(),
                "POST-INSTALL".to_string(),
            ],
            script_path,
            root: None,
            env: vec![("PKG_PREFIX".to_string(), "/usr/local".to_string())],
            timeout: Some(Duration::from_secs(10)),
        }
    }

    #[test]
    fn test_chroot_runner_unconfined_exit_code() {
        let temp = TempDir::new().unwrap();
        let inv = invocation(&temp, "exit 7\n");
        assert_eq!(ChrootRunner::new().run(&inv).unwrap(), ScriptExit::Exited(7));
    }

    #[test]
    fn test_chroot_runner_passes_argument_env_and_cwd() {
        let temp = TempDir::new().unwrap();
        let out_path = temp.path().join("out.txt");
        let body = format!("echo \"$1 $PKG_PREFIX\" > {}\n", out_path.display());
        let inv = invocation(&temp, &body);
        assert_eq!(ChrootRunner::new().run(&inv).unwrap(), ScriptExit::Exited(0));

        let out = std::fs::read_to_string(&out_path).unwrap();
        assert_eq!(out.trim(), "POST-INSTALL /usr/local");
    }

    #[test]
    fn test_chroot_runner_timeout() {
        let temp = TempDir::new().unwrap();
        let mut inv = invocation(&temp, "exec sleep 5\n");
        inv.timeout = Some(Duration::from_millis(100));
        assert_eq!(ChrootRunner::new().run(&inv).unwrap(), ScriptExit::TimedOut);
    }

    #[test]
    fn test_chroot_runner_timeout_kills_grandchildren() {
        let temp = TempDir::new().unwrap();
        // The shell forks sleep instead of exec'ing it; the grandchild holds
        // the output pipes
        let mut inv = invocation(&temp, "sleep 6\necho done\n");
        inv.timeout = Some(Duration::from_millis(200));

        let started = Instant::now();
        assert_eq!(ChrootRunner::new().run(&inv).unwrap(), ScriptExit::TimedOut);
        assert!(started.elapsed() < Duration::from_secs(4), "took {:?}", started.elapsed());
    }

    #[test]
    fn test_chroot_runner_does_not_wait_on_escaped_output() {
        let temp = TempDir::new().unwrap();
        // A background child in its own session outlives the script and keeps
        // stdout open
        let inv = invocation(&temp, "setsid sleep 6 &\nexit 0\n");

        let started = Instant::now();
        assert_eq!(ChrootRunner::new().run(&inv).unwrap(), ScriptExit::Exited(0));
        assert!(started.elapsed() < Duration::from_secs(5), "took {:?}", started.elapsed());
    }

    #[test]
    fn test_chroot_runner_missing_shell() {
        let temp = TempDir::new().unwrap();
        let mut inv = invocation(&temp, "true\n");
        inv.program = PathBuf::from("/nonexistent/shell");
        assert!(matches!(
            ChrootRunner::new().run(&inv),
            Err(Error::ScriptletError(_))
        ));
    }

    #[test]
    fn test_recording_runner_captures_body() {
        let temp = TempDir::new().unwrap();
        let inv = invocation(&temp, "echo recorded\n");
        let runner = RecordingRunner::new();
        let handle = runner.clone();

        runner.run(&inv).unwrap();

        assert_eq!(handle.bodies(), vec!["echo recorded\n".to_string()]);
        assert_eq!(
            handle.phases(),
            vec![(ScriptPhase::PostInstall, Some(PhaseArgument::PostInstall))]
        );
    }
}
