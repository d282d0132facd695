//! Engine process launching and lifecycle.
//!
//! [`EngineProcess::spawn`] starts the engine with its stdin and stdout
//! connected to pipes, hands the parent's ends back as a [`PipeTransport`],
//! and starts a watcher thread that reports the process's exit.

mod status;
mod watcher;

use std::ffi::OsStr;
use std::io;
use std::process::{Child, Command, Stdio};
use std::sync::mpsc::Receiver;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use crate::config::{EngineConfig, StderrMode};
use crate::error::{EngineError, Result};
use crate::transport::PipeTransport;

pub use status::{EngineState, StatusCell};
pub use watcher::{ExitNotifier, Termination};

use watcher::Watcher;

/// Poll interval while waiting for a process to exit on its own
const EXIT_POLL_MS: u64 = 5;

/// A running engine child process.
///
/// Dropping it kills the process (if still alive) and joins the watcher.
pub struct EngineProcess {
    pid: u32,
    program: String,
    child: Arc<Mutex<Child>>,
    status: StatusCell,
    notifier: ExitNotifier,
    watcher: Option<Watcher>,
}

impl EngineProcess {
    /// Spawn `program` with `args`, returning the process and the parent's
    /// ends of its stdin/stdout pipes.
    pub fn spawn<S: AsRef<OsStr>>(
        program: impl AsRef<OsStr>,
        args: &[S],
        config: &EngineConfig,
    ) -> Result<(Self, PipeTransport)> {
        let program_name = program.as_ref().to_string_lossy().into_owned();
        let launch_failed = |source: io::Error| EngineError::LaunchFailed {
            program: program_name.clone(),
            source,
        };

        let stderr = match config.stderr {
            StderrMode::Inherit => Stdio::inherit(),
            StderrMode::Null => Stdio::null(),
        };

        let mut child = Command::new(program.as_ref())
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(stderr)
            .spawn()
            .map_err(launch_failed)?;

        let pid = child.id();
        let pipes = match (child.stdin.take(), child.stdout.take()) {
            (Some(stdin), Some(stdout)) => PipeTransport::new(stdin, stdout),
            _ => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(launch_failed(io::Error::new(
                    io::ErrorKind::BrokenPipe,
                    "engine pipes were not created",
                )));
            }
        };

        let child = Arc::new(Mutex::new(child));
        let status = StatusCell::running();
        let notifier = ExitNotifier::new();

        let watcher = Watcher::spawn(
            pid,
            Arc::clone(&child),
            status.clone(),
            notifier.clone(),
            config.watch_interval,
        );
        let watcher = match watcher {
            Ok(watcher) => watcher,
            Err(e) => {
                let mut child = child.lock();
                let _ = child.kill();
                let _ = child.wait();
                return Err(launch_failed(e));
            }
        };

        engine_info!("Launched engine '{program_name}' as pid {pid}");

        Ok((
            EngineProcess {
                pid,
                program: program_name,
                child,
                status,
                notifier,
                watcher: Some(watcher),
            },
            pipes,
        ))
    }

    /// OS process id.
    #[must_use]
    pub fn pid(&self) -> u32 {
        self.pid
    }

    /// Program path as given to `spawn`.
    #[must_use]
    pub fn program(&self) -> &str {
        &self.program
    }

    /// Shared lifecycle cell, updated by the watcher on exit.
    #[must_use]
    pub fn status(&self) -> &StatusCell {
        &self.status
    }

    /// Publisher of the termination event.
    #[must_use]
    pub fn notifier(&self) -> &ExitNotifier {
        &self.notifier
    }

    #[must_use]
    pub fn subscribe_termination(&self) -> Receiver<Termination> {
        self.notifier.subscribe()
    }

    /// Forcibly terminate and reap the process. No-op once terminated.
    pub fn kill(&self) {
        if self.status.is_terminated() {
            return;
        }
        let mut child = self.child.lock();
        if let Ok(Some(_)) = child.try_wait() {
            // Exited on its own; the watcher publishes the event.
            self.status.terminate();
            return;
        }
        engine_warn!("Killing engine process {}", self.pid);
        if let Err(e) = child.kill() {
            engine_debug!("kill({}) failed: {e}", self.pid);
        }
        if let Err(e) = child.wait() {
            engine_debug!("wait({}) failed: {e}", self.pid);
        }
        self.status.terminate();
    }

    /// Wait up to `timeout` for the process to exit on its own.
    ///
    /// Returns true if it has exited.
    pub fn wait_for_exit(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        loop {
            if self.status.is_terminated() {
                return true;
            }
            if let Ok(Some(_)) = self.child.lock().try_wait() {
                return true;
            }
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            thread::sleep((deadline - now).min(Duration::from_millis(EXIT_POLL_MS)));
        }
    }
}

impl Drop for EngineProcess {
    fn drop(&mut self) {
        self.kill();
        if let Some(mut watcher) = self.watcher.take() {
            watcher.stop();
        }
    }
}

impl std::fmt::Debug for EngineProcess {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EngineProcess")
            .field("pid", &self.pid)
            .field("program", &self.program)
            .field("state", &self.status.get())
            .finish()
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn sh(script: &str) -> Result<(EngineProcess, PipeTransport)> {
        EngineProcess::spawn("/bin/sh", &["-c", script], &EngineConfig::default())
    }

    #[test]
    fn test_spawn_missing_program_fails() {
        let err = EngineProcess::spawn(
            "/definitely/not/an/engine",
            &[] as &[&str],
            &EngineConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(err, EngineError::LaunchFailed { .. }));
        assert!(err.os_error().is_some());
    }

    #[test]
    fn test_watcher_reports_exit() {
        let (process, _pipes) = sh("exit 3").unwrap();
        let rx = process.subscribe_termination();

        let event = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(event.pid, process.pid());
        assert_eq!(event.code(), Some(3));
        assert!(process.status().is_terminated());
    }

    #[test]
    fn test_kill_is_idempotent() {
        let (process, _pipes) = sh("sleep 30").unwrap();
        assert_eq!(process.status().get(), EngineState::Running);

        process.kill();
        assert!(process.status().is_terminated());
        process.kill();

        let rx = process.subscribe_termination();
        let event = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(event.signal(), Some(libc::SIGKILL));
    }

    #[test]
    fn test_wait_for_exit_times_out_for_live_process() {
        let (process, _pipes) = sh("sleep 30").unwrap();
        assert!(!process.wait_for_exit(Duration::from_millis(30)));
        process.kill();
        assert!(process.wait_for_exit(Duration::from_millis(30)));
    }
}
