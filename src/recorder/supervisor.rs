use std::io;
use std::path::{Path, PathBuf};
use std::process::{Child, Command};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc as std_mpsc;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use super::error::RecorderError;
use super::exit::exit_code;
use super::locate::RecorderLocator;
use super::process::{
    signal_pid, staged_shutdown, ProcessControl, ShutdownOutcome, ShutdownPolicy, Signal,
};

const DEFAULT_PYTHON: &str = "python3";

/// Reported by the watcher thread once the recorder process has exited.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecorderExit {
    pub rec_id: String,
    /// Exit code, or the negated signal number when killed by a signal
    pub code: Option<i32>,
}

/// Launches the recorder and watches it until it exits.
pub struct RecorderSupervisor {
    locator: RecorderLocator,
    interpreter: Option<PathBuf>,
    exits: mpsc::UnboundedSender<RecorderExit>,
}

impl RecorderSupervisor {
    pub fn new(
        locator: RecorderLocator,
        interpreter: Option<PathBuf>,
        exits: mpsc::UnboundedSender<RecorderExit>,
    ) -> Self {
        Self {
            locator,
            interpreter,
            exits,
        }
    }

    /// Launch the recorder for one session.
    ///
    /// The returned handle controls the process; its exit is posted on the
    /// channel given to [`RecorderSupervisor::new`].
    pub fn start(
        &self,
        rec_id: &str,
        task_text: &str,
        operator: Option<&str>,
    ) -> Result<RecorderHandle, RecorderError> {
        let script = self.locator.locate()?;
        let mut command = self.command_for(&script);
        command.args(["--rec-id", rec_id, "--task", task_text]);
        if let Some(name) = operator {
            command.args(["--operator", name]);
        }
        detach_signals(&mut command);

        info!("Launching recorder {} for {}", script.display(), rec_id);

        #[cfg(target_os = "macos")]
        info!(
            "If recording fails to start on macOS, check System Settings → Privacy & Security → \
             Screen Recording, Input Monitoring and Accessibility for your terminal"
        );

        let child = command
            .spawn()
            .map_err(|source| RecorderError::LaunchFailed {
                program: script.clone(),
                source,
            })?;

        let handle = RecorderHandle {
            rec_id: rec_id.to_string(),
            pid: child.id(),
            exited: Arc::new(AtomicBool::new(false)),
        };

        if let Err((child, source)) = self.watch(child, &handle) {
            error!("Failed to watch recorder {}: {}", rec_id, source);
            discard(child);
            return Err(RecorderError::LaunchFailed {
                program: script,
                source,
            });
        }

        Ok(handle)
    }

    fn command_for(&self, script: &Path) -> Command {
        let is_python = script
            .extension()
            .map(|ext| ext.eq_ignore_ascii_case("py"))
            .unwrap_or(false);

        match (&self.interpreter, is_python) {
            (Some(interpreter), _) => {
                let mut command = Command::new(interpreter);
                command.arg(script);
                command
            }
            (None, true) => {
                let mut command = Command::new(DEFAULT_PYTHON);
                command.arg(script);
                command
            }
            (None, false) => Command::new(script),
        }
    }

    /// Spawn the single watcher thread of a session.
    ///
    /// The child is handed over only once the thread is running; on failure
    /// it is given back to the caller.
    fn watch(&self, child: Child, handle: &RecorderHandle) -> Result<(), (Child, io::Error)> {
        let rec_id = handle.rec_id.clone();
        let exited = Arc::clone(&handle.exited);
        let exits = self.exits.clone();
        let (child_tx, child_rx) = std_mpsc::channel::<Child>();

        let spawned = std::thread::Builder::new()
            .name(format!("recorder-watch-{}", rec_id))
            .spawn(move || {
                let Ok(mut child) = child_rx.recv() else {
                    return;
                };
                let code = match child.wait() {
                    Ok(status) => exit_code(status),
                    Err(e) => {
                        error!("Failed to wait for recorder {}: {}", rec_id, e);
                        None
                    }
                };
                exited.store(true, Ordering::SeqCst);
                debug!("Recorder {} exited with {:?}", rec_id, code);

                if exits.send(RecorderExit { rec_id, code }).is_err() {
                    debug!("Exit receiver dropped, nobody to notify");
                }
            });

        if let Err(e) = spawned {
            return Err((child, e));
        }
        child_tx.send(child).map_err(|std_mpsc::SendError(child)| {
            (
                child,
                io::Error::new(io::ErrorKind::Other, "recorder watcher exited early"),
            )
        })
    }
}

/// Kill and reap a recorder nobody is watching.
fn discard(mut child: Child) -> Option<i32> {
    if let Err(e) = child.kill() {
        warn!("Failed to kill unwatched recorder {}: {}", child.id(), e);
    }
    match child.wait() {
        Ok(status) => exit_code(status),
        Err(e) => {
            warn!("Failed to reap unwatched recorder {}: {}", child.id(), e);
            None
        }
    }
}

/// Run the recorder in its own process group with default SIGINT/SIGTERM
/// dispositions, even if this process was started with them ignored.
#[cfg(unix)]
fn detach_signals(command: &mut Command) {
    use std::os::unix::process::CommandExt;

    command.process_group(0);
    // SAFETY: signal(2) is async-signal-safe and touches no parent state.
    unsafe {
        command.pre_exec(|| {
            libc::signal(libc::SIGINT, libc::SIG_DFL);
            libc::signal(libc::SIGTERM, libc::SIG_DFL);
            Ok(())
        });
    }
}

#[cfg(not(unix))]
fn detach_signals(_command: &mut Command) {}

/// Control side of a running recorder.
///
/// Cloning is cheap; the watcher thread owns the process itself.
#[derive(Debug, Clone)]
pub struct RecorderHandle {
    rec_id: String,
    pid: u32,
    exited: Arc<AtomicBool>,
}

impl RecorderHandle {
    pub fn rec_id(&self) -> &str {
        &self.rec_id
    }

    pub fn pid(&self) -> u32 {
        self.pid
    }

    /// Staged shutdown of the recorder; blocks for at most two grace periods.
    pub fn request_stop(&self, policy: &ShutdownPolicy) -> ShutdownOutcome {
        info!("Stopping recorder {} (pid {})", self.rec_id, self.pid);
        staged_shutdown(self, policy)
    }
}

impl ProcessControl for RecorderHandle {
    fn is_alive(&self) -> bool {
        !self.exited.load(Ordering::SeqCst)
    }

    fn send_signal(&self, signal: Signal) -> io::Result<()> {
        // Once reaped the pid may belong to another process
        if !self.is_alive() {
            return Ok(());
        }
        signal_pid(self.pid, signal)
    }
}
