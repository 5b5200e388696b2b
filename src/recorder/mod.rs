//! External recorder process supervision
//!
//! The recorder is an opaque program that captures the operator's screen and
//! input. This module provides:
//! - Locating the recorder executable
//! - Launching it with the recording id, task text and operator name
//! - A watcher thread that reports the natural exit of the process
//! - Staged shutdown (interrupt → terminate → kill) with bounded waits
//! - Exit code classification for operator-facing error reporting

mod error;
mod exit;
mod locate;
mod process;
mod supervisor;

pub use error::RecorderError;
pub use exit::{exit_code, ExitCodePolicy, ExitOutcome};
pub use locate::{RecorderLocator, DEFAULT_CANDIDATES};
pub use process::{staged_shutdown, ProcessControl, ShutdownOutcome, ShutdownPolicy, Signal};
pub use supervisor::{RecorderExit, RecorderHandle, RecorderSupervisor};
