use chrono::{DateTime, TimeZone};
use std::time::{Duration, Instant};

use crate::recorder::RecorderHandle;
use crate::tasks::Task;

/// Where the controller stands, derived from the task and session it holds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// A task is shown and recording can start
    TaskReady,
    /// The task source has nothing left
    NoMoreTasks,
    Recording,
    /// Stop requested, waiting for the recorder to exit
    Stopping,
}

/// The single active recording, from launch to confirmed exit
#[derive(Debug)]
pub struct RecordingSession {
    pub rec_id: String,
    pub task: Task,
    pub started_at: Instant,
    pub handle: RecorderHandle,
    pub stop_requested: bool,
}

impl RecordingSession {
    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }
}

/// Recording id with second resolution, e.g. `rec_20250101_120000`
pub fn new_rec_id<Tz: TimeZone>(now: DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    format!("rec_{}", now.format("%Y%m%d_%H%M%S"))
}

/// `MM:SS`; minutes keep growing past an hour
pub fn format_elapsed(elapsed: Duration) -> String {
    let secs = elapsed.as_secs();
    format!("{:02}:{:02}", secs / 60, secs % 60)
}
