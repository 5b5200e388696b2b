// Shared fixtures for integration tests: fake recorders, a scripted task
// source and a view that records what the operator would see.

#![allow(dead_code)]

use anyhow::{Context, Result};
use serde_json::{Map, Value};
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use task_recorder::{Controls, OperatorView, RecorderExit, Task, TaskSource};
use tokio::sync::mpsc;

/// Write an executable `/bin/sh` recorder script.
///
/// The script sees the recording id, task text and operator name as
/// `$REC_ID`, `$TASK` and `$OPERATOR`.
#[cfg(unix)]
pub fn write_recorder(dir: &Path, name: &str, body: &str) -> Result<PathBuf> {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join(name);
    std::fs::write(
        &path,
        format!(
            "#!/bin/sh\nREC_ID=\"$2\"\nTASK=\"$4\"\nOPERATOR=\"$6\"\n{}\n",
            body
        ),
    )?;
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755))?;
    Ok(path)
}

/// Shell function `write_meta` writing `{"task": ..., "operator": ...}` as the
/// session metadata.
pub fn write_meta_snippet(dataset_root: &Path) -> String {
    let root = dataset_root.display();
    format!(
        "write_meta() {{\n  mkdir -p \"{root}/$REC_ID\"\n  printf '{{\"task\":\"%s\",\"operator\":\"%s\"}}' \"$TASK\" \"$OPERATOR\" > \"{root}/$REC_ID/meta.json\"\n}}"
    )
}

/// Shell snippet touching `<dir>/ready` once signal handlers are installed.
pub fn ready_snippet(dir: &Path) -> String {
    format!("touch \"{}/ready\"", dir.display())
}

pub async fn wait_for_file(path: &Path) -> Result<()> {
    for _ in 0..200 {
        if path.exists() {
            return Ok(());
        }
        tokio::time::sleep(Duration::from_millis(25)).await;
    }
    anyhow::bail!("{} never appeared", path.display())
}

/// Poll `check` until it holds or ten seconds pass.
pub async fn eventually(what: &str, check: impl Fn() -> bool) -> Result<()> {
    for _ in 0..400 {
        if check() {
            return Ok(());
        }
        tokio::time::sleep(Duration::from_millis(25)).await;
    }
    anyhow::bail!("Timed out waiting for {}", what)
}

pub async fn next_exit(exits: &mut mpsc::UnboundedReceiver<RecorderExit>) -> Result<RecorderExit> {
    tokio::time::timeout(Duration::from_secs(15), exits.recv())
        .await
        .context("Recorder did not exit in time")?
        .context("Exit channel closed")
}

#[derive(Debug, Clone, PartialEq)]
pub struct Submission {
    pub task_id: String,
    pub rec_id: String,
    pub meta: Map<String, Value>,
}

/// Task source handing out a fixed queue and remembering submissions
pub struct ScriptedSource {
    tasks: VecDeque<Task>,
    submissions: Arc<Mutex<Vec<Submission>>>,
}

impl ScriptedSource {
    pub fn new(texts: &[&str]) -> (Self, Arc<Mutex<Vec<Submission>>>) {
        let submissions = Arc::new(Mutex::new(Vec::new()));
        let tasks = texts
            .iter()
            .enumerate()
            .map(|(i, text)| Task {
                task_id: format!("t{}", i + 1),
                text: text.to_string(),
            })
            .collect();

        (
            Self {
                tasks,
                submissions: Arc::clone(&submissions),
            },
            submissions,
        )
    }
}

#[async_trait::async_trait]
impl TaskSource for ScriptedSource {
    async fn get_next_task(&mut self) -> Option<Task> {
        self.tasks.pop_front()
    }

    async fn submit_result(&self, task_id: &str, rec_id: &str, meta: &Map<String, Value>) {
        self.submissions.lock().unwrap().push(Submission {
            task_id: task_id.to_string(),
            rec_id: rec_id.to_string(),
            meta: meta.clone(),
        });
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

#[derive(Debug, Default)]
pub struct ViewLog {
    pub tasks: Vec<String>,
    pub statuses: Vec<String>,
    pub elapsed: Vec<String>,
    pub controls: Vec<Controls>,
    pub errors: Vec<(String, String)>,
    pub notices: Vec<String>,
}

/// View that records every update for later assertions
#[derive(Clone, Default)]
pub struct RecordingView {
    pub log: Arc<Mutex<ViewLog>>,
}

impl RecordingView {
    pub fn errors(&self) -> Vec<(String, String)> {
        self.log.lock().unwrap().errors.clone()
    }

    pub fn last_task(&self) -> Option<String> {
        self.log.lock().unwrap().tasks.last().cloned()
    }

    pub fn last_status(&self) -> Option<String> {
        self.log.lock().unwrap().statuses.last().cloned()
    }

    pub fn last_controls(&self) -> Option<Controls> {
        self.log.lock().unwrap().controls.last().copied()
    }

    pub fn notices(&self) -> Vec<String> {
        self.log.lock().unwrap().notices.clone()
    }

    pub fn elapsed(&self) -> Vec<String> {
        self.log.lock().unwrap().elapsed.clone()
    }

    pub fn last_elapsed(&self) -> Option<String> {
        self.log.lock().unwrap().elapsed.last().cloned()
    }
}

impl OperatorView for RecordingView {
    fn show_task(&mut self, text: &str) {
        self.log.lock().unwrap().tasks.push(text.to_string());
    }

    fn set_status(&mut self, status: &str) {
        self.log.lock().unwrap().statuses.push(status.to_string());
    }

    fn set_elapsed(&mut self, elapsed: &str) {
        self.log.lock().unwrap().elapsed.push(elapsed.to_string());
    }

    fn set_controls(&mut self, controls: Controls) {
        self.log.lock().unwrap().controls.push(controls);
    }

    fn show_error(&mut self, title: &str, body: &str) {
        self.log
            .lock()
            .unwrap()
            .errors
            .push((title.to_string(), body.to_string()));
    }

    fn show_notice(&mut self, text: &str) {
        self.log.lock().unwrap().notices.push(text.to_string());
    }
}
