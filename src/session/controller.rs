use chrono::Local;
use std::path::PathBuf;
use std::time::Instant;
use tracing::{debug, error, info, warn};

use super::metadata::read_metadata;
use super::state::{format_elapsed, new_rec_id, RecordingSession, SessionState};
use crate::recorder::{
    ExitCodePolicy, ExitOutcome, RecorderExit, RecorderSupervisor, ShutdownPolicy,
};
use crate::shell::{Controls, OperatorView};
use crate::tasks::{Task, TaskSource};

/// Shown in place of the task text once the source runs dry
pub const NO_MORE_TASKS: &str = "Задачи закончились. Спасибо!";

const STATUS_READY: &str = "Готово";
const STATUS_STOPPING: &str = "Завершаю запись…";
const ELAPSED_ZERO: &str = "00:00";

/// Settings for the session controller
#[derive(Debug, Clone)]
pub struct SessionSettings {
    /// Directory the recorder writes `<rec_id>/meta.json` into
    pub dataset_root: PathBuf,
    /// Operator name passed to the recorder
    pub operator: Option<String>,
    pub shutdown: ShutdownPolicy,
    pub exit_codes: ExitCodePolicy,
}

/// Ties the current task to at most one recording session.
///
/// Every method runs on the operator loop; the recorder watcher only reaches
/// the controller through [`SessionController::on_recorder_exit`].
pub struct SessionController {
    source: Box<dyn TaskSource>,
    supervisor: RecorderSupervisor,
    view: Box<dyn OperatorView>,
    settings: SessionSettings,
    current_task: Option<Task>,
    session: Option<RecordingSession>,
    controls: Controls,
}

impl SessionController {
    pub fn new(
        source: Box<dyn TaskSource>,
        supervisor: RecorderSupervisor,
        view: Box<dyn OperatorView>,
        settings: SessionSettings,
    ) -> Self {
        Self {
            source,
            supervisor,
            view,
            settings,
            current_task: None,
            session: None,
            controls: Controls::default(),
        }
    }

    pub fn state(&self) -> SessionState {
        match (&self.session, &self.current_task) {
            (Some(session), _) if session.stop_requested => SessionState::Stopping,
            (Some(_), _) => SessionState::Recording,
            (None, Some(_)) => SessionState::TaskReady,
            (None, None) => SessionState::NoMoreTasks,
        }
    }

    pub fn controls(&self) -> Controls {
        self.controls
    }

    pub fn has_active_session(&self) -> bool {
        self.session.is_some()
    }

    pub fn active_rec_id(&self) -> Option<&str> {
        self.session.as_ref().map(|s| s.rec_id.as_str())
    }

    pub fn current_task(&self) -> Option<&Task> {
        self.current_task.as_ref()
    }

    /// Whether the elapsed time display needs refreshing
    pub fn timer_active(&self) -> bool {
        self.session.is_some()
    }

    /// Fetch the next task and show it.
    pub async fn load_next_task(&mut self) {
        self.current_task = self.source.get_next_task().await;

        match &self.current_task {
            Some(task) => {
                info!("Next task {} from {} source", task.task_id, self.source.name());
                self.view.show_task(&task.text);
            }
            None => {
                info!("No more tasks");
                self.view.show_task(NO_MORE_TASKS);
            }
        }

        self.set_controls(Controls {
            start_enabled: self.current_task.is_some(),
            finish_enabled: false,
        });
    }

    /// Launch the recorder for the current task.
    ///
    /// Returns `false` when a session is already active, there is no task, or
    /// the recorder could not be launched (reported to the operator).
    pub fn start(&mut self) -> bool {
        if self.session.is_some() {
            debug!("Start ignored, a recording is already in progress");
            return false;
        }
        let Some(task) = self.current_task.take() else {
            debug!("Start ignored, no task");
            return false;
        };

        let rec_id = new_rec_id(Local::now());
        let operator = self.settings.operator.as_deref();

        let handle = match self.supervisor.start(&rec_id, &task.text, operator) {
            Ok(handle) => handle,
            Err(e) => {
                error!("Failed to start recording for {}: {}", task.task_id, e);
                let (title, body) = e.operator_message();
                self.view.show_error(&title, &body);
                self.current_task = Some(task);
                return false;
            }
        };

        info!(
            "Recording {} started for task {} (pid {})",
            rec_id,
            task.task_id,
            handle.pid()
        );

        self.view.set_status(&format!("Запись идёт → {}", rec_id));
        self.view.set_elapsed(ELAPSED_ZERO);
        self.set_controls(Controls {
            start_enabled: false,
            finish_enabled: true,
        });

        self.session = Some(RecordingSession {
            rec_id,
            task,
            started_at: Instant::now(),
            handle,
            stop_requested: false,
        });

        true
    }

    /// Operator stop: run the staged shutdown of the recorder.
    ///
    /// Returns once the shutdown protocol is done; the session only ends when
    /// the watcher reports the exit.
    pub async fn finish(&mut self) -> bool {
        let Some(session) = self.session.as_mut() else {
            debug!("Finish ignored, nothing is recording");
            return false;
        };
        if session.stop_requested {
            debug!("Finish ignored, stop already requested");
            return false;
        }

        session.stop_requested = true;
        let handle = session.handle.clone();
        let policy = self.settings.shutdown;

        self.view.set_status(STATUS_STOPPING);
        self.set_controls(Controls::default());

        match tokio::task::spawn_blocking(move || handle.request_stop(&policy)).await {
            Ok(outcome) => info!("Shutdown finished: {:?}", outcome),
            Err(e) => error!("Shutdown worker failed: {}", e),
        }

        true
    }

    /// Terminal transition once the recorder has exited, requested or not.
    pub async fn on_recorder_exit(&mut self, exit: RecorderExit) -> Option<ExitOutcome> {
        if self.active_rec_id() != Some(exit.rec_id.as_str()) {
            warn!("Ignoring exit of unknown recording {}", exit.rec_id);
            return None;
        }
        let session = self.session.take()?;

        if !session.stop_requested {
            warn!(
                "Recorder {} exited on its own after {}",
                session.rec_id,
                format_elapsed(session.elapsed())
            );
        }

        self.view.set_elapsed(ELAPSED_ZERO);
        self.set_controls(Controls::default());

        let outcome = self.settings.exit_codes.classify(exit.code);
        info!("Recording {} ended: {:?}", session.rec_id, outcome);
        if outcome == ExitOutcome::Undetermined {
            warn!("Exit code of {} is unknown", session.rec_id);
        }
        if let Some((title, body)) = outcome.operator_message() {
            self.view.show_error(&title, &body);
        }

        let meta = read_metadata(&self.settings.dataset_root, &session.rec_id);
        self.source
            .submit_result(&session.task.task_id, &session.rec_id, &meta)
            .await;

        self.load_next_task().await;
        self.view.set_status(STATUS_READY);

        Some(outcome)
    }

    /// Refresh the elapsed time of the running session.
    pub fn tick(&mut self) {
        if let Some(session) = &self.session {
            let elapsed = format_elapsed(session.elapsed());
            self.view.set_elapsed(&elapsed);
        }
    }

    /// Informational line for the operator, outside the session flow.
    pub fn notify(&mut self, text: &str) {
        self.view.show_notice(text);
    }

    fn set_controls(&mut self, controls: Controls) {
        self.controls = controls;
        self.view.set_controls(controls);
    }
}
