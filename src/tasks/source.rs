use anyhow::{Context, Result};
use serde_json::{Map, Value};
use std::path::Path;
use tracing::{info, warn};

use super::http::HttpTaskSource;
use super::local::LocalTaskSource;
use crate::config::Config;

/// One unit of work shown to the operator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Task {
    pub task_id: String,
    /// Instruction text
    pub text: String,
}

/// Where tasks come from and where completion reports go
///
/// Failures never escape an implementation: a failed fetch is "no task", a
/// failed submission is dropped.
#[async_trait::async_trait]
pub trait TaskSource: Send + Sync {
    /// Next task, or `None` when nothing is available
    async fn get_next_task(&mut self) -> Option<Task>;

    /// Report a finished recording (best effort)
    async fn submit_result(&self, task_id: &str, rec_id: &str, meta: &Map<String, Value>);

    /// Source name for logging
    fn name(&self) -> &str;
}

/// Task source factory
pub struct TaskSourceFactory;

impl TaskSourceFactory {
    /// Pick a source from configuration: remote backend, task file, then demo tasks.
    pub fn from_config(cfg: &Config) -> Result<Box<dyn TaskSource>> {
        if let Some(base) = &cfg.task_api_base {
            info!("Using task backend at {}", base);
            let source = HttpTaskSource::new(base, cfg.http_timeout())?;
            return Ok(Box::new(source));
        }

        if let Some(path) = &cfg.tasks_json {
            if let Some(tasks) = Self::read_task_file(path)? {
                info!("Loaded {} tasks from {}", tasks.len(), path.display());
                return Ok(Box::new(LocalTaskSource::new(tasks)));
            }
        }

        info!("No task source configured, using demo tasks");
        Ok(Box::new(LocalTaskSource::demo()))
    }

    /// Read a JSON array of tasks. Missing files and non-array documents yield `None`.
    fn read_task_file(path: &Path) -> Result<Option<Vec<String>>> {
        if !path.exists() {
            warn!("Task file {} does not exist", path.display());
            return Ok(None);
        }

        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read task file {}", path.display()))?;
        let doc: Value = serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse task file {}", path.display()))?;

        match doc {
            Value::Array(items) => Ok(Some(items.iter().map(value_to_text).collect())),
            _ => {
                warn!("Task file {} is not a JSON array, ignoring it", path.display());
                Ok(None)
            }
        }
    }
}

/// Render a JSON value as plain text; strings are taken verbatim.
pub(crate) fn value_to_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
