use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::{Map, Value};
use std::time::Duration;
use tracing::{debug, info, warn};

use super::source::{value_to_text, Task, TaskSource};

/// Completion report posted to `/submit`
#[derive(Debug, Serialize)]
struct SubmitRequest<'a> {
    task_id: &'a str,
    rec_id: &'a str,
    meta: &'a Map<String, Value>,
}

/// Task backend reachable over HTTP
///
/// - `GET /next_task` → `{"task_id": ..., "text": ...}`
/// - `POST /submit` ← `{"task_id": ..., "rec_id": ..., "meta": {...}}`
pub struct HttpTaskSource {
    base_url: String,
    client: reqwest::Client,
}

impl HttpTaskSource {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn fetch_next(&self) -> Result<Value> {
        let url = format!("{}/next_task", self.base_url);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .with_context(|| format!("GET {} failed", url))?
            .error_for_status()?;

        response.json().await.context("Invalid JSON from /next_task")
    }

    async fn post_submit(&self, payload: &SubmitRequest<'_>) -> Result<()> {
        let url = format!("{}/submit", self.base_url);
        self.client
            .post(&url)
            .json(payload)
            .send()
            .await
            .with_context(|| format!("POST {} failed", url))?
            .error_for_status()?;

        Ok(())
    }
}

#[async_trait::async_trait]
impl TaskSource for HttpTaskSource {
    async fn get_next_task(&mut self) -> Option<Task> {
        let data = match self.fetch_next().await {
            Ok(data) => data,
            Err(e) => {
                warn!("Could not fetch next task: {:#}", e);
                return None;
            }
        };

        let Some(text) = data.get("text").filter(|t| !t.is_null()) else {
            info!("Backend returned no task");
            return None;
        };

        let task = Task {
            task_id: data.get("task_id").map(value_to_text).unwrap_or_default(),
            text: value_to_text(text),
        };
        debug!("Fetched task {}", task.task_id);

        Some(task)
    }

    async fn submit_result(&self, task_id: &str, rec_id: &str, meta: &Map<String, Value>) {
        let payload = SubmitRequest {
            task_id,
            rec_id,
            meta,
        };

        match self.post_submit(&payload).await {
            Ok(()) => info!("Submitted {} for task {}", rec_id, task_id),
            Err(e) => warn!("Submission of {} dropped: {:#}", rec_id, e),
        }
    }

    fn name(&self) -> &str {
        "http"
    }
}
