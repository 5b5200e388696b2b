use serde_json::{Map, Value};
use tracing::debug;

use super::source::{Task, TaskSource};

/// Built-in tasks used when nothing else is configured.
pub const DEMO_TASKS: [&str; 3] = [
    "Откройте браузер и найдите погоду в Амстердаме",
    "Создайте документ и сохраните его на рабочий стол",
    "Откройте почту и подготовьте черновик письма другу",
];

/// Fixed in-memory list of tasks, handed out once each.
pub struct LocalTaskSource {
    tasks: Vec<String>,
    next: usize,
}

impl LocalTaskSource {
    /// Blank entries are dropped.
    pub fn new<I, S>(tasks: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let tasks = tasks
            .into_iter()
            .map(Into::into)
            .filter(|t: &String| !t.trim().is_empty())
            .collect();

        Self { tasks, next: 0 }
    }

    pub fn demo() -> Self {
        Self::new(DEMO_TASKS)
    }

    pub fn remaining(&self) -> usize {
        self.tasks.len() - self.next
    }
}

#[async_trait::async_trait]
impl TaskSource for LocalTaskSource {
    async fn get_next_task(&mut self) -> Option<Task> {
        let text = self.tasks.get(self.next)?.clone();
        self.next += 1;

        Some(Task {
            task_id: format!("local_{}", self.next),
            text,
        })
    }

    async fn submit_result(&self, task_id: &str, rec_id: &str, _meta: &Map<String, Value>) {
        debug!("Local source, not submitting {} / {}", task_id, rec_id);
    }

    fn name(&self) -> &str {
        "local"
    }
}
