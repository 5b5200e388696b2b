use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::recorder::{ExitCodePolicy, ShutdownPolicy};

/// Environment variables understood for compatibility with existing launch scripts.
const LEGACY_ENV: [(&str, &str); 4] = [
    ("operator_name", "OPERATOR_NAME"),
    ("recorder_script", "RECORDER_SCRIPT"),
    ("task_api_base", "TASK_API_BASE"),
    ("tasks_json", "TASKS_JSON"),
];

const ENV_PREFIX: &str = "TASK_RECORDER";

/// List-valued keys, given in the environment as comma-separated integers.
const EXIT_CODE_KEYS: [&str; 2] = ["exit_codes.interrupted", "exit_codes.permission_denied"];

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Operator display name passed to the recorder
    pub operator_name: Option<String>,
    /// Explicit recorder executable, bypasses the candidate search
    pub recorder_script: Option<PathBuf>,
    /// Interpreter used for the recorder (defaults to python3 for `.py` files)
    pub recorder_interpreter: Option<PathBuf>,
    /// Base URL of the remote task backend
    pub task_api_base: Option<String>,
    /// Local JSON array of task strings, used when no backend is configured
    pub tasks_json: Option<PathBuf>,
    /// Directory the recorder writes `<rec_id>/meta.json` into
    pub dataset_root: PathBuf,
    pub http_timeout_secs: u64,
    pub shutdown: ShutdownConfig,
    pub exit_codes: ExitCodesConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ShutdownConfig {
    pub poll_interval_ms: u64,
    pub grace_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExitCodesConfig {
    pub interrupted: Vec<i32>,
    pub permission_denied: Vec<i32>,
}

/// Values from the command line, applied on top of every other source.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub operator_name: Option<String>,
    pub recorder_script: Option<PathBuf>,
    pub task_api_base: Option<String>,
    pub tasks_json: Option<PathBuf>,
    pub dataset_root: Option<PathBuf>,
}

impl Config {
    /// Load configuration from defaults, an optional TOML file and the environment.
    pub fn load(path: &Path) -> Result<Self> {
        Self::load_with_env(path, std::env::vars().collect())
    }

    /// Same as [`Config::load`], reading variables from `env` instead of the process.
    pub fn load_with_env(path: &Path, env: config::Map<String, String>) -> Result<Self> {
        let mut builder = config::Config::builder()
            .set_default("dataset_root", "./dataset")?
            .set_default("http_timeout_secs", 10)?
            .set_default("shutdown.poll_interval_ms", 100)?
            .set_default("shutdown.grace_ms", 3000)?
            .set_default("exit_codes.interrupted", vec![-2])?
            .set_default("exit_codes.permission_denied", vec![-5])?
            .add_source(config::File::from(path).required(false))
            // Values stay strings; numeric keys are parsed on deserialization
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .source(Some(env.clone())),
            );

        for key in EXIT_CODE_KEYS {
            let var = env_var_name(key);
            if let Some(raw) = non_blank(env.get(&var).cloned()) {
                let codes = parse_code_list(&raw)
                    .with_context(|| format!("Invalid exit code list in {}: {:?}", var, raw))?;
                builder = builder.set_override(key, codes)?;
            }
        }

        for (key, var) in LEGACY_ENV {
            builder = builder.set_override_option(key, non_blank(env.get(var).cloned()))?;
        }

        let settings = builder
            .build()
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?;

        let cfg: Self = settings.try_deserialize()?;
        Ok(cfg.normalized())
    }

    pub fn apply(mut self, overrides: Overrides) -> Self {
        if overrides.operator_name.is_some() {
            self.operator_name = overrides.operator_name;
        }
        if overrides.recorder_script.is_some() {
            self.recorder_script = overrides.recorder_script;
        }
        if overrides.task_api_base.is_some() {
            self.task_api_base = overrides.task_api_base;
        }
        if overrides.tasks_json.is_some() {
            self.tasks_json = overrides.tasks_json;
        }
        if let Some(root) = overrides.dataset_root {
            self.dataset_root = root;
        }
        self.normalized()
    }

    /// Operator name from configuration, else the login name of the current user.
    pub fn operator(&self) -> Option<String> {
        self.operator_name.clone().or_else(|| {
            non_blank(
                std::env::var("USER")
                    .or_else(|_| std::env::var("USERNAME"))
                    .ok(),
            )
        })
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    pub fn shutdown_policy(&self) -> ShutdownPolicy {
        ShutdownPolicy {
            poll_interval: Duration::from_millis(self.shutdown.poll_interval_ms.max(1)),
            grace: Duration::from_millis(self.shutdown.grace_ms),
        }
    }

    pub fn exit_code_policy(&self) -> ExitCodePolicy {
        ExitCodePolicy {
            interrupted_codes: self.exit_codes.interrupted.clone(),
            permission_denied_codes: self.exit_codes.permission_denied.clone(),
        }
    }

    fn normalized(mut self) -> Self {
        self.operator_name = non_blank(self.operator_name.take());
        self.task_api_base = non_blank(self.task_api_base.take());
        self.recorder_script = non_blank_path(self.recorder_script.take());
        self.recorder_interpreter = non_blank_path(self.recorder_interpreter.take());
        self.tasks_json = non_blank_path(self.tasks_json.take());
        self
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// `exit_codes.interrupted` -> `TASK_RECORDER_EXIT_CODES__INTERRUPTED`
fn env_var_name(key: &str) -> String {
    format!("{}_{}", ENV_PREFIX, key.replace('.', "__").to_uppercase())
}

fn parse_code_list(raw: &str) -> Result<Vec<i32>, std::num::ParseIntError> {
    raw.split(',')
        .map(str::trim)
        .filter(|code| !code.is_empty())
        .map(str::parse)
        .collect()
}

fn non_blank_path(value: Option<PathBuf>) -> Option<PathBuf> {
    value.filter(|p| !p.as_os_str().to_string_lossy().trim().is_empty())
}
