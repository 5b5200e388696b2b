use std::path::{Path, PathBuf};
use tracing::debug;

use super::error::RecorderError;

/// File names looked up next to the tool, in order of preference.
pub const DEFAULT_CANDIDATES: [&str; 2] = ["datagrabber_69.py", "pc_screen_dataset_recorder.py"];

/// Resolves the recorder executable from an explicit path or a candidate search.
#[derive(Debug, Clone)]
pub struct RecorderLocator {
    pub override_path: Option<PathBuf>,
    pub search_dir: PathBuf,
    pub candidates: Vec<String>,
}

impl RecorderLocator {
    pub fn new(override_path: Option<PathBuf>) -> Self {
        let search_dir = std::env::current_exe()
            .ok()
            .and_then(|exe| exe.parent().map(Path::to_path_buf))
            .unwrap_or_else(|| PathBuf::from("."));

        Self {
            override_path,
            search_dir,
            candidates: DEFAULT_CANDIDATES.iter().map(|c| c.to_string()).collect(),
        }
    }

    pub fn with_search_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.search_dir = dir.into();
        self
    }

    pub fn locate(&self) -> Result<PathBuf, RecorderError> {
        let mut searched = Vec::new();

        if let Some(path) = &self.override_path {
            if path.exists() {
                return Ok(resolve(path));
            }
            debug!("Configured recorder {} does not exist", path.display());
            searched.push(path.clone());
        }

        for name in &self.candidates {
            let path = self.search_dir.join(name);
            if path.exists() {
                return Ok(resolve(&path));
            }
            searched.push(path);
        }

        Err(RecorderError::RecorderNotFound { searched })
    }
}

fn resolve(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| path.to_path_buf())
}
