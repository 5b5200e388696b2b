use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RecorderError {
    #[error("recorder executable not found (searched: {})", format_searched(.searched))]
    RecorderNotFound { searched: Vec<PathBuf> },
    #[error("failed to launch recorder {}: {source}", .program.display())]
    LaunchFailed {
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl RecorderError {
    /// Dialog title and body shown to the operator.
    pub fn operator_message(&self) -> (String, String) {
        match self {
            Self::RecorderNotFound { .. } => (
                "Рекордер не найден".to_string(),
                "Не найден файл рекордера: datagrabber_69.py (или задайте RECORDER_SCRIPT)."
                    .to_string(),
            ),
            Self::LaunchFailed { source, .. } => {
                ("Не удалось запустить запись".to_string(), source.to_string())
            }
        }
    }
}

fn format_searched(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
