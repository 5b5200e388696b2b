use std::process::ExitStatus;

/// How a recorder session ended, as far as the operator is concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitOutcome {
    Clean,
    /// Stopped through the interrupt signal
    Interrupted,
    /// The host OS refused the recorder access to the screen or input devices
    PermissionDenied(i32),
    Abnormal(i32),
    /// No exit code could be obtained
    Undetermined,
}

impl ExitOutcome {
    /// Dialog to show for this outcome, if any.
    pub fn operator_message(&self) -> Option<(String, String)> {
        match self {
            Self::Clean | Self::Interrupted | Self::Undetermined => None,
            Self::PermissionDenied(_) => Some((
                "Нет прав (macOS)".to_string(),
                "Запись завершилась с ошибкой (SIGTRAP).\n\n\
                 Обычно это отсутствие прав на Screen Recording / Input Monitoring.\n\n\
                 System Settings → Privacy & Security →\n\
                 • Screen Recording\n• Input Monitoring\n• Accessibility\n\n\
                 Добавьте Terminal или PyCharm, затем перезапустите их."
                    .to_string(),
            )),
            Self::Abnormal(code) => Some((
                "Ошибка записи".to_string(),
                format!("Дочерний процесс завершился с кодом: {}", code),
            )),
        }
    }
}

/// Mapping of platform-specific exit codes onto outcomes.
///
/// Signal-terminated processes are reported as the negated signal number, so
/// the defaults treat SIGINT (`-2`) as a normal stop and SIGTRAP (`-5`) as the
/// macOS privacy-permission failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExitCodePolicy {
    pub interrupted_codes: Vec<i32>,
    pub permission_denied_codes: Vec<i32>,
}

impl Default for ExitCodePolicy {
    fn default() -> Self {
        Self {
            interrupted_codes: vec![-2],
            permission_denied_codes: vec![-5],
        }
    }
}

impl ExitCodePolicy {
    pub fn classify(&self, code: Option<i32>) -> ExitOutcome {
        match code {
            None => ExitOutcome::Undetermined,
            Some(0) => ExitOutcome::Clean,
            Some(c) if self.interrupted_codes.contains(&c) => ExitOutcome::Interrupted,
            Some(c) if self.permission_denied_codes.contains(&c) => {
                ExitOutcome::PermissionDenied(c)
            }
            Some(c) => ExitOutcome::Abnormal(c),
        }
    }
}

/// Exit code of a finished process; a signal `N` is reported as `-N`.
pub fn exit_code(status: ExitStatus) -> Option<i32> {
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        status.code().or_else(|| status.signal().map(|s| -s))
    }

    #[cfg(not(unix))]
    {
        status.code()
    }
}
