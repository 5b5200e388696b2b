/// Enabled state of the two operator controls
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Controls {
    pub start_enabled: bool,
    pub finish_enabled: bool,
}

/// Everything the session controller can put in front of the operator
pub trait OperatorView: Send {
    fn show_task(&mut self, text: &str);

    fn set_status(&mut self, status: &str);

    /// Elapsed recording time as `MM:SS`
    fn set_elapsed(&mut self, elapsed: &str);

    fn set_controls(&mut self, controls: Controls);

    /// Blocking error dialog
    fn show_error(&mut self, title: &str, body: &str);

    /// Short informational line (help, unavailable command)
    fn show_notice(&mut self, text: &str);
}
