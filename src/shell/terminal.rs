use std::io::Write;

use super::view::{Controls, OperatorView};

/// Renders the operator view as plain terminal lines.
///
/// The elapsed time is redrawn in place until any other line is printed.
#[derive(Debug, Default)]
pub struct TerminalView {
    inline_open: bool,
}

impl TerminalView {
    pub fn new() -> Self {
        Self::default()
    }

    fn line(&mut self, text: &str) {
        self.close_inline();
        println!("{}", text);
    }

    fn close_inline(&mut self) {
        if self.inline_open {
            println!();
            self.inline_open = false;
        }
    }
}

impl OperatorView for TerminalView {
    fn show_task(&mut self, text: &str) {
        self.line("");
        self.line("── Задание ──");
        self.line(text);
    }

    fn set_status(&mut self, status: &str) {
        self.line(&format!("[{}]", status));
    }

    fn set_elapsed(&mut self, elapsed: &str) {
        print!("\rВремя: {}", elapsed);
        std::io::stdout().flush().ok();
        self.inline_open = true;
    }

    fn set_controls(&mut self, controls: Controls) {
        let start = if controls.start_enabled { "start" } else { "-" };
        let finish = if controls.finish_enabled { "finish" } else { "-" };
        self.line(&format!("Доступно: {} | {}", start, finish));
    }

    fn show_error(&mut self, title: &str, body: &str) {
        self.close_inline();
        eprintln!("\n!! {}\n{}\n", title, body);
    }

    fn show_notice(&mut self, text: &str) {
        self.line(text);
    }
}
