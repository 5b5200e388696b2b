/// Operator input, one per line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Start,
    Finish,
    Quit,
    Help,
    Unknown(String),
}

impl Command {
    /// Parse a line of input. Blank lines yield `None`.
    pub fn parse(line: &str) -> Option<Self> {
        let word = line.trim().to_lowercase();
        let command = match word.as_str() {
            "" => return None,
            "s" | "start" => Self::Start,
            "f" | "finish" | "stop" => Self::Finish,
            "q" | "quit" | "exit" => Self::Quit,
            "h" | "help" | "?" => Self::Help,
            _ => Self::Unknown(line.trim().to_string()),
        };
        Some(command)
    }
}

pub const HELP: &str = "Команды: start (s) - начать запись, finish (f) - завершить и отправить, quit (q) - выход";
