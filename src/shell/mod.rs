//! Operator-facing terminal shell
//!
//! - `OperatorView` - what the session controller can show
//! - `TerminalView` - plain stdout rendering of that view
//! - `run` - the single operator loop (commands, recorder exits, timer)
//! - `forward_interrupts` - Ctrl-C listener feeding `run`

mod app;
mod command;
mod terminal;
mod view;

pub use app::{forward_interrupts, run};
pub use command::Command;
pub use terminal::TerminalView;
pub use view::{Controls, OperatorView};
