pub mod config;
pub mod recorder;
pub mod session;
pub mod shell;
pub mod tasks;

pub use config::{Config, Overrides};
pub use recorder::{
    ExitCodePolicy, ExitOutcome, RecorderError, RecorderExit, RecorderHandle, RecorderLocator,
    RecorderSupervisor, ShutdownOutcome, ShutdownPolicy, Signal,
};
pub use session::{SessionController, SessionSettings, SessionState, NO_MORE_TASKS};
pub use shell::{Controls, OperatorView, TerminalView};
pub use tasks::{HttpTaskSource, LocalTaskSource, Task, TaskSource, TaskSourceFactory};
