//! Task sources
//!
//! A task source hands out the next prompt for the operator and accepts the
//! completion report of a recording. Implementations:
//! - `LocalTaskSource` - fixed in-memory list (file or built-in demo tasks)
//! - `HttpTaskSource` - remote backend (`GET /next_task`, `POST /submit`)

mod http;
mod local;
mod source;

pub use http::HttpTaskSource;
pub use local::{LocalTaskSource, DEMO_TASKS};
pub use source::{Task, TaskSource, TaskSourceFactory};
