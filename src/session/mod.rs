//! Recording session management
//!
//! This module provides the `SessionController` that ties a fetched task to a
//! recorder run:
//! - Starting the recorder for the current task
//! - Staged stop on operator request
//! - Handling recorder exits, expected or not
//! - Reading back recorder metadata and submitting the result
//! - Elapsed time display and control states

mod controller;
mod metadata;
mod state;

pub use controller::{SessionController, SessionSettings, NO_MORE_TASKS};
pub use metadata::read_metadata;
pub use state::{format_elapsed, new_rec_id, RecordingSession, SessionState};
