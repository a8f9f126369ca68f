//! Chat window: application state and terminal rendering.

pub mod state;
pub mod ui;

pub use state::{AppState, PlaybackRequest, RecorderStatus, RecordingOutcome};
pub use ui::{ChatCommand, ChatTui};
