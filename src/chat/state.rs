//! Application state for the chat window.
//!
//! One owned struct holds the chat log, the recording status, and the
//! last-recording reference, and is passed explicitly to the event handlers.
//! Device and filesystem work stays in the command loop; everything here is
//! plain state manipulation, which keeps it unit-testable.

use std::path::{Path, PathBuf};

/// Recording status driving which controls are enabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RecorderStatus {
    #[default]
    Idle,
    Recording,
}

/// Result of one completed recording session, as seen by the log.
#[derive(Debug)]
pub enum RecordingOutcome {
    /// Samples were captured and written to this file
    Saved(PathBuf),
    /// The session ended with zero captured samples; no file was written
    Empty,
    /// Samples were captured but writing the file failed; recording discarded
    Failed(anyhow::Error),
}

/// What a play-last-recording request should do.
#[derive(Debug, PartialEq, Eq)]
pub enum PlaybackRequest {
    /// Decode and render this file
    Play(PathBuf),
    /// Nothing playable; no device call is made
    Unavailable,
}

/// Owned state behind the chat window.
pub struct AppState {
    /// Append-only chat log lines, oldest first
    lines: Vec<String>,
    status: RecorderStatus,
    /// Most recently saved recording, overwritten on each completion
    last_recording: Option<PathBuf>,
}

impl AppState {
    pub fn new() -> Self {
        Self {
            lines: Vec::new(),
            status: RecorderStatus::Idle,
            last_recording: None,
        }
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn status(&self) -> RecorderStatus {
        self.status
    }

    pub fn last_recording(&self) -> Option<&Path> {
        self.last_recording.as_deref()
    }

    /// Appends `You: <text>` for a non-empty message.
    ///
    /// Returns whether a line was added, i.e. whether the input field should
    /// be cleared. Empty input is a no-op, not an error.
    pub fn send_text(&mut self, text: &str) -> bool {
        if text.is_empty() {
            return false;
        }
        self.lines.push(format!("You: {text}"));
        true
    }

    /// Appends a `System: <message>` status line.
    pub fn push_system(&mut self, message: impl AsRef<str>) {
        self.lines.push(format!("System: {}", message.as_ref()));
    }

    pub fn can_record(&self) -> bool {
        self.status == RecorderStatus::Idle
    }

    pub fn can_stop(&self) -> bool {
        self.status == RecorderStatus::Recording
    }

    /// Play is enabled only when not recording and a saved recording still
    /// exists on disk.
    pub fn can_play(&self) -> bool {
        self.status == RecorderStatus::Idle
            && self.last_recording.as_deref().is_some_and(Path::exists)
    }

    /// IDLE -> RECORDING. The caller opens the capture device first, so a
    /// failed device open never leaves the state stuck in Recording.
    pub fn begin_recording(&mut self) {
        self.status = RecorderStatus::Recording;
        self.push_system("Recording started...");
    }

    /// RECORDING -> IDLE with the session's outcome. The sample buffer has
    /// already been drained by the time this runs.
    pub fn finish_recording(&mut self, outcome: RecordingOutcome) {
        self.status = RecorderStatus::Idle;
        match outcome {
            RecordingOutcome::Saved(path) => {
                let name = path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| path.display().to_string());
                self.push_system(format!("Recording saved as {name}"));
                self.last_recording = Some(path);
            }
            RecordingOutcome::Empty => {
                self.push_system("Nothing recorded");
            }
            RecordingOutcome::Failed(e) => {
                self.push_system(format!("Failed to save recording: {e}"));
            }
        }
    }

    /// Resolves a play-last request, logging the corresponding status line.
    ///
    /// The file must still exist on disk; a dangling reference behaves the
    /// same as no reference at all.
    pub fn playback_request(&mut self) -> PlaybackRequest {
        match &self.last_recording {
            Some(path) if path.exists() => {
                let path = path.clone();
                self.push_system("Playing last recording...");
                PlaybackRequest::Play(path)
            }
            _ => {
                self.push_system("No recording available to play");
                PlaybackRequest::Unavailable
            }
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_send_empty_text_is_a_noop() {
        let mut state = AppState::new();
        assert!(!state.send_text(""));
        assert!(state.lines().is_empty());
    }

    #[test]
    fn test_send_text_appends_one_line() {
        let mut state = AppState::new();
        assert!(state.send_text("hello"));
        assert_eq!(state.lines(), ["You: hello"]);
    }

    #[test]
    fn test_begin_recording_disables_record_control() {
        let mut state = AppState::new();
        assert!(state.can_record());
        assert!(!state.can_stop());

        state.begin_recording();
        assert_eq!(state.status(), RecorderStatus::Recording);
        assert!(!state.can_record());
        assert!(state.can_stop());
        assert!(!state.can_play());
        assert_eq!(state.lines(), ["System: Recording started..."]);
    }

    #[test]
    fn test_finish_recording_saved_updates_reference() {
        let mut state = AppState::new();
        state.begin_recording();
        state.finish_recording(RecordingOutcome::Saved(PathBuf::from(
            "recording_1700000000.wav",
        )));

        assert_eq!(state.status(), RecorderStatus::Idle);
        assert!(state.can_record());
        assert_eq!(
            state.last_recording(),
            Some(Path::new("recording_1700000000.wav"))
        );
        assert_eq!(
            state.lines().last().unwrap(),
            "System: Recording saved as recording_1700000000.wav"
        );
    }

    #[test]
    fn test_finish_recording_empty_returns_to_idle_without_file() {
        let mut state = AppState::new();
        state.begin_recording();
        state.finish_recording(RecordingOutcome::Empty);

        assert_eq!(state.status(), RecorderStatus::Idle);
        assert!(state.last_recording().is_none());
        assert_eq!(state.lines().last().unwrap(), "System: Nothing recorded");
    }

    #[test]
    fn test_failed_save_keeps_previous_reference() {
        let mut state = AppState::new();
        state.finish_recording(RecordingOutcome::Saved(PathBuf::from("first.wav")));
        state.begin_recording();
        state.finish_recording(RecordingOutcome::Failed(anyhow::anyhow!("disk full")));

        assert_eq!(state.last_recording(), Some(Path::new("first.wav")));
        assert_eq!(
            state.lines().last().unwrap(),
            "System: Failed to save recording: disk full"
        );
    }

    #[test]
    fn test_play_control_disabled_until_file_exists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("recording_3.wav");

        let mut state = AppState::new();
        assert!(!state.can_play());

        fs::write(&path, b"x").unwrap();
        state.finish_recording(RecordingOutcome::Saved(path.clone()));
        assert!(state.can_play());

        fs::remove_file(&path).unwrap();
        assert!(!state.can_play());
    }

    #[test]
    fn test_playback_without_recording_is_unavailable() {
        let mut state = AppState::new();
        assert_eq!(state.playback_request(), PlaybackRequest::Unavailable);
        assert_eq!(
            state.lines().last().unwrap(),
            "System: No recording available to play"
        );
    }

    #[test]
    fn test_playback_after_file_deleted_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("recording_1.wav");
        fs::write(&path, b"x").unwrap();

        let mut state = AppState::new();
        state.finish_recording(RecordingOutcome::Saved(path.clone()));

        fs::remove_file(&path).unwrap();
        assert_eq!(state.playback_request(), PlaybackRequest::Unavailable);
        assert_eq!(
            state.lines().last().unwrap(),
            "System: No recording available to play"
        );
    }

    #[test]
    fn test_playback_with_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("recording_2.wav");
        fs::write(&path, b"x").unwrap();

        let mut state = AppState::new();
        state.finish_recording(RecordingOutcome::Saved(path.clone()));

        assert_eq!(state.playback_request(), PlaybackRequest::Play(path));
        assert_eq!(
            state.lines().last().unwrap(),
            "System: Playing last recording..."
        );
    }
}
