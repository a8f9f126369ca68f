//! Interactive chat session with audio record/playback.
//!
//! Runs the chat window event loop: renders the log and controls, dispatches
//! user commands, and owns the per-action background tasks (one capture
//! worker per recording session, one blocking playback task per playback).

use crate::audio::{playback, wav, Recorder};
use crate::chat::{AppState, ChatCommand, ChatTui, PlaybackRequest, RecorderStatus, RecordingOutcome};
use crate::config::ChatrecConfig;
use crate::ui::show_startup_error;
use std::path::Path;

/// Runs the chat window until the user quits.
///
/// # Errors
/// - If configuration exists but cannot be parsed
/// - If the terminal cannot be initialized
/// - If rendering or input handling fails
pub async fn handle_chat() -> Result<(), anyhow::Error> {
    tracing::info!("=== chatrec Chat Session Started ===");

    let config = match ChatrecConfig::load() {
        Ok(config) => config,
        Err(err) => {
            tracing::error!("Failed to load configuration: {err}");
            show_startup_error(&format!(
                "Configuration Error:\n\n{err}\n\nPlease check your ~/.config/chatrec/chatrec.toml file and try again."
            ))?;
            return Err(anyhow::anyhow!("Configuration error: {err}"));
        }
    };

    tracing::info!(
        "Configuration loaded: device={}, sample_rate={}Hz",
        config.audio.device,
        config.audio.sample_rate
    );

    let mut tui = ChatTui::new().map_err(|e| anyhow::anyhow!("Failed to initialize UI: {e}"))?;
    let mut state = AppState::new();

    // Per-action task handles, retained so stop can join the capture worker
    // and the loop can observe playback completion.
    let mut recorder: Option<Recorder> = None;
    let mut playback_task: Option<tokio::task::JoinHandle<anyhow::Result<()>>> = None;

    loop {
        // Surface playback completion before rendering so the completion
        // line appears as soon as the task ends.
        if let Some(handle) = playback_task.take_if(|h| h.is_finished()) {
            match handle.await {
                Ok(Ok(())) => {
                    tracing::info!("Playback finished");
                    state.push_system("Finished playing recording");
                }
                Ok(Err(e)) => {
                    tracing::error!("Playback failed: {e}");
                    state.push_system(format!("Playback failed: {e}"));
                }
                Err(e) => {
                    tracing::error!("Playback task failed: {e}");
                    state.push_system("Playback failed");
                }
            }
        }

        tui.render(&state)
            .map_err(|e| anyhow::anyhow!("Render failed: {e}"))?;

        match tui.poll_command()? {
            ChatCommand::Continue => {}
            ChatCommand::SendText(message) => {
                if state.send_text(&message) {
                    tracing::debug!("Message sent ({} chars)", message.len());
                    tui.clear_input();
                }
            }
            ChatCommand::StartRecording => {
                if state.can_record() {
                    // Open the device first; only a successful open moves
                    // the state machine to Recording.
                    match Recorder::start(&config.audio.device, config.audio.sample_rate) {
                        Ok(r) => {
                            recorder = Some(r);
                            state.begin_recording();
                        }
                        Err(e) => {
                            tracing::error!("Failed to start recording: {e}");
                            state.push_system(format!("Audio input unavailable: {e}"));
                        }
                    }
                }
            }
            ChatCommand::StopRecording => {
                if let Some(session) = recorder.take() {
                    let outcome = stop_and_save(session);
                    state.finish_recording(outcome);
                }
            }
            ChatCommand::PlayLast => {
                if state.status() == RecorderStatus::Idle {
                    if playback_task.is_some() {
                        state.push_system("Still playing the last recording");
                    } else if let PlaybackRequest::Play(path) = state.playback_request() {
                        playback_task = Some(tokio::task::spawn_blocking(move || {
                            playback::play_file(&path)
                        }));
                    }
                }
            }
            ChatCommand::Quit => {
                break;
            }
        }
    }

    // A session still recording at quit is stopped and discarded.
    if let Some(session) = recorder.take() {
        tracing::info!("Quit while recording; discarding session");
        let _ = session.stop();
    }
    if playback_task.is_some() {
        tracing::debug!("Exiting with playback in progress");
    }

    tui.cleanup()
        .map_err(|e| anyhow::anyhow!("Cleanup failed: {e}"))?;

    tracing::info!("=== chatrec Chat Session Exited ===");
    Ok(())
}

/// Joins the capture worker, drains the session's samples, and writes the
/// WAV file into the working directory.
///
/// Zero captured samples produce no file (the log gets "Nothing recorded").
/// A failed write discards the recording and leaves the last-recording
/// reference unchanged.
fn stop_and_save(session: Recorder) -> RecordingOutcome {
    let sample_rate = session.sample_rate();

    let samples = match session.stop() {
        Ok(samples) => samples,
        Err(e) => {
            tracing::error!("Failed to stop recording: {e}");
            return RecordingOutcome::Failed(e);
        }
    };

    if samples.is_empty() {
        tracing::warn!("Recording stopped with no samples captured");
        return RecordingOutcome::Empty;
    }

    match wav::write_recording(Path::new("."), &samples, sample_rate) {
        Ok(path) => RecordingOutcome::Saved(path),
        Err(e) => {
            tracing::error!("Failed to save recording: {e}");
            RecordingOutcome::Failed(e)
        }
    }
}
