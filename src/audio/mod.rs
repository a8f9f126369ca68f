//! Audio capture, WAV encoding, and playback.
//!
//! Capture and playback each run as a short-lived task per user action:
//! a worker thread owning the cpal input stream for the duration of one
//! recording session, and a blocking playback call that renders a decoded
//! WAV buffer until it drains.

pub mod capture;
pub mod playback;
pub mod wav;

pub use capture::Recorder;
