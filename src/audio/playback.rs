//! Playback of a recorded WAV file on the default output device.
//!
//! Rendering is synchronous: [`play_file`] decodes the file, streams the
//! buffer to the device, and returns only after the buffer has drained. The
//! caller is expected to run it on a task spawned off the UI loop.

use crate::audio::wav::{self, DecodedWav};
use anyhow::{anyhow, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{FromSample, Sample, SizedSample};
use crossbeam_channel::{bounded, Sender};
use std::path::Path;
use std::time::Duration;

/// Settle time after the callback reports the buffer drained, so the tail of
/// the clip is not cut off by dropping the stream.
const DRAIN_GRACE: Duration = Duration::from_millis(150);

/// Decodes `path` and renders it to the default output device, blocking
/// until playback completes.
///
/// An empty file plays nothing and returns immediately.
///
/// # Errors
/// - If the file cannot be decoded
/// - If no output device is available or the stream cannot be built
pub fn play_file(path: &Path) -> Result<()> {
    let decoded = wav::read_recording(path)?;
    tracing::info!(
        "Playing {}: {} samples at {}Hz",
        path.display(),
        decoded.samples.len(),
        decoded.sample_rate
    );
    play_buffer(decoded)
}

/// Renders a decoded buffer on the default output device at the buffer's
/// sample rate and channel count.
fn play_buffer(decoded: DecodedWav) -> Result<()> {
    if decoded.samples.is_empty() {
        return Ok(());
    }

    let host = cpal::default_host();
    let device = host
        .default_output_device()
        .ok_or_else(|| anyhow!("No audio output device available"))?;

    let label = device
        .name()
        .unwrap_or_else(|_| "Unknown device".to_string());
    tracing::debug!("Playback device: {}", label);

    let default_config = device.default_output_config()?;
    let config = cpal::StreamConfig {
        channels: decoded.channels,
        sample_rate: cpal::SampleRate(decoded.sample_rate),
        buffer_size: cpal::BufferSize::Default,
    };

    let frame_count = decoded.samples.len() / decoded.channels as usize;
    let clip_duration = Duration::from_secs_f64(frame_count as f64 / decoded.sample_rate as f64);

    // The callback signals once when it runs out of samples.
    let (done_tx, done_rx) = bounded::<()>(1);

    let stream = match default_config.sample_format() {
        cpal::SampleFormat::F32 => {
            build_output_stream::<f32>(&device, &config, decoded.samples, done_tx)
        }
        cpal::SampleFormat::I16 => {
            build_output_stream::<i16>(&device, &config, decoded.samples, done_tx)
        }
        cpal::SampleFormat::U16 => {
            build_output_stream::<u16>(&device, &config, decoded.samples, done_tx)
        }
        other => Err(anyhow!("Unsupported output sample format: {other:?}")),
    }?;

    stream.play()?;

    // Block until the callback has consumed the whole buffer, then give the
    // device a moment to flush what it already pulled.
    done_rx
        .recv()
        .map_err(|_| anyhow!("Playback stream ended unexpectedly"))?;
    std::thread::sleep(DRAIN_GRACE);

    drop(stream);
    tracing::debug!("Playback finished ({:.2}s)", clip_duration.as_secs_f64());
    Ok(())
}

/// Builds an output stream that feeds `samples` to the device, padding with
/// silence once the buffer is exhausted.
fn build_output_stream<T>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    samples: Vec<i16>,
    done_tx: Sender<()>,
) -> Result<cpal::Stream>
where
    T: SizedSample + FromSample<i16>,
{
    let mut position = 0usize;

    let stream = device.build_output_stream(
        config,
        move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
            for out in data.iter_mut() {
                if position < samples.len() {
                    *out = T::from_sample(samples[position]);
                    position += 1;
                } else {
                    *out = Sample::EQUILIBRIUM;
                }
            }

            if position >= samples.len() {
                let _ = done_tx.try_send(());
            }
        },
        |err| {
            tracing::error!("Playback stream error: {}", err);
        },
        None,
    )?;

    Ok(stream)
}
