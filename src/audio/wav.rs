//! WAV file encoding and decoding.
//!
//! Recordings are written as single-channel 16-bit PCM WAV files named
//! `recording_<unix-timestamp-seconds>.wav` in the target directory.
//! Decoding accepts both integer and float WAVs so externally produced
//! files still play.

use anyhow::{anyhow, Result};
use hound::{WavReader, WavWriter};
use std::path::{Path, PathBuf};

/// Channel count for all recordings.
pub const CHANNELS: u16 = 1;

/// Returns the file name for a recording completed at the given Unix time.
pub fn recording_file_name(unix_seconds: i64) -> String {
    format!("recording_{unix_seconds}.wav")
}

/// Writes recorded samples as a mono 16-bit WAV into `dir`, named with the
/// current Unix timestamp.
///
/// # Errors
/// - If the file cannot be created or written
pub fn write_recording(dir: &Path, samples: &[i16], sample_rate: u32) -> Result<PathBuf> {
    let spec = hound::WavSpec {
        channels: CHANNELS,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let path = dir.join(recording_file_name(chrono::Utc::now().timestamp()));
    let mut writer = WavWriter::create(&path, spec)
        .map_err(|e| anyhow!("Failed to create {}: {e}", path.display()))?;

    for &sample in samples {
        writer.write_sample(sample)?;
    }

    writer.finalize()?;

    let duration_secs = samples.len() as f32 / sample_rate as f32;
    tracing::info!(
        "Audio saved: {} ({:.2}s, {} samples at {}Hz)",
        path.display(),
        duration_secs,
        samples.len(),
        sample_rate
    );

    Ok(path)
}

/// A WAV file decoded into an in-memory sample buffer.
#[derive(Debug, Clone)]
pub struct DecodedWav {
    /// Interleaved PCM samples
    pub samples: Vec<i16>,
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Number of interleaved channels
    pub channels: u16,
}

/// Decodes a WAV file into an i16 sample buffer.
///
/// Float samples are rescaled to the i16 range.
///
/// # Errors
/// - If the file cannot be opened or is not a valid WAV
/// - If the sample data cannot be read
pub fn read_recording(path: &Path) -> Result<DecodedWav> {
    let mut reader = WavReader::open(path)
        .map_err(|e| anyhow!("Failed to decode {}: {e}", path.display()))?;
    let spec = reader.spec();

    let samples: Vec<i16> = match spec.sample_format {
        hound::SampleFormat::Int => reader
            .samples::<i16>()
            .collect::<Result<_, _>>()
            .map_err(|e| anyhow!("Failed to read samples from {}: {e}", path.display()))?,
        hound::SampleFormat::Float => reader
            .samples::<f32>()
            .map(|s| s.map(|v| (v.clamp(-1.0, 1.0) * i16::MAX as f32) as i16))
            .collect::<Result<_, _>>()
            .map_err(|e| anyhow!("Failed to read samples from {}: {e}", path.display()))?,
    };

    tracing::debug!(
        "Decoded {}: {} samples, {}Hz, {} channel(s)",
        path.display(),
        samples.len(),
        spec.sample_rate,
        spec.channels
    );

    Ok(DecodedWav {
        samples,
        sample_rate: spec.sample_rate,
        channels: spec.channels,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_file_name_format() {
        assert_eq!(recording_file_name(1700000000), "recording_1700000000.wav");
        assert_eq!(recording_file_name(0), "recording_0.wav");
    }

    #[test]
    fn test_written_file_matches_fixed_configuration() {
        let dir = tempfile::tempdir().unwrap();
        let samples: Vec<i16> = (0..4410).map(|i| (i % 100) as i16).collect();

        let path = write_recording(dir.path(), &samples, 44_100).unwrap();
        let name = path.file_name().unwrap().to_string_lossy();
        assert!(name.starts_with("recording_") && name.ends_with(".wav"));

        let reader = WavReader::open(&path).unwrap();
        let spec = reader.spec();
        assert_eq!(spec.channels, 1);
        assert_eq!(spec.sample_rate, 44_100);
        assert_eq!(spec.bits_per_sample, 16);
        assert_eq!(spec.sample_format, hound::SampleFormat::Int);
    }

    #[test]
    fn test_round_trip_preserves_samples_and_rate() {
        let dir = tempfile::tempdir().unwrap();
        let samples: Vec<i16> = vec![0, 100, -100, i16::MAX, i16::MIN, 42];

        let path = write_recording(dir.path(), &samples, 44_100).unwrap();
        let decoded = read_recording(&path).unwrap();

        assert_eq!(decoded.samples, samples);
        assert_eq!(decoded.sample_rate, 44_100);
        assert_eq!(decoded.channels, 1);
    }

    #[test]
    fn test_float_wav_is_rescaled() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("float.wav");
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: 22_050,
            bits_per_sample: 32,
            sample_format: hound::SampleFormat::Float,
        };
        let mut writer = WavWriter::create(&path, spec).unwrap();
        writer.write_sample(0.0f32).unwrap();
        writer.write_sample(1.0f32).unwrap();
        writer.write_sample(-1.0f32).unwrap();
        writer.finalize().unwrap();

        let decoded = read_recording(&path).unwrap();
        assert_eq!(decoded.sample_rate, 22_050);
        assert_eq!(decoded.samples[0], 0);
        assert_eq!(decoded.samples[1], i16::MAX);
        assert_eq!(decoded.samples[2], -i16::MAX);
    }

    #[test]
    fn test_decode_failure_on_garbage_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("not_audio.wav");
        std::fs::write(&path, b"this is not a wav file").unwrap();

        assert!(read_recording(&path).is_err());
    }
}
