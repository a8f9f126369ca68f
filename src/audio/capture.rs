//! Microphone capture for one recording session.
//!
//! A [`Recorder`] owns a worker thread that holds the cpal input stream for
//! the lifetime of one session (streams are not `Send`, so the stream never
//! leaves the worker). The stream callback downmixes incoming blocks to mono
//! i16 and pushes them into a bounded channel; the worker sweeps the channel
//! into its session accumulator every poll interval, so the channel only
//! ever has to buffer one interval's worth of callbacks. The accumulated
//! buffer is handed to the controller after the worker has been joined,
//! sequentially rather than shared.

use anyhow::{anyhow, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{FromSample, Sample, SizedSample};
use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

#[cfg(target_os = "linux")]
use std::fs::OpenOptions;
#[cfg(target_os = "linux")]
use std::os::unix::io::AsRawFd;

/// One delivery of mono samples from the capture device.
pub type SampleBlock = Vec<i16>;

/// Upper bound on buffered sample blocks between the device callback and the
/// worker's drain sweep. The sweep runs every [`STOP_POLL_INTERVAL`], so at
/// ~10ms per callback this is ample headroom over one interval.
const BLOCK_CHANNEL_CAPACITY: usize = 512;

/// How often the worker re-checks the active flag while the stream runs.
const STOP_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// An in-progress recording session.
///
/// Created by [`Recorder::start`], consumed by [`Recorder::stop`], which
/// joins the worker and returns the accumulated mono samples.
pub struct Recorder {
    active: Arc<AtomicBool>,
    /// One-shot handoff of the session's accumulated samples from the worker
    samples: Receiver<Vec<i16>>,
    worker: Option<JoinHandle<()>>,
    sample_rate: u32,
}

impl Recorder {
    /// Opens the input device and starts capturing.
    ///
    /// The device and its configuration are resolved on the calling thread so
    /// a missing or unusable device fails here, before any state transition.
    /// Recording happens at the device's native rate; a mismatch with the
    /// requested rate is logged.
    ///
    /// # Errors
    /// - If the specified device is not available
    /// - If device configuration fails
    /// - If the input stream cannot be created or started
    pub fn start(device_name: &str, requested_sample_rate: u32) -> Result<Self> {
        // Get device while suppressing ALSA library warnings
        let device = suppress_alsa_warnings(|| {
            let host = cpal::default_host();

            if device_name == "default" {
                host.default_input_device()
                    .ok_or_else(|| anyhow!("No audio input device available"))
            } else {
                find_device_by_name(&host, device_name)
            }
        })?;

        let label = device
            .name()
            .unwrap_or_else(|_| "Unknown device".to_string());
        tracing::info!("Recording device: {}", label);

        let device_config = device.default_input_config()?;
        let sample_rate = device_config.sample_rate().0;
        let channels = device_config.channels() as usize;

        if sample_rate != requested_sample_rate {
            tracing::warn!(
                "Requested sample rate {}Hz but device uses {}Hz. Recording at device rate.",
                requested_sample_rate,
                sample_rate
            );
        }

        tracing::debug!(
            "Device configuration: {}Hz, {} channels, {:?}",
            sample_rate,
            channels,
            device_config.sample_format()
        );

        let active = Arc::new(AtomicBool::new(true));

        // The worker reports stream startup success or failure exactly once
        // before entering its drain loop, and sends the accumulated samples
        // exactly once on exit.
        let (ready_tx, ready_rx) = bounded::<Result<()>>(1);
        let (samples_tx, samples_rx) = bounded::<Vec<i16>>(1);
        let worker_active = Arc::clone(&active);
        let worker = std::thread::spawn(move || {
            capture_worker(device, device_config, channels, worker_active, samples_tx, ready_tx);
        });

        match ready_rx.recv() {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                let _ = worker.join();
                return Err(e);
            }
            Err(_) => {
                let _ = worker.join();
                return Err(anyhow!("Capture worker exited before the stream started"));
            }
        }

        Ok(Self {
            active,
            samples: samples_rx,
            worker: Some(worker),
            sample_rate,
        })
    }

    /// Returns the actual sample rate of the session.
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Stops the session: clears the active flag, joins the worker, and
    /// takes over the worker's accumulated sample buffer.
    ///
    /// The returned buffer is empty when no audio was delivered during the
    /// session; the caller decides what to do with that.
    ///
    /// # Errors
    /// - If the capture worker panicked
    pub fn stop(mut self) -> Result<Vec<i16>> {
        self.active.store(false, Ordering::SeqCst);

        if let Some(worker) = self.worker.take() {
            worker
                .join()
                .map_err(|_| anyhow!("Capture worker panicked"))?;
        }

        // The worker sent the buffer before exiting, so this never blocks.
        let samples = self
            .samples
            .recv()
            .map_err(|_| anyhow!("Capture worker exited without handing over samples"))?;

        let duration_secs = samples.len() as f32 / self.sample_rate as f32;
        tracing::info!(
            "Recording stopped: {:.2}s ({} samples at {}Hz)",
            duration_secs,
            samples.len(),
            self.sample_rate
        );

        Ok(samples)
    }
}

/// Worker body: builds the stream for the device's native sample format,
/// reports startup, then sweeps delivered blocks into the session
/// accumulator every poll interval until the flag clears. Dropping the
/// stream on exit closes the device; the accumulated buffer is sent over
/// `samples_tx` exactly once before the worker returns.
fn capture_worker(
    device: cpal::Device,
    device_config: cpal::SupportedStreamConfig,
    channels: usize,
    active: Arc<AtomicBool>,
    samples_tx: Sender<Vec<i16>>,
    ready_tx: Sender<Result<()>>,
) {
    let sample_format = device_config.sample_format();
    let stream_config: cpal::StreamConfig = device_config.into();

    let (block_tx, block_rx) = bounded(BLOCK_CHANNEL_CAPACITY);

    let built = match sample_format {
        cpal::SampleFormat::I16 => {
            build_capture_stream::<i16>(&device, &stream_config, channels, &active, block_tx)
        }
        cpal::SampleFormat::U16 => {
            build_capture_stream::<u16>(&device, &stream_config, channels, &active, block_tx)
        }
        cpal::SampleFormat::F32 => {
            build_capture_stream::<f32>(&device, &stream_config, channels, &active, block_tx)
        }
        other => Err(anyhow!("Unsupported input sample format: {other:?}")),
    };

    let stream = match built {
        Ok(stream) => stream,
        Err(e) => {
            let _ = ready_tx.send(Err(e));
            return;
        }
    };

    if let Err(e) = stream.play() {
        let _ = ready_tx.send(Err(e.into()));
        return;
    }

    let _ = ready_tx.send(Ok(()));
    tracing::debug!("Audio stream started");

    let mut samples: Vec<i16> = Vec::new();
    while active.load(Ordering::SeqCst) {
        std::thread::sleep(STOP_POLL_INTERVAL);
        drain_blocks(&mut samples, &block_rx);
    }

    drop(stream);

    // Catch blocks delivered between the last sweep and stream close.
    drain_blocks(&mut samples, &block_rx);

    let _ = samples_tx.send(samples);
    tracing::debug!("Audio stream closed");
}

/// Moves every block currently buffered in the channel into the session
/// accumulator.
fn drain_blocks(samples: &mut Vec<i16>, blocks: &Receiver<SampleBlock>) {
    while let Ok(block) = blocks.try_recv() {
        samples.extend_from_slice(&block);
    }
}

/// Builds an input stream whose callback pushes mono blocks while the
/// session is active. A full channel drops the block rather than blocking
/// inside the audio callback.
fn build_capture_stream<T>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    channels: usize,
    active: &Arc<AtomicBool>,
    block_tx: Sender<SampleBlock>,
) -> Result<cpal::Stream>
where
    T: SizedSample,
    i16: FromSample<T>,
{
    let active = Arc::clone(active);

    let stream = device.build_input_stream(
        config,
        move |data: &[T], _: &cpal::InputCallbackInfo| {
            if !active.load(Ordering::SeqCst) {
                return;
            }

            let block = downmix_to_mono(data, channels);
            match block_tx.try_send(block) {
                Ok(()) => {}
                Err(TrySendError::Full(_)) => {
                    tracing::warn!("Sample block dropped: capture channel full");
                }
                Err(TrySendError::Disconnected(_)) => {}
            }
        },
        |err| {
            tracing::error!("Audio stream error: {}", err);
        },
        None,
    )?;

    Ok(stream)
}

/// Converts one interleaved block to mono i16 by averaging all channels per
/// frame.
fn downmix_to_mono<T>(data: &[T], num_channels: usize) -> SampleBlock
where
    T: SizedSample,
    i16: FromSample<T>,
{
    match num_channels {
        0 | 1 => data.iter().map(|&s| i16::from_sample(s)).collect(),
        2 => data
            .chunks_exact(2)
            .map(|chunk| {
                let left = i16::from_sample(chunk[0]) as i32;
                let right = i16::from_sample(chunk[1]) as i32;
                ((left + right) / 2) as i16
            })
            .collect(),
        _ => data
            .chunks_exact(num_channels)
            .map(|chunk| {
                let sum: i32 = chunk.iter().map(|&s| i16::from_sample(s) as i32).sum();
                (sum / num_channels as i32) as i16
            })
            .collect(),
    }
}

/// Finds an audio input device by name or numeric index.
///
/// # Arguments
/// * `host` - The cpal audio host
/// * `device_spec` - Either a device name or a numeric index (0, 1, 2, etc.)
///
/// # Errors
/// - If no device with the specified name/index is found
fn find_device_by_name(host: &cpal::Host, device_spec: &str) -> Result<cpal::Device> {
    // Try to parse as a numeric index first
    if let Ok(index) = device_spec.parse::<usize>() {
        let devices: Vec<_> = host
            .input_devices()
            .map_err(|e| anyhow!("Failed to enumerate devices: {e}"))?
            .collect();

        if index < devices.len() {
            return Ok(devices.into_iter().nth(index).unwrap());
        } else {
            return Err(anyhow!(
                "Device index {} is out of range (0-{})",
                index,
                devices.len().saturating_sub(1)
            ));
        }
    }

    // Try to find by name
    let devices = host
        .input_devices()
        .map_err(|e| anyhow!("Failed to enumerate devices: {e}"))?;

    for device in devices {
        if let Ok(name) = device.name() {
            if name == device_spec {
                return Ok(device);
            }
        }
    }

    Err(anyhow!(
        "Audio input device '{device_spec}' not found. Use 'chatrec list-devices' to see available devices."
    ))
}

/// Temporarily redirects stderr to /dev/null to suppress ALSA library warnings on Linux.
/// On non-Linux platforms, this is a no-op since ALSA doesn't exist.
#[cfg(target_os = "linux")]
fn suppress_alsa_warnings<F, T>(f: F) -> Result<T>
where
    F: FnOnce() -> Result<T>,
{
    let dev_null = OpenOptions::new()
        .write(true)
        .open("/dev/null")
        .map_err(|e| anyhow!("Failed to open /dev/null: {e}"))?;

    let dev_null_fd = dev_null.as_raw_fd();

    let old_stderr = unsafe { libc::dup(libc::STDERR_FILENO) };
    if old_stderr == -1 {
        return Err(anyhow!("Failed to duplicate stderr"));
    }

    let redirect_result = unsafe { libc::dup2(dev_null_fd, libc::STDERR_FILENO) };
    if redirect_result == -1 {
        unsafe { libc::close(old_stderr) };
        return Err(anyhow!("Failed to redirect stderr"));
    }

    let result = f();

    unsafe {
        libc::dup2(old_stderr, libc::STDERR_FILENO);
        libc::close(old_stderr);
    }

    result
}

/// On non-Linux platforms, no stderr suppression is needed since ALSA doesn't exist.
#[cfg(not(target_os = "linux"))]
fn suppress_alsa_warnings<F, T>(f: F) -> Result<T>
where
    F: FnOnce() -> Result<T>,
{
    f()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_downmix_mono_passthrough() {
        let data: Vec<i16> = vec![1, -2, 3];
        assert_eq!(downmix_to_mono(&data, 1), vec![1, -2, 3]);
    }

    #[test]
    fn test_downmix_stereo_averages_pairs() {
        let data: Vec<i16> = vec![100, 200, -50, 50];
        assert_eq!(downmix_to_mono(&data, 2), vec![150, 0]);
    }

    #[test]
    fn test_downmix_multichannel_averages_frames() {
        let data: Vec<i16> = vec![10, 20, 30, 40, 0, -40, -80, -120];
        assert_eq!(downmix_to_mono(&data, 4), vec![25, -60]);
    }

    #[test]
    fn test_long_session_accumulates_beyond_channel_capacity() {
        // A session delivering more blocks than the channel can hold at once
        // must lose nothing as long as the sweep runs between bursts.
        let (tx, rx) = bounded::<SampleBlock>(4);
        let mut samples = Vec::new();

        for round in 0..8i16 {
            for i in 0..4i16 {
                tx.try_send(vec![round * 4 + i]).unwrap();
            }
            drain_blocks(&mut samples, &rx);
        }

        assert_eq!(samples.len(), 32);
        assert_eq!(samples, (0..32i16).collect::<Vec<i16>>());
    }

    #[test]
    fn test_drain_empties_the_channel() {
        let (tx, rx) = bounded::<SampleBlock>(4);
        tx.try_send(vec![1, 2]).unwrap();
        tx.try_send(vec![3]).unwrap();

        let mut samples = Vec::new();
        drain_blocks(&mut samples, &rx);

        assert_eq!(samples, vec![1, 2, 3]);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_downmix_converts_f32_to_i16() {
        let data: Vec<f32> = vec![0.0, 1.0, -1.0];
        let block = downmix_to_mono(&data, 1);
        assert_eq!(block[0], 0);
        assert!(block[1] >= i16::MAX - 1);
        assert!(block[2] <= i16::MIN + 1);
    }
}
