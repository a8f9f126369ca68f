//! List available audio input and output devices.

use anyhow::anyhow;
use cpal::traits::{DeviceTrait, HostTrait};

#[cfg(target_os = "linux")]
use std::fs::OpenOptions;
#[cfg(target_os = "linux")]
use std::os::unix::io::AsRawFd;

/// Lists all available audio input and output devices on the system.
///
/// Input devices are what `chatrec.toml` can select for recording; output
/// devices are shown for completeness since playback uses the default one.
///
/// # Errors
/// - If the audio host cannot be initialized
pub fn handle_list_devices() -> Result<(), anyhow::Error> {
    // Enumerate devices while suppressing ALSA library warnings
    let (host, inputs, outputs) = suppress_stderr(|| {
        let host = cpal::default_host();

        let inputs: Vec<cpal::Device> = host
            .input_devices()
            .map_err(|e| anyhow!("Failed to enumerate audio input devices: {e}"))?
            .filter(|d| d.name().is_ok())
            .collect();

        let outputs: Vec<cpal::Device> = host
            .output_devices()
            .map_err(|e| anyhow!("Failed to enumerate audio output devices: {e}"))?
            .filter(|d| d.name().is_ok())
            .collect();

        Ok((host, inputs, outputs))
    })?;

    if inputs.is_empty() && outputs.is_empty() {
        println!("No audio devices found on this system.");
        return Ok(());
    }

    println!();
    println!("Available audio input devices:");
    println!();

    let default_input = host.default_input_device().and_then(|d| d.name().ok());
    print_devices(&inputs, default_input.as_deref(), true);

    println!("Available audio output devices:");
    println!();

    let default_output = host.default_output_device().and_then(|d| d.name().ok());
    print_devices(&outputs, default_output.as_deref(), false);

    Ok(())
}

/// Prints one device group with IDs, names, and default configurations.
fn print_devices(devices: &[cpal::Device], default_name: Option<&str>, input: bool) {
    if devices.is_empty() {
        println!("  (none)");
        println!();
        return;
    }

    for (index, device) in devices.iter().enumerate() {
        let device_name = device.name().unwrap_or_else(|_| "Unknown".to_string());
        let is_default = default_name == Some(device_name.as_str());
        let default_indicator = if is_default { " [DEFAULT]" } else { "" };

        let config = if input {
            device.default_input_config()
        } else {
            device.default_output_config()
        };

        let config_info = match config {
            Ok(config) => format!(
                " ({}Hz, {} channels)",
                config.sample_rate().0,
                config.channels()
            ),
            Err(_) => " (configuration unavailable)".to_string(),
        };

        println!("  ID: {index}");
        println!("    Name: {device_name}{default_indicator}");
        println!("    Config:{config_info}");
        println!();
    }
}

/// Temporarily redirects stderr to /dev/null to suppress ALSA library warnings on Linux.
/// On non-Linux platforms, this is a no-op since ALSA doesn't exist.
#[cfg(target_os = "linux")]
fn suppress_stderr<F, T>(f: F) -> anyhow::Result<T>
where
    F: FnOnce() -> anyhow::Result<T>,
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
fn suppress_stderr<F, T>(f: F) -> anyhow::Result<T>
where
    F: FnOnce() -> anyhow::Result<T>,
{
    f()
}
