pub mod playback;
pub mod record;
pub mod wav;

use anyhow::Result;
use cpal::traits::{DeviceTrait, HostTrait};
use rubato::{FftFixedIn, Resampler};
use serde::{Deserialize, Serialize};

/// Sample rate the encoder and synthesizer work at
pub const TARGET_SAMPLE_RATE: u32 = 16000;

/// Audio configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioConfig {
    pub sample_rate_hz: u32,
    /// Length of a single microphone take
    pub record_seconds: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_device_name: Option<String>,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            sample_rate_hz: TARGET_SAMPLE_RATE,
            record_seconds: 5,
            device_name: None,
            output_device_name: None,
        }
    }
}

/// Device information for enumeration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceInfo {
    pub name: String,
    /// Whether some supported config covers the requested rate
    pub supports_rate: bool,
}

/// Devices usable by the toolbox at a given sample rate
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AudioDevices {
    pub sample_rate: u32,
    pub inputs: Vec<String>,
    pub outputs: Vec<String>,
}

impl AudioDevices {
    /// First usable input, which is what recordings go through by default
    pub fn input_device(&self) -> Option<&str> {
        self.inputs.first().map(String::as_str)
    }

    /// `preferred` when it is a usable input, otherwise the first usable input
    pub fn pick_input<'a>(&'a self, preferred: Option<&'a str>) -> Option<&'a str> {
        match preferred {
            Some(name) if self.inputs.iter().any(|i| i == name) => Some(name),
            Some(name) => {
                log::warn!("Configured input device '{}' is not usable, using the first one", name);
                self.input_device()
            }
            None => self.input_device(),
        }
    }

    pub fn output_index(&self, name: &str) -> Option<usize> {
        self.outputs.iter().position(|o| o == name)
    }
}

/// Friendly error message with optional error code
#[derive(Debug, Clone, Serialize)]
pub struct FriendlyError {
    pub message: String,
    pub code: String,
}

/// Map common CPAL/audio errors to user-friendly messages
pub fn friendly_audio_error(error: &anyhow::Error) -> FriendlyError {
    let error_str = format!("{:#}", error);
    let error_lower = error_str.to_lowercase();

    if error_lower.contains("device busy")
        || error_lower.contains("in use")
        || error_lower.contains("already in use")
    {
        return FriendlyError {
            message: "Another app is using this audio device. Close other audio apps and try again."
                .to_string(),
            code: "device_busy".to_string(),
        };
    }

    if error_lower.contains("no such device")
        || error_lower.contains("not found")
        || error_lower.contains("does not exist")
        || error_lower.contains("disconnected")
    {
        return FriendlyError {
            message: "Your device must be connected before you start the toolbox.".to_string(),
            code: "device_not_found".to_string(),
        };
    }

    if error_lower.contains("permission")
        || error_lower.contains("access denied")
        || error_lower.contains("denied")
    {
        return FriendlyError {
            message: "Permission denied. Check your system's microphone settings.".to_string(),
            code: "permission_denied".to_string(),
        };
    }

    if error_lower.contains("no default") || error_lower.contains("no input device") {
        return FriendlyError {
            message: "No audio device found. Please connect one.".to_string(),
            code: "no_device".to_string(),
        };
    }

    FriendlyError {
        message: "Audio system error. Try selecting a different audio device.".to_string(),
        code: "unknown".to_string(),
    }
}

/// List all available input devices, flagging support for `sample_rate`
pub fn list_input_devices(sample_rate: u32) -> Result<Vec<DeviceInfo>> {
    let host = cpal::default_host();
    let mut devices = Vec::new();

    for device in host.input_devices()? {
        let Ok(name) = device.name() else { continue };
        let supports_rate = match device.supported_input_configs() {
            Ok(mut configs) => configs.any(|config| {
                rate_in_range(
                    sample_rate,
                    config.min_sample_rate().0,
                    config.max_sample_rate().0,
                )
            }),
            Err(e) => {
                log::debug!("Input device '{}' has no usable configs: {}", name, e);
                false
            }
        };
        devices.push(DeviceInfo { name, supports_rate });
    }

    Ok(devices)
}

/// List all available output devices, flagging support for `sample_rate`
pub fn list_output_devices(sample_rate: u32) -> Result<Vec<DeviceInfo>> {
    let host = cpal::default_host();
    let mut devices = Vec::new();

    for device in host.output_devices()? {
        let Ok(name) = device.name() else { continue };
        let supports_rate = match device.supported_output_configs() {
            Ok(mut configs) => configs.any(|config| {
                rate_in_range(
                    sample_rate,
                    config.min_sample_rate().0,
                    config.max_sample_rate().0,
                )
            }),
            Err(e) => {
                log::debug!("Output device '{}' has no usable configs: {}", name, e);
                false
            }
        };
        devices.push(DeviceInfo { name, supports_rate });
    }

    Ok(devices)
}

fn rate_in_range(rate: u32, min: u32, max: u32) -> bool {
    (min..=max).contains(&rate)
}

/// Partition enumerated devices into the ones usable at `sample_rate`
///
/// Outputs that cannot play at the rate are reported, unless the device is
/// also a usable input (duplex devices often only advertise one direction).
pub fn select_devices(
    sample_rate: u32,
    inputs: &[DeviceInfo],
    outputs: &[DeviceInfo],
) -> AudioDevices {
    let input_names: Vec<String> = inputs
        .iter()
        .filter(|d| d.supports_rate)
        .map(|d| d.name.clone())
        .collect();

    let mut output_names = Vec::new();
    for device in outputs {
        if device.supports_rate {
            output_names.push(device.name.clone());
        } else if !input_names.contains(&device.name) {
            log::warn!(
                "Unsupported output device {} for the sample rate: {}",
                device.name,
                sample_rate
            );
        }
    }

    AudioDevices {
        sample_rate,
        inputs: input_names,
        outputs: output_names,
    }
}

/// Enumerate the host and keep the devices usable at `sample_rate`
pub fn setup_devices(sample_rate: u32) -> AudioDevices {
    let inputs = list_input_devices(sample_rate).unwrap_or_else(|e| {
        log::warn!("Failed to list input devices: {}", e);
        Vec::new()
    });
    let outputs = list_output_devices(sample_rate).unwrap_or_else(|e| {
        log::warn!("Failed to list output devices: {}", e);
        Vec::new()
    });

    select_devices(sample_rate, &inputs, &outputs)
}

/// Find a device by name, or the host default when `name` is None
pub(crate) fn find_input_device(name: Option<&str>) -> Result<cpal::Device> {
    let host = cpal::default_host();
    match name {
        Some(name) => host
            .input_devices()?
            .find(|d| d.name().map(|n| n == name).unwrap_or(false))
            .ok_or_else(|| anyhow::anyhow!("Input device not found: {}", name)),
        None => host
            .default_input_device()
            .ok_or_else(|| anyhow::anyhow!("No default input device")),
    }
}

pub(crate) fn find_output_device(name: Option<&str>) -> Result<cpal::Device> {
    let host = cpal::default_host();
    match name {
        Some(name) => host
            .output_devices()?
            .find(|d| d.name().map(|n| n == name).unwrap_or(false))
            .ok_or_else(|| anyhow::anyhow!("Output device not found: {}", name)),
        None => host
            .default_output_device()
            .ok_or_else(|| anyhow::anyhow!("No default output device")),
    }
}

/// Resample mono f32 audio between rates (pass-through when equal)
pub fn resample(samples: &[f32], from_rate: u32, to_rate: u32) -> Result<Vec<f32>> {
    if from_rate == to_rate || samples.is_empty() {
        return Ok(samples.to_vec());
    }

    let chunk_size = 1024;
    let mut resampler =
        FftFixedIn::<f32>::new(from_rate as usize, to_rate as usize, chunk_size, 2, 1)?;

    let expected = (samples.len() as u64 * to_rate as u64 / from_rate as u64) as usize;
    let delay = resampler.output_delay();
    let mut output = Vec::with_capacity(delay + expected + chunk_size);
    let mut position = 0;

    // Keep feeding (zero-padded past the end) until the delayed tail is flushed
    while output.len() < delay + expected {
        let needed = resampler.input_frames_next();
        let start = position.min(samples.len());
        let end = (position + needed).min(samples.len());
        let mut chunk = samples[start..end].to_vec();
        chunk.resize(needed, 0.0);
        position += needed;

        let input = vec![chunk];
        let processed = resampler.process(&input, None)?;
        output.extend_from_slice(&processed[0]);
    }

    Ok(output[delay..delay + expected].to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn device(name: &str, supports_rate: bool) -> DeviceInfo {
        DeviceInfo {
            name: name.to_string(),
            supports_rate,
        }
    }

    #[test]
    fn test_audio_config() {
        let config = AudioConfig::default();
        assert_eq!(config.sample_rate_hz, 16000);
        assert_eq!(config.record_seconds, 5);
        assert!(config.device_name.is_none());
    }

    #[test]
    fn test_pick_input_prefers_configured_device() {
        let devices = AudioDevices {
            sample_rate: 16000,
            inputs: vec!["mic".to_string(), "usb".to_string()],
            outputs: vec!["speakers".to_string()],
        };
        assert_eq!(devices.pick_input(Some("usb")), Some("usb"));
        assert_eq!(devices.pick_input(Some("gone")), Some("mic"));
        assert_eq!(devices.pick_input(None), Some("mic"));
        assert_eq!(devices.output_index("speakers"), Some(0));
        assert_eq!(devices.output_index("hdmi"), None);
    }

    #[test]
    fn test_select_devices_filters_by_rate() {
        let inputs = vec![device("mic", true), device("line-in", false)];
        let outputs = vec![device("speakers", true), device("hdmi", false)];

        let devices = select_devices(16000, &inputs, &outputs);
        assert_eq!(devices.inputs, vec!["mic".to_string()]);
        assert_eq!(devices.outputs, vec!["speakers".to_string()]);
        assert_eq!(devices.input_device(), Some("mic"));
    }

    #[test]
    fn test_select_devices_without_inputs() {
        let devices = select_devices(16000, &[], &[device("speakers", true)]);
        assert!(devices.input_device().is_none());
        assert_eq!(devices.outputs.len(), 1);
    }

    #[test]
    fn test_rate_in_range() {
        assert!(rate_in_range(16000, 8000, 48000));
        assert!(rate_in_range(48000, 48000, 48000));
        assert!(!rate_in_range(16000, 44100, 48000));
    }

    #[test]
    fn test_friendly_error_mapping() {
        let err = anyhow::anyhow!("Output device not found: USB Headset");
        assert_eq!(friendly_audio_error(&err).code, "device_not_found");

        let err = anyhow::anyhow!("something odd");
        assert_eq!(friendly_audio_error(&err).code, "unknown");
    }

    #[test]
    fn test_resample_passthrough() {
        let samples = vec![0.1, 0.2, 0.3];
        assert_eq!(resample(&samples, 16000, 16000).unwrap(), samples);
    }

    #[test]
    fn test_resample_changes_length_by_ratio() {
        let samples: Vec<f32> = (0..48000).map(|i| (i as f32 * 0.01).sin() * 0.5).collect();
        let out = resample(&samples, 48000, 16000).unwrap();
        assert_eq!(out.len(), 16000);
    }
}
