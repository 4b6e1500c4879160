//! Fixed-length microphone takes
//!
//! Captures from the selected input device at whatever rate it runs, downmixes
//! to mono and resamples to the toolbox rate once the take is over.

use anyhow::{bail, Context, Result};
use cpal::traits::{DeviceTrait, StreamTrait};
use cpal::{SampleFormat, Stream};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use super::{find_input_device, resample};

/// Interval between progress callbacks
const PROGRESS_STEP: Duration = Duration::from_millis(100);

/// Record `duration_s` seconds of mono audio at `sample_rate`
///
/// `progress(elapsed_s, duration_s)` is called every 100ms while recording and
/// once more with `elapsed == duration` at the end. The returned buffer holds
/// exactly `duration_s * sample_rate` samples (zero-padded if the device
/// delivered less).
pub fn record_one<F>(
    sample_rate: u32,
    duration_s: u32,
    device_name: Option<&str>,
    mut progress: F,
) -> Result<Vec<f32>>
where
    F: FnMut(f32, f32),
{
    let device = find_input_device(device_name)?;
    let config = device
        .default_input_config()
        .context("Failed to get default input config")?;
    let device_rate = config.sample_rate().0;

    log::info!(
        "Recording {}s from '{}' ({}Hz, {} channels, {:?})",
        duration_s,
        device.name().unwrap_or_default(),
        device_rate,
        config.channels(),
        config.sample_format()
    );

    let captured = Arc::new(Mutex::new(Vec::with_capacity(
        (device_rate * duration_s) as usize,
    )));

    let stream = match config.sample_format() {
        SampleFormat::F32 => build_input_stream::<f32>(&device, &config.config(), captured.clone(), |s| s)?,
        SampleFormat::I16 => build_input_stream::<i16>(&device, &config.config(), captured.clone(), |s| {
            s as f32 / i16::MAX as f32
        })?,
        SampleFormat::U16 => build_input_stream::<u16>(&device, &config.config(), captured.clone(), |s| {
            (s as f32 - 32768.0) / 32768.0
        })?,
        format => bail!("Unsupported input sample format: {:?}", format),
    };

    stream.play()?;

    let duration = duration_s as f32;
    let steps = duration_s * 10;
    for step in 0..steps {
        progress(step as f32 * 0.1, duration);
        thread::sleep(PROGRESS_STEP);
    }
    progress(duration, duration);

    drop(stream);

    let raw = std::mem::take(&mut *captured.lock().unwrap());
    let take = fit_length(
        resample(&raw, device_rate, sample_rate)?,
        (sample_rate * duration_s) as usize,
    );

    log::info!("Recorded {} samples @ {}Hz", take.len(), sample_rate);
    Ok(take)
}

/// Truncate or zero-pad to exactly `len` samples
fn fit_length(mut samples: Vec<f32>, len: usize) -> Vec<f32> {
    samples.resize(len, 0.0);
    samples
}

fn build_input_stream<T>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    captured: Arc<Mutex<Vec<f32>>>,
    convert: fn(T) -> f32,
) -> Result<Stream>
where
    T: cpal::SizedSample + Send + 'static,
{
    let channels = config.channels as usize;

    let stream = device.build_input_stream(
        config,
        move |data: &[T], _: &cpal::InputCallbackInfo| {
            let mut buffer = captured.lock().unwrap();
            // Convert interleaved to mono by averaging channels
            for frame in data.chunks(channels) {
                let mono = frame.iter().map(|&s| convert(s)).sum::<f32>() / channels as f32;
                buffer.push(mono);
            }
        },
        move |err| log::error!("Recording stream error: {}", err),
        None,
    )?;

    Ok(stream)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fit_length_pads_and_truncates() {
        assert_eq!(fit_length(vec![1.0, 2.0], 4), vec![1.0, 2.0, 0.0, 0.0]);
        assert_eq!(fit_length(vec![1.0, 2.0, 3.0], 2), vec![1.0, 2.0]);
    }
}
