//! Waveform playback on the selected output device
//!
//! Playback runs on a dedicated worker thread that owns the CPAL stream.
//! Starting a new playback always stops the previous one first.

use anyhow::{bail, Context, Result};
use cpal::traits::{DeviceTrait, StreamTrait};
use cpal::{SampleFormat, Stream};
use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use super::{find_output_device, resample};

/// Signal to stop the playback worker
#[derive(Debug, Clone, Copy)]
struct StopPlayback;

/// Samples shared between the worker and the stream callback
struct Cursor {
    samples: Vec<f32>,
    position: AtomicUsize,
    finished: AtomicBool,
}

impl Cursor {
    fn new(samples: Vec<f32>) -> Self {
        Self {
            samples,
            position: AtomicUsize::new(0),
            finished: AtomicBool::new(false),
        }
    }

    /// Next sample, or silence once the buffer is exhausted
    fn next_sample(&self) -> f32 {
        let index = self.position.fetch_add(1, Ordering::Relaxed);
        match self.samples.get(index) {
            Some(&sample) => sample,
            None => {
                self.finished.store(true, Ordering::Relaxed);
                0.0
            }
        }
    }
}

struct ActivePlayback {
    stop_tx: Sender<StopPlayback>,
    handle: thread::JoinHandle<()>,
}

/// Playback handle; at most one waveform plays at a time
#[derive(Default)]
pub struct Player {
    active: Option<ActivePlayback>,
}

impl Player {
    pub fn new() -> Self {
        Self::default()
    }

    /// Play `wav` (mono, `sample_rate`) on `device_name` or the default output
    pub fn play(&mut self, wav: Vec<f32>, sample_rate: u32, device_name: Option<String>) -> Result<()> {
        self.stop();

        if wav.is_empty() {
            bail!("Nothing to play: waveform is empty");
        }

        let (stop_tx, stop_rx) = bounded::<StopPlayback>(1);
        let (ready_tx, ready_rx) = bounded::<Result<(), String>>(1);

        let handle = thread::spawn(move || {
            run_playback_worker(wav, sample_rate, device_name, stop_rx, ready_tx);
        });

        match ready_rx.recv() {
            Ok(Ok(())) => {
                self.active = Some(ActivePlayback { stop_tx, handle });
                Ok(())
            }
            Ok(Err(e)) => {
                let _ = handle.join();
                bail!(e)
            }
            Err(_) => {
                let _ = handle.join();
                bail!("Playback worker exited before starting")
            }
        }
    }

    /// Stop the current playback, if any
    pub fn stop(&mut self) {
        if let Some(active) = self.active.take() {
            let _ = active.stop_tx.send(StopPlayback);
            let _ = active.handle.join();
            log::debug!("Playback stopped");
        }
    }
}

impl Drop for Player {
    fn drop(&mut self) {
        self.stop();
    }
}

fn run_playback_worker(
    wav: Vec<f32>,
    sample_rate: u32,
    device_name: Option<String>,
    stop_rx: Receiver<StopPlayback>,
    ready_tx: Sender<Result<(), String>>,
) {
    let (stream, cursor) = match start_stream(wav, sample_rate, device_name.as_deref()) {
        Ok(started) => started,
        Err(e) => {
            log::error!("Playback failed to start: {:#}", e);
            let _ = ready_tx.send(Err(format!("{:#}", e)));
            return;
        }
    };
    let _ = ready_tx.send(Ok(()));

    // Poll so the worker exits on its own once the buffer drains
    loop {
        match stop_rx.recv_timeout(Duration::from_millis(50)) {
            Ok(StopPlayback) | Err(RecvTimeoutError::Disconnected) => break,
            Err(RecvTimeoutError::Timeout) => {
                if cursor.finished.load(Ordering::Relaxed) {
                    log::debug!("Playback finished");
                    break;
                }
            }
        }
    }

    drop(stream);
}

fn start_stream(
    wav: Vec<f32>,
    sample_rate: u32,
    device_name: Option<&str>,
) -> Result<(Stream, Arc<Cursor>)> {
    let device = find_output_device(device_name)?;
    let config = device
        .default_output_config()
        .context("Failed to get default output config")?;
    let device_rate = config.sample_rate().0;

    log::info!(
        "Playing {} samples @ {}Hz on '{}' ({}Hz, {:?})",
        wav.len(),
        sample_rate,
        device.name().unwrap_or_default(),
        device_rate,
        config.sample_format()
    );

    let samples = resample(&wav, sample_rate, device_rate)?;
    let cursor = Arc::new(Cursor::new(samples));

    let stream = match config.sample_format() {
        SampleFormat::F32 => build_output_stream::<f32>(&device, &config.config(), cursor.clone(), |v| v)?,
        SampleFormat::I16 => build_output_stream::<i16>(&device, &config.config(), cursor.clone(), |v| {
            (v.clamp(-1.0, 1.0) * i16::MAX as f32) as i16
        })?,
        SampleFormat::U16 => build_output_stream::<u16>(&device, &config.config(), cursor.clone(), |v| {
            ((v.clamp(-1.0, 1.0) + 1.0) * 0.5 * u16::MAX as f32) as u16
        })?,
        format => bail!("Unsupported output sample format: {:?}", format),
    };

    stream.play()?;
    Ok((stream, cursor))
}

fn build_output_stream<T>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    cursor: Arc<Cursor>,
    convert: fn(f32) -> T,
) -> Result<Stream>
where
    T: cpal::SizedSample + Send + 'static,
{
    let channels = config.channels as usize;

    let stream = device.build_output_stream(
        config,
        move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
            for frame in data.chunks_mut(channels) {
                let value = convert(cursor.next_sample());
                // Same value on every channel
                for sample in frame.iter_mut() {
                    *sample = value;
                }
            }
        },
        move |err| log::error!("Playback stream error: {}", err),
        None,
    )?;

    Ok(stream)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cursor_drains_then_reports_finished() {
        let cursor = Cursor::new(vec![0.25, -0.5]);
        assert_eq!(cursor.next_sample(), 0.25);
        assert_eq!(cursor.next_sample(), -0.5);
        assert!(!cursor.finished.load(Ordering::Relaxed));

        assert_eq!(cursor.next_sample(), 0.0);
        assert!(cursor.finished.load(Ordering::Relaxed));
    }

    #[test]
    fn test_empty_waveform_is_rejected() {
        let mut player = Player::new();
        assert!(player.play(Vec::new(), 16000, None).is_err());
        assert!(player.active.is_none());
    }

    #[test]
    fn test_play_from_blocking_task() {
        let player = std::sync::Arc::new(std::sync::Mutex::new(Player::new()));
        let shared = player.clone();
        let runtime = tokio::runtime::Runtime::new().unwrap();
        let played = runtime
            .block_on(tokio::task::spawn_blocking(move || {
                shared.lock().unwrap().play(Vec::new(), 16000, None)
            }))
            .unwrap();

        assert!(played.is_err());
        assert!(player.lock().unwrap().active.is_none());
    }

    #[test]
    fn test_stop_without_playback_is_noop() {
        let mut player = Player::new();
        player.stop();
        assert!(player.active.is_none());
    }
}
