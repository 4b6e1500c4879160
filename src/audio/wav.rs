//! Audio file import (symphonia) and WAV export (hound)

use anyhow::{bail, Context, Result};
use std::fs::File;
use std::path::{Path, PathBuf};
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::DecoderOptions;
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

/// Apply the export naming rules: no suffix means `.wav`, and only WAV can be written
pub fn resolve_export_path(path: &Path) -> Result<PathBuf> {
    match path.extension().and_then(|e| e.to_str()) {
        None => {
            let mut with_suffix = path.as_os_str().to_owned();
            with_suffix.push(".wav");
            Ok(PathBuf::from(with_suffix))
        }
        Some(ext) if ext.eq_ignore_ascii_case("wav") => Ok(path.to_path_buf()),
        Some(ext) => bail!("Cannot export '.{}' audio: only WAV files are supported", ext),
    }
}

/// Write mono f32 samples as a 32-bit float WAV; returns the path actually written
pub fn export(path: &Path, samples: &[f32], sample_rate: u32) -> Result<PathBuf> {
    let path = resolve_export_path(path)?;

    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 32,
        sample_format: hound::SampleFormat::Float,
    };

    let mut writer = hound::WavWriter::create(&path, spec)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    for &sample in samples {
        writer.write_sample(sample)?;
    }
    writer.finalize().context("Failed to finalize WAV file")?;

    log::info!(
        "Exported {} samples @ {}Hz to {}",
        samples.len(),
        sample_rate,
        path.display()
    );
    Ok(path)
}

/// Decode an mp3, flac, wav or m4a file as mono f32 (channels averaged) with its sample rate
pub fn load(path: &Path) -> Result<(Vec<f32>, u32)> {
    let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    let mss = MediaSourceStream::new(Box::new(file), Default::default());
    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(ext);
    }

    let opened = symphonia::default::get_probe()
        .format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .with_context(|| format!("Unsupported audio file {}", path.display()))?;
    let mut format = opened.format;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.sample_rate.is_some())
        .cloned()
        .with_context(|| format!("No audio track in {}", path.display()))?;
    let sample_rate = track
        .codec_params
        .sample_rate
        .context("Audio track has no sample rate")?;

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .with_context(|| format!("No decoder for {}", path.display()))?;

    let mut mono = Vec::new();
    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(_)) => break,
            Err(e) => return Err(e).with_context(|| format!("Failed to read {}", path.display())),
        };
        if packet.track_id() != track.id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(decoded) => decoded,
            Err(SymphoniaError::DecodeError(e)) => {
                log::warn!("Skipping corrupt packet in {}: {}", path.display(), e);
                continue;
            }
            Err(SymphoniaError::IoError(_)) => break,
            Err(e) => return Err(e).with_context(|| format!("Failed to decode {}", path.display())),
        };

        let spec = *decoded.spec();
        let channels = spec.channels.count().max(1);
        let mut buf = SampleBuffer::<f32>::new(decoded.capacity() as u64, spec);
        buf.copy_interleaved_ref(decoded);
        mono.extend(
            buf.samples()
                .chunks(channels)
                .map(|frame| frame.iter().sum::<f32>() / channels as f32),
        );
    }

    log::debug!(
        "Loaded {} samples @ {}Hz from {}",
        mono.len(),
        sample_rate,
        path.display()
    );
    Ok((mono, sample_rate))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("toolbox-wav-{}-{}", name, std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_missing_suffix_defaults_to_wav() {
        let resolved = resolve_export_path(Path::new("/tmp/clone")).unwrap();
        assert_eq!(resolved, PathBuf::from("/tmp/clone.wav"));
    }

    #[test]
    fn test_wav_suffix_is_kept() {
        let resolved = resolve_export_path(Path::new("/tmp/clone.WAV")).unwrap();
        assert_eq!(resolved, PathBuf::from("/tmp/clone.WAV"));
    }

    #[test]
    fn test_other_containers_are_rejected() {
        assert!(resolve_export_path(Path::new("/tmp/clone.flac")).is_err());
    }

    #[test]
    fn test_export_then_load() {
        let dir = scratch_dir("export");
        let samples: Vec<f32> = (0..1600).map(|i| (i as f32 / 1600.0) - 0.5).collect();

        let written = export(&dir.join("take"), &samples, 16000).unwrap();
        assert_eq!(written, dir.join("take.wav"));

        let (loaded, rate) = load(&written).unwrap();
        assert_eq!(rate, 16000);
        assert_eq!(loaded, samples);

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_load_downmixes_int_stereo() {
        let dir = scratch_dir("stereo");
        let path = dir.join("stereo.wav");
        let spec = hound::WavSpec {
            channels: 2,
            sample_rate: 22050,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(&path, spec).unwrap();
        for _ in 0..10 {
            writer.write_sample(16384i16).unwrap();
            writer.write_sample(0i16).unwrap();
        }
        writer.finalize().unwrap();

        let (mono, rate) = load(&path).unwrap();
        assert_eq!(rate, 22050);
        assert_eq!(mono.len(), 10);
        assert!((mono[0] - 0.25).abs() < 1e-6);

        let _ = fs::remove_dir_all(&dir);
    }
    fn crc8(bytes: &[u8]) -> u8 {
        bytes.iter().fold(0u8, |mut crc, &b| {
            crc ^= b;
            for _ in 0..8 {
                crc = if crc & 0x80 != 0 { (crc << 1) ^ 0x07 } else { crc << 1 };
            }
            crc
        })
    }

    fn crc16(bytes: &[u8]) -> u16 {
        bytes.iter().fold(0u16, |mut crc, &b| {
            crc ^= (b as u16) << 8;
            for _ in 0..8 {
                crc = if crc & 0x8000 != 0 { (crc << 1) ^ 0x8005 } else { crc << 1 };
            }
            crc
        })
    }

    /// Single-frame 16 kHz 16-bit stereo FLAC with verbatim subframes
    fn flac_bytes(left: &[i16], right: &[i16]) -> Vec<u8> {
        assert_eq!(left.len(), right.len());
        let block = left.len();
        assert!((16..=256).contains(&block));

        let mut out = b"fLaC".to_vec();
        // Last metadata block, STREAMINFO, 34 bytes
        out.extend_from_slice(&[0x80, 0x00, 0x00, 34]);
        out.extend_from_slice(&(block as u16).to_be_bytes());
        out.extend_from_slice(&(block as u16).to_be_bytes());
        out.extend_from_slice(&[0; 6]);
        let packed: u64 = (16000u64 << 44) | (1 << 41) | (15 << 36) | block as u64;
        out.extend_from_slice(&packed.to_be_bytes());
        out.extend_from_slice(&[0; 16]);

        // Fixed blocking, 8-bit block size, 16 kHz, independent stereo, 16 bps, frame 0
        let mut frame = vec![0xFF, 0xF8, 0x65, 0x18, 0x00, (block - 1) as u8];
        frame.push(crc8(&frame));
        for channel in [left, right] {
            frame.push(0x02);
            for sample in channel {
                frame.extend_from_slice(&sample.to_be_bytes());
            }
        }
        let crc = crc16(&frame);
        frame.extend_from_slice(&crc.to_be_bytes());

        out.extend_from_slice(&frame);
        out
    }

    #[test]
    fn test_load_flac_utterance() {
        let dir = scratch_dir("flac");
        let path = dir.join("84-121123-0000.flac");
        fs::write(&path, flac_bytes(&[16384; 160], &[0; 160])).unwrap();

        let (mono, rate) = load(&path).unwrap();
        assert_eq!(rate, 16000);
        assert_eq!(mono.len(), 160);
        assert!(mono.iter().all(|s| (s - 0.25).abs() < 1e-3));

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_load_rejects_unknown_content() {
        let dir = scratch_dir("garbage");
        let path = dir.join("noise.flac");
        fs::write(&path, b"definitely not audio").unwrap();

        assert!(load(&path).is_err());

        let _ = fs::remove_dir_all(&dir);
    }
}
