//! Dataset discovery for the browser boxes
//!
//! Layout: `<root>/<dataset>/<speaker>/**/<utterance>.<ext>`

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Audio extensions, in the order they are listed
pub const AUDIO_EXTENSIONS: &[&str] = &["mp3", "flac", "wav", "m4a"];

/// Recognized datasets that exist under `root`, as paths relative to it
pub fn list_datasets(root: &Path, recognized: &[String]) -> Vec<PathBuf> {
    recognized
        .iter()
        .map(PathBuf::from)
        .filter(|d| root.join(d).exists())
        .collect()
}

/// Speaker directory names (file stems) of a dataset, sorted
pub fn list_speakers(root: &Path, dataset: &str) -> Result<Vec<String>> {
    let speakers_root = root.join(dataset);
    let entries = fs::read_dir(&speakers_root)
        .with_context(|| format!("Failed to read dataset directory: {}", speakers_root.display()))?;

    let mut speakers = Vec::new();
    for entry in entries {
        let path = entry?.path();
        if path.is_dir() {
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                speakers.push(stem.to_string());
            }
        }
    }

    speakers.sort();
    Ok(speakers)
}

/// Audio files under a speaker directory, relative to it
///
/// Grouped by extension in `AUDIO_EXTENSIONS` order, sorted within a group.
pub fn list_utterances(root: &Path, dataset: &str, speaker: &str) -> Result<Vec<PathBuf>> {
    let utterances_root = root.join(dataset).join(speaker);

    let mut files = Vec::new();
    collect_files(&utterances_root, &mut files)?;

    let mut utterances = Vec::new();
    for ext in AUDIO_EXTENSIONS {
        let mut group: Vec<PathBuf> = files
            .iter()
            .filter(|f| f.extension().and_then(|e| e.to_str()) == Some(*ext))
            .filter_map(|f| f.strip_prefix(&utterances_root).ok().map(Path::to_path_buf))
            .collect();
        group.sort();
        utterances.extend(group);
    }

    Ok(utterances)
}

fn collect_files(dir: &Path, out: &mut Vec<PathBuf>) -> Result<()> {
    let entries =
        fs::read_dir(dir).with_context(|| format!("Failed to read directory: {}", dir.display()))?;

    for entry in entries {
        let path = entry?.path();
        if path.is_dir() {
            collect_files(&path, out)?;
        } else {
            out.push(path);
        }
    }

    Ok(())
}
