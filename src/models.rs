//! Model file lookup for a training run
//!
//! Each run lives in `<models_dir>/<run_id>/` and holds:
//! - `encoder.pt`: speaker encoder
//! - `**/*.hdf5`: emotion encoder checkpoints
//! - `synthesizer.pt`
//! - `vocoder.pt` (optional, Griffin-Lim is always offered)

use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const GRIFFIN_LIM: &str = "Griffin-Lim";

#[derive(Error, Debug, PartialEq)]
pub enum ModelError {
    #[error("No speaker encoder models found in {0}")]
    NoSpeakerEncoder(PathBuf),

    #[error("No emotion encoder models found in {0}")]
    NoEmotionEncoder(PathBuf),

    #[error("No synthesizer models found in {0}")]
    NoSynthesizer(PathBuf),
}

/// One model file and the label shown for it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelFile {
    pub label: String,
    pub path: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelCatalog {
    pub speaker_encoders: Vec<ModelFile>,
    pub emotion_encoders: Vec<ModelFile>,
    pub synthesizers: Vec<ModelFile>,
    /// `None` path means Griffin-Lim
    pub vocoders: Vec<(String, Option<PathBuf>)>,
}

/// Find the model files of `run_id` under `models_dir`
pub fn discover(run_id: &str, models_dir: &Path) -> Result<ModelCatalog, ModelError> {
    let run_dir = models_dir.join(run_id);

    let speaker_encoders = single_file(&run_dir, "encoder.pt");
    if speaker_encoders.is_empty() {
        return Err(ModelError::NoSpeakerEncoder(models_dir.to_path_buf()));
    }

    let mut checkpoints = Vec::new();
    find_with_extension(&run_dir, "hdf5", &mut checkpoints);
    checkpoints.sort();
    let emotion_encoders: Vec<ModelFile> = checkpoints
        .into_iter()
        .map(|path| ModelFile {
            label: ancestor_name(&path, 2),
            path,
        })
        .collect();
    if emotion_encoders.is_empty() {
        return Err(ModelError::NoEmotionEncoder(models_dir.to_path_buf()));
    }

    let synthesizers = single_file(&run_dir, "synthesizer.pt");
    if synthesizers.is_empty() {
        return Err(ModelError::NoSynthesizer(models_dir.to_path_buf()));
    }

    let mut vocoders: Vec<(String, Option<PathBuf>)> = single_file(&run_dir, "vocoder.pt")
        .into_iter()
        .map(|f| (f.label, Some(f.path)))
        .collect();
    vocoders.push((GRIFFIN_LIM.to_string(), None));

    log::info!(
        "Models for run '{}': {} speaker encoder(s), {} emotion encoder(s), {} synthesizer(s), {} vocoder option(s)",
        run_id,
        speaker_encoders.len(),
        emotion_encoders.len(),
        synthesizers.len(),
        vocoders.len()
    );

    Ok(ModelCatalog {
        speaker_encoders,
        emotion_encoders,
        synthesizers,
        vocoders,
    })
}

fn single_file(run_dir: &Path, file_name: &str) -> Vec<ModelFile> {
    let path = run_dir.join(file_name);
    if path.is_file() {
        vec![ModelFile {
            label: ancestor_name(&path, 1),
            path,
        }]
    } else {
        Vec::new()
    }
}

/// Name of the `level`-th ancestor directory (1 = parent)
fn ancestor_name(path: &Path, level: usize) -> String {
    path.ancestors()
        .nth(level)
        .and_then(|p| p.file_name())
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn find_with_extension(dir: &Path, extension: &str, out: &mut Vec<PathBuf>) {
    let Ok(entries) = fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            find_with_extension(&path, extension, out);
        } else if path.extension().and_then(|e| e.to_str()) == Some(extension) {
            out.push(path);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::browser::fixtures::DatasetTree;

    fn full_run(name: &str) -> DatasetTree {
        let tree = DatasetTree::new(name);
        tree.file("default/encoder.pt")
            .file("default/emotion/checkpoints/weights.hdf5")
            .file("default/synthesizer.pt")
            .file("default/vocoder.pt");
        tree
    }

    #[test]
    fn test_discover_full_run() {
        let tree = full_run("models-full");
        let catalog = discover("default", tree.path()).unwrap();

        assert_eq!(catalog.speaker_encoders[0].label, "default");
        assert_eq!(catalog.emotion_encoders[0].label, "emotion");
        assert_eq!(catalog.synthesizers.len(), 1);
        assert_eq!(catalog.vocoders.len(), 2);
        assert_eq!(catalog.vocoders[0].0, "default");
        assert_eq!(catalog.vocoders[1], (GRIFFIN_LIM.to_string(), None));
    }

    #[test]
    fn test_vocoder_is_optional() {
        let tree = DatasetTree::new("models-novocoder");
        tree.file("default/encoder.pt")
            .file("default/weights.hdf5")
            .file("default/synthesizer.pt");

        let catalog = discover("default", tree.path()).unwrap();
        assert_eq!(catalog.vocoders, vec![(GRIFFIN_LIM.to_string(), None)]);
    }

    #[test]
    fn test_missing_models_name_the_directory() {
        let tree = DatasetTree::new("models-missing");
        assert_eq!(
            discover("default", tree.path()),
            Err(ModelError::NoSpeakerEncoder(tree.path().to_path_buf()))
        );

        tree.file("default/encoder.pt");
        assert_eq!(
            discover("default", tree.path()),
            Err(ModelError::NoEmotionEncoder(tree.path().to_path_buf()))
        );

        tree.file("default/e/weights.hdf5");
        let err = discover("default", tree.path()).unwrap_err();
        assert_eq!(err, ModelError::NoSynthesizer(tree.path().to_path_buf()));
        assert!(err.to_string().starts_with("No synthesizer models found in"));
    }

    #[test]
    fn test_other_runs_are_ignored() {
        let tree = full_run("models-otherrun");
        assert!(discover("pretrained", tree.path()).is_err());
    }
}
