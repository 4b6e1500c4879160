use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::audio::AudioConfig;

/// Datasets the browser knows how to walk (`<dataset>/<speaker>/**/<audio>`)
pub const RECOGNIZED_DATASETS: &[&str] = &[
    "LibriSpeech/dev-clean",
    "LibriSpeech/dev-other",
    "LibriSpeech/test-clean",
    "LibriSpeech/test-other",
    "LibriSpeech/train-clean-100",
    "LibriSpeech/train-clean-360",
    "LibriSpeech/train-other-500",
    "LibriTTS/dev-clean",
    "LibriTTS/dev-other",
    "LibriTTS/test-clean",
    "LibriTTS/test-other",
    "LibriTTS/train-clean-100",
    "LibriTTS/train-clean-360",
    "LibriTTS/train-other-500",
    "LJSpeech-1.1",
    "VoxCeleb1/wav",
    "VoxCeleb1/test_wav",
    "VoxCeleb2/dev/aac",
    "VoxCeleb2/test/aac",
    "VCTK-Corpus/wav48",
];

pub const DEFAULT_TEXT: &str = "I visited museums and sat in public gardens";

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub toolbox: ToolboxConfig,
    pub audio: AudioConfig,
    pub ui: UiConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolboxConfig {
    /// Root holding the recognized datasets; browsing is disabled when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub datasets_root: Option<PathBuf>,
    pub models_dir: PathBuf,
    /// Training run whose checkpoints populate the model boxes
    pub run_id: String,
    #[serde(default = "default_recognized_datasets")]
    pub recognized_datasets: Vec<String>,
    /// Fixed seed for synthesizer and vocoder (random when unset)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    /// Allow the vocoder output to be trimmed of long silences
    #[serde(default = "default_true")]
    pub trim_silences: bool,
    pub max_saved_utterances: usize,
    pub max_saved_waves: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UiConfig {
    pub window_title: String,
    pub default_text: String,
    /// Advance the utterance box after each load from the browser
    #[serde(default = "default_true")]
    pub auto_next: bool,
}

fn default_true() -> bool {
    true
}

fn default_recognized_datasets() -> Vec<String> {
    RECOGNIZED_DATASETS.iter().map(|d| d.to_string()).collect()
}

impl Default for ToolboxConfig {
    fn default() -> Self {
        Self {
            datasets_root: None,
            models_dir: PathBuf::from("saved_models"),
            run_id: "default".to_string(),
            recognized_datasets: default_recognized_datasets(),
            seed: None,
            trim_silences: true,
            max_saved_utterances: 20,
            max_saved_waves: 5,
        }
    }
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            window_title: "SV2TTS toolbox".to_string(),
            default_text: DEFAULT_TEXT.to_string(),
            auto_next: true,
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            toolbox: ToolboxConfig::default(),
            audio: AudioConfig::default(),
            ui: UiConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load config from file or create default
    pub fn load_or_create(path: &Path) -> anyhow::Result<Self> {
        if path.exists() {
            let content = fs::read_to_string(path)?;
            let config: AppConfig = toml::from_str(&content)?;
            log::info!("Config loaded from: {}", path.display());
            Ok(config)
        } else {
            let config = Self::default();
            config.save(path)?;
            log::info!("Default config created at: {}", path.display());
            Ok(config)
        }
    }

    /// Write the config as pretty TOML (owner-only on unix)
    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        let toml_str = toml::to_string_pretty(self)?;
        fs::write(path, toml_str)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mut perms = fs::metadata(path)?.permissions();
            perms.set_mode(0o600);
            fs::set_permissions(path, perms)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("toolbox-config-{}-{}", name, std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_defaults_match_toolbox_limits() {
        let config = AppConfig::default();
        assert_eq!(config.toolbox.max_saved_utterances, 20);
        assert_eq!(config.ui.default_text, DEFAULT_TEXT);
        assert!(config.toolbox.datasets_root.is_none());
        assert_eq!(config.toolbox.recognized_datasets.len(), RECOGNIZED_DATASETS.len());
    }

    #[test]
    fn test_load_or_create_round_trip() {
        let dir = scratch_dir("roundtrip");
        let path = dir.join("config.toml");

        let created = AppConfig::load_or_create(&path).unwrap();
        assert!(path.exists());

        let mut edited = created.clone();
        edited.toolbox.datasets_root = Some(PathBuf::from("/data/speech"));
        edited.toolbox.seed = Some(42);
        edited.save(&path).unwrap();

        let loaded = AppConfig::load_or_create(&path).unwrap();
        assert_eq!(loaded.toolbox.datasets_root, Some(PathBuf::from("/data/speech")));
        assert_eq!(loaded.toolbox.seed, Some(42));

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_missing_optional_sections_use_defaults() {
        let content = r#"
[toolbox]
models_dir = "saved_models"
run_id = "pretrained"
max_saved_utterances = 20
max_saved_waves = 5

[audio]
sample_rate_hz = 16000
record_seconds = 5

[ui]
window_title = "SV2TTS toolbox"
default_text = "hello"
"#;
        let config: AppConfig = toml::from_str(content).unwrap();
        assert!(config.toolbox.trim_silences);
        assert!(config.ui.auto_next);
        assert_eq!(config.toolbox.recognized_datasets.len(), RECOGNIZED_DATASETS.len());
    }
}
