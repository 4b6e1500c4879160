use anyhow::{Context, Result};
use directories::ProjectDirs;
use std::fs;
use std::path::PathBuf;

/// Application paths following OS conventions
#[derive(Clone, Debug)]
pub struct AppPaths {
    /// Configuration directory (config.toml)
    pub config: PathBuf,
    /// Data directory (exported audio)
    pub data: PathBuf,
}

impl AppPaths {
    /// Resolve OS-specific paths for the toolbox
    ///
    /// # Platform Paths
    ///
    /// ## Linux
    /// - Config: `~/.config/sv2tts-toolbox/`
    /// - Data: `~/.local/share/sv2tts-toolbox/` → exports/
    ///
    /// ## macOS
    /// - Config: `~/Library/Preferences/org.SV2TTS.sv2tts-toolbox/`
    /// - Data: `~/Library/Application Support/org.SV2TTS.sv2tts-toolbox/`
    ///
    /// ## Windows
    /// - Config: `%APPDATA%\SV2TTS\sv2tts-toolbox\config\`
    /// - Data: `%LOCALAPPDATA%\SV2TTS\sv2tts-toolbox\data\`
    pub fn new() -> Result<Self> {
        let proj_dirs = ProjectDirs::from("org", "SV2TTS", "sv2tts-toolbox")
            .context("Failed to determine project directories")?;

        Ok(Self {
            config: proj_dirs.config_dir().to_path_buf(),
            data: proj_dirs.data_dir().to_path_buf(),
        })
    }

    /// Create all necessary directories with subdirectories
    pub fn ensure_directories(&self) -> Result<()> {
        fs::create_dir_all(&self.config).context("Failed to create config directory")?;

        fs::create_dir_all(&self.data).context("Failed to create data directory")?;
        fs::create_dir_all(self.exports_dir()).context("Failed to create exports directory")?;

        log::info!("Application directories initialized");
        log::debug!("  Config: {}", self.config.display());
        log::debug!("  Data:   {}", self.data.display());

        Ok(())
    }

    /// Get path to config file
    pub fn config_file(&self) -> PathBuf {
        self.config.join("config.toml")
    }

    /// Default directory offered by the export dialog
    pub fn exports_dir(&self) -> PathBuf {
        self.data.join("exports")
    }
}
