//! Configuration file management for wavetide.
//!
//! Configuration is stored in `~/.config/wavetide/wavetide.toml`. A missing
//! file means defaults; a malformed one is an error.

use anyhow::{anyhow, Context};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::waveform::WaveformConfig;

/// Microphone and synthetic producer settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaptureConfig {
    /// Audio device to use. Options:
    /// - "default" for system default device
    /// - numeric index (0, 1, 2, etc.) from `wavetide list-devices`
    /// - device name from `wavetide list-devices`
    #[serde(default = "default_device")]
    pub device: String,
    /// Reference level in dBFS that maps to a full-scale level (typical: -20 to -6 dBFS)
    #[serde(default = "default_reference_level_db")]
    pub reference_level_db: i8,
    /// Length of the PCM chunk analysed into one pipeline sample
    #[serde(default = "default_chunk_ms")]
    pub chunk_ms: u64,
    /// Producer rate of the synthetic voice used by `wavetide simulate`
    #[serde(default = "default_synthetic_rate_hz")]
    pub synthetic_rate_hz: u32,
}

fn default_device() -> String {
    "default".to_string()
}

fn default_reference_level_db() -> i8 {
    -20
}

fn default_chunk_ms() -> u64 {
    40
}

fn default_synthetic_rate_hz() -> u32 {
    30
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            device: default_device(),
            reference_level_db: default_reference_level_db(),
            chunk_ms: default_chunk_ms(),
            synthetic_rate_hz: default_synthetic_rate_hz(),
        }
    }
}

/// Terminal surface settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisplayConfig {
    /// Render ticks per second
    #[serde(default = "default_frame_rate")]
    pub frame_rate: u32,
    /// Amplitude drawn as a full-height bar (0-100)
    #[serde(default = "default_full_scale")]
    pub full_scale: u64,
}

fn default_frame_rate() -> u32 {
    60
}

fn default_full_scale() -> u64 {
    80
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            frame_rate: default_frame_rate(),
            full_scale: default_full_scale(),
        }
    }
}

/// Complete application configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub capture: CaptureConfig,
    #[serde(default)]
    pub display: DisplayConfig,
    #[serde(default)]
    pub waveform: WaveformConfig,
}

impl AppConfig {
    /// Loads configuration from the user's config directory.
    ///
    /// Returns defaults when the file does not exist yet.
    ///
    /// # Errors
    /// - If the config directory cannot be determined
    /// - If the config file cannot be read
    /// - If the TOML is malformed
    pub fn load() -> anyhow::Result<Self> {
        let path = config_path()?;
        if !path.exists() {
            tracing::debug!("No config file at {}; using defaults", path.display());
            return Ok(Self::default());
        }
        Self::load_from(&path)
    }

    /// Loads configuration from an explicit path.
    ///
    /// # Errors
    /// - If the file cannot be read
    /// - If the TOML is malformed
    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: AppConfig = toml::from_str(&content)
            .with_context(|| format!("Invalid config file {}", path.display()))?;
        tracing::debug!("Configuration loaded from {}", path.display());
        Ok(config)
    }

    /// Writes the configuration to `path`, creating parent directories.
    ///
    /// # Errors
    /// - If the directory cannot be created
    /// - If the file cannot be written
    pub fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| anyhow!("Failed to create config directory: {e}"))?;
        }
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;
        tracing::info!("Configuration saved to {}", path.display());
        Ok(())
    }
}

/// Path of the config file: `~/.config/wavetide/wavetide.toml`.
///
/// # Errors
/// - If the home directory cannot be determined
pub fn config_path() -> anyhow::Result<PathBuf> {
    let home = dirs::home_dir().ok_or_else(|| anyhow!("Could not determine home directory"))?;
    Ok(home.join(".config").join("wavetide").join("wavetide.toml"))
}
