//! Application configuration loading.

use std::{fs, path::PathBuf, time::Duration};

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::Deserialize;

use crate::{deck::DEFAULT_FACES, score::ScoreStore};

/// Configuration file written on first run.
const DEFAULT_CONFIG_TOML: &str = r#"# matchtui configuration.
# data_root = "~/.config/matchtui"

# Number of distinct card faces dealt into the grid (1-9).
face_count = 9

# Length of the opponent clip in seconds.
video_duration_secs = 90.0

# How long the full deck stays revealed at the start, in milliseconds.
preview_ms = 3000

# How long a mismatched pair stays face up, in milliseconds.
mismatch_ms = 1000

# Interval of the interface tick loop, in milliseconds.
tick_ms = 100
"#;

/// Runtime settings for the game and its interface.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Directory holding the leaderboard and profile files.
    pub data_root: PathBuf,
    /// Number of distinct faces dealt into the grid.
    pub face_count: usize,
    /// Length of the opponent clip in seconds.
    pub video_duration_secs: f64,
    /// Initial reveal-all duration in milliseconds.
    pub preview_ms: u64,
    /// Mismatch flip-back delay in milliseconds.
    pub mismatch_ms: u64,
    /// Interface tick interval in milliseconds.
    pub tick_ms: u64,
}

impl AppConfig {
    /// Load configuration from the config file and `MATCHTUI_*` overrides.
    pub fn load() -> Result<Self> {
        let builder = Config::builder()
            .set_default("data_root", ScoreStore::default_root().to_string_lossy().to_string())?
            .set_default("face_count", DEFAULT_FACES.len() as u64)?
            .set_default("video_duration_secs", 90.0)?
            .set_default("preview_ms", 3000u64)?
            .set_default("mismatch_ms", 1000u64)?
            .set_default("tick_ms", 100u64)?
            .add_source(File::from(config_path()).required(false))
            .add_source(Environment::with_prefix("MATCHTUI"));

        let config = builder.build().context("failed to build configuration")?;
        config
            .try_deserialize()
            .context("failed to parse configuration")
    }

    /// Faces dealt into the grid, limited to the available face set.
    pub fn faces(&self) -> Vec<String> {
        let count = self.face_count.clamp(1, DEFAULT_FACES.len());
        DEFAULT_FACES[..count]
            .iter()
            .map(|face| face.to_string())
            .collect()
    }

    /// Initial reveal-all duration.
    pub fn preview(&self) -> Duration {
        Duration::from_millis(self.preview_ms)
    }

    /// Mismatch flip-back delay.
    pub fn mismatch_delay(&self) -> Duration {
        Duration::from_millis(self.mismatch_ms)
    }

    /// Interface tick interval.
    pub fn tick(&self) -> Duration {
        Duration::from_millis(self.tick_ms)
    }
}

/// Path of the user configuration file.
pub fn config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("matchtui")
        .join("config.toml")
}

/// Write the default configuration file if none exists yet.
pub fn ensure_default_config() -> Result<()> {
    let path = config_path();
    if path.exists() {
        return Ok(());
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    fs::write(&path, DEFAULT_CONFIG_TOML)
        .with_context(|| format!("failed to write {}", path.display()))?;
    Ok(())
}
