//! Application configuration.
//!
//! Values are layered: built-in defaults, then `config.toml` under the user
//! config directory, then `GAMESHELF__*` environment variables
//! (e.g. `GAMESHELF__IMPORT__SCORE_SCALE=ten`).

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::import::ScoreScale;

/// Directory under the user config dir holding `config.toml`.
pub const CONFIG_DIR: &str = "gameshelf";

const DEFAULT_CONFIG: &str = r#"# gameshelf configuration

# Directory for gameshelf.log. Relative paths resolve against the working directory.
log_dir = "logs"

[import]
# Scale used by rating columns in imported files: "hundred" (0-100) or "ten" (0-10).
score_scale = "hundred"
# Pre-select columns whose names match a field.
auto_map = true

[ui]
dark_mode = true

[library]
# Add the two starter games on launch.
seed_samples = false
default_tags = [
  "RPG", "Adventure", "Action", "Indie", "Puzzle", "Strategy", "Multiplayer",
  "Singleplayer", "Driving", "Metroidvania", "Platformer", "Rhythm", "Horror",
  "Point & Click", "Building", "Cooking", "Sports",
]
"#;

/// Import behaviour.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportConfig {
    /// Rating scale of imported files.
    pub score_scale: ScoreScale,
    /// Pre-fill the mapping from header names.
    pub auto_map: bool,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            score_scale: ScoreScale::Hundred,
            auto_map: true,
        }
    }
}

/// Interface preferences.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UiConfig {
    /// Start with the dark palette.
    pub dark_mode: bool,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self { dark_mode: true }
    }
}

/// Initial library contents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LibraryConfig {
    /// Tags registered on launch.
    pub default_tags: Vec<String>,
    /// Add the starter games.
    pub seed_samples: bool,
}

impl Default for LibraryConfig {
    fn default() -> Self {
        Self {
            default_tags: [
                "RPG",
                "Adventure",
                "Action",
                "Indie",
                "Puzzle",
                "Strategy",
                "Multiplayer",
                "Singleplayer",
                "Driving",
                "Metroidvania",
                "Platformer",
                "Rhythm",
                "Horror",
                "Point & Click",
                "Building",
                "Cooking",
                "Sports",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
            seed_samples: false,
        }
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Where the log file goes.
    pub log_dir: PathBuf,
    /// Import settings.
    pub import: ImportConfig,
    /// Interface settings.
    pub ui: UiConfig,
    /// Initial library.
    pub library: LibraryConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            log_dir: PathBuf::from("logs"),
            import: ImportConfig::default(),
            ui: UiConfig::default(),
            library: LibraryConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load from the default location.
    pub fn load() -> Result<Self> {
        Self::load_from(config_path())
    }

    /// Load with `path` as the file layer. A missing file is not an error.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        // Missing keys fall back to the serde defaults on each section.
        let config = Config::builder()
            .add_source(File::from(path).required(false))
            .add_source(
                Environment::with_prefix("GAMESHELF")
                    .prefix_separator("__")
                    .separator("__"),
            )
            .build()
            .with_context(|| format!("failed to load configuration from {}", path.display()))?;
        config
            .try_deserialize()
            .with_context(|| format!("invalid configuration in {}", path.display()))
    }
}

/// Location of `config.toml`.
pub fn config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(CONFIG_DIR)
        .join("config.toml")
}

/// Write the commented default file unless one exists.
pub fn ensure_default_config() -> Result<Option<PathBuf>> {
    ensure_default_config_at(config_path())
}

/// Write the commented default file at `path` unless one exists.
///
/// Returns the path when a file was written. This runs before logging is
/// set up, so reporting the write is left to the caller.
pub fn ensure_default_config_at(path: impl AsRef<Path>) -> Result<Option<PathBuf>> {
    let path = path.as_ref();
    if path.exists() {
        return Ok(None);
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create config directory {}", parent.display()))?;
    }
    fs::write(path, DEFAULT_CONFIG)
        .with_context(|| format!("failed to write default config {}", path.display()))?;
    Ok(Some(path.to_path_buf()))
}
