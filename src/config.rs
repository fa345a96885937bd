// SPDX-License-Identifier: GPL-3.0-only

//! User configuration
//!
//! Stored as JSON at `$XDG_CONFIG_HOME/photobooth/config.json`. A missing file
//! means defaults; unknown fields are ignored and missing fields take their
//! default value, so older files keep loading.

use crate::constants::{DEFAULT_DATE_FORMAT, DEFAULT_SAVE_FOLDER, DEFAULT_TITLE, capture};
use crate::errors::{AppError, AppResult};
use crate::pipelines::strip::TextureSource;
use chrono::format::{Item, StrftimeItems};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const CONFIG_DIR: &str = "photobooth";
const CONFIG_FILE: &str = "config.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Title printed at the top of every strip
    pub title: String,
    /// Font file for strip text (system fonts are tried when unset)
    pub font_path: Option<PathBuf>,
    /// Paper texture multiplied over the strip
    pub texture: TextureSource,
    /// V4L2 device index used by the booth
    pub camera_index: usize,
    /// Requested capture width
    pub capture_width: u32,
    /// Requested capture height
    pub capture_height: u32,
    /// Folder exported strips are saved to (default: ~/Pictures/Photobooth)
    pub output_dir: Option<PathBuf>,
    /// strftime pattern for the printed date
    pub date_format: String,
    /// Fire sysfs flash LEDs together with the screen flash
    pub hardware_flash: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            title: DEFAULT_TITLE.to_string(),
            font_path: None,
            texture: TextureSource::default(),
            camera_index: 0,
            capture_width: capture::DEFAULT_WIDTH,
            capture_height: capture::DEFAULT_HEIGHT,
            output_dir: None,
            date_format: DEFAULT_DATE_FORMAT.to_string(),
            hardware_flash: false,
        }
    }
}

impl Config {
    /// `$XDG_CONFIG_HOME/photobooth/config.json`, if a config dir exists
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(CONFIG_DIR).join(CONFIG_FILE))
    }

    /// Load from `path`, or from the default location when `None`
    pub fn load(path: Option<&Path>) -> AppResult<Self> {
        match path {
            Some(path) => Self::load_from(path),
            None => match Self::default_path() {
                Some(path) => Self::load_from(&path),
                None => {
                    debug!("No config directory, using defaults");
                    Ok(Self::default())
                }
            },
        }
    }

    /// Load and validate a config file; a missing file yields defaults
    pub fn load_from(path: &Path) -> AppResult<Self> {
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "Config file not found, using defaults");
                return Ok(Self::default());
            }
            Err(e) => {
                return Err(AppError::Config(format!(
                    "Cannot read '{}': {}",
                    path.display(),
                    e
                )));
            }
        };

        let config: Config = serde_json::from_str(&contents)
            .map_err(|e| AppError::Config(format!("Invalid '{}': {}", path.display(), e)))?;
        config.validate()?;

        info!(path = %path.display(), "Config loaded");
        Ok(config)
    }

    /// Write as pretty JSON, creating parent directories
    pub fn save_to(&self, path: &Path) -> AppResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                AppError::Config(format!("Cannot create '{}': {}", parent.display(), e))
            })?;
        }

        let json = serde_json::to_string_pretty(self)
            .map_err(|e| AppError::Config(format!("Cannot serialize config: {}", e)))?;
        std::fs::write(path, json)
            .map_err(|e| AppError::Config(format!("Cannot write '{}': {}", path.display(), e)))?;

        debug!(path = %path.display(), "Config saved");
        Ok(())
    }

    pub fn validate(&self) -> AppResult<()> {
        if StrftimeItems::new(&self.date_format).any(|item| matches!(item, Item::Error)) {
            return Err(AppError::Config(format!(
                "Invalid date format '{}'",
                self.date_format
            )));
        }
        if self.capture_width == 0 || self.capture_height == 0 {
            return Err(AppError::Config(format!(
                "Invalid capture size {}x{}",
                self.capture_width, self.capture_height
            )));
        }
        Ok(())
    }

    /// Output folder, defaulting to `~/Pictures/Photobooth`
    pub fn resolved_output_dir(&self) -> PathBuf {
        if let Some(dir) = &self.output_dir {
            return dir.clone();
        }

        dirs::picture_dir()
            .or_else(dirs::home_dir)
            .unwrap_or_else(|| PathBuf::from("."))
            .join(DEFAULT_SAVE_FOLDER)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_date_format_rejected() {
        let config = Config {
            date_format: "%Q".into(),
            ..Config::default()
        };
        assert!(matches!(config.validate(), Err(AppError::Config(_))));
    }

    #[test]
    fn test_explicit_output_dir_wins() {
        let config = Config {
            output_dir: Some(PathBuf::from("/tmp/strips")),
            ..Config::default()
        };
        assert_eq!(config.resolved_output_dir(), PathBuf::from("/tmp/strips"));
    }

    #[test]
    fn test_default_output_dir_ends_in_save_folder() {
        assert!(
            Config::default()
                .resolved_output_dir()
                .ends_with(DEFAULT_SAVE_FOLDER)
        );
    }
}
