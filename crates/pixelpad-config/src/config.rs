/// Application configuration: load, save, and sanitize.
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::history::HistorySettings;

/// Environment variable that overrides the config file location.
pub const CONFIG_ENV_VAR: &str = "PIXELPAD_CONFIG";

/// Config file name used next to the executable.
pub const CONFIG_FILE_NAME: &str = "pixelpad.json";

const OUTPUT_FORMATS: [&str; 3] = ["png", "jpg", "jpeg"];

/// Top-level application configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub history: HistorySettings,
    /// Extension used when no output path is given (`png`, `jpg` or `jpeg`).
    pub default_output_format: String,
    /// `tracing` filter used when `RUST_LOG` is unset.
    pub log_filter: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            history: HistorySettings::default(),
            default_output_format: "png".to_string(),
            log_filter: "info".to_string(),
        }
    }
}

impl AppConfig {
    /// Returns the config file path.
    ///
    /// Resolution order:
    /// 1. `PIXELPAD_CONFIG` (if set and non-empty)
    /// 2. exe directory + `pixelpad.json`
    /// 3. `pixelpad.json` in the working directory
    pub fn config_path() -> PathBuf {
        if let Some(path) = std::env::var_os(CONFIG_ENV_VAR).filter(|p| !p.is_empty()) {
            return PathBuf::from(path);
        }
        std::env::current_exe()
            .ok()
            .and_then(|p| p.parent().map(|d| d.join(CONFIG_FILE_NAME)))
            .unwrap_or_else(|| PathBuf::from(CONFIG_FILE_NAME))
    }

    /// Loads config from `path`, creating a default file if it doesn't exist.
    /// Returns defaults on any error (missing file, parse error, etc.).
    pub fn load_or_create(path: &Path) -> Self {
        if path.exists() {
            match std::fs::read_to_string(path) {
                Ok(contents) => match serde_json::from_str::<AppConfig>(&contents) {
                    Ok(mut config) => {
                        config.sanitize();
                        return config;
                    }
                    Err(e) => {
                        tracing::warn!("Failed to parse config at {}: {e}", path.display());
                    }
                },
                Err(e) => {
                    tracing::warn!("Failed to read config at {}: {e}", path.display());
                }
            }
            // Broken file is left alone
            Self::default()
        } else {
            let config = Self::default();
            if let Err(e) = config.save(path) {
                tracing::warn!("Failed to create default config at {}: {e}", path.display());
            }
            config
        }
    }

    /// Saves config to `path` as pretty-printed JSON.
    pub fn save(&self, path: &Path) -> Result<(), std::io::Error> {
        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;
        std::fs::write(path, json)
    }

    /// Clamps values to valid ranges and resets invalid fields.
    pub fn sanitize(&mut self) {
        self.history.sanitize();

        let format = self.default_output_format.trim().to_ascii_lowercase();
        self.default_output_format = if OUTPUT_FORMATS.contains(&format.as_str()) {
            format
        } else {
            tracing::warn!(
                "Unknown output format {:?}, falling back to png",
                self.default_output_format
            );
            "png".to_string()
        };

        if self.log_filter.trim().is_empty() {
            self.log_filter = "info".to_string();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.history, HistorySettings::default());
        assert_eq!(config.default_output_format, "png");
        assert_eq!(config.log_filter, "info");
    }

    #[test]
    fn test_sanitize_normalizes_format() {
        let mut config = AppConfig {
            default_output_format: " JPG ".to_string(),
            ..AppConfig::default()
        };
        config.sanitize();
        assert_eq!(config.default_output_format, "jpg");
    }

    #[test]
    fn test_sanitize_resets_unknown_format() {
        let mut config = AppConfig {
            default_output_format: "tiff".to_string(),
            ..AppConfig::default()
        };
        config.sanitize();
        assert_eq!(config.default_output_format, "png");
    }

    #[test]
    fn test_sanitize_resets_empty_log_filter() {
        let mut config = AppConfig {
            log_filter: "   ".to_string(),
            ..AppConfig::default()
        };
        config.sanitize();
        assert_eq!(config.log_filter, "info");
    }

    #[test]
    fn test_sanitize_clamps_history() {
        let mut config = AppConfig {
            history: HistorySettings {
                retain_minimum: 0,
                merge_window_ms: u64::MAX,
                ..HistorySettings::default()
            },
            ..AppConfig::default()
        };
        config.sanitize();
        assert_eq!(config.history.retain_minimum, 1);
        assert_eq!(config.history.merge_window_ms, 60_000);
    }

    #[test]
    fn test_serde_round_trip() {
        let config = AppConfig {
            history: HistorySettings {
                max_entries: 42,
                ..HistorySettings::default()
            },
            log_filter: "pixelpad=debug".to_string(),
            ..AppConfig::default()
        };
        let json = serde_json::to_string_pretty(&config).unwrap();
        let parsed: AppConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_missing_fields_get_defaults() {
        let json = r#"{"default_output_format": "jpeg"}"#;
        let parsed: AppConfig = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.default_output_format, "jpeg");
        assert_eq!(parsed.history, HistorySettings::default());
        assert_eq!(parsed.log_filter, "info");
    }
}
