use crate::api_log::ApiLog;
use crate::error::{CoreError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variables consulted, in order, when `[audd] api_token` is empty
pub const API_TOKEN_ENV_VARS: [&str; 2] = ["AUDD_API_TOKEN", "API_TOKEN"];

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KaraokeConfig {
    #[serde(default)]
    pub audd: AuddConfig,
    #[serde(default)]
    pub lyrics: LyricsConfig,
    #[serde(default)]
    pub library: LibraryConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub playback: PlaybackConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuddConfig {
    #[serde(default)]
    pub api_token: String,
}

impl AuddConfig {
    /// The token, if one is configured
    #[must_use]
    pub fn token(&self) -> Option<&str> {
        let token = self.api_token.trim();
        (!token.is_empty()).then_some(token)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LyricsConfig {
    /// Provider priority: providers are tried in order
    #[serde(default = "default_providers")]
    pub providers: Vec<LyricsProviderType>,
}

fn default_providers() -> Vec<LyricsProviderType> {
    vec![LyricsProviderType::Lrclib, LyricsProviderType::Audd]
}

impl Default for LyricsConfig {
    fn default() -> Self {
        Self {
            providers: default_providers(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LyricsProviderType {
    Lrclib,
    Audd,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LibraryConfig {
    #[serde(default = "default_songs_dir")]
    pub songs_dir: PathBuf,
}

fn default_songs_dir() -> PathBuf {
    PathBuf::from("sounds")
}

impl Default for LibraryConfig {
    fn default() -> Self {
        Self {
            songs_dir: default_songs_dir(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Mirror diagnostics into ~/.config/karaoke/karaoke.log
    #[serde(default)]
    pub enabled: bool,
    /// Request/response log; empty disables it
    #[serde(default = "default_api_log_file")]
    pub api_log_file: String,
}

fn default_api_log_file() -> String {
    "api_responses.log".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            api_log_file: default_api_log_file(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaybackConfig {
    #[serde(default = "default_countdown_secs")]
    pub countdown_secs: u64,
    #[serde(default = "default_min_line_delay")]
    pub min_line_delay_secs: f64,
    #[serde(default = "default_max_line_delay")]
    pub max_line_delay_secs: f64,
    #[serde(default = "default_fallback_line_delay")]
    pub fallback_line_delay_secs: f64,
    /// Type out synchronized lines character by character
    #[serde(default = "default_true")]
    pub typewriter: bool,
}

/// Upper bound for any configured line delay (one hour)
const MAX_LINE_DELAY_SECS: f64 = 3600.0;

const fn default_countdown_secs() -> u64 {
    3
}

const fn default_min_line_delay() -> f64 {
    3.0
}

const fn default_max_line_delay() -> f64 {
    15.0
}

const fn default_fallback_line_delay() -> f64 {
    6.0
}

const fn default_true() -> bool {
    true
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            countdown_secs: default_countdown_secs(),
            min_line_delay_secs: default_min_line_delay(),
            max_line_delay_secs: default_max_line_delay(),
            fallback_line_delay_secs: default_fallback_line_delay(),
            typewriter: true,
        }
    }
}

impl PlaybackConfig {
    #[must_use]
    pub const fn countdown(&self) -> Duration {
        Duration::from_secs(self.countdown_secs)
    }

    fn validate(&self) -> Result<()> {
        let delays = [
            ("playback.min_line_delay_secs", self.min_line_delay_secs),
            ("playback.max_line_delay_secs", self.max_line_delay_secs),
            ("playback.fallback_line_delay_secs", self.fallback_line_delay_secs),
        ];
        for (field, value) in delays {
            if !value.is_finite() || !(0.0..=MAX_LINE_DELAY_SECS).contains(&value) {
                return Err(CoreError::ConfigInvalid {
                    message: format!(
                        "{field} must be between 0 and {MAX_LINE_DELAY_SECS} seconds, got {value}"
                    ),
                });
            }
        }
        if self.min_line_delay_secs > self.max_line_delay_secs {
            return Err(CoreError::ConfigInvalid {
                message: format!(
                    "playback.min_line_delay_secs ({}) exceeds playback.max_line_delay_secs ({})",
                    self.min_line_delay_secs, self.max_line_delay_secs
                ),
            });
        }
        Ok(())
    }
}

impl KaraokeConfig {
    /// Get the config file path (~/.config/karaoke/config.toml)
    #[must_use]
    pub fn config_path() -> PathBuf {
        crate::paths::config_path()
    }

    /// Load config from file or create template on first run
    ///
    /// # Errors
    ///
    /// Returns `ConfigNotFound` after writing a template when the file is
    /// missing, or an error if the file cannot be read, parsed or validated.
    pub fn load_or_create(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            // Create config directory if it doesn't exist
            if let Some(parent) = config_path.parent() {
                fs::create_dir_all(parent)?;
            }

            // Write template config
            fs::write(config_path, CONFIG_TEMPLATE)?;

            return Err(CoreError::ConfigNotFound {
                path: config_path.to_path_buf(),
            });
        }

        let content = fs::read_to_string(config_path)?;
        let mut config = Self::from_toml_str(&content)?;
        config.apply_token_override(|name| std::env::var(name).ok());
        Ok(config)
    }

    /// Parse and validate config text
    ///
    /// # Errors
    ///
    /// Returns `ConfigParseError` for TOML errors and `ConfigInvalid` for
    /// out-of-range playback settings.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        config.playback.validate()?;
        Ok(config)
    }

    /// Fill an empty API token from the first set environment variable
    pub fn apply_token_override(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if self.audd.token().is_some() {
            return;
        }
        if let Some(token) = API_TOKEN_ENV_VARS
            .iter()
            .filter_map(|name| lookup(name))
            .find(|value| !value.trim().is_empty())
        {
            self.audd.api_token = token;
        }
    }

    /// Request log configured by `[logging] api_log_file`
    #[must_use]
    pub fn api_log(&self) -> ApiLog {
        let file = self.logging.api_log_file.trim();
        if file.is_empty() {
            ApiLog::disabled()
        } else {
            ApiLog::new(file)
        }
    }
}

const CONFIG_TEMPLATE: &str = r#"# Karaoke Configuration
# ~/.config/karaoke/config.toml

[audd]
# Required for the audio recognition fallback: https://dashboard.audd.io/
# May also be supplied through the AUDD_API_TOKEN or API_TOKEN environment variables
api_token = ""

[lyrics]
# Provider priority: "lrclib", "audd"
# Providers are tried in order; synchronized lyrics win immediately
providers = ["lrclib", "audd"]

[library]
# Folder scanned for .mp3, .wav, .flac and .ogg files
songs_dir = "sounds"

[logging]
# Mirror diagnostics into ~/.config/karaoke/karaoke.log
enabled = false
# Append-only record of every lookup request and response ("" disables it)
api_log_file = "api_responses.log"

[playback]
countdown_secs = 3
# Delay between lines is clamped to this range
min_line_delay_secs = 3.0
max_line_delay_secs = 15.0
# Used when a line timestamp cannot be decoded
fallback_line_delay_secs = 6.0
# Type out synchronized lines character by character
typewriter = true
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_template_parses_to_defaults() {
        let config = KaraokeConfig::from_toml_str(CONFIG_TEMPLATE).unwrap();
        assert_eq!(
            config.lyrics.providers,
            vec![LyricsProviderType::Lrclib, LyricsProviderType::Audd]
        );
        assert_eq!(config.library.songs_dir, PathBuf::from("sounds"));
        assert_eq!(config.playback.min_line_delay_secs, 3.0);
        assert_eq!(config.playback.max_line_delay_secs, 15.0);
        assert_eq!(config.playback.fallback_line_delay_secs, 6.0);
        assert!(config.audd.token().is_none());
    }

    #[test]
    fn test_empty_file_uses_defaults() {
        let config = KaraokeConfig::from_toml_str("").unwrap();
        assert_eq!(config.playback.countdown(), Duration::from_secs(3));
        assert!(config.playback.typewriter);
        assert_eq!(config.logging.api_log_file, "api_responses.log");
    }

    #[test]
    fn test_provider_order() {
        let config = KaraokeConfig::from_toml_str("[lyrics]\nproviders = [\"audd\"]").unwrap();
        assert_eq!(config.lyrics.providers, vec![LyricsProviderType::Audd]);
    }

    #[test]
    fn test_unknown_provider_is_parse_error() {
        let result = KaraokeConfig::from_toml_str("[lyrics]\nproviders = [\"spotify\"]");
        assert!(matches!(result, Err(CoreError::ConfigParseError(_))));
    }

    #[test]
    fn test_inverted_delay_range_is_invalid() {
        let result = KaraokeConfig::from_toml_str(
            "[playback]\nmin_line_delay_secs = 10.0\nmax_line_delay_secs = 2.0",
        );
        assert!(matches!(result, Err(CoreError::ConfigInvalid { .. })));
    }

    #[test]
    fn test_negative_delay_is_invalid() {
        let result = KaraokeConfig::from_toml_str("[playback]\nfallback_line_delay_secs = -1.0");
        assert!(matches!(result, Err(CoreError::ConfigInvalid { .. })));
    }

    #[test]
    fn test_oversized_delay_is_invalid() {
        let result = KaraokeConfig::from_toml_str("[playback]\nfallback_line_delay_secs = 1e300");
        assert!(matches!(result, Err(CoreError::ConfigInvalid { .. })));

        let result = KaraokeConfig::from_toml_str(
            "[playback]\nmin_line_delay_secs = 0.0\nmax_line_delay_secs = 3600.0",
        );
        assert!(result.is_ok());
    }

    #[test]
    fn test_token_override_prefers_first_variable() {
        let mut config = KaraokeConfig::default();
        config.apply_token_override(|name| match name {
            "AUDD_API_TOKEN" => Some("from-audd".to_string()),
            "API_TOKEN" => Some("from-generic".to_string()),
            _ => None,
        });
        assert_eq!(config.audd.token(), Some("from-audd"));
    }

    #[test]
    fn test_token_override_skips_blank_values() {
        let mut config = KaraokeConfig::default();
        config.apply_token_override(|name| match name {
            "AUDD_API_TOKEN" => Some("  ".to_string()),
            "API_TOKEN" => Some("generic".to_string()),
            _ => None,
        });
        assert_eq!(config.audd.token(), Some("generic"));
    }

    #[test]
    fn test_file_token_wins_over_environment() {
        let mut config = KaraokeConfig::from_toml_str("[audd]\napi_token = \"file\"").unwrap();
        config.apply_token_override(|_| Some("env".to_string()));
        assert_eq!(config.audd.token(), Some("file"));
    }

    #[test]
    fn test_empty_api_log_file_disables_log() {
        let config = KaraokeConfig::from_toml_str("[logging]\napi_log_file = \"\"").unwrap();
        assert!(config.api_log().path().is_none());
    }

    #[test]
    fn test_load_or_create_writes_template() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let result = KaraokeConfig::load_or_create(&path);
        assert!(matches!(result, Err(CoreError::ConfigNotFound { .. })));
        assert!(path.exists());

        let config = KaraokeConfig::load_or_create(&path).unwrap();
        assert_eq!(config.library.songs_dir, PathBuf::from("sounds"));
    }
}
