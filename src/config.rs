//! Configuration file parser for ~/.config/podcast-cards/config.toml.
//!
//! The config file is optional; a missing file yields `Config::default()`.
//! Unknown keys are silently ignored by serde (with `deny_unknown_fields` off),
//! though we log a warning when the file contains potential typos.
use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

use crate::render::CardOptions;

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid TOML in config file: {0}")]
    Parse(#[from] toml::de::Error),

    /// SEC-014: Config file exceeds maximum allowed size.
    #[error("Config file too large: {0}")]
    TooLarge(String),
}

// ============================================================================
// Configuration Structs
// ============================================================================

/// Default feed-to-JSON proxy used when the feed cannot be fetched directly.
pub const DEFAULT_FALLBACK_ENDPOINT: &str = "https://api.rss2json.com/v1/api.json";

/// Cover image used for episodes without artwork.
pub const DEFAULT_IMAGE: &str = "assets/logo.svg";

/// Abbreviated month, numeric day, numeric year (e.g. `Mar 1, 2024`).
pub const DEFAULT_DATE_FORMAT: &str = "%b %-d, %Y";

/// Top-level configuration, passed explicitly into the pipeline.
///
/// All fields use `#[serde(default)]` so any subset of keys can be specified.
/// Missing keys fall back to `Default::default()`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// RSS feed to render. Unset or blank disables the pipeline entirely.
    pub feed_url: Option<String>,

    /// Feed-to-JSON proxy endpoint; receives the feed URL as `rss_url`.
    pub fallback_endpoint: String,

    /// Image shown on cards for episodes without cover art.
    pub default_image: String,

    /// strftime pattern for card dates.
    pub date_format: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            feed_url: None,
            fallback_endpoint: DEFAULT_FALLBACK_ENDPOINT.to_string(),
            default_image: DEFAULT_IMAGE.to_string(),
            date_format: DEFAULT_DATE_FORMAT.to_string(),
        }
    }
}

impl Config {
    /// SEC-014: Maximum config file size (1 MB).
    const MAX_FILE_SIZE: u64 = 1_048_576;

    /// Load configuration from a TOML file.
    ///
    /// - Missing file → `Ok(Config::default())`
    /// - Empty file → `Ok(Config::default())`
    /// - Invalid TOML → `Err(ConfigError::Parse)` with line number info
    /// - Unknown keys → silently accepted (serde default behavior), logged as warning
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        // SEC-014: Check file size before reading to prevent memory exhaustion
        match std::fs::metadata(path) {
            Ok(meta) if meta.len() > Self::MAX_FILE_SIZE => {
                return Err(ConfigError::TooLarge(format!(
                    "Config file is {} bytes (max {} bytes)",
                    meta.len(),
                    Self::MAX_FILE_SIZE
                )));
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "No config file found, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
            Ok(_) => {} // Size is within limits, proceed
        }

        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                // Race condition: file deleted between metadata and read
                tracing::debug!(path = %path.display(), "Config file disappeared, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
        };

        if content.trim().is_empty() {
            tracing::debug!(path = %path.display(), "Config file is empty, using defaults");
            return Ok(Self::default());
        }

        // Parse the TOML content first as a raw table to detect unknown keys
        if let Ok(raw) = content.parse::<toml::Table>() {
            let known_keys = ["feed_url", "fallback_endpoint", "default_image", "date_format"];
            for key in raw.keys() {
                if !known_keys.contains(&key.as_str()) {
                    tracing::warn!(key = %key, "Unknown key in config file, ignoring");
                }
            }
        }

        let config: Config = toml::from_str(&content)?;
        tracing::info!(
            path = %path.display(),
            feed_configured = config.feed_url().is_some(),
            "Loaded configuration"
        );
        Ok(config)
    }

    /// The feed URL, or `None` when unset or blank.
    pub fn feed_url(&self) -> Option<&str> {
        self.feed_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
    }

    /// Card rendering settings derived from this configuration.
    pub fn card_options(&self) -> CardOptions {
        CardOptions {
            default_image: self.default_image.clone(),
            date_format: self.date_format.clone(),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.feed_url.is_none());
        assert_eq!(config.fallback_endpoint, "https://api.rss2json.com/v1/api.json");
        assert_eq!(config.default_image, "assets/logo.svg");
        assert_eq!(config.date_format, "%b %-d, %Y");
    }

    #[test]
    fn test_missing_file_returns_default() {
        let path = Path::new("/tmp/podcast_cards_test_nonexistent_config.toml");
        let config = Config::load(path).unwrap();
        assert!(config.feed_url.is_none());
    }

    #[test]
    fn test_empty_file_returns_default() {
        let dir = std::env::temp_dir().join("podcast_cards_config_test_empty");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.toml");
        std::fs::write(&path, "").unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.default_image, DEFAULT_IMAGE);

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_partial_config_uses_defaults_for_missing() {
        let dir = std::env::temp_dir().join("podcast_cards_config_test_partial");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.toml");
        std::fs::write(&path, "feed_url = \"https://example.com/feed.xml\"\n").unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.feed_url(), Some("https://example.com/feed.xml"));
        assert_eq!(config.fallback_endpoint, DEFAULT_FALLBACK_ENDPOINT); // default
        assert_eq!(config.date_format, DEFAULT_DATE_FORMAT); // default

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_full_config() {
        let dir = std::env::temp_dir().join("podcast_cards_config_test_full");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.toml");

        let content = r#"
feed_url = "https://example.com/feed.xml"
fallback_endpoint = "https://proxy.example.net/convert"
default_image = "/img/cover.png"
date_format = "%Y-%m-%d"
"#;
        std::fs::write(&path, content).unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.feed_url(), Some("https://example.com/feed.xml"));
        assert_eq!(config.fallback_endpoint, "https://proxy.example.net/convert");

        let options = config.card_options();
        assert_eq!(options.default_image, "/img/cover.png");
        assert_eq!(options.date_format, "%Y-%m-%d");

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_blank_feed_url_is_unset() {
        let config = Config {
            feed_url: Some("   ".to_string()),
            ..Config::default()
        };
        assert_eq!(config.feed_url(), None);

        let config = Config {
            feed_url: Some(String::new()),
            ..Config::default()
        };
        assert_eq!(config.feed_url(), None);
    }

    #[test]
    fn test_invalid_toml_returns_error() {
        let dir = std::env::temp_dir().join("podcast_cards_config_test_invalid");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.toml");
        std::fs::write(&path, "this is not [valid toml").unwrap();

        let result = Config::load(&path);
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
        // Verify error message contains useful info
        let msg = err.to_string();
        assert!(msg.contains("Invalid TOML"));

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_unknown_keys_accepted() {
        let dir = std::env::temp_dir().join("podcast_cards_config_test_unknown");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.toml");

        let content = r#"
feed_url = "https://example.com/feed.xml"
max_on_home = 8
"#;
        std::fs::write(&path, content).unwrap();

        // Should succeed (unknown keys ignored)
        let config = Config::load(&path).unwrap();
        assert_eq!(config.feed_url(), Some("https://example.com/feed.xml"));

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_wrong_type_returns_error() {
        let dir = std::env::temp_dir().join("podcast_cards_config_test_wrongtype");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.toml");
        // feed_url should be a string, not an integer
        std::fs::write(&path, "feed_url = 42\n").unwrap();

        let result = Config::load(&path);
        assert!(result.is_err());

        std::fs::remove_dir_all(&dir).ok();
    }

    // SEC-014: File size limit
    #[test]
    fn test_too_large_file_rejected() {
        let dir = std::env::temp_dir().join("podcast_cards_config_test_too_large");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.toml");

        // Write a file just over 1MB
        let content = "a".repeat(1_048_577);
        std::fs::write(&path, content).unwrap();

        let result = Config::load(&path);
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert!(matches!(err, ConfigError::TooLarge(_)));
        assert!(err.to_string().contains("too large"));

        std::fs::remove_dir_all(&dir).ok();
    }
}
