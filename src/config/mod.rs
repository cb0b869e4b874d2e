//! Configuration management.
//!
//! Configuration comes from three layers, weakest first: built-in defaults,
//! a TOML config file (explicit path or the platform config directory),
//! and environment variables. Credentials land in [`secrecy::SecretString`]
//! so they never show up in debug output.

use crate::{Error, Result};
use secrecy::SecretString;
use serde::Deserialize;
use std::path::PathBuf;

/// Main configuration for armiger.
#[derive(Debug, Clone)]
pub struct ArmigerConfig {
    /// The agent's own platform username; also what users write to address
    /// it directly.
    pub identity: String,
    /// User agent sent on platform requests.
    pub user_agent: String,
    /// Directory for the persisted idempotency state files.
    pub state_dir: PathBuf,
    /// Discussion platform settings.
    pub platform: PlatformConfig,
    /// Catalog source settings.
    pub catalog: CatalogConfig,
    /// Generation service settings.
    pub generation: GenerationConfig,
    /// Processing gate settings.
    pub gate: GateConfig,
}

/// Discussion platform settings.
#[derive(Debug, Clone)]
pub struct PlatformConfig {
    /// API base URL.
    pub base_url: String,
    /// Community (subreddit) to watch.
    pub community: String,
    /// Seconds between polls of each stream.
    pub poll_interval_secs: u64,
    /// Maximum items fetched per poll.
    pub batch_limit: usize,
    /// OAuth access token.
    pub access_token: Option<SecretString>,
}

impl Default for PlatformConfig {
    fn default() -> Self {
        Self {
            base_url: "https://oauth.reddit.com".to_string(),
            community: "Chivalry2".to_string(),
            poll_interval_secs: 10,
            batch_limit: 10,
            access_token: None,
        }
    }
}

/// Catalog source settings.
#[derive(Debug, Clone)]
pub struct CatalogConfig {
    /// Remote listing endpoint publishing one JSON document per weapon.
    pub listing_url: Option<String>,
    /// Local directory of weapon JSON documents (used instead of the
    /// remote listing when set).
    pub dir: Option<PathBuf>,
    /// Record id appended to every comparison.
    pub flagship: Option<String>,
    /// Phrases that suppress processing of an item outright.
    pub ignore_phrases: Vec<String>,
    /// Base URL of the comparison site linked in reply footers.
    pub comparison_base_url: String,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            listing_url: None,
            dir: None,
            flagship: Some("ph".to_string()),
            ignore_phrases: vec!["cavalry sword".to_string(), "calvary sword".to_string()],
            comparison_base_url: "https://polehammer.net".to_string(),
        }
    }
}

/// Generation service settings.
#[derive(Debug, Clone)]
pub struct GenerationConfig {
    /// Model used for reply generation.
    pub model: String,
    /// Model used for the relevance gate.
    pub classifier_model: String,
    /// API key.
    pub api_key: Option<SecretString>,
    /// Base URL override (for self-hosted endpoints).
    pub base_url: Option<String>,
    /// Request timeout in milliseconds.
    pub timeout_ms: Option<u64>,
    /// Connect timeout in milliseconds.
    pub connect_timeout_ms: Option<u64>,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            model: "gpt-4o-mini".to_string(),
            classifier_model: "gpt-4o-mini".to_string(),
            api_key: None,
            base_url: None,
            timeout_ms: None,
            connect_timeout_ms: None,
        }
    }
}

/// Processing gate settings.
#[derive(Debug, Clone)]
pub struct GateConfig {
    /// Mentions needed to process an item without further checks.
    pub min_mentions: usize,
    /// Whether a single-mention item consults the relevance classifier.
    pub use_classifier: bool,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            min_mentions: 2,
            use_classifier: false,
        }
    }
}

impl Default for ArmigerConfig {
    fn default() -> Self {
        Self {
            identity: String::new(),
            user_agent: format!("armiger/{} (weapon comparison bot)", env!("CARGO_PKG_VERSION")),
            state_dir: PathBuf::from(".armiger"),
            platform: PlatformConfig::default(),
            catalog: CatalogConfig::default(),
            generation: GenerationConfig::default(),
            gate: GateConfig::default(),
        }
    }
}

impl ArmigerConfig {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from a file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_from_file(path: &std::path::Path) -> Result<Self> {
        let contents =
            std::fs::read_to_string(path).map_err(|e| Error::operation("read_config_file", e))?;

        let file: ConfigFile =
            toml::from_str(&contents).map_err(|e| Error::operation("parse_config_file", e))?;

        Ok(Self::from_config_file(file))
    }

    /// Loads configuration from the default location.
    ///
    /// Checks the platform config dir, then `~/.config/armiger/`, and falls
    /// back to defaults when no config file exists.
    #[must_use]
    pub fn load_default() -> Self {
        let Some(base_dirs) = directories::BaseDirs::new() else {
            return Self::default();
        };

        let platform_config = base_dirs.config_dir().join("armiger").join("config.toml");
        if platform_config.exists() {
            if let Ok(config) = Self::load_from_file(&platform_config) {
                return config;
            }
        }

        let xdg_config = base_dirs
            .home_dir()
            .join(".config")
            .join("armiger")
            .join("config.toml");
        if xdg_config.exists() {
            if let Ok(config) = Self::load_from_file(&xdg_config) {
                return config;
            }
        }

        Self::default()
    }

    /// Applies environment variable overrides.
    ///
    /// `ARMIGER_IDENTITY`, `ARMIGER_COMMUNITY`, and `ARMIGER_STATE_DIR`
    /// override their config-file counterparts; `REDDIT_ACCESS_TOKEN` and
    /// `OPENAI_API_KEY` supply the credentials.
    #[must_use]
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(v) = std::env::var("ARMIGER_IDENTITY") {
            self.identity = v;
        }
        if let Ok(v) = std::env::var("ARMIGER_COMMUNITY") {
            self.platform.community = v;
        }
        if let Ok(v) = std::env::var("ARMIGER_STATE_DIR") {
            self.state_dir = PathBuf::from(v);
        }
        if let Ok(v) = std::env::var("REDDIT_ACCESS_TOKEN") {
            self.platform.access_token = Some(SecretString::from(v));
        }
        if let Ok(v) = std::env::var("OPENAI_API_KEY") {
            self.generation.api_key = Some(SecretString::from(v));
        }
        self
    }

    /// Checks that the configuration can drive a live run.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] when the identity is missing or no
    /// catalog source is configured.
    pub fn validate_for_run(&self) -> Result<()> {
        if self.identity.trim().is_empty() {
            return Err(Error::InvalidInput(
                "agent identity is not configured (set identity or ARMIGER_IDENTITY)".to_string(),
            ));
        }
        if self.catalog.listing_url.is_none() && self.catalog.dir.is_none() {
            return Err(Error::InvalidInput(
                "no catalog source configured (set catalog.listing_url or catalog.dir)".to_string(),
            ));
        }
        Ok(())
    }

    /// Converts a `ConfigFile` to `ArmigerConfig`.
    fn from_config_file(file: ConfigFile) -> Self {
        let mut config = Self::default();

        if let Some(identity) = file.identity {
            config.identity = identity;
        }
        if let Some(user_agent) = file.user_agent {
            config.user_agent = user_agent;
        }
        if let Some(state_dir) = file.state_dir {
            config.state_dir = PathBuf::from(state_dir);
        }
        if let Some(platform) = file.platform {
            if let Some(base_url) = platform.base_url {
                config.platform.base_url = base_url;
            }
            if let Some(community) = platform.community {
                config.platform.community = community;
            }
            if let Some(secs) = platform.poll_interval_secs {
                config.platform.poll_interval_secs = secs;
            }
            if let Some(limit) = platform.batch_limit {
                config.platform.batch_limit = limit;
            }
            config.platform.access_token = platform.access_token.map(SecretString::from);
        }
        if let Some(catalog) = file.catalog {
            config.catalog.listing_url = catalog.listing_url;
            config.catalog.dir = catalog.dir.map(PathBuf::from);
            if let Some(flagship) = catalog.flagship {
                config.catalog.flagship = if flagship.is_empty() {
                    None
                } else {
                    Some(flagship)
                };
            }
            if let Some(phrases) = catalog.ignore_phrases {
                config.catalog.ignore_phrases = phrases;
            }
            if let Some(url) = catalog.comparison_base_url {
                config.catalog.comparison_base_url = url;
            }
        }
        if let Some(generation) = file.generation {
            if let Some(model) = generation.model {
                config.generation.model = model;
            }
            if let Some(model) = generation.classifier_model {
                config.generation.classifier_model = model;
            }
            config.generation.api_key = generation.api_key.map(SecretString::from);
            config.generation.base_url = generation.base_url;
            config.generation.timeout_ms = generation.timeout_ms;
            config.generation.connect_timeout_ms = generation.connect_timeout_ms;
        }
        if let Some(gate) = file.gate {
            if let Some(min_mentions) = gate.min_mentions {
                config.gate.min_mentions = min_mentions;
            }
            if let Some(use_classifier) = gate.use_classifier {
                config.gate.use_classifier = use_classifier;
            }
        }

        config
    }
}

/// Configuration file structure (for TOML parsing).
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFile {
    /// Agent identity.
    pub identity: Option<String>,
    /// User agent string.
    pub user_agent: Option<String>,
    /// State directory.
    pub state_dir: Option<String>,
    /// Platform section.
    pub platform: Option<ConfigFilePlatform>,
    /// Catalog section.
    pub catalog: Option<ConfigFileCatalog>,
    /// Generation section.
    pub generation: Option<ConfigFileGeneration>,
    /// Gate section.
    pub gate: Option<ConfigFileGate>,
}

/// Platform section in the config file.
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFilePlatform {
    /// API base URL.
    pub base_url: Option<String>,
    /// Community to watch.
    pub community: Option<String>,
    /// Poll interval in seconds.
    pub poll_interval_secs: Option<u64>,
    /// Items per poll.
    pub batch_limit: Option<usize>,
    /// OAuth access token.
    pub access_token: Option<String>,
}

/// Catalog section in the config file.
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFileCatalog {
    /// Remote listing endpoint.
    pub listing_url: Option<String>,
    /// Local document directory.
    pub dir: Option<String>,
    /// Flagship record id ("" disables it).
    pub flagship: Option<String>,
    /// Ignore phrases.
    pub ignore_phrases: Option<Vec<String>>,
    /// Comparison site base URL.
    pub comparison_base_url: Option<String>,
}

/// Generation section in the config file.
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFileGeneration {
    /// Generation model.
    pub model: Option<String>,
    /// Classifier model.
    pub classifier_model: Option<String>,
    /// API key.
    pub api_key: Option<String>,
    /// Base URL override.
    pub base_url: Option<String>,
    /// Request timeout in milliseconds.
    pub timeout_ms: Option<u64>,
    /// Connect timeout in milliseconds.
    pub connect_timeout_ms: Option<u64>,
}

/// Gate section in the config file.
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFileGate {
    /// Mentions needed to process without further checks.
    pub min_mentions: Option<usize>,
    /// Whether single-mention items consult the classifier.
    pub use_classifier: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ArmigerConfig::default();
        assert_eq!(config.gate.min_mentions, 2);
        assert_eq!(config.platform.poll_interval_secs, 10);
        assert_eq!(config.catalog.flagship.as_deref(), Some("ph"));
        assert!(config.catalog.ignore_phrases.contains(&"cavalry sword".to_string()));
    }

    #[test]
    fn test_parse_config_file() {
        let file: ConfigFile = toml::from_str(
            r#"
            identity = "armiger"

            [platform]
            community = "Chivalry2"
            poll_interval_secs = 30

            [catalog]
            listing_url = "https://example.com/weapons"
            flagship = ""

            [gate]
            min_mentions = 3
            use_classifier = true
            "#,
        )
        .unwrap();
        let config = ArmigerConfig::from_config_file(file);

        assert_eq!(config.identity, "armiger");
        assert_eq!(config.platform.poll_interval_secs, 30);
        assert_eq!(
            config.catalog.listing_url.as_deref(),
            Some("https://example.com/weapons")
        );
        // Empty flagship disables the default.
        assert!(config.catalog.flagship.is_none());
        assert_eq!(config.gate.min_mentions, 3);
        assert!(config.gate.use_classifier);
    }

    #[test]
    fn test_validate_for_run() {
        let mut config = ArmigerConfig::default();
        assert!(config.validate_for_run().is_err());

        config.identity = "armiger".to_string();
        assert!(config.validate_for_run().is_err());

        config.catalog.dir = Some(PathBuf::from("./weapons"));
        assert!(config.validate_for_run().is_ok());
    }
}
