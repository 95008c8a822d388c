//! Configuration file support for liftlog.
//!
//! Configuration is loaded from `$XDG_CONFIG_HOME/liftlog/config.toml`.

use crate::prefill::PrefillDefaults;
use crate::program::{DEFAULT_RECOMMENDED_REPS, DEFAULT_RECOMMENDED_SETS};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable that overrides `api.token`
pub const TOKEN_ENV_VAR: &str = "LIFTLOG_API_TOKEN";

/// Application configuration
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub data: DataConfig,

    #[serde(default)]
    pub api: ApiConfig,

    #[serde(default)]
    pub session: SessionConfig,
}

/// Local storage configuration (drafts, exports)
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DataConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

/// Backend connection configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            token: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl ApiConfig {
    /// Token to send, preferring `LIFTLOG_API_TOKEN` over the config file
    pub fn resolve_token(&self) -> Option<String> {
        self.resolve_token_with(std::env::var(TOKEN_ENV_VAR).ok())
    }

    fn resolve_token_with(&self, env_token: Option<String>) -> Option<String> {
        env_token
            .filter(|t| !t.is_empty())
            .or_else(|| self.token.clone())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Session editor parameters
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SessionConfig {
    #[serde(default = "default_sets")]
    pub default_sets: u32,

    #[serde(default = "default_reps")]
    pub default_reps: u32,

    #[serde(default = "default_draft_max_age_hours")]
    pub draft_max_age_hours: i64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            default_sets: default_sets(),
            default_reps: default_reps(),
            draft_max_age_hours: default_draft_max_age_hours(),
        }
    }
}

impl SessionConfig {
    pub fn prefill_defaults(&self) -> PrefillDefaults {
        PrefillDefaults {
            sets: self.default_sets,
            reps: self.default_reps,
        }
    }
}

// Default value functions
fn default_data_dir() -> PathBuf {
    let base = dirs::data_local_dir().unwrap_or_else(|| {
        let home = std::env::var("HOME").unwrap_or_else(|_| ".".into());
        PathBuf::from(home).join(".local/share")
    });
    base.join("liftlog")
}

fn default_base_url() -> String {
    "http://localhost:3000/api".into()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_sets() -> u32 {
    DEFAULT_RECOMMENDED_SETS
}

fn default_reps() -> u32 {
    DEFAULT_RECOMMENDED_REPS
}

fn default_draft_max_age_hours() -> i64 {
    24
}

impl Config {
    /// Load configuration from the standard config path
    pub fn load() -> Result<Self> {
        let config_path = Self::default_config_path();
        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            tracing::info!(
                "No config file found at {:?}, using defaults",
                config_path
            );
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        tracing::info!("Loaded config from {:?}", path);
        Ok(config)
    }

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        let base = dirs::config_dir().unwrap_or_else(|| {
            let home = std::env::var("HOME").unwrap_or_else(|_| ".".into());
            PathBuf::from(home).join(".config")
        });
        base.join("liftlog").join("config.toml")
    }

    /// Reject values the editor cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.api.base_url.trim().is_empty() {
            return Err(Error::Config("api.base_url must not be empty".into()));
        }
        if self.session.default_sets == 0 {
            return Err(Error::Config("session.default_sets must be at least 1".into()));
        }
        if self.session.draft_max_age_hours < 0 {
            return Err(Error::Config(
                "session.draft_max_age_hours must not be negative".into(),
            ));
        }
        Ok(())
    }

    /// Directory holding crash-recovery drafts
    pub fn drafts_dir(&self) -> PathBuf {
        self.data.data_dir.join("drafts")
    }

    /// Save the current configuration to the default path
    pub fn save(&self) -> Result<()> {
        let config_path = Self::default_config_path();
        self.save_to(&config_path)
    }

    /// Save the current configuration to a specific path
    pub fn save_to(&self, path: &Path) -> Result<()> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, contents)?;
        tracing::info!("Saved config to {:?}", path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.api.base_url, "http://localhost:3000/api");
        assert_eq!(config.session.default_sets, 3);
        assert_eq!(config.session.default_reps, 10);
        assert_eq!(config.session.draft_max_age_hours, 24);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_roundtrip() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("config.toml");

        let mut config = Config::default();
        config.api.token = Some("secret".into());
        config.session.default_reps = 8;
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.api.token.as_deref(), Some("secret"));
        assert_eq!(loaded.session.default_reps, 8);
        assert_eq!(loaded.data.data_dir, config.data.data_dir);
    }

    #[test]
    fn test_partial_config() {
        let toml_str = r#"
[api]
base_url = "https://gym.example.com/api"
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.api.base_url, "https://gym.example.com/api");
        assert_eq!(config.api.timeout_secs, 30); // default
        assert_eq!(config.session.prefill_defaults(), PrefillDefaults::default());
    }

    #[test]
    fn test_invalid_config_rejected() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("config.toml");
        std::fs::write(&path, "[session]\ndefault_sets = 0\n").unwrap();

        assert!(matches!(Config::load_from(&path), Err(Error::Config(_))));
    }

    #[test]
    fn test_env_token_takes_precedence() {
        let api = ApiConfig {
            token: Some("from-file".into()),
            ..Default::default()
        };
        assert_eq!(
            api.resolve_token_with(Some("from-env".into())).as_deref(),
            Some("from-env")
        );
        assert_eq!(api.resolve_token_with(Some(String::new())).as_deref(), Some("from-file"));
        assert_eq!(api.resolve_token_with(None).as_deref(), Some("from-file"));
    }
}
