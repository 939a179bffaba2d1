//! Configuration module for defibot.
//!
//! Loads typed configuration from `~/.defibot/config.json`; a missing file
//! means defaults. The API key may instead come from the environment
//! (`OPENAI_API_KEY`, then `DEFIBOT_API_KEY`), including a `.env` file.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::recognizer::Strategy;

/// Environment variables consulted for the API key, in priority order.
pub const API_KEY_VARS: &[&str] = &["OPENAI_API_KEY", "DEFIBOT_API_KEY"];

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid config {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("no API key configured: set {} or provider.apiKey in config.json", API_KEY_VARS.join(" / "))]
    MissingApiKey,
}

/// Root configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub provider: ProviderConfig,
    pub recognizer: RecognizerConfig,
    pub sessions: SessionsConfig,
}

impl Config {
    /// Load configuration from the default path, then apply environment
    /// overrides.
    pub fn load() -> Result<Self, ConfigError> {
        // A missing .env is normal.
        if let Ok(path) = dotenvy::dotenv() {
            debug!(path = %path.display(), "Loaded .env");
        }

        let path = Self::default_path();
        let mut config = if path.exists() {
            Self::load_from(&path)?
        } else {
            Config::default()
        };
        config.apply_env(|name| std::env::var(name).ok());
        Ok(config)
    }

    /// Load configuration from a specific path, without environment overrides.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Override the API key from the first non-empty variable in [`API_KEY_VARS`].
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(key) = API_KEY_VARS
            .iter()
            .filter_map(|&name| lookup(name))
            .find(|v| !v.trim().is_empty())
        {
            self.provider.api_key = key.trim().to_string();
        }
    }

    /// Default config directory (`~/.defibot`).
    pub fn config_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".defibot")
    }

    pub fn default_path() -> PathBuf {
        Self::config_dir().join("config.json")
    }

    /// Resolved session directory.
    pub fn sessions_path(&self) -> PathBuf {
        match self.sessions.dir.as_deref() {
            Some(raw) if raw.starts_with("~/") || raw.starts_with("~\\") => dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(&raw[2..]),
            Some(raw) => PathBuf::from(raw),
            None => Self::config_dir().join("sessions"),
        }
    }

    /// The API key, required only by the remote strategy.
    pub fn require_api_key(&self) -> Result<&str, ConfigError> {
        let key = self.provider.api_key.trim();
        if key.is_empty() || key == PLACEHOLDER_KEY {
            return Err(ConfigError::MissingApiKey);
        }
        Ok(key)
    }

    /// Check the configuration for the chosen strategy; lists every problem.
    pub fn validate(&self, strategy: Strategy) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if strategy == Strategy::Remote {
            if let Err(e) = self.require_api_key() {
                errors.push(e.to_string());
            }
            if self.provider.model.trim().is_empty() {
                errors.push("provider.model must not be empty".into());
            }
        }
        if self.provider.max_tokens == 0 {
            errors.push("provider.maxTokens must be greater than 0".into());
        }
        if !(0.0..=2.0).contains(&self.provider.temperature) {
            errors.push(format!(
                "provider.temperature must be between 0 and 2, got {}",
                self.provider.temperature
            ));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Write the default config template to disk.
    pub fn write_default_template() -> anyhow::Result<PathBuf> {
        let path = Self::default_path();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let template = serde_json::json!({
            "provider": {
                "name": "openai",
                "apiKey": PLACEHOLDER_KEY,
                "model": "gpt-4o-mini"
            },
            "recognizer": {
                "strategy": "local"
            }
        });

        std::fs::write(&path, serde_json::to_string_pretty(&template)?)?;
        Ok(path)
    }
}

const PLACEHOLDER_KEY: &str = "sk-YOUR_KEY_HERE";

// ── Provider Configuration ──────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ProviderConfig {
    pub name: String,
    pub api_key: String,
    pub api_base: Option<String>,
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub timeout_seconds: u64,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            name: "openai".into(),
            api_key: String::new(),
            api_base: None,
            model: "gpt-4o-mini".into(),
            max_tokens: 150,
            temperature: 0.0,
            timeout_seconds: 30,
        }
    }
}

// ── Recognizer / Sessions ───────────────────────────────────────────

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RecognizerConfig {
    pub strategy: Strategy,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SessionsConfig {
    pub dir: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.provider.model, "gpt-4o-mini");
        assert_eq!(config.provider.max_tokens, 150);
        assert_eq!(config.recognizer.strategy, Strategy::Local);
        assert!(config.validate(Strategy::Local).is_ok());
    }

    #[test]
    fn test_deserialize_minimal_json() {
        let json = r#"{"provider": {"apiKey": "sk-test", "apiBase": "http://localhost:8000/v1"}, "recognizer": {"strategy": "remote"}}"#;
        let config: Config = serde_json::from_str(json).unwrap();
        assert_eq!(config.provider.api_key, "sk-test");
        assert_eq!(config.provider.api_base.as_deref(), Some("http://localhost:8000/v1"));
        assert_eq!(config.provider.name, "openai");
        assert_eq!(config.recognizer.strategy, Strategy::Remote);
    }

    #[test]
    fn test_remote_requires_api_key() {
        let config = Config::default();
        assert!(matches!(config.require_api_key(), Err(ConfigError::MissingApiKey)));
        let errors = config.validate(Strategy::Remote).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("OPENAI_API_KEY"));
    }

    #[test]
    fn test_placeholder_key_is_missing() {
        let mut config = Config::default();
        config.provider.api_key = PLACEHOLDER_KEY.into();
        assert!(config.require_api_key().is_err());
    }

    #[test]
    fn test_env_overrides_key() {
        let mut config = Config::default();
        config.provider.api_key = "from-file".into();
        config.apply_env(|name| match name {
            "OPENAI_API_KEY" => Some("  ".into()),
            "DEFIBOT_API_KEY" => Some("from-env".into()),
            _ => None,
        });
        assert_eq!(config.provider.api_key, "from-env");
        assert_eq!(config.require_api_key().unwrap(), "from-env");

        config.apply_env(|_| None);
        assert_eq!(config.provider.api_key, "from-env");
    }

    #[test]
    fn test_validate_collects_all_errors() {
        let mut config = Config::default();
        config.provider.max_tokens = 0;
        config.provider.temperature = 3.5;
        config.provider.model = String::new();
        let errors = config.validate(Strategy::Remote).unwrap_err();
        assert_eq!(errors.len(), 4);
    }

    #[test]
    fn test_sessions_path() {
        let mut config = Config::default();
        assert!(config.sessions_path().ends_with(".defibot/sessions"));
        config.sessions.dir = Some("/tmp/defibot".into());
        assert_eq!(config.sessions_path(), PathBuf::from("/tmp/defibot"));
    }

    #[test]
    fn test_load_from_reports_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(matches!(Config::load_from(&path), Err(ConfigError::Parse { .. })));
    }
}
