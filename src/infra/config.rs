// src/infra/config.rs — Configuration loading (TOML)

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::infra::paths;
use crate::store::collections::Environment;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Which parallel set of database collections to use. Read once at
    /// startup; everything downstream takes the resolved names.
    #[serde(default)]
    pub environment: Environment,

    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub provider: ProviderConfig,

    #[serde(default)]
    pub database: DatabaseConfig,

    #[serde(default)]
    pub analytics: AnalyticsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 8787,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Base URL of the OpenAI-compatible generation API.
    pub base_url: String,
    /// API key; STORYMILL_OPENAI_KEY takes precedence.
    pub api_key: Option<String>,
    pub text_model: String,
    pub image_model: String,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".into(),
            api_key: None,
            text_model: "gpt-4o-mini".into(),
            image_model: "dall-e-3".into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// REST endpoint of the managed document database.
    pub base_url: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8980".into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyticsConfig {
    pub enabled: bool,
    /// Where the background delivery task POSTs events. When unset, events
    /// are logged locally instead.
    pub endpoint: Option<String>,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            endpoint: None,
        }
    }
}

impl Config {
    /// Load config from file, falling back to defaults, then apply
    /// environment overrides.
    pub fn load() -> anyhow::Result<Self> {
        let path = paths::config_file_path();
        let mut config = if path.exists() {
            Self::load_from(&path)?
        } else {
            Self::default()
        };
        config.apply_env_overrides();
        Ok(config)
    }

    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn apply_env_overrides(&mut self) {
        if let Ok(env) = std::env::var("STORYMILL_ENV") {
            match env.to_ascii_lowercase().as_str() {
                "production" | "prod" => self.environment = Environment::Production,
                "development" | "dev" => self.environment = Environment::Development,
                other => tracing::warn!("Ignoring unknown STORYMILL_ENV value '{other}'"),
            }
        }
        if let Ok(key) = std::env::var("STORYMILL_OPENAI_KEY") {
            if !key.is_empty() {
                self.provider.api_key = Some(key);
            }
        }
    }
}
