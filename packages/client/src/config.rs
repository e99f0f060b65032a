use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

use crate::error::{ClientError, ClientResult};

pub const DEFAULT_API_URL: &str = "http://localhost:8000";
pub const DEFAULT_PLATFORM: &str = "iOS";
/// Analysis and defect documentation are LLM-backed and slow
pub const DEFAULT_TIMEOUT_SECS: u64 = 600;

pub const ENV_API_URL: &str = "A11Y_API_URL";
pub const ENV_API_TOKEN: &str = "A11Y_API_TOKEN";
pub const ENV_PLATFORM: &str = "A11Y_PLATFORM";
pub const ENV_TIMEOUT_SECS: &str = "A11Y_TIMEOUT_SECS";

/// Directory holding local state (~/.a11y-insights)
pub fn state_dir() -> PathBuf {
    // HOME first so tests can redirect it
    if let Ok(home) = env::var("HOME") {
        PathBuf::from(home).join(".a11y-insights")
    } else {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".a11y-insights")
    }
}

/// Path of the persisted settings file
pub fn settings_path() -> PathBuf {
    state_dir().join("settings.toml")
}

/// User preferences persisted between runs. The API token is never stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub api_url: String,
    pub default_platform: String,
    /// Show success and info notifications (errors are always shown)
    pub notifications: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            default_platform: DEFAULT_PLATFORM.to_string(),
            notifications: true,
        }
    }
}

impl Settings {
    /// Load settings from `path`, falling back to defaults when the file is absent
    pub async fn load_from(path: &Path) -> ClientResult<Self> {
        if !path.exists() {
            debug!("No settings file at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).await.map_err(|e| {
            ClientError::config(format!("Failed to read settings: {}", e))
        })?;

        Ok(toml::from_str(&content)?)
    }

    /// Load settings from the default location
    pub async fn load() -> ClientResult<Self> {
        Self::load_from(&settings_path()).await
    }

    /// Save settings to `path`, creating parent directories
    pub async fn save_to(&self, path: &Path) -> ClientResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await.map_err(|e| {
                ClientError::config(format!("Failed to create settings dir: {}", e))
            })?;
        }

        let content = toml::to_string_pretty(self)
            .map_err(|e| ClientError::config(format!("Failed to serialize settings: {}", e)))?;

        fs::write(path, content)
            .await
            .map_err(|e| ClientError::config(format!("Failed to write settings: {}", e)))?;

        Ok(())
    }

    /// Save settings to the default location
    pub async fn save(&self) -> ClientResult<()> {
        self.save_to(&settings_path()).await
    }
}

/// Connection settings for the service
#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    pub api_url: String,
    pub api_token: Option<String>,
    pub default_platform: String,
    pub timeout_secs: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            api_token: None,
            default_platform: DEFAULT_PLATFORM.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl ClientConfig {
    /// Start from persisted settings
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            api_url: settings.api_url.clone(),
            default_platform: settings.default_platform.clone(),
            ..Self::default()
        }
    }

    /// Overlay values from the environment
    pub fn merge_env(mut self) -> ClientResult<Self> {
        if let Ok(url) = env::var(ENV_API_URL) {
            self.api_url = url;
        }
        if let Ok(token) = env::var(ENV_API_TOKEN) {
            if !token.trim().is_empty() {
                self.api_token = Some(token);
            }
        }
        if let Ok(platform) = env::var(ENV_PLATFORM) {
            self.default_platform = platform;
        }
        if let Ok(raw) = env::var(ENV_TIMEOUT_SECS) {
            self.timeout_secs = raw.parse().map_err(|_| {
                ClientError::config(format!("{} must be a number of seconds, got {:?}", ENV_TIMEOUT_SECS, raw))
            })?;
        }
        Ok(self)
    }

    /// Defaults, then environment
    pub fn from_env() -> ClientResult<Self> {
        Self::default().merge_env()
    }

    /// Base URL without a trailing slash
    pub fn base_url(&self) -> &str {
        self.api_url.trim_end_matches('/')
    }

    /// Validate configuration
    pub fn validate(&self) -> ClientResult<()> {
        if self.api_url.trim().is_empty() {
            return Err(ClientError::config("API URL is required"));
        }
        if !(self.api_url.starts_with("http://") || self.api_url.starts_with("https://")) {
            return Err(ClientError::config("API URL must start with http:// or https://"));
        }
        if self.timeout_secs == 0 {
            return Err(ClientError::config("Timeout must be greater than zero"));
        }
        Ok(())
    }
}

/// Configuration builder
pub struct ClientConfigBuilder {
    config: ClientConfig,
}

impl ClientConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: ClientConfig::default(),
        }
    }

    /// Start from an existing configuration
    pub fn from_config(config: ClientConfig) -> Self {
        Self { config }
    }

    pub fn api_url(mut self, url: impl Into<String>) -> Self {
        self.config.api_url = url.into();
        self
    }

    pub fn token(mut self, token: impl Into<String>) -> Self {
        self.config.api_token = Some(token.into());
        self
    }

    pub fn default_platform(mut self, platform: impl Into<String>) -> Self {
        self.config.default_platform = platform.into();
        self
    }

    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.config.timeout_secs = secs;
        self
    }

    /// Build and validate the configuration
    pub fn build(self) -> ClientResult<ClientConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

impl Default for ClientConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
