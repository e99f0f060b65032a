// ABOUTME: Resolves the effective client configuration for a CLI run
// ABOUTME: Layers defaults, the settings file, environment and command-line flags

use a11y_client::{ClientConfig, ClientConfigBuilder, ClientResult, Settings};
use anyhow::{bail, Result};

/// Values given on the command line; they win over every other source
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub api_url: Option<String>,
    pub token: Option<String>,
    pub platform: Option<String>,
    pub timeout_secs: Option<u64>,
}

pub fn resolve(settings: &Settings, overrides: &Overrides) -> ClientResult<ClientConfig> {
    let base = ClientConfig::from_settings(settings).merge_env()?;
    let mut builder = ClientConfigBuilder::from_config(base);

    if let Some(url) = &overrides.api_url {
        builder = builder.api_url(url);
    }
    if let Some(token) = &overrides.token {
        builder = builder.token(token);
    }
    if let Some(platform) = &overrides.platform {
        builder = builder.default_platform(platform);
    }
    if let Some(secs) = overrides.timeout_secs {
        builder = builder.timeout_secs(secs);
    }

    builder.build()
}

pub const SETTING_KEYS: [&str; 3] = ["api_url", "default_platform", "notifications"];

/// Update one persisted setting from its textual form
pub fn apply_setting(settings: &mut Settings, key: &str, value: &str) -> Result<()> {
    match key {
        "api_url" => {
            let value = value.trim();
            if !(value.starts_with("http://") || value.starts_with("https://")) {
                bail!("api_url must start with http:// or https://");
            }
            settings.api_url = value.to_string();
        }
        "default_platform" => {
            if value.trim().is_empty() {
                bail!("default_platform cannot be empty");
            }
            settings.default_platform = value.trim().to_string();
        }
        "notifications" => {
            settings.notifications = match value.to_lowercase().as_str() {
                "true" | "on" | "yes" | "1" => true,
                "false" | "off" | "no" | "0" => false,
                other => bail!("notifications expects on or off, got {:?}", other),
            };
        }
        "api_token" | "token" => {
            bail!("The API token is never stored; use --token or A11Y_API_TOKEN")
        }
        other => bail!(
            "Unknown setting {:?} (expected one of: {})",
            other,
            SETTING_KEYS.join(", ")
        ),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_win_over_settings() {
        let settings = Settings {
            api_url: "http://settings.example".to_string(),
            default_platform: "Android".to_string(),
            notifications: true,
        };
        let overrides = Overrides {
            api_url: Some("https://flag.example".to_string()),
            token: Some("t0ken".to_string()),
            platform: Some("Web".to_string()),
            timeout_secs: Some(30),
        };

        let config = resolve(&settings, &overrides).unwrap();
        assert_eq!(config.api_url, "https://flag.example");
        assert_eq!(config.api_token.as_deref(), Some("t0ken"));
        assert_eq!(config.default_platform, "Web");
        assert_eq!(config.timeout_secs, 30);
    }

    #[test]
    fn test_invalid_flag_url_is_rejected() {
        let overrides = Overrides {
            api_url: Some("localhost:8000".to_string()),
            ..Default::default()
        };
        assert!(resolve(&Settings::default(), &overrides).is_err());
    }

    #[test]
    fn test_apply_setting() {
        let mut settings = Settings::default();

        apply_setting(&mut settings, "notifications", "off").unwrap();
        assert!(!settings.notifications);

        apply_setting(&mut settings, "default_platform", " Web ").unwrap();
        assert_eq!(settings.default_platform, "Web");

        assert!(apply_setting(&mut settings, "api_url", "ftp://nope").is_err());
        assert!(apply_setting(&mut settings, "api_token", "secret").is_err());
        assert!(apply_setting(&mut settings, "colour", "blue").is_err());
    }
}
