// ABOUTME: CLI commands for the persisted settings file
// ABOUTME: The API token is only ever reported as set or not set

use a11y_cli::config::{apply_setting, resolve, Overrides, SETTING_KEYS};
use a11y_client::config::settings_path;
use a11y_client::Settings;
use anyhow::Result;
use clap::Subcommand;
use colored::*;

use super::utils::table;

#[derive(Subcommand)]
pub enum SettingsCommands {
    /// Show persisted settings and the effective configuration
    Show,
    /// Change a setting (api_url, default_platform, notifications)
    Set {
        /// Setting name
        key: String,
        /// New value
        value: String,
    },
    /// Print the settings file location
    Path,
}

pub async fn handle_settings_command(command: SettingsCommands, overrides: &Overrides) -> Result<()> {
    match command {
        SettingsCommands::Show => show_settings(overrides).await,
        SettingsCommands::Set { key, value } => {
            let mut settings = Settings::load().await?;
            apply_setting(&mut settings, &key, &value)?;
            settings.save().await?;
            println!("{} {} = {}", "✓".green().bold(), key.bold(), value);
            Ok(())
        }
        SettingsCommands::Path => {
            println!("{}", settings_path().display());
            Ok(())
        }
    }
}

async fn show_settings(overrides: &Overrides) -> Result<()> {
    let settings = Settings::load().await?;

    println!("{}", "⚙️  Settings".blue().bold());
    println!("{}", settings_path().display().to_string().dimmed());
    println!();

    let mut saved = table(vec!["Setting", "Value"]);
    for key in SETTING_KEYS {
        let value = match key {
            "api_url" => settings.api_url.clone(),
            "default_platform" => settings.default_platform.clone(),
            _ if settings.notifications => "on".to_string(),
            _ => "off".to_string(),
        };
        saved.add_row(vec![key.to_string(), value]);
    }
    println!("{}", saved);

    match resolve(&settings, overrides) {
        Ok(config) => {
            println!();
            println!("{}", "Effective configuration".green().bold());
            let mut effective = table(vec!["Setting", "Value"]);
            effective.add_row(vec!["api_url".to_string(), config.base_url().to_string()]);
            effective.add_row(vec!["default_platform".to_string(), config.default_platform.clone()]);
            effective.add_row(vec!["timeout".to_string(), format!("{}s", config.timeout_secs)]);
            let token = if config.api_token.is_some() { "set" } else { "not set" };
            effective.add_row(vec!["api_token".to_string(), token.to_string()]);
            println!("{}", effective);
        }
        Err(e) => {
            println!();
            println!("{} {}", "Configuration is invalid:".red().bold(), e);
        }
    }
    Ok(())
}
