use anyhow::{Context, Result};
use dirs::config_dir;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

const APP_NAME: &str = "feature-configurator";
const CONFIG_FILE: &str = "config.json";

pub const DEFAULT_PORT: u16 = 17020;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// Port for the session HTTP host
    pub port: u16,
    /// Address the HTTP host binds to
    pub bind: String,
    /// Model used when a command is not given one
    pub default_model: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            bind: "127.0.0.1".to_string(),
            default_model: None,
        }
    }
}

impl Settings {
    /// Load settings from the user's config directory, then apply `FCFG_PORT`
    /// and `FCFG_BIND`. Returns defaults if the file doesn't exist or fails to parse.
    pub fn load() -> Self {
        let settings = match Self::try_load() {
            Ok(settings) => settings,
            Err(e) => {
                tracing::warn!("Failed to load settings, using defaults: {:#}", e);
                Self::default()
            }
        };
        settings.with_env()
    }

    fn try_load() -> Result<Self> {
        let config_path = get_config_path()?;
        if !config_path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(&config_path).context("Failed to read config file")?;
        Self::from_json(&content)
    }

    pub fn from_json(content: &str) -> Result<Self> {
        serde_json::from_str(content).context("Failed to parse config file")
    }

    fn with_env(mut self) -> Self {
        if let Some(port) = std::env::var("FCFG_PORT").ok().and_then(|p| p.parse().ok()) {
            self.port = port;
        }
        if let Ok(bind) = std::env::var("FCFG_BIND") {
            self.bind = bind;
        }
        self
    }

    /// Save the current settings to disk.
    pub fn save(&self) -> Result<()> {
        let config_path = get_config_path()?;

        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let content = serde_json::to_string_pretty(self).context("Failed to serialize settings")?;
        fs::write(&config_path, content).context("Failed to write config file")?;
        Ok(())
    }
}

fn get_config_path() -> Result<PathBuf> {
    let mut path =
        config_dir().ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;
    path.push(APP_NAME);
    path.push(CONFIG_FILE);
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_file_keeps_defaults() {
        let settings = Settings::from_json(r#"{"port": 9000}"#).unwrap();
        assert_eq!(settings.port, 9000);
        assert_eq!(settings.bind, "127.0.0.1");
        assert!(settings.default_model.is_none());
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        assert!(Settings::from_json("port = 9000").is_err());
    }
}
