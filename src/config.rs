use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{anyhow, bail, Result};
use serde::{Deserialize, Serialize};

use crate::theme::Theme;

pub const DEFAULT_ENDPOINT: &str = "http://127.0.0.1:5000/api/chat";
pub const DEFAULT_GREETING: &str =
    "Hello! Welcome to Aphator Tech. How can I assist you with our crypto and tech services today?";
pub const ENDPOINT_ENV: &str = "APHATOR_ENDPOINT";

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct Config {
    pub endpoint: String,
    pub request_timeout_secs: u64,
    pub reply_delay_ms: u64,
    pub greeting: Option<String>,
    pub default_theme: Theme,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            request_timeout_secs: 30,
            reply_delay_ms: 500,
            greeting: Some(DEFAULT_GREETING.to_string()),
            default_theme: Theme::Dark,
        }
    }
}

impl Config {
    /// Load from the default location, then apply the environment override
    pub fn load() -> Result<Self> {
        Ok(Self::load_from(&Self::config_path()?)?.with_env_overrides())
    }

    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(endpoint) = std::env::var(ENDPOINT_ENV) {
            self.endpoint = endpoint;
        }
        self
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let config_content = fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&config_content)?;
        if config.request_timeout_secs == 0 {
            bail!("request_timeout_secs in {} must be at least 1", path.display());
        }
        Ok(config)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn reply_delay(&self) -> Duration {
        Duration::from_millis(self.reply_delay_ms)
    }

    pub fn config_dir() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow!("Could not determine config directory"))?;

        Ok(config_dir.join("aphator"))
    }

    fn config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.json"))
    }
}
