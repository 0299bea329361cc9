/*
[INPUT]:  YAML configuration file
[OUTPUT]: Parsed and validated viewer configuration
[POS]:    Configuration layer - client, pager and palette setup
[UPDATE]: When adding new configuration options
*/

use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use logview_adapter::ClientConfig;
use serde::{Deserialize, Serialize};

use crate::levels::LevelPalette;
use crate::pager::PagerOptions;

/// Top-level configuration for the log viewer
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ViewerConfig {
    /// Root URL of the log server (e.g., "http://127.0.0.1:8080")
    pub base_url: String,
    /// Path of the log window endpoint, joined onto `base_url`
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    /// Lines per page
    #[serde(default = "default_page_size")]
    pub page_size: u32,
    /// Auto-refresh period in milliseconds
    #[serde(default = "default_auto_refresh_ms")]
    pub auto_refresh_ms: u64,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
    /// Level color overrides: "WARN" -> "#FFA500"
    #[serde(default)]
    pub level_colors: BTreeMap<String, String>,
}

fn default_endpoint() -> String {
    logview_adapter::http::client::DEFAULT_LOG_ENDPOINT.to_string()
}

fn default_page_size() -> u32 {
    crate::pager::DEFAULT_PAGE_SIZE
}

fn default_auto_refresh_ms() -> u64 {
    2_000
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_connect_timeout_secs() -> u64 {
    10
}

impl ViewerConfig {
    /// Defaults for everything but the server
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            endpoint: default_endpoint(),
            page_size: default_page_size(),
            auto_refresh_ms: default_auto_refresh_ms(),
            timeout_secs: default_timeout_secs(),
            connect_timeout_secs: default_connect_timeout_secs(),
            level_colors: BTreeMap::new(),
        }
    }

    /// Load configuration from YAML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        Self::from_yaml_str(&content).with_context(|| format!("invalid config file {}", path.display()))
    }

    pub fn from_yaml_str(content: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(content)?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.base_url.trim().is_empty() {
            bail!("base_url must not be empty");
        }
        if self.page_size == 0 {
            bail!("page_size must be at least 1");
        }
        if self.auto_refresh_ms == 0 {
            bail!("auto_refresh_ms must be greater than zero");
        }
        if self.timeout_secs == 0 {
            bail!("timeout_secs must be greater than zero");
        }
        self.level_palette()?;
        Ok(())
    }

    pub fn auto_refresh_interval(&self) -> Duration {
        Duration::from_millis(self.auto_refresh_ms)
    }

    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            timeout: Duration::from_secs(self.timeout_secs),
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
        }
    }

    pub fn pager_options(&self, start: u64) -> PagerOptions {
        PagerOptions {
            page_size: self.page_size,
            start,
            auto_refresh_interval: self.auto_refresh_interval(),
        }
    }

    pub fn level_palette(&self) -> Result<LevelPalette> {
        LevelPalette::with_overrides(&self.level_colors).context("invalid level_colors")
    }
}
