use crate::core::currency::Currency;
use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf, time::Duration};
use tracing::debug;

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    ExchangerateHost,
    OpenErApi,
    Frankfurter,
}

impl ProviderKind {
    pub fn default_base_url(&self) -> &'static str {
        match self {
            ProviderKind::ExchangerateHost => "https://api.exchangerate.host",
            ProviderKind::OpenErApi => "https://open.er-api.com",
            ProviderKind::Frankfurter => "https://api.frankfurter.app",
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ProviderConfig {
    pub kind: ProviderKind,
    pub base_url: Option<String>,
}

impl ProviderConfig {
    pub fn base_url(&self) -> &str {
        self.base_url
            .as_deref()
            .unwrap_or_else(|| self.kind.default_base_url())
    }
}

fn default_providers() -> Vec<ProviderConfig> {
    [
        ProviderKind::ExchangerateHost,
        ProviderKind::OpenErApi,
        ProviderKind::Frankfurter,
    ]
    .into_iter()
    .map(|kind| ProviderConfig {
        kind,
        base_url: None,
    })
    .collect()
}

fn default_base_currency() -> Currency {
    Currency::Uzs
}

fn default_display_currency() -> Currency {
    Currency::Usd
}

fn default_language() -> String {
    "en".to_string()
}

fn default_cache_ttl_secs() -> u64 {
    3600
}

fn default_failure_backoff_secs() -> u64 {
    300
}

fn default_request_timeout_secs() -> u64 {
    8
}

fn default_user_agent() -> String {
    "vantafx/1.0".to_string()
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AppConfig {
    /// Currency amounts are stored in.
    #[serde(default = "default_base_currency")]
    pub base_currency: Currency,
    /// Currency amounts are shown in.
    #[serde(default = "default_display_currency")]
    pub display_currency: Currency,
    #[serde(default = "default_language")]
    pub language: String,
    #[serde(default)]
    pub offline: bool,
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,
    #[serde(default = "default_failure_backoff_secs")]
    pub failure_backoff_secs: u64,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// Tried in order until one answers with a usable table.
    #[serde(default = "default_providers")]
    pub providers: Vec<ProviderConfig>,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            base_currency: default_base_currency(),
            display_currency: default_display_currency(),
            language: default_language(),
            offline: false,
            cache_ttl_secs: default_cache_ttl_secs(),
            failure_backoff_secs: default_failure_backoff_secs(),
            request_timeout_secs: default_request_timeout_secs(),
            user_agent: default_user_agent(),
            providers: default_providers(),
        }
    }
}

impl AppConfig {
    /// Loads the config from the default location, falling back to defaults
    /// when no file has been created yet.
    pub fn load() -> Result<Self> {
        debug!("Loading default config");
        let config_path = Self::default_config_path()?;
        if !config_path.exists() {
            debug!("No config at {}, using defaults", config_path.display());
            return Ok(Self::default());
        }
        Self::load_from_path(&config_path)
    }

    pub fn default_config_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("com", "vanta", "vantafx")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.config_dir().join("config.yaml"))
    }

    pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let config_str = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: Self = serde_yaml::from_str(&config_str)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;
        debug!("Successfully loaded config");
        Ok(config)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    pub fn failure_backoff(&self) -> Duration {
        Duration::from_secs(self.failure_backoff_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
