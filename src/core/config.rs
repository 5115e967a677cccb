use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf};
use tracing::debug;

use super::amount::Amount;
use super::quote::Currency;

/// Environment variable overriding `api.base_url`.
pub const API_URL_ENV: &str = "BALAM_API_URL";

fn default_base_url() -> String {
    "http://localhost:3000/api".to_string()
}

fn default_token() -> String {
    "fake-jwt-token".to_string()
}

fn default_quote_currency() -> Currency {
    Currency::Mxn
}

fn default_amount() -> u32 {
    Amount::default().get()
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_token")]
    pub token: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        ApiConfig {
            base_url: default_base_url(),
            token: default_token(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AppConfig {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default = "default_quote_currency")]
    pub quote_currency: Currency,
    #[serde(default = "default_amount")]
    pub amount: u32,
    pub data_path: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            api: ApiConfig::default(),
            quote_currency: default_quote_currency(),
            amount: default_amount(),
            data_path: None,
        }
    }
}

impl AppConfig {
    /// Loads the default config file, or defaults when there is none, then
    /// applies the environment override.
    pub fn load() -> Result<Self> {
        debug!("Loading default config");
        let config_path = Self::default_config_path()?;
        let config = if config_path.exists() {
            Self::load_from_path(&config_path)?
        } else {
            debug!("No config at {}, using defaults", config_path.display());
            Self::default()
        };
        Ok(config.with_api_url_override(std::env::var(API_URL_ENV).ok()))
    }

    pub fn default_config_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("mx", "balam", "balam")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.config_dir().join("config.yaml"))
    }

    pub fn default_data_path(&self) -> Result<PathBuf> {
        if let Some(custom_path) = &self.data_path {
            return Ok(PathBuf::from(custom_path));
        }
        let proj_dirs = ProjectDirs::from("mx", "balam", "balam")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.data_dir().to_path_buf())
    }

    pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let config_str = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: Self = serde_yaml::from_str(&config_str)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;
        debug!("Successfully loaded config");
        Ok(config)
    }

    pub fn with_api_url_override(mut self, api_url: Option<String>) -> Self {
        if let Some(url) = api_url.filter(|u| !u.trim().is_empty()) {
            debug!("Using API URL from {API_URL_ENV}");
            self.api.base_url = url;
        }
        self
    }

    /// The configured initial amount, validated like user input.
    pub fn initial_amount(&self) -> Result<Amount> {
        Amount::new(i64::from(self.amount))
            .with_context(|| format!("Invalid amount in config: {}", self.amount))
    }

    pub fn initial_quote_currency(&self) -> Result<Currency> {
        if !self.quote_currency.is_quote_option() {
            anyhow::bail!(
                "Invalid quote_currency in config: {} cannot be received",
                self.quote_currency
            );
        }
        Ok(self.quote_currency)
    }
}
