//! Application settings
//!
//! Read from a TOML file (by default `~/.config/catalog-cli/config.toml`).
//! Connection values missing from the file fall back to environment
//! variables, which may come from a `.env` file.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use chrono::{DateTime, Duration, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::api::{DEFAULT_API_VERSION, RetryConfig};

pub const APP_NAME: &str = "catalog-cli";
pub const ACCESS_TOKEN_ENV: &str = "SF_ACCESS_TOKEN";
pub const INSTANCE_URL_ENV: &str = "SF_INSTANCE_URL";
pub const DEFAULT_NUMBER_OF_DAYS: u32 = 7;

/// Org connection settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionConfig {
    pub instance_url: Option<String>,
    pub api_version: String,
    pub access_token: Option<String>,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            instance_url: None,
            api_version: DEFAULT_API_VERSION.to_string(),
            access_token: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Root product of the catalog walk
    pub product_id: Option<String>,
    /// Size of the change window in days
    pub number_of_days: u32,
    /// Parent of the timestamped run folders
    pub output_dir: PathBuf,
    /// IANA zone for timestamps without an offset
    pub timezone: String,
    /// Entity definitions replacing the bundled ones
    pub entities_file: Option<PathBuf>,
    pub connection: ConnectionConfig,
    pub retry: RetryConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            product_id: None,
            number_of_days: DEFAULT_NUMBER_OF_DAYS,
            output_dir: PathBuf::from("output"),
            timezone: "UTC".to_string(),
            entities_file: None,
            connection: ConnectionConfig::default(),
            retry: RetryConfig::default(),
        }
    }
}

impl AppConfig {
    /// `~/.config/catalog-cli/config.toml`
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(APP_NAME)
            .join("config.toml")
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse configuration")
    }

    /// Load from `path`, or from the default location when it exists
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => {
                let default = Self::default_path();
                if !default.exists() {
                    log::debug!("No config at {}, using defaults", default.display());
                    return Ok(Self::default());
                }
                default
            }
        };

        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::from_toml_str(&content).with_context(|| format!("Invalid config file: {}", path.display()))
    }

    /// Fill connection values missing from the file using `lookup`
    pub fn with_env_fallback<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let present = |value: &Option<String>| value.as_deref().is_some_and(|v| !v.trim().is_empty());

        if !present(&self.connection.access_token) {
            self.connection.access_token = lookup(ACCESS_TOKEN_ENV);
        }
        if !present(&self.connection.instance_url) {
            self.connection.instance_url = lookup(INSTANCE_URL_ENV);
        }
        self
    }

    /// Apply the process environment as fallback
    pub fn with_process_env(self) -> Self {
        self.with_env_fallback(|key| std::env::var(key).ok())
    }

    pub fn timezone(&self) -> Result<Tz> {
        self.timezone
            .parse::<Tz>()
            .map_err(|e| anyhow::anyhow!("Unknown timezone '{}': {}", self.timezone, e))
    }

    /// Start of the change window
    pub fn cutoff(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now - Duration::days(i64::from(self.number_of_days))
    }

    pub fn product_id(&self) -> Result<&str> {
        match self.product_id.as_deref().map(str::trim) {
            Some(id) if !id.is_empty() => Ok(id),
            _ => bail!("No product id configured. Set product_id in the config or pass --product-id"),
        }
    }

    pub fn instance_url(&self) -> Result<&str> {
        match self.connection.instance_url.as_deref() {
            Some(url) if !url.trim().is_empty() => Ok(url),
            _ => bail!(
                "No instance URL configured. Set connection.instance_url or {}",
                INSTANCE_URL_ENV
            ),
        }
    }

    pub fn access_token(&self) -> Result<&str> {
        match self.connection.access_token.as_deref() {
            Some(token) if !token.trim().is_empty() => Ok(token),
            _ => bail!(
                "No access token configured. Set connection.access_token or {}",
                ACCESS_TOKEN_ENV
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_defaults_when_empty() {
        let config = AppConfig::from_toml_str("").unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.number_of_days, 7);
        assert_eq!(config.output_dir, PathBuf::from("output"));
        assert_eq!(config.timezone().unwrap(), Tz::UTC);
    }

    #[test]
    fn test_parse_full_config() {
        let config = AppConfig::from_toml_str(
            r#"
            product_id = "01t000000000001"
            number_of_days = 14
            output_dir = "reports"
            timezone = "Europe/Brussels"

            [connection]
            instance_url = "https://acme.my.salesforce.com"
            api_version = "59.0"

            [retry]
            max_attempts = 5
            "#,
        )
        .unwrap();

        assert_eq!(config.product_id().unwrap(), "01t000000000001");
        assert_eq!(config.number_of_days, 14);
        assert_eq!(config.connection.api_version, "59.0");
        assert_eq!(config.retry.max_attempts, 5);
        assert_eq!(config.retry.base_delay_ms, RetryConfig::default().base_delay_ms);
        assert_eq!(config.timezone().unwrap(), chrono_tz::Europe::Brussels);
    }

    #[test]
    fn test_env_fallback_only_fills_gaps() {
        let config = AppConfig::from_toml_str(
            r#"
            [connection]
            instance_url = "https://from-file.my.salesforce.com"
            "#,
        )
        .unwrap()
        .with_env_fallback(|key| match key {
            ACCESS_TOKEN_ENV => Some("env-token".to_string()),
            INSTANCE_URL_ENV => Some("https://from-env".to_string()),
            _ => None,
        });

        assert_eq!(config.access_token().unwrap(), "env-token");
        assert_eq!(config.instance_url().unwrap(), "https://from-file.my.salesforce.com");
    }

    #[test]
    fn test_missing_values_are_reported() {
        let config = AppConfig::default().with_env_fallback(|_| None);
        assert!(config.product_id().is_err());
        assert!(config.access_token().unwrap_err().to_string().contains(ACCESS_TOKEN_ENV));
        assert!(AppConfig {
            timezone: "Mars/Olympus".into(),
            ..AppConfig::default()
        }
        .timezone()
        .is_err());
    }

    #[test]
    fn test_cutoff_window() {
        let config = AppConfig::default();
        let now = Utc.with_ymd_and_hms(2024, 5, 8, 12, 0, 0).unwrap();
        assert_eq!(
            config.cutoff(now),
            Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
        );
    }
}
