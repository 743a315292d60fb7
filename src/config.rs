use anyhow::{Context, Result};
use chrono::Duration;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf};
use tracing::debug;

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ProviderConfig {
    pub base_url: String,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_max_requests")]
    pub max_requests_per_hour: usize,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        ProviderConfig {
            base_url: "https://open.er-api.com".to_string(),
            api_key: None,
            max_requests_per_hour: default_max_requests(),
        }
    }
}

fn default_max_requests() -> usize {
    60
}

fn default_major_currencies() -> Vec<String> {
    ["USD", "EUR", "GBP", "JPY", "INR", "AUD", "CAD"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_freshness_minutes() -> i64 {
    60
}

fn default_staleness_hours() -> i64 {
    24
}

fn default_refresh_minutes() -> u64 {
    30
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AppConfig {
    #[serde(default)]
    pub provider: ProviderConfig,
    /// Base currencies warmed by a full refresh.
    #[serde(default = "default_major_currencies")]
    pub major_currencies: Vec<String>,
    /// Window within which a cached rate is served without a refetch.
    #[serde(default = "default_freshness_minutes")]
    pub freshness_minutes: i64,
    /// Window after which a persisted rate is purged on load.
    #[serde(default = "default_staleness_hours")]
    pub staleness_hours: i64,
    /// Interval between periodic background refreshes.
    #[serde(default = "default_refresh_minutes")]
    pub refresh_minutes: u64,
    /// Overrides the platform cache directory. Mainly for tests.
    #[serde(default)]
    pub cache_dir: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            provider: ProviderConfig::default(),
            major_currencies: default_major_currencies(),
            freshness_minutes: default_freshness_minutes(),
            staleness_hours: default_staleness_hours(),
            refresh_minutes: default_refresh_minutes(),
            cache_dir: None,
        }
    }
}

impl AppConfig {
    /// Loads the config file, falling back to defaults when none exists.
    pub fn load() -> Result<Self> {
        let config_path = Self::default_config_path()?;
        if !config_path.exists() {
            debug!("No config file found, using defaults");
            return Ok(Self::default());
        }
        Self::load_from_path(&config_path)
    }

    pub fn default_config_path() -> Result<PathBuf> {
        let proj_dirs = Self::project_dirs()?;
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

    /// Directory holding the rate cache and prefs file.
    pub fn cache_dir(&self) -> Result<PathBuf> {
        match &self.cache_dir {
            Some(dir) => Ok(dir.clone()),
            None => {
                let proj_dirs = Self::project_dirs()?;
                Ok(proj_dirs.cache_dir().to_path_buf())
            }
        }
    }

    pub fn freshness(&self) -> Duration {
        Duration::minutes(self.freshness_minutes)
    }

    pub fn staleness(&self) -> Duration {
        Duration::hours(self.staleness_hours)
    }

    pub fn refresh_interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.refresh_minutes * 60)
    }

    fn project_dirs() -> Result<ProjectDirs> {
        ProjectDirs::from("in", "codito", "fxq").context("Could not determine project directories")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_deserialization() {
        let yaml_str = r#"
provider:
  base_url: "http://example.com/rates"
  api_key: "sekrit"
major_currencies: ["USD", "EUR"]
freshness_minutes: 30
"#;

        let config: AppConfig = serde_yaml::from_str(yaml_str).expect("Failed to deserialize");
        assert_eq!(config.provider.base_url, "http://example.com/rates");
        assert_eq!(config.provider.api_key, Some("sekrit".to_string()));
        assert_eq!(config.provider.max_requests_per_hour, 60);
        assert_eq!(config.major_currencies, vec!["USD", "EUR"]);
        assert_eq!(config.freshness(), Duration::minutes(30));
        // Unset fields fall back to defaults
        assert_eq!(config.staleness(), Duration::hours(24));
        assert_eq!(config.refresh_minutes, 30);
        assert!(config.cache_dir.is_none());
    }

    #[test]
    fn test_config_defaults() {
        let config: AppConfig = serde_yaml::from_str("{}").unwrap();
        assert_eq!(config.provider.base_url, "https://open.er-api.com");
        assert!(config.provider.api_key.is_none());
        assert_eq!(config.major_currencies.len(), 7);
        assert_eq!(config.freshness(), Duration::minutes(60));
    }

    #[test]
    fn test_load_from_missing_path_fails() {
        let result = AppConfig::load_from_path("/nonexistent/config.yaml");
        assert!(result.is_err());
    }
}
