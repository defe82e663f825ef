//! Configuration system
//!
//! Provides centralized configuration management with:
//! - Environment variable support
//! - Config file loading (optional)
//! - Runtime defaults
//! - Validation and type safety
//!
//! The loaded [`Config`] is constructed once in `main` and passed down
//! explicitly; nothing reads it through a global.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Logging configuration
    pub logging: LoggingConfig,

    /// Paths configuration
    pub paths: PathsConfig,

    /// Report view configuration
    pub report: ReportConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
    pub output: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Directory holding the persisted analytics document.
    pub data_dir: PathBuf,
    pub log_directory: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Rows per page in the session table.
    pub page_size: usize,
    /// Default report window when no date range is given, in days.
    pub window_days: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            logging: LoggingConfig {
                level: "ERROR".to_string(),
                format: "pretty".to_string(),
                output: "console".to_string(),
            },
            paths: PathsConfig {
                data_dir: dirs::data_dir()
                    .unwrap_or_else(|| PathBuf::from("."))
                    .join("mind-gym"),
                log_directory: PathBuf::from("logs"),
            },
            report: ReportConfig {
                page_size: crate::report::DEFAULT_PAGE_SIZE,
                window_days: crate::report::DEFAULT_WINDOW_DAYS,
            },
        }
    }
}

impl Config {
    /// Load configuration from environment, file, and defaults
    pub fn load() -> Result<Self> {
        let mut config = Config::default();

        // Try to load from config file if it exists
        let config_paths = [
            PathBuf::from("mind-gym.toml"),
            PathBuf::from(".mind-gym.toml"),
            dirs::config_dir()
                .map(|d| d.join("mind-gym").join("config.toml"))
                .unwrap_or_default(),
        ];

        for path in &config_paths {
            if path.exists() {
                info!(config_file = %path.display(), "Loading configuration from file");
                config = Self::load_from_file(path)?;
                break;
            }
        }

        // Override with environment variables
        config.apply_env_overrides()?;

        // Validate configuration
        config.validate()?;

        Ok(config)
    }

    /// Load configuration from TOML file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Apply environment variable overrides
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        // Logging overrides
        if let Ok(val) = env::var("LOG_LEVEL") {
            self.logging.level = val;
        }
        if let Ok(val) = env::var("LOG_FORMAT") {
            self.logging.format = val;
        }
        if let Ok(val) = env::var("LOG_OUTPUT") {
            self.logging.output = val;
        }

        // Path overrides
        if let Ok(val) = env::var("MIND_GYM_DATA_DIR") {
            self.paths.data_dir = PathBuf::from(val);
        }
        if let Ok(val) = env::var("MIND_GYM_LOG_DIR") {
            self.paths.log_directory = PathBuf::from(val);
        }

        // Report overrides
        if let Ok(val) = env::var("MIND_GYM_PAGE_SIZE") {
            self.report.page_size = val.parse().context("Invalid MIND_GYM_PAGE_SIZE")?;
        }
        if let Ok(val) = env::var("MIND_GYM_WINDOW_DAYS") {
            self.report.window_days = val.parse().context("Invalid MIND_GYM_WINDOW_DAYS")?;
        }

        Ok(())
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.report.page_size == 0 {
            return Err(anyhow::anyhow!("Report page size must be greater than 0"));
        }

        if self.report.window_days == 0 {
            return Err(anyhow::anyhow!("Report window must be at least one day"));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.logging.level, "ERROR");
        assert_eq!(config.report.page_size, 15);
        assert_eq!(config.report.window_days, 90);
    }

    #[test]
    fn test_env_override() {
        env::set_var("MIND_GYM_PAGE_SIZE", "25");
        let mut config = Config::default();
        config.apply_env_overrides().unwrap();
        assert_eq!(config.report.page_size, 25);
        env::remove_var("MIND_GYM_PAGE_SIZE");
    }

    #[test]
    fn test_validation() {
        let mut config = Config::default();
        config.report.page_size = 0;
        assert!(config.validate().is_err());
    }
}
