// src/core/config_manager.rs
//! Configuration: optional config.yaml with per-environment sections, then env overrides

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

use crate::core::notifications::DEFAULT_LIFETIME;
use crate::upload_validator::MAX_RESUME_SIZE;

pub const DEFAULT_API_URL: &str = "http://localhost:8000/api";
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;
const DEFAULT_CONFIG_FILE: &str = "config.yaml";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub api_url: String,
    pub timeout_seconds: u64,
    pub max_upload_bytes: u64,
    pub notification_seconds: u64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            timeout_seconds: DEFAULT_TIMEOUT_SECS,
            max_upload_bytes: MAX_RESUME_SIZE,
            notification_seconds: DEFAULT_LIFETIME.as_secs(),
        }
    }
}

impl ServiceConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    pub fn notification_lifetime(&self) -> Duration {
        Duration::from_secs(self.notification_seconds)
    }

    /// A zero timeout fails every request and a zero lifetime hides every notification
    pub fn validate(&self) -> Result<()> {
        if self.timeout_seconds == 0 {
            anyhow::bail!("timeout_seconds must be greater than 0");
        }
        if self.notification_seconds == 0 {
            anyhow::bail!("notification_seconds must be greater than 0");
        }
        if self.max_upload_bytes == 0 {
            anyhow::bail!("max_upload_bytes must be greater than 0");
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    /// JSON log file written alongside the console output
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
struct EnvironmentSection {
    service: ServiceConfig,
    logging: LoggingConfig,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ConfigFile {
    local: EnvironmentSection,
    production: EnvironmentSection,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigManager {
    pub environment: String,
    pub service: ServiceConfig,
    pub logging: LoggingConfig,
}

impl Default for ConfigManager {
    fn default() -> Self {
        Self {
            environment: "local".to_string(),
            service: ServiceConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl ConfigManager {
    /// Load configuration for the current environment
    pub fn load() -> Result<Self> {
        let environment = Self::get_environment();
        let config_path = std::env::var("HR_COPILOT_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_FILE));

        let mut config = Self::load_from_file(&config_path, &environment)?;
        config.apply_overrides(|key| std::env::var(key).ok())?;

        info!("Loaded configuration for environment: {}", config.environment);
        Ok(config)
    }

    fn get_environment() -> String {
        std::env::var("HR_COPILOT_ENV")
            .or_else(|_| std::env::var("ENVIRONMENT"))
            .unwrap_or_else(|_| "local".to_string())
    }

    /// A missing file is not an error; defaults apply
    pub fn load_from_file(path: &Path, environment: &str) -> Result<Self> {
        if !path.exists() {
            return Ok(Self {
                environment: environment.to_string(),
                ..Default::default()
            });
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Self::from_yaml_str(&content, environment)
            .with_context(|| format!("Failed to parse {}", path.display()))
    }

    pub fn from_yaml_str(content: &str, environment: &str) -> Result<Self> {
        let file: ConfigFile = serde_yaml::from_str(content).context("Invalid configuration")?;

        let section = match environment {
            "production" => file.production,
            _ => file.local,
        };

        section
            .service
            .validate()
            .with_context(|| format!("Invalid service settings for '{}'", environment))?;

        Ok(Self {
            environment: environment.to_string(),
            service: section.service,
            logging: section.logging,
        })
    }

    /// Apply `HR_COPILOT_*` overrides from `lookup`
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("HR_COPILOT_API_URL") {
            self.service.api_url = url;
        }

        if let Some(raw) = lookup("HR_COPILOT_TIMEOUT_SECS") {
            self.service.timeout_seconds = raw
                .trim()
                .parse()
                .context("HR_COPILOT_TIMEOUT_SECS must be a whole number of seconds")?;
        }

        if let Some(level) = lookup("HR_COPILOT_LOG") {
            self.logging.level = level;
        }

        if let Some(file) = lookup("HR_COPILOT_LOG_FILE") {
            self.logging.file = Some(PathBuf::from(file));
        }

        self.service
            .validate()
            .context("Invalid HR_COPILOT_* override")
    }
}
