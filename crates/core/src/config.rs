//! Application Configuration
//!
//! Manages all controller settings including:
//! - Logging preferences
//! - Ad unit ids per format
//! - Retry timing
//! - Display policies for busy / detached states

use std::path::{Path, PathBuf};
use std::time::Duration;
use serde::{Deserialize, Serialize};
use directories::ProjectDirs;
use tracing::{info, debug};

use crate::error::{Result, RotorError};
use crate::types::AdFormat;

/// Delay before a failed slot load is retried
pub const DEFAULT_RETRY_DELAY_MS: u64 = 5000;

/// What to do with a display request that cannot run right now
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum DisplayPolicy {
    /// Drop the request; the caller has to ask again
    #[default]
    Drop,
    /// Remember a single pending request and replay it once possible
    Defer,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Maximum level (trace, debug, info, warn, error)
    pub level: String,
    /// Include source file and line in log lines
    pub with_file: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            with_file: true,
        }
    }
}

/// Settings for one rewarded ad controller
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RewardConfig {
    /// Ad format requested from the SDK
    pub format: AdFormat,
    /// Ad unit id issued by the ad network
    pub ad_unit_id: String,
    /// Delay before retrying a failed load, in milliseconds
    pub retry_delay_ms: u64,
    /// Behaviour when a display is requested while one is running
    pub busy_policy: DisplayPolicy,
    /// Behaviour when a display is requested with no surface attached
    pub no_surface_policy: DisplayPolicy,
    /// Hashed ids of devices that must receive test ads
    pub test_device_hashed_ids: Vec<String>,
}

impl Default for RewardConfig {
    fn default() -> Self {
        Self::for_format(AdFormat::Rewarded)
    }
}

impl RewardConfig {
    /// Create a config with default timing and policies
    pub fn new(format: AdFormat, ad_unit_id: impl Into<String>) -> Self {
        Self {
            format,
            ad_unit_id: ad_unit_id.into(),
            retry_delay_ms: DEFAULT_RETRY_DELAY_MS,
            busy_policy: DisplayPolicy::Drop,
            no_surface_policy: DisplayPolicy::Drop,
            test_device_hashed_ids: Vec::new(),
        }
    }

    /// Config pointing at the public test ad unit for `format`
    pub fn for_format(format: AdFormat) -> Self {
        Self::new(format, format.test_ad_unit_id())
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    /// Reject configurations the controller cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.ad_unit_id.trim().is_empty() {
            return Err(RotorError::Config(format!(
                "{} ad unit id cannot be empty",
                self.format
            )));
        }
        if self.retry_delay_ms == 0 {
            return Err(RotorError::Config(format!(
                "{} retry delay must be greater than zero",
                self.format
            )));
        }
        Ok(())
    }
}

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Configuration version for migrations
    pub version: u32,
    /// Logging settings
    pub logging: LoggingConfig,
    /// Rewarded video controller
    pub rewarded: Option<RewardConfig>,
    /// Rewarded interstitial controller
    pub rewarded_interstitial: Option<RewardConfig>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            version: 1,
            logging: LoggingConfig::default(),
            rewarded: Some(RewardConfig::for_format(AdFormat::Rewarded)),
            rewarded_interstitial: Some(RewardConfig::for_format(AdFormat::RewardedInterstitial)),
        }
    }
}

impl AppConfig {
    /// Get the configuration directory path
    pub fn config_dir() -> Option<PathBuf> {
        ProjectDirs::from("com", "rewardrotor", "Reward-Rotor")
            .map(|dirs| dirs.config_dir().to_path_buf())
    }

    /// Get the configuration file path
    pub fn config_file() -> Option<PathBuf> {
        Self::config_dir().map(|dir| dir.join("config.toml"))
    }

    /// Load configuration from the default location, writing defaults on first run
    pub async fn load() -> Result<Self> {
        let config_file = Self::config_file()
            .ok_or_else(|| RotorError::Config("Cannot determine config path".into()))?;

        if config_file.exists() {
            Self::load_from(&config_file).await
        } else {
            info!("Config file not found, using defaults");
            let config = AppConfig::default();
            config.save_to(&config_file).await?;
            Ok(config)
        }
    }

    /// Load and validate configuration from a specific file
    pub async fn load_from(path: &Path) -> Result<Self> {
        debug!("Loading config from {:?}", path);
        let contents = tokio::fs::read_to_string(path).await?;
        let config: AppConfig = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a specific file
    pub async fn save_to(&self, path: &Path) -> Result<()> {
        // Ensure directory exists
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let contents = toml::to_string_pretty(self)?;
        tokio::fs::write(path, contents).await?;

        debug!("Config saved to {:?}", path);
        Ok(())
    }

    /// Controller config for a format, if that format is enabled
    pub fn reward(&self, format: AdFormat) -> Option<&RewardConfig> {
        match format {
            AdFormat::Rewarded => self.rewarded.as_ref(),
            AdFormat::RewardedInterstitial => self.rewarded_interstitial.as_ref(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        for (format, section) in [
            (AdFormat::Rewarded, &self.rewarded),
            (AdFormat::RewardedInterstitial, &self.rewarded_interstitial),
        ] {
            if let Some(section) = section {
                if section.format != format {
                    return Err(RotorError::Config(format!(
                        "[{}] section declares format {}",
                        format, section.format
                    )));
                }
                section.validate()?;
            }
        }
        Ok(())
    }
}
