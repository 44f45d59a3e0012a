//! Configuration file support for fitcal.
//!
//! Configuration is loaded from `$XDG_CONFIG_HOME/fitcal/config.toml`.

use crate::schedule::{DEFAULT_HORIZON_DAYS, MAX_HORIZON_DAYS};
use crate::{Error, Result};
use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application configuration
#[derive(Clone, Debug, Serialize, Deserialize, Default, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub data: DataConfig,

    #[serde(default)]
    pub user: UserConfig,

    #[serde(default)]
    pub schedule: ScheduleConfig,
}

/// Data storage configuration
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct DataConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

/// The local user identity
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct UserConfig {
    #[serde(default = "default_email")]
    pub email: String,

    #[serde(default = "default_display_name")]
    pub display_name: String,

    #[serde(default = "default_true")]
    pub signed_in: bool,
}

impl Default for UserConfig {
    fn default() -> Self {
        Self {
            email: default_email(),
            display_name: default_display_name(),
            signed_in: true,
        }
    }
}

/// Scheduling defaults
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ScheduleConfig {
    /// Days covered by a repeating schedule without an end date
    #[serde(default = "default_horizon_days")]
    pub horizon_days: i64,

    /// Time of day used when none is given, "HH:MM"
    #[serde(default = "default_time")]
    pub default_time: String,

    #[serde(default = "default_true")]
    pub reminder_enabled: bool,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            horizon_days: default_horizon_days(),
            default_time: default_time(),
            reminder_enabled: true,
        }
    }
}

impl ScheduleConfig {
    pub fn default_time(&self) -> Result<NaiveTime> {
        crate::types::hhmm::parse(&self.default_time).map_err(|e| {
            Error::Config(format!(
                "schedule.default_time {:?} is not HH:MM: {}",
                self.default_time, e
            ))
        })
    }
}

// Default value functions
fn default_data_dir() -> PathBuf {
    let base = dirs::data_local_dir().unwrap_or_else(|| {
        std::env::var_os("HOME")
            .map(|home| PathBuf::from(home).join(".local/share"))
            .unwrap_or_else(|| PathBuf::from("."))
    });
    base.join("fitcal")
}

fn default_email() -> String {
    "athlete@localhost".into()
}

fn default_display_name() -> String {
    "Athlete".into()
}

fn default_horizon_days() -> i64 {
    DEFAULT_HORIZON_DAYS
}

fn default_time() -> String {
    "09:00".into()
}

fn default_true() -> bool {
    true
}

impl Config {
    /// Load configuration from the standard config path
    pub fn load() -> Result<Self> {
        Self::load_or_default(&Self::default_config_path())
    }

    /// Load from `path` when it exists, defaults otherwise
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load_from(path)
        } else {
            tracing::info!("No config file found at {:?}, using defaults", path);
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        tracing::info!("Loaded config from {:?}", path);
        Ok(config)
    }

    /// Reject values that would only fail later
    pub fn validate(&self) -> Result<()> {
        if !(0..=MAX_HORIZON_DAYS).contains(&self.schedule.horizon_days) {
            return Err(Error::Config(format!(
                "schedule.horizon_days must be between 0 and {}, got {}",
                MAX_HORIZON_DAYS, self.schedule.horizon_days
            )));
        }
        self.schedule.default_time()?;
        if self.user.email.trim().is_empty() {
            return Err(Error::Config("user.email must not be empty".into()));
        }
        Ok(())
    }

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        let base = dirs::config_dir().unwrap_or_else(|| {
            std::env::var_os("HOME")
                .map(|home| PathBuf::from(home).join(".config"))
                .unwrap_or_else(|| PathBuf::from("."))
        });
        base.join("fitcal").join("config.toml")
    }

    /// Save the current configuration to the default path
    pub fn save(&self) -> Result<()> {
        let config_path = Self::default_config_path();
        self.save_to(&config_path)
    }

    /// Save the current configuration to a specific path
    pub fn save_to(&self, path: &Path) -> Result<()> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, contents)?;
        tracing::info!("Saved config to {:?}", path);
        Ok(())
    }
}
