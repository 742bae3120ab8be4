//! Configuration models.
//!
//! Contains the typed configuration for the exporter: calendar constants,
//! storage location and data directory.

use std::path::PathBuf;

use chrono::{NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

use super::calendar::{WeekCalendar, DEFAULT_WEEK_ENDING};
use super::error::Result;

/// Calendar constants bounding draft discovery.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportConfig {
    /// Date of the very first journal period.
    #[serde(default = "default_launch_date")]
    pub launch_date: NaiveDate,

    /// Weekday every journal period ends on.
    #[serde(default = "default_week_ending")]
    pub week_ending: Weekday,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            launch_date: default_launch_date(),
            week_ending: default_week_ending(),
        }
    }
}

impl ExportConfig {
    /// Builds the calendar these settings describe.
    ///
    /// # Errors
    /// Returns error if the launch date does not fall on the week-ending day.
    pub fn calendar(&self) -> Result<WeekCalendar> {
        WeekCalendar::new(self.launch_date, self.week_ending)
    }
}

fn default_launch_date() -> NaiveDate {
    WeekCalendar::default().launch_date()
}

const fn default_week_ending() -> Weekday {
    DEFAULT_WEEK_ENDING
}

/// Storage configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Path of the journal database (defaults to `<data_dir>/whatgotdone.db`).
    #[serde(default)]
    pub database: Option<PathBuf>,
}

/// Path configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PathConfig {
    /// Base data directory.
    #[serde(default)]
    pub data_dir: Option<PathBuf>,
}

/// Complete application configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub export: ExportConfig,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub paths: PathConfig,
}

impl AppConfig {
    /// Get the data directory, using default if not configured.
    #[must_use]
    pub fn data_dir(&self) -> PathBuf {
        self.paths
            .data_dir
            .clone()
            .unwrap_or_else(Self::default_data_dir)
    }

    /// Get the default data directory path.
    #[must_use]
    pub fn default_data_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".whatgotdone-export")
    }

    /// Get the journal database path.
    #[must_use]
    pub fn database_path(&self) -> PathBuf {
        self.storage
            .database
            .clone()
            .unwrap_or_else(|| self.data_dir().join("whatgotdone.db"))
    }

    /// Get the config file path.
    #[must_use]
    pub fn config_file_path(&self) -> PathBuf {
        self.data_dir().join("config.toml")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::calendar::DEFAULT_LAUNCH_DATE;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.export.week_ending, Weekday::Fri);
        assert_eq!(
            config.export.launch_date,
            NaiveDate::from_ymd_opt(
                DEFAULT_LAUNCH_DATE.0,
                DEFAULT_LAUNCH_DATE.1,
                DEFAULT_LAUNCH_DATE.2
            )
            .unwrap()
        );
        assert!(config.export.calendar().is_ok());
    }

    #[test]
    fn test_database_path_override() {
        let mut config = AppConfig::default();
        config.paths.data_dir = Some(PathBuf::from("/srv/wgd"));
        assert_eq!(config.database_path(), PathBuf::from("/srv/wgd/whatgotdone.db"));

        config.storage.database = Some(PathBuf::from("/tmp/other.db"));
        assert_eq!(config.database_path(), PathBuf::from("/tmp/other.db"));
    }
}
