//! Configuration file management.
//!
//! Handles loading and saving TOML configuration files.

use std::fs;
use std::path::{Path, PathBuf};

use crate::domain::{AppConfig, AppError, Result};

/// Default configuration file content.
const DEFAULT_CONFIG: &str = r#"# What Got Done export configuration
# Auto-generated - edit as needed

[export]
# First week-ending date the service ever accepted entries for.
launch_date = "2019-03-29"

# Weekday every journal period ends on (must match launch_date).
week_ending = "Fri"

[storage]
# Journal database (optional, defaults to <data_dir>/whatgotdone.db)
# database = "/var/lib/whatgotdone/store.db"

[paths]
# Custom data directory (optional, defaults to ~/.whatgotdone-export)
# data_dir = "/custom/path"
"#;

/// Load configuration from file or create default.
///
/// # Errors
/// Returns error if file exists but cannot be read or parsed.
pub fn load_config() -> Result<AppConfig> {
    let config_path = config_file_path();

    if config_path.exists() {
        load_config_from_file(&config_path)
    } else {
        Ok(AppConfig::default())
    }
}

/// Load configuration from a specific file.
///
/// # Errors
/// Returns error if file cannot be read, parsed, or describes an invalid
/// calendar.
pub fn load_config_from_file(path: &Path) -> Result<AppConfig> {
    let content = fs::read_to_string(path)
        .map_err(|e| AppError::io(format!("Failed to read config file: {}", path.display()), e))?;

    let config: AppConfig = toml::from_str(&content).map_err(|e| AppError::Config {
        message: format!("Failed to parse config file: {e}"),
    })?;

    config.export.calendar()?;

    Ok(config)
}

/// Save configuration to file.
///
/// # Errors
/// Returns error if file cannot be written.
pub fn save_config(config: &AppConfig) -> Result<()> {
    let config_path = config.config_file_path();

    if let Some(parent) = config_path.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| AppError::io("Failed to create config directory", e))?;
    }

    let content = toml::to_string_pretty(config).map_err(|e| AppError::Config {
        message: format!("Failed to serialize config: {e}"),
    })?;

    fs::write(&config_path, content).map_err(|e| {
        AppError::io(
            format!("Failed to write config file: {}", config_path.display()),
            e,
        )
    })?;

    tracing::info!(path = %config_path.display(), "Configuration saved");

    Ok(())
}

/// Create default configuration file if it doesn't exist.
///
/// # Errors
/// Returns error if file cannot be created.
pub fn ensure_config_exists(config_path: &Path) -> Result<()> {
    if !config_path.exists() {
        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| AppError::io("Failed to create config directory", e))?;
        }

        fs::write(config_path, DEFAULT_CONFIG)
            .map_err(|e| AppError::io("Failed to create default config", e))?;

        tracing::info!(path = %config_path.display(), "Created default configuration");
    }

    Ok(())
}

/// Get the path to the default configuration file.
#[must_use]
pub fn config_file_path() -> PathBuf {
    AppConfig::default_data_dir().join("config.toml")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Weekday;
    use tempfile::tempdir;

    #[test]
    fn test_default_config_parses() {
        let config: AppConfig = toml::from_str(DEFAULT_CONFIG).unwrap();
        assert_eq!(config.export.week_ending, Weekday::Fri);
        assert_eq!(config.export.launch_date.to_string(), "2019-03-29");
        assert!(config.storage.database.is_none());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempdir().unwrap();
        let mut config = AppConfig::default();
        config.paths.data_dir = Some(dir.path().to_path_buf());

        save_config(&config).unwrap();
        let loaded = load_config_from_file(&config.config_file_path()).unwrap();

        assert_eq!(loaded.export.launch_date, config.export.launch_date);
        assert_eq!(loaded.paths.data_dir, config.paths.data_dir);
    }

    #[test]
    fn test_ensure_config_exists_writes_default_once() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("sub").join("config.toml");

        ensure_config_exists(&path).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), DEFAULT_CONFIG);

        fs::write(&path, "[export]\n").unwrap();
        ensure_config_exists(&path).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "[export]\n");
    }

    #[test]
    fn test_misaligned_calendar_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[export]\nlaunch_date = \"2019-03-28\"\nweek_ending = \"Fri\"\n").unwrap();

        let err = load_config_from_file(&path).unwrap_err();
        assert!(matches!(err, AppError::Config { .. }));
    }
}
