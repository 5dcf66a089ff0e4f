//! Configuration file management for dayplan.
//!
//! Provides a TOML config file at `~/.config/dayplan/config.toml` and a
//! resolution chain: CLI flag > env var > config file > default.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use dayplan_core::dates;
use dayplan_core::llm::LlmConfig;
use dayplan_core::planner::WorkHours;
use dayplan_db::config::DbConfig;

// -----------------------------------------------------------------------
// Config file types
// -----------------------------------------------------------------------

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub database: DatabaseSection,
    #[serde(default)]
    pub llm: LlmSection,
    #[serde(default)]
    pub planning: PlanningSection,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct DatabaseSection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct LlmSection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

/// Default working-hours window, as `"HH:MM"` strings.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct PlanningSection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub work_start: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub work_end: Option<String>,
}

// -----------------------------------------------------------------------
// Paths
// -----------------------------------------------------------------------

/// Return the dayplan config directory: `$XDG_CONFIG_HOME/dayplan` or
/// `~/.config/dayplan`, on every platform.
pub fn config_dir() -> PathBuf {
    if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
        return PathBuf::from(xdg).join("dayplan");
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("dayplan")
}

/// Return the path to the dayplan config file.
pub fn config_path() -> PathBuf {
    config_dir().join("config.toml")
}

// -----------------------------------------------------------------------
// Read / write
// -----------------------------------------------------------------------

/// Load and parse a config file.
pub fn load_config(path: &Path) -> Result<ConfigFile> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config file at {}", path.display()))?;
    let config: ConfigFile = toml::from_str(&contents)
        .with_context(|| format!("failed to parse config file at {}", path.display()))?;
    Ok(config)
}

/// Serialize and write a config file, creating parent dirs as needed.
/// The file may hold an API key, so it is made owner-only on Unix.
pub fn save_config(path: &Path, config: &ConfigFile) -> Result<()> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("failed to create config directory {}", dir.display()))?;
    }

    let contents = toml::to_string_pretty(config).context("failed to serialize config")?;
    std::fs::write(path, &contents)
        .with_context(|| format!("failed to write config file at {}", path.display()))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let perms = std::fs::Permissions::from_mode(0o600);
        std::fs::set_permissions(path, perms)
            .with_context(|| format!("failed to set permissions on {}", path.display()))?;
    }

    Ok(())
}

// -----------------------------------------------------------------------
// Resolved config
// -----------------------------------------------------------------------

/// Fully resolved configuration, ready for use.
#[derive(Debug)]
pub struct DayplanConfig {
    pub db_config: DbConfig,
    pub llm_config: LlmConfig,
    pub work_hours: WorkHours,
}

impl DayplanConfig {
    /// Resolve configuration from the default config file location.
    pub fn resolve(cli_db_url: Option<&str>) -> Result<Self> {
        let path = config_path();
        let file = if path.exists() {
            load_config(&path)?
        } else {
            ConfigFile::default()
        };
        Self::from_sources(cli_db_url, file)
    }

    /// Resolve each setting with the chain CLI flag > env var > config file >
    /// default. A missing API key is not an error here; generation reports it.
    pub fn from_sources(cli_db_url: Option<&str>, file: ConfigFile) -> Result<Self> {
        let db_url = cli_db_url
            .map(str::to_owned)
            .or_else(|| env_var(DbConfig::ENV_VAR))
            .or(file.database.url)
            .unwrap_or_else(|| DbConfig::DEFAULT_URL.to_owned());

        let timeout_secs = match env_var(LlmConfig::TIMEOUT_ENV) {
            Some(raw) => raw.parse::<u64>().with_context(|| {
                format!("{} must be a whole number of seconds", LlmConfig::TIMEOUT_ENV)
            })?,
            None => file
                .llm
                .timeout_secs
                .unwrap_or(LlmConfig::DEFAULT_TIMEOUT_SECS),
        };

        let llm_config = LlmConfig {
            api_key: env_var(LlmConfig::API_KEY_ENV).or(file.llm.api_key),
            model: env_var(LlmConfig::MODEL_ENV)
                .or(file.llm.model)
                .unwrap_or_else(|| LlmConfig::DEFAULT_MODEL.to_owned()),
            base_url: env_var(LlmConfig::BASE_URL_ENV)
                .or(file.llm.base_url)
                .unwrap_or_else(|| LlmConfig::DEFAULT_BASE_URL.to_owned()),
            timeout: Duration::from_secs(timeout_secs),
        };

        let defaults = WorkHours::default();
        let work_hours = WorkHours {
            start: match file.planning.work_start.as_deref() {
                Some(raw) => dates::parse_time(raw).context("invalid planning.work_start")?,
                None => defaults.start,
            },
            end: match file.planning.work_end.as_deref() {
                Some(raw) => dates::parse_time(raw).context("invalid planning.work_end")?,
                None => defaults.end,
            },
        };

        Ok(Self {
            db_config: DbConfig::new(db_url),
            llm_config,
            work_hours,
        })
    }
}

/// A set, non-blank environment variable.
fn env_var(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
}

// -----------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------
