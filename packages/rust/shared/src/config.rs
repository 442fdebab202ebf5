//! Application configuration for HealthDigest.
//!
//! User config lives at `~/.healthdigest/healthdigest.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{HealthDigestError, Result};
use crate::types::{Goal, GoalKind};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "healthdigest.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".healthdigest";

// ---------------------------------------------------------------------------
// Config structs (matching healthdigest.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Global defaults.
    #[serde(default)]
    pub defaults: DefaultsConfig,

    /// Document normalization settings.
    #[serde(default)]
    pub extraction: ExtractionConfig,
}

/// `[defaults]` section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DefaultsConfig {
    /// Report output format.
    #[serde(default)]
    pub output_format: OutputFormat,

    /// Goal kinds applied when none are given on the command line.
    #[serde(default)]
    pub goals: Vec<GoalKind>,
}

/// `[extraction]` section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExtractionConfig {
    /// Keep the text of parser marginalia (`<!-- ... -->`) instead of dropping it.
    #[serde(default)]
    pub include_marginalia: bool,
}

/// How reports and profiles are written out.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Markdown,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = HealthDigestError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "markdown" | "md" => Ok(Self::Markdown),
            "json" => Ok(Self::Json),
            other => Err(HealthDigestError::config(format!(
                "unknown output format '{other}': expected 'markdown' or 'json'"
            ))),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Markdown => f.write_str("markdown"),
            Self::Json => f.write_str("json"),
        }
    }
}

// ---------------------------------------------------------------------------
// Analyze config (runtime, merged from config + CLI flags)
// ---------------------------------------------------------------------------

/// Runtime analysis configuration, merged from config file and CLI flags.
#[derive(Debug, Clone)]
pub struct AnalyzeConfig {
    /// Goals passed to the recommendation engine, in caller order.
    pub goals: Vec<Goal>,
    /// Keep marginalia text during normalization.
    pub include_marginalia: bool,
    /// Tool version recorded in the report.
    pub tool_version: String,
    /// Date ages are computed against when only a birth year is known (today if unset).
    pub reference_date: Option<NaiveDate>,
}

impl From<&AppConfig> for AnalyzeConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            goals: config.defaults.goals.iter().copied().map(Goal::new).collect(),
            include_marginalia: config.extraction.include_marginalia,
            tool_version: String::new(),
            reference_date: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.healthdigest/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| HealthDigestError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.healthdigest/healthdigest.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| HealthDigestError::io(path, e))?;

    toml::from_str(&content).map_err(|e| {
        HealthDigestError::config(format!("failed to parse {}: {e}", path.display()))
    })
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| HealthDigestError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| HealthDigestError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| HealthDigestError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}
