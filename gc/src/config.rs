//! Configuration for grammaticon curation

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::pipeline::PipelineOptions;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directory holding the raw CSV export
    pub raw_dir: PathBuf,

    /// Directory the CSVW dataset is written to
    pub output_dir: PathBuf,

    /// Abort on duplicate IDs instead of keeping the first occurrence
    pub strict_ids: bool,

    /// Log level (trace, debug, info, warn, error)
    pub log_level: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            raw_dir: PathBuf::from("raw"),
            output_dir: PathBuf::from("csvw"),
            strict_ids: true,
            log_level: None,
        }
    }
}

impl Config {
    /// Load config with fallback chain
    ///
    /// Explicit path, then `./grammaticon.yml`, then the user config
    /// directory, then defaults.
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        let default_paths = [
            Some(PathBuf::from("grammaticon.yml")),
            dirs::config_dir().map(|p| p.join("grammaticon").join("grammaticon.yml")),
        ];

        for path in default_paths.iter().flatten() {
            if path.exists() {
                match Self::load_from_file(path) {
                    Ok(config) => return Ok(config),
                    Err(e) => warn!("Failed to load config from {}: {}", path.display(), e),
                }
            }
        }

        Ok(Config::default())
    }

    /// Load config from a specific YAML file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Read only the log level, before logging is set up
    pub fn load_log_level(config_path: Option<&PathBuf>) -> Option<String> {
        Self::load(config_path).ok().and_then(|c| c.log_level)
    }

    pub fn pipeline_options(&self) -> PipelineOptions {
        PipelineOptions {
            strict_ids: self.strict_ids,
        }
    }
}
