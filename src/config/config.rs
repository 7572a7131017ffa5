use crate::covariates::options::{
    ALL_PLATFORMS, DEFAULT_MAX_READ_LENGTH, DEFAULT_MIN_MAPPING_QUALITY,
};
use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Defaults for `count-covariates`, read from `config.toml`. Command-line
/// flags take precedence over anything set here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_min_mapping_quality")]
    pub min_mapping_quality: u8,
    #[serde(default = "default_max_read_length")]
    pub max_read_length: usize,
    #[serde(default = "default_platforms")]
    pub platforms: Vec<String>,
    #[serde(default = "default_threads")]
    pub threads: usize,
    #[serde(default = "default_output_root")]
    pub output_root: String,
}

fn default_min_mapping_quality() -> u8 {
    DEFAULT_MIN_MAPPING_QUALITY
}

fn default_max_read_length() -> usize {
    DEFAULT_MAX_READ_LENGTH
}

fn default_platforms() -> Vec<String> {
    vec![ALL_PLATFORMS.to_string()]
}

fn default_threads() -> usize {
    1
}

fn default_output_root() -> String {
    "output".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            min_mapping_quality: default_min_mapping_quality(),
            max_read_length: default_max_read_length(),
            platforms: default_platforms(),
            threads: default_threads(),
            output_root: default_output_root(),
        }
    }
}

impl Config {
    fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("com", "covariate-counter", "covariate-counter")
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Loads the user config if there is one; an unreadable or malformed
    /// default file falls back to built-in defaults.
    pub fn load() -> Self {
        if let Some(config_path) = Self::default_path() {
            if config_path.exists() {
                if let Ok(content) = fs::read_to_string(&config_path) {
                    if let Ok(config) = toml::from_str(&content) {
                        return config;
                    }
                }
                log::warn!("Ignoring unreadable config {}", config_path.display());
            }
        }
        Config::default()
    }

    /// Loads an explicitly requested config; failures are errors.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        toml::from_str(&content).with_context(|| format!("Invalid config {}", path.display()))
    }

    pub fn save(&self) -> Result<()> {
        if let Some(config_path) = Self::default_path() {
            if let Some(config_dir) = config_path.parent() {
                fs::create_dir_all(config_dir)?;
            }
            let content = toml::to_string_pretty(self)?;
            fs::write(config_path, content)?;
        }
        Ok(())
    }
}
