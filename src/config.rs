use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};

use crate::airspace::DEFAULT_MAX_ALTITUDE_FT;
use crate::error::NasrError;
use crate::nasr::{DEFAULT_BASE_URL, DEFAULT_TIMEOUT_SECS};
use crate::store::DEFAULT_CACHE_DIR;

pub const DEFAULT_CONFIG_FILE: &str = "nasr-check.json";

#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub cache_dir: Option<String>,
    #[serde(default)]
    pub max_altitude_ft: Option<i64>,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
    #[serde(default)]
    pub base_url: Option<String>,
}

/// Values supplied on the command line; they win over the config file.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub cache_dir: Option<Utf8PathBuf>,
    pub max_altitude_ft: Option<i64>,
}

/// Settings of one invocation. Built fresh every time, never shared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub cache_dir: Utf8PathBuf,
    pub max_altitude_ft: i64,
    pub timeout: Duration,
    pub base_url: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            cache_dir: Utf8PathBuf::from(DEFAULT_CACHE_DIR),
            max_altitude_ft: DEFAULT_MAX_ALTITUDE_FT,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }
}

pub struct ConfigLoader;

impl ConfigLoader {
    /// Reads `path`, or `nasr-check.json` when present. No file means defaults.
    pub fn resolve(path: Option<&str>, overrides: Overrides) -> Result<Settings, NasrError> {
        let config_path = match path {
            Some(path) => PathBuf::from(path),
            None => PathBuf::from(DEFAULT_CONFIG_FILE),
        };

        let config = if path.is_none() && !config_path.exists() {
            Config::default()
        } else {
            let content = fs::read_to_string(&config_path)
                .map_err(|_| NasrError::ConfigRead(config_path.clone()))?;
            serde_json::from_str(&content).map_err(|err| NasrError::ConfigParse(err.to_string()))?
        };

        Ok(Self::resolve_config(config, overrides))
    }

    pub fn resolve_config(config: Config, overrides: Overrides) -> Settings {
        let defaults = Settings::default();
        Settings {
            cache_dir: overrides
                .cache_dir
                .or_else(|| config.cache_dir.map(Utf8PathBuf::from))
                .unwrap_or(defaults.cache_dir),
            max_altitude_ft: overrides
                .max_altitude_ft
                .or(config.max_altitude_ft)
                .unwrap_or(defaults.max_altitude_ft),
            timeout: config
                .timeout_secs
                .map(Duration::from_secs)
                .unwrap_or(defaults.timeout),
            base_url: config.base_url.unwrap_or(defaults.base_url),
        }
    }
}
