//! Runtime configuration
//!
//! Stored as JSON next to the binary's working data. A missing file means
//! defaults; unknown keys are ignored and absent keys take their default.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ConfigError;
use crate::hub::DATA_HUB;

/// Environment variable overriding `base_url`
pub const BASE_URL_ENV: &str = "INGREDIENT_MVC_BASE_URL";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MvcConfig {
    /// Server origin, e.g. `http://localhost:8080`
    pub base_url: String,
    /// Path segment every resource lives under
    pub api_prefix: String,
    pub hub_channel: String,
    pub log_dir: PathBuf,
    /// Notices kept on the notice bar
    pub notice_capacity: usize,
}

impl Default for MvcConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_string(),
            api_prefix: "api".to_string(),
            hub_channel: DATA_HUB.to_string(),
            log_dir: PathBuf::from("logs"),
            notice_capacity: 5,
        }
    }
}

impl MvcConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let io_err = |source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }
        let content = serde_json::to_string_pretty(self).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })?;
        std::fs::write(path, content).map_err(io_err)
    }

    /// Apply overrides from the process environment
    pub fn with_env_overrides(self) -> Self {
        self.apply_env(|key| std::env::var(key).ok())
    }

    pub fn apply_env(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(url) = lookup(BASE_URL_ENV).filter(|v| !v.trim().is_empty()) {
            self.base_url = url.trim().to_string();
        }
        self
    }
}
