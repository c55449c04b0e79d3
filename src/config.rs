//! Runtime configuration.
//!
//! Loaded from TOML; every key is optional.
//!
//! ```toml
//! raw_report = true
//! pre_normalized = true
//! skip_xinput_compatible = true
//! retry_transient = true
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Enumerate raw-report (legacy joystick) devices during refresh.
    pub raw_report: bool,
    /// Enumerate pre-normalized pad slots during refresh.
    pub pre_normalized: bool,
    /// Ignore raw-report devices that are also served by the pad backend.
    pub skip_xinput_compatible: bool,
    /// Re-acquire and poll once more when a raw-report device asks for it.
    pub retry_transient: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            raw_report: true,
            pre_normalized: true,
            skip_xinput_compatible: true,
            retry_transient: true,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
}

impl Config {
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }
}
