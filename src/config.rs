//! Engine configuration — defaults loaded from ~/.notewarp/config.yaml.

use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::dsl::Dialect;
use crate::time::TimeSignature;

/// Engine settings loaded from YAML.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Time signature used when the caller does not give one.
    #[serde(default)]
    pub time_signature: TimeSignature,
    /// Fixed RNG seed for reproducible `noise`/`rand`/`choose`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    /// Parameter-name table for batch application.
    #[serde(default)]
    pub dialect: Dialect,
    /// How many diagnostics the in-memory log keeps.
    #[serde(default = "default_capacity")]
    pub diagnostic_capacity: usize,
}

fn default_capacity() -> usize {
    256
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            time_signature: TimeSignature::default(),
            seed: None,
            dialect: Dialect::default(),
            diagnostic_capacity: default_capacity(),
        }
    }
}

/// Default path for the engine config.
pub fn default_config_path() -> PathBuf {
    let mut path = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
    path.push(".notewarp");
    path.push("config.yaml");
    path
}

impl EngineConfig {
    /// Load config from the standard path (~/.notewarp/config.yaml).
    /// Returns None if the file doesn't exist or doesn't parse.
    pub fn load() -> Option<Self> {
        let content = std::fs::read_to_string(default_config_path()).ok()?;
        serde_yaml::from_str(&content).ok()
    }

    /// Load config from a file. A missing file yields the defaults.
    pub fn load_from(path: &Path) -> Result<Self, io::Error> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_yaml::from_str(&content)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        if TimeSignature::new(config.time_signature.numerator, config.time_signature.denominator)
            .is_none()
        {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("invalid time signature {}", config.time_signature),
            ));
        }
        Ok(config)
    }

    /// Save config to a file, creating parent directories as needed.
    pub fn save_to(&self, path: &Path) -> Result<(), io::Error> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let yaml = serde_yaml::to_string(self).map_err(io::Error::other)?;
        std::fs::write(path, yaml)
    }
}
