//! Engine configuration.
//!
//! Every section and field is optional; missing values take the reference
//! tuning. Loaded from TOML:
//!
//! ```toml
//! [detector]
//! threshold = 1.5
//! debounce_window_ms = 500
//! signal = "magnitude"        # or { axis = "z" }
//!
//! [sensor]
//! update_interval_ms = 200
//!
//! [store]
//! path = "step_count.json"
//! key = "stepCount"
//! background = true
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, StoreError};
use crate::step_detection::StepDetectorConfig;
use crate::store::{BackgroundStore, CountStore, FileStore, NullStore, DEFAULT_COUNT_KEY};

/// Sensor subscription settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SensorConfig {
    /// Advisory delivery interval passed to the sensor provider.
    pub update_interval_ms: u64,
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self {
            update_interval_ms: 200,
        }
    }
}

impl SensorConfig {
    pub fn update_interval(&self) -> Duration {
        Duration::from_millis(self.update_interval_ms)
    }
}

/// Count persistence settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// JSON document holding the count. No path disables persistence.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
    /// Name of the slot inside the document.
    pub key: String,
    /// Write through a background thread instead of on the caller's thread.
    pub background: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: None,
            key: DEFAULT_COUNT_KEY.to_string(),
            background: true,
        }
    }
}

impl StoreConfig {
    /// Opens the configured store.
    pub fn open(&self) -> Result<Box<dyn CountStore>, StoreError> {
        let Some(path) = &self.path else {
            return Ok(Box::new(NullStore));
        };
        let file = FileStore::with_key(path, self.key.clone());
        if self.background {
            Ok(Box::new(BackgroundStore::spawn(file)?))
        } else {
            Ok(Box::new(file))
        }
    }
}

/// Complete engine configuration.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub detector: StepDetectorConfig,
    pub sensor: SensorConfig,
    pub store: StoreConfig,
}

impl EngineConfig {
    /// Parses and validates a TOML document.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: EngineConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&text)?;
        tracing::debug!(path = %path.display(), "loaded engine config");
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.detector.validate()?;
        if self.sensor.update_interval_ms == 0 {
            return Err(ConfigError::Invalid(
                "sensor update_interval_ms must be greater than zero".into(),
            ));
        }
        if self.store.key.trim().is_empty() {
            return Err(ConfigError::Invalid("store key must not be empty".into()));
        }
        Ok(())
    }
}
