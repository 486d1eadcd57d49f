//! Error types for the step counting engine.
//!
//! The detection algorithm itself cannot fail. Every error here belongs to a
//! boundary: the sensor and permission collaborators, the count store, or
//! configuration loading.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Reasons a counting session refused to start.
#[derive(Debug, Error)]
pub enum StartError {
    /// The motion sensor was reported unavailable on this device.
    #[error("motion sensor is not available on this device")]
    Unavailable,

    /// Motion permission was denied or could not be requested.
    #[error("motion permission was not granted")]
    PermissionDenied,

    /// The sensor provider rejected the subscription.
    #[error("failed to subscribe to motion samples: {0}")]
    Subscribe(#[source] SensorError),
}

/// Failures reported by the sensor provider or permission gate.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SensorError {
    /// The platform has no usable motion sensor.
    #[error("sensor unavailable")]
    Unavailable,

    /// The platform backend failed.
    #[error("sensor backend error: {0}")]
    Backend(String),
}

/// Count store failures.
///
/// These are logged by the detector and never roll back an in-memory count.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Reading or writing the backing file failed.
    #[error("count store I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The backing document could not be encoded or decoded.
    #[error("count store document is malformed: {0}")]
    Serialize(#[from] serde_json::Error),

    /// The slot holds something that is not a non-negative integer.
    #[error("stored value for {key:?} is not a step count: {value:?}")]
    Corrupt { key: String, value: String },

    /// The background writer has shut down.
    #[error("count store writer is closed")]
    WriterClosed,
}

/// Configuration loading failures.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}
