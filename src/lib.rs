//! Pedometer Engine Library
//!
//! Counts steps by detecting acceleration peaks in a continuous stream of
//! 3-axis accelerometer samples.
//!
//! # Design Philosophy
//!
//! - **Threshold and refractory**: a step is a conditioned sample above the
//!   threshold that arrives more than the debounce window after the previous
//!   accepted step.
//! - **In-memory state is authoritative**: the count is written through to a
//!   store after every change, but a failed write never changes the count.
//! - **No ambient globals**: the detector owns its state; the session shares
//!   it with the sensor callback through one mutex.
//! - **Cheap per sample**: O(1) arithmetic, no allocation, no blocking.
//!
//! # Example
//!
//! ```
//! use pedometer::{AccelSample, StepDetector};
//!
//! let mut detector = StepDetector::default();
//! assert!(detector.start());
//!
//! detector.on_sample(&AccelSample::new(0, 0.0, 0.0, 2.0));
//! detector.on_sample(&AccelSample::new(100, 0.0, 0.0, 2.1)); // within debounce
//! detector.on_sample(&AccelSample::new(800, 0.0, 0.0, 2.3));
//!
//! assert_eq!(detector.current_count(), 2);
//! ```

pub mod config;
pub mod counter;
pub mod error;
pub mod sensor;
pub mod signal;
pub mod step_detection;
pub mod store;
pub mod types;

#[cfg(test)]
mod stress_tests;

// Re-export commonly used types
pub use config::{EngineConfig, SensorConfig, StoreConfig};
pub use counter::{SharedDetector, StepCounter};
pub use error::{ConfigError, SensorError, StartError, StoreError};
pub use sensor::{
    synthetic_walk, AlwaysGranted, PermissionGate, SampleSink, ScriptedPermission, ScriptedSensor,
    SensorProvider, SubscriptionHandle,
};
pub use signal::{magnitude, Axis, SignalSource};
pub use step_detection::{StepDetector, StepDetectorConfig};
pub use store::{BackgroundStore, CountStore, FileStore, MemoryStore, NullStore};
pub use types::{
    AccelSample, Availability, DetectorPhase, DetectorState, PermissionStatus, StepEvent,
};
