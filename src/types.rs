//! Core data types for the step counting engine.
//!
//! This module defines the values that flow between the sensor boundary,
//! the signal conditioner, the step detector and the count store.
//!
//! Design principle: if a concept exists, it gets a type. Availability is a
//! three-state enum rather than an `Option<bool>`, and the detector's working
//! state is a plain value that can be copied out for inspection.

use serde::{Deserialize, Serialize};

/// A single raw accelerometer reading.
///
/// This is the minimal input contract: three acceleration components in
/// sensor-native units and a monotonic arrival timestamp. Samples are
/// ephemeral and consumed exactly once.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AccelSample {
    /// Monotonic timestamp in milliseconds. Required for debounce ordering.
    pub timestamp_ms: u64,

    /// Acceleration along the device x axis.
    pub x: f32,

    /// Acceleration along the device y axis.
    pub y: f32,

    /// Acceleration along the device z axis.
    pub z: f32,
}

impl AccelSample {
    /// Creates a new sample.
    ///
    /// Assumption: timestamp_ms is non-decreasing within a stream.
    pub fn new(timestamp_ms: u64, x: f32, y: f32, z: f32) -> Self {
        Self { timestamp_ms, x, y, z }
    }

    /// Creates a sample from an `[x, y, z]` array.
    pub fn from_array(timestamp_ms: u64, accel: [f32; 3]) -> Self {
        Self::new(timestamp_ms, accel[0], accel[1], accel[2])
    }

    /// The three components as an array.
    pub fn accel(&self) -> [f32; 3] {
        [self.x, self.y, self.z]
    }
}

/// Lifecycle phase of the step detector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DetectorPhase {
    /// Not counting. Samples are ignored.
    #[default]
    Idle,
    /// Actively consuming samples.
    Counting,
}

/// The detector's working state.
///
/// Invariants:
/// - `running_total` only grows while `phase` is `Counting`
/// - `running_total` is set to zero only by an explicit reset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DetectorState {
    /// Steps accumulated since the count was last reset or loaded.
    pub running_total: u64,
    /// Timestamp of the most recently accepted step.
    pub last_step_ms: Option<u64>,
    /// Whether samples are currently accepted.
    pub phase: DetectorPhase,
}

impl DetectorState {
    /// State seeded with a previously persisted count.
    pub fn with_total(running_total: u64) -> Self {
        Self {
            running_total,
            ..Self::default()
        }
    }

    pub fn is_counting(&self) -> bool {
        self.phase == DetectorPhase::Counting
    }
}

/// Signal emitted at the instant a step is accepted.
///
/// Not retained by the engine. Carries just enough for a caller to react
/// without querying the detector again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepEvent {
    /// Timestamp of the sample that was accepted as a step.
    pub timestamp_ms: u64,
    /// Running total after this step was counted.
    pub total: u64,
}

impl StepEvent {
    pub fn new(timestamp_ms: u64, total: u64) -> Self {
        Self { timestamp_ms, total }
    }
}

/// Whether the motion sensor is usable on this device.
///
/// `Unknown` until the first capability check resolves. Only `Unavailable`
/// blocks a start; an unresolved check does not.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Availability {
    #[default]
    Unknown,
    Available,
    Unavailable,
}

impl Availability {
    /// Maps a resolved capability check.
    pub fn from_check(available: bool) -> Self {
        if available {
            Availability::Available
        } else {
            Availability::Unavailable
        }
    }

    /// `None` while unknown.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Availability::Unknown => None,
            Availability::Available => Some(true),
            Availability::Unavailable => Some(false),
        }
    }
}

/// Outcome of a motion permission request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PermissionStatus {
    Granted,
    Denied,
}

impl PermissionStatus {
    pub fn is_granted(&self) -> bool {
        *self == PermissionStatus::Granted
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_from_array() {
        let sample = AccelSample::from_array(1000, [0.1, 0.2, 9.8]);
        assert_eq!(sample.timestamp_ms, 1000);
        assert_eq!(sample.accel(), [0.1, 0.2, 9.8]);
    }

    #[test]
    fn test_default_state_is_idle_and_empty() {
        let state = DetectorState::default();
        assert_eq!(state.running_total, 0);
        assert_eq!(state.last_step_ms, None);
        assert!(!state.is_counting());
    }

    #[test]
    fn test_state_with_total() {
        let state = DetectorState::with_total(42);
        assert_eq!(state.running_total, 42);
        assert_eq!(state.phase, DetectorPhase::Idle);
    }

    #[test]
    fn test_availability_mapping() {
        assert_eq!(Availability::from_check(true), Availability::Available);
        assert_eq!(Availability::from_check(false), Availability::Unavailable);
        assert_eq!(Availability::Unknown.as_bool(), None);
        assert_eq!(Availability::Unavailable.as_bool(), Some(false));
    }

    #[test]
    fn test_permission_status() {
        assert!(PermissionStatus::Granted.is_granted());
        assert!(!PermissionStatus::Denied.is_granted());
    }
}
