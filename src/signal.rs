//! Signal conditioning.
//!
//! Reduces a 3-axis accelerometer sample to the single scalar the step
//! detector compares against its threshold:
//! - Euclidean magnitude of the acceleration vector (default)
//! - Absolute value of a single axis
//!
//! Design note: conditioning is a pure function of one sample. O(1), no
//! state, no allocations. Non-finite components propagate into a non-finite
//! scalar; rejecting those is the detector's job.

use serde::{Deserialize, Serialize};

use crate::types::AccelSample;

/// Compute the Euclidean norm `sqrt(x² + y² + z²)` of a sample.
///
/// Squares are summed in `f64` so finite components whose norm fits in
/// `f32` never overflow to infinity on the way.
pub fn magnitude(sample: &AccelSample) -> f32 {
    let x = f64::from(sample.x);
    let y = f64::from(sample.y);
    let z = f64::from(sample.z);
    (x * x + y * y + z * z).sqrt() as f32
}

/// A device axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    /// The component of `sample` along this axis.
    pub fn component(&self, sample: &AccelSample) -> f32 {
        match self {
            Axis::X => sample.x,
            Axis::Y => sample.y,
            Axis::Z => sample.z,
        }
    }
}

/// Which scalar the detector sees for each sample.
///
/// `Magnitude` is orientation independent and is the default. `Axis` keeps
/// the older single-axis behavior: a reading counts when the component's
/// absolute value exceeds the threshold in either direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignalSource {
    #[default]
    Magnitude,
    Axis(Axis),
}

impl SignalSource {
    /// Reduce a sample to the scalar compared against the threshold.
    pub fn condition(&self, sample: &AccelSample) -> f32 {
        match self {
            SignalSource::Magnitude => magnitude(sample),
            SignalSource::Axis(axis) => axis.component(sample).abs(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_magnitude_pythagorean() {
        let sample = AccelSample::new(0, 3.0, 4.0, 0.0);
        assert!((magnitude(&sample) - 5.0).abs() < 1e-6);
    }

    #[test]
    fn test_magnitude_is_sign_independent() {
        let a = AccelSample::new(0, 1.0, -2.0, 2.0);
        let b = AccelSample::new(0, -1.0, 2.0, -2.0);
        assert!((magnitude(&a) - 3.0).abs() < 1e-6);
        assert_eq!(magnitude(&a), magnitude(&b));
    }

    #[test]
    fn test_magnitude_zero() {
        assert_eq!(magnitude(&AccelSample::new(0, 0.0, 0.0, 0.0)), 0.0);
    }

    #[test]
    fn test_magnitude_propagates_non_finite() {
        assert!(magnitude(&AccelSample::new(0, f32::NAN, 0.0, 0.0)).is_nan());
        assert!(magnitude(&AccelSample::new(0, f32::INFINITY, 0.0, 0.0)).is_infinite());
        // NaN wins over infinity.
        assert!(magnitude(&AccelSample::new(0, f32::INFINITY, f32::NAN, 0.0)).is_nan());
    }

    #[test]
    fn test_magnitude_large_finite_components() {
        // 2e19 squared is past f32::MAX, the norm itself is not.
        let m = magnitude(&AccelSample::new(0, 2.0e19, 0.0, 0.0));
        assert!(m.is_finite());
        assert!((m - 2.0e19).abs() / 2.0e19 < 1e-6);

        let m = magnitude(&AccelSample::new(0, 0.0, -3.0e19, 4.0e19));
        assert!((m - 5.0e19).abs() / 5.0e19 < 1e-6);
    }

    #[test]
    fn test_axis_source_uses_absolute_value() {
        let source = SignalSource::Axis(Axis::Z);
        let down = AccelSample::new(0, 9.0, 9.0, -2.0);
        assert_eq!(source.condition(&down), 2.0);

        let up = AccelSample::new(0, 0.0, 0.0, 1.25);
        assert_eq!(source.condition(&up), 1.25);
    }

    #[test]
    fn test_default_source_is_magnitude() {
        let sample = AccelSample::new(0, 0.0, 3.0, 4.0);
        assert_eq!(SignalSource::default(), SignalSource::Magnitude);
        assert!((SignalSource::default().condition(&sample) - 5.0).abs() < 1e-6);
    }

    #[test]
    fn test_source_deserializes_from_toml() {
        #[derive(Deserialize)]
        struct Holder {
            signal: SignalSource,
        }

        let magnitude: Holder = toml::from_str(r#"signal = "magnitude""#).unwrap();
        assert_eq!(magnitude.signal, SignalSource::Magnitude);

        let axis: Holder = toml::from_str(r#"signal = { axis = "z" }"#).unwrap();
        assert_eq!(axis.signal, SignalSource::Axis(Axis::Z));
    }
}
