//! Step Detection Module.
//!
//! Implements step counting as a threshold-and-refractory state machine:
//! - Each sample is conditioned to a scalar (vector magnitude by default)
//! - A scalar above the threshold is a step candidate
//! - A candidate within the debounce window of the last accepted step is
//!   suppressed, so one footfall's oscillation counts once
//!
//! The detector owns the running total and writes it through to a
//! [`CountStore`] after every mutation. Store failures are logged and never
//! affect the in-memory total.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::signal::SignalSource;
use crate::store::{CountStore, NullStore};
use crate::types::{AccelSample, Availability, DetectorPhase, DetectorState, StepEvent};

/// Configuration for step detection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StepDetectorConfig {
    /// Minimum conditioned signal to count as a step candidate, in
    /// sensor-native units. Strictly exceeded to qualify.
    pub threshold: f32,
    /// Refractory period after an accepted step in milliseconds. Candidates
    /// arriving at or within this window are suppressed.
    pub debounce_window_ms: u64,
    /// How each sample is reduced to a scalar.
    pub signal: SignalSource,
}

impl Default for StepDetectorConfig {
    fn default() -> Self {
        Self {
            threshold: 1.5,           // Reference tuning for phone accelerometers
            debounce_window_ms: 500,  // Max 2 steps/sec
            signal: SignalSource::Magnitude,
        }
    }
}

impl StepDetectorConfig {
    /// Rejects values the algorithm cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.threshold.is_finite() || self.threshold <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "detector threshold must be a positive finite number, got {}",
                self.threshold
            )));
        }
        Ok(())
    }
}

/// Step detector over a stream of accelerometer samples.
pub struct StepDetector {
    config: StepDetectorConfig,
    state: DetectorState,
    availability: Availability,
    store: Box<dyn CountStore>,
}

impl std::fmt::Debug for StepDetector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StepDetector")
            .field("config", &self.config)
            .field("state", &self.state)
            .field("availability", &self.availability)
            .finish_non_exhaustive()
    }
}

impl StepDetector {
    /// Create a detector that does not persist its count.
    pub fn new(config: StepDetectorConfig) -> Self {
        Self {
            config,
            state: DetectorState::default(),
            availability: Availability::Unknown,
            store: Box::new(NullStore),
        }
    }

    /// Create a detector seeded from `store`.
    ///
    /// A store that cannot be read is logged and the count starts at zero.
    pub fn with_store(config: StepDetectorConfig, store: impl CountStore + 'static) -> Self {
        let initial = match store.load() {
            Ok(Some(count)) => {
                tracing::debug!(count, "restored persisted step count");
                count
            }
            Ok(None) => 0,
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    "failed to load persisted step count, starting from zero"
                );
                0
            }
        };

        Self {
            config,
            state: DetectorState::with_total(initial),
            availability: Availability::Unknown,
            store: Box::new(store),
        }
    }

    /// Begin accepting samples.
    ///
    /// Returns false and changes nothing if the sensor was reported
    /// unavailable. Starting an already counting detector is a no-op.
    pub fn start(&mut self) -> bool {
        if self.availability == Availability::Unavailable {
            tracing::warn!("refusing to start step detection: sensor unavailable");
            return false;
        }
        if self.state.phase != DetectorPhase::Counting {
            self.state.phase = DetectorPhase::Counting;
            tracing::debug!(total = self.state.running_total, "step detection started");
        }
        true
    }

    /// Stop accepting samples. Idempotent.
    pub fn stop(&mut self) {
        if self.state.phase == DetectorPhase::Counting {
            self.state.phase = DetectorPhase::Idle;
            tracing::debug!(total = self.state.running_total, "step detection stopped");
        }
    }

    /// Zero the running total. Phase and debounce baseline are untouched.
    pub fn reset(&mut self) {
        self.state.running_total = 0;
        tracing::debug!("step count reset");
        self.persist();
    }

    /// Process a single sample.
    /// Returns a StepEvent if the sample was accepted as a step.
    pub fn on_sample(&mut self, sample: &AccelSample) -> Option<StepEvent> {
        if self.state.phase != DetectorPhase::Counting {
            return None;
        }

        let signal = self.config.signal.condition(sample);
        if !signal.is_finite() || signal <= self.config.threshold {
            return None;
        }

        let now = sample.timestamp_ms;
        if let Some(last) = self.state.last_step_ms {
            // Out-of-order timestamps count as no elapsed time.
            if now.saturating_sub(last) <= self.config.debounce_window_ms {
                return None;
            }
        }

        self.state.running_total = self.state.running_total.saturating_add(1);
        self.state.last_step_ms = Some(now);
        tracing::trace!(timestamp_ms = now, signal, total = self.state.running_total, "step");
        self.persist();

        Some(StepEvent::new(now, self.state.running_total))
    }

    /// Process a batch of samples in order and return all detected steps.
    pub fn process_batch(&mut self, samples: &[AccelSample]) -> Vec<StepEvent> {
        samples.iter().filter_map(|s| self.on_sample(s)).collect()
    }

    /// Record the outcome of the sensor capability check.
    pub fn set_availability(&mut self, availability: Availability) {
        self.availability = availability;
    }

    pub fn availability(&self) -> Availability {
        self.availability
    }

    /// Get the number of steps counted.
    pub fn current_count(&self) -> u64 {
        self.state.running_total
    }

    pub fn is_counting(&self) -> bool {
        self.state.is_counting()
    }

    /// Snapshot of the working state.
    pub fn state(&self) -> DetectorState {
        self.state
    }

    pub fn config(&self) -> &StepDetectorConfig {
        &self.config
    }

    fn persist(&self) {
        let count = self.state.running_total;
        if let Err(e) = self.store.save(count) {
            tracing::warn!(error = %e, count, "failed to persist step count");
        }
    }
}

impl Default for StepDetector {
    fn default() -> Self {
        Self::new(StepDetectorConfig::default())
    }
}

// ============================================================================
// TESTS
// ============================================================================
