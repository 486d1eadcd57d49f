//! Step counting session.
//!
//! [`StepCounter`] is the lifecycle surface a host application talks to. It
//! wires a [`SensorProvider`] subscription into a shared [`StepDetector`],
//! gates `start` on sensor availability and motion permission, and releases
//! the subscription exactly once on `stop`.
//!
//! All detector access goes through a single mutex, so samples delivered
//! from a sensor thread and commands from the host are serialized.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use crate::config::EngineConfig;
use crate::error::{StartError, StoreError};
use crate::sensor::{PermissionGate, SampleSink, SensorProvider, SubscriptionHandle};
use crate::step_detection::StepDetector;
use crate::types::{AccelSample, Availability, PermissionStatus, StepEvent};

/// Detector shared between the session and its sample sink.
pub type SharedDetector = Arc<Mutex<StepDetector>>;

fn lock_detector(detector: &SharedDetector) -> MutexGuard<'_, StepDetector> {
    // Detector state is plain data and consistent between calls.
    detector.lock().unwrap_or_else(PoisonError::into_inner)
}

/// A step counting session over one sensor provider.
pub struct StepCounter<P: SensorProvider, G: PermissionGate> {
    detector: SharedDetector,
    provider: P,
    gate: G,
    update_interval: Duration,
    subscription: Option<SubscriptionHandle>,
    availability: Availability,
    permission_granted: bool,
}

impl<P: SensorProvider, G: PermissionGate> StepCounter<P, G> {
    /// Creates an idle session. Neither the sensor nor the gate is touched.
    pub fn new(provider: P, gate: G, detector: StepDetector, update_interval: Duration) -> Self {
        Self {
            detector: Arc::new(Mutex::new(detector)),
            provider,
            gate,
            update_interval,
            subscription: None,
            availability: Availability::Unknown,
            permission_granted: false,
        }
    }

    /// Creates a session from configuration, opening the configured store
    /// and seeding the count from it.
    pub fn from_config(provider: P, gate: G, config: &EngineConfig) -> Result<Self, StoreError> {
        let store = config.store.open()?;
        let detector = StepDetector::with_store(config.detector.clone(), store);
        Ok(Self::new(provider, gate, detector, config.sensor.update_interval()))
    }

    /// Query the provider for sensor capability and remember the answer.
    ///
    /// A failing check counts as unavailable.
    pub fn check_availability(&mut self) -> Availability {
        let availability = match self.provider.is_available() {
            Ok(available) => Availability::from_check(available),
            Err(e) => {
                tracing::warn!(error = %e, "sensor availability check failed");
                Availability::Unavailable
            }
        };
        self.availability = availability;
        lock_detector(&self.detector).set_availability(availability);
        availability
    }

    /// Start counting, reporting why a start was refused.
    pub fn try_start(&mut self) -> Result<(), StartError> {
        if self.subscription.is_some() {
            return Ok(());
        }
        if self.availability == Availability::Unavailable {
            return Err(StartError::Unavailable);
        }
        self.ensure_permission()?;

        // The detector must be counting before the first sample can arrive.
        if !lock_detector(&self.detector).start() {
            return Err(StartError::Unavailable);
        }

        let sink_detector = Arc::clone(&self.detector);
        let sink: SampleSink = Box::new(move |sample: AccelSample| {
            lock_detector(&sink_detector).on_sample(&sample);
        });
        let handle = match self.provider.subscribe(sink, self.update_interval) {
            Ok(handle) => handle,
            Err(e) => {
                lock_detector(&self.detector).stop();
                return Err(StartError::Subscribe(e));
            }
        };
        self.subscription = Some(handle);
        tracing::info!(
            interval_ms = self.update_interval.as_millis() as u64,
            "step counting started"
        );
        Ok(())
    }

    /// Start counting. Returns false if the sensor is unavailable, permission
    /// was denied, or the subscription failed.
    pub fn start(&mut self) -> bool {
        match self.try_start() {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(error = %e, "step counting not started");
                false
            }
        }
    }

    /// Stop counting and release the subscription. Idempotent.
    pub fn stop(&mut self) {
        if let Some(handle) = self.subscription.take() {
            self.provider.unsubscribe(handle);
            tracing::info!("step counting stopped");
        }
        lock_detector(&self.detector).stop();
    }

    /// Zero the count.
    pub fn reset(&self) {
        lock_detector(&self.detector).reset();
    }

    /// Feed a sample directly, for hosts that deliver samples themselves.
    pub fn on_sample(&self, sample: &AccelSample) -> Option<StepEvent> {
        lock_detector(&self.detector).on_sample(sample)
    }

    pub fn current_count(&self) -> u64 {
        lock_detector(&self.detector).current_count()
    }

    pub fn is_counting(&self) -> bool {
        lock_detector(&self.detector).is_counting()
    }

    /// Last known sensor availability; `Unknown` before the first check.
    pub fn is_available(&self) -> Availability {
        self.availability
    }

    /// Handle to the shared detector.
    pub fn detector(&self) -> SharedDetector {
        Arc::clone(&self.detector)
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Asks the gate once; a grant is remembered, a denial is asked again on
    /// the next start.
    fn ensure_permission(&mut self) -> Result<(), StartError> {
        if self.permission_granted {
            return Ok(());
        }
        match self.gate.request_motion_permission() {
            Ok(PermissionStatus::Granted) => {
                self.permission_granted = true;
                Ok(())
            }
            Ok(PermissionStatus::Denied) => Err(StartError::PermissionDenied),
            Err(e) => {
                tracing::warn!(error = %e, "motion permission request failed");
                Err(StartError::PermissionDenied)
            }
        }
    }
}

impl<P: SensorProvider, G: PermissionGate> Drop for StepCounter<P, G> {
    fn drop(&mut self) {
        self.stop();
    }
}
