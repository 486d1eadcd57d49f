//! Sensor and permission collaborators.
//!
//! The engine never talks to a platform API directly. A host implements
//! [`SensorProvider`] (capability check and sample subscription) and
//! [`PermissionGate`] (motion permission) and hands them to a
//! [`StepCounter`](crate::counter::StepCounter).
//!
//! [`ScriptedSensor`] and [`ScriptedPermission`] are in-process
//! implementations for replaying recorded or synthetic walks.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use crate::error::SensorError;
use crate::types::{AccelSample, PermissionStatus};

/// Callback receiving samples from a subscription.
pub type SampleSink = Box<dyn FnMut(AccelSample) + Send>;

/// Opaque handle identifying one active subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionHandle(u64);

impl SubscriptionHandle {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn id(&self) -> u64 {
        self.0
    }
}

/// Source of accelerometer samples.
pub trait SensorProvider {
    /// Whether the device has a usable motion sensor.
    fn is_available(&mut self) -> Result<bool, SensorError>;

    /// Starts delivering samples to `sink`. `interval` is advisory.
    fn subscribe(
        &mut self,
        sink: SampleSink,
        interval: Duration,
    ) -> Result<SubscriptionHandle, SensorError>;

    /// Stops delivery for `handle`. Unknown handles are ignored.
    fn unsubscribe(&mut self, handle: SubscriptionHandle);
}

/// Motion permission flow.
pub trait PermissionGate {
    fn request_motion_permission(&mut self) -> Result<PermissionStatus, SensorError>;
}

/// Gate for platforms that need no motion permission.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysGranted;

impl PermissionGate for AlwaysGranted {
    fn request_motion_permission(&mut self) -> Result<PermissionStatus, SensorError> {
        Ok(PermissionStatus::Granted)
    }
}

struct ScriptedInner {
    availability: Result<bool, SensorError>,
    subscribe_error: Option<SensorError>,
    sinks: BTreeMap<SubscriptionHandle, SampleSink>,
    next_id: u64,
    last_interval: Option<Duration>,
    unsubscribe_calls: usize,
}

/// Scripted sensor provider.
///
/// Clones share state, so a test keeps one handle to emit samples while the
/// counter owns another.
#[derive(Clone)]
pub struct ScriptedSensor {
    inner: Arc<Mutex<ScriptedInner>>,
}

impl ScriptedSensor {
    /// A provider that reports the sensor as available.
    pub fn available() -> Self {
        Self::with_availability(Ok(true))
    }

    /// A provider that reports the sensor as missing.
    pub fn unavailable() -> Self {
        Self::with_availability(Ok(false))
    }

    /// A provider whose capability check fails.
    pub fn failing(message: impl Into<String>) -> Self {
        Self::with_availability(Err(SensorError::Backend(message.into())))
    }

    fn with_availability(availability: Result<bool, SensorError>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(ScriptedInner {
                availability,
                subscribe_error: None,
                sinks: BTreeMap::new(),
                next_id: 1,
                last_interval: None,
                unsubscribe_calls: 0,
            })),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, ScriptedInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Make subsequent subscriptions fail with `error`.
    pub fn fail_subscriptions(&self, error: SensorError) {
        self.lock().subscribe_error = Some(error);
    }

    /// Deliver one sample to every active subscription.
    /// Returns the number of subscriptions that received it.
    pub fn emit(&self, sample: AccelSample) -> usize {
        let mut inner = self.lock();
        for sink in inner.sinks.values_mut() {
            sink(sample);
        }
        inner.sinks.len()
    }

    /// Deliver samples in order.
    pub fn emit_all<I: IntoIterator<Item = AccelSample>>(&self, samples: I) {
        for sample in samples {
            self.emit(sample);
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.lock().sinks.len()
    }

    /// Interval hint passed to the most recent subscribe call.
    pub fn last_interval(&self) -> Option<Duration> {
        self.lock().last_interval
    }

    pub fn unsubscribe_calls(&self) -> usize {
        self.lock().unsubscribe_calls
    }
}

impl SensorProvider for ScriptedSensor {
    fn is_available(&mut self) -> Result<bool, SensorError> {
        self.lock().availability.clone()
    }

    fn subscribe(
        &mut self,
        sink: SampleSink,
        interval: Duration,
    ) -> Result<SubscriptionHandle, SensorError> {
        let mut inner = self.lock();
        if let Some(error) = inner.subscribe_error.clone() {
            return Err(error);
        }
        if inner.availability != Ok(true) {
            return Err(SensorError::Unavailable);
        }

        let handle = SubscriptionHandle::new(inner.next_id);
        inner.next_id += 1;
        inner.last_interval = Some(interval);
        inner.sinks.insert(handle, sink);
        Ok(handle)
    }

    fn unsubscribe(&mut self, handle: SubscriptionHandle) {
        let mut inner = self.lock();
        inner.unsubscribe_calls += 1;
        inner.sinks.remove(&handle);
    }
}

/// Scripted permission gate that counts requests.
#[derive(Clone)]
pub struct ScriptedPermission {
    answer: Arc<Mutex<Result<PermissionStatus, SensorError>>>,
    requests: Arc<Mutex<usize>>,
}

impl ScriptedPermission {
    pub fn new(answer: Result<PermissionStatus, SensorError>) -> Self {
        Self {
            answer: Arc::new(Mutex::new(answer)),
            requests: Arc::new(Mutex::new(0)),
        }
    }

    pub fn granted() -> Self {
        Self::new(Ok(PermissionStatus::Granted))
    }

    pub fn denied() -> Self {
        Self::new(Ok(PermissionStatus::Denied))
    }

    /// Change the answer for later requests (the user flipped the setting).
    pub fn set_answer(&self, answer: Result<PermissionStatus, SensorError>) {
        *self.answer.lock().unwrap_or_else(PoisonError::into_inner) = answer;
    }

    pub fn requests(&self) -> usize {
        *self.requests.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl PermissionGate for ScriptedPermission {
    fn request_motion_permission(&mut self) -> Result<PermissionStatus, SensorError> {
        *self.requests.lock().unwrap_or_else(PoisonError::into_inner) += 1;
        self.answer.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

/// Synthetic user-acceleration stream for a walk.
///
/// Samples arrive every `interval_ms` starting at `start_ms`. The sample at
/// the start of each `cadence_ms` period carries a heel-strike peak of about
/// 2.4 units; everything else is low-level sway well under the reference
/// threshold. When `cadence_ms` is a multiple of `interval_ms` the stream
/// holds exactly `steps` peaks. A walk whose duration or last timestamp
/// would overflow `u64` comes back empty.
pub fn synthetic_walk(
    start_ms: u64,
    steps: u64,
    cadence_ms: u64,
    interval_ms: u64,
) -> Vec<AccelSample> {
    if interval_ms == 0 || cadence_ms == 0 {
        return Vec::new();
    }

    let Some(duration) = steps
        .checked_mul(cadence_ms)
        .filter(|d| start_ms.checked_add(*d).is_some())
    else {
        return Vec::new();
    };
    let count = duration / interval_ms;
    (0..count)
        .map(|i| {
            let offset = i * interval_ms;
            let z = if offset % cadence_ms < interval_ms { 2.4 } else { 0.3 };
            AccelSample::new(start_ms + offset, 0.2, -0.1, z)
        })
        .collect()
}
