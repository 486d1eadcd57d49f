/// Stress tests for the step detector and counting session.
///
/// These exercise long, hostile or concurrent streams that would only show
/// up after hours of wear: sensor glitches, clock oddities, lifecycle spam
/// and multi-threaded delivery.

#[cfg(test)]
mod stress_tests {
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    use crate::counter::StepCounter;
    use crate::sensor::{synthetic_walk, AlwaysGranted, ScriptedSensor};
    use crate::step_detection::{StepDetector, StepDetectorConfig};
    use crate::store::{BackgroundStore, MemoryStore};
    use crate::types::AccelSample;

    // ============================================================================
    // CATEGORY 1: DURATION & THROUGHPUT
    // ============================================================================

    /// One hour of walking at 600ms cadence, sampled at 10Hz.
    #[test]
    fn stress_one_hour_walk_10hz() {
        let mut detector = StepDetector::default();
        detector.start();

        let walk = synthetic_walk(0, 6000, 600, 100);
        assert_eq!(walk.len(), 36_000);

        let steps = detector.process_batch(&walk);
        assert_eq!(steps.len(), 6000);
        assert_eq!(detector.current_count(), 6000);
    }

    /// Timestamps near the top of the u64 range must not overflow.
    #[test]
    fn stress_timestamps_near_u64_max() {
        let mut detector = StepDetector::default();
        detector.start();

        let base = u64::MAX - 2000;
        assert!(detector.on_sample(&AccelSample::new(base, 0.0, 0.0, 2.0)).is_some());
        assert!(detector.on_sample(&AccelSample::new(base + 400, 0.0, 0.0, 2.0)).is_none());
        assert!(detector.on_sample(&AccelSample::new(u64::MAX, 0.0, 0.0, 2.0)).is_some());
        // Clock wrapped back to zero: treated as no elapsed time.
        assert!(detector.on_sample(&AccelSample::new(0, 0.0, 0.0, 2.0)).is_none());
        assert_eq!(detector.current_count(), 2);
    }

    // ============================================================================
    // CATEGORY 2: PATHOLOGICAL INPUT
    // ============================================================================

    /// A sensor spewing NaN, infinities, overflow and near-zero noise.
    #[test]
    fn stress_glitch_storm() {
        let mut detector = StepDetector::default();
        detector.start();

        let mut counted = 0;
        for i in 0..10_000u64 {
            let t = i * 50;
            let sample = match i % 7 {
                0 => AccelSample::new(t, f32::NAN, 1.0, 1.0),
                1 => AccelSample::new(t, f32::INFINITY, 0.0, 0.0),
                2 => AccelSample::new(t, 0.0, f32::NEG_INFINITY, f32::NAN),
                3 => AccelSample::new(t, f32::MAX, f32::MAX, f32::MAX),
                4 => AccelSample::new(t, -0.0, 0.0, 0.0),
                5 => AccelSample::new(t, 1e-30, -1e-30, 1e-30),
                _ => AccelSample::new(t, 0.0, 0.0, 1.0),
            };
            if detector.on_sample(&sample).is_some() {
                counted += 1;
            }
        }
        assert_eq!(counted, 0);
        assert_eq!(detector.current_count(), 0);
    }

    /// Every sample is a huge spike: the debounce window alone limits the rate.
    #[test]
    fn stress_continuous_spikes() {
        let mut detector = StepDetector::default();
        detector.start();

        // 10 seconds at 100Hz, all above threshold.
        for i in 0..1000u64 {
            detector.on_sample(&AccelSample::new(i * 10, 50.0, 50.0, 50.0));
        }
        // Accepted at 0, 510, 1020, ... while t < 10000.
        assert_eq!(detector.current_count(), 20);
    }

    /// Duplicate timestamps from a buggy driver.
    #[test]
    fn stress_duplicate_timestamps() {
        let mut detector = StepDetector::default();
        detector.start();

        for _ in 0..500 {
            detector.on_sample(&AccelSample::new(1000, 0.0, 0.0, 3.0));
        }
        assert_eq!(detector.current_count(), 1);
    }

    // ============================================================================
    // CATEGORY 3: LIFECYCLE CHURN
    // ============================================================================

    /// Rapid start/stop/reset spam interleaved with samples.
    #[test]
    fn stress_lifecycle_spam() {
        let store = MemoryStore::new();
        let mut detector = StepDetector::with_store(StepDetectorConfig::default(), store.clone());

        for i in 0..5000u64 {
            match i % 5 {
                0 => {
                    detector.start();
                }
                1 => {
                    detector.on_sample(&AccelSample::new(i * 1000, 0.0, 0.0, 2.0));
                }
                2 => detector.stop(),
                3 => {
                    detector.on_sample(&AccelSample::new(i * 1000, 0.0, 0.0, 2.0));
                }
                _ => {
                    if i % 1000 == 999 {
                        detector.reset();
                    }
                }
            }
        }

        // Only samples at i % 5 == 1 arrive while counting; resets at
        // i = 999, 1999, 2999, 3999, 4999 leave nothing after the last one.
        assert_eq!(detector.current_count(), 0);
        assert_eq!(store.get(), Some(0));
    }

    /// Sessions created and torn down repeatedly must not leak subscriptions.
    #[test]
    fn stress_session_churn() {
        let sensor = ScriptedSensor::available();
        for _ in 0..200 {
            let mut counter = StepCounter::new(
                sensor.clone(),
                AlwaysGranted,
                StepDetector::default(),
                Duration::from_millis(200),
            );
            counter.start();
            sensor.emit(AccelSample::new(0, 0.0, 0.0, 2.0));
        }
        assert_eq!(sensor.subscriber_count(), 0);
        assert_eq!(sensor.unsubscribe_calls(), 200);
    }

    // ============================================================================
    // CATEGORY 4: CONCURRENCY
    // ============================================================================

    /// Samples from a sensor thread while the host issues commands.
    #[test]
    fn stress_concurrent_delivery_and_commands() {
        let sensor = ScriptedSensor::available();
        let mut counter = StepCounter::new(
            sensor.clone(),
            AlwaysGranted,
            StepDetector::default(),
            Duration::from_millis(100),
        );
        counter.start();

        let producer = sensor.clone();
        let worker = thread::spawn(move || {
            producer.emit_all(synthetic_walk(0, 2000, 600, 100));
        });

        for _ in 0..1000 {
            let _ = counter.current_count();
            let _ = counter.is_counting();
        }
        worker.join().unwrap();

        assert_eq!(counter.current_count(), 2000);
    }

    /// Many readers sharing the detector handle while one thread writes.
    #[test]
    fn stress_shared_detector_readers() {
        let sensor = ScriptedSensor::available();
        let mut counter = StepCounter::new(
            sensor.clone(),
            AlwaysGranted,
            StepDetector::default(),
            Duration::from_millis(100),
        );
        counter.start();
        let shared = counter.detector();

        let readers: Vec<_> = (0..4)
            .map(|_| {
                let handle = Arc::clone(&shared);
                thread::spawn(move || {
                    let mut last = 0;
                    for _ in 0..2000 {
                        let now = handle.lock().map(|d| d.current_count()).unwrap_or(last);
                        assert!(now >= last, "count went backwards");
                        last = now;
                    }
                })
            })
            .collect();

        sensor.emit_all(synthetic_walk(0, 500, 600, 200));
        for reader in readers {
            reader.join().unwrap();
        }
        assert_eq!(counter.current_count(), 500);
    }

    /// Background persistence keeps up with a long walk and lands on the
    /// final count.
    #[test]
    fn stress_background_persistence() {
        let memory = MemoryStore::new();
        let store = BackgroundStore::spawn(memory.clone()).unwrap();
        let mut detector = StepDetector::with_store(StepDetectorConfig::default(), store);
        detector.start();

        detector.process_batch(&synthetic_walk(0, 3000, 600, 200));
        assert_eq!(detector.current_count(), 3000);

        drop(detector);
        assert_eq!(memory.get(), Some(3000));
    }
}
