/// Basic usage example: feed accelerometer samples, get step events
use pedometer::{AccelSample, StepDetector, StepDetectorConfig};

fn main() {
    println!("=== Pedometer Engine: Basic Example ===\n");

    // Reference tuning: threshold 1.5, 500ms debounce window
    let config = StepDetectorConfig::default();
    let mut detector = StepDetector::new(config);
    detector.start();

    // User acceleration every 100ms: quiet, a heel strike, its ringing,
    // then the next heel strike.
    let motion_samples = vec![
        (1000, [0.1, 0.2, 0.3]),
        (1100, [0.4, 0.3, 1.9]),   // heel strike
        (1200, [0.3, 0.2, 2.0]),   // ringing, suppressed
        (1300, [0.1, 0.1, 0.4]),
        (1400, [0.2, 0.0, 0.2]),
        (1500, [0.1, 0.1, 0.3]),
        (1600, [0.3, 0.2, 0.5]),
        (1700, [0.5, 0.4, 2.2]),   // next heel strike
        (1800, [0.2, 0.1, 0.6]),
        (1900, [f32::NAN, 0.0, 0.0]), // sensor glitch, ignored
    ];

    println!("Processing {} samples...\n", motion_samples.len());

    for (timestamp, accel) in motion_samples {
        let sample = AccelSample::from_array(timestamp, accel);
        if let Some(step) = detector.on_sample(&sample) {
            println!("Step at {}ms (total {})", step.timestamp_ms, step.total);
        }
    }

    detector.stop();

    println!("\n=== Summary ===");
    println!("Total steps: {}", detector.current_count());
    println!("State: {:?}", detector.state());
}
