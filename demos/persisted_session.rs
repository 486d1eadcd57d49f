/// Session example: availability check, permission, subscription and a
/// count persisted across two runs.
use std::time::Duration;

use pedometer::{
    synthetic_walk, BackgroundStore, FileStore, ScriptedPermission, ScriptedSensor, StepCounter,
    StepDetector, StepDetectorConfig,
};

fn run(store_path: &std::path::Path, steps: u64) {
    let store = match BackgroundStore::spawn(FileStore::new(store_path)) {
        Ok(store) => store,
        Err(e) => {
            eprintln!("cannot start count store: {e}");
            return;
        }
    };
    let detector = StepDetector::with_store(StepDetectorConfig::default(), store);

    let sensor = ScriptedSensor::available();
    let mut counter = StepCounter::new(
        sensor.clone(),
        ScriptedPermission::granted(),
        detector,
        Duration::from_millis(200),
    );

    println!("Availability: {:?}", counter.check_availability());
    println!("Restored count: {}", counter.current_count());

    if !counter.start() {
        println!("Could not start counting");
        return;
    }

    sensor.emit_all(synthetic_walk(0, steps, 600, 200));
    counter.stop();

    println!("Count after walking {steps} steps: {}", counter.current_count());
}

fn main() {
    println!("=== Pedometer Engine: Persisted Session ===\n");

    let store_path = std::env::temp_dir().join("pedometer-demo-count.json");
    let _ = std::fs::remove_file(&store_path);

    println!("--- First run ---");
    run(&store_path, 12);

    println!("\n--- Second run ---");
    run(&store_path, 8);

    let _ = std::fs::remove_file(&store_path);
}
