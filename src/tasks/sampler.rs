// StepWatch — Sampler Task
//
// Reads one calibrated 3-axis acceleration sample every 10 ms and pushes
// it into the bounded sample queue for the step-detection task.

use std::sync::mpsc::SyncSender;
use std::thread;
use std::time::{Duration, Instant};

use crate::config::*;
use crate::drivers::imu::{Mpu6050, SharedBus};
use crate::events::AccelSample;

pub fn sampler_task(bus: SharedBus, sample_tx: SyncSender<AccelSample>) {
    log::info!("Sampler task started");

    let imu = Mpu6050::new(bus);
    let interval = Duration::from_millis(SAMPLE_INTERVAL_MS);

    loop {
        let tick_start = Instant::now();

        match imu.read_accel() {
            Ok(sample) => {
                // Blocking send: a full queue stalls the sampler until the
                // detector drains a slot. Samples are never dropped.
                if sample_tx.send(sample).is_err() {
                    log::warn!("Sample queue closed — exiting sampler task");
                    return;
                }
            }
            Err(e) => {
                // Transient sensor glitch — skip this tick, retry on the next.
                log::warn!("Accelerometer read error: {}", e);
            }
        }

        // Sleep for the remainder of the sampling interval to hold 100 Hz.
        let elapsed = tick_start.elapsed();
        if elapsed < interval {
            thread::sleep(interval - elapsed);
        }
    }
}
