// StepWatch — Step Detection Task
//
// Consumes accelerometer samples with a bounded-timeout receive, drives
// the detection core, owns the shared step counter, republishes the
// latest snapshot, and services asynchronous reset requests. The reset
// probe runs every cycle — a stalled sensor never leaves a reset pending.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::mpsc::{Receiver, RecvTimeoutError};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crate::config::*;
use crate::detect::{StepDetector, StepEvent};
use crate::events::{AccelSample, StepSnapshot};
use crate::sync::{Latest, ResetSignal};

pub fn step_task(
    sample_rx: Receiver<AccelSample>,
    snapshot: Arc<Latest<StepSnapshot>>,
    step_count: Arc<AtomicU32>,
    reset: Arc<ResetSignal>,
) {
    log::info!("Step detection task started");

    let mut detector = StepDetector::new();
    let recv_timeout = Duration::from_millis(SAMPLE_RECV_TIMEOUT_MS);
    let idle_delay = Duration::from_millis(STEP_IDLE_DELAY_MS);

    loop {
        match sample_rx.recv_timeout(recv_timeout) {
            Ok(sample) => match detector.process(&sample, crate::now_ms()) {
                StepEvent::Registered => {
                    let total = step_count.fetch_add(1, Ordering::Relaxed) + 1;
                    log::info!("Step detected! Total: {}", total);
                    snapshot.publish(StepSnapshot {
                        step_count: total,
                        avg_magnitude: detector.average(),
                        step_detected: true,
                    });
                }
                StepEvent::Closed => {
                    snapshot.publish(StepSnapshot {
                        step_count: step_count.load(Ordering::Relaxed),
                        avg_magnitude: detector.average(),
                        step_detected: false,
                    });
                }
                StepEvent::Idle => {}
            },
            Err(RecvTimeoutError::Timeout) => {
                // No new data this cycle — resets are still serviced below.
            }
            Err(RecvTimeoutError::Disconnected) => {
                log::warn!("Sample queue closed — exiting step task");
                return;
            }
        }

        if reset.take() {
            step_count.store(0, Ordering::Relaxed);
            detector.reset();
            log::info!("Step counter reset");
            snapshot.publish(StepSnapshot {
                step_count: 0,
                avg_magnitude: detector.average(),
                step_detected: false,
            });
        }

        thread::sleep(idle_delay);
    }
}
