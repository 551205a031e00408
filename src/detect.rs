// StepWatch — Step Detection Core
//
// Rolling magnitude baseline plus a two-edge debounced threshold rule.
// Raw accelerometer magnitude oscillates above threshold for several
// consecutive samples during one physical step; the open/close flag and
// the minimum inter-step interval collapse each physical step to exactly
// one count. Timestamps are injected so the logic runs off-target.

use crate::config::{MAGNITUDE_WINDOW_LEN, STEP_DEBOUNCE_MS, STEP_THRESHOLD};
use crate::events::AccelSample;

// ---------------------------------------------------------------------------
// Magnitude Window — fixed-capacity circular buffer of recent magnitudes
// ---------------------------------------------------------------------------
pub struct MagnitudeWindow {
    slots: [f32; MAGNITUDE_WINDOW_LEN],
    write_ix: usize,
}

impl MagnitudeWindow {
    pub fn new() -> Self {
        Self {
            slots: [0.0; MAGNITUDE_WINDOW_LEN],
            write_ix: 0,
        }
    }

    /// Insert a magnitude at the next write position (wrap-around) and
    /// return the mean over all slots. Slots start zeroed, so the mean
    /// stays biased low until the window has filled once — intentional
    /// warm-up behavior, the baseline adapts within the first 15 samples.
    pub fn push(&mut self, magnitude: f32) -> f32 {
        self.slots[self.write_ix] = magnitude;
        self.write_ix = (self.write_ix + 1) % MAGNITUDE_WINDOW_LEN;
        self.slots.iter().sum::<f32>() / MAGNITUDE_WINDOW_LEN as f32
    }
}

// ---------------------------------------------------------------------------
// Step Detector
// ---------------------------------------------------------------------------

/// What one processed sample did to the detector state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepEvent {
    /// No state change this sample.
    Idle,
    /// Threshold up-crossing with debounce satisfied — one step counted.
    Registered,
    /// Magnitude fell back to or below threshold — the open step closed.
    Closed,
}

pub struct StepDetector {
    window: MagnitudeWindow,
    /// True between the registration edge and the close edge.
    step_open: bool,
    /// Registration time of the most recent step. `None` until the first
    /// step, which is therefore never debounce-suppressed.
    last_step_ms: Option<u32>,
    avg_magnitude: f32,
}

impl StepDetector {
    pub fn new() -> Self {
        Self {
            window: MagnitudeWindow::new(),
            step_open: false,
            last_step_ms: None,
            avg_magnitude: 0.0,
        }
    }

    /// Mean over the magnitude window as of the last processed sample.
    pub fn average(&self) -> f32 {
        self.avg_magnitude
    }

    /// Feed one sample through the baseline and the detection rule.
    ///
    /// `now_ms` is milliseconds since boot (wrapping arithmetic, so the
    /// ~49-day rollover does not break the debounce comparison).
    pub fn process(&mut self, sample: &AccelSample, now_ms: u32) -> StepEvent {
        let magnitude = sample.magnitude();
        self.avg_magnitude = self.window.push(magnitude);

        if magnitude > self.avg_magnitude + STEP_THRESHOLD {
            let debounced = match self.last_step_ms {
                Some(last) => now_ms.wrapping_sub(last) >= STEP_DEBOUNCE_MS,
                None => true,
            };
            if !self.step_open && debounced {
                self.step_open = true;
                self.last_step_ms = Some(now_ms);
                return StepEvent::Registered;
            }
        } else if self.step_open {
            self.step_open = false;
            return StepEvent::Closed;
        }

        StepEvent::Idle
    }

    /// Clear the open-step flag. The window and the last registration
    /// time are kept — a reset zeroes the count, not the signal history.
    pub fn reset(&mut self) {
        self.step_open = false;
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
#[cfg(test)]
mod tests {
    use super::*;

    fn sample(magnitude: f32) -> AccelSample {
        AccelSample {
            ax: magnitude,
            ay: 0.0,
            az: 0.0,
        }
    }

    /// Drives the detector with one sample every 10 ms of simulated time.
    struct Sim {
        det: StepDetector,
        t: u32,
        registered: u32,
    }

    impl Sim {
        fn new() -> Self {
            Sim {
                det: StepDetector::new(),
                t: 0,
                registered: 0,
            }
        }

        fn feed(&mut self, magnitude: f32) -> StepEvent {
            let event = self.det.process(&sample(magnitude), self.t);
            self.t += 10;
            if event == StepEvent::Registered {
                self.registered += 1;
            }
            event
        }

        fn feed_n(&mut self, magnitude: f32, n: usize) {
            for _ in 0..n {
                self.feed(magnitude);
            }
        }
    }

    #[test]
    fn warmup_average_spans_all_slots() {
        let mut window = MagnitudeWindow::new();
        let mean = window.push(3.0);
        assert!((mean - 3.0 / MAGNITUDE_WINDOW_LEN as f32).abs() < 1e-6);
    }

    #[test]
    fn window_wraps_and_replaces_oldest() {
        let mut window = MagnitudeWindow::new();
        for _ in 0..MAGNITUDE_WINDOW_LEN {
            window.push(1.0);
        }
        // One more push overwrites a 1.0 slot, not a zero.
        let mean = window.push(2.5);
        let expected = (14.0 + 2.5) / MAGNITUDE_WINDOW_LEN as f32;
        assert!((mean - expected).abs() < 1e-6);
    }

    #[test]
    fn sustained_spike_counts_once() {
        let mut sim = Sim::new();
        sim.feed_n(1.0, 15); // settle the baseline at 1.0

        // Spike sustained for 3 samples: one registration, then quiet.
        assert_eq!(sim.feed(2.5), StepEvent::Registered);
        assert_eq!(sim.feed(2.5), StepEvent::Idle);
        assert_eq!(sim.feed(2.5), StepEvent::Idle);

        // Falling back at/below threshold closes the step exactly once.
        assert_eq!(sim.feed(1.0), StepEvent::Closed);
        assert_eq!(sim.feed(1.0), StepEvent::Idle);

        assert_eq!(sim.registered, 1);
    }

    #[test]
    fn close_edge_requires_open_step() {
        let mut sim = Sim::new();
        sim.feed_n(1.0, 15);
        // Below threshold with no open step never emits a close edge.
        assert_eq!(sim.feed(1.0), StepEvent::Idle);
    }

    #[test]
    fn rapid_second_spike_is_debounced() {
        let mut sim = Sim::new();
        sim.feed_n(1.0, 15);

        assert_eq!(sim.feed(2.5), StepEvent::Registered); // t = 150 ms
        assert_eq!(sim.feed(1.0), StepEvent::Closed);

        // Next spike only 100 ms after the first registration.
        sim.feed_n(1.0, 8);
        assert_eq!(sim.feed(2.5), StepEvent::Idle); // t = 250 ms — suppressed

        assert_eq!(sim.registered, 1);
    }

    #[test]
    fn spaced_spikes_count_separately() {
        let mut sim = Sim::new();
        sim.feed_n(1.0, 15);

        assert_eq!(sim.feed(2.5), StepEvent::Registered); // t = 150 ms
        assert_eq!(sim.feed(1.0), StepEvent::Closed);

        // 310 ms after the first registration — outside the debounce.
        sim.feed_n(1.0, 29);
        assert_eq!(sim.feed(2.5), StepEvent::Registered); // t = 460 ms

        assert_eq!(sim.registered, 2);
    }

    #[test]
    fn first_step_is_not_debounce_suppressed() {
        let mut sim = Sim::new();
        sim.feed_n(1.0, 15);
        // t = 150 ms, well inside what a fictitious step at t = 0 would
        // suppress — but there was no previous step.
        assert_eq!(sim.feed(2.5), StepEvent::Registered);
    }

    #[test]
    fn reset_clears_open_step() {
        let mut sim = Sim::new();
        sim.feed_n(1.0, 15);
        assert_eq!(sim.feed(2.5), StepEvent::Registered);

        // Reset arrives while the step is still open.
        sim.det.reset();

        // The spike is still above threshold, but 10 ms since the last
        // registration keeps the debounce closed — no double count.
        assert_eq!(sim.feed(2.5), StepEvent::Idle);
        // Baseline return produces no spurious close edge either.
        assert_eq!(sim.feed(1.0), StepEvent::Idle);
    }

    #[test]
    fn reset_zeroes_and_restarts_counting() {
        let mut sim = Sim::new();
        sim.feed_n(1.0, 15);

        // Five well-separated steps.
        for _ in 0..5 {
            assert_eq!(sim.feed(2.5), StepEvent::Registered);
            sim.feed(1.0); // close edge
            sim.feed_n(1.0, 30); // 300 ms of baseline
        }
        assert_eq!(sim.registered, 5);

        sim.det.reset();
        sim.feed_n(1.0, 30);

        // Counting resumes from a clean slate: exactly one more edge.
        assert_eq!(sim.feed(2.5), StepEvent::Registered);
        assert_eq!(sim.registered, 6);
    }

    #[test]
    fn debounce_survives_timestamp_wraparound() {
        let mut det = StepDetector::new();
        for _ in 0..15 {
            det.process(&sample(1.0), u32::MAX - 200);
        }
        assert_eq!(det.process(&sample(2.5), u32::MAX - 150), StepEvent::Registered);
        assert_eq!(det.process(&sample(1.0), u32::MAX - 140), StepEvent::Closed);
        // 310 ms later, across the wrap.
        assert_eq!(det.process(&sample(2.5), 159), StepEvent::Registered);
    }
}
