// StepWatch — Firmware Entry Point
//
// Boot sequence:
//   1. OLED splash screen.
//   2. MPU6050 self-test — fatal if the sensor does not answer.
//   3. WiFi association + SNTP (tolerated failure: the pipeline counts
//      steps with or without a network).
//   4. HTTP control plane (status page + reset).
//   5. Spawn the sampler, step-detection, and display tasks.
//
// Pipeline: sampler → bounded sample queue → step detector → single-slot
// snapshot channel → display. Resets arrive from the HTTP handler through
// a one-shot signal the detector probes every cycle.

mod config;
mod detect;
mod drivers;
mod events;
mod http;
mod net;
mod sync;
mod tasks;

use std::sync::atomic::AtomicU32;
use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use anyhow::bail;
use esp_idf_hal::cpu::Core;
use esp_idf_hal::i2c::{I2cConfig, I2cDriver};
use esp_idf_hal::prelude::*;
use esp_idf_hal::task::thread::ThreadSpawnConfiguration;
use esp_idf_svc::eventloop::EspSystemEventLoop;

use crate::config::*;
use crate::drivers::display::OledDisplay;
use crate::drivers::imu::Mpu6050;
use crate::events::StepSnapshot;
use crate::sync::{Latest, ResetSignal};

// ---------------------------------------------------------------------------
// Utility: milliseconds since boot (wraps at ~49 days — fine for debounce)
// ---------------------------------------------------------------------------
pub fn now_ms() -> u32 {
    unsafe { (esp_idf_sys::esp_timer_get_time() / 1000) as u32 }
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------
fn main() -> anyhow::Result<()> {
    // Link esp-idf-sys runtime patches and initialise logging.
    esp_idf_svc::sys::link_patches();
    esp_idf_svc::log::EspLogger::initialize_default();
    log::info!("StepWatch firmware starting…");

    let peripherals = Peripherals::take()?;
    let sysloop = EspSystemEventLoop::take()?;

    // ---- I2C bus (shared between OLED and MPU6050) ------------------------
    let i2c_config = I2cConfig::new().baudrate(400u32.kHz().into());
    let i2c = I2cDriver::new(
        peripherals.i2c0,
        peripherals.pins.gpio21, // SDA
        peripherals.pins.gpio22, // SCL
        &i2c_config,
    )?;
    // SAFETY: The I2C peripheral is a singleton obtained from
    // `Peripherals::take()`. It will live for the entire programme duration
    // (embedded firmware never exits).
    let i2c_bus: &'static Mutex<I2cDriver<'static>> =
        Box::leak(Box::new(Mutex::new(unsafe { core::mem::transmute(i2c) })));

    // ---- Display + splash --------------------------------------------------
    let mut display = OledDisplay::new(i2c_bus);
    display.init()?;
    display.show_splash()?;

    // ---- Accelerometer self-test -------------------------------------------
    let imu = Mpu6050::new(i2c_bus);
    if !imu.is_connected() {
        log::error!("MPU6050 not responding on the I2C bus");
        display.show_wiring_error()?;
        bail!("accelerometer self-test failed — refusing to start the pipeline");
    }
    imu.init()?;
    log::info!("MPU6050 connected");

    // ---- WiFi + SNTP (failure tolerated) -----------------------------------
    let (wifi, ip) = match net::connect_wifi(peripherals.modem, sysloop) {
        Ok((wifi, ip)) => {
            display.show_wifi_connected(&ip)?;
            thread::sleep(Duration::from_secs(2));
            (Some(wifi), ip)
        }
        Err(e) => {
            log::warn!("WiFi unavailable: {}", e);
            (None, String::from("0.0.0.0"))
        }
    };
    let _sntp = wifi.as_ref().and_then(|_| net::start_sntp().ok());

    // ---- Shared state + channels -------------------------------------------
    let (sample_tx, sample_rx) = mpsc::sync_channel(SAMPLE_QUEUE_DEPTH);
    let snapshot = Arc::new(Latest::<StepSnapshot>::new());
    let step_count = Arc::new(AtomicU32::new(0));
    let reset = Arc::new(ResetSignal::new());

    // ---- Control plane ------------------------------------------------------
    let _server = http::start(Arc::clone(&step_count), Arc::clone(&reset), ip.clone())?;

    // ---- Spawn tasks (map to FreeRTOS tasks via std::thread) ----------------
    // Pipeline tasks are pinned to core 1 so the WiFi/network stack on
    // core 0 cannot preempt the sampling/detection timing.

    ThreadSpawnConfiguration {
        priority: PRIORITY_PIPELINE,
        pin_to_core: Some(Core::Core1),
        ..Default::default()
    }
    .set()?;

    // Sampler — tightest timing, spawned first.
    thread::Builder::new()
        .name("sampler".into())
        .stack_size(STACK_SAMPLER)
        .spawn(move || {
            tasks::sampler::sampler_task(i2c_bus, sample_tx);
        })?;

    // Step detection
    let step_snapshot = Arc::clone(&snapshot);
    let step_counter = Arc::clone(&step_count);
    let step_reset = Arc::clone(&reset);
    thread::Builder::new()
        .name("step".into())
        .stack_size(STACK_STEP)
        .spawn(move || {
            tasks::step::step_task(sample_rx, step_snapshot, step_counter, step_reset);
        })?;

    // Display — best-effort, below the detection pair.
    ThreadSpawnConfiguration {
        priority: PRIORITY_DISPLAY,
        pin_to_core: Some(Core::Core1),
        ..Default::default()
    }
    .set()?;

    thread::Builder::new()
        .name("display".into())
        .stack_size(STACK_DISPLAY)
        .spawn(move || {
            tasks::display::display_task(i2c_bus, snapshot, ip);
        })?;

    log::info!("Ready! Start walking…");

    // Main thread has nothing left to do — park it forever. The WiFi, SNTP,
    // and HTTP server handles stay alive with it.
    loop {
        thread::sleep(Duration::from_secs(60));
    }
}
