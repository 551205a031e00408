// StepWatch — Display Task
//
// Presentation sink: picks up the latest step snapshot (or keeps the
// previous one when nothing new arrived) and redraws the OLED together
// with the device IP. No detection logic lives here.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crate::config::*;
use crate::drivers::display::{OledDisplay, SharedBus};
use crate::events::StepSnapshot;
use crate::sync::Latest;

pub fn display_task(bus: SharedBus, snapshot_rx: Arc<Latest<StepSnapshot>>, ip: String) {
    log::info!("Display task started");

    let mut display = OledDisplay::new(bus);
    let mut last = StepSnapshot::default();
    let refresh = Duration::from_millis(DISPLAY_REFRESH_MS);

    loop {
        if let Some(fresh) = snapshot_rx.recv_timeout(refresh) {
            last = fresh;
        }

        if let Err(e) = display.show_steps(&last, &ip) {
            log::error!("Display error: {}", e);
        }

        thread::sleep(refresh);
    }
}
