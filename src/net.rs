// StepWatch — WiFi Association & Time Sync
//
// Station-mode association with compiled-in credentials, then SNTP so
// wall-clock time is available. The pipeline does not depend on either:
// association failure leaves the firmware counting steps with no web UI.

use std::thread;
use std::time::Duration;

use anyhow::{bail, Result};
use esp_idf_svc::{
    eventloop::EspSystemEventLoop,
    hal::modem::Modem,
    sntp::EspSntp,
    wifi::{AuthMethod, BlockingWifi, ClientConfiguration, Configuration, EspWifi},
};

use crate::config::*;

/// Associate with the configured access point and wait for a DHCP lease.
///
/// Returns the WiFi handle (must stay alive for the connection to hold)
/// and the assigned IP address. Fails after a bounded number of attempts.
pub fn connect_wifi(modem: Modem, sysloop: EspSystemEventLoop) -> Result<(Box<EspWifi<'static>>, String)> {
    if WIFI_SSID.is_empty() {
        bail!("WiFi SSID is empty");
    }

    let auth_method = if WIFI_PASSWORD.is_empty() {
        AuthMethod::None
    } else {
        AuthMethod::WPA2Personal
    };

    let mut esp_wifi = EspWifi::new(modem, sysloop.clone(), None)?;
    let mut wifi = BlockingWifi::wrap(&mut esp_wifi, sysloop)?;

    wifi.set_configuration(&Configuration::Client(ClientConfiguration {
        ssid: WIFI_SSID
            .try_into()
            .map_err(|_| anyhow::anyhow!("SSID too long (max 32 chars)"))?,
        password: WIFI_PASSWORD
            .try_into()
            .map_err(|_| anyhow::anyhow!("password too long (max 64 chars)"))?,
        auth_method,
        ..Default::default()
    }))?;

    wifi.start()?;
    log::info!("Connecting to '{}'...", WIFI_SSID);

    let mut attempt = 0;
    loop {
        match wifi.connect() {
            Ok(()) => break,
            Err(e) => {
                attempt += 1;
                if attempt >= WIFI_CONNECT_ATTEMPTS {
                    bail!("WiFi association failed after {} attempts: {}", attempt, e);
                }
                log::warn!("WiFi connect attempt {} failed: {}", attempt, e);
                thread::sleep(Duration::from_millis(WIFI_RETRY_DELAY_MS));
            }
        }
    }

    wifi.wait_netif_up()?;

    let ip_info = wifi.wifi().sta_netif().get_ip_info()?;
    log::info!("WiFi connected, IP address: {}", ip_info.ip);

    Ok((Box::new(esp_wifi), ip_info.ip.to_string()))
}

/// Start SNTP against the default pool servers. The returned handle must
/// stay alive; sync completes in the background.
pub fn start_sntp() -> Result<EspSntp<'static>> {
    let sntp = EspSntp::new_default()?;
    log::info!("SNTP started (pool.ntp.org)");
    Ok(sntp)
}
