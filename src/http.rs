// StepWatch — Control Plane HTTP Server
//
// GET /      — status page (step count + device IP)
// GET /reset — raise the reset signal, acknowledge immediately
//
// Handlers only read the atomic counter and raise the reset flag; the
// detection pipeline is never blocked from here.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use anyhow::Result;
use esp_idf_svc::http::server::{Configuration as HttpServerConfig, EspHttpServer};
use esp_idf_svc::http::Method;
use esp_idf_svc::io::Write;
use serde::Serialize;

use crate::sync::ResetSignal;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ResetAck {
    step_count: u32,
}

/// Start the HTTP server. The returned handle must stay alive for the
/// handlers to keep serving.
pub fn start(
    step_count: Arc<AtomicU32>,
    reset: Arc<ResetSignal>,
    ip: String,
) -> Result<EspHttpServer<'static>> {
    let mut server = EspHttpServer::new(&HttpServerConfig::default())?;

    let counter = Arc::clone(&step_count);
    server.fn_handler("/", Method::Get, move |request| -> Result<()> {
        let steps = counter.load(Ordering::Relaxed);
        let html = status_page(steps, &ip);
        let mut response =
            request.into_response(200, Some("OK"), &[("Content-Type", "text/html")])?;
        response.write_all(html.as_bytes())?;
        Ok(())
    })?;

    server.fn_handler("/reset", Method::Get, move |request| -> Result<()> {
        reset.raise();
        log::info!("Reset requested over HTTP");

        // Optimistic acknowledgment; the detector applies the reset
        // asynchronously on its next cycle.
        let body = serde_json::to_string(&ResetAck { step_count: 0 })?;
        let mut response =
            request.into_response(200, Some("OK"), &[("Content-Type", "application/json")])?;
        response.write_all(body.as_bytes())?;
        Ok(())
    })?;

    log::info!("HTTP server started");
    Ok(server)
}

fn status_page(steps: u32, ip: &str) -> String {
    format!(
        "<!DOCTYPE html><html><head><title>Step Counter</title>\
         <meta name='viewport' content='width=device-width, initial-scale=1'>\
         <meta http-equiv='refresh' content='3'>\
         <style>\
         body{{font-family:Arial;background:#f9f9f9;text-align:center;}}\
         .count{{font-size:32px;color:#007bff;font-weight:bold;margin:20px 0;}}\
         .btn{{padding:15px 30px;color:#fff;background:#007bff;border:none;\
         border-radius:5px;font-size:18px;cursor:pointer;}}\
         .ip{{color:#666;margin-top:20px;font-size:14px;}}\
         </style></head><body>\
         <h1>Step Counter</h1>\
         <p class='count'>{steps} steps</p>\
         <button class='btn' onclick='location.href=\"/reset\"'>Reset counter</button>\
         <p class='ip'>IP: {ip}</p>\
         </body></html>"
    )
}
