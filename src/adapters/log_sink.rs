//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured application events to
//! the ESP-IDF logger (UART / USB-CDC in production).  Each event is one
//! line with a fixed prefix so field logs can be grepped by subsystem.

use log::{debug, error, info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`AppEvent`] to the serial console.
#[derive(Debug, Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Started => info!("START | control loop running"),
            AppEvent::AlertQueued(kind) => info!("ALERT | {} queued", kind),
            AppEvent::AlertSuppressed(kind) => debug!("ALERT | {} suppressed (cooldown)", kind),
            AppEvent::AlertDropped(kind) => warn!("ALERT | {} dropped (outbox full)", kind),
            AppEvent::TransportFailed { kind, error } => {
                warn!("LINK  | {} send failed: {}", kind, error);
            }
            AppEvent::SensorFault { sensor, error } => {
                warn!("SENSOR | {} fault: {}", sensor, error);
            }
            AppEvent::SensorRecovered(sensor) => info!("SENSOR | {} recovered", sensor),
            AppEvent::Degraded(true) => error!("HEALTH | degraded"),
            AppEvent::Degraded(false) => info!("HEALTH | nominal"),
            AppEvent::InterlockChanged { enabled } => {
                info!(
                    "ENGINE | {}",
                    if *enabled { "enabled" } else { "disabled" }
                );
            }
            AppEvent::LocationRefreshed { lat, lon } => {
                debug!("GPS   | fix {:.5},{:.5}", lat, lon);
            }
            AppEvent::Stopped => info!("STOP  | control loop stopped, engine disabled"),
        }
    }
}
