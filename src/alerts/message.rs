//! Outbound wire messages.
//!
//! One JSON object per send:
//!
//! ```text
//! {"alert":"fall","location":{"lat":…,"lon":…}}
//! {"alert":"sos","location":null}
//! {"alert":"heart_rate","rate":130}
//! {"command":"initiate_call"}
//! {"heart_rate":75,"location":{…},"acceleration":{"acc_x":…,…},"helmet_worn":true}
//! ```
//!
//! Values not known yet (no GPS fix, no reading) serialize as `null`.

use serde::Serialize;

use super::AlertKind;
use crate::app::commands::Action;
use crate::error::TransportError;
use crate::sensors::sample::{LocationSample, MotionSample};

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "alert", rename_all = "snake_case")]
pub enum AlertBody {
    Fall { location: Option<LocationSample> },
    Sos { location: Option<LocationSample> },
    HeartRate { rate: u16 },
}

/// Periodic status snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct TelemetryData {
    pub heart_rate: Option<u16>,
    pub location: Option<LocationSample>,
    pub acceleration: Option<MotionSample>,
    pub helmet_worn: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum StructuredMessage {
    Alert(AlertBody),
    Command { command: Action },
    Telemetry(TelemetryData),
}

impl StructuredMessage {
    pub const fn kind(&self) -> AlertKind {
        match self {
            Self::Alert(AlertBody::Fall { .. }) => AlertKind::Fall,
            Self::Alert(AlertBody::Sos { .. }) => AlertKind::Sos,
            Self::Alert(AlertBody::HeartRate { .. }) => AlertKind::HeartRate,
            Self::Command { .. } => AlertKind::VoiceCommand,
            Self::Telemetry(_) => AlertKind::Telemetry,
        }
    }

    pub fn to_json(&self) -> Result<String, TransportError> {
        serde_json::to_string(self).map_err(|_| TransportError::Encode)
    }
}
