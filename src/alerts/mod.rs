//! Alert generation: events, wire messages, the anti-flood policy and the
//! bounded outbound queue.
//!
//! ```text
//!  detector verdict ──▶ AlertEvent ──▶ AlertDispatcher ──▶ Outbox ──▶ TransportPort
//!                                       (edge/cooldown)    (≤ 8)      (≤ N per tick)
//! ```

pub mod dispatcher;
pub mod message;
pub mod outbox;

pub use dispatcher::{AlertDispatcher, AlertLedger, AlertPolicy};
pub use message::{AlertBody, StructuredMessage, TelemetryData};
pub use outbox::{DrainReport, OUTBOX_CAPACITY, Outbox};

use crate::app::commands::Action;
use crate::sensors::sample::LocationSample;

/// Alert categories.  Policy and cooldown state are tracked per kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AlertKind {
    Fall,
    Sos,
    HeartRate,
    VoiceCommand,
    Telemetry,
}

impl AlertKind {
    pub const COUNT: usize = 5;

    pub const ALL: [Self; Self::COUNT] = [
        Self::Fall,
        Self::Sos,
        Self::HeartRate,
        Self::VoiceCommand,
        Self::Telemetry,
    ];

    pub const fn index(self) -> usize {
        match self {
            Self::Fall => 0,
            Self::Sos => 1,
            Self::HeartRate => 2,
            Self::VoiceCommand => 3,
            Self::Telemetry => 4,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Fall => "fall",
            Self::Sos => "sos",
            Self::HeartRate => "heart_rate",
            Self::VoiceCommand => "voice_command",
            Self::Telemetry => "telemetry",
        }
    }
}

impl core::fmt::Display for AlertKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One tick's worth of alert input, before policy is applied.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AlertEvent {
    Fall(Option<LocationSample>),
    Sos(Option<LocationSample>),
    AbnormalHeartRate(u16),
    VoiceCommand(Action),
    Telemetry(TelemetryData),
}

impl AlertEvent {
    pub const fn kind(&self) -> AlertKind {
        match self {
            Self::Fall(_) => AlertKind::Fall,
            Self::Sos(_) => AlertKind::Sos,
            Self::AbnormalHeartRate(_) => AlertKind::HeartRate,
            Self::VoiceCommand(_) => AlertKind::VoiceCommand,
            Self::Telemetry(_) => AlertKind::Telemetry,
        }
    }

    /// Render the wire message for this event.
    pub fn to_message(&self) -> StructuredMessage {
        match *self {
            Self::Fall(location) => StructuredMessage::Alert(AlertBody::Fall { location }),
            Self::Sos(location) => StructuredMessage::Alert(AlertBody::Sos { location }),
            Self::AbnormalHeartRate(rate) => StructuredMessage::Alert(AlertBody::HeartRate { rate }),
            Self::VoiceCommand(command) => StructuredMessage::Command { command },
            Self::Telemetry(data) => StructuredMessage::Telemetry(data),
        }
    }
}
