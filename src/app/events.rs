//! Outbound application events.
//!
//! The [`Scheduler`](crate::scheduler::Scheduler) emits these through the
//! [`EventSink`](super::ports::EventSink) port.  Adapters on the other
//! side decide what to do with them (serial log, test recorder, …).

use crate::alerts::AlertKind;
use crate::error::{SensorError, TransportError};
use crate::sensors::SensorId;

/// Structured events emitted by the application core.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AppEvent {
    /// The control loop has started.
    Started,

    /// An alert passed its policy and was queued for sending.
    AlertQueued(AlertKind),

    /// An alert condition held but its cooldown had not elapsed.
    AlertSuppressed(AlertKind),

    /// The outbound queue was full; the oldest message of this kind was
    /// discarded to make room.
    AlertDropped(AlertKind),

    /// The transport rejected a message; it has been dropped.
    TransportFailed {
        kind: AlertKind,
        error: TransportError,
    },

    /// A sensor read failed (last-known-good value reused if any).
    SensorFault {
        sensor: SensorId,
        error: SensorError,
    },

    /// A sensor produced a good reading after one or more failures.
    SensorRecovered(SensorId),

    /// The indicator entered (`true`) or left (`false`) degraded mode.
    Degraded(bool),

    /// The engine-enable output changed.
    InterlockChanged { enabled: bool },

    /// The location cache was refreshed with a new fix.
    LocationRefreshed { lat: f64, lon: f64 },

    /// The control loop has stopped; the engine is disabled.
    Stopped,
}
