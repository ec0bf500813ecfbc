//! Port traits: the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ Scheduler (domain)
//! ```
//!
//! Driven adapters (sensors, transport, outputs, event sinks, storage)
//! implement these traits.  The [`Scheduler`](crate::scheduler::Scheduler)
//! owns them via generics, so the domain core never touches hardware
//! directly.
//!
//! Every call made from the control loop must return within the adapter's
//! own time budget: I²C transactions carry a timeout, UART reads are
//! non-blocking.  An adapter that cannot answer in time reports
//! [`SensorError::Timeout`] instead of stalling the tick.

use crate::alerts::message::StructuredMessage;
use crate::app::commands::CommandToken;
use crate::config::SystemConfig;
use crate::error::{SensorError, TransportError};
use crate::sensors::sample::{LocationSample, MotionSample};

// ───────────────────────────────────────────────────────────────
// Sensor port (driven adapter: hardware → domain)
// ───────────────────────────────────────────────────────────────

/// Read-side port: one call per input per tick.
pub trait SensorPort {
    /// Six-axis IMU sample in m/s² and deg/s.
    fn read_motion(&mut self) -> Result<MotionSample, SensorError>;

    /// Heart rate in beats per minute.
    fn read_vitals(&mut self) -> Result<u16, SensorError>;

    /// Current position fix.  Called on the location cadence and as a
    /// fallback when an alert needs a location and the cache is empty.
    fn read_location(&mut self) -> Result<LocationSample, SensorError>;

    /// Recognised voice command, if one arrived since the last call.
    fn read_command(&mut self) -> Option<CommandToken>;

    /// Current (debounced) level of the SOS button.
    fn button_pressed(&mut self) -> bool;

    /// Strap / pressure switch: `true` when the helmet is on a head.
    fn read_worn(&mut self) -> Result<bool, SensorError>;

    /// Drain streaming inputs (the GPS UART) so their buffers never fall
    /// behind.  Called once per tick before any read.
    fn poll(&mut self) -> Result<(), SensorError> {
        Ok(())
    }
}

// ───────────────────────────────────────────────────────────────
// Transport port (driven adapter: domain → phone link)
// ───────────────────────────────────────────────────────────────

/// Outbound message capability.  Failures are reported, never retried.
pub trait TransportPort {
    fn send(&mut self, message: &StructuredMessage) -> Result<(), TransportError>;
}

// ───────────────────────────────────────────────────────────────
// Output ports (driven adapters: domain → hardware)
// ───────────────────────────────────────────────────────────────

/// Engine-enable line.
pub trait ActuatorPort {
    fn set_engine_enabled(&mut self, enabled: bool);
}

/// Liveness indicator (status LED).
pub trait IndicatorPort {
    /// Advance the heartbeat pattern by one tick.
    fn toggle(&mut self);

    /// Switch between the normal and degraded pattern.
    fn set_degraded(&mut self, degraded: bool);
}

/// Spoken prompts played to the wearer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Prompt {
    FallCheck,
    SosSent,
}

impl Prompt {
    pub const fn text(self) -> &'static str {
        match self {
            Self::FallCheck => "Fall detected. Are you okay?",
            Self::SosSent => "SOS alert sent",
        }
    }
}

pub trait PromptPort {
    fn play(&mut self, prompt: Prompt);
}

// ───────────────────────────────────────────────────────────────
// Clock port
// ───────────────────────────────────────────────────────────────

/// Monotonic time source.  `now_ms` never goes backwards.
pub trait Clock {
    fn now_ms(&self) -> u64;

    /// Block the calling task for `ms` milliseconds.
    fn sleep_ms(&mut self, ms: u64);
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port.  Adapters decide where they go.
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}

// ───────────────────────────────────────────────────────────────
// Configuration port (driven adapter: domain ↔ persistent config)
// ───────────────────────────────────────────────────────────────

/// Loads and persists system configuration.
///
/// Implementations MUST validate before persisting and reject invalid
/// ranges with [`ConfigError::ValidationFailed`] rather than clamping.
pub trait ConfigPort {
    /// Load configuration from persistent storage.
    /// Returns [`SystemConfig::default()`] if no stored config exists.
    fn load(&self) -> Result<SystemConfig, ConfigError>;

    /// Validate and persist configuration.
    fn save(&self, config: &SystemConfig) -> Result<(), ConfigError>;
}

// ───────────────────────────────────────────────────────────────
// Storage port (driven adapter: domain ↔ NVS / flash)
// ───────────────────────────────────────────────────────────────

/// Persistent key-value storage.
///
/// Write operations MUST be atomic.  The ESP-IDF NVS API guarantees this
/// natively; the in-memory simulation achieves it trivially.
pub trait StoragePort {
    /// Read a value.  Returns the number of bytes written to `buf`.
    fn read(&self, namespace: &str, key: &str, buf: &mut [u8]) -> Result<usize, StorageError>;

    /// Write a value atomically.
    fn write(&mut self, namespace: &str, key: &str, data: &[u8]) -> Result<(), StorageError>;

    /// Delete a key.  Returns `Ok(())` even if the key didn't exist.
    fn delete(&mut self, namespace: &str, key: &str) -> Result<(), StorageError>;

    fn exists(&self, namespace: &str, key: &str) -> bool;
}

// ───────────────────────────────────────────────────────────────
// Error types
// ───────────────────────────────────────────────────────────────

/// Errors from [`ConfigPort`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// No config found in storage (first boot).
    NotFound,
    /// Stored config failed deserialization.
    Corrupted,
    /// A config field failed range validation.
    /// The `&'static str` describes which field and why.
    ValidationFailed(&'static str),
    /// Underlying storage is full.
    StorageFull,
    /// Generic I/O error from the storage backend.
    IoError,
}

/// Errors from [`StoragePort`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageError {
    NotFound,
    Full,
    IoError,
    /// Caller buffer smaller than the stored value.
    BufferTooSmall,
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::NotFound => write!(f, "config not found"),
            Self::Corrupted => write!(f, "config corrupted"),
            Self::ValidationFailed(msg) => write!(f, "validation failed: {}", msg),
            Self::StorageFull => write!(f, "storage full"),
            Self::IoError => write!(f, "I/O error"),
        }
    }
}

impl core::fmt::Display for StorageError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::NotFound => write!(f, "key not found"),
            Self::Full => write!(f, "storage full"),
            Self::IoError => write!(f, "I/O error"),
            Self::BufferTooSmall => write!(f, "buffer too small"),
        }
    }
}

impl From<StorageError> for ConfigError {
    fn from(e: StorageError) -> Self {
        match e {
            StorageError::NotFound => Self::NotFound,
            StorageError::Full => Self::StorageFull,
            StorageError::IoError | StorageError::BufferTooSmall => Self::IoError,
        }
    }
}
