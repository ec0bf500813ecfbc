//! Unified error types for the SafeX firmware.
//!
//! Every collaborator failure is a small `Copy` enum so it can be logged,
//! counted, and carried inside [`AppEvent`](crate::app::events::AppEvent)s
//! without allocation.  Only configuration errors are fatal, and only at
//! startup; everything raised inside the control loop is recoverable.

use core::fmt;

use crate::app::ports::ConfigError;

// ---------------------------------------------------------------------------
// Top-level firmware error
// ---------------------------------------------------------------------------

/// Every fallible operation in the firmware funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// A sensor could not be read or returned unusable data.
    Sensor(SensorError),
    /// The outbound message link failed.
    Transport(TransportError),
    /// Configuration is invalid or could not be loaded.
    Config(ConfigError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sensor(e) => write!(f, "sensor: {e}"),
            Self::Transport(e) => write!(f, "transport: {e}"),
            Self::Config(e) => write!(f, "config: {e}"),
        }
    }
}

impl core::error::Error for Error {}

// ---------------------------------------------------------------------------
// Sensor errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorError {
    /// I2C / UART / GPIO transaction failed.
    Bus,
    /// The collaborator did not answer within its time budget.
    Timeout,
    /// Data arrived but is non-finite, corrupt, or physically implausible.
    Malformed,
    /// No valid reading yet (no GPS fix, pulse estimator still warming up).
    NotReady,
}

impl fmt::Display for SensorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bus => write!(f, "bus transaction failed"),
            Self::Timeout => write!(f, "read timed out"),
            Self::Malformed => write!(f, "malformed reading"),
            Self::NotReady => write!(f, "no reading available yet"),
        }
    }
}

impl From<SensorError> for Error {
    fn from(e: SensorError) -> Self {
        Self::Sensor(e)
    }
}

// ---------------------------------------------------------------------------
// Transport errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportError {
    /// No paired peer / link down.
    NotConnected,
    /// The link could not accept the whole message without blocking.
    Busy,
    /// Low-level write failure.
    Io,
    /// The message could not be rendered.
    Encode,
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotConnected => write!(f, "link not connected"),
            Self::Busy => write!(f, "link busy"),
            Self::Io => write!(f, "link I/O error"),
            Self::Encode => write!(f, "message encoding failed"),
        }
    }
}

impl From<TransportError> for Error {
    fn from(e: TransportError) -> Self {
        Self::Transport(e)
    }
}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Firmware-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
