//! Sensor subsystem: individual drivers and the aggregating [`SensorHub`].
//!
//! The hub owns the [`SensorPort`] backend and produces one
//! [`SensorSnapshot`] per tick.  It is the single place where readings
//! are sanity-checked:
//!
//! - non-finite motion, implausible heart rates and out-of-range fixes
//!   become [`SensorError::Malformed`];
//! - a failed read reuses the last good value while the failure run is
//!   shorter than the escalation count, after which the value is
//!   considered stale and the input is skipped; the worn switch instead
//!   falls back to "not worn" so the interlock fails safe;
//! - streaming inputs are drained every tick through
//!   [`SensorPort::poll`], whose failures count against the GPS;
//! - [`SensorError::NotReady`] (no fix yet, no skin contact) is absence,
//!   not a fault: it is neither counted nor papered over.

pub mod gps;
pub mod imu;
pub mod pulse;
pub mod sample;
pub mod simulated;
pub mod voice;

use log::{error, info, warn};

use crate::app::commands::CommandToken;
use crate::app::events::AppEvent;
use crate::app::ports::{EventSink, SensorPort};
use crate::error::SensorError;
use sample::{LocationSample, MotionSample, validate_heart_rate};
use simulated::SimulatedSensors;

/// Inputs whose health is tracked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SensorId {
    Motion,
    Vitals,
    Location,
    Worn,
}

impl SensorId {
    pub const COUNT: usize = 4;

    const fn index(self) -> usize {
        match self {
            Self::Motion => 0,
            Self::Vitals => 1,
            Self::Location => 2,
            Self::Worn => 3,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Motion => "imu",
            Self::Vitals => "pulse",
            Self::Location => "gps",
            Self::Worn => "worn_switch",
        }
    }
}

impl core::fmt::Display for SensorId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One tick of sensor input.  `None` means "skip evaluation this tick".
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SensorSnapshot {
    pub motion: Option<MotionSample>,
    pub heart_rate: Option<u16>,
    pub command: Option<CommandToken>,
    pub button: bool,
    pub worn: Option<bool>,
}

/// Map an `embedded-hal` I²C error onto the sensor error space.
pub(crate) fn i2c_error<E: embedded_hal::i2c::Error>(e: &E) -> SensorError {
    use embedded_hal::i2c::ErrorKind;
    match e.kind() {
        ErrorKind::NoAcknowledge(_) => SensorError::Timeout,
        _ => SensorError::Bus,
    }
}

// ───────────────────────────────────────────────────────────────
// Backend selection
// ───────────────────────────────────────────────────────────────

/// Sensor backend chosen at construction from `SystemConfig::sensor_backend`.
pub enum SensorBackend<H> {
    Simulated(SimulatedSensors),
    Hardware(H),
}

impl<H: SensorPort> SensorPort for SensorBackend<H> {
    fn read_motion(&mut self) -> Result<MotionSample, SensorError> {
        match self {
            Self::Simulated(s) => s.read_motion(),
            Self::Hardware(h) => h.read_motion(),
        }
    }

    fn read_vitals(&mut self) -> Result<u16, SensorError> {
        match self {
            Self::Simulated(s) => s.read_vitals(),
            Self::Hardware(h) => h.read_vitals(),
        }
    }

    fn read_location(&mut self) -> Result<LocationSample, SensorError> {
        match self {
            Self::Simulated(s) => s.read_location(),
            Self::Hardware(h) => h.read_location(),
        }
    }

    fn read_command(&mut self) -> Option<CommandToken> {
        match self {
            Self::Simulated(s) => s.read_command(),
            Self::Hardware(h) => h.read_command(),
        }
    }

    fn button_pressed(&mut self) -> bool {
        match self {
            Self::Simulated(s) => s.button_pressed(),
            Self::Hardware(h) => h.button_pressed(),
        }
    }

    fn read_worn(&mut self) -> Result<bool, SensorError> {
        match self {
            Self::Simulated(s) => s.read_worn(),
            Self::Hardware(h) => h.read_worn(),
        }
    }

    fn poll(&mut self) -> Result<(), SensorError> {
        match self {
            Self::Simulated(s) => s.poll(),
            Self::Hardware(h) => h.poll(),
        }
    }
}

// ───────────────────────────────────────────────────────────────
// SensorHub
// ───────────────────────────────────────────────────────────────

/// Aggregates the sensor backend and produces a unified snapshot.
pub struct SensorHub<S> {
    port: S,
    escalation_count: u32,
    failures: [u32; SensorId::COUNT],
    last_motion: Option<MotionSample>,
    last_heart_rate: Option<u16>,
}

impl<S: SensorPort> SensorHub<S> {
    pub fn new(port: S, escalation_count: u32) -> Self {
        Self {
            port,
            escalation_count: escalation_count.max(1),
            failures: [0; SensorId::COUNT],
            last_motion: None,
            last_heart_rate: None,
        }
    }

    pub fn port(&self) -> &S {
        &self.port
    }

    pub fn port_mut(&mut self) -> &mut S {
        &mut self.port
    }

    /// Read every per-tick input.
    ///
    /// Individual read failures are logged and reported; a single flaky
    /// sensor must not stop the control loop.
    pub fn read_snapshot(&mut self, sink: &mut impl EventSink) -> SensorSnapshot {
        let polled = self.port.poll();
        self.settle(SensorId::Location, polled, sink);

        let motion = self
            .port
            .read_motion()
            .and_then(|m| if m.is_finite() { Ok(m) } else { Err(SensorError::Malformed) });
        let motion = match self.settle(SensorId::Motion, motion, sink) {
            Some(m) => {
                self.last_motion = Some(m);
                Some(m)
            }
            None => self.reusable(SensorId::Motion, self.last_motion),
        };

        let rate = self.port.read_vitals().and_then(validate_heart_rate);
        let heart_rate = match self.settle(SensorId::Vitals, rate, sink) {
            Some(r) => {
                self.last_heart_rate = Some(r);
                Some(r)
            }
            None => self.reusable(SensorId::Vitals, self.last_heart_rate),
        };

        let worn = self.port.read_worn();
        let worn = match self.settle(SensorId::Worn, worn, sink) {
            Some(w) => Some(w),
            // A dead strap switch must not keep the engine enabled.
            None if self.consecutive_failures(SensorId::Worn) >= self.escalation_count => {
                Some(false)
            }
            None => None,
        };

        SensorSnapshot {
            motion,
            heart_rate,
            command: self.port.read_command(),
            button: self.port.button_pressed(),
            worn,
        }
    }

    /// Fetch a fresh position fix.  Called on the location cadence and
    /// when an alert needs a location and none is cached.
    pub fn read_location(&mut self, sink: &mut impl EventSink) -> Option<LocationSample> {
        let fix = self.port.read_location().and_then(LocationSample::validated);
        self.settle(SensorId::Location, fix, sink)
    }

    /// `true` while any input has failed at least `escalation_count`
    /// times in a row.
    pub fn degraded(&self) -> bool {
        self.failures.iter().any(|&n| n >= self.escalation_count)
    }

    pub fn consecutive_failures(&self, id: SensorId) -> u32 {
        self.failures[id.index()]
    }

    // ── Internal ──────────────────────────────────────────────────

    /// Update the failure run for `id` and return the good value, if any.
    fn settle<T>(
        &mut self,
        id: SensorId,
        result: Result<T, SensorError>,
        sink: &mut impl EventSink,
    ) -> Option<T> {
        let run = &mut self.failures[id.index()];
        match result {
            Ok(v) => {
                if *run > 0 {
                    info!("SENSOR {} recovered after {} failures", id, *run);
                    sink.emit(&AppEvent::SensorRecovered(id));
                    *run = 0;
                }
                Some(v)
            }
            Err(SensorError::NotReady) => None,
            Err(error) => {
                *run = run.saturating_add(1);
                if *run == 1 {
                    warn!("SENSOR {} read failed: {}", id, error);
                    sink.emit(&AppEvent::SensorFault { sensor: id, error });
                } else if *run == self.escalation_count {
                    error!("SENSOR {} failed {} times in a row: {}", id, *run, error);
                }
                None
            }
        }
    }

    /// Last good value, unless the failure run has made it stale.
    fn reusable<T: Copy>(&self, id: SensorId, last: Option<T>) -> Option<T> {
        let run = self.failures[id.index()];
        if run == 0 || run >= self.escalation_count {
            None
        } else {
            last
        }
    }
}
