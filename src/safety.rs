//! Worn-state tracking and the engine interlock.
//!
//! The interlock runs **every tick** after the alert decisions.  Its
//! output is a pure function of [`HelmetState::worn`]: no hysteresis, no
//! lag.  A helmet that has never reported being worn keeps the engine
//! disabled.
//!
//! ## Lifecycle
//!
//! 1. Boot: `worn = false`, engine disabled.
//! 2. Each tick the worn switch is read; a good reading updates `worn`,
//!    a failed read keeps the previous value.  Once the switch has failed
//!    `failure_escalation_count` times in a row the hub reports it as not
//!    worn, so a dead switch disables the engine.
//! 3. [`EngineInterlock::drive`] writes `enabled(state)` to the actuator.
//! 4. On stop, [`EngineInterlock::safe_shutdown`] forces the engine off.

use log::{info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::{ActuatorPort, EventSink};

/// Helmet state owned by the Scheduler.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HelmetState {
    worn: bool,
}

impl HelmetState {
    pub const fn new() -> Self {
        Self { worn: false }
    }

    pub fn worn(&self) -> bool {
        self.worn
    }

    /// Apply this tick's worn-switch reading.  `None` (read failed) keeps
    /// the previous state.
    pub fn update(&mut self, reading: Option<bool>) {
        if let Some(worn) = reading {
            self.worn = worn;
        }
    }
}

/// Engine-enable interlock.
#[derive(Debug, Default)]
pub struct EngineInterlock {
    /// Last level written to the actuator, for transition logging.
    last: Option<bool>,
}

impl EngineInterlock {
    pub const fn new() -> Self {
        Self { last: None }
    }

    /// The engine may run only while the helmet is worn.
    pub fn enabled(&self, state: &HelmetState) -> bool {
        state.worn()
    }

    /// Drive the actuator from `state`.  Called once per tick.
    pub fn drive(
        &mut self,
        state: &HelmetState,
        actuator: &mut impl ActuatorPort,
        sink: &mut impl EventSink,
    ) {
        let enabled = self.enabled(state);
        actuator.set_engine_enabled(enabled);
        if self.last != Some(enabled) {
            if enabled {
                info!("INTERLOCK: helmet worn, engine enabled");
            } else {
                warn!("INTERLOCK: helmet not worn, engine disabled");
            }
            sink.emit(&AppEvent::InterlockChanged { enabled });
            self.last = Some(enabled);
        }
    }

    /// Force the engine off regardless of helmet state.
    pub fn safe_shutdown(&mut self, actuator: &mut impl ActuatorPort, sink: &mut impl EventSink) {
        actuator.set_engine_enabled(false);
        if self.last != Some(false) {
            sink.emit(&AppEvent::InterlockChanged { enabled: false });
        }
        self.last = Some(false);
        info!("INTERLOCK: safe shutdown, engine disabled");
    }
}
