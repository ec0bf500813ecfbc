//! Debounced active-low switch.
//!
//! ## Hardware
//!
//! Momentary or latching switch to ground with a pull-up.  Used for the
//! SOS button and for the strap / pressure worn switch.
//!
//! ## Debounce
//!
//! Sampled once per control tick.  The reported level changes only after
//! [`DEBOUNCE_SAMPLES`] consecutive raw samples agree, so at 100 ms ticks
//! a press is seen 100–200 ms after contact settles.
//!
//! The worn switch is built [`with_instant_release`](ActiveLowSwitch::with_instant_release):
//! closing is debounced, opening is reported on the first open sample so
//! taking the helmet off reaches the interlock on the next tick.

use embedded_hal::digital::InputPin;

use crate::error::SensorError;

pub const DEBOUNCE_SAMPLES: u8 = 2;

pub struct ActiveLowSwitch<P> {
    pin: P,
    stable: bool,
    candidate: bool,
    agree: u8,
    instant_release: bool,
}

impl<P: InputPin> ActiveLowSwitch<P> {
    /// `initial` is the level assumed before the first sample.
    pub fn new(pin: P, initial: bool) -> Self {
        Self {
            pin,
            stable: initial,
            candidate: initial,
            agree: DEBOUNCE_SAMPLES,
            instant_release: false,
        }
    }

    /// Report an opening switch without waiting for the debounce.
    pub fn with_instant_release(mut self) -> Self {
        self.instant_release = true;
        self
    }

    /// Sample the pin and return the debounced level (`true` = closed).
    pub fn sample(&mut self) -> Result<bool, SensorError> {
        let closed = self.pin.is_low().map_err(|_| SensorError::Bus)?;
        if !closed && self.instant_release {
            self.stable = false;
            self.candidate = false;
            self.agree = DEBOUNCE_SAMPLES;
            return Ok(false);
        }
        if closed == self.candidate {
            self.agree = self.agree.saturating_add(1);
        } else {
            self.candidate = closed;
            self.agree = 1;
        }
        if self.agree >= DEBOUNCE_SAMPLES {
            self.stable = self.candidate;
        }
        Ok(self.stable)
    }

    /// Last debounced level without sampling.
    pub fn level(&self) -> bool {
        self.stable
    }
}
