//! Simulated sensor backend.
//!
//! Used for bench runs without a sensor board (`sensor_backend =
//! "simulated"`) and throughout the host tests.  Every input can be set
//! to a value or an injected failure; defaults describe a wearer standing
//! still with a normal pulse at (0, 0).

use heapless::Deque;

use crate::app::commands::CommandToken;
use crate::app::ports::SensorPort;
use crate::error::SensorError;

use super::sample::{LocationSample, MotionSample};

const COMMAND_QUEUE: usize = 8;

#[derive(Debug, Clone)]
pub struct SimulatedSensors {
    motion: Result<MotionSample, SensorError>,
    vitals: Result<u16, SensorError>,
    location: Result<LocationSample, SensorError>,
    worn: Result<bool, SensorError>,
    button: bool,
    commands: Deque<CommandToken, COMMAND_QUEUE>,
    location_reads: u32,
}

impl Default for SimulatedSensors {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulatedSensors {
    pub fn new() -> Self {
        Self {
            motion: Ok(MotionSample::resting()),
            vitals: Ok(75),
            location: Ok(LocationSample::new(0.0, 0.0)),
            worn: Ok(true),
            button: false,
            commands: Deque::new(),
            location_reads: 0,
        }
    }

    pub fn set_motion(&mut self, motion: Result<MotionSample, SensorError>) {
        self.motion = motion;
    }

    pub fn set_vitals(&mut self, bpm: Result<u16, SensorError>) {
        self.vitals = bpm;
    }

    pub fn set_location(&mut self, fix: Result<LocationSample, SensorError>) {
        self.location = fix;
    }

    pub fn set_worn(&mut self, worn: Result<bool, SensorError>) {
        self.worn = worn;
    }

    pub fn set_button(&mut self, pressed: bool) {
        self.button = pressed;
    }

    /// Queue a recognised command; one is delivered per tick.
    /// Returns `false` if the queue is full.
    pub fn push_command(&mut self, token: CommandToken) -> bool {
        self.commands.push_back(token).is_ok()
    }

    /// How many times the location was requested.
    pub fn location_reads(&self) -> u32 {
        self.location_reads
    }
}

impl SensorPort for SimulatedSensors {
    fn read_motion(&mut self) -> Result<MotionSample, SensorError> {
        self.motion
    }

    fn read_vitals(&mut self) -> Result<u16, SensorError> {
        self.vitals
    }

    fn read_location(&mut self) -> Result<LocationSample, SensorError> {
        self.location_reads += 1;
        self.location
    }

    fn read_command(&mut self) -> Option<CommandToken> {
        self.commands.pop_front()
    }

    fn button_pressed(&mut self) -> bool {
        self.button
    }

    fn read_worn(&mut self) -> Result<bool, SensorError> {
        self.worn
    }
}
