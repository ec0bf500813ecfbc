//! Hardware adapter: bridges real peripherals to domain port traits.
//!
//! [`HardwareSensors`] owns the sensor bus, the GPS link, and the input
//! switches, exposing them through [`SensorPort`].  [`HelmetOutputs`]
//! owns the engine relay and status LED behind [`ActuatorPort`],
//! [`IndicatorPort`] and [`PromptPort`].  Both are generic over
//! `embedded-hal` traits so the host tests drive them with fakes.

use embedded_hal::digital::{InputPin, OutputPin};
use embedded_hal::i2c::I2c;
use log::{info, warn};

use crate::app::commands::CommandToken;
use crate::app::ports::{ActuatorPort, IndicatorPort, Prompt, PromptPort, SensorPort};
use crate::drivers::engine::EngineRelay;
use crate::drivers::status_led::StatusLed;
use crate::drivers::switch::ActiveLowSwitch;
use crate::error::SensorError;
use crate::link::ByteLink;
use crate::sensors::gps::GpsReceiver;
use crate::sensors::imu::{MPU6050_ADDR, Mpu6050};
use crate::sensors::pulse::{MAX30102_ADDR, Max30102};
use crate::sensors::sample::{LocationSample, MotionSample};
use crate::sensors::voice::CommandMailbox;

/// Every sensor on the helmet board.
pub struct HardwareSensors<I2C, L, BTN, WORN> {
    i2c: I2C,
    imu: Mpu6050,
    pulse: Max30102,
    gps: GpsReceiver<L>,
    button: ActiveLowSwitch<BTN>,
    worn: ActiveLowSwitch<WORN>,
    commands: &'static CommandMailbox,
    button_fault: bool,
}

impl<I2C, L, BTN, WORN> HardwareSensors<I2C, L, BTN, WORN>
where
    I2C: I2c,
    L: ByteLink,
    BTN: InputPin,
    WORN: InputPin,
{
    pub fn new(
        i2c: I2C,
        gps_link: L,
        button: BTN,
        worn: WORN,
        commands: &'static CommandMailbox,
    ) -> Self {
        Self {
            i2c,
            imu: Mpu6050::new(MPU6050_ADDR),
            pulse: Max30102::new(MAX30102_ADDR),
            gps: GpsReceiver::new(gps_link),
            button: ActiveLowSwitch::new(button, false),
            worn: ActiveLowSwitch::new(worn, false).with_instant_release(),
            commands,
            button_fault: false,
        }
    }

    /// Probe and configure the I²C sensors.
    ///
    /// A missing sensor is logged, not fatal: its reads fail every tick
    /// and the indicator goes degraded.
    pub fn init(&mut self) -> Result<(), SensorError> {
        let imu = self.imu.init(&mut self.i2c);
        if let Err(e) = imu {
            warn!("IMU init failed: {}", e);
        }
        let pulse = self.pulse.init(&mut self.i2c);
        if let Err(e) = pulse {
            warn!("Pulse sensor init failed: {}", e);
        }
        imu.and(pulse)
    }
}

impl<I2C, L, BTN, WORN> SensorPort for HardwareSensors<I2C, L, BTN, WORN>
where
    I2C: I2c,
    L: ByteLink,
    BTN: InputPin,
    WORN: InputPin,
{
    fn read_motion(&mut self) -> Result<MotionSample, SensorError> {
        self.imu.read(&mut self.i2c)
    }

    fn read_vitals(&mut self) -> Result<u16, SensorError> {
        self.pulse.read(&mut self.i2c)
    }

    fn read_location(&mut self) -> Result<LocationSample, SensorError> {
        self.gps.location()
    }

    fn read_command(&mut self) -> Option<CommandToken> {
        self.commands.take()
    }

    fn button_pressed(&mut self) -> bool {
        match self.button.sample() {
            Ok(pressed) => {
                self.button_fault = false;
                pressed
            }
            Err(_) => {
                if !self.button_fault {
                    warn!("SOS button read failed");
                    self.button_fault = true;
                }
                false
            }
        }
    }

    fn read_worn(&mut self) -> Result<bool, SensorError> {
        self.worn.sample()
    }

    fn poll(&mut self) -> Result<(), SensorError> {
        self.gps.poll()
    }
}

/// Engine relay plus status LED.
pub struct HelmetOutputs<ENG, LED> {
    engine: EngineRelay<ENG>,
    led: StatusLed<LED>,
}

impl<ENG: OutputPin, LED: OutputPin> HelmetOutputs<ENG, LED> {
    pub fn new(engine: EngineRelay<ENG>, led: StatusLed<LED>) -> Self {
        Self { engine, led }
    }

    pub fn engine(&self) -> &EngineRelay<ENG> {
        &self.engine
    }

    pub fn led(&self) -> &StatusLed<LED> {
        &self.led
    }
}

impl<ENG: OutputPin, LED: OutputPin> ActuatorPort for HelmetOutputs<ENG, LED> {
    fn set_engine_enabled(&mut self, enabled: bool) {
        self.engine.set(enabled);
    }
}

impl<ENG: OutputPin, LED: OutputPin> IndicatorPort for HelmetOutputs<ENG, LED> {
    fn toggle(&mut self) {
        self.led.toggle();
    }

    fn set_degraded(&mut self, degraded: bool) {
        self.led.set_degraded(degraded);
    }
}

impl<ENG: OutputPin, LED: OutputPin> PromptPort for HelmetOutputs<ENG, LED> {
    fn play(&mut self, prompt: Prompt) {
        info!("PROMPT | {}", prompt.text());
    }
}
