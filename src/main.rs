//! SafeX firmware entry point.
//!
//! Hexagonal architecture around one fixed-cadence control loop.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  HardwareSensors   HelmetOutputs      JsonLineTransport        │
//! │  (SensorPort)      (Actuator/Indic.)  (TransportPort, BT UART) │
//! │  LogEventSink      NvsAdapter         Esp32TimeAdapter         │
//! │  (EventSink)       (ConfigPort)       (Clock)                  │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │              Scheduler (pure logic)                    │    │
//! │  │  Fall · Vitals · SOS · Commands · Alerts · Interlock   │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! │                                                                │
//! │  Task watchdog fed once per tick                               │
//! └────────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use anyhow::{Result, anyhow};
use log::{info, warn};

use esp_idf_hal::gpio::{AnyIOPin, PinDriver, Pull};
use esp_idf_hal::i2c::{I2cConfig, I2cDriver};
use esp_idf_hal::peripherals::Peripherals;
use esp_idf_hal::uart::{UartDriver, config::Config as UartConfig};
use esp_idf_hal::units::Hertz;

use safex::adapters::hardware::{HardwareSensors, HelmetOutputs};
use safex::adapters::log_sink::LogEventSink;
use safex::adapters::nvs::NvsAdapter;
use safex::adapters::serial_transport::JsonLineTransport;
use safex::adapters::time::Esp32TimeAdapter;
use safex::app::ports::{ConfigError, ConfigPort};
use safex::config::{SensorBackendKind, SystemConfig};
use safex::drivers::engine::EngineRelay;
use safex::drivers::status_led::StatusLed;
use safex::drivers::watchdog::{Watchdog, timeout_for_tick};
use safex::link::UartLink;
use safex::pins;
use safex::scheduler::{Scheduler, StopSignal};
use safex::sensors::SensorBackend;
use safex::sensors::simulated::SimulatedSensors;
use safex::sensors::voice::CommandMailbox;

/// Voice recogniser → control loop hand-off.
static COMMANDS: CommandMailbox = CommandMailbox::new();

/// Raised by the brown-out / power-button path to stop the loop.
static STOP: StopSignal = StopSignal::new();

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  SafeX helmet v{}                    ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    // ── 2. Load config from NVS (or defaults) ─────────────────
    let config = match NvsAdapter::new().and_then(|nvs| nvs.load()) {
        Ok(cfg) => cfg,
        Err(ConfigError::ValidationFailed(field)) => {
            return Err(anyhow!("configuration invalid: {field}"));
        }
        Err(e) => {
            warn!("NVS config unavailable ({}), using defaults", e);
            SystemConfig::default()
        }
    };

    // ── 3. Peripherals ────────────────────────────────────────
    let p = Peripherals::take()?;

    let i2c = I2cDriver::new(
        p.i2c0,
        p.pins.gpio8,
        p.pins.gpio9,
        &I2cConfig::new().baudrate(Hertz(pins::I2C_BAUD_HZ)),
    )?;

    let gps_uart = UartDriver::new(
        p.uart1,
        p.pins.gpio17,
        p.pins.gpio18,
        Option::<AnyIOPin>::None,
        Option::<AnyIOPin>::None,
        &UartConfig::default().baudrate(Hertz(pins::GPS_BAUD)),
    )?;

    let bt_uart = UartDriver::new(
        p.uart2,
        p.pins.gpio4,
        p.pins.gpio5,
        Option::<AnyIOPin>::None,
        Option::<AnyIOPin>::None,
        &UartConfig::default().baudrate(Hertz(pins::BT_BAUD)),
    )?;

    let bt_state = PinDriver::input(p.pins.gpio6)?;

    let mut button = PinDriver::input(p.pins.gpio10)?;
    button.set_pull(Pull::Up)?;
    let mut worn = PinDriver::input(p.pins.gpio11)?;
    worn.set_pull(Pull::Up)?;

    let engine = EngineRelay::new(PinDriver::output(p.pins.gpio12)?);
    let led = StatusLed::new(PinDriver::output(p.pins.gpio13)?);

    // ── 4. Adapters ───────────────────────────────────────────
    let mut hardware = HardwareSensors::new(i2c, UartLink::new(gps_uart), button, worn, &COMMANDS);
    let sensors = match config.sensor_backend {
        SensorBackendKind::Hardware => {
            if let Err(e) = hardware.init() {
                warn!("Sensor init incomplete ({}); continuing degraded", e);
            }
            SensorBackend::Hardware(hardware)
        }
        SensorBackendKind::Simulated => {
            info!("Sensor backend: simulated");
            SensorBackend::Simulated(SimulatedSensors::new())
        }
    };
    let transport = JsonLineTransport::with_status(UartLink::new(bt_uart), bt_state);
    let outputs = HelmetOutputs::new(engine, led);

    // ── 5. Control loop ───────────────────────────────────────
    let mut scheduler = Scheduler::new(&config, sensors, transport, outputs, LogEventSink::new())
        .map_err(|e| anyhow!("scheduler setup failed: {e}"))?;

    let watchdog = Watchdog::new(timeout_for_tick(config.tick_period_ms));
    let mut clock = Esp32TimeAdapter::new();

    info!("System ready. Entering control loop.");
    let reason = scheduler.run_with(&mut clock, &STOP, |_| watchdog.feed());
    info!("Control loop exited: {:?}", reason);
    Ok(())
}
