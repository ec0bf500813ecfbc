//! Hardware adapter tests against fake `embedded-hal` peripherals.
//!
//! A register-level fake I²C bus stands in for the MPU-6050 and the
//! MAX30102; pins and byte links share their state through `Rc` so a test
//! can keep poking them after the adapter has taken ownership.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::convert::Infallible;
use std::rc::Rc;

use embedded_hal::digital::{ErrorType as PinErrorType, InputPin, OutputPin};
use embedded_hal::i2c::{self, ErrorKind, I2c, NoAcknowledgeSource, Operation};

use safex::adapters::hardware::{HardwareSensors, HelmetOutputs};
use safex::adapters::serial_transport::JsonLineTransport;
use safex::app::commands::CommandToken;
use safex::app::ports::{ActuatorPort, IndicatorPort, SensorPort};
use safex::config::SystemConfig;
use safex::drivers::engine::EngineRelay;
use safex::drivers::status_led::StatusLed;
use safex::error::SensorError;
use safex::link::ByteLink;
use safex::scheduler::Scheduler;
use safex::sensors::gps::MAX_BYTES_PER_POLL;
use safex::sensors::sample::STANDARD_GRAVITY;
use safex::sensors::voice::CommandMailbox;

use crate::mock_hw::RecordingSink;

const IMU: u8 = 0x68;
const PULSE: u8 = 0x57;

// ── Fake I²C bus ──────────────────────────────────────────────

#[derive(Debug)]
struct BusFault(ErrorKind);

impl i2c::Error for BusFault {
    fn kind(&self) -> ErrorKind {
        self.0
    }
}

#[derive(Default)]
struct BusState {
    imu_present: bool,
    pulse_present: bool,
    fault: Option<ErrorKind>,
    /// 14-byte burst returned from ACCEL_XOUT_H.
    imu_raw: [u8; 14],
    /// IR samples waiting in the pulse sensor FIFO.
    fifo: VecDeque<u32>,
    writes: Vec<(u8, Vec<u8>)>,
}

#[derive(Clone, Default)]
struct FakeBus(Rc<RefCell<BusState>>);

impl FakeBus {
    fn healthy() -> Self {
        let bus = Self::default();
        {
            let mut s = bus.0.borrow_mut();
            s.imu_present = true;
            s.pulse_present = true;
        }
        bus
    }

    fn set_accel_z_raw(&self, raw: i16) {
        self.0.borrow_mut().imu_raw[4..6].copy_from_slice(&raw.to_be_bytes());
    }

    fn push_ir(&self, samples: impl IntoIterator<Item = u32>) {
        self.0.borrow_mut().fifo.extend(samples);
    }

    fn respond(state: &mut BusState, addr: u8, reg: u8, buf: &mut [u8]) {
        match (addr, reg) {
            (IMU, 0x75) => buf[0] = 0x68,
            (IMU, 0x3B) => buf.copy_from_slice(&state.imu_raw[..buf.len()]),
            (PULSE, 0xFF) => buf[0] = 0x15,
            // write pointer: entries pending (FIFO holds at most 31 unread)
            (PULSE, 0x04) => buf[0] = state.fifo.len().min(31) as u8,
            (PULSE, 0x06) => buf[0] = 0,
            (PULSE, 0x07) => {
                for entry in buf.chunks_exact_mut(6) {
                    let ir = state.fifo.pop_front().unwrap_or(0);
                    entry[..3].fill(0);
                    entry[3] = (ir >> 16) as u8;
                    entry[4] = (ir >> 8) as u8;
                    entry[5] = ir as u8;
                }
            }
            _ => buf.fill(0),
        }
    }
}

impl i2c::ErrorType for FakeBus {
    type Error = BusFault;
}

impl I2c for FakeBus {
    fn transaction(
        &mut self,
        address: u8,
        operations: &mut [Operation<'_>],
    ) -> Result<(), BusFault> {
        let mut state = self.0.borrow_mut();
        if let Some(kind) = state.fault {
            return Err(BusFault(kind));
        }
        let present = match address {
            IMU => state.imu_present,
            PULSE => state.pulse_present,
            _ => false,
        };
        if !present {
            return Err(BusFault(ErrorKind::NoAcknowledge(
                NoAcknowledgeSource::Address,
            )));
        }
        let mut reg = 0;
        for op in operations {
            match op {
                Operation::Write(bytes) => {
                    reg = bytes[0];
                    state.writes.push((address, bytes.to_vec()));
                }
                Operation::Read(buf) => Self::respond(&mut state, address, reg, buf),
            }
        }
        Ok(())
    }
}

// ── Fake pins ─────────────────────────────────────────────────

/// Input pin whose electrical level is shared with the test.
#[derive(Clone)]
struct FakeInput(Rc<Cell<bool>>);

impl FakeInput {
    /// Pulled up: open switch reads high.
    fn open() -> Self {
        Self(Rc::new(Cell::new(true)))
    }

    fn close(&self) {
        self.0.set(false);
    }

    fn release(&self) {
        self.0.set(true);
    }
}

impl PinErrorType for FakeInput {
    type Error = Infallible;
}

impl InputPin for FakeInput {
    fn is_high(&mut self) -> Result<bool, Infallible> {
        Ok(self.0.get())
    }

    fn is_low(&mut self) -> Result<bool, Infallible> {
        Ok(!self.0.get())
    }
}

#[derive(Clone, Default)]
struct FakeOutput(Rc<Cell<bool>>);

impl FakeOutput {
    fn is_high(&self) -> bool {
        self.0.get()
    }
}

impl PinErrorType for FakeOutput {
    type Error = Infallible;
}

impl OutputPin for FakeOutput {
    fn set_low(&mut self) -> Result<(), Infallible> {
        self.0.set(false);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Infallible> {
        self.0.set(true);
        Ok(())
    }
}

// ── Fake byte link ────────────────────────────────────────────

#[derive(Clone, Default)]
struct FakeLink {
    rx: Rc<RefCell<VecDeque<u8>>>,
    tx: Rc<RefCell<Vec<u8>>>,
}

impl FakeLink {
    fn inject(&self, text: &str) {
        self.rx.borrow_mut().extend(text.bytes());
    }

    fn written(&self) -> String {
        String::from_utf8(self.tx.borrow().clone()).expect("utf-8")
    }
}

impl ByteLink for FakeLink {
    type Error = Infallible;

    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Infallible> {
        let mut rx = self.rx.borrow_mut();
        let n = buf.len().min(rx.len());
        for (slot, byte) in buf.iter_mut().zip(rx.drain(..n)) {
            *slot = byte;
        }
        Ok(n)
    }

    fn write(&mut self, data: &[u8]) -> Result<usize, Infallible> {
        self.tx.borrow_mut().extend_from_slice(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> Result<(), Infallible> {
        Ok(())
    }

    fn available(&self) -> bool {
        !self.rx.borrow().is_empty()
    }
}

// ── Fixture ───────────────────────────────────────────────────

struct Rig {
    bus: FakeBus,
    gps: FakeLink,
    button: FakeInput,
    worn: FakeInput,
}

impl Rig {
    fn new() -> Self {
        Self {
            bus: FakeBus::healthy(),
            gps: FakeLink::default(),
            button: FakeInput::open(),
            worn: FakeInput::open(),
        }
    }

    fn sensors(
        &self,
        commands: &'static CommandMailbox,
    ) -> HardwareSensors<FakeBus, FakeLink, FakeInput, FakeInput> {
        HardwareSensors::new(
            self.bus.clone(),
            self.gps.clone(),
            self.button.clone(),
            self.worn.clone(),
            commands,
        )
    }
}

/// Wrap an NMEA body as a checksummed sentence line.
fn nmea(body: &str) -> String {
    let cs = body.bytes().fold(0u8, |acc, b| acc ^ b);
    format!("${body}*{cs:02X}\r\n")
}

/// Helmet scheduler over the rig's sensors, returning the engine pin.
fn helmet(
    rig: &Rig,
    commands: &'static CommandMailbox,
    phone: FakeLink,
) -> (
    Scheduler<
        HardwareSensors<FakeBus, FakeLink, FakeInput, FakeInput>,
        JsonLineTransport<FakeLink>,
        HelmetOutputs<FakeOutput, FakeOutput>,
        RecordingSink,
    >,
    FakeOutput,
) {
    let engine = FakeOutput::default();
    let s = Scheduler::new(
        &SystemConfig::default(),
        rig.sensors(commands),
        JsonLineTransport::new(phone),
        HelmetOutputs::new(EngineRelay::new(engine.clone()), StatusLed::new(FakeOutput::default())),
        RecordingSink::new(),
    )
    .expect("valid config");
    (s, engine)
}

/// Synthetic PPG: 100 sps, DC offset plus a sine at `bpm`.
fn ppg(bpm: f32, n: usize) -> impl Iterator<Item = u32> {
    let hz = bpm / 60.0;
    (0..n).map(move |i| {
        let t = i as f32 / 100.0;
        (100_000.0 + 2_000.0 * (2.0 * std::f32::consts::PI * hz * t).sin()) as u32
    })
}

// ── Sensors ───────────────────────────────────────────────────

#[test]
fn init_configures_both_i2c_sensors() {
    static COMMANDS: CommandMailbox = CommandMailbox::new();
    let rig = Rig::new();
    let mut sensors = rig.sensors(&COMMANDS);
    assert_eq!(sensors.init(), Ok(()));

    let bus = rig.bus.0.borrow();
    let writes = &bus.writes;
    // MPU-6050 woken from sleep
    assert!(writes.contains(&(IMU, vec![0x6B, 0x00])));
    // MAX30102 left in SpO2 mode
    assert_eq!(
        writes.iter().rev().find(|(a, b)| *a == PULSE && b[0] == 0x09),
        Some(&(PULSE, vec![0x09, 0x03]))
    );
}

#[test]
fn imu_reading_is_normalised_to_si_units() {
    static COMMANDS: CommandMailbox = CommandMailbox::new();
    let rig = Rig::new();
    rig.bus.set_accel_z_raw(-16_384);
    let mut sensors = rig.sensors(&COMMANDS);

    let m = sensors.read_motion().expect("motion");
    assert!((m.acc_z + STANDARD_GRAVITY).abs() < 1e-3);
    assert_eq!(m.gyro_x, 0.0);
}

#[test]
fn missing_imu_is_a_timeout_and_bus_fault_is_bus() {
    static COMMANDS: CommandMailbox = CommandMailbox::new();
    let rig = Rig::new();
    rig.bus.0.borrow_mut().imu_present = false;
    let mut sensors = rig.sensors(&COMMANDS);

    assert_eq!(sensors.init(), Err(SensorError::Timeout));
    assert_eq!(sensors.read_motion(), Err(SensorError::Timeout));

    rig.bus.0.borrow_mut().fault = Some(ErrorKind::Bus);
    assert_eq!(sensors.read_vitals(), Err(SensorError::Bus));
}

#[test]
fn pulse_sensor_estimates_rate_from_fifo() {
    static COMMANDS: CommandMailbox = CommandMailbox::new();
    let rig = Rig::new();
    let mut sensors = rig.sensors(&COMMANDS);
    assert_eq!(sensors.read_vitals(), Err(SensorError::NotReady));

    rig.bus.push_ir(ppg(72.0, 1_000));
    let mut last = Err(SensorError::NotReady);
    for _ in 0..40 {
        last = sensors.read_vitals();
    }
    let bpm = last.expect("estimate after 10 s of signal");
    assert!((70..=74).contains(&bpm), "got {bpm}");
}

#[test]
fn gps_fix_comes_from_nmea_stream() {
    static COMMANDS: CommandMailbox = CommandMailbox::new();
    let rig = Rig::new();
    let mut sensors = rig.sensors(&COMMANDS);
    assert_eq!(sensors.read_location(), Err(SensorError::NotReady));

    rig.gps.inject(
        "$GPRMC,123519,A,4807.038,N,01131.000,E,022.4,084.4,230394,003.1,W*6A\r\n",
    );
    let fix = sensors.read_location().expect("fix");
    assert!((fix.lat - 48.1173).abs() < 1e-4);
    assert!((fix.lon - 11.516_666).abs() < 1e-4);

    // no new bytes: the last fix is kept
    assert_eq!(sensors.read_location(), Ok(fix));
}

#[test]
fn gps_backlog_is_drained_each_tick_so_refresh_sees_newest_fix() {
    static COMMANDS: CommandMailbox = CommandMailbox::new();
    let rig = Rig::new();
    let (mut s, _engine) = helmet(&rig, &COMMANDS, FakeLink::default());
    s.start(0);
    assert_eq!(s.location(), None);

    // well over one poll's worth of older sentences, then the newest fix
    let old = nmea("GPRMC,123519,A,4807.038,N,01131.000,E,022.4,084.4,230394,003.1,W");
    let backlog = old.repeat(12);
    assert!(backlog.len() > MAX_BYTES_PER_POLL);
    rig.gps.inject(&backlog);
    rig.gps.inject(&nmea(
        "GPRMC,123529,A,4807.538,N,01131.500,E,022.4,084.4,230394,003.1,W",
    ));

    s.tick(100);
    s.tick(200);
    assert!(!rig.gps.available(), "UART drained between refreshes");

    for i in 3..=100 {
        s.tick(i * 100);
    }
    let fix = s.location().expect("refreshed at 10 s");
    assert!((fix.lat - 48.125_633).abs() < 1e-4);
    assert!((fix.lon - 11.525).abs() < 1e-4);
}

#[test]
fn switches_are_debounced_and_active_low() {
    static COMMANDS: CommandMailbox = CommandMailbox::new();
    let rig = Rig::new();
    let mut sensors = rig.sensors(&COMMANDS);
    assert!(!sensors.button_pressed());
    assert_eq!(sensors.read_worn(), Ok(false));

    rig.button.close();
    rig.worn.close();
    assert!(!sensors.button_pressed(), "one sample is not enough");
    assert_eq!(sensors.read_worn(), Ok(false));
    assert!(sensors.button_pressed());
    assert_eq!(sensors.read_worn(), Ok(true));
}

#[test]
fn recogniser_results_arrive_through_mailbox() {
    static COMMANDS: CommandMailbox = CommandMailbox::new();
    let rig = Rig::new();
    let mut sensors = rig.sensors(&COMMANDS);
    assert_eq!(sensors.read_command(), None);
    COMMANDS.post_text("navigation");
    assert_eq!(sensors.read_command(), Some(CommandToken::Navigation));
    assert_eq!(sensors.read_command(), None);
}

#[test]
fn worn_switch_opening_is_immediate() {
    static COMMANDS: CommandMailbox = CommandMailbox::new();
    let rig = Rig::new();
    let mut sensors = rig.sensors(&COMMANDS);
    rig.worn.close();
    assert_eq!(sensors.read_worn(), Ok(false));
    assert_eq!(sensors.read_worn(), Ok(true));
    rig.worn.release();
    assert_eq!(sensors.read_worn(), Ok(false));
}

// ── Outputs ───────────────────────────────────────────────────

#[test]
fn outputs_drive_relay_and_led() {
    let engine = FakeOutput::default();
    let led = FakeOutput::default();
    let mut out = HelmetOutputs::new(EngineRelay::new(engine.clone()), StatusLed::new(led.clone()));
    assert!(!engine.is_high(), "relay starts open");

    out.set_engine_enabled(true);
    assert!(engine.is_high());
    assert!(out.engine().is_enabled());

    let before = led.is_high();
    out.toggle();
    assert_ne!(led.is_high(), before);

    out.set_degraded(true);
    assert!(led.is_high());
    out.toggle();
    assert!(led.is_high(), "degraded pattern is solid on");
}

// ── End to end ────────────────────────────────────────────────

#[test]
fn worn_helmet_enables_engine_and_sos_reaches_phone() {
    static COMMANDS: CommandMailbox = CommandMailbox::new();
    let rig = Rig::new();
    rig.gps.inject("$GPGGA,123519,4807.038,N,01131.000,E,1,08,0.9,545.4,M,46.9,M,,*47\r\n");
    let phone = FakeLink::default();
    let (mut s, engine) = helmet(&rig, &COMMANDS, phone.clone());

    rig.worn.close();
    s.tick(0);
    assert!(!engine.is_high(), "worn switch still debouncing");
    s.tick(100);
    assert!(engine.is_high());

    COMMANDS.post(CommandToken::Sos);
    s.tick(200);
    let written = phone.written();
    let line = written
        .lines()
        .find(|l| l.contains(r#""alert":"sos""#))
        .expect("sos line on the phone link");
    let v: serde_json::Value = serde_json::from_str(line).expect("json");
    let lat = v["location"]["lat"].as_f64().expect("lat");
    let lon = v["location"]["lon"].as_f64().expect("lon");
    assert!((lat - 48.1173).abs() < 1e-4);
    assert!((lon - 11.516_666).abs() < 1e-4);
}

#[test]
fn taking_helmet_off_disables_engine_on_next_tick() {
    static COMMANDS: CommandMailbox = CommandMailbox::new();
    let rig = Rig::new();
    let (mut s, engine) = helmet(&rig, &COMMANDS, FakeLink::default());

    rig.worn.close();
    s.tick(0);
    s.tick(100);
    assert!(engine.is_high());

    rig.worn.release();
    s.tick(200);
    assert!(!engine.is_high());
}
