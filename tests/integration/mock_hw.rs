//! Mock adapters for integration tests.
//!
//! Each mock records what the control loop asked of it so tests can
//! assert on the full history without touching GPIO or UART.

use std::cell::Cell;
use std::rc::Rc;

use safex::alerts::{AlertKind, StructuredMessage};
use safex::app::events::AppEvent;
use safex::app::ports::{
    ActuatorPort, Clock, EventSink, IndicatorPort, Prompt, PromptPort, TransportPort,
};
use safex::config::SystemConfig;
use safex::error::TransportError;
use safex::scheduler::{Scheduler, StopReason, StopSignal};
use safex::sensors::simulated::SimulatedSensors;

// ── Outputs ───────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputCall {
    Engine(bool),
    Toggle,
    Degraded(bool),
    Prompt(Prompt),
}

#[derive(Debug, Default)]
pub struct MockOutputs {
    pub calls: Vec<OutputCall>,
}

#[allow(dead_code)]
impl MockOutputs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last commanded engine state; `false` if never commanded.
    pub fn engine_on(&self) -> bool {
        self.calls
            .iter()
            .rev()
            .find_map(|c| match c {
                OutputCall::Engine(on) => Some(*on),
                _ => None,
            })
            .unwrap_or(false)
    }

    pub fn prompts(&self) -> Vec<Prompt> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                OutputCall::Prompt(p) => Some(*p),
                _ => None,
            })
            .collect()
    }

    pub fn toggles(&self) -> usize {
        self.calls
            .iter()
            .filter(|c| matches!(c, OutputCall::Toggle))
            .count()
    }
}

impl ActuatorPort for MockOutputs {
    fn set_engine_enabled(&mut self, enabled: bool) {
        self.calls.push(OutputCall::Engine(enabled));
    }
}

impl IndicatorPort for MockOutputs {
    fn toggle(&mut self) {
        self.calls.push(OutputCall::Toggle);
    }

    fn set_degraded(&mut self, degraded: bool) {
        self.calls.push(OutputCall::Degraded(degraded));
    }
}

impl PromptPort for MockOutputs {
    fn play(&mut self, prompt: Prompt) {
        self.calls.push(OutputCall::Prompt(prompt));
    }
}

// ── Transport ─────────────────────────────────────────────────

/// Keeps every accepted message; fails while `failure` is set.
#[derive(Debug, Default)]
pub struct RecordingTransport {
    pub sent: Vec<StructuredMessage>,
    pub failure: Option<TransportError>,
    pub attempts: usize,
}

#[allow(dead_code)]
impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self, kind: AlertKind) -> usize {
        self.sent.iter().filter(|m| m.kind() == kind).count()
    }

    pub fn json(&self) -> Vec<String> {
        self.sent
            .iter()
            .map(|m| m.to_json().expect("encodable"))
            .collect()
    }
}

impl TransportPort for RecordingTransport {
    fn send(&mut self, message: &StructuredMessage) -> Result<(), TransportError> {
        self.attempts += 1;
        if let Some(e) = self.failure {
            return Err(e);
        }
        self.sent.push(*message);
        Ok(())
    }
}

// ── Event sink ────────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct RecordingSink {
    pub events: Vec<AppEvent>,
}

#[allow(dead_code)]
impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, event: &AppEvent) -> bool {
        self.events.contains(event)
    }

    pub fn count(&self, pred: impl Fn(&AppEvent) -> bool) -> usize {
        self.events.iter().filter(|e| pred(e)).count()
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &AppEvent) {
        self.events.push(*event);
    }
}

// ── Clock ─────────────────────────────────────────────────────

/// Virtual time.  `sleep_ms` advances the clock; an optional stop signal
/// is raised once time reaches the configured instant.
pub struct ManualClock {
    now: Rc<Cell<u64>>,
    stop: Option<(&'static StopSignal, u64, StopReason)>,
    pub sleeps: Vec<u64>,
}

#[allow(dead_code)]
impl ManualClock {
    pub fn new(start_ms: u64) -> Self {
        Self {
            now: Rc::new(Cell::new(start_ms)),
            stop: None,
            sleeps: Vec::new(),
        }
    }

    pub fn stop_at(mut self, signal: &'static StopSignal, at_ms: u64, reason: StopReason) -> Self {
        self.stop = Some((signal, at_ms, reason));
        self
    }

    /// Shared handle to the current time, for moving it from inside a
    /// tick callback (simulates a slow tick).
    pub fn handle(&self) -> Rc<Cell<u64>> {
        Rc::clone(&self.now)
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> u64 {
        self.now.get()
    }

    fn sleep_ms(&mut self, ms: u64) {
        self.sleeps.push(ms);
        self.now.set(self.now.get() + ms);
        if let Some((signal, at, reason)) = self.stop {
            if self.now.get() >= at {
                signal.signal(reason);
            }
        }
    }
}

// ── Fixture ───────────────────────────────────────────────────

pub type TestScheduler = Scheduler<SimulatedSensors, RecordingTransport, MockOutputs, RecordingSink>;

/// Scheduler over simulated sensors with the given config.
pub fn scheduler(config: &SystemConfig, sensors: SimulatedSensors) -> TestScheduler {
    Scheduler::new(
        config,
        sensors,
        RecordingTransport::new(),
        MockOutputs::new(),
        RecordingSink::new(),
    )
    .expect("valid config")
}

/// Run `n` ticks at `period_ms` spacing starting at `start_ms`.
#[allow(dead_code)]
pub fn run_ticks(s: &mut TestScheduler, start_ms: u64, period_ms: u64, n: u64) {
    for i in 0..n {
        s.tick(start_ms + i * period_ms);
    }
}
