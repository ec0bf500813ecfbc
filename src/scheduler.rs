//! The control loop.
//!
//! One sequential loop at a fixed cadence.  Each tick runs, in order:
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │  1. SensorHub ─▶ motion · vitals · command · button · worn   │
//! │  2. FallModel · VitalsMonitor      (absent input = skipped)  │
//! │  3. Fall            ─▶ AlertDispatcher ─┐                    │
//! │  4. AbnormalHeartRate ─▶      "         │                    │
//! │  5. SOS (button edge / voice) ─▶  "     ├─▶ Outbox (≤ 8)     │
//! │  6. CommandRouter ─▶ VoiceCommand ─▶ "  │                    │
//! │  7. location cadence ─▶ cache refresh   │                    │
//! │  8. telemetry cadence ─▶ Telemetry ─────┘                    │
//! │  9. EngineInterlock ◀─ HelmetState                           │
//! │ 10. indicator toggle / degraded                              │
//! │ 11. Outbox ─▶ TransportPort  (≤ max_sends_per_tick)          │
//! │ 12. sleep to the next boundary                               │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! Cadences compare elapsed time (`now - last >= interval`, then
//! `last = now`), never tick counts.  Tick boundaries are laid out from
//! the loop start; an overrun skips to the next boundary instead of
//! bursting to catch up.

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;
use log::{info, warn};

use crate::alerts::{
    AlertDispatcher, AlertEvent, AlertKind, AlertLedger, DrainReport, Outbox, TelemetryData,
};
use crate::app::commands::{Action, CommandRouter, CommandToken};
use crate::app::events::AppEvent;
use crate::app::ports::{
    ActuatorPort, Clock, EventSink, IndicatorPort, Prompt, PromptPort, SensorPort, TransportPort,
};
use crate::config::SystemConfig;
use crate::detect::{FallDetector, FallModel, VitalsMonitor};
use crate::error::Result;
use crate::safety::{EngineInterlock, HelmetState};
use crate::sensors::SensorHub;
use crate::sensors::sample::LocationSample;

/// Why the loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// Operator or supervisor asked for a stop.
    Requested,
    /// Supply is going away; finish quickly.
    PowerDown,
}

/// Cooperative stop flag, settable from any context.
pub type StopSignal = Signal<CriticalSectionRawMutex, StopReason>;

/// What happened during one tick.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TickReport {
    pub fall: bool,
    pub abnormal_heart_rate: bool,
    pub sos: bool,
    pub command: Option<Action>,
    pub location_refreshed: bool,
    pub telemetry: bool,
    pub engine_enabled: bool,
    pub degraded: bool,
    pub drained: DrainReport,
}

/// Timing and edge state owned by the loop.
#[derive(Debug, Clone, Default)]
struct ScheduleState {
    last_location_ms: u64,
    last_telemetry_ms: u64,
    ledger: AlertLedger,
    button_was_pressed: bool,
    location: Option<LocationSample>,
}

pub struct Scheduler<S, T, O, E> {
    hub: SensorHub<S>,
    transport: T,
    outputs: O,
    sink: E,

    fall: FallModel,
    vitals: VitalsMonitor,
    router: CommandRouter,
    dispatcher: AlertDispatcher,
    outbox: Outbox,
    interlock: EngineInterlock,

    helmet: HelmetState,
    schedule: ScheduleState,

    tick_period_ms: u64,
    location_interval_ms: u64,
    telemetry_interval_ms: u64,
    max_sends: usize,
    escalation_count: u32,
    transport_failures: u32,
    degraded: bool,
    started: bool,
    ticks: u64,
}

impl<S, T, O, E> Scheduler<S, T, O, E>
where
    S: SensorPort,
    T: TransportPort,
    O: ActuatorPort + IndicatorPort + PromptPort,
    E: EventSink,
{
    /// Build the loop from a validated configuration.
    pub fn new(
        config: &SystemConfig,
        sensors: S,
        transport: T,
        outputs: O,
        sink: E,
    ) -> Result<Self> {
        config.validate()?;
        let detector = FallDetector::new(config.fall_threshold, config.fall_magnitude);
        Ok(Self {
            hub: SensorHub::new(sensors, config.failure_escalation_count),
            transport,
            outputs,
            sink,
            fall: FallModel::from_kind(config.fall_model, detector),
            vitals: VitalsMonitor::new(config.heart_rate_bounds),
            router: CommandRouter::new(),
            dispatcher: AlertDispatcher::new(&config.alert_cooldown_secs),
            outbox: Outbox::new(),
            interlock: EngineInterlock::new(),
            helmet: HelmetState::new(),
            schedule: ScheduleState::default(),
            tick_period_ms: u64::from(config.tick_period_ms),
            location_interval_ms: config.location_interval_ms(),
            telemetry_interval_ms: config.telemetry_interval_ms(),
            max_sends: usize::from(config.max_sends_per_tick),
            escalation_count: config.failure_escalation_count,
            transport_failures: 0,
            degraded: false,
            started: false,
            ticks: 0,
        })
    }

    /// Replace the fall classifier (e.g. with an offline-trained one).
    pub fn with_fall_model(mut self, model: FallModel) -> Self {
        self.fall = model;
        self
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Anchor the cadences at `now_ms`, seed the location cache and put
    /// the engine in its initial (disabled) state.
    pub fn start(&mut self, now_ms: u64) {
        self.schedule.last_location_ms = now_ms;
        self.schedule.last_telemetry_ms = now_ms;
        self.schedule.location = self.hub.read_location(&mut self.sink);
        self.interlock
            .drive(&self.helmet, &mut self.outputs, &mut self.sink);
        self.started = true;
        self.sink.emit(&AppEvent::Started);
        info!(
            "Scheduler started: tick={}ms location={}ms telemetry={}ms",
            self.tick_period_ms, self.location_interval_ms, self.telemetry_interval_ms
        );
    }

    /// Flush pending messages and force the engine off.
    pub fn shutdown(&mut self, reason: StopReason) {
        let flushed = self.outbox.flush(&mut self.transport, &mut self.sink);
        self.interlock.safe_shutdown(&mut self.outputs, &mut self.sink);
        self.sink.emit(&AppEvent::Stopped);
        info!(
            "Scheduler stopped ({:?}) after {} ticks; flushed {} sent / {} failed",
            reason, self.ticks, flushed.sent, flushed.failed
        );
    }

    /// Run until `stop` is signalled.  `on_tick` sees every report (the
    /// device build feeds its watchdog there).
    ///
    /// The loop start anchors the cadences; tick `k` runs at
    /// `origin + k * period`, so with a 100 ms tick and a 1 s telemetry
    /// interval telemetry goes out on ticks 10, 20, 30, …
    pub fn run_with(
        &mut self,
        clock: &mut impl Clock,
        stop: &StopSignal,
        mut on_tick: impl FnMut(&TickReport),
    ) -> StopReason {
        let origin = clock.now_ms();
        self.start(origin);
        let period = self.tick_period_ms;
        let mut next = origin;

        loop {
            next += period;
            let now = clock.now_ms();
            if now > next {
                let missed = (now - next).div_ceil(period);
                warn!(
                    "Tick overran by {} ms; skipping {} boundaries",
                    now - next,
                    missed
                );
                next += missed * period;
            }
            clock.sleep_ms(next - now);

            if let Some(reason) = stop.try_take() {
                self.shutdown(reason);
                return reason;
            }

            let report = self.tick(clock.now_ms());
            on_tick(&report);
        }
    }

    pub fn run(&mut self, clock: &mut impl Clock, stop: &StopSignal) -> StopReason {
        self.run_with(clock, stop, |_| {})
    }

    // ── Per-tick orchestration ────────────────────────────────

    /// Run one full control cycle.
    pub fn tick(&mut self, now_ms: u64) -> TickReport {
        if !self.started {
            self.start(now_ms);
        }
        self.ticks += 1;
        let mut report = TickReport::default();

        // 1. Acquire
        let snap = self.hub.read_snapshot(&mut self.sink);
        self.helmet.update(snap.worn);

        // 2–3. Fall
        if let Some(motion) = snap.motion {
            if self.fall.evaluate(&motion) {
                report.fall = true;
                let location = self.alert_location();
                if self.dispatch(AlertEvent::Fall(location), now_ms) {
                    self.outputs.play(Prompt::FallCheck);
                }
            } else {
                self.schedule.ledger.observe_inactive(AlertKind::Fall);
            }
        }

        // 4. Vitals
        if let Some(rate) = snap.heart_rate {
            if self.vitals.check(rate) {
                report.abnormal_heart_rate = true;
                self.dispatch(AlertEvent::AbnormalHeartRate(rate), now_ms);
            } else {
                self.schedule.ledger.observe_inactive(AlertKind::HeartRate);
            }
        }

        // 5. SOS
        let button_edge = snap.button && !self.schedule.button_was_pressed;
        self.schedule.button_was_pressed = snap.button;
        if button_edge || snap.command == Some(CommandToken::Sos) {
            report.sos = true;
            let location = self.alert_location();
            if self.dispatch(AlertEvent::Sos(location), now_ms) {
                self.outputs.play(Prompt::SosSent);
            }
        }

        // 6. Voice command
        if let Some(action) = snap.command.and_then(|t| self.router.route(t)) {
            report.command = Some(action);
            self.dispatch(AlertEvent::VoiceCommand(action), now_ms);
        }

        // 7. Location cadence
        if now_ms.saturating_sub(self.schedule.last_location_ms) >= self.location_interval_ms {
            self.schedule.last_location_ms = now_ms;
            if let Some(fix) = self.hub.read_location(&mut self.sink) {
                self.schedule.location = Some(fix);
                report.location_refreshed = true;
                self.sink.emit(&AppEvent::LocationRefreshed {
                    lat: fix.lat,
                    lon: fix.lon,
                });
            }
        }

        // 8. Telemetry cadence
        if now_ms.saturating_sub(self.schedule.last_telemetry_ms) >= self.telemetry_interval_ms {
            self.schedule.last_telemetry_ms = now_ms;
            let data = TelemetryData {
                heart_rate: snap.heart_rate,
                location: self.schedule.location,
                acceleration: snap.motion,
                helmet_worn: self.helmet.worn(),
            };
            report.telemetry = self.dispatch(AlertEvent::Telemetry(data), now_ms);
        }

        // 9. Interlock
        self.interlock
            .drive(&self.helmet, &mut self.outputs, &mut self.sink);
        report.engine_enabled = self.interlock.enabled(&self.helmet);

        // 10. Indicator
        self.outputs.toggle();
        let degraded = self.hub.degraded() || self.transport_failures >= self.escalation_count;
        if degraded != self.degraded {
            self.degraded = degraded;
            self.outputs.set_degraded(degraded);
            self.sink.emit(&AppEvent::Degraded(degraded));
            if degraded {
                warn!("Entering degraded mode");
            } else {
                info!("Leaving degraded mode");
            }
        }
        report.degraded = self.degraded;

        // 11. Drain
        report.drained = self
            .outbox
            .drain(&mut self.transport, self.max_sends, &mut self.sink);
        if report.drained.sent > 0 {
            self.transport_failures = 0;
        }
        self.transport_failures = self
            .transport_failures
            .saturating_add(report.drained.failed as u32);

        report
    }

    // ── Internal ──────────────────────────────────────────────

    fn dispatch(&mut self, event: AlertEvent, now_ms: u64) -> bool {
        self.dispatcher.dispatch(
            event,
            now_ms,
            &mut self.schedule.ledger,
            &mut self.outbox,
            &mut self.sink,
        )
    }

    /// Cached fix, else a fresh fetch; `None` if neither is available.
    fn alert_location(&mut self) -> Option<LocationSample> {
        if self.schedule.location.is_none() {
            self.schedule.location = self.hub.read_location(&mut self.sink);
        }
        self.schedule.location
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn helmet(&self) -> HelmetState {
        self.helmet
    }

    pub fn engine_enabled(&self) -> bool {
        self.interlock.enabled(&self.helmet)
    }

    pub fn location(&self) -> Option<LocationSample> {
        self.schedule.location
    }

    pub fn ledger(&self) -> &AlertLedger {
        &self.schedule.ledger
    }

    pub fn pending(&self) -> usize {
        self.outbox.len()
    }

    pub fn is_degraded(&self) -> bool {
        self.degraded
    }

    /// Ticks executed since start.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn sensors_mut(&mut self) -> &mut S {
        self.hub.port_mut()
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    pub fn outputs(&self) -> &O {
        &self.outputs
    }

    pub fn sink(&self) -> &E {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut E {
        &mut self.sink
    }
}
