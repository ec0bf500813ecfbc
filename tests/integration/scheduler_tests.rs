//! Control-loop tests: sensors → detectors → dispatcher → outbox →
//! transport, with the interlock and indicator observed through mocks.

use crate::mock_hw::{ManualClock, OutputCall, run_ticks, scheduler};

use safex::alerts::AlertKind;
use safex::app::commands::CommandToken;
use safex::app::events::AppEvent;
use safex::app::ports::Prompt;
use safex::config::SystemConfig;
use safex::detect::MagnitudeMode;
use safex::error::{SensorError, TransportError};
use safex::scheduler::{StopReason, StopSignal};
use safex::sensors::SensorId;
use safex::sensors::sample::{LocationSample, MotionSample};
use safex::sensors::simulated::SimulatedSensors;

const TICK: u64 = 100;

/// Worn, normal pulse, no acceleration at all: nothing should alert.
fn quiet_sensors() -> SimulatedSensors {
    let mut s = SimulatedSensors::new();
    s.set_motion(Ok(MotionSample::default()));
    s
}

// ── Fall ──────────────────────────────────────────────────────

#[test]
fn resting_six_axis_reading_counts_as_fall() {
    let mut s = scheduler(&SystemConfig::default(), SimulatedSensors::new());
    let report = s.tick(0);
    assert!(report.fall);
    assert_eq!(s.transport().count(AlertKind::Fall), 1);
    assert_eq!(s.outputs().prompts(), vec![Prompt::FallCheck]);
}

#[test]
fn gravity_compensated_resting_reading_is_quiet() {
    let config = SystemConfig {
        fall_magnitude: MagnitudeMode::GravityCompensated,
        ..SystemConfig::default()
    };
    let mut s = scheduler(&config, SimulatedSensors::new());
    run_ticks(&mut s, 0, TICK, 20);
    assert_eq!(s.transport().count(AlertKind::Fall), 0);
}

#[test]
fn persistent_fall_is_rate_limited_by_cooldown() {
    let mut s = scheduler(&SystemConfig::default(), SimulatedSensors::new());
    let n = 120;
    run_ticks(&mut s, 0, TICK, n);
    // 1 + floor((N-1) * tick / cooldown) with a 5 s cooldown
    let expected = 1 + ((n - 1) * TICK / 5_000) as usize;
    assert_eq!(s.transport().count(AlertKind::Fall), expected);
    assert_eq!(s.outputs().prompts().len(), expected);
}

#[test]
fn renewed_fall_after_quiet_tick_bypasses_cooldown() {
    let mut s = scheduler(&SystemConfig::default(), SimulatedSensors::new());
    s.tick(0);
    s.sensors_mut().set_motion(Ok(MotionSample::default()));
    s.tick(100);
    s.sensors_mut().set_motion(Ok(MotionSample::resting()));
    s.tick(200);
    assert_eq!(s.transport().count(AlertKind::Fall), 2);
}

#[test]
fn fall_alert_carries_cached_location() {
    let mut sensors = SimulatedSensors::new();
    sensors.set_location(Ok(LocationSample::new(12.5, 77.25)));
    let mut s = scheduler(&SystemConfig::default(), sensors);
    s.tick(0);
    assert!(
        s.transport()
            .json()
            .contains(&r#"{"alert":"fall","location":{"lat":12.5,"lon":77.25}}"#.to_string())
    );
}

#[test]
fn fall_alert_without_fix_sends_null_location() {
    let mut sensors = SimulatedSensors::new();
    sensors.set_location(Err(SensorError::NotReady));
    let mut s = scheduler(&SystemConfig::default(), sensors);
    s.tick(0);
    assert!(
        s.transport()
            .json()
            .contains(&r#"{"alert":"fall","location":null}"#.to_string())
    );
}

// ── Vitals ────────────────────────────────────────────────────

#[test]
fn high_heart_rate_raises_one_alert() {
    let mut sensors = quiet_sensors();
    sensors.set_vitals(Ok(130));
    let mut s = scheduler(&SystemConfig::default(), sensors);
    run_ticks(&mut s, 0, TICK, 20);
    assert_eq!(s.transport().count(AlertKind::HeartRate), 1);
    assert!(
        s.transport()
            .json()
            .contains(&r#"{"alert":"heart_rate","rate":130}"#.to_string())
    );
}

#[test]
fn failing_pulse_sensor_skips_vitals_and_reports_fault() {
    let mut sensors = quiet_sensors();
    sensors.set_vitals(Err(SensorError::Bus));
    let mut s = scheduler(&SystemConfig::default(), sensors);
    let report = s.tick(0);
    assert!(!report.abnormal_heart_rate);
    assert!(s.sink().contains(&AppEvent::SensorFault {
        sensor: SensorId::Vitals,
        error: SensorError::Bus,
    }));
}

// ── SOS ───────────────────────────────────────────────────────

#[test]
fn held_button_sends_one_sos_per_press() {
    let mut s = scheduler(&SystemConfig::default(), quiet_sensors());
    s.sensors_mut().set_button(true);
    run_ticks(&mut s, 0, TICK, 30);
    assert_eq!(s.transport().count(AlertKind::Sos), 1);

    s.sensors_mut().set_button(false);
    s.tick(3_000);
    s.sensors_mut().set_button(true);
    run_ticks(&mut s, 3_100, TICK, 5);
    assert_eq!(s.transport().count(AlertKind::Sos), 2);
    assert_eq!(s.outputs().prompts(), vec![Prompt::SosSent, Prompt::SosSent]);
}

#[test]
fn spoken_sos_takes_the_sos_path() {
    let mut sensors = quiet_sensors();
    sensors.push_command(CommandToken::Sos);
    let mut s = scheduler(&SystemConfig::default(), sensors);
    let report = s.tick(0);
    assert!(report.sos);
    assert_eq!(report.command, None);
    assert_eq!(s.transport().count(AlertKind::Sos), 1);
    assert_eq!(s.transport().count(AlertKind::VoiceCommand), 0);
}

// ── Voice commands ────────────────────────────────────────────

#[test]
fn voice_commands_are_forwarded_to_phone() {
    let mut sensors = quiet_sensors();
    sensors.push_command(CommandToken::Call);
    sensors.push_command(CommandToken::Navigation);
    let mut s = scheduler(&SystemConfig::default(), sensors);
    run_ticks(&mut s, 0, TICK, 2);
    let json = s.transport().json();
    assert!(json.contains(&r#"{"command":"initiate_call"}"#.to_string()));
    assert!(json.contains(&r#"{"command":"start_navigation"}"#.to_string()));
}

// ── Interlock ─────────────────────────────────────────────────

#[test]
fn engine_follows_worn_switch_without_lag() {
    let mut s = scheduler(&SystemConfig::default(), quiet_sensors());
    s.start(0);
    assert!(!s.engine_enabled(), "not worn until the switch says so");

    let pattern = [true, true, false, true, false, false, true];
    for (i, worn) in pattern.into_iter().enumerate() {
        s.sensors_mut().set_worn(Ok(worn));
        let report = s.tick((i as u64 + 1) * TICK);
        assert_eq!(report.engine_enabled, worn);
        assert_eq!(s.engine_enabled(), worn);
        assert_eq!(s.outputs().engine_on(), worn);
    }
}

#[test]
fn worn_switch_failure_holds_state_then_fails_safe() {
    let mut s = scheduler(&SystemConfig::default(), quiet_sensors());
    s.tick(0);
    assert!(s.engine_enabled());

    s.sensors_mut().set_worn(Err(SensorError::Bus));
    // escalation count is 5: four failed reads reuse the last state
    for i in 1..5 {
        s.tick(i * TICK);
        assert!(s.engine_enabled(), "failure {i} keeps the engine enabled");
    }
    s.tick(5 * TICK);
    assert!(!s.engine_enabled());
    assert!(!s.outputs().engine_on());
    assert!(s.is_degraded());

    // still down a minute later
    run_ticks(&mut s, 6 * TICK, TICK, 600);
    assert!(!s.outputs().engine_on());

    s.sensors_mut().set_worn(Ok(true));
    s.tick(700 * TICK);
    assert!(s.outputs().engine_on());
    assert!(s.sink().contains(&AppEvent::SensorRecovered(SensorId::Worn)));
}

// ── Cadences ──────────────────────────────────────────────────

#[test]
fn telemetry_every_tenth_tick() {
    static STOP: StopSignal = StopSignal::new();
    let mut s = scheduler(&SystemConfig::default(), quiet_sensors());
    let mut clock = ManualClock::new(0).stop_at(&STOP, 3_500, StopReason::Requested);
    let mut tick = 0;
    let mut fired = Vec::new();

    s.run_with(&mut clock, &STOP, |report| {
        tick += 1;
        if report.telemetry {
            fired.push(tick);
        }
    });

    assert_eq!(tick, 34);
    assert_eq!(fired, vec![10, 20, 30]);
    assert_eq!(s.transport().count(AlertKind::Telemetry), 3);
}

#[test]
fn location_refreshes_on_hundredth_tick_of_run() {
    static STOP: StopSignal = StopSignal::new();
    let mut s = scheduler(&SystemConfig::default(), quiet_sensors());
    let mut clock = ManualClock::new(0).stop_at(&STOP, 20_500, StopReason::Requested);
    let mut tick = 0;
    let mut refreshed = Vec::new();

    s.run_with(&mut clock, &STOP, |report| {
        tick += 1;
        if report.location_refreshed {
            refreshed.push(tick);
        }
    });

    assert_eq!(refreshed, vec![100, 200]);
}

#[test]
fn location_cache_refreshes_on_interval() {
    let mut sensors = quiet_sensors();
    sensors.set_location(Ok(LocationSample::new(1.0, 2.0)));
    let mut s = scheduler(&SystemConfig::default(), sensors);
    s.start(0);
    assert_eq!(s.location(), Some(LocationSample::new(1.0, 2.0)));

    s.sensors_mut().set_location(Ok(LocationSample::new(3.0, 4.0)));
    run_ticks(&mut s, TICK, TICK, 99);
    assert_eq!(s.location(), Some(LocationSample::new(1.0, 2.0)));
    let report = s.tick(10_000);
    assert!(report.location_refreshed);
    assert_eq!(s.location(), Some(LocationSample::new(3.0, 4.0)));
}

// ── Degradation ───────────────────────────────────────────────

#[test]
fn repeated_sensor_failures_degrade_then_recover() {
    let mut s = scheduler(&SystemConfig::default(), quiet_sensors());
    s.sensors_mut().set_motion(Err(SensorError::Timeout));
    run_ticks(&mut s, 0, TICK, 4);
    assert!(!s.is_degraded());
    s.tick(400);
    assert!(s.is_degraded());
    assert!(s.outputs().calls.contains(&OutputCall::Degraded(true)));

    s.sensors_mut().set_motion(Ok(MotionSample::default()));
    s.tick(500);
    assert!(!s.is_degraded());
    assert!(s.sink().contains(&AppEvent::Degraded(false)));
    assert!(s.sink().contains(&AppEvent::SensorRecovered(SensorId::Motion)));
}

#[test]
fn transport_failures_degrade_until_a_send_succeeds() {
    let mut s = scheduler(&SystemConfig::default(), quiet_sensors());
    s.transport_mut().failure = Some(TransportError::NotConnected);
    run_ticks(&mut s, 0, TICK, 80);
    assert!(s.is_degraded());
    assert!(s.transport().sent.is_empty());
    assert_eq!(s.pending(), 0, "failed messages are not retried");

    s.transport_mut().failure = None;
    run_ticks(&mut s, 8_000, TICK, 20);
    assert!(!s.is_degraded());
    assert!(s.transport().count(AlertKind::Telemetry) > 0);
}

#[test]
fn indicator_toggles_every_tick() {
    let mut s = scheduler(&SystemConfig::default(), quiet_sensors());
    run_ticks(&mut s, 0, TICK, 7);
    assert_eq!(s.outputs().toggles(), 7);
}

// ── Run loop ──────────────────────────────────────────────────

#[test]
fn run_stops_on_signal_and_flushes_outbox() {
    static STOP: StopSignal = StopSignal::new();
    let config = SystemConfig {
        max_sends_per_tick: 1,
        ..SystemConfig::default()
    };
    let mut sensors = SimulatedSensors::new();
    sensors.set_vitals(Ok(130));
    sensors.set_button(true);
    let mut s = scheduler(&config, sensors);
    let mut clock = ManualClock::new(0).stop_at(&STOP, 2 * TICK, StopReason::PowerDown);

    let reason = s.run(&mut clock, &STOP);

    assert_eq!(reason, StopReason::PowerDown);
    assert_eq!(s.ticks(), 1);
    // fall + heart rate + sos queued in one tick, one sent per tick,
    // the rest flushed on the way out
    assert_eq!(s.transport().sent.len(), 3);
    assert_eq!(s.pending(), 0);
    assert!(!s.outputs().engine_on());
    assert_eq!(s.sink().events.last(), Some(&AppEvent::Stopped));
}

#[test]
fn run_keeps_fixed_cadence() {
    static STOP: StopSignal = StopSignal::new();
    let mut s = scheduler(&SystemConfig::default(), quiet_sensors());
    let mut clock = ManualClock::new(5_000).stop_at(&STOP, 6_100, StopReason::Requested);

    assert_eq!(s.run(&mut clock, &STOP), StopReason::Requested);
    // ticks at 5100, 5200, …, 6000; the stop lands on the 6100 boundary
    assert_eq!(s.ticks(), 10);
    assert_eq!(clock.sleeps.len(), 11);
    assert!(clock.sleeps.iter().all(|&ms| ms == TICK));
}

#[test]
fn overrun_skips_to_next_boundary() {
    static STOP: StopSignal = StopSignal::new();
    let mut s = scheduler(&SystemConfig::default(), quiet_sensors());
    let mut clock = ManualClock::new(0).stop_at(&STOP, 1_000, StopReason::Requested);
    let now = clock.handle();
    let mut ticks = 0;

    s.run_with(&mut clock, &STOP, |_| {
        ticks += 1;
        if ticks == 3 {
            // third tick (t = 300) takes 250 ms
            now.set(now.get() + 250);
        }
    });

    assert_eq!(&clock.sleeps[..5], &[100, 100, 100, 50, 100]);
    assert!(clock.sleeps.iter().all(|&ms| ms > 0), "no catch-up burst");
}
