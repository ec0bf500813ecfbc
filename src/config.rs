//! System configuration parameters
//!
//! All tunable parameters for the SafeX helmet controller.
//! Values can be overridden from NVS or a JSON provisioning file; either
//! way [`SystemConfig::validate`] must pass before the control loop starts.

use serde::{Deserialize, Serialize};

use crate::app::ports::ConfigError;
use crate::detect::{FallModelKind, HeartRateBounds, MagnitudeMode};
use crate::sensors::sample::MAX_PLAUSIBLE_BPM;

/// Per-kind minimum spacing between two sent alerts (seconds).
///
/// SOS has no entry: it is never rate limited.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertCooldowns {
    pub fall_secs: f32,
    pub heart_rate_secs: f32,
    pub voice_command_secs: f32,
    pub telemetry_secs: f32,
}

impl Default for AlertCooldowns {
    fn default() -> Self {
        Self {
            fall_secs: 5.0,
            heart_rate_secs: 5.0,
            voice_command_secs: 0.0,
            telemetry_secs: 1.0,
        }
    }
}

/// Which sensor backend `main` builds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SensorBackendKind {
    Simulated,
    #[default]
    Hardware,
}

/// Core system configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SystemConfig {
    // --- Fall detection ---
    /// Magnitude above which a sample is a fall
    pub fall_threshold: f32,
    /// Axes feeding the magnitude
    pub fall_magnitude: MagnitudeMode,
    /// Threshold-only or impact-then-stillness classifier
    pub fall_model: FallModelKind,

    // --- Vitals ---
    /// Inclusive normal heart-rate range (bpm)
    pub heart_rate_bounds: HeartRateBounds,

    // --- Timing ---
    /// GPS cache refresh interval (seconds)
    pub location_interval_secs: f32,
    /// Telemetry push interval (seconds)
    pub telemetry_interval_secs: f32,
    /// Control loop period (milliseconds)
    pub tick_period_ms: u32,

    // --- Alerting ---
    pub alert_cooldown_secs: AlertCooldowns,
    /// Outbound messages handed to the transport per tick
    pub max_sends_per_tick: u8,

    // --- Degradation ---
    /// Consecutive failures of one collaborator before the indicator
    /// switches to its degraded pattern
    pub failure_escalation_count: u32,

    // --- Hardware ---
    pub sensor_backend: SensorBackendKind,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            fall_threshold: 5.0,
            fall_magnitude: MagnitudeMode::SixAxis,
            fall_model: FallModelKind::Threshold,

            heart_rate_bounds: HeartRateBounds::default(),

            location_interval_secs: 10.0,
            telemetry_interval_secs: 1.0,
            tick_period_ms: 100, // 10 Hz

            alert_cooldown_secs: AlertCooldowns::default(),
            max_sends_per_tick: 5,

            failure_escalation_count: 5,

            sensor_backend: SensorBackendKind::Hardware,
        }
    }
}

impl SystemConfig {
    /// Parse a (possibly partial) JSON document; missing keys keep their
    /// defaults.  The result is validated.
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let cfg: Self = serde_json::from_str(text).map_err(|_| ConfigError::Corrupted)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Range-check every field.  Failing here is fatal at startup.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.fall_threshold.is_finite() && self.fall_threshold > 0.0) {
            return Err(ConfigError::ValidationFailed(
                "fall_threshold must be a positive number",
            ));
        }
        let hr = self.heart_rate_bounds;
        if hr.lower >= hr.upper {
            return Err(ConfigError::ValidationFailed(
                "heart_rate_bounds.lower must be < heart_rate_bounds.upper",
            ));
        }
        if hr.upper > MAX_PLAUSIBLE_BPM {
            return Err(ConfigError::ValidationFailed(
                "heart_rate_bounds.upper must be <= 300",
            ));
        }
        if !positive_secs(self.location_interval_secs) {
            return Err(ConfigError::ValidationFailed(
                "location_interval_secs must be in (0, 3600]",
            ));
        }
        if !positive_secs(self.telemetry_interval_secs) {
            return Err(ConfigError::ValidationFailed(
                "telemetry_interval_secs must be in (0, 3600]",
            ));
        }
        if !(10..=1000).contains(&self.tick_period_ms) {
            return Err(ConfigError::ValidationFailed(
                "tick_period_ms must be 10–1000",
            ));
        }
        let c = self.alert_cooldown_secs;
        for secs in [
            c.fall_secs,
            c.heart_rate_secs,
            c.voice_command_secs,
            c.telemetry_secs,
        ] {
            if !(secs.is_finite() && (0.0..=3600.0).contains(&secs)) {
                return Err(ConfigError::ValidationFailed(
                    "alert_cooldown_secs entries must be 0–3600",
                ));
            }
        }
        if self.max_sends_per_tick == 0 {
            return Err(ConfigError::ValidationFailed(
                "max_sends_per_tick must be at least 1",
            ));
        }
        if self.failure_escalation_count == 0 {
            return Err(ConfigError::ValidationFailed(
                "failure_escalation_count must be at least 1",
            ));
        }
        Ok(())
    }

    pub fn location_interval_ms(&self) -> u64 {
        secs_to_ms(self.location_interval_secs)
    }

    pub fn telemetry_interval_ms(&self) -> u64 {
        secs_to_ms(self.telemetry_interval_secs)
    }
}

fn positive_secs(secs: f32) -> bool {
    secs.is_finite() && secs > 0.0 && secs <= 3600.0
}

/// Seconds (as configured) to whole milliseconds.
pub fn secs_to_ms(secs: f32) -> u64 {
    (secs.max(0.0) * 1000.0).round() as u64
}
