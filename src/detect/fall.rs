//! Fall detection.
//!
//! [`FallDetector`] is the stateless threshold classifier: Euclidean
//! magnitude against a fixed threshold, strict `>`.  Which axes feed the
//! magnitude is a [`MagnitudeMode`]:
//!
//! | Mode                 | Magnitude                 | At rest  |
//! |----------------------|---------------------------|----------|
//! | `SixAxis`            | ‖acc, gyro‖               | ≈ 9.8    |
//! | `Acceleration`       | ‖acc‖                     | ≈ 9.8    |
//! | `GravityCompensated` | \|‖acc‖ − g\|             | ≈ 0      |
//!
//! With the default 5.0 threshold the first two modes flag a motionless
//! wearer as falling (gravity alone exceeds it).  `SixAxis` remains the
//! default so field data stays comparable with earlier units; new
//! deployments should select `GravityCompensated`.
//!
//! [`WindowedFallDetector`] keeps the next few samples after an impact and
//! only reports a fall if the wearer then stays still.  [`FallModel`]
//! selects a classifier at construction, including an externally trained
//! one supplied as a plain function.

use heapless::Vec;
use serde::{Deserialize, Serialize};

use crate::sensors::sample::{MotionSample, STANDARD_GRAVITY};

/// Samples inspected after an impact before deciding (1 s at 10 Hz).
pub const STILLNESS_WINDOW: usize = 10;

/// Magnitude variance (m/s²)² below which the post-impact window counts
/// as motionless.
pub const STILLNESS_VARIANCE: f32 = 0.5;

/// Which axes contribute to the fall magnitude.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MagnitudeMode {
    #[default]
    SixAxis,
    Acceleration,
    GravityCompensated,
}

/// Which classifier the control loop runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FallModelKind {
    #[default]
    Threshold,
    Windowed,
}

// ───────────────────────────────────────────────────────────────
// Threshold classifier
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FallDetector {
    threshold: f32,
    mode: MagnitudeMode,
}

impl FallDetector {
    pub const fn new(threshold: f32, mode: MagnitudeMode) -> Self {
        Self { threshold, mode }
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    pub fn mode(&self) -> MagnitudeMode {
        self.mode
    }

    /// Magnitude under the configured mode.
    pub fn magnitude(&self, sample: &MotionSample) -> f32 {
        match self.mode {
            MagnitudeMode::SixAxis => sample.six_axis_magnitude(),
            MagnitudeMode::Acceleration => sample.acceleration_magnitude(),
            MagnitudeMode::GravityCompensated => {
                (sample.acceleration_magnitude() - STANDARD_GRAVITY).abs()
            }
        }
    }

    /// `true` when the magnitude strictly exceeds the threshold.
    pub fn detect(&self, sample: &MotionSample) -> bool {
        self.magnitude(sample) > self.threshold
    }
}

// ───────────────────────────────────────────────────────────────
// Impact + stillness classifier
// ───────────────────────────────────────────────────────────────

/// Two-phase detector: an impact arms it, then [`STILLNESS_WINDOW`]
/// samples are collected.  A low-variance window reports a fall on the
/// sample that completes it; movement after the impact is a near miss.
#[derive(Debug, Clone)]
pub struct WindowedFallDetector {
    trigger: FallDetector,
    window: Vec<f32, STILLNESS_WINDOW>,
    armed: bool,
}

impl WindowedFallDetector {
    pub fn new(trigger: FallDetector) -> Self {
        Self {
            trigger,
            window: Vec::new(),
            armed: false,
        }
    }

    /// Whether an impact was seen and the stillness window is open.
    pub fn is_armed(&self) -> bool {
        self.armed
    }

    pub fn evaluate(&mut self, sample: &MotionSample) -> bool {
        if !self.armed {
            if self.trigger.detect(sample) {
                self.armed = true;
                self.window.clear();
            }
            return false;
        }

        // Capacity equals the window length and the window is cleared as
        // soon as it fills, so the push cannot fail.
        let _ = self.window.push(self.trigger.magnitude(sample));
        if self.window.len() < STILLNESS_WINDOW {
            return false;
        }

        let still = variance(&self.window) < STILLNESS_VARIANCE;
        self.armed = false;
        self.window.clear();
        still
    }
}

fn variance(values: &[f32]) -> f32 {
    if values.is_empty() {
        return 0.0;
    }
    let n = values.len() as f32;
    let mean = values.iter().sum::<f32>() / n;
    values.iter().map(|v| (v - mean) * (v - mean)).sum::<f32>() / n
}

// ───────────────────────────────────────────────────────────────
// Model selection
// ───────────────────────────────────────────────────────────────

/// The fall classifier in use, chosen once at construction.
#[derive(Debug, Clone)]
pub enum FallModel {
    Threshold(FallDetector),
    Windowed(WindowedFallDetector),
    /// An offline-trained classifier exposed as a pure function.
    Learned(fn(&MotionSample) -> bool),
}

impl FallModel {
    pub fn from_kind(kind: FallModelKind, detector: FallDetector) -> Self {
        match kind {
            FallModelKind::Threshold => Self::Threshold(detector),
            FallModelKind::Windowed => Self::Windowed(WindowedFallDetector::new(detector)),
        }
    }

    pub fn evaluate(&mut self, sample: &MotionSample) -> bool {
        match self {
            Self::Threshold(d) => d.detect(sample),
            Self::Windowed(w) => w.evaluate(sample),
            Self::Learned(f) => f(sample),
        }
    }
}
