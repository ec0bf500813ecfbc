//! Typed samples produced by the sensor layer.
//!
//! Units are normalised before a sample leaves an adapter: acceleration in
//! m/s², angular rate in deg/s, location in decimal degrees.

use serde::{Deserialize, Serialize};

use crate::error::SensorError;

/// Standard gravity (m/s²).
pub const STANDARD_GRAVITY: f32 = 9.806_65;

/// Heart rates above this are treated as a sensor fault, not a vital sign.
pub const MAX_PLAUSIBLE_BPM: u16 = 300;

/// One six-axis IMU reading.
///
/// Field names double as the telemetry wire keys (`acc_x` … `gyro_z`).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct MotionSample {
    pub acc_x: f32,
    pub acc_y: f32,
    pub acc_z: f32,
    pub gyro_x: f32,
    pub gyro_y: f32,
    pub gyro_z: f32,
}

impl MotionSample {
    pub const fn new(acc: (f32, f32, f32), gyro: (f32, f32, f32)) -> Self {
        Self {
            acc_x: acc.0,
            acc_y: acc.1,
            acc_z: acc.2,
            gyro_x: gyro.0,
            gyro_y: gyro.1,
            gyro_z: gyro.2,
        }
    }

    /// A wearer standing still: gravity on -Z, no rotation.
    pub const fn resting() -> Self {
        Self::new((0.0, 0.0, -9.8), (0.0, 0.0, 0.0))
    }

    /// Euclidean norm of the acceleration triple.
    pub fn acceleration_magnitude(&self) -> f32 {
        (self.acc_x * self.acc_x + self.acc_y * self.acc_y + self.acc_z * self.acc_z).sqrt()
    }

    /// Euclidean norm over all six axes.
    pub fn six_axis_magnitude(&self) -> f32 {
        (self.acc_x * self.acc_x
            + self.acc_y * self.acc_y
            + self.acc_z * self.acc_z
            + self.gyro_x * self.gyro_x
            + self.gyro_y * self.gyro_y
            + self.gyro_z * self.gyro_z)
            .sqrt()
    }

    pub fn is_finite(&self) -> bool {
        [
            self.acc_x,
            self.acc_y,
            self.acc_z,
            self.gyro_x,
            self.gyro_y,
            self.gyro_z,
        ]
        .iter()
        .all(|v| v.is_finite())
    }
}

/// A position fix in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct LocationSample {
    pub lat: f64,
    pub lon: f64,
}

impl LocationSample {
    pub const fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Reject non-finite or out-of-range coordinates.
    pub fn validated(self) -> Result<Self, SensorError> {
        let ok = self.lat.is_finite()
            && self.lon.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lon);
        if ok { Ok(self) } else { Err(SensorError::Malformed) }
    }
}

/// Reject heart rates no human produces.
pub fn validate_heart_rate(bpm: u16) -> Result<u16, SensorError> {
    if bpm > MAX_PLAUSIBLE_BPM {
        Err(SensorError::Malformed)
    } else {
        Ok(bpm)
    }
}
