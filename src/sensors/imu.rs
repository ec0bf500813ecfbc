//! MPU-6050 six-axis IMU over I²C.
//!
//! Configured for ±2 g and ±250 °/s full scale.  A burst read of the 14
//! output registers starting at ACCEL_XOUT_H returns accel X/Y/Z, die
//! temperature and gyro X/Y/Z as big-endian `i16`s.

use embedded_hal::i2c::I2c;
use log::{info, warn};

use super::i2c_error;
use super::sample::{MotionSample, STANDARD_GRAVITY};
use crate::error::SensorError;

/// AD0 low.
pub const MPU6050_ADDR: u8 = 0x68;

const REG_GYRO_CONFIG: u8 = 0x1B;
const REG_ACCEL_CONFIG: u8 = 0x1C;
const REG_ACCEL_XOUT_H: u8 = 0x3B;
const REG_PWR_MGMT_1: u8 = 0x6B;
const REG_WHO_AM_I: u8 = 0x75;

const WHO_AM_I_VALUE: u8 = 0x68;

/// ±2 g range.
const ACCEL_LSB_PER_G: f32 = 16_384.0;
/// ±250 °/s range.
const GYRO_LSB_PER_DPS: f32 = 131.0;

pub struct Mpu6050 {
    addr: u8,
}

impl Mpu6050 {
    pub const fn new(addr: u8) -> Self {
        Self { addr }
    }

    /// Probe, wake from sleep, and select the full-scale ranges.
    pub fn init<I: I2c>(&self, i2c: &mut I) -> Result<(), SensorError> {
        let mut id = [0u8; 1];
        i2c.write_read(self.addr, &[REG_WHO_AM_I], &mut id)
            .map_err(|e| i2c_error(&e))?;
        if id[0] != WHO_AM_I_VALUE {
            warn!("MPU-6050: unexpected WHO_AM_I 0x{:02X}", id[0]);
            return Err(SensorError::Malformed);
        }
        for (reg, value) in [
            (REG_PWR_MGMT_1, 0x00),
            (REG_ACCEL_CONFIG, 0x00),
            (REG_GYRO_CONFIG, 0x00),
        ] {
            i2c.write(self.addr, &[reg, value])
                .map_err(|e| i2c_error(&e))?;
        }
        info!("MPU-6050 ready at 0x{:02X}", self.addr);
        Ok(())
    }

    pub fn read<I: I2c>(&self, i2c: &mut I) -> Result<MotionSample, SensorError> {
        let mut raw = [0u8; 14];
        i2c.write_read(self.addr, &[REG_ACCEL_XOUT_H], &mut raw)
            .map_err(|e| i2c_error(&e))?;
        Ok(decode(&raw))
    }
}

/// Convert a raw 14-byte burst into SI units.
pub fn decode(raw: &[u8; 14]) -> MotionSample {
    let word = |i: usize| i16::from_be_bytes([raw[i], raw[i + 1]]) as f32;
    let acc = |i: usize| word(i) / ACCEL_LSB_PER_G * STANDARD_GRAVITY;
    let gyro = |i: usize| word(i) / GYRO_LSB_PER_DPS;
    // Bytes 6..8 are the die temperature.
    MotionSample::new((acc(0), acc(2), acc(4)), (gyro(8), gyro(10), gyro(12)))
}
