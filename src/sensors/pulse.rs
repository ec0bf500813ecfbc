//! MAX30102 pulse sensor over I²C.
//!
//! Runs in SpO₂ mode (red + IR LEDs) at 100 samples/s with no on-chip
//! averaging.  Each FIFO entry is six bytes: red then IR, 18 bits each.
//! Only the IR channel feeds the [`BeatDetector`].
//!
//! Every call to [`Max30102::read`] drains whatever the FIFO holds (at
//! most 32 entries, 320 ms) so the estimator sees a continuous signal
//! regardless of the control-loop period.

use embedded_hal::i2c::I2c;
use log::{info, warn};

use super::i2c_error;
use crate::error::SensorError;

pub const MAX30102_ADDR: u8 = 0x57;

const REG_FIFO_WR_PTR: u8 = 0x04;
const REG_OVF_COUNTER: u8 = 0x05;
const REG_FIFO_RD_PTR: u8 = 0x06;
const REG_FIFO_DATA: u8 = 0x07;
const REG_FIFO_CONFIG: u8 = 0x08;
const REG_MODE_CONFIG: u8 = 0x09;
const REG_SPO2_CONFIG: u8 = 0x0A;
const REG_LED1_PA: u8 = 0x0C;
const REG_LED2_PA: u8 = 0x0D;
const REG_PART_ID: u8 = 0xFF;

const PART_ID: u8 = 0x15;

/// No averaging, FIFO rollover enabled.
const FIFO_CONFIG: u8 = 0x10;
const MODE_RESET: u8 = 0x40;
const MODE_SPO2: u8 = 0x03;
/// 4096 nA range, 100 sps, 411 µs pulse width (18-bit).
const SPO2_CONFIG: u8 = 0x27;
/// ≈ 7 mA per LED.
const LED_CURRENT: u8 = 0x24;

const FIFO_DEPTH: usize = 32;
const BYTES_PER_ENTRY: usize = 6;

pub const SAMPLE_RATE_HZ: u32 = 100;

// ═══════════════════════════════════════════════════════════════
//  Beat detector
// ═══════════════════════════════════════════════════════════════

/// IR level below which nothing is touching the sensor.
pub const CONTACT_THRESHOLD: u32 = 50_000;

/// Shortest accepted beat interval in samples (300 bpm).
const MIN_INTERVAL: u32 = SAMPLE_RATE_HZ * 60 / 300;
/// Longest accepted beat interval in samples (30 bpm).
const MAX_INTERVAL: u32 = SAMPLE_RATE_HZ * 60 / 30;

/// Baseline tracker smoothing factor (≈ 0.3 Hz cut-off at 100 sps).
const BASELINE_ALPHA: f32 = 0.02;

const INTERVAL_HISTORY: usize = 4;

/// Peak-to-peak interval estimator over raw IR samples.
///
/// The slowly varying baseline is subtracted; a beat is a local maximum
/// of the remaining pulsatile component while it is above the baseline.
/// The rate is the mean of the last few accepted intervals.
#[derive(Debug, Clone, Default)]
pub struct BeatDetector {
    baseline: Option<f32>,
    prev_ac: f32,
    rising: bool,
    since_peak: Option<u32>,
    intervals: heapless::Deque<u32, INTERVAL_HISTORY>,
    contact: bool,
}

impl BeatDetector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, ir: u32) {
        if ir < CONTACT_THRESHOLD {
            if self.contact {
                *self = Self::default();
            }
            return;
        }
        self.contact = true;

        let x = ir as f32;
        let base = self.baseline.get_or_insert(x);
        *base += (x - *base) * BASELINE_ALPHA;
        let ac = x - *base;

        if let Some(n) = self.since_peak.as_mut() {
            *n += 1;
        }

        if self.rising && ac < self.prev_ac && self.prev_ac > 0.0 {
            // prev sample was the peak
            if let Some(n) = self.since_peak {
                let interval = n.saturating_sub(1).max(1);
                if (MIN_INTERVAL..=MAX_INTERVAL).contains(&interval) {
                    if self.intervals.is_full() {
                        self.intervals.pop_front();
                    }
                    let _ = self.intervals.push_back(interval);
                } else if interval > MAX_INTERVAL {
                    self.intervals.clear();
                }
            }
            self.since_peak = Some(1);
            self.rising = false;
        } else if ac > self.prev_ac {
            self.rising = true;
        }
        self.prev_ac = ac;
    }

    pub fn has_contact(&self) -> bool {
        self.contact
    }

    /// Current estimate in beats per minute.
    pub fn bpm(&self) -> Result<u16, SensorError> {
        if !self.contact || self.intervals.len() < 2 {
            return Err(SensorError::NotReady);
        }
        let sum: u32 = self.intervals.iter().sum();
        let mean = sum as f32 / self.intervals.len() as f32;
        Ok((60.0 * SAMPLE_RATE_HZ as f32 / mean).round() as u16)
    }
}

// ═══════════════════════════════════════════════════════════════
//  Driver
// ═══════════════════════════════════════════════════════════════

pub struct Max30102 {
    addr: u8,
    beats: BeatDetector,
}

impl Max30102 {
    pub fn new(addr: u8) -> Self {
        Self {
            addr,
            beats: BeatDetector::new(),
        }
    }

    /// Probe, reset, configure SpO₂ mode and clear the FIFO.
    pub fn init<I: I2c>(&mut self, i2c: &mut I) -> Result<(), SensorError> {
        let id = self.read_reg(i2c, REG_PART_ID)?;
        if id != PART_ID {
            warn!("MAX30102: unexpected part id 0x{:02X}", id);
            return Err(SensorError::Malformed);
        }
        self.write_reg(i2c, REG_MODE_CONFIG, MODE_RESET)?;
        for (reg, value) in [
            (REG_FIFO_CONFIG, FIFO_CONFIG),
            (REG_SPO2_CONFIG, SPO2_CONFIG),
            (REG_LED1_PA, LED_CURRENT),
            (REG_LED2_PA, LED_CURRENT),
            (REG_FIFO_WR_PTR, 0),
            (REG_OVF_COUNTER, 0),
            (REG_FIFO_RD_PTR, 0),
            (REG_MODE_CONFIG, MODE_SPO2),
        ] {
            self.write_reg(i2c, reg, value)?;
        }
        self.beats = BeatDetector::new();
        info!("MAX30102 ready at 0x{:02X}", self.addr);
        Ok(())
    }

    /// Drain the FIFO into the beat detector and return the current rate.
    pub fn read<I: I2c>(&mut self, i2c: &mut I) -> Result<u16, SensorError> {
        let wr = self.read_reg(i2c, REG_FIFO_WR_PTR)? as usize & 0x1F;
        let rd = self.read_reg(i2c, REG_FIFO_RD_PTR)? as usize & 0x1F;
        let pending = (wr + FIFO_DEPTH - rd) % FIFO_DEPTH;

        if pending > 0 {
            let mut buf = [0u8; FIFO_DEPTH * BYTES_PER_ENTRY];
            let bytes = &mut buf[..pending * BYTES_PER_ENTRY];
            i2c.write_read(self.addr, &[REG_FIFO_DATA], bytes)
                .map_err(|e| i2c_error(&e))?;
            for entry in bytes.chunks_exact(BYTES_PER_ENTRY) {
                self.beats.push(sample_18bit(&entry[3..6]));
            }
        }
        self.beats.bpm()
    }

    fn read_reg<I: I2c>(&self, i2c: &mut I, reg: u8) -> Result<u8, SensorError> {
        let mut v = [0u8; 1];
        i2c.write_read(self.addr, &[reg], &mut v)
            .map_err(|e| i2c_error(&e))?;
        Ok(v[0])
    }

    fn write_reg<I: I2c>(&self, i2c: &mut I, reg: u8, value: u8) -> Result<(), SensorError> {
        i2c.write(self.addr, &[reg, value])
            .map_err(|e| i2c_error(&e))
    }
}

fn sample_18bit(b: &[u8]) -> u32 {
    ((u32::from(b[0]) << 16) | (u32::from(b[1]) << 8) | u32::from(b[2])) & 0x3_FFFF
}
