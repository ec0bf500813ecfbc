//! Heart-rate bounds check.

use serde::{Deserialize, Serialize};

/// Inclusive normal range in beats per minute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeartRateBounds {
    pub lower: u16,
    pub upper: u16,
}

impl Default for HeartRateBounds {
    fn default() -> Self {
        Self {
            lower: 40,
            upper: 120,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct VitalsMonitor {
    bounds: HeartRateBounds,
}

impl VitalsMonitor {
    pub const fn new(bounds: HeartRateBounds) -> Self {
        Self { bounds }
    }

    /// `true` = abnormal.  Both bounds are themselves normal.
    pub fn check(&self, rate: u16) -> bool {
        rate < self.bounds.lower || rate > self.bounds.upper
    }
}
