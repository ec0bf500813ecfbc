//! ESP32 time adapter.
//!
//! Implements [`Clock`] for the control loop.
//!
//! - **`espidf`**: wraps `esp_timer_get_time()` from the ESP-IDF
//!   high-resolution timer (microsecond precision, monotonic) and sleeps
//!   through FreeRTOS so other tasks keep running.
//! - **host**: uses `std::time::Instant` for simulation.

use crate::app::ports::Clock;

/// Time adapter for the ESP32 platform.
pub struct Esp32TimeAdapter {
    #[cfg(not(feature = "espidf"))]
    start: std::time::Instant,
}

impl Default for Esp32TimeAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl Esp32TimeAdapter {
    pub fn new() -> Self {
        Self {
            #[cfg(not(feature = "espidf"))]
            start: std::time::Instant::now(),
        }
    }

    /// Microseconds since boot (monotonic).
    #[cfg(feature = "espidf")]
    pub fn uptime_us(&self) -> u64 {
        // SAFETY: esp_timer_get_time has no preconditions.
        (unsafe { esp_idf_svc::sys::esp_timer_get_time() }) as u64
    }

    /// Microseconds since adapter creation (monotonic).
    #[cfg(not(feature = "espidf"))]
    pub fn uptime_us(&self) -> u64 {
        self.start.elapsed().as_micros() as u64
    }
}

impl Clock for Esp32TimeAdapter {
    fn now_ms(&self) -> u64 {
        self.uptime_us() / 1_000
    }

    #[cfg(feature = "espidf")]
    fn sleep_ms(&mut self, ms: u64) {
        esp_idf_hal::delay::FreeRtos::delay_ms(ms.min(u64::from(u32::MAX)) as u32);
    }

    #[cfg(not(feature = "espidf"))]
    fn sleep_ms(&mut self, ms: u64) {
        std::thread::sleep(std::time::Duration::from_millis(ms));
    }
}
