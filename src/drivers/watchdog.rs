//! Task Watchdog Timer (TWDT) driver.
//!
//! Resets the device if the control loop stops feeding it.  The loop
//! feeds once per tick, so the timeout only needs to cover the slowest
//! plausible tick plus margin.

#[cfg(feature = "espidf")]
use esp_idf_svc::sys::{
    ESP_OK, esp_task_wdt_add, esp_task_wdt_config_t, esp_task_wdt_reconfigure,
    esp_task_wdt_reset,
};
use log::info;

/// Never arm the watchdog tighter than this.
pub const MIN_TIMEOUT_MS: u32 = 2_000;

/// Timeout for a given control-loop period: twenty periods, at least
/// [`MIN_TIMEOUT_MS`].
pub fn timeout_for_tick(tick_period_ms: u32) -> u32 {
    tick_period_ms.saturating_mul(20).max(MIN_TIMEOUT_MS)
}

pub struct Watchdog {
    subscribed: bool,
    timeout_ms: u32,
}

impl Watchdog {
    /// Configure the TWDT and subscribe the calling task.
    #[cfg(feature = "espidf")]
    pub fn new(timeout_ms: u32) -> Self {
        let cfg = esp_task_wdt_config_t {
            timeout_ms,
            idle_core_mask: 0,
            trigger_panic: true,
        };
        // SAFETY: plain FFI calls made once from the main task.
        let ret = unsafe { esp_task_wdt_reconfigure(&cfg) };
        if ret != ESP_OK {
            log::warn!("TWDT reconfigure returned {} (may already be configured)", ret);
        }
        let ret = unsafe { esp_task_wdt_add(core::ptr::null_mut()) };
        let subscribed = ret == ESP_OK;
        if subscribed {
            info!("Watchdog: subscribed ({} ms timeout, panic on trigger)", timeout_ms);
        } else {
            log::warn!("Watchdog: failed to subscribe ({})", ret);
        }
        Self {
            subscribed,
            timeout_ms,
        }
    }

    #[cfg(not(feature = "espidf"))]
    pub fn new(timeout_ms: u32) -> Self {
        info!("Watchdog(sim): {} ms, no-op", timeout_ms);
        Self {
            subscribed: false,
            timeout_ms,
        }
    }

    pub fn timeout_ms(&self) -> u32 {
        self.timeout_ms
    }

    pub fn is_armed(&self) -> bool {
        self.subscribed
    }

    /// Feed the watchdog.
    pub fn feed(&self) {
        #[cfg(feature = "espidf")]
        if self.subscribed {
            // SAFETY: the calling task was subscribed in `new`.
            unsafe {
                esp_task_wdt_reset();
            }
        }
    }
}
