//! Task Watchdog Timer (TWDT) driver.
//!
//! Resets the board if the tick loop stops feeding it.  After the reset
//! the persisted state brings the alarm back where it was, so a hung loop
//! costs a few seconds of coverage instead of an unguarded house.

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

use log::{info, warn};

pub struct Watchdog {
    timeout_ms: u32,
    #[cfg(target_os = "espidf")]
    subscribed: bool,
}

impl Watchdog {
    /// Reconfigure the TWDT and subscribe the calling task.
    #[cfg(target_os = "espidf")]
    pub fn subscribe(timeout_ms: u32) -> Self {
        let cfg = esp_task_wdt_config_t {
            timeout_ms,
            idle_core_mask: 0,
            trigger_panic: true,
        };
        // SAFETY: plain FFI calls on the current task, made once from main.
        let ret = unsafe { esp_task_wdt_reconfigure(&cfg) };
        if ret != ESP_OK {
            warn!("Watchdog: reconfigure returned {} (may already be configured)", ret);
        }
        let ret = unsafe { esp_task_wdt_add(core::ptr::null_mut()) };
        let subscribed = ret == ESP_OK;
        if subscribed {
            info!("Watchdog: subscribed ({}ms timeout, panic on trigger)", timeout_ms);
        } else {
            warn!("Watchdog: failed to subscribe ({})", ret);
        }
        Self {
            timeout_ms,
            subscribed,
        }
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn subscribe(timeout_ms: u32) -> Self {
        info!("Watchdog(sim): {}ms timeout, no-op", timeout_ms);
        if timeout_ms == 0 {
            warn!("Watchdog(sim): zero timeout would reset immediately on target");
        }
        Self { timeout_ms }
    }

    pub fn timeout_ms(&self) -> u32 {
        self.timeout_ms
    }

    /// Feed the watchdog.  Call once per tick.
    pub fn feed(&self) {
        #[cfg(target_os = "espidf")]
        if self.subscribed {
            // SAFETY: resets the TWDT entry of the subscribed current task.
            unsafe {
                esp_task_wdt_reset();
            }
        }
    }
}
