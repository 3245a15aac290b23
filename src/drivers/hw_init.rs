//! One-shot hardware peripheral initialization and GPIO helpers.
//!
//! Configures the PIR sensor inputs and the siren output using raw
//! ESP-IDF sys calls.  Called once from `main()` before the tick loop.
//!
//! On host targets the pins are simulated by an array of atomics so that
//! tests can drive sensor levels and observe the siren output.

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

#[cfg(not(target_os = "espidf"))]
use core::sync::atomic::{AtomicBool, Ordering};

// ── Error type ────────────────────────────────────────────────

/// Errors during one-shot peripheral initialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HwInitError {
    GpioConfigFailed(i32),
}

impl core::fmt::Display for HwInitError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::GpioConfigFailed(rc) => write!(f, "GPIO config failed (rc={})", rc),
        }
    }
}

#[cfg(target_os = "espidf")]
use log::info;

#[cfg(target_os = "espidf")]
use crate::pins;

#[cfg(target_os = "espidf")]
pub fn init_peripherals() -> Result<(), HwInitError> {
    // SAFETY: Called once from main() before the tick loop; single-threaded.
    unsafe {
        init_gpio_inputs()?;
        init_gpio_outputs()?;
    }
    info!("hw_init: all peripherals configured");
    Ok(())
}

#[cfg(not(target_os = "espidf"))]
pub fn init_peripherals() -> Result<(), HwInitError> {
    log::info!("hw_init(sim): peripheral init skipped");
    Ok(())
}

// ── GPIO simulation (host) ────────────────────────────────────

#[cfg(not(target_os = "espidf"))]
const SIM_GPIO_COUNT: usize = 49;

#[cfg(not(target_os = "espidf"))]
static SIM_GPIO_LEVELS: [AtomicBool; SIM_GPIO_COUNT] =
    [const { AtomicBool::new(false) }; SIM_GPIO_COUNT];

/// Drive a simulated input pin.  Out-of-range pins are ignored.
#[cfg(not(target_os = "espidf"))]
pub fn sim_set_level(pin: i32, high: bool) {
    if let Some(level) = usize::try_from(pin).ok().and_then(|p| SIM_GPIO_LEVELS.get(p)) {
        level.store(high, Ordering::Relaxed);
    }
}

// ── GPIO Inputs ───────────────────────────────────────────────

#[cfg(target_os = "espidf")]
unsafe fn init_gpio_inputs() -> Result<(), HwInitError> {
    for sensor in &pins::MOTION_SENSORS {
        // PIR modules drive the line actively; no pulls.
        let cfg = gpio_config_t {
            pin_bit_mask: 1u64 << sensor.gpio,
            mode: gpio_mode_t_GPIO_MODE_INPUT,
            pull_up_en: gpio_pullup_t_GPIO_PULLUP_DISABLE,
            pull_down_en: gpio_pulldown_t_GPIO_PULLDOWN_DISABLE,
            intr_type: gpio_int_type_t_GPIO_INTR_DISABLE,
        };
        let ret = unsafe { gpio_config(&cfg) };
        if ret != ESP_OK as i32 {
            return Err(HwInitError::GpioConfigFailed(ret));
        }
    }
    info!("hw_init: {} PIR inputs configured", pins::MOTION_SENSORS.len());
    Ok(())
}

#[cfg(target_os = "espidf")]
pub fn gpio_read(pin: i32) -> bool {
    // SAFETY: gpio_get_level is a read-only register access on an
    // already-configured input pin; safe to call from main context.
    (unsafe { gpio_get_level(pin) }) != 0
}

#[cfg(not(target_os = "espidf"))]
pub fn gpio_read(pin: i32) -> bool {
    usize::try_from(pin)
        .ok()
        .and_then(|p| SIM_GPIO_LEVELS.get(p))
        .is_some_and(|level| level.load(Ordering::Relaxed))
}

// ── GPIO Outputs ──────────────────────────────────────────────

#[cfg(target_os = "espidf")]
unsafe fn init_gpio_outputs() -> Result<(), HwInitError> {
    let cfg = gpio_config_t {
        pin_bit_mask: 1u64 << pins::SIREN_GPIO,
        mode: gpio_mode_t_GPIO_MODE_OUTPUT,
        pull_up_en: gpio_pullup_t_GPIO_PULLUP_DISABLE,
        pull_down_en: gpio_pulldown_t_GPIO_PULLDOWN_DISABLE,
        intr_type: gpio_int_type_t_GPIO_INTR_DISABLE,
    };
    let ret = unsafe { gpio_config(&cfg) };
    if ret != ESP_OK as i32 {
        return Err(HwInitError::GpioConfigFailed(ret));
    }
    // Siren stays silent until the restored state says otherwise.
    unsafe { gpio_set_level(pins::SIREN_GPIO, 0) };
    Ok(())
}

/// Drive an output pin.  Returns the ESP-IDF error code on failure.
#[cfg(target_os = "espidf")]
pub fn gpio_write(pin: i32, high: bool) -> Result<(), i32> {
    // SAFETY: gpio_set_level writes to an already-configured output pin;
    // pin was validated during init_gpio_outputs(). Main-loop only.
    let ret = unsafe { gpio_set_level(pin, u32::from(high)) };
    if ret == ESP_OK as i32 { Ok(()) } else { Err(ret) }
}

/// Drive an output pin.  On host the level is readable via [`gpio_read`].
#[cfg(not(target_os = "espidf"))]
pub fn gpio_write(pin: i32, high: bool) -> Result<(), i32> {
    sim_set_level(pin, high);
    Ok(())
}
