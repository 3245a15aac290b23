//! NVS (Non-Volatile Storage) adapter.
//!
//! Implements [`ConfigPort`], [`StoragePort`] and [`StatePort`] for the
//! alarm controller.
//!
//! - Config validation: every field is checked before persistence.
//! - Alarm state: a one-byte blob, rewritten on every transition.
//! - Atomic writes: ESP-IDF NVS commits are atomic per `nvs_commit()`.
//!
//! On host targets the backend is an in-memory map.

use crate::app::ports::{
    ConfigError, ConfigPort, StatePort, StorageError, StoragePort,
};
use crate::config::{AlarmConfig, Code, STATUS_CODE};
use crate::fsm::StateId;
use log::{info, warn};

#[cfg(not(target_os = "espidf"))]
use std::collections::HashMap;

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

const NAMESPACE: &str = "alarm";
const CONFIG_KEY: &str = "cfg";
const STATE_KEY: &str = "state";

#[cfg(target_os = "espidf")]
const MAX_BLOB_SIZE: usize = 512;

pub struct NvsAdapter {
    #[cfg(not(target_os = "espidf"))]
    store: std::cell::RefCell<HashMap<String, Vec<u8>>>,
}

impl NvsAdapter {
    /// Create a new NvsAdapter and initialise NVS flash.
    ///
    /// Returns `Err(ConfigError::IoError)` if flash initialisation fails
    /// unrecoverably.  On first boot or after a version mismatch the NVS
    /// partition is erased and re-initialised automatically.
    pub fn new() -> Result<Self, ConfigError> {
        #[cfg(target_os = "espidf")]
        {
            // SAFETY: nvs_flash_init / nvs_flash_erase are called from the
            // single main-task context before any concurrent NVS access.
            let ret = unsafe { nvs_flash_init() };
            if ret == ESP_ERR_NVS_NO_FREE_PAGES || ret == ESP_ERR_NVS_NEW_VERSION_FOUND {
                warn!("NVS: erasing and re-initialising flash partition");
                if unsafe { nvs_flash_erase() } != ESP_OK {
                    return Err(ConfigError::IoError);
                }
                if unsafe { nvs_flash_init() } != ESP_OK {
                    return Err(ConfigError::IoError);
                }
            } else if ret != ESP_OK {
                return Err(ConfigError::IoError);
            }
            info!("NvsAdapter: ESP-IDF NVS initialised");
        }

        #[cfg(not(target_os = "espidf"))]
        info!("NvsAdapter: simulation backend");

        Ok(Self {
            #[cfg(not(target_os = "espidf"))]
            store: std::cell::RefCell::new(HashMap::new()),
        })
    }

    /// Erase the stored config blob so the next load falls back to
    /// defaults.  Used when the blob no longer decodes.
    pub fn discard_config(&mut self) -> Result<(), StorageError> {
        self.delete(NAMESPACE, CONFIG_KEY)?;
        warn!("NvsAdapter: stored config discarded");
        Ok(())
    }

    #[cfg(not(target_os = "espidf"))]
    fn composite_key(namespace: &str, key: &str) -> String {
        format!("{}::{}", namespace, key)
    }

    /// NUL-terminated copy of an NVS name (15 bytes max).
    #[cfg(target_os = "espidf")]
    fn c_name(name: &str) -> [u8; 16] {
        let mut buf = [0u8; 16];
        let bytes = name.as_bytes();
        let len = bytes.len().min(15);
        buf[..len].copy_from_slice(&bytes[..len]);
        buf
    }

    /// Open an NVS namespace, execute a closure with the handle, then close.
    #[cfg(target_os = "espidf")]
    fn with_nvs_handle<F, T>(namespace: &str, write: bool, f: F) -> Result<T, i32>
    where
        F: FnOnce(nvs_handle_t) -> Result<T, i32>,
    {
        let ns = Self::c_name(namespace);
        let mut handle: nvs_handle_t = 0;
        let mode = if write {
            nvs_open_mode_t_NVS_READWRITE
        } else {
            nvs_open_mode_t_NVS_READONLY
        };

        // SAFETY: `ns` is NUL-terminated and outlives the call.
        let ret = unsafe { nvs_open(ns.as_ptr() as *const _, mode, &mut handle) };
        if ret != ESP_OK {
            return Err(ret);
        }

        let result = f(handle);
        // SAFETY: handle was opened above and is closed exactly once.
        unsafe {
            nvs_close(handle);
        }
        result
    }
}

// ── Validation ────────────────────────────────────────────────

fn validate_code(code: &Code) -> Result<(), ConfigError> {
    if code.is_empty() {
        return Err(ConfigError::ValidationFailed("command codes must not be empty"));
    }
    if code.as_bytes().contains(&0) {
        return Err(ConfigError::ValidationFailed("command codes must not contain NUL"));
    }
    if code.as_str() == STATUS_CODE {
        return Err(ConfigError::ValidationFailed(
            "command codes must differ from the status token",
        ));
    }
    Ok(())
}

fn validate_config(cfg: &AlarmConfig) -> Result<(), ConfigError> {
    if !(1_000..=600_000).contains(&cfg.arm_delay_ms) {
        return Err(ConfigError::ValidationFailed(
            "arm_delay_ms must be 1000-600000",
        ));
    }
    if !(1_000..=600_000).contains(&cfg.alarm_delay_ms) {
        return Err(ConfigError::ValidationFailed(
            "alarm_delay_ms must be 1000-600000",
        ));
    }
    if !(10..=2_000).contains(&cfg.confirm_offset_ms) {
        return Err(ConfigError::ValidationFailed(
            "confirm_offset_ms must be 10-2000",
        ));
    }
    if cfg.realert_interval_ms < cfg.confirm_offset_ms || cfg.realert_interval_ms > 600_000 {
        return Err(ConfigError::ValidationFailed(
            "realert_interval_ms must be confirm_offset_ms-600000",
        ));
    }
    if cfg.tick_interval_ms == 0 || cfg.tick_interval_ms >= cfg.confirm_offset_ms {
        return Err(ConfigError::ValidationFailed(
            "tick_interval_ms must be > 0 and < confirm_offset_ms",
        ));
    }
    if !(1_000..=300_000).contains(&cfg.wifi_timeout_ms) {
        return Err(ConfigError::ValidationFailed(
            "wifi_timeout_ms must be 1000-300000",
        ));
    }
    if cfg.max_requests_per_tick == 0 {
        return Err(ConfigError::ValidationFailed(
            "max_requests_per_tick must be > 0",
        ));
    }
    if cfg.udp_port == 0 || cfg.notify_port == 0 {
        return Err(ConfigError::ValidationFailed("ports must be non-zero"));
    }

    let codes = &cfg.codes;
    validate_code(&codes.arm_countdown)?;
    validate_code(&codes.arm_immediate)?;
    validate_code(&codes.disarm)?;
    if codes.arm_countdown == codes.arm_immediate
        || codes.arm_countdown == codes.disarm
        || codes.arm_immediate == codes.disarm
    {
        return Err(ConfigError::ValidationFailed(
            "command codes must be distinct",
        ));
    }
    Ok(())
}

// ── ConfigPort ────────────────────────────────────────────────

impl ConfigPort for NvsAdapter {
    fn load(&self) -> Result<AlarmConfig, ConfigError> {
        #[cfg(not(target_os = "espidf"))]
        {
            let key = Self::composite_key(NAMESPACE, CONFIG_KEY);
            if let Some(bytes) = self.store.borrow().get(&key) {
                let cfg: AlarmConfig =
                    postcard::from_bytes(bytes).map_err(|_| ConfigError::Corrupted)?;
                info!("NvsAdapter: loaded config from store");
                Ok(cfg)
            } else {
                info!("NvsAdapter: no stored config, using defaults");
                Ok(AlarmConfig::default())
            }
        }

        #[cfg(target_os = "espidf")]
        {
            let result = Self::with_nvs_handle(NAMESPACE, false, |handle| {
                let key = Self::c_name(CONFIG_KEY);
                let mut size: usize = 0;

                // First call: get size
                let ret = unsafe {
                    nvs_get_blob(
                        handle,
                        key.as_ptr() as *const _,
                        core::ptr::null_mut(),
                        &mut size,
                    )
                };
                if ret == ESP_ERR_NVS_NOT_FOUND {
                    return Err(ESP_ERR_NVS_NOT_FOUND);
                }
                if ret != ESP_OK || size == 0 || size > MAX_BLOB_SIZE {
                    return Err(ret);
                }

                let mut buf = vec![0u8; size];
                let ret = unsafe {
                    nvs_get_blob(
                        handle,
                        key.as_ptr() as *const _,
                        buf.as_mut_ptr() as *mut _,
                        &mut size,
                    )
                };
                if ret != ESP_OK {
                    return Err(ret);
                }

                Ok(buf)
            });

            match result {
                Ok(bytes) => {
                    let cfg: AlarmConfig =
                        postcard::from_bytes(&bytes).map_err(|_| ConfigError::Corrupted)?;
                    info!("NvsAdapter: loaded config from NVS ({} bytes)", bytes.len());
                    Ok(cfg)
                }
                Err(e) if e == ESP_ERR_NVS_NOT_FOUND => {
                    info!("NvsAdapter: no stored config, using defaults");
                    Ok(AlarmConfig::default())
                }
                Err(e) => {
                    warn!("NvsAdapter: NVS read error {}, using defaults", e);
                    Ok(AlarmConfig::default())
                }
            }
        }
    }

    fn save(&self, config: &AlarmConfig) -> Result<(), ConfigError> {
        validate_config(config)?;
        let bytes = postcard::to_allocvec(config).map_err(|_| ConfigError::IoError)?;

        #[cfg(not(target_os = "espidf"))]
        {
            let key = Self::composite_key(NAMESPACE, CONFIG_KEY);
            self.store.borrow_mut().insert(key, bytes);
            info!("NvsAdapter: config saved (simulation)");
            Ok(())
        }

        #[cfg(target_os = "espidf")]
        {
            let result = Self::with_nvs_handle(NAMESPACE, true, |handle| {
                let key = Self::c_name(CONFIG_KEY);
                let ret = unsafe {
                    nvs_set_blob(
                        handle,
                        key.as_ptr() as *const _,
                        bytes.as_ptr() as *const _,
                        bytes.len(),
                    )
                };
                if ret != ESP_OK {
                    return Err(ret);
                }
                let ret = unsafe { nvs_commit(handle) };
                if ret != ESP_OK {
                    return Err(ret);
                }
                Ok(())
            });
            match result {
                Ok(()) => {
                    info!("NvsAdapter: config saved to NVS ({} bytes)", bytes.len());
                    Ok(())
                }
                Err(e) => {
                    warn!("NvsAdapter: NVS write error {}", e);
                    Err(ConfigError::IoError)
                }
            }
        }
    }
}

// ── StoragePort ───────────────────────────────────────────────

impl StoragePort for NvsAdapter {
    fn read(&self, namespace: &str, key: &str, buf: &mut [u8]) -> Result<usize, StorageError> {
        #[cfg(not(target_os = "espidf"))]
        {
            let composite = Self::composite_key(namespace, key);
            match self.store.borrow().get(&composite) {
                Some(data) => {
                    let len = data.len().min(buf.len());
                    buf[..len].copy_from_slice(&data[..len]);
                    Ok(len)
                }
                None => Err(StorageError::NotFound),
            }
        }

        #[cfg(target_os = "espidf")]
        {
            let result = Self::with_nvs_handle(namespace, false, |handle| {
                let key = Self::c_name(key);
                let mut size = buf.len();
                let ret = unsafe {
                    nvs_get_blob(
                        handle,
                        key.as_ptr() as *const _,
                        buf.as_mut_ptr() as *mut _,
                        &mut size,
                    )
                };
                if ret != ESP_OK {
                    return Err(ret);
                }
                Ok(size)
            });
            match result {
                Ok(size) => Ok(size),
                Err(e) if e == ESP_ERR_NVS_NOT_FOUND => Err(StorageError::NotFound),
                Err(_) => Err(StorageError::IoError),
            }
        }
    }

    fn write(&mut self, namespace: &str, key: &str, data: &[u8]) -> Result<(), StorageError> {
        #[cfg(not(target_os = "espidf"))]
        {
            let composite = Self::composite_key(namespace, key);
            self.store.borrow_mut().insert(composite, data.to_vec());
            Ok(())
        }

        #[cfg(target_os = "espidf")]
        {
            let result = Self::with_nvs_handle(namespace, true, |handle| {
                let key = Self::c_name(key);
                let ret = unsafe {
                    nvs_set_blob(
                        handle,
                        key.as_ptr() as *const _,
                        data.as_ptr() as *const _,
                        data.len(),
                    )
                };
                if ret != ESP_OK {
                    return Err(ret);
                }
                let ret = unsafe { nvs_commit(handle) };
                if ret != ESP_OK {
                    return Err(ret);
                }
                Ok(())
            });
            result.map_err(|e| {
                if e == ESP_ERR_NVS_NOT_ENOUGH_SPACE {
                    StorageError::Full
                } else {
                    StorageError::IoError
                }
            })
        }
    }

    fn delete(&mut self, namespace: &str, key: &str) -> Result<(), StorageError> {
        #[cfg(not(target_os = "espidf"))]
        {
            let composite = Self::composite_key(namespace, key);
            self.store.borrow_mut().remove(&composite);
            Ok(())
        }

        #[cfg(target_os = "espidf")]
        {
            let result = Self::with_nvs_handle(namespace, true, |handle| {
                let key = Self::c_name(key);
                let ret = unsafe { nvs_erase_key(handle, key.as_ptr() as *const _) };
                if ret != ESP_OK && ret != ESP_ERR_NVS_NOT_FOUND {
                    return Err(ret);
                }
                let ret = unsafe { nvs_commit(handle) };
                if ret != ESP_OK {
                    return Err(ret);
                }
                Ok(())
            });
            result.map_err(|_| StorageError::IoError)
        }
    }
}

// ── StatePort ─────────────────────────────────────────────────

impl StatePort for NvsAdapter {
    fn read_persisted_state(&self) -> Result<Option<StateId>, StorageError> {
        // One spare byte so an oversized blob is seen as such.
        let mut buf = [0u8; 2];
        match self.read(NAMESPACE, STATE_KEY, &mut buf) {
            Ok(1) => {
                let state = StateId::from_u8(buf[0]);
                if state.is_none() {
                    warn!("NvsAdapter: unknown state byte 0x{:02x} ignored", buf[0]);
                }
                Ok(state)
            }
            Ok(_) | Err(StorageError::NotFound) => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn write_persisted_state(&mut self, state: StateId) -> Result<(), StorageError> {
        self.write(NAMESPACE, STATE_KEY, &[state.as_u8()])
    }
}

impl Default for NvsAdapter {
    /// Last-resort fallback when flash init fails: the simulation map on
    /// host, an adapter whose calls report I/O errors on target.
    fn default() -> Self {
        Self::new().unwrap_or_else(|_| Self {
            #[cfg(not(target_os = "espidf"))]
            store: std::cell::RefCell::new(HashMap::new()),
        })
    }
}
