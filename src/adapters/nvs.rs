//! NVS (Non-Volatile Storage) adapter.
//!
//! Implements both [`ConfigPort`] and [`StoragePort`].
//!
//! - The config lives in the `safex` namespace as a postcard blob.
//! - Configs are validated before they are written and after they are
//!   read.  An undecodable blob is `Corrupted`; a decodable one that
//!   fails validation is `ValidationFailed`, which is fatal at boot.
//! - On ESP-IDF each call opens the namespace on the default partition;
//!   commits are atomic.  The host build keeps an in-memory map.

use log::{info, warn};

use crate::app::ports::{ConfigError, ConfigPort, StorageError, StoragePort};
use crate::config::SystemConfig;

#[cfg(not(feature = "espidf"))]
use std::collections::HashMap;

#[cfg(feature = "espidf")]
use esp_idf_svc::nvs::{EspDefaultNvsPartition, EspNvs, NvsDefault};

const CONFIG_NAMESPACE: &str = "safex";
const CONFIG_KEY: &str = "syscfg";

/// Upper bound for the config blob.
const MAX_BLOB_SIZE: usize = 512;

pub struct NvsAdapter {
    #[cfg(feature = "espidf")]
    partition: EspDefaultNvsPartition,
    #[cfg(not(feature = "espidf"))]
    store: std::cell::RefCell<HashMap<String, Vec<u8>>>,
}

impl NvsAdapter {
    /// Take the default NVS partition.
    #[cfg(feature = "espidf")]
    pub fn new() -> Result<Self, ConfigError> {
        let partition = EspDefaultNvsPartition::take().map_err(|e| {
            warn!("NvsAdapter: default partition unavailable: {}", e);
            ConfigError::IoError
        })?;
        info!("NvsAdapter: ESP-IDF NVS initialised");
        Ok(Self { partition })
    }

    #[cfg(not(feature = "espidf"))]
    pub fn new() -> Result<Self, ConfigError> {
        info!("NvsAdapter: simulation backend");
        Ok(Self {
            store: std::cell::RefCell::new(HashMap::new()),
        })
    }

    #[cfg(feature = "espidf")]
    fn open(&self, namespace: &str, write: bool) -> Result<EspNvs<NvsDefault>, StorageError> {
        EspNvs::new(self.partition.clone(), namespace, write).map_err(|_| StorageError::IoError)
    }

    #[cfg(not(feature = "espidf"))]
    fn composite_key(namespace: &str, key: &str) -> String {
        format!("{}::{}", namespace, key)
    }
}

impl ConfigPort for NvsAdapter {
    fn load(&self) -> Result<SystemConfig, ConfigError> {
        let mut buf = [0u8; MAX_BLOB_SIZE];
        let len = match self.read(CONFIG_NAMESPACE, CONFIG_KEY, &mut buf) {
            Ok(len) => len,
            Err(StorageError::NotFound) => {
                info!("NvsAdapter: no stored config, using defaults");
                return Ok(SystemConfig::default());
            }
            Err(e) => {
                warn!("NvsAdapter: config read failed: {}", e);
                return Err(e.into());
            }
        };
        let cfg: SystemConfig =
            postcard::from_bytes(&buf[..len]).map_err(|_| ConfigError::Corrupted)?;
        // Decodes but out of range: keep the field name for the caller.
        cfg.validate().inspect_err(|e| {
            warn!("NvsAdapter: stored config invalid: {}", e);
        })?;
        info!("NvsAdapter: loaded config ({} bytes)", len);
        Ok(cfg)
    }

    fn save(&self, config: &SystemConfig) -> Result<(), ConfigError> {
        config.validate()?;
        let bytes = postcard::to_allocvec(config).map_err(|_| ConfigError::IoError)?;
        if bytes.len() > MAX_BLOB_SIZE {
            return Err(ConfigError::StorageFull);
        }

        #[cfg(not(feature = "espidf"))]
        {
            let key = Self::composite_key(CONFIG_NAMESPACE, CONFIG_KEY);
            self.store.borrow_mut().insert(key, bytes);
            info!("NvsAdapter: config saved (simulation)");
            Ok(())
        }

        #[cfg(feature = "espidf")]
        {
            let mut nvs = self.open(CONFIG_NAMESPACE, true)?;
            nvs.set_blob(CONFIG_KEY, &bytes).map_err(|e| {
                warn!("NvsAdapter: NVS write error {}", e);
                ConfigError::IoError
            })?;
            info!("NvsAdapter: config saved to NVS ({} bytes)", bytes.len());
            Ok(())
        }
    }
}

impl StoragePort for NvsAdapter {
    fn read(&self, namespace: &str, key: &str, buf: &mut [u8]) -> Result<usize, StorageError> {
        #[cfg(not(feature = "espidf"))]
        {
            let composite = Self::composite_key(namespace, key);
            let store = self.store.borrow();
            let data = store.get(&composite).ok_or(StorageError::NotFound)?;
            let dst = buf.get_mut(..data.len()).ok_or(StorageError::BufferTooSmall)?;
            dst.copy_from_slice(data);
            Ok(data.len())
        }

        #[cfg(feature = "espidf")]
        {
            let nvs = self.open(namespace, false)?;
            match nvs.blob_len(key) {
                Ok(Some(len)) if len > buf.len() => return Err(StorageError::BufferTooSmall),
                Ok(Some(_)) => {}
                Ok(None) => return Err(StorageError::NotFound),
                Err(_) => return Err(StorageError::IoError),
            }
            match nvs.get_blob(key, buf) {
                Ok(Some(data)) => Ok(data.len()),
                Ok(None) => Err(StorageError::NotFound),
                Err(_) => Err(StorageError::IoError),
            }
        }
    }

    fn write(&mut self, namespace: &str, key: &str, data: &[u8]) -> Result<(), StorageError> {
        #[cfg(not(feature = "espidf"))]
        {
            let composite = Self::composite_key(namespace, key);
            self.store.borrow_mut().insert(composite, data.to_vec());
            Ok(())
        }

        #[cfg(feature = "espidf")]
        {
            let mut nvs = self.open(namespace, true)?;
            nvs.set_blob(key, data).map_err(|_| StorageError::IoError)
        }
    }

    fn delete(&mut self, namespace: &str, key: &str) -> Result<(), StorageError> {
        #[cfg(not(feature = "espidf"))]
        {
            let composite = Self::composite_key(namespace, key);
            self.store.borrow_mut().remove(&composite);
            Ok(())
        }

        #[cfg(feature = "espidf")]
        {
            let mut nvs = self.open(namespace, true)?;
            nvs.remove(key).map(|_| ()).map_err(|_| StorageError::IoError)
        }
    }

    fn exists(&self, namespace: &str, key: &str) -> bool {
        #[cfg(not(feature = "espidf"))]
        {
            let composite = Self::composite_key(namespace, key);
            self.store.borrow().contains_key(&composite)
        }

        #[cfg(feature = "espidf")]
        {
            self.open(namespace, false)
                .and_then(|nvs| nvs.contains(key).map_err(|_| StorageError::IoError))
                .unwrap_or(false)
        }
    }
}
