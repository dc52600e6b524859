//! Device table keyed by path
//!
//! The registry owns every device of the driver. It is created from a
//! [`DriverConfig`], which populates `/dev/poums0..poums{count-1}` with
//! in-memory storage, and torn down explicitly with [`DeviceRegistry::teardown`].

use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

use crate::config::DriverConfig;
use crate::device::Device;
use crate::error::{ConfigError, DeviceError};
use crate::handle::{DeviceHandle, OpenFlags};
use crate::idgen::IdGen;
use crate::io::{MemStorage, StorageBackend};

struct Table {
    devices: HashMap<String, Arc<Device>>,
    next_minor: u32,
}

pub struct DeviceRegistry {
    config: DriverConfig,
    table: Mutex<Table>,
    ids: IdGen,
}

impl DeviceRegistry {
    /// Create a registry and populate it with `config.count` devices
    ///
    /// # Errors
    ///
    /// Returns an error if the config does not validate.
    pub fn new(config: DriverConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::populate(config))
    }

    fn populate(config: DriverConfig) -> Self {
        let mut devices = HashMap::new();
        let mut next_minor = 0;
        for _ in 0..config.count {
            let path = config.device_path(next_minor);
            let storage = MemStorage::with_capacity(config.initial_capacity, config.max_size);
            devices.insert(
                path.clone(),
                Arc::new(Device::new(path, next_minor, Box::new(storage))),
            );
            next_minor += 1;
        }
        info!(count = config.count, basename = %config.basename, "devices created");

        Self {
            config,
            table: Mutex::new(Table {
                devices,
                next_minor,
            }),
            ids: IdGen::new(),
        }
    }

    #[must_use]
    pub fn config(&self) -> &DriverConfig {
        &self.config
    }

    /// Open a handle on the device at `path`.
    ///
    /// With the truncate flag set the device is emptied before the handle is
    /// returned, whatever the access mode.
    pub fn open(&self, path: &str, flags: OpenFlags) -> Result<DeviceHandle, DeviceError> {
        let device = self
            .device(path)
            .ok_or_else(|| DeviceError::NotFound(path.to_string()))?;

        if flags.is_truncate() {
            device.truncate()?;
        }

        let handle = DeviceHandle::new(self.ids.get_next(), device, flags);
        debug!(handle = %handle.id(), path = path, ?flags, "opened");
        Ok(handle)
    }

    /// Look up a device by path
    #[must_use]
    pub fn device(&self, path: &str) -> Option<Arc<Device>> {
        self.table.lock().devices.get(path).cloned()
    }

    /// Add a device backed by a caller-supplied storage
    pub fn register(
        &self,
        path: &str,
        storage: Box<dyn StorageBackend>,
    ) -> Result<Arc<Device>, DeviceError> {
        let mut table = self.table.lock();
        if table.devices.contains_key(path) {
            return Err(DeviceError::AlreadyExists(path.to_string()));
        }

        let minor = table.next_minor;
        table.next_minor += 1;
        let device = Arc::new(Device::new(path, minor, storage));
        table.devices.insert(path.to_string(), Arc::clone(&device));
        debug!(path = path, minor = minor, "device registered");
        Ok(device)
    }

    /// All device paths, sorted
    #[must_use]
    pub fn paths(&self) -> Vec<String> {
        let table = self.table.lock();
        let mut paths: Vec<String> = table.devices.keys().cloned().collect();
        paths.sort();
        paths
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.table.lock().devices.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.table.lock().devices.is_empty()
    }

    /// Remove all devices. Handles still open keep their device until closed.
    pub fn teardown(&self) {
        let mut table = self.table.lock();
        table.devices.clear();
        info!("devices removed");
    }
}

impl Default for DeviceRegistry {
    fn default() -> Self {
        Self::populate(DriverConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_has_poums0() {
        let registry = DeviceRegistry::default();
        assert_eq!(registry.paths(), vec!["/dev/poums0"]);
        assert!(registry.open("/dev/poums0", OpenFlags::read_only()).is_ok());
    }

    #[test]
    fn test_open_unknown_path() {
        let registry = DeviceRegistry::default();
        let err = registry
            .open("/dev/poums1", OpenFlags::read_only())
            .unwrap_err();
        assert_eq!(err, DeviceError::NotFound("/dev/poums1".to_string()));
    }

    #[test]
    fn test_new_with_count() {
        let config = DriverConfig {
            count: 3,
            ..DriverConfig::default()
        };
        let registry = DeviceRegistry::new(config).unwrap();
        assert_eq!(
            registry.paths(),
            vec!["/dev/poums0", "/dev/poums1", "/dev/poums2"]
        );
        assert_eq!(registry.device("/dev/poums2").unwrap().minor(), 2);
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        let config = DriverConfig {
            count: 0,
            ..DriverConfig::default()
        };
        assert!(DeviceRegistry::new(config).is_err());
    }

    #[test]
    fn test_new_rejects_oversized_capacity() {
        let config = DriverConfig {
            initial_capacity: usize::MAX,
            ..DriverConfig::default()
        };
        assert!(matches!(
            DeviceRegistry::new(config),
            Err(ConfigError::InvalidCapacity { .. })
        ));
    }

    #[test]
    fn test_register_custom_backend() {
        let registry = DeviceRegistry::default();
        let device = registry
            .register("/dev/extra", Box::new(MemStorage::new()))
            .unwrap();
        assert_eq!(device.minor(), 1);

        let err = registry
            .register("/dev/extra", Box::new(MemStorage::new()))
            .unwrap_err();
        assert_eq!(err, DeviceError::AlreadyExists("/dev/extra".to_string()));
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_open_truncate_read_only() {
        let registry = DeviceRegistry::default();
        let mut w = registry
            .open("/dev/poums0", OpenFlags::write_only())
            .unwrap();
        w.write(b"stale").unwrap();
        w.close().unwrap();

        let _ = registry
            .open("/dev/poums0", OpenFlags::read_only().truncate())
            .unwrap();
        assert!(registry.device("/dev/poums0").unwrap().is_empty());
    }

    #[test]
    fn test_teardown() {
        let registry = DeviceRegistry::default();
        let mut h = registry
            .open("/dev/poums0", OpenFlags::read_write())
            .unwrap();

        registry.teardown();
        assert!(registry.is_empty());
        assert!(registry.open("/dev/poums0", OpenFlags::read_only()).is_err());

        // Open handles still work on their device
        h.write(b"still here").unwrap();
        h.seek(0, crate::handle::Whence::Set).unwrap();
        assert_eq!(h.read_to_end().unwrap(), b"still here");
    }
}
