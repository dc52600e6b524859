//! Driver configuration
//!
//! Mirrors the module parameters of a char-device driver: how many devices
//! to create and how to name them. Can be loaded from JSON:
//!
//! ```json
//! { "count": 2, "basename": "poums", "dir": "/dev", "max_size": 65536 }
//! ```
//!
//! Missing keys fall back to the defaults.

use serde::Deserialize;
use std::path::Path;

use crate::error::ConfigError;

/// Maximum number of devices a registry may create
pub const MAX_DEVICES: usize = 8;
pub const DEFAULT_BASENAME: &str = "poums";
pub const DEFAULT_DIR: &str = "/dev";
/// Bytes preallocated per device
pub const DEFAULT_CAPACITY: usize = 4096;
/// Upper bound on the per-device preallocation
pub const MAX_INITIAL_CAPACITY: usize = 1 << 20;

#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct DriverConfig {
    /// Number of devices, `1..=MAX_DEVICES`
    pub count: usize,
    pub basename: String,
    pub dir: String,
    pub initial_capacity: usize,
    /// Per-device size limit; `None` means unbounded
    pub max_size: Option<usize>,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            count: 1,
            basename: DEFAULT_BASENAME.to_string(),
            dir: DEFAULT_DIR.to_string(),
            initial_capacity: DEFAULT_CAPACITY,
            max_size: None,
        }
    }
}

impl DriverConfig {
    /// Reads JSON config from a reader and validates it.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - There are I/O errors reading from the provided reader
    /// - The JSON input is invalid or has unknown keys
    /// - The resulting config fails [`validate`](Self::validate)
    pub fn from_reader(mut reader: impl embedded_io::Read) -> Result<Self, ConfigError> {
        let mut buffer = Vec::new();
        let mut chunk = [0u8; 1024];
        loop {
            match embedded_io::Read::read(&mut reader, &mut chunk) {
                Ok(0) => break,
                Ok(n) => buffer.extend_from_slice(&chunk[..n]),
                Err(e) => {
                    let kind = embedded_io::Error::kind(&e);
                    return Err(ConfigError::Read(crate::error::error_kind_to_str(kind)));
                }
            }
        }
        Self::from_slice(&buffer)
    }

    /// Reads JSON config from a file and validates it.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let data = std::fs::read(path)?;
        Self::from_slice(&data)
    }

    fn from_slice(data: &[u8]) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_slice(data)?;
        config.validate()?;
        Ok(config)
    }

    /// Check the device count range, the base name and the preallocation
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.count == 0 || self.count > MAX_DEVICES {
            return Err(ConfigError::InvalidCount(self.count));
        }
        if self.basename.is_empty() {
            return Err(ConfigError::EmptyBasename);
        }
        let limit = self
            .max_size
            .map_or(MAX_INITIAL_CAPACITY, |max| max.min(MAX_INITIAL_CAPACITY));
        if self.initial_capacity > limit {
            return Err(ConfigError::InvalidCapacity {
                capacity: self.initial_capacity,
                limit,
            });
        }
        Ok(())
    }

    /// Path of the device with the given minor number, e.g. `/dev/poums0`
    #[must_use]
    pub fn device_path(&self, minor: u32) -> String {
        let dir = self.dir.trim_end_matches('/');
        format!("{dir}/{}{minor}", self.basename)
    }
}
