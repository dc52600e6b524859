//! Error types for the device core.
//!
//! `DeviceError` is what every handle and registry operation returns. It maps
//! onto `embedded_io::ErrorKind` so handles can be used as generic
//! `embedded_io` readers and writers, and onto POSIX errno values for the
//! descriptor-table surface.

use core::ffi::c_int;

/// Failure reported by a storage backend.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StorageError {
    /// The write would grow the storage past its limit (or past addressable memory)
    #[error("no space left on device: need {requested} bytes, limit is {limit}")]
    NoSpace { requested: u64, limit: u64 },

    /// Backend-specific failure
    #[error("storage failure: {0}")]
    Failed(String),
}

/// Errors returned by device operations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DeviceError {
    /// Path is not in the device table
    #[error("no such device: {0}")]
    NotFound(String),

    /// A device is already registered under this path
    #[error("device already registered: {0}")]
    AlreadyExists(String),

    /// Operation on a closed or never-opened handle
    #[error("invalid or closed handle")]
    InvalidHandle,

    /// Resulting position would be negative or out of range
    #[error("invalid seek: resulting position out of range")]
    InvalidSeek,

    /// Access mode of the handle does not allow the operation
    #[error("permission denied: handle not opened for {0}")]
    Permission(&'static str),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl DeviceError {
    /// POSIX errno equivalent, as a driver would report it to user space
    #[must_use]
    pub fn errno(&self) -> c_int {
        match self {
            Self::NotFound(_) => 2, // ENOENT
            Self::AlreadyExists(_) => 17, // EEXIST
            Self::InvalidHandle | Self::Permission(_) => 9, // EBADF
            Self::InvalidSeek => 22, // EINVAL
            Self::Storage(StorageError::NoSpace { .. }) => 28, // ENOSPC
            Self::Storage(StorageError::Failed(_)) => 5, // EIO
        }
    }
}

impl embedded_io::Error for DeviceError {
    fn kind(&self) -> embedded_io::ErrorKind {
        match self {
            Self::NotFound(_) => embedded_io::ErrorKind::NotFound,
            Self::AlreadyExists(_) => embedded_io::ErrorKind::AlreadyExists,
            Self::InvalidHandle | Self::InvalidSeek => embedded_io::ErrorKind::InvalidInput,
            Self::Permission(_) => embedded_io::ErrorKind::PermissionDenied,
            Self::Storage(StorageError::NoSpace { .. }) => embedded_io::ErrorKind::OutOfMemory,
            Self::Storage(StorageError::Failed(_)) => embedded_io::ErrorKind::Other,
        }
    }
}

/// Errors raised while loading or validating a [`crate::DriverConfig`]
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("device count {0} out of range 1..={max}", max = crate::config::MAX_DEVICES)]
    InvalidCount(usize),

    #[error("device base name must not be empty")]
    EmptyBasename,

    #[error("initial capacity {capacity} exceeds limit {limit}")]
    InvalidCapacity { capacity: usize, limit: usize },

    #[error("failed to read config: {0}")]
    Read(&'static str),

    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config JSON: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Convert error kind to a static string description
#[must_use]
pub fn error_kind_to_str(kind: embedded_io::ErrorKind) -> &'static str {
    match kind {
        embedded_io::ErrorKind::NotFound => "not found",
        embedded_io::ErrorKind::PermissionDenied => "permission denied",
        embedded_io::ErrorKind::BrokenPipe => "broken pipe",
        embedded_io::ErrorKind::AlreadyExists => "already exists",
        embedded_io::ErrorKind::InvalidInput => "invalid input",
        embedded_io::ErrorKind::InvalidData => "invalid data",
        embedded_io::ErrorKind::TimedOut => "timed out",
        embedded_io::ErrorKind::Interrupted => "interrupted",
        embedded_io::ErrorKind::Unsupported => "unsupported",
        embedded_io::ErrorKind::OutOfMemory => "out of memory",
        embedded_io::ErrorKind::Other => "other error",
        _ => "unknown error",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_io::Error as _;

    #[test]
    fn test_errno_values() {
        assert_eq!(DeviceError::NotFound("/dev/x".into()).errno(), 2);
        assert_eq!(DeviceError::InvalidHandle.errno(), 9);
        assert_eq!(DeviceError::Permission("writing").errno(), 9);
        assert_eq!(DeviceError::InvalidSeek.errno(), 22);
        let no_space = StorageError::NoSpace {
            requested: 10,
            limit: 4,
        };
        assert_eq!(DeviceError::from(no_space).errno(), 28);
    }

    #[test]
    fn test_error_kind_mapping() {
        assert_eq!(
            DeviceError::Permission("reading").kind(),
            embedded_io::ErrorKind::PermissionDenied
        );
        assert_eq!(
            DeviceError::InvalidSeek.kind(),
            embedded_io::ErrorKind::InvalidInput
        );
        assert_eq!(
            error_kind_to_str(DeviceError::NotFound("p".into()).kind()),
            "not found"
        );
    }

    #[test]
    fn test_display() {
        let err = DeviceError::NotFound("/dev/poums9".to_string());
        assert_eq!(err.to_string(), "no such device: /dev/poums9");
        let err = ConfigError::InvalidCount(9);
        assert_eq!(err.to_string(), "device count 9 out of range 1..=8");
    }
}
