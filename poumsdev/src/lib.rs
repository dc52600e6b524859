pub mod blockcopy;
pub mod config;
pub mod device;
pub mod error;
pub mod fdtable;
pub mod handle;
pub mod idgen;
pub mod io;
pub mod registry;

// Re-export handle types for convenience
pub use handle::{AccessMode, DeviceHandle, OpenFlags, Whence};

// Re-export device table types for convenience
pub use device::Device;
pub use fdtable::FdTable;
pub use registry::DeviceRegistry;

// Re-export storage types for convenience
pub use io::{MemStorage, StorageBackend};

pub use blockcopy::{copy_to_eof, CopyError, CopyStats, DEFAULT_BLOCK_SIZE};
pub use config::DriverConfig;
pub use error::{ConfigError, DeviceError, StorageError};
pub use idgen::{HandleId, IdGen};
