//! File descriptor table
//!
//! Maps small integers to open [`DeviceHandle`]s, giving the syscall-shaped
//! surface (`open`/`read`/`write`/`lseek`/`ftruncate`/`close`) that user-space
//! test clients drive. Descriptors are never reused, so a closed one stays
//! invalid.

use core::ffi::c_int;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::warn;

use crate::error::DeviceError;
use crate::handle::{DeviceHandle, OpenFlags, Whence};
use crate::registry::DeviceRegistry;

pub struct FdTable {
    registry: Arc<DeviceRegistry>,
    /// fd → handle mapping
    table: HashMap<c_int, DeviceHandle>,
    /// Next fd to allocate
    next_fd: c_int,
}

impl FdTable {
    pub fn new(registry: Arc<DeviceRegistry>) -> Self {
        Self {
            registry,
            table: HashMap::new(),
            next_fd: 0,
        }
    }

    fn handle(&mut self, fd: c_int) -> Result<&mut DeviceHandle, DeviceError> {
        self.table.get_mut(&fd).ok_or_else(|| {
            warn!(fd = fd, "bad file descriptor");
            DeviceError::InvalidHandle
        })
    }

    /// Open `path` and allocate a new fd for it
    pub fn open(&mut self, path: &str, flags: OpenFlags) -> Result<c_int, DeviceError> {
        let handle = self.registry.open(path, flags)?;
        let fd = self.next_fd;
        self.next_fd += 1;
        self.table.insert(fd, handle);
        Ok(fd)
    }

    pub fn read(&mut self, fd: c_int, buf: &mut [u8]) -> Result<usize, DeviceError> {
        self.handle(fd)?.read(buf)
    }

    pub fn write(&mut self, fd: c_int, data: &[u8]) -> Result<usize, DeviceError> {
        self.handle(fd)?.write(data)
    }

    pub fn lseek(&mut self, fd: c_int, offset: i64, whence: Whence) -> Result<u64, DeviceError> {
        self.handle(fd)?.seek(offset, whence)
    }

    pub fn ftruncate(&mut self, fd: c_int) -> Result<(), DeviceError> {
        self.handle(fd)?.truncate()
    }

    /// Close and forget `fd`
    pub fn close(&mut self, fd: c_int) -> Result<(), DeviceError> {
        let mut handle = self.table.remove(&fd).ok_or_else(|| {
            warn!(fd = fd, "close of bad file descriptor");
            DeviceError::InvalidHandle
        })?;
        handle.close()
    }

    /// Get all open file descriptors, sorted
    pub fn open_fds(&self) -> Vec<c_int> {
        let mut fds: Vec<c_int> = self.table.keys().copied().collect();
        fds.sort_unstable();
        fds
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> FdTable {
        FdTable::new(Arc::new(DeviceRegistry::default()))
    }

    #[test]
    fn test_fds_start_at_zero_and_increase() {
        let mut fds = table();
        assert_eq!(fds.open("/dev/poums0", OpenFlags::read_only()).unwrap(), 0);
        assert_eq!(fds.open("/dev/poums0", OpenFlags::write_only()).unwrap(), 1);
        assert_eq!(fds.open_fds(), vec![0, 1]);
    }

    #[test]
    fn test_never_opened_fd() {
        let mut fds = table();
        let mut buf = [0u8; 4];
        assert_eq!(fds.read(7, &mut buf), Err(DeviceError::InvalidHandle));
        assert_eq!(fds.close(7), Err(DeviceError::InvalidHandle));
    }

    #[test]
    fn test_closed_fd_is_invalid() {
        let mut fds = table();
        let fd = fds.open("/dev/poums0", OpenFlags::write_only()).unwrap();
        fds.write(fd, b"abc").unwrap();
        fds.close(fd).unwrap();

        assert_eq!(fds.write(fd, b"x"), Err(DeviceError::InvalidHandle));
        assert_eq!(fds.lseek(fd, 0, Whence::Set), Err(DeviceError::InvalidHandle));
        assert_eq!(fds.ftruncate(fd), Err(DeviceError::InvalidHandle));
        assert_eq!(fds.close(fd), Err(DeviceError::InvalidHandle));

        // A new descriptor is not the old one
        let fd2 = fds.open("/dev/poums0", OpenFlags::read_only()).unwrap();
        assert_ne!(fd, fd2);
    }

    #[test]
    fn test_syscall_sequence() {
        let mut fds = table();
        let fd = fds.open("/dev/poums0", OpenFlags::read_write()).unwrap();
        fds.write(fd, b"Hello!").unwrap();
        assert_eq!(fds.lseek(fd, 0, Whence::Set).unwrap(), 0);

        let mut buf = [0u8; 16];
        let n = fds.read(fd, &mut buf).unwrap();
        assert_eq!(&buf[..n], b"Hello!");

        fds.ftruncate(fd).unwrap();
        assert_eq!(fds.lseek(fd, 0, Whence::End).unwrap(), 0);
    }

    #[test]
    fn test_open_missing_device_allocates_nothing() {
        let mut fds = table();
        assert!(matches!(
            fds.open("/dev/nope", OpenFlags::read_only()),
            Err(DeviceError::NotFound(_))
        ));
        assert!(fds.open_fds().is_empty());
    }
}
