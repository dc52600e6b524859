//! A single device: one storage unit shared by every handle opened on its path

use parking_lot::Mutex;
use std::fmt;

use crate::error::{DeviceError, StorageError};
use crate::io::StorageBackend;

/// Where a write should land
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum WritePos {
    /// At the given byte offset
    At(u64),
    /// At the end of the storage, resolved under the lock
    End,
}

fn to_offset(pos: u64) -> Result<usize, StorageError> {
    usize::try_from(pos).map_err(|_| StorageError::NoSpace {
        requested: pos,
        limit: usize::MAX as u64,
    })
}

/// Device instance
///
/// # Thread Safety
///
/// The storage sits behind a `parking_lot::Mutex`. Every operation holds the
/// lock for its whole duration, so operations from different handles are
/// serialized and an append always lands as one contiguous run.
pub struct Device {
    path: String,
    minor: u32,
    storage: Mutex<Box<dyn StorageBackend>>,
}

impl Device {
    #[must_use]
    pub fn new(path: impl Into<String>, minor: u32, storage: Box<dyn StorageBackend>) -> Self {
        Self {
            path: path.into(),
            minor,
            storage: Mutex::new(storage),
        }
    }

    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    #[must_use]
    pub fn minor(&self) -> u32 {
        self.minor
    }

    /// Current logical length
    #[must_use]
    pub fn len(&self) -> u64 {
        self.storage.lock().len() as u64
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.storage.lock().is_empty()
    }

    /// Copy of the whole contents
    #[must_use]
    pub fn snapshot(&self) -> Vec<u8> {
        let storage = self.storage.lock();
        let mut out = vec![0u8; storage.len()];
        let n = storage.read_at(0, &mut out);
        out.truncate(n);
        out
    }

    /// Reset the length to 0
    pub fn truncate(&self) -> Result<(), StorageError> {
        self.storage.lock().truncate()
    }

    pub(crate) fn read_at(&self, pos: u64, buf: &mut [u8]) -> usize {
        // A position beyond addressable memory is beyond the end as well
        let Ok(offset) = usize::try_from(pos) else {
            return 0;
        };
        self.storage.lock().read_at(offset, buf)
    }

    /// Write `data` and return the position right after it
    pub(crate) fn write(&self, pos: WritePos, data: &[u8]) -> Result<u64, DeviceError> {
        let mut storage = self.storage.lock();
        let offset = match pos {
            WritePos::At(p) => to_offset(p)?,
            WritePos::End => storage.len(),
        };
        storage.write_at(offset, data)?;
        Ok((offset + data.len()) as u64)
    }
}

impl fmt::Debug for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Device")
            .field("path", &self.path)
            .field("minor", &self.minor)
            .field("len", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::MemStorage;

    fn device() -> Device {
        Device::new("/dev/test0", 0, Box::new(MemStorage::new()))
    }

    #[test]
    fn test_write_at_and_end() {
        let dev = device();
        assert_eq!(dev.write(WritePos::End, b"abc").unwrap(), 3);
        assert_eq!(dev.write(WritePos::At(1), b"X").unwrap(), 2);
        assert_eq!(dev.write(WritePos::End, b"d").unwrap(), 4);
        assert_eq!(dev.snapshot(), b"aXcd");
    }

    #[test]
    fn test_read_past_end() {
        let dev = device();
        dev.write(WritePos::End, b"abc").unwrap();
        let mut buf = [0u8; 2];
        assert_eq!(dev.read_at(3, &mut buf), 0);
        assert_eq!(dev.read_at(u64::MAX, &mut buf), 0);
    }

    #[test]
    fn test_truncate() {
        let dev = device();
        dev.write(WritePos::End, b"abc").unwrap();
        dev.truncate().unwrap();
        assert!(dev.is_empty());
        assert_eq!(dev.len(), 0);
    }
}
