//! In-memory storage backend
//!
//! Keeps the device contents in a `Vec<u8>`. Growth is unbounded unless a
//! size limit is given.

use super::storage::StorageBackend;
use crate::error::StorageError;

/// Error returned when a write needs more room than the limit allows
fn no_space(requested: usize, limit: Option<usize>) -> StorageError {
    StorageError::NoSpace {
        requested: requested as u64,
        limit: limit.map_or(u64::MAX, |l| l as u64),
    }
}

/// Byte-array backed storage
///
/// # Example
///
/// ```
/// use poumsdev::io::{MemStorage, StorageBackend};
///
/// let mut storage = MemStorage::new();
/// storage.write_at(0, b"hello").unwrap();
/// storage.write_at(1, b"E").unwrap();
///
/// let mut buf = [0u8; 8];
/// let n = storage.read_at(0, &mut buf);
/// assert_eq!(&buf[..n], b"hEllo");
/// ```
#[derive(Debug, Default)]
pub struct MemStorage {
    data: Vec<u8>,
    max_size: Option<usize>,
}

impl MemStorage {
    /// Create an empty, unbounded storage
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty storage with preallocated room and an optional size limit
    #[must_use]
    pub fn with_capacity(initial_capacity: usize, max_size: Option<usize>) -> Self {
        Self {
            data: Vec::with_capacity(initial_capacity),
            max_size,
        }
    }

    #[must_use]
    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }
}

impl StorageBackend for MemStorage {
    fn len(&self) -> usize {
        self.data.len()
    }

    fn read_at(&self, offset: usize, buf: &mut [u8]) -> usize {
        let Some(available) = self.data.get(offset..) else {
            return 0;
        };
        let n = available.len().min(buf.len());
        buf[..n].copy_from_slice(&available[..n]);
        n
    }

    fn write_at(&mut self, offset: usize, data: &[u8]) -> Result<(), StorageError> {
        if data.is_empty() {
            return Ok(());
        }

        let end = offset
            .checked_add(data.len())
            .ok_or_else(|| no_space(usize::MAX, self.max_size))?;
        if let Some(limit) = self.max_size {
            if end > limit {
                return Err(no_space(end, self.max_size));
            }
        }

        if end > self.data.len() {
            // Reserve first so a failed allocation leaves contents untouched
            self.data
                .try_reserve(end - self.data.len())
                .map_err(|_| no_space(end, self.max_size))?;
            self.data.resize(end, 0);
        }
        self.data[offset..end].copy_from_slice(data);
        Ok(())
    }

    fn truncate(&mut self) -> Result<(), StorageError> {
        self.data.clear();
        Ok(())
    }
}
