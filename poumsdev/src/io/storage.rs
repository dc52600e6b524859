//! Storage backend trait

use crate::error::StorageError;

/// Backing store of a single device
///
/// A backend is a flat, byte-addressable array with a logical length.
/// The device wraps it in a mutex, so implementations need no locking of
/// their own.
///
/// Writes are all-or-nothing: on error the backend must be left exactly as
/// it was before the call.
pub trait StorageBackend: Send {
    /// Logical size in bytes
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Copy bytes starting at `offset` into `buf`.
    ///
    /// Returns the number of bytes copied, which is 0 when `offset` is at or
    /// past the end.
    fn read_at(&self, offset: usize, buf: &mut [u8]) -> usize;

    /// Write all of `data` at `offset`.
    ///
    /// Bytes between the current end and `offset` (if `offset` is past the
    /// end) are zero-filled.
    fn write_at(&mut self, offset: usize, data: &[u8]) -> Result<(), StorageError>;

    /// Reset the logical size to 0
    fn truncate(&mut self) -> Result<(), StorageError>;
}
