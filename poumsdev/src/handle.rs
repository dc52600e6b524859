//! Per-open view onto a device
//!
//! A [`DeviceHandle`] carries its own cursor and access mode. Append mode is
//! a write-time position override: the cursor is only updated after the
//! write, never consulted for it.

use std::sync::Arc;
use tracing::{debug, trace, warn};

use crate::device::{Device, WritePos};
use crate::error::DeviceError;
use crate::idgen::HandleId;

/// Read/write access requested at open time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessMode {
    ReadOnly,
    WriteOnly,
    ReadWrite,
}

/// Open flags: access mode plus the optional append and truncate modifiers
///
/// ```
/// use poumsdev::OpenFlags;
///
/// let flags = OpenFlags::write_only().append();
/// assert!(flags.can_write());
/// assert!(!flags.can_read());
/// assert!(flags.is_append());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpenFlags {
    access: AccessMode,
    append: bool,
    truncate: bool,
}

impl OpenFlags {
    #[must_use]
    pub const fn new(access: AccessMode) -> Self {
        Self {
            access,
            append: false,
            truncate: false,
        }
    }

    #[must_use]
    pub const fn read_only() -> Self {
        Self::new(AccessMode::ReadOnly)
    }

    #[must_use]
    pub const fn write_only() -> Self {
        Self::new(AccessMode::WriteOnly)
    }

    #[must_use]
    pub const fn read_write() -> Self {
        Self::new(AccessMode::ReadWrite)
    }

    /// Every write lands at the end of the device
    #[must_use]
    pub const fn append(mut self) -> Self {
        self.append = true;
        self
    }

    /// Reset the device to empty as a side effect of opening
    #[must_use]
    pub const fn truncate(mut self) -> Self {
        self.truncate = true;
        self
    }

    #[must_use]
    pub const fn access(&self) -> AccessMode {
        self.access
    }

    #[must_use]
    pub const fn can_read(&self) -> bool {
        matches!(self.access, AccessMode::ReadOnly | AccessMode::ReadWrite)
    }

    #[must_use]
    pub const fn can_write(&self) -> bool {
        matches!(self.access, AccessMode::WriteOnly | AccessMode::ReadWrite)
    }

    #[must_use]
    pub const fn is_append(&self) -> bool {
        self.append
    }

    #[must_use]
    pub const fn is_truncate(&self) -> bool {
        self.truncate
    }
}

impl Default for OpenFlags {
    fn default() -> Self {
        Self::read_only()
    }
}

/// Reference point for [`DeviceHandle::seek`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Whence {
    /// From the start of the device
    Set,
    /// From the current cursor
    Current,
    /// From the current end of the device
    End,
}

/// An open handle on a device
///
/// Created by [`crate::DeviceRegistry::open`]. Every operation after
/// [`close`](Self::close) fails with [`DeviceError::InvalidHandle`].
/// Dropping an open handle closes it.
pub struct DeviceHandle {
    id: HandleId,
    device: Arc<Device>,
    flags: OpenFlags,
    pos: u64,
    closed: bool,
}

impl DeviceHandle {
    pub(crate) fn new(id: HandleId, device: Arc<Device>, flags: OpenFlags) -> Self {
        Self {
            id,
            device,
            flags,
            pos: 0,
            closed: false,
        }
    }

    #[must_use]
    pub fn id(&self) -> HandleId {
        self.id
    }

    #[must_use]
    pub fn flags(&self) -> OpenFlags {
        self.flags
    }

    #[must_use]
    pub fn path(&self) -> &str {
        self.device.path()
    }

    /// Current cursor
    #[must_use]
    pub fn position(&self) -> u64 {
        self.pos
    }

    /// Current length of the underlying device
    pub fn len(&self) -> Result<u64, DeviceError> {
        self.ensure_open()?;
        Ok(self.device.len())
    }

    pub fn is_empty(&self) -> Result<bool, DeviceError> {
        Ok(self.len()? == 0)
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    fn ensure_open(&self) -> Result<(), DeviceError> {
        if self.closed {
            warn!(handle = %self.id, path = %self.device.path(), "operation on closed handle");
            return Err(DeviceError::InvalidHandle);
        }
        Ok(())
    }

    /// Read up to `buf.len()` bytes from the cursor.
    ///
    /// Returns 0 at logical EOF. Never blocks: all data is resident.
    pub fn read(&mut self, buf: &mut [u8]) -> Result<usize, DeviceError> {
        self.ensure_open()?;
        if !self.flags.can_read() {
            warn!(handle = %self.id, "read on write-only handle");
            return Err(DeviceError::Permission("reading"));
        }

        let n = self.device.read_at(self.pos, buf);
        trace!(handle = %self.id, path = %self.device.path(), pos = self.pos, len = n, "read");
        self.pos += n as u64;
        Ok(n)
    }

    /// Read everything from the cursor up to logical EOF
    pub fn read_to_end(&mut self) -> Result<Vec<u8>, DeviceError> {
        let mut out = Vec::new();
        let mut chunk = [0u8; 1024];
        loop {
            match self.read(&mut chunk)? {
                0 => break,
                n => out.extend_from_slice(&chunk[..n]),
            }
        }
        Ok(out)
    }

    /// Write all of `data` at the cursor, or at the end in append mode.
    ///
    /// On failure neither the device nor the cursor change.
    pub fn write(&mut self, data: &[u8]) -> Result<usize, DeviceError> {
        self.ensure_open()?;
        if !self.flags.can_write() {
            warn!(handle = %self.id, "write on read-only handle");
            return Err(DeviceError::Permission("writing"));
        }
        if data.is_empty() {
            return Ok(0);
        }

        let at = if self.flags.is_append() {
            WritePos::End
        } else {
            WritePos::At(self.pos)
        };
        let end = self.device.write(at, data).inspect_err(|e| {
            warn!(handle = %self.id, path = %self.device.path(), error = %e, "write rejected");
        })?;
        trace!(handle = %self.id, path = %self.device.path(), end = end, len = data.len(), "write");
        self.pos = end;
        Ok(data.len())
    }

    /// Move the cursor and return the new position.
    ///
    /// Positions past the end are allowed; a later write zero-fills the gap.
    pub fn seek(&mut self, offset: i64, whence: Whence) -> Result<u64, DeviceError> {
        self.ensure_open()?;
        let base = match whence {
            Whence::Set => 0,
            Whence::Current => self.pos,
            Whence::End => self.device.len(),
        };
        let target = i64::try_from(base)
            .ok()
            .and_then(|b| b.checked_add(offset))
            .and_then(|p| u64::try_from(p).ok())
            .ok_or(DeviceError::InvalidSeek)?;
        trace!(handle = %self.id, ?whence, offset = offset, pos = target, "seek");
        self.pos = target;
        Ok(target)
    }

    /// Reset the device to empty.
    ///
    /// Affects every handle on the device: they see length 0 on their next
    /// operation. This handle's cursor goes back to 0. Allowed in every
    /// access mode.
    pub fn truncate(&mut self) -> Result<(), DeviceError> {
        self.ensure_open()?;
        self.device.truncate()?;
        debug!(handle = %self.id, path = %self.device.path(), "truncated");
        self.pos = 0;
        Ok(())
    }

    /// Release the handle. Device contents persist.
    pub fn close(&mut self) -> Result<(), DeviceError> {
        self.ensure_open()?;
        self.closed = true;
        debug!(handle = %self.id, path = %self.device.path(), "closed");
        Ok(())
    }
}

impl Drop for DeviceHandle {
    fn drop(&mut self) {
        if !self.closed {
            let _ = self.close();
        }
    }
}

impl std::fmt::Debug for DeviceHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeviceHandle")
            .field("id", &self.id)
            .field("path", &self.device.path())
            .field("flags", &self.flags)
            .field("pos", &self.pos)
            .field("closed", &self.closed)
            .finish()
    }
}

// Implement embedded_io traits
impl embedded_io::ErrorType for DeviceHandle {
    type Error = DeviceError;
}

impl embedded_io::Read for DeviceHandle {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        DeviceHandle::read(self, buf)
    }
}

impl embedded_io::Write for DeviceHandle {
    fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        DeviceHandle::write(self, buf)
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        self.ensure_open()
    }
}

impl embedded_io::Seek for DeviceHandle {
    fn seek(&mut self, pos: embedded_io::SeekFrom) -> Result<u64, Self::Error> {
        match pos {
            embedded_io::SeekFrom::Start(p) => {
                let offset = i64::try_from(p).map_err(|_| DeviceError::InvalidSeek)?;
                DeviceHandle::seek(self, offset, Whence::Set)
            }
            embedded_io::SeekFrom::Current(o) => DeviceHandle::seek(self, o, Whence::Current),
            embedded_io::SeekFrom::End(o) => DeviceHandle::seek(self, o, Whence::End),
        }
    }
}
