//! Replays the device test script against an in-process registry:
//!
//! 1. open with truncate to clear the device
//! 2. append 20 `*`, one byte per write
//! 3. read everything back
//! 4. seek to 7 on a write-only handle and write `" Xlab "`
//! 5. block-copy the device into a file, read the file, delete it

use embedded_io::Write as _;
use poumsdev::{copy_to_eof, CopyStats, DeviceRegistry, OpenFlags, Whence, DEFAULT_BLOCK_SIZE};
use std::error::Error;
use std::fs::File;
use std::path::Path;
use tracing::{info, warn};

/// What each step of the script observed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    pub after_append: Vec<u8>,
    pub copied: Vec<u8>,
    pub stats: CopyStats,
}

/// Run the script on `device`, copying it into `copy_path`.
///
/// # Errors
///
/// Returns the first device, copy, or filesystem error.
pub fn run(
    registry: &DeviceRegistry,
    device: &str,
    copy_path: &Path,
) -> Result<Report, Box<dyn Error>> {
    // truncate
    registry.open(device, OpenFlags::read_only().truncate())?;
    info!(device = device, "truncated");

    // append & write
    let mut h = registry.open(device, OpenFlags::write_only().append())?;
    for _ in 0..20 {
        h.write_all(b"*")?;
    }
    h.close()?;

    // read
    let mut h = registry.open(device, OpenFlags::read_only())?;
    let after_append = h.read_to_end()?;
    h.close()?;
    info!(device = device, len = after_append.len(), "read back");

    // seek
    let mut h = registry.open(device, OpenFlags::write_only())?;
    h.seek(7, Whence::Set)?;
    h.write_all(b" Xlab ")?;
    h.close()?;

    // dd
    let mut src = registry.open(device, OpenFlags::read_only())?;
    let (stats, copied) = copy_through_file(&mut src, copy_path)?;
    src.close()?;
    info!(path = %copy_path.display(), bytes = stats.bytes, "copied");

    Ok(Report {
        after_append,
        copied,
        stats,
    })
}

/// Removes the file at the wrapped path when dropped
struct RemoveOnDrop<'a>(&'a Path);

impl Drop for RemoveOnDrop<'_> {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_file(self.0) {
            warn!(path = %self.0.display(), error = %e, "failed to remove copy");
        }
    }
}

/// Block-copy `src` into a new file at `path` and read the file back.
///
/// The file is removed before returning, whether the copy succeeded or not.
///
/// # Errors
///
/// Returns the first read, write, or filesystem error.
pub fn copy_through_file<R: embedded_io::Read>(
    src: &mut R,
    path: &Path,
) -> Result<(CopyStats, Vec<u8>), Box<dyn Error>> {
    let dst = File::create(path)?;
    let _cleanup = RemoveOnDrop(path);
    let stats = {
        let mut dst = dst;
        copy_to_eof(src, &mut dst, DEFAULT_BLOCK_SIZE)?
    };
    let copied = std::fs::read(path)?;
    Ok((stats, copied))
}
