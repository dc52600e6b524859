//! `dd`-style block copy
//!
//! Reads a source in blocks until a read returns 0 and writes each block
//! verbatim to the destination. This is all a bulk-copy utility needs from a
//! device: correct sequential reads up to logical EOF.

use std::fmt;
use std::io::Write;
use tracing::debug;

use crate::error::error_kind_to_str;

/// Block size `dd` uses when none is given
pub const DEFAULT_BLOCK_SIZE: usize = 512;

fn kind_str(kind: &embedded_io::ErrorKind) -> &'static str {
    error_kind_to_str(*kind)
}

#[derive(Debug, thiserror::Error)]
pub enum CopyError {
    #[error("block size must be positive")]
    InvalidBlockSize,

    #[error("read failed: {}", kind_str(.0))]
    Read(embedded_io::ErrorKind),

    #[error("write failed: {0}")]
    Write(#[from] std::io::Error),
}

/// Record counters, in the shape `dd` reports them
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CopyStats {
    pub full_in: u64,
    pub partial_in: u64,
    pub full_out: u64,
    pub partial_out: u64,
    pub bytes: u64,
}

impl fmt::Display for CopyStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}+{} records in", self.full_in, self.partial_in)?;
        writeln!(f, "{}+{} records out", self.full_out, self.partial_out)?;
        write!(f, "{} bytes copied", self.bytes)
    }
}

/// Copy `reader` to `writer` until EOF, `block_size` bytes at a time.
///
/// Each input block is written out as one record, so the out counters
/// mirror the in counters.
///
/// # Errors
///
/// - `block_size` is 0
/// - a read or a write fails
pub fn copy_to_eof<R, W>(
    reader: &mut R,
    writer: &mut W,
    block_size: usize,
) -> Result<CopyStats, CopyError>
where
    R: embedded_io::Read,
    W: Write,
{
    if block_size == 0 {
        return Err(CopyError::InvalidBlockSize);
    }

    let mut stats = CopyStats::default();
    let mut block = vec![0u8; block_size];
    loop {
        let n = reader
            .read(&mut block)
            .map_err(|e| CopyError::Read(embedded_io::Error::kind(&e)))?;
        if n == 0 {
            break;
        }
        writer.write_all(&block[..n])?;

        if n == block_size {
            stats.full_in += 1;
            stats.full_out += 1;
        } else {
            stats.partial_in += 1;
            stats.partial_out += 1;
        }
        stats.bytes += n as u64;
    }
    writer.flush()?;

    debug!(bytes = stats.bytes, "block copy done");
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_copy_counts_records() {
        let data = [7u8; 1100];
        let mut src: &[u8] = &data;
        let mut dst = Vec::new();

        let stats = copy_to_eof(&mut src, &mut dst, DEFAULT_BLOCK_SIZE).unwrap();

        assert_eq!(dst, data);
        assert_eq!(stats.full_in, 2);
        assert_eq!(stats.partial_in, 1);
        assert_eq!(stats.bytes, 1100);
        assert_eq!(
            stats.to_string(),
            "2+1 records in\n2+1 records out\n1100 bytes copied"
        );
    }

    #[test]
    fn test_copy_empty_source() {
        let mut src: &[u8] = &[];
        let mut dst = Vec::new();
        let stats = copy_to_eof(&mut src, &mut dst, 4).unwrap();
        assert_eq!(stats, CopyStats::default());
        assert!(dst.is_empty());
    }

    #[test]
    fn test_zero_block_size() {
        let mut src: &[u8] = b"abc";
        let mut dst = Vec::new();
        assert!(matches!(
            copy_to_eof(&mut src, &mut dst, 0),
            Err(CopyError::InvalidBlockSize)
        ));
    }
}
