//! Error kinds raised while walking a gzip stream.
//!
//! Every malformation a member can exhibit has its own variant so that the
//! analyzer can classify by matching, not by inspecting message text. The
//! decoder never recovers internally: it either completes a member or raises
//! one of these.

use std::io;
use thiserror::Error;

/// Errors produced by the member-aware gzip decoder.
#[derive(Debug, Error)]
pub enum GzipError
{
    /// Failure of the underlying byte source. Aborts analysis.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The very first bytes of the input are not a gzip magic number.
    #[error("not in gzip format")]
    NotGzip,

    /// Bytes after at least one complete member do not start a new member.
    #[error("garbage after a valid gzip stream")]
    GarbageAfterValidStream,

    /// Header declares a compression method other than DEFLATE.
    #[error("unsupported compression method {0}")]
    UnsupportedMethod(u8),

    /// One of the three reserved header flag bits is set.
    #[error("reserved gzip header flags set: {0:#04x}")]
    ReservedFlags(u8),

    /// End of input inside a member (header, payload or trailer).
    #[error("unexpected end of gzip stream")]
    Truncated,

    /// Stored trailer CRC32 does not match the decompressed data.
    #[error("corrupt gzip stream: CRC32 mismatch (stored {stored:#010x}, computed {computed:#010x})")]
    CorruptCrc
    {
        stored: u32,
        computed: u32,
    },

    /// Stored trailer ISIZE does not match the decompressed byte count.
    #[error("corrupt gzip stream: ISIZE mismatch (stored {stored}, actual {actual})")]
    CorruptIsize
    {
        stored: u32,
        actual: u32,
    },

    /// The DEFLATE payload itself is malformed.
    #[error("invalid deflate data: {0}")]
    Deflate(#[from] flate2::DecompressError),
}

impl From<GzipError> for io::Error
{
    fn from(err: GzipError) -> io::Error
    {
        match err
        {
            GzipError::Io(e) => e,
            other => io::Error::new(io::ErrorKind::InvalidData, other),
        }
    }
}
