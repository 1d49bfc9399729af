//! Member-aware gzip decoder with exact byte accounting.
//!
//! A gzip file may be the concatenation of several independent members
//! (RFC 1952 §2.2). Standard decoders either stop silently at the first
//! member or hide where one member ends and the next begins. This decoder
//! walks every member, recording its byte offset, compressed and
//! uncompressed sizes and a snippet of decoded content, which is what makes
//! a WARC file diagnosable: one member per record means random access works,
//! a single monolithic member means it does not.

use crate::error::GzipError;
use crate::position::PositionReader;
use flate2::{Crc, Decompress, FlushDecompress, Status};
use std::fmt;
use std::io::{self, Read};

/// Gzip magic numbers and constants
const GZIP_ID1: u8 = 0x1f;
const GZIP_ID2: u8 = 0x8b;
const GZIP_CM_DEFLATE: u8 = 8;
const GZIP_FLG_FHCRC: u8 = 0x02;
const GZIP_FLG_FEXTRA: u8 = 0x04;
const GZIP_FLG_FNAME: u8 = 0x08;
const GZIP_FLG_FCOMMENT: u8 = 0x10;
const GZIP_FLG_RESERVED: u8 = 0xe0;

/// Input buffer size. Deliberately small: the reader rewinds at most one
/// buffer fill when a member ends, which keeps the skip back to the first
/// trailer byte cheap and the byte accounting exact at member boundaries.
const INPUT_BUF_SIZE: usize = 100;

/// Default number of leading decompressed bytes captured per member.
pub const DEFAULT_SNIPPET_WIDTH: usize = 30;

/// One self-contained gzip member: header + DEFLATE payload + 8-byte trailer.
///
/// Members are immutable once the decoder has validated their trailer and
/// appended them. Offsets and lengths refer to the compressed input; the
/// snippet holds the first bytes of the decompressed output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Member
{
    /// Dense 0-based index within the file.
    pub id: usize,
    /// Byte position of the member's first magic byte in the input.
    pub offset: u64,
    /// Byte length of the whole member in the input.
    pub compressed_len: u64,
    /// Number of bytes the member decompresses to. The trailer check
    /// guarantees this agrees with the stored ISIZE modulo 2^32.
    pub uncompressed_len: u64,
    /// Up to the configured width of leading decompressed bytes, verbatim.
    pub snippet: Vec<u8>,
}

impl fmt::Display for Member
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        write!(
            f,
            "Entry #{}: bytes {}->{}, compressed={} bytes, uncompressed={} bytes",
            self.id,
            self.offset,
            self.offset + self.compressed_len,
            self.compressed_len,
            self.uncompressed_len
        )?;
        if !self.snippet.is_empty()
        {
            write!(f, ", snippet={}", escape_bytes(&self.snippet))?;
        }
        Ok(())
    }
}

/// Render bytes for terminal output, escaping non-printable ones.
fn escape_bytes(bytes: &[u8]) -> String
{
    let mut out = String::with_capacity(bytes.len());
    for &b in bytes
    {
        match b
        {
            b'\n' => out.push_str("\\n"),
            b'\r' => out.push_str("\\r"),
            b'\t' => out.push_str("\\t"),
            0x20..=0x7e => out.push(b as char),
            _ => out.push_str(&format!("\\x{:02x}", b)),
        }
    }
    out
}

/// A gzip decoder that records every member it walks over.
///
/// With `concatenated` set, the decoder consumes members until the input
/// ends; otherwise it stops after the first member's trailer, leaving the
/// reader positioned immediately behind it.
///
/// Decompressed bytes are delivered through [`Self::read`] (also available
/// as `std::io::Read`), or discarded wholesale with [`Self::drain`]. The
/// member list is available either way: a member is appended only once its
/// trailer has validated, so a decode error never leaves a half-parsed
/// member in the list.
///
/// # Example
///
/// ```
/// use std::io::Cursor;
/// use warcgz::gzip::MemberDecoder;
///
/// let mut gz = flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::default());
/// std::io::Write::write_all(&mut gz, b"record one").unwrap();
/// let data = gz.finish().unwrap();
///
/// let mut decoder = MemberDecoder::new(Cursor::new(data), true);
/// decoder.drain().unwrap();
/// assert_eq!(decoder.members().len(), 1);
/// assert_eq!(decoder.members()[0].uncompressed_len, 10);
/// ```
pub struct MemberDecoder<R: Read>
{
    reader: PositionReader<R>,
    inflater: Decompress,
    crc: Crc,
    input: [u8; INPUT_BUF_SIZE],
    input_len: usize,
    input_pos: usize,
    members: Vec<Member>,
    /// Offset of the current member's first byte.
    member_start: u64,
    /// Decompressed bytes produced for the current member.
    member_out: u64,
    snippet: Vec<u8>,
    snippet_width: usize,
    concatenated: bool,
    in_member: bool,
    finished: bool,
}

impl<R: Read> MemberDecoder<R>
{
    /// Create a decoder with the default snippet width.
    pub fn new(inner: R, concatenated: bool) -> Self
    {
        Self::with_snippet_width(inner, concatenated, DEFAULT_SNIPPET_WIDTH)
    }

    /// Create a decoder capturing up to `snippet_width` leading bytes of
    /// each member's decompressed output.
    pub fn with_snippet_width(inner: R, concatenated: bool, snippet_width: usize) -> Self
    {
        Self {
            reader: PositionReader::new(inner),
            inflater: Decompress::new(false),
            crc: Crc::new(),
            input: [0u8; INPUT_BUF_SIZE],
            input_len: 0,
            input_pos: 0,
            members: Vec::new(),
            member_start: 0,
            member_out: 0,
            snippet: Vec::new(),
            snippet_width,
            concatenated,
            in_member: false,
            finished: false,
        }
    }

    /// Members recorded so far, in file order.
    pub fn members(&self) -> &[Member]
    {
        &self.members
    }

    /// Consume the decoder and hand over the member list.
    pub fn into_members(self) -> Vec<Member>
    {
        self.members
    }

    /// Bytes consumed from the compressed input so far.
    pub fn position(&self) -> u64
    {
        self.reader.position()
    }

    /// Deliver decompressed bytes into `dst`.
    ///
    /// # Returns
    ///
    /// * `Ok(n)` with `n > 0` - bytes written to `dst`
    /// * `Ok(0)` - end of the gzip stream (or `dst` was empty)
    /// * `Err(GzipError)` - structural or I/O failure; fatal for the decoder
    pub fn read(&mut self, dst: &mut [u8]) -> Result<usize, GzipError>
    {
        if dst.is_empty()
        {
            return Ok(0);
        }
        loop
        {
            if self.finished
            {
                return Ok(0);
            }
            if !self.in_member
            {
                if !self.begin_member()?
                {
                    self.finished = true;
                    return Ok(0);
                }
            }
            let produced = self.inflate_some(dst)?;
            if produced > 0
            {
                return Ok(produced);
            }
            // The member ended without producing output this call; try the
            // next member (or report end of stream) on the next iteration.
        }
    }

    /// Decompress and discard everything, returning the total number of
    /// uncompressed bytes read.
    pub fn drain(&mut self) -> Result<u64, GzipError>
    {
        let mut scratch = [0u8; 8192];
        let mut total = 0u64;
        loop
        {
            let n = self.read(&mut scratch)?;
            if n == 0
            {
                return Ok(total);
            }
            total += n as u64;
        }
    }

    /// Parse the next member header.
    ///
    /// Returns `Ok(false)` on a clean end of input at a member boundary.
    fn begin_member(&mut self) -> Result<bool, GzipError>
    {
        self.member_start = self.reader.position();

        let first = match self.try_read_u8()?
        {
            Some(b) => b,
            None =>
            {
                if self.concatenated && !self.members.is_empty()
                {
                    return Ok(false);
                }
                return Err(self.bad_magic());
            }
        };
        let second = self.try_read_u8()?;
        if first != GZIP_ID1 || second != Some(GZIP_ID2)
        {
            return Err(self.bad_magic());
        }

        let method = self.read_u8()?;
        if method != GZIP_CM_DEFLATE
        {
            return Err(GzipError::UnsupportedMethod(method));
        }
        let flags = self.read_u8()?;
        if flags & GZIP_FLG_RESERVED != 0
        {
            return Err(GzipError::ReservedFlags(flags));
        }
        let _mtime = self.read_u32_le()?;
        let _extra_flags = self.read_u8()?; // compression level hint
        let _os = self.read_u8()?;

        if flags & GZIP_FLG_FEXTRA != 0
        {
            let len = self.read_u16_le()? as u64;
            self.skip_exact(len)?;
        }
        if flags & GZIP_FLG_FNAME != 0
        {
            self.skip_until_nul()?;
        }
        if flags & GZIP_FLG_FCOMMENT != 0
        {
            self.skip_until_nul()?;
        }
        if flags & GZIP_FLG_FHCRC != 0
        {
            // Header CRC16; rarely emitted by producers, read but not verified.
            let _header_crc = self.read_u16_le()?;
        }

        self.inflater.reset(false);
        self.crc.reset();
        self.member_out = 0;
        self.snippet.clear();
        self.input_len = 0;
        self.input_pos = 0;
        self.in_member = true;
        tracing::trace!(
            id = self.members.len(),
            offset = self.member_start,
            "gzip member start"
        );
        Ok(true)
    }

    /// A wrong or missing magic number means different things before and
    /// after the first complete member.
    fn bad_magic(&self) -> GzipError
    {
        if self.members.is_empty()
        {
            GzipError::NotGzip
        }
        else
        {
            GzipError::GarbageAfterValidStream
        }
    }

    /// Run the inflater until it produces output or the member ends.
    fn inflate_some(&mut self, dst: &mut [u8]) -> Result<usize, GzipError>
    {
        loop
        {
            if self.input_pos == self.input_len
            {
                self.fill_input()?;
            }
            let before_in = self.inflater.total_in();
            let before_out = self.inflater.total_out();
            let status = self.inflater.decompress(
                &self.input[self.input_pos..self.input_len],
                dst,
                FlushDecompress::None,
            )?;
            let consumed = (self.inflater.total_in() - before_in) as usize;
            let produced = (self.inflater.total_out() - before_out) as usize;
            self.input_pos += consumed;

            if produced > 0
            {
                // Snippet capture happens before the caller sees the bytes.
                let out = &dst[..produced];
                self.crc.update(out);
                if self.snippet.len() < self.snippet_width
                {
                    let take = (self.snippet_width - self.snippet.len()).min(produced);
                    self.snippet.extend_from_slice(&out[..take]);
                }
                self.member_out += produced as u64;
            }

            match status
            {
                Status::StreamEnd =>
                {
                    self.finish_member()?;
                    return Ok(produced);
                }
                Status::Ok =>
                {
                    if produced > 0
                    {
                        return Ok(produced);
                    }
                }
                Status::BufError =>
                {
                    if produced > 0
                    {
                        return Ok(produced);
                    }
                    if self.input_pos < self.input_len
                    {
                        // Input available, output space available, no progress.
                        return Err(GzipError::Truncated);
                    }
                }
            }
        }
    }

    /// Refill the input buffer, marking the reader first so the over-read
    /// can be rewound when the member ends inside this fill.
    fn fill_input(&mut self) -> Result<(), GzipError>
    {
        self.reader.mark(INPUT_BUF_SIZE);
        let n = self.reader.read(&mut self.input)?;
        if n == 0
        {
            return Err(GzipError::Truncated);
        }
        self.input_len = n;
        self.input_pos = 0;
        Ok(())
    }

    /// Rewind to the first trailer byte, validate the trailer and append
    /// the member.
    fn finish_member(&mut self) -> Result<(), GzipError>
    {
        // The inflater consumed `input_pos` bytes of the current fill; the
        // rest belongs to the trailer and whatever follows. Rewind to the
        // mark set before the fill and re-consume exactly the deflate bytes,
        // landing on the trailer's first byte.
        self.reader.reset()?;
        let deflate_tail = self.input_pos as u64;
        if self.reader.skip(deflate_tail)? != deflate_tail
        {
            return Err(GzipError::Truncated);
        }
        self.input_len = 0;
        self.input_pos = 0;

        let stored_crc = self.read_u32_le()?;
        let computed = self.crc.sum();
        if stored_crc != computed
        {
            return Err(GzipError::CorruptCrc {
                stored: stored_crc,
                computed,
            });
        }
        let stored_isize = self.read_u32_le()?;
        let actual = (self.member_out & 0xffff_ffff) as u32;
        if stored_isize != actual
        {
            return Err(GzipError::CorruptIsize {
                stored: stored_isize,
                actual,
            });
        }

        let member = Member {
            id: self.members.len(),
            offset: self.member_start,
            compressed_len: self.reader.position() - self.member_start,
            uncompressed_len: self.member_out,
            snippet: std::mem::take(&mut self.snippet),
        };
        tracing::debug!(
            id = member.id,
            offset = member.offset,
            compressed_len = member.compressed_len,
            uncompressed_len = member.uncompressed_len,
            "gzip member complete"
        );
        self.members.push(member);
        self.in_member = false;
        if !self.concatenated
        {
            self.finished = true;
        }
        Ok(())
    }

    fn try_read_u8(&mut self) -> Result<Option<u8>, GzipError>
    {
        let mut byte = [0u8; 1];
        let n = self.reader.read(&mut byte)?;
        Ok(if n == 0 { None } else { Some(byte[0]) })
    }

    fn read_u8(&mut self) -> Result<u8, GzipError>
    {
        self.try_read_u8()?.ok_or(GzipError::Truncated)
    }

    fn read_u16_le(&mut self) -> Result<u16, GzipError>
    {
        let lo = self.read_u8()?;
        let hi = self.read_u8()?;
        Ok(u16::from_le_bytes([lo, hi]))
    }

    fn read_u32_le(&mut self) -> Result<u32, GzipError>
    {
        let b0 = self.read_u8()?;
        let b1 = self.read_u8()?;
        let b2 = self.read_u8()?;
        let b3 = self.read_u8()?;
        Ok(u32::from_le_bytes([b0, b1, b2, b3]))
    }

    fn skip_exact(&mut self, n: u64) -> Result<(), GzipError>
    {
        if self.reader.skip(n)? != n
        {
            return Err(GzipError::Truncated);
        }
        Ok(())
    }

    /// Skip a NUL-terminated (ISO-8859-1) header string.
    fn skip_until_nul(&mut self) -> Result<(), GzipError>
    {
        loop
        {
            if self.read_u8()? == 0
            {
                return Ok(());
            }
        }
    }
}

impl<R: Read> Read for MemberDecoder<R>
{
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize>
    {
        MemberDecoder::read(self, buf).map_err(io::Error::from)
    }
}
