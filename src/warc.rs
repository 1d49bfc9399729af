//! WARC record length sanity check.
//!
//! A WARC file conventionally stores one gzip member per record. When a
//! member's decoded snippet holds a complete WARC header, the declared
//! Content-Length can be cross-checked against the member's actual
//! uncompressed size: header bytes + declared block length + the four bytes
//! of the record-terminating `\r\n\r\n` must add up exactly.

use crate::gzip::Member;
use regex::Regex;
use std::sync::OnceLock;

static HEADER_RE: OnceLock<Regex> = OnceLock::new();

/// `(?s)` so the header may span lines; lazy up to the first blank line.
fn header_re() -> &'static Regex
{
    HEADER_RE.get_or_init(|| {
        Regex::new(r"(?s)^WARC/.*?Content-Length: ([0-9]+).*?\r\n\r\n")
            .expect("WARC header pattern is valid")
    })
}

/// Check a member's declared WARC Content-Length against its actual size.
///
/// The snippet is reduced to its ASCII bytes (1-127; anything else is
/// dropped) and matched against the WARC header shape. Returns `true` only
/// when a header is present *and* `header size + Content-Length + 4` equals
/// the member's uncompressed length.
///
/// A member that does not look like a WARC record yields `false`; that is
/// not an error. Note the header must fit inside the captured snippet, so
/// this check is only meaningful for members decoded with a generous
/// snippet width.
///
/// # Example
///
/// ```
/// use warcgz::gzip::Member;
/// use warcgz::warc::record_length_matches;
///
/// let content = b"WARC/1.0\r\nContent-Length: 5\r\n\r\nhello\r\n\r\n";
/// let member = Member {
///     id: 0,
///     offset: 0,
///     compressed_len: 60,
///     uncompressed_len: content.len() as u64,
///     snippet: content.to_vec(),
/// };
/// assert!(record_length_matches(&member));
/// ```
pub fn record_length_matches(member: &Member) -> bool
{
    let ascii: String = member
        .snippet
        .iter()
        .filter(|&&b| (1..=127).contains(&b))
        .map(|&b| b as char)
        .collect();

    let Some(caps) = header_re().captures(&ascii)
    else
    {
        return false;
    };
    let header_size = match caps.get(0)
    {
        Some(whole) => (whole.end() - whole.start()) as u64,
        None => return false,
    };
    let stated: u64 = match caps[1].parse()
    {
        Ok(n) => n,
        Err(_) => return false,
    };

    // Record = header + block + trailing \r\n\r\n.
    header_size + stated + 4 == member.uncompressed_len
}
