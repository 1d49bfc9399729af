//! Analysis results: compression shape, member listing, recommendation.

use crate::error::GzipError;
use crate::gzip::Member;
use std::fmt;

/// Overall compression shape of an analyzed file.
///
/// Exactly one of these holds for any input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Status
{
    /// Not gzip at all, or no complete member.
    Uncompressed,
    /// Exactly one valid member covering the whole file.
    SingleCompressed,
    /// Two or more valid members covering the whole file.
    MultiCompressed,
    /// At least the start of a gzip structure, broken somewhere inside.
    FaultyCompressed,
    /// Valid members followed by bytes that do not start a new member.
    GarbageAtEnd,
    /// A single member whose decompressed content is itself a
    /// multi-member gzip stream.
    Recompressed,
}

impl fmt::Display for Status
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        let name = match self
        {
            Status::Uncompressed => "uncompressed",
            Status::SingleCompressed => "single-compressed",
            Status::MultiCompressed => "multi-compressed",
            Status::FaultyCompressed => "faulty-compressed",
            Status::GarbageAtEnd => "garbage-at-end",
            Status::Recompressed => "recompressed",
        };
        write!(f, "{}", name)
    }
}

/// The immutable result of analyzing one file.
///
/// Owns the member list recorded by the decoder. For `Recompressed` files
/// the members describe the *inner* stream, i.e. what one unwrap would
/// expose.
#[derive(Debug)]
pub struct Report
{
    filename: Option<String>,
    status: Status,
    members: Vec<Member>,
    error: Option<GzipError>,
}

impl Report
{
    pub fn new(
        filename: Option<String>,
        status: Status,
        members: Vec<Member>,
        error: Option<GzipError>,
    ) -> Self
    {
        Self {
            filename,
            status,
            members,
            error,
        }
    }

    pub fn filename(&self) -> Option<&str>
    {
        self.filename.as_deref()
    }

    pub fn status(&self) -> Status
    {
        self.status
    }

    pub fn members(&self) -> &[Member]
    {
        &self.members
    }

    /// The structural error that ended decoding, if any.
    pub fn error(&self) -> Option<&GzipError>
    {
        self.error.as_ref()
    }

    /// Sum of the members' compressed lengths.
    pub fn total_compressed(&self) -> u64
    {
        self.members.iter().map(|m| m.compressed_len).sum()
    }

    /// Sum of the members' uncompressed lengths.
    pub fn total_uncompressed(&self) -> u64
    {
        self.members.iter().map(|m| m.uncompressed_len).sum()
    }

    /// The last member's offset plus its uncompressed length; 0 with no
    /// members.
    ///
    /// This mixes compressed offsets with uncompressed lengths, which only
    /// adds up when every member's content is as long as its compressed
    /// form. [`Self::total_uncompressed`] is the sum of member sizes; pick
    /// deliberately.
    pub fn total_uncompressed_by_offset(&self) -> u64
    {
        self.members
            .last()
            .map(|m| m.offset + m.uncompressed_len)
            .unwrap_or(0)
    }

    /// Human advice derived from the status and the filename.
    pub fn recommendation(&self) -> String
    {
        // None: no filename known, so no extension advice either way.
        let named_gz = self.filename.as_deref().map(has_gz_extension);
        match self.status
        {
            Status::Uncompressed if named_gz == Some(true) =>
            {
                "The file is not compressed, but its name ends in .gz. \
                 Remove the extension or compress the file."
                    .to_string()
            }
            Status::Uncompressed =>
            {
                "The file is not compressed. Consider compressing it.".to_string()
            }
            Status::SingleCompressed =>
            {
                "The file is compressed as a single gzip block, which makes \
                 random access to individual records impossible. Recompress \
                 it with one gzip member per record."
                    .to_string()
            }
            Status::MultiCompressed if named_gz == Some(false) =>
            {
                "The file is compressed with one gzip member per record, but \
                 its name does not end in .gz. Consider renaming it."
                    .to_string()
            }
            Status::MultiCompressed =>
            {
                "The file is compressed with one gzip member per record. \
                 No action needed."
                    .to_string()
            }
            Status::FaultyCompressed =>
            {
                let mut advice = String::from(
                    "The file contains gzip errors after the last complete \
                     member. Regenerate it from the source data.",
                );
                if named_gz == Some(false)
                {
                    advice.push_str(" The file name also does not end in .gz.");
                }
                advice
            }
            Status::GarbageAtEnd =>
            {
                let mut advice = String::from(
                    "The file begins with valid gzip members but is followed \
                     by trailing bytes that are not gzip. Trim the trailing \
                     bytes or regenerate the file.",
                );
                if named_gz == Some(false)
                {
                    advice.push_str(" The file name also does not end in .gz.");
                }
                advice
            }
            Status::Recompressed =>
            {
                "The whole file is a gzip stream that was compressed a second \
                 time. Unwrap one layer of compression and keep the .gz \
                 extension."
                    .to_string()
            }
        }
    }
}

impl fmt::Display for Report
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        write!(
            f,
            "GzipReport(status={}, entries={}, compressed={} bytes, uncompressed={} bytes, error=",
            self.status,
            self.members.len(),
            self.total_compressed(),
            self.total_uncompressed()
        )?;
        match &self.error
        {
            Some(err) => write!(f, "{})", err),
            None => write!(f, "none)"),
        }
    }
}

fn has_gz_extension(filename: &str) -> bool
{
    filename.to_lowercase().ends_with(".gz")
}

#[cfg(test)]
mod tests
{
    use super::*;

    fn member(id: usize, offset: u64, compressed_len: u64, uncompressed_len: u64) -> Member
    {
        Member {
            id,
            offset,
            compressed_len,
            uncompressed_len,
            snippet: Vec::new(),
        }
    }

    fn report(filename: Option<&str>, status: Status, members: Vec<Member>) -> Report
    {
        Report::new(filename.map(str::to_string), status, members, None)
    }

    #[test]
    fn test_totals_under_both_definitions()
    {
        let r = report(
            None,
            Status::MultiCompressed,
            vec![member(0, 0, 40, 100), member(1, 40, 60, 200)],
        );
        assert_eq!(r.total_compressed(), 100);
        assert_eq!(r.total_uncompressed(), 300);
        // Offset-based convention: last offset (40) + last uncompressed (200).
        assert_eq!(r.total_uncompressed_by_offset(), 240);
    }

    #[test]
    fn test_totals_with_no_members()
    {
        let r = report(None, Status::Uncompressed, Vec::new());
        assert_eq!(r.total_compressed(), 0);
        assert_eq!(r.total_uncompressed(), 0);
        assert_eq!(r.total_uncompressed_by_offset(), 0);
    }

    #[test]
    fn test_display_line()
    {
        let r = report(
            Some("a.warc.gz"),
            Status::MultiCompressed,
            vec![member(0, 0, 40, 100), member(1, 40, 60, 200)],
        );
        assert_eq!(
            r.to_string(),
            "GzipReport(status=multi-compressed, entries=2, compressed=100 bytes, uncompressed=300 bytes, error=none)"
        );
    }

    #[test]
    fn test_display_line_with_error()
    {
        let r = Report::new(
            None,
            Status::GarbageAtEnd,
            vec![member(0, 0, 40, 100)],
            Some(GzipError::GarbageAfterValidStream),
        );
        assert!(r
            .to_string()
            .ends_with("error=garbage after a valid gzip stream)"));
    }

    #[test]
    fn test_recommendation_uncompressed()
    {
        let gz = report(Some("data.warc.GZ"), Status::Uncompressed, Vec::new());
        assert!(gz.recommendation().contains("Remove the extension"));

        let plain = report(Some("data.warc"), Status::Uncompressed, Vec::new());
        assert!(plain.recommendation().contains("Consider compressing"));

        let unnamed = report(None, Status::Uncompressed, Vec::new());
        assert!(unnamed.recommendation().contains("Consider compressing"));
    }

    #[test]
    fn test_recommendation_single()
    {
        let r = report(Some("data.warc.gz"), Status::SingleCompressed, Vec::new());
        let advice = r.recommendation();
        assert!(advice.contains("single gzip block"));
        assert!(advice.contains("one gzip member per record"));
    }

    #[test]
    fn test_recommendation_multi()
    {
        let ok = report(Some("data.warc.gz"), Status::MultiCompressed, Vec::new());
        assert!(ok.recommendation().contains("No action needed"));

        let rename = report(Some("data.warc"), Status::MultiCompressed, Vec::new());
        assert!(rename.recommendation().contains("renaming"));

        // Without a filename there is nothing to rename.
        let unnamed = report(None, Status::MultiCompressed, Vec::new());
        assert!(unnamed.recommendation().contains("No action needed"));
    }

    #[test]
    fn test_recommendation_mentions_missing_extension()
    {
        let faulty = report(Some("data.warc"), Status::FaultyCompressed, Vec::new());
        assert!(faulty.recommendation().contains("does not end in .gz"));

        let faulty_gz = report(Some("data.warc.gz"), Status::FaultyCompressed, Vec::new());
        assert!(!faulty_gz.recommendation().contains("does not end in .gz"));

        let garbage = report(Some("data.warc"), Status::GarbageAtEnd, Vec::new());
        assert!(garbage.recommendation().contains("does not end in .gz"));
    }

    #[test]
    fn test_recommendation_recompressed()
    {
        let r = report(Some("data.warc.gz.gz"), Status::Recompressed, Vec::new());
        assert!(r.recommendation().contains("Unwrap one layer"));
    }

    #[test]
    fn test_status_display_names_are_distinct()
    {
        let all = [
            Status::Uncompressed,
            Status::SingleCompressed,
            Status::MultiCompressed,
            Status::FaultyCompressed,
            Status::GarbageAtEnd,
            Status::Recompressed,
        ];
        for (i, a) in all.iter().enumerate()
        {
            for b in &all[i + 1..]
            {
                assert_ne!(a.to_string(), b.to_string());
            }
        }
    }
}
