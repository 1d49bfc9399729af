//! Two-pass compression layout analysis.
//!
//! Pass one drains a concatenated [`MemberDecoder`] over the raw file and
//! classifies the outcome. Pass two runs only when the whole file turned
//! out to be a single member: the file is unwrapped once with a standard
//! gzip decoder and the output fed through a second member decoder, which
//! catches the double-wrapped case where somebody gzipped an already
//! correctly gzipped WARC. Keeping the passes separate keeps the
//! byte-offset machinery operating purely on the outer bytes.

use crate::error::GzipError;
use crate::gzip::{Member, MemberDecoder, DEFAULT_SNIPPET_WIDTH};
use crate::report::{Report, Status};
use flate2::read::GzDecoder;
use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;

/// Analyze the gzip layout of a file.
///
/// Structural gzip errors never escape: they are folded into the returned
/// [`Report`]'s status (and kept in its error field for diagnostics). Only
/// genuine I/O failures propagate.
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
///
/// let report = warcgz::analyzer::analyze(Path::new("crawl.warc.gz")).unwrap();
/// println!("{}", report);
/// println!("{}", report.recommendation());
/// ```
pub fn analyze(path: &Path) -> io::Result<Report>
{
    analyze_with_snippet_width(path, DEFAULT_SNIPPET_WIDTH)
}

/// [`analyze`] with a caller-chosen snippet width.
pub fn analyze_with_snippet_width(path: &Path, snippet_width: usize) -> io::Result<Report>
{
    let filename = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned());

    let file = File::open(path)?;
    let (status, members, error) = classify(BufReader::new(file), snippet_width)?;
    tracing::debug!(
        status = %status,
        members = members.len(),
        file = filename.as_deref().unwrap_or("<unnamed>"),
        "outer pass done"
    );

    if status == Status::SingleCompressed
    {
        if let Some(inner) = detect_double_compression(path, snippet_width)?
        {
            tracing::debug!(members = inner.len(), "inner stream is multi-member gzip");
            return Ok(Report::new(filename, Status::Recompressed, inner, None));
        }
    }

    Ok(Report::new(filename, status, members, error))
}

/// Drain one decoder pass and map the outcome to a status.
fn classify<R: Read>(
    input: R,
    snippet_width: usize,
) -> io::Result<(Status, Vec<Member>, Option<GzipError>)>
{
    let mut decoder = MemberDecoder::with_snippet_width(input, true, snippet_width);
    match decoder.drain()
    {
        Ok(_) =>
        {
            let members = decoder.into_members();
            let status = match members.len()
            {
                0 => Status::Uncompressed,
                1 => Status::SingleCompressed,
                _ => Status::MultiCompressed,
            };
            Ok((status, members, None))
        }
        Err(GzipError::Io(err)) => Err(err),
        // Not gzip at all; the status alone carries the diagnosis.
        Err(GzipError::NotGzip) => Ok((Status::Uncompressed, Vec::new(), None)),
        Err(err @ GzipError::GarbageAfterValidStream) =>
        {
            Ok((Status::GarbageAtEnd, decoder.into_members(), Some(err)))
        }
        Err(err) => Ok((Status::FaultyCompressed, decoder.into_members(), Some(err))),
    }
}

/// Unwrap one gzip layer and look for a multi-member stream inside.
///
/// Opens its own handle; the caller's first-pass handle is closed by then,
/// so at most one handle is live at a time.
fn detect_double_compression(
    path: &Path,
    snippet_width: usize,
) -> io::Result<Option<Vec<Member>>>
{
    let file = File::open(path)?;
    // GzDecoder stops after the first member, which is exactly one unwrap.
    let unwrapped = GzDecoder::new(BufReader::new(file));
    let mut inner = MemberDecoder::with_snippet_width(unwrapped, true, snippet_width);
    match inner.drain()
    {
        Ok(_) if inner.members().len() >= 2 => Ok(Some(inner.into_members())),
        Ok(_) => Ok(None),
        // A decode failure inside the unwrapped bytes just means the file is
        // not double-wrapped. Genuine I/O failures still propagate. GzDecoder
        // reports corrupt data and bad headers as InvalidInput; our own
        // structural errors arrive as InvalidData or UnexpectedEof.
        Err(GzipError::Io(err))
            if err.kind() != io::ErrorKind::InvalidData
                && err.kind() != io::ErrorKind::InvalidInput
                && err.kind() != io::ErrorKind::UnexpectedEof =>
        {
            Err(err)
        }
        Err(err) =>
        {
            tracing::debug!(error = %err, "inner stream is not multi-member gzip");
            Ok(None)
        }
    }
}
