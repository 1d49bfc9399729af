//! Diagnose how a gzip file is compressed.
//!
//! A WARC (Web ARChive) file should be a sequence of independently
//! decompressible gzip members, one per record, so that records can be
//! seeked without decompressing everything before them. A file gzipped as
//! one monolithic stream decompresses just fine and is still broken for
//! archival use. The question this crate answers is therefore not "does it
//! decompress?" but "how is it compressed?".
//!
//! The [`gzip::MemberDecoder`] walks a possibly-concatenated gzip stream
//! and records the exact byte offset, compressed and uncompressed size and
//! a decoded snippet of every member. [`analyzer::analyze`] classifies a
//! file into one of six shapes (see [`report::Status`]), including the
//! double-wrapped case where an already-correct WARC was gzipped a second
//! time, and [`report::Report`] turns that into a recommendation.
//!
//! ```no_run
//! use std::path::Path;
//!
//! let report = warcgz::analyzer::analyze(Path::new("crawl.warc.gz"))?;
//! println!("{}", report);
//! for member in report.members()
//! {
//!     println!("{}", member);
//! }
//! println!("{}", report.recommendation());
//! # Ok::<(), std::io::Error>(())
//! ```

pub mod analyzer;
pub mod error;
pub mod gzip;
pub mod position;
pub mod report;
pub mod warc;
