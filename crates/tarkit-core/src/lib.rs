//! Streaming ustar/PAX archive codec with safe extraction.
//!
//! `tarkit-core` reads and writes POSIX ustar archives with PAX extended
//! headers. The reader is an incremental state machine that accepts byte
//! chunks of any size; the writer emits PAX headers whenever a name, link
//! target or size does not fit the classic header. Extraction confines every
//! entry to the destination root and rejects path traversal.
//!
//! # Examples
//!
//! ```no_run
//! use tarkit_core::{Entry, ExtractOptions, create_archive, extract, parse_bytes};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let bytes = create_archive(&[
//!     Entry::file("a.txt", b"hi".to_vec()),
//!     Entry::directory("dir"),
//! ])?;
//!
//! let entries = parse_bytes(&bytes)?;
//! assert_eq!(entries[0].content, b"hi");
//!
//! let report = extract(&bytes[..], "/tmp/output", &ExtractOptions::default())?;
//! println!("Extracted {} files", report.files_extracted);
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod api;
pub mod config;
pub mod creation;
pub mod error;
pub mod extraction;
pub mod formats;
pub mod reader;
pub mod report;
pub mod types;
pub mod writer;

pub use api::create_archive_file;
pub use api::create_archive_file_with_progress;
pub use api::extract_archive;
pub use api::extract_archive_with_progress;
pub use api::list_archive;
pub use config::ExtractOptions;
pub use config::ReaderConfig;
pub use creation::CreationConfig;
pub use creation::CreationReport;
pub use error::ArchiveError;
pub use error::FormatIssue;
pub use error::Result;
pub use extraction::extract;
pub use extraction::extract_with_progress;
pub use formats::CompressionCodec;
pub use reader::ArchiveReader;
pub use reader::Entries;
pub use reader::parse_bytes;
pub use reader::parse_entries;
pub use report::ExtractionReport;
pub use report::NoopProgress;
pub use report::ProgressCallback;
pub use types::Entry;
pub use types::EntryType;
pub use writer::ArchiveWriter;
pub use writer::create_archive;
