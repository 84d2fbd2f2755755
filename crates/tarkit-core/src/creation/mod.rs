//! Archive creation from filesystem sources.
//!
//! [`walker`] enumerates sources into [`SourceEntry`] values, [`pack`]
//! streams them through an [`ArchiveWriter`](crate::ArchiveWriter).

pub mod filters;
pub mod walker;

pub mod config;
pub mod pack;
pub mod report;

pub use config::CreationConfig;
pub use report::CreationReport;
pub use walker::SourceEntry;
pub use walker::SourceKind;
pub use walker::collect_entries;
