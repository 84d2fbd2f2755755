//! Extraction reporting and progress callbacks.

use std::path::Path;
use std::time::Duration;

use crate::types::Entry;
use crate::types::EntryType;

/// Report of an extraction run.
#[derive(Debug, Clone, Default)]
pub struct ExtractionReport {
    /// Number of regular files written.
    pub files_extracted: usize,

    /// Number of directory entries materialized.
    pub directories_created: usize,

    /// Number of symlinks created.
    pub symlinks_created: usize,

    /// Number of hard links created.
    pub hardlinks_created: usize,

    /// Total content bytes written to disk.
    pub bytes_written: u64,

    /// Entries skipped because stripping removed every segment or the filter
    /// rejected them.
    pub entries_skipped: usize,

    /// Duration of the extraction.
    pub duration: Duration,

    /// Best-effort failures that did not fail their entry.
    pub warnings: Vec<String>,

    /// Materialized entries in archive order, with stripped names and without
    /// content bytes.
    pub entries: Vec<Entry>,
}

impl ExtractionReport {
    /// Creates an empty report.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a materialized entry.
    pub fn record(&mut self, mut entry: Entry) {
        match entry.entry_type {
            EntryType::Directory => self.directories_created += 1,
            EntryType::Symlink => self.symlinks_created += 1,
            EntryType::Hardlink => self.hardlinks_created += 1,
            EntryType::File | EntryType::PaxHeader | EntryType::PaxGlobal => {
                self.files_extracted += 1;
                self.bytes_written += entry.content.len() as u64;
            }
        }
        entry.content = Vec::new();
        self.entries.push(entry);
    }

    /// Adds a warning message to the report.
    pub fn add_warning(&mut self, message: String) {
        self.warnings.push(message);
    }

    /// Returns total number of items materialized.
    #[must_use]
    pub fn total_items(&self) -> usize {
        self.files_extracted
            + self.directories_created
            + self.symlinks_created
            + self.hardlinks_created
    }

    /// Returns whether any warnings were generated.
    #[must_use]
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}

/// Receives progress updates while an archive is extracted or created.
///
/// Archives are streamed, so the total number of entries is not known in
/// advance.
///
/// # Examples
///
/// ```
/// use tarkit_core::ProgressCallback;
/// use std::path::Path;
///
/// struct SimpleProgress;
///
/// impl ProgressCallback for SimpleProgress {
///     fn on_entry_start(&mut self, path: &Path, current: usize) {
///         println!("#{current}: {}", path.display());
///     }
///
///     fn on_bytes_written(&mut self, _bytes: u64) {}
///
///     fn on_entry_complete(&mut self, path: &Path) {
///         println!("done: {}", path.display());
///     }
///
///     fn on_complete(&mut self) {
///         println!("finished");
///     }
/// }
/// ```
pub trait ProgressCallback: Send {
    /// Called before an entry is processed; `current` is 1-indexed.
    fn on_entry_start(&mut self, path: &Path, current: usize);

    /// Called with the number of content bytes just written or read.
    fn on_bytes_written(&mut self, bytes: u64);

    /// Called once an entry has been processed.
    fn on_entry_complete(&mut self, path: &Path);

    /// Called when the whole operation is complete.
    fn on_complete(&mut self);
}

/// `ProgressCallback` that ignores every update.
#[derive(Debug, Default)]
pub struct NoopProgress;

impl ProgressCallback for NoopProgress {
    fn on_entry_start(&mut self, _path: &Path, _current: usize) {}

    fn on_bytes_written(&mut self, _bytes: u64) {}

    fn on_entry_complete(&mut self, _path: &Path) {}

    fn on_complete(&mut self) {}
}
