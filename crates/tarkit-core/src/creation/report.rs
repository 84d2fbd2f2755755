//! Archive creation reporting.

use std::time::Duration;

use crate::creation::walker::SourceKind;

/// Report of an archive creation run.
///
/// # Examples
///
/// ```
/// use tarkit_core::creation::CreationReport;
///
/// let mut report = CreationReport::default();
/// report.files_added = 10;
/// report.archive_bytes = 2048;
/// report.bytes_compressed = 512;
///
/// assert_eq!(report.compression_ratio(), 4.0);
/// ```
#[derive(Debug, Clone, Default)]
pub struct CreationReport {
    /// Regular files added.
    pub files_added: usize,

    /// Directories added.
    pub directories_added: usize,

    /// Symlinks added.
    pub symlinks_added: usize,

    /// File content bytes copied into the archive.
    pub bytes_written: u64,

    /// Size of the tar stream before compression, headers and padding
    /// included.
    pub archive_bytes: u64,

    /// Size of the output file.
    pub bytes_compressed: u64,

    /// Duration of the run.
    pub duration: Duration,

    /// Warnings generated along the way.
    pub warnings: Vec<String>,
}

impl CreationReport {
    /// Creates an empty report.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Counts one written object.
    pub fn record(&mut self, kind: SourceKind, size: u64) {
        match kind {
            SourceKind::File => {
                self.files_added += 1;
                self.bytes_written += size;
            }
            SourceKind::Directory => self.directories_added += 1,
            SourceKind::Symlink => self.symlinks_added += 1,
        }
    }

    /// Adds a warning message.
    pub fn add_warning(&mut self, msg: impl Into<String>) {
        self.warnings.push(msg.into());
    }

    /// Returns whether any warnings were generated.
    #[must_use]
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    /// Tar stream size divided by output size; 0.0 when either is zero.
    #[must_use]
    pub fn compression_ratio(&self) -> f64 {
        if self.bytes_compressed == 0 || self.archive_bytes == 0 {
            return 0.0;
        }
        self.archive_bytes as f64 / self.bytes_compressed as f64
    }

    /// Returns total number of objects added.
    #[must_use]
    pub fn total_items(&self) -> usize {
        self.files_added + self.directories_added + self.symlinks_added
    }
}
