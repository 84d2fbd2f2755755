//! Streaming extraction from a byte source.

use std::io::Read;
use std::path::Path;

use log::info;

use super::Extractor;
use crate::ExtractOptions;
use crate::ExtractionReport;
use crate::NoopProgress;
use crate::ProgressCallback;
use crate::ReaderConfig;
use crate::Result;
use crate::reader::Entries;
use crate::types::DestDir;

/// Extracts a tar stream under `dest`.
///
/// Entries are materialized as soon as the reader completes them, so memory
/// use is bounded by the largest single entry. `dest` is created if missing.
///
/// # Errors
///
/// Returns the first format, truncation, security or I/O error. Entries
/// extracted before the error remain on disk.
///
/// # Examples
///
/// ```no_run
/// use tarkit_core::{Entry, ExtractOptions, create_archive, extract};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let bytes = create_archive(&[Entry::file("a.txt", b"hi".to_vec())])?;
/// let report = extract(&bytes[..], "/tmp/out", &ExtractOptions::default())?;
/// assert_eq!(report.entries[0].name, "a.txt");
/// # Ok(())
/// # }
/// ```
pub fn extract<R: Read>(
    source: R,
    dest: impl AsRef<Path>,
    options: &ExtractOptions,
) -> Result<ExtractionReport> {
    extract_with_progress(source, dest, options, &mut NoopProgress)
}

/// Like [`extract`], reporting each entry to `progress`.
///
/// # Errors
///
/// See [`extract`].
pub fn extract_with_progress<R: Read>(
    source: R,
    dest: impl AsRef<Path>,
    options: &ExtractOptions,
    progress: &mut dyn ProgressCallback,
) -> Result<ExtractionReport> {
    let dest = DestDir::new(dest.as_ref())?;
    info!("extracting into {}", dest.as_path().display());

    let reader = ReaderConfig {
        retain_content: true,
        ..options.reader
    };
    let mut extractor = Extractor::new(dest, options.clone(), progress);
    for entry in Entries::with_config(source, reader) {
        extractor.process(entry?)?;
    }
    Ok(extractor.finish())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::ArchiveError;
    use crate::create_archive;
    use crate::types::Entry;
    use std::fs;
    use std::path::PathBuf;
    use tempfile::TempDir;

    #[derive(Default)]
    struct Recorder {
        started: Vec<PathBuf>,
        bytes: u64,
        completed: bool,
    }

    impl ProgressCallback for Recorder {
        fn on_entry_start(&mut self, path: &Path, _current: usize) {
            self.started.push(path.to_path_buf());
        }

        fn on_bytes_written(&mut self, bytes: u64) {
            self.bytes += bytes;
        }

        fn on_entry_complete(&mut self, _path: &Path) {}

        fn on_complete(&mut self) {
            self.completed = true;
        }
    }

    #[test]
    fn test_extract_creates_missing_root() {
        let temp = TempDir::new().unwrap();
        let dest = temp.path().join("new-root");
        let bytes = create_archive(&[Entry::file("a.txt", b"hi".to_vec())]).unwrap();
        extract(&bytes[..], &dest, &ExtractOptions::default()).unwrap();
        assert_eq!(fs::read(dest.join("a.txt")).unwrap(), b"hi");
    }

    #[test]
    fn test_content_kept_when_reader_drops_it() {
        let temp = TempDir::new().unwrap();
        let bytes = create_archive(&[Entry::file("a.txt", b"hi".to_vec())]).unwrap();
        let options = ExtractOptions::default().with_reader_config(ReaderConfig {
            retain_content: false,
            ..ReaderConfig::default()
        });
        let report = extract(&bytes[..], temp.path(), &options).unwrap();
        assert_eq!(fs::read(temp.path().join("a.txt")).unwrap(), b"hi");
        assert_eq!(report.bytes_written, 2);
    }

    #[test]
    fn test_progress_reported() {
        let temp = TempDir::new().unwrap();
        let bytes = create_archive(&[
            Entry::directory("d"),
            Entry::file("d/f", vec![0u8; 700]),
        ])
        .unwrap();
        let mut progress = Recorder::default();
        extract_with_progress(&bytes[..], temp.path(), &ExtractOptions::default(), &mut progress)
            .unwrap();
        assert_eq!(progress.started, vec![PathBuf::from("d/"), PathBuf::from("d/f")]);
        assert_eq!(progress.bytes, 700);
        assert!(progress.completed);
    }

    #[test]
    fn test_truncated_stream_keeps_earlier_entries() {
        let temp = TempDir::new().unwrap();
        let bytes = create_archive(&[
            Entry::file("first", b"1".to_vec()),
            Entry::file("second", vec![2u8; 4096]),
        ])
        .unwrap();
        let cut = &bytes[..3 * 512];
        let result = extract(cut, temp.path(), &ExtractOptions::default());
        assert!(matches!(result, Err(ArchiveError::Truncated { .. })));
        assert!(temp.path().join("first").is_file());
        assert!(!temp.path().join("second").exists());
    }
}
