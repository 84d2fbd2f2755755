//! Per-entry extraction orchestrator.

use std::cmp::Reverse;
use std::path::Path;
use std::path::PathBuf;
use std::time::Instant;

use log::debug;
use log::warn;

use super::materialize;
use super::metadata;
use super::metadata::Attributes;
use super::metadata::MetadataPolicy;
use crate::ArchiveError;
use crate::ExtractOptions;
use crate::ExtractionReport;
use crate::ProgressCallback;
use crate::Result;
use crate::types::DestDir;
use crate::types::Entry;
use crate::types::EntryType;
use crate::types::SafePath;
use crate::types::strip_components;

/// Materializes entries under a destination root, one at a time, in archive
/// order.
///
/// Every entry name is stripped, filtered and validated before anything is
/// written. The first error aborts: entries already written stay on disk.
/// Directory mode and mtime are applied by [`finish`](Self::finish), deepest
/// directories first.
///
/// # Examples
///
/// ```no_run
/// use tarkit_core::extraction::Extractor;
/// use tarkit_core::types::DestDir;
/// use tarkit_core::{Entry, ExtractOptions, NoopProgress};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let mut progress = NoopProgress;
/// let dest = DestDir::new("/tmp/out")?;
/// let mut extractor = Extractor::new(dest, ExtractOptions::default(), &mut progress);
/// extractor.process(Entry::file("hello.txt", b"hi".to_vec()))?;
/// let report = extractor.finish();
/// assert_eq!(report.files_extracted, 1);
/// # Ok(())
/// # }
/// ```
pub struct Extractor<'p> {
    dest: DestDir,
    options: ExtractOptions,
    policy: MetadataPolicy,
    report: ExtractionReport,
    deferred: Vec<(PathBuf, Attributes)>,
    progress: &'p mut dyn ProgressCallback,
    processed: usize,
    started: Instant,
}

impl std::fmt::Debug for Extractor<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Extractor")
            .field("dest", &self.dest)
            .field("options", &self.options)
            .field("processed", &self.processed)
            .finish_non_exhaustive()
    }
}

impl<'p> Extractor<'p> {
    /// Creates an orchestrator writing under `dest`.
    pub fn new(
        dest: DestDir,
        options: ExtractOptions,
        progress: &'p mut dyn ProgressCallback,
    ) -> Self {
        let policy = MetadataPolicy {
            permissions: options.preserve_permissions,
            owner: options.preserve_owner,
        };
        Self {
            dest,
            options,
            policy,
            report: ExtractionReport::new(),
            deferred: Vec::new(),
            progress,
            processed: 0,
            started: Instant::now(),
        }
    }

    /// Extraction root.
    #[must_use]
    pub const fn dest(&self) -> &DestDir {
        &self.dest
    }

    /// Materializes one entry.
    ///
    /// # Errors
    ///
    /// - [`ArchiveError::PathTraversal`] if the name resolves outside the root.
    /// - [`ArchiveError::HardlinkEscape`] if a hardlink target does.
    /// - [`ArchiveError::SecurityViolation`] if a hardlink target is removed
    ///   entirely by stripping.
    /// - [`ArchiveError::Io`] if the filesystem operation itself fails.
    pub fn process(&mut self, mut entry: Entry) -> Result<()> {
        if entry.entry_type.is_pax() {
            return Ok(());
        }
        self.processed += 1;

        if entry.name.starts_with('/') {
            warn!("removing leading '/' from member name {:?}", entry.name);
        }
        let Some(stripped) = strip_components(&entry.name, self.options.strip_components) else {
            debug!("skipping {:?}: nothing left after stripping", entry.name);
            self.report.entries_skipped += 1;
            return Ok(());
        };
        entry.name = stripped;

        if !self.options.includes(&entry) {
            debug!("skipping {:?}: rejected by filter", entry.name);
            self.report.entries_skipped += 1;
            return Ok(());
        }

        let safe = SafePath::validate(&entry.name, &self.dest)?;
        let path = self.dest.join(&safe);
        self.progress
            .on_entry_start(Path::new(&entry.name), self.processed);

        if !safe.is_root() {
            materialize::ensure_parent(&path)?;
        }

        let attrs = Attributes {
            mode: entry.mode,
            uid: entry.uid,
            gid: entry.gid,
            mtime: entry.mtime,
        };
        let warnings = &mut self.report.warnings;

        match entry.entry_type {
            EntryType::Directory => {
                materialize::create_directory(&path)?;
                metadata::apply_owner_to_directory(&path, attrs, self.policy, warnings);
                self.deferred.push((path, attrs));
            }
            EntryType::Symlink => {
                materialize::create_symlink(&path, &entry.linkname)?;
                metadata::apply_to_symlink(&path, attrs, self.policy, warnings);
            }
            EntryType::Hardlink => {
                let target = self.resolve_hardlink_target(&entry.linkname)?;
                materialize::create_hardlink(&path, &target)?;
            }
            EntryType::File | EntryType::PaxHeader | EntryType::PaxGlobal => {
                let file = materialize::write_file(&path, entry.content())?;
                metadata::apply_to_file(&file, &path, attrs, self.policy, warnings);
                self.progress.on_bytes_written(entry.content.len() as u64);
            }
        }

        self.progress.on_entry_complete(Path::new(&entry.name));
        self.report.record(entry);
        Ok(())
    }

    fn resolve_hardlink_target(&self, linkname: &str) -> Result<PathBuf> {
        let Some(stripped) = strip_components(linkname, self.options.strip_components) else {
            return Err(ArchiveError::SecurityViolation {
                reason: format!("hardlink target {linkname:?} removed by strip-components"),
            });
        };
        let safe = SafePath::validate(&stripped, &self.dest).map_err(|e| match e {
            ArchiveError::PathTraversal { .. } => ArchiveError::HardlinkEscape {
                path: PathBuf::from(linkname),
            },
            other => other,
        })?;
        Ok(self.dest.join(&safe))
    }

    /// Applies deferred directory metadata and returns the report.
    pub fn finish(mut self) -> ExtractionReport {
        self.deferred
            .sort_by_key(|(path, _)| Reverse(path.components().count()));
        for (path, attrs) in &self.deferred {
            metadata::apply_deferred_directory(
                path,
                *attrs,
                self.policy,
                &mut self.report.warnings,
            );
        }
        self.report.duration = self.started.elapsed();
        self.progress.on_complete();
        self.report
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::NoopProgress;
    use std::fs;
    use tempfile::TempDir;

    fn run(entries: Vec<Entry>, options: ExtractOptions) -> (TempDir, Result<ExtractionReport>) {
        let temp = TempDir::new().unwrap();
        let mut progress = NoopProgress;
        let dest = DestDir::new(temp.path()).unwrap();
        let mut extractor = Extractor::new(dest, options, &mut progress);
        for entry in entries {
            if let Err(e) = extractor.process(entry) {
                return (temp, Err(e));
            }
        }
        let report = extractor.finish();
        (temp, Ok(report))
    }

    #[test]
    fn test_file_and_directory() {
        let (temp, report) = run(
            vec![
                Entry::file("a.txt", b"hi".to_vec()),
                Entry::directory("dir"),
            ],
            ExtractOptions::default(),
        );
        let report = report.unwrap();
        assert_eq!(fs::read(temp.path().join("a.txt")).unwrap(), b"hi");
        assert!(temp.path().join("dir").is_dir());
        assert_eq!(report.files_extracted, 1);
        assert_eq!(report.directories_created, 1);
        assert_eq!(report.entries.len(), 2);
    }

    #[test]
    fn test_traversal_aborts() {
        let (temp, report) = run(
            vec![
                Entry::file("ok.txt", b"1".to_vec()),
                Entry::file("../../etc/evil", b"x".to_vec()),
                Entry::file("never.txt", b"2".to_vec()),
            ],
            ExtractOptions::default(),
        );
        assert!(matches!(report, Err(ArchiveError::PathTraversal { .. })));
        assert!(temp.path().join("ok.txt").exists());
        assert!(!temp.path().join("never.txt").exists());
    }

    #[test]
    fn test_strip_skips_fully_stripped_entries() {
        let (temp, report) = run(
            vec![
                Entry::directory("pkg"),
                Entry::file("pkg/src/lib.rs", b"//".to_vec()),
            ],
            ExtractOptions::default().with_strip_components(1),
        );
        let report = report.unwrap();
        assert_eq!(report.entries_skipped, 1);
        assert!(temp.path().join("src/lib.rs").is_file());
        assert_eq!(report.entries[0].name, "src/lib.rs");
    }

    #[test]
    fn test_absolute_name_is_confined() {
        let (temp, report) = run(
            vec![Entry::file("/abs/file", b"x".to_vec())],
            ExtractOptions::default(),
        );
        report.unwrap();
        assert!(temp.path().join("abs/file").is_file());
    }

    #[test]
    fn test_filter_skips() {
        let (temp, report) = run(
            vec![
                Entry::file("keep.txt", b"k".to_vec()),
                Entry::file("drop.log", b"d".to_vec()),
            ],
            ExtractOptions::default().with_filter(|e| !e.name.ends_with(".log")),
        );
        assert_eq!(report.unwrap().entries_skipped, 1);
        assert!(temp.path().join("keep.txt").exists());
        assert!(!temp.path().join("drop.log").exists());
    }

    #[test]
    fn test_hardlink_escape() {
        let (_temp, report) = run(
            vec![Entry::hardlink("link", "../outside")],
            ExtractOptions::default(),
        );
        assert!(matches!(report, Err(ArchiveError::HardlinkEscape { .. })));
    }

    #[test]
    fn test_hardlink_target_stripped_away() {
        let (_temp, report) = run(
            vec![Entry::hardlink("a/link", "target")],
            ExtractOptions::default().with_strip_components(1),
        );
        assert!(matches!(report, Err(ArchiveError::SecurityViolation { .. })));
    }

    #[test]
    fn test_hardlink_with_strip() {
        let (temp, report) = run(
            vec![
                Entry::file("top/data", b"shared".to_vec()),
                Entry::hardlink("top/alias", "top/data"),
            ],
            ExtractOptions::default().with_strip_components(1),
        );
        assert_eq!(report.unwrap().hardlinks_created, 1);
        assert_eq!(fs::read(temp.path().join("alias")).unwrap(), b"shared");
    }

    #[test]
    #[cfg(unix)]
    fn test_symlink_then_write_through_is_blocked() {
        let outside = TempDir::new().unwrap();
        let target = outside.path().to_string_lossy().into_owned();
        let (_temp, report) = run(
            vec![
                Entry::symlink("escape", target),
                Entry::file("escape/pwned", b"x".to_vec()),
            ],
            ExtractOptions::default(),
        );
        assert!(matches!(report, Err(ArchiveError::PathTraversal { .. })));
        assert!(!outside.path().join("pwned").exists());
    }

    #[test]
    #[cfg(unix)]
    fn test_deferred_directory_mode() {
        use std::os::unix::fs::PermissionsExt;

        let (temp, report) = run(
            vec![
                Entry::directory("ro").with_mode(0o555),
                Entry::file("ro/inner.txt", b"x".to_vec()),
            ],
            ExtractOptions::default(),
        );
        report.unwrap();
        let dir = temp.path().join("ro");
        assert!(dir.join("inner.txt").is_file());
        let mode = fs::metadata(&dir).unwrap().permissions().mode() & 0o777;
        fs::set_permissions(&dir, fs::Permissions::from_mode(0o755)).unwrap();
        assert_eq!(mode, 0o555);
    }
}
