//! Error conversion utilities for CLI.
//!
//! Converts tarkit-core's typed errors (thiserror) into user-friendly
//! contextual errors (anyhow) with actionable guidance.

use anyhow::anyhow;
use std::path::Path;
use tarkit_core::ArchiveError;

/// Converts `ArchiveError` to user-friendly anyhow error with context
pub fn convert_archive_error(err: ArchiveError, archive: &Path) -> anyhow::Error {
    match err {
        ArchiveError::PathTraversal { path } => {
            anyhow!(
                "Security violation: Archive '{}' attempted path traversal with '{}'\n\
                 HINT: This archive may be malicious. Do not extract from untrusted sources.",
                archive.display(),
                path.display()
            )
        }
        ArchiveError::HardlinkEscape { path } => {
            anyhow!(
                "Security violation: Archive '{}' contains a hardlink to '{}' outside the output directory\n\
                 HINT: This archive may be malicious. Do not extract from untrusted sources.",
                archive.display(),
                path.display()
            )
        }
        ArchiveError::SecurityViolation { reason } => {
            anyhow!(
                "Entry rejected in '{}': {}\n\
                 HINT: Check --strip-components; links must still resolve after stripping.",
                archive.display(),
                reason
            )
        }
        ArchiveError::Truncated { missing } => {
            anyhow!(
                "Archive '{}' ends early: {} content bytes missing\n\
                 HINT: The file was probably cut off during download or copy.",
                archive.display(),
                missing
            )
        }
        ArchiveError::Format(issue) => {
            anyhow!(
                "Invalid archive '{}': {}\n\
                 HINT: The archive may be corrupted or is not a tar file.",
                archive.display(),
                issue
            )
        }
        ArchiveError::NameTooLong { name, len } => {
            anyhow!(
                "Cannot store '{}' in '{}': name of {} bytes has no valid prefix split",
                name,
                archive.display(),
                len
            )
        }
        ArchiveError::UnsupportedFormat => {
            anyhow!(
                "Archive format not supported: {}\n\
                 HINT: Supported formats: tar, tar.gz, tgz, tar.xz, txz (or pass --compression)",
                archive.display()
            )
        }
        ArchiveError::Io(io_err) => {
            anyhow!(
                "I/O error while processing '{}': {}",
                archive.display(),
                io_err
            )
        }
        _ => anyhow::Error::from(err)
            .context(format!("Error processing archive '{}'", archive.display())),
    }
}

/// Adds archive context to a library result
pub fn add_archive_context<T>(
    result: Result<T, ArchiveError>,
    archive: &Path,
) -> anyhow::Result<T> {
    result.map_err(|e| convert_archive_error(e, archive))
}
