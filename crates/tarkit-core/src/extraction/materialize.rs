//! Filesystem effects for each entry type.
//!
//! Every function takes an absolute destination that has already been
//! validated against the extraction root.

use std::fs;
use std::fs::File;
use std::io;
use std::io::BufWriter;
use std::io::Write;
use std::path::Path;

use crate::ArchiveError;
use crate::Result;

/// Buffer size for content writes.
const WRITE_BUFFER_SIZE: usize = 64 * 1024;

/// Removes whatever exists at `path` without following symlinks.
///
/// A missing path is not an error. Directories are only removed when empty.
pub fn remove_existing(path: &Path) -> Result<()> {
    match fs::symlink_metadata(path) {
        Ok(meta) if meta.is_dir() => fs::remove_dir(path)?,
        Ok(_) => fs::remove_file(path)?,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => return Err(e.into()),
    }
    Ok(())
}

/// Creates the parent directories of `path`.
pub fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    Ok(())
}

/// Writes `content` to a fresh file at `path`.
///
/// Any non-directory already at `path`, including a symlink, is removed
/// first so the write never follows a link. The open handle is returned so
/// metadata can be applied through it.
pub fn write_file(path: &Path, content: &[u8]) -> Result<File> {
    if let Ok(meta) = fs::symlink_metadata(path)
        && !meta.is_dir()
    {
        fs::remove_file(path)?;
    }

    let file = File::create(path)?;
    let mut writer = BufWriter::with_capacity(WRITE_BUFFER_SIZE, file);
    writer.write_all(content)?;
    writer.flush()?;
    writer.into_inner().map_err(|e| ArchiveError::Io(e.into_error()))
}

/// Creates a directory at `path`.
///
/// Idempotent for existing directories. A symlink or file occupying the path
/// is replaced so later metadata updates cannot reach through it.
pub fn create_directory(path: &Path) -> Result<()> {
    if let Ok(meta) = fs::symlink_metadata(path)
        && !meta.is_dir()
    {
        fs::remove_file(path)?;
    }
    fs::create_dir_all(path)?;
    Ok(())
}

/// Creates a symlink at `link` pointing to `target`, replacing any existing
/// object.
#[allow(unused_variables)]
pub fn create_symlink(link: &Path, target: &str) -> Result<()> {
    #[cfg(unix)]
    {
        remove_existing(link)?;
        std::os::unix::fs::symlink(target, link)?;
        Ok(())
    }

    #[cfg(not(unix))]
    {
        Err(ArchiveError::SecurityViolation {
            reason: "symlinks are not supported on this platform".into(),
        })
    }
}

/// Creates a hard link at `link` to the existing file `target`, replacing
/// any existing object at `link`.
pub fn create_hardlink(link: &Path, target: &Path) -> Result<()> {
    if link == target {
        return Ok(());
    }
    remove_existing(link)?;
    fs::hard_link(target, link)?;
    Ok(())
}
