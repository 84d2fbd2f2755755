//! Filesystem enumeration for archive creation.
//!
//! Turns source paths into an ordered list of [`SourceEntry`] values:
//! archive name, stat-like metadata and link target. Content is not read
//! here; the packer streams it from [`SourceEntry::path`] when the entry is
//! written.

use std::fs;
use std::fs::Metadata;
use std::io;
use std::path::Path;
use std::path::PathBuf;

use log::debug;
use log::warn;
use walkdir::WalkDir;

use crate::Result;
use crate::creation::config::CreationConfig;
use crate::creation::filters;
use crate::types::Entry;
use crate::types::EntryType;

/// Kind of filesystem object found by the walker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    /// Regular file.
    File,
    /// Directory.
    Directory,
    /// Symbolic link stored as a link.
    Symlink,
}

/// One filesystem object ready to be written to an archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceEntry {
    /// Location on disk.
    pub path: PathBuf,

    /// Forward-slash entry name; directories end with `/`.
    pub name: String,

    /// Object kind.
    pub kind: SourceKind,

    /// Content length; 0 unless [`SourceKind::File`].
    pub size: u64,

    /// Permission bits.
    pub mode: u32,

    /// Owner user id.
    pub uid: u64,

    /// Owner group id.
    pub gid: u64,

    /// Modification time, seconds since the epoch.
    pub mtime: u64,

    /// Symlink target.
    pub link_target: Option<String>,
}

impl SourceEntry {
    /// Builds the header-only [`Entry`] for this object.
    ///
    /// The returned entry carries `size` but no content bytes.
    #[must_use]
    pub fn to_entry(&self) -> Entry {
        let entry_type = match self.kind {
            SourceKind::File => EntryType::File,
            SourceKind::Directory => EntryType::Directory,
            SourceKind::Symlink => EntryType::Symlink,
        };
        Entry {
            name: self.name.clone(),
            entry_type,
            size: self.size,
            mode: self.mode,
            uid: self.uid,
            gid: self.gid,
            mtime: self.mtime,
            linkname: self.link_target.clone().unwrap_or_default(),
            ..Entry::default()
        }
    }
}

/// Walks every source and returns the objects to archive, in archive order.
///
/// A directory source is stored under its own name (`proj` yields `proj/`,
/// `proj/a.txt`, ...); a source without a final name such as `.` contributes
/// only its children. Siblings are sorted by file name so the output is
/// deterministic. Excluded directories are pruned together with their
/// contents. Sockets, FIFOs and device nodes are skipped with a warning.
///
/// # Errors
///
/// Returns an I/O error if a source does not exist, a directory cannot be
/// read or a path is not valid UTF-8.
///
/// # Examples
///
/// ```no_run
/// use tarkit_core::creation::CreationConfig;
/// use tarkit_core::creation::walker::collect_entries;
///
/// let entries = collect_entries(&["src"], &CreationConfig::default())?;
/// for entry in &entries {
///     println!("{}", entry.name);
/// }
/// # Ok::<(), tarkit_core::ArchiveError>(())
/// ```
pub fn collect_entries<P: AsRef<Path>>(
    sources: &[P],
    config: &CreationConfig,
) -> Result<Vec<SourceEntry>> {
    let mut entries = Vec::new();
    for source in sources {
        walk_source(source.as_ref(), config, &mut entries)?;
    }
    debug!("collected {} entries from {} sources", entries.len(), sources.len());
    Ok(entries)
}

fn walk_source(source: &Path, config: &CreationConfig, out: &mut Vec<SourceEntry>) -> Result<()> {
    if fs::symlink_metadata(source).is_err() {
        return Err(io::Error::new(
            io::ErrorKind::NotFound,
            format!("source not found: {}", source.display()),
        )
        .into());
    }

    let base = source.file_name().map(PathBuf::from);
    let relative_to_source = |path: &Path| -> PathBuf {
        let below = path.strip_prefix(source).unwrap_or(path);
        base.as_ref()
            .map_or_else(|| below.to_path_buf(), |base| base.join(below))
    };

    let walker = WalkDir::new(source)
        .follow_links(config.follow_symlinks)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| {
            entry.depth() == 0 || !filters::should_skip(&relative_to_source(entry.path()), config)
        });

    for entry in walker {
        let entry = entry.map_err(io::Error::from)?;
        if entry.depth() == 0 && base.is_none() {
            continue;
        }

        let relative = relative_to_source(entry.path());
        let file_type = entry.file_type();
        let kind = if file_type.is_symlink() {
            SourceKind::Symlink
        } else if file_type.is_dir() {
            SourceKind::Directory
        } else if file_type.is_file() {
            SourceKind::File
        } else {
            warn!("skipping special file {}", entry.path().display());
            continue;
        };

        let metadata = entry.metadata().map_err(io::Error::from)?;
        let link_target = if kind == SourceKind::Symlink {
            let target = fs::read_link(entry.path())?;
            Some(target.to_string_lossy().into_owned())
        } else {
            None
        };

        let (uid, gid) = owner_of(&metadata);
        out.push(SourceEntry {
            path: entry.path().to_path_buf(),
            name: filters::archive_name(&relative, kind == SourceKind::Directory)?,
            kind,
            size: if kind == SourceKind::File {
                metadata.len()
            } else {
                0
            },
            mode: mode_of(&metadata, kind),
            uid,
            gid,
            mtime: mtime_of(&metadata),
            link_target,
        });
    }
    Ok(())
}

#[cfg(unix)]
fn mode_of(metadata: &Metadata, _kind: SourceKind) -> u32 {
    use std::os::unix::fs::MetadataExt;
    metadata.mode() & 0o7777
}

#[cfg(not(unix))]
fn mode_of(metadata: &Metadata, kind: SourceKind) -> u32 {
    match kind {
        SourceKind::Directory => 0o755,
        SourceKind::Symlink => 0o777,
        SourceKind::File if metadata.permissions().readonly() => 0o444,
        SourceKind::File => 0o644,
    }
}

#[cfg(unix)]
fn owner_of(metadata: &Metadata) -> (u64, u64) {
    use std::os::unix::fs::MetadataExt;
    (u64::from(metadata.uid()), u64::from(metadata.gid()))
}

#[cfg(not(unix))]
fn owner_of(_metadata: &Metadata) -> (u64, u64) {
    (0, 0)
}

fn mtime_of(metadata: &Metadata) -> u64 {
    metadata
        .modified()
        .ok()
        .and_then(|time| time.duration_since(std::time::UNIX_EPOCH).ok())
        .map_or(0, |elapsed| elapsed.as_secs())
}
