//! Logical archive entry.

use super::EntryType;
use crate::formats::header::now_secs;

/// One logical item of an archive, with any PAX overlay already applied.
///
/// The `file`, `directory`, `symlink` and `hardlink` constructors stamp the
/// current time; use [`with_mtime`](Self::with_mtime) for a fixed one.
///
/// Entries produced by [`ArchiveReader`](crate::ArchiveReader) are complete:
/// `content` holds exactly `size` bytes for files (unless the reader was told
/// not to retain content) and is empty for directories and links.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Entry {
    /// Forward-slash separated path inside the archive.
    pub name: String,
    /// Entry kind.
    pub entry_type: EntryType,
    /// Content length in bytes.
    pub size: u64,
    /// Permission bits.
    pub mode: u32,
    /// Owner user id.
    pub uid: u64,
    /// Owner group id.
    pub gid: u64,
    /// Modification time, whole seconds since the Unix epoch.
    pub mtime: u64,
    /// Owner user name, possibly empty.
    pub uname: String,
    /// Owner group name, possibly empty.
    pub gname: String,
    /// Link target for symlinks and hardlinks, empty otherwise.
    pub linkname: String,
    /// Device major number.
    pub devmajor: u32,
    /// Device minor number.
    pub devminor: u32,
    /// Entry content.
    pub content: Vec<u8>,
}

impl Entry {
    /// Creates a regular file entry holding `content`.
    ///
    /// # Examples
    ///
    /// ```
    /// use tarkit_core::Entry;
    /// use tarkit_core::EntryType;
    ///
    /// let entry = Entry::file("a.txt", b"hi".to_vec());
    /// assert_eq!(entry.entry_type, EntryType::File);
    /// assert_eq!(entry.size, 2);
    /// assert_eq!(entry.mode, 0o644);
    /// ```
    #[must_use]
    pub fn file(name: impl Into<String>, content: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            entry_type: EntryType::File,
            size: content.len() as u64,
            mode: EntryType::File.default_mode(),
            content,
            mtime: now_secs(),
            ..Self::default()
        }
    }

    /// Creates a directory entry. A trailing `/` is added if missing.
    #[must_use]
    pub fn directory(name: impl Into<String>) -> Self {
        let mut name = name.into();
        if !name.ends_with('/') {
            name.push('/');
        }
        Self {
            name,
            entry_type: EntryType::Directory,
            mode: EntryType::Directory.default_mode(),
            mtime: now_secs(),
            ..Self::default()
        }
    }

    /// Creates a symbolic link entry pointing at `target`.
    #[must_use]
    pub fn symlink(name: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entry_type: EntryType::Symlink,
            mode: 0o777,
            linkname: target.into(),
            mtime: now_secs(),
            ..Self::default()
        }
    }

    /// Creates a hard link entry pointing at the archive member `target`.
    #[must_use]
    pub fn hardlink(name: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entry_type: EntryType::Hardlink,
            mode: EntryType::Hardlink.default_mode(),
            linkname: target.into(),
            mtime: now_secs(),
            ..Self::default()
        }
    }

    /// Sets the modification time.
    #[must_use]
    pub fn with_mtime(mut self, mtime: u64) -> Self {
        self.mtime = mtime;
        self
    }

    /// Sets the permission bits.
    #[must_use]
    pub fn with_mode(mut self, mode: u32) -> Self {
        self.mode = mode;
        self
    }

    /// Sets numeric and symbolic ownership.
    #[must_use]
    pub fn with_owner(
        mut self,
        uid: u64,
        gid: u64,
        uname: impl Into<String>,
        gname: impl Into<String>,
    ) -> Self {
        self.uid = uid;
        self.gid = gid;
        self.uname = uname.into();
        self.gname = gname.into();
        self
    }

    /// Content bytes as a slice.
    #[inline]
    #[must_use]
    pub fn content(&self) -> &[u8] {
        &self.content
    }
}
