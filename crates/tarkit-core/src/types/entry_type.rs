//! Archive entry type enumeration.

/// Type of entry in an archive, decoded from the header type flag.
///
/// The set is closed: any flag byte the codec does not recognise (including
/// the historical NUL flag and device/FIFO flags) decodes as [`EntryType::File`].
///
/// # Examples
///
/// ```
/// use tarkit_core::EntryType;
///
/// assert_eq!(EntryType::from_byte(b'5'), EntryType::Directory);
/// assert_eq!(EntryType::from_byte(b'\0'), EntryType::File);
/// assert_eq!(EntryType::from_byte(b'Z'), EntryType::File);
/// assert_eq!(EntryType::Symlink.to_byte(), b'2');
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum EntryType {
    /// Regular file entry.
    #[default]
    File,

    /// Directory entry.
    Directory,

    /// Symbolic link entry; the target lives in the entry's `linkname`.
    Symlink,

    /// Hard link entry; the target lives in the entry's `linkname`.
    Hardlink,

    /// Per-entry PAX extended header (`x`).
    PaxHeader,

    /// Global PAX extended header (`g`).
    PaxGlobal,
}

impl EntryType {
    /// Decodes a header type flag byte.
    #[must_use]
    pub const fn from_byte(flag: u8) -> Self {
        match flag {
            b'1' => Self::Hardlink,
            b'2' => Self::Symlink,
            b'5' => Self::Directory,
            b'x' => Self::PaxHeader,
            b'g' => Self::PaxGlobal,
            _ => Self::File,
        }
    }

    /// Encodes this type as a header type flag byte.
    #[must_use]
    pub const fn to_byte(self) -> u8 {
        match self {
            Self::File => b'0',
            Self::Hardlink => b'1',
            Self::Symlink => b'2',
            Self::Directory => b'5',
            Self::PaxHeader => b'x',
            Self::PaxGlobal => b'g',
        }
    }

    /// Returns `true` if this is a regular file.
    #[must_use]
    pub const fn is_file(self) -> bool {
        matches!(self, Self::File)
    }

    /// Returns `true` if this is a directory.
    #[must_use]
    pub const fn is_directory(self) -> bool {
        matches!(self, Self::Directory)
    }

    /// Returns `true` if this is a symlink.
    #[must_use]
    pub const fn is_symlink(self) -> bool {
        matches!(self, Self::Symlink)
    }

    /// Returns `true` if this is a hardlink.
    #[must_use]
    pub const fn is_hardlink(self) -> bool {
        matches!(self, Self::Hardlink)
    }

    /// Returns `true` for either kind of PAX extended header.
    #[must_use]
    pub const fn is_pax(self) -> bool {
        matches!(self, Self::PaxHeader | Self::PaxGlobal)
    }

    /// Returns `true` if entries of this type never carry content.
    #[must_use]
    pub const fn is_contentless(self) -> bool {
        matches!(self, Self::Directory | Self::Symlink | Self::Hardlink)
    }

    /// Default permission bits for newly created entries of this type.
    #[must_use]
    pub const fn default_mode(self) -> u32 {
        match self {
            Self::Directory => 0o755,
            _ => 0o644,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flag_roundtrip() {
        for ty in [
            EntryType::File,
            EntryType::Directory,
            EntryType::Symlink,
            EntryType::Hardlink,
            EntryType::PaxHeader,
            EntryType::PaxGlobal,
        ] {
            assert_eq!(EntryType::from_byte(ty.to_byte()), ty);
        }
    }

    #[test]
    fn test_legacy_flags_default_to_file() {
        assert_eq!(EntryType::from_byte(0), EntryType::File);
        assert_eq!(EntryType::from_byte(b'0'), EntryType::File);
        assert_eq!(EntryType::from_byte(b'3'), EntryType::File);
        assert_eq!(EntryType::from_byte(b'7'), EntryType::File);
        assert_eq!(EntryType::from_byte(b'L'), EntryType::File);
        assert_eq!(EntryType::from_byte(0xff), EntryType::File);
    }

    #[test]
    fn test_predicates() {
        assert!(EntryType::File.is_file());
        assert!(EntryType::Directory.is_directory());
        assert!(EntryType::Symlink.is_symlink());
        assert!(EntryType::Hardlink.is_hardlink());
        assert!(EntryType::PaxHeader.is_pax());
        assert!(EntryType::PaxGlobal.is_pax());
        assert!(!EntryType::File.is_pax());
        assert!(EntryType::Symlink.is_contentless());
        assert!(!EntryType::File.is_contentless());
    }

    #[test]
    fn test_default_modes() {
        assert_eq!(EntryType::Directory.default_mode(), 0o755);
        assert_eq!(EntryType::File.default_mode(), 0o644);
        assert_eq!(EntryType::Symlink.default_mode(), 0o644);
    }
}
