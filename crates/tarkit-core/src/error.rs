//! Error types for archive reading, writing and extraction.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using `ArchiveError`.
pub type Result<T> = std::result::Result<T, ArchiveError>;

/// Describes why a block or extended header could not be decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormatIssue {
    /// A header block was not exactly 512 bytes long.
    WrongLength {
        /// Length of the block that was supplied.
        len: usize,
    },
    /// The stored header checksum does not match the recomputed one.
    InvalidChecksum {
        /// Checksum stored in the header.
        expected: u64,
        /// Checksum computed over the block.
        computed: u64,
    },
    /// A numeric header field holds something other than octal or base-256.
    InvalidNumber {
        /// Name of the header field.
        field: &'static str,
    },
    /// A recognised PAX key carries a value that is not a valid number.
    InvalidPaxValue {
        /// The PAX key.
        key: String,
        /// The rejected value.
        value: String,
    },
    /// A PAX payload exceeds the configured reader limit.
    PaxTooLarge {
        /// Declared payload size.
        size: u64,
        /// Configured limit.
        limit: u64,
    },
}

impl std::fmt::Display for FormatIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::WrongLength { len } => write!(f, "wrong length: {len} bytes (expected 512)"),
            Self::InvalidChecksum { expected, computed } => {
                write!(f, "invalid checksum (stored {expected}, computed {computed})")
            }
            Self::InvalidNumber { field } => write!(f, "invalid numeric field: {field}"),
            Self::InvalidPaxValue { key, value } => {
                write!(f, "invalid PAX value for {key}: {value:?}")
            }
            Self::PaxTooLarge { size, limit } => {
                write!(f, "PAX header too large ({size} > {limit} bytes)")
            }
        }
    }
}

/// Errors that can occur while reading, writing or extracting an archive.
#[derive(Error, Debug)]
pub enum ArchiveError {
    /// I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The archive is structurally invalid.
    #[error("invalid archive: {0}")]
    Format(FormatIssue),

    /// Input ended while entry content was still owed.
    #[error("unexpected end of archive: {missing} content bytes missing")]
    Truncated {
        /// Number of content bytes that never arrived.
        missing: u64,
    },

    /// An entry resolves outside the extraction root.
    #[error("path traversal detected: {path}")]
    PathTraversal {
        /// The entry name that attempted traversal.
        path: PathBuf,
    },

    /// A hardlink target resolves outside the extraction root.
    #[error("hardlink target outside extraction directory: {path}")]
    HardlinkEscape {
        /// The offending link target.
        path: PathBuf,
    },

    /// Operation not permitted by extraction policy.
    #[error("operation denied by security policy: {reason}")]
    SecurityViolation {
        /// Reason for the violation.
        reason: String,
    },

    /// A name cannot be stored in a classic header.
    #[error("name too long for ustar header ({len} bytes): {name}")]
    NameTooLong {
        /// The full entry name.
        name: String,
        /// Its length in bytes.
        len: usize,
    },

    /// A link target cannot be stored in a classic header.
    #[error("link name too long for ustar header ({len} bytes): {linkname}")]
    LinkNameTooLong {
        /// The full link target.
        linkname: String,
        /// Its length in bytes.
        len: usize,
    },

    /// The requested compression wrapper is not supported.
    #[error("unsupported archive format")]
    UnsupportedFormat,
}

impl ArchiveError {
    /// Returns `true` if this error represents a security violation.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::path::PathBuf;
    /// use tarkit_core::ArchiveError;
    ///
    /// let err = ArchiveError::PathTraversal {
    ///     path: PathBuf::from("../etc/passwd"),
    /// };
    /// assert!(err.is_security_violation());
    ///
    /// let err = ArchiveError::Truncated { missing: 12 };
    /// assert!(!err.is_security_violation());
    /// ```
    #[must_use]
    pub const fn is_security_violation(&self) -> bool {
        matches!(
            self,
            Self::PathTraversal { .. } | Self::HardlinkEscape { .. } | Self::SecurityViolation { .. }
        )
    }

    /// Returns `true` if the archive bytes themselves are malformed.
    #[must_use]
    pub const fn is_format_error(&self) -> bool {
        matches!(self, Self::Format(_) | Self::Truncated { .. })
    }

    /// Returns the format issue, if this is a format error.
    #[must_use]
    pub const fn format_issue(&self) -> Option<&FormatIssue> {
        match self {
            Self::Format(issue) => Some(issue),
            _ => None,
        }
    }
}

impl From<FormatIssue> for ArchiveError {
    fn from(issue: FormatIssue) -> Self {
        Self::Format(issue)
    }
}
