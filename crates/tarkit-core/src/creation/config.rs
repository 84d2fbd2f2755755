//! Configuration for building archives from the filesystem.

use crate::formats::CompressionCodec;

/// Configuration for [`create_archive_file`](crate::create_archive_file).
///
/// Defaults store symlinks as links, skip hidden files and exclude `.git`,
/// `.DS_Store` and `*.tmp`. Compression is chosen from the output file
/// extension unless [`compression`](Self::compression) is set.
///
/// # Examples
///
/// ```
/// use tarkit_core::creation::CreationConfig;
/// use tarkit_core::formats::CompressionCodec;
///
/// let config = CreationConfig::default()
///     .with_include_hidden(true)
///     .with_compression(Some(CompressionCodec::Xz))
///     .with_compression_level(9);
///
/// assert!(config.include_hidden);
/// assert_eq!(config.compression_level, Some(9));
/// ```
#[derive(Debug, Clone)]
pub struct CreationConfig {
    /// Archive what symlinks point to instead of the links themselves.
    pub follow_symlinks: bool,

    /// Include files and directories whose name starts with `.`.
    pub include_hidden: bool,

    /// Glob-style patterns (`name`, `*.ext`, `prefix*`) matched against every
    /// path component.
    pub exclude_patterns: Vec<String>,

    /// Compression wrapper; `None` infers it from the output extension.
    pub compression: Option<CompressionCodec>,

    /// Compression level 1-9; `None` uses the codec default.
    pub compression_level: Option<u8>,
}

impl Default for CreationConfig {
    fn default() -> Self {
        Self {
            follow_symlinks: false,
            include_hidden: false,
            exclude_patterns: vec![
                ".git".to_string(),
                ".DS_Store".to_string(),
                "*.tmp".to_string(),
            ],
            compression: None,
            compression_level: None,
        }
    }
}

impl CreationConfig {
    /// Creates a configuration with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets whether to follow symlinks.
    #[must_use]
    pub fn with_follow_symlinks(mut self, follow: bool) -> Self {
        self.follow_symlinks = follow;
        self
    }

    /// Sets whether to include hidden files.
    #[must_use]
    pub fn with_include_hidden(mut self, include: bool) -> Self {
        self.include_hidden = include;
        self
    }

    /// Replaces the exclude patterns.
    #[must_use]
    pub fn with_exclude_patterns(mut self, patterns: Vec<String>) -> Self {
        self.exclude_patterns = patterns;
        self
    }

    /// Forces a compression codec regardless of the output extension.
    #[must_use]
    pub fn with_compression(mut self, codec: Option<CompressionCodec>) -> Self {
        self.compression = codec;
        self
    }

    /// Sets the compression level, clamped to 1-9.
    #[must_use]
    pub fn with_compression_level(mut self, level: u8) -> Self {
        self.compression_level = Some(level.clamp(1, 9));
        self
    }
}
