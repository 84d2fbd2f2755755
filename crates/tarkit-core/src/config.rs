//! Reader limits and extraction options.

use std::fmt;
use std::sync::Arc;

use crate::types::Entry;

/// Default upper bound on a single PAX payload.
pub const DEFAULT_MAX_PAX_SIZE: u64 = 1024 * 1024;

/// Limits and behaviour switches for [`ArchiveReader`](crate::ArchiveReader).
///
/// # Examples
///
/// ```
/// use tarkit_core::ReaderConfig;
///
/// let config = ReaderConfig {
///     retain_content: false,
///     ..Default::default()
/// };
/// assert_eq!(config.max_pax_size, 1024 * 1024);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReaderConfig {
    /// Largest PAX payload accepted, in bytes. Larger payloads are a format
    /// error.
    pub max_pax_size: u64,

    /// Keep content bytes on emitted entries. When `false`, content is still
    /// consumed from the stream but `Entry::content` stays empty.
    pub retain_content: bool,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            max_pax_size: DEFAULT_MAX_PAX_SIZE,
            retain_content: true,
        }
    }
}

/// Inclusion predicate evaluated on each entry after stripping.
pub type EntryFilter = Arc<dyn Fn(&Entry) -> bool + Send + Sync>;

/// Options for the extraction orchestrator.
///
/// # Examples
///
/// ```
/// use tarkit_core::ExtractOptions;
///
/// let options = ExtractOptions::default()
///     .with_strip_components(1)
///     .with_filter(|entry| !entry.name.ends_with(".log"));
/// assert_eq!(options.strip_components, 1);
/// assert!(!options.preserve_owner);
/// ```
#[derive(Clone)]
pub struct ExtractOptions {
    /// Number of leading path segments removed from every entry name.
    pub strip_components: usize,

    /// Entries for which the predicate returns `false` are skipped.
    pub filter: Option<EntryFilter>,

    /// Apply uid/gid from the archive. Requires sufficient privilege;
    /// failures are ignored.
    pub preserve_owner: bool,

    /// Apply mode bits from the archive.
    pub preserve_permissions: bool,

    /// Limits for the underlying reader. `retain_content` is ignored:
    /// extraction always needs content bytes.
    pub reader: ReaderConfig,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            strip_components: 0,
            filter: None,
            preserve_owner: false,
            preserve_permissions: true,
            reader: ReaderConfig::default(),
        }
    }
}

impl fmt::Debug for ExtractOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtractOptions")
            .field("strip_components", &self.strip_components)
            .field("filter", &self.filter.as_ref().map(|_| "<fn>"))
            .field("preserve_owner", &self.preserve_owner)
            .field("preserve_permissions", &self.preserve_permissions)
            .field("reader", &self.reader)
            .finish()
    }
}

impl ExtractOptions {
    /// Sets the number of leading path segments to strip.
    #[must_use]
    pub const fn with_strip_components(mut self, count: usize) -> Self {
        self.strip_components = count;
        self
    }

    /// Sets the inclusion predicate.
    #[must_use]
    pub fn with_filter<F>(mut self, filter: F) -> Self
    where
        F: Fn(&Entry) -> bool + Send + Sync + 'static,
    {
        self.filter = Some(Arc::new(filter));
        self
    }

    /// Sets whether ownership is applied.
    #[must_use]
    pub const fn with_preserve_owner(mut self, preserve: bool) -> Self {
        self.preserve_owner = preserve;
        self
    }

    /// Sets whether mode bits are applied.
    #[must_use]
    pub const fn with_preserve_permissions(mut self, preserve: bool) -> Self {
        self.preserve_permissions = preserve;
        self
    }

    /// Sets the reader limits.
    #[must_use]
    pub const fn with_reader_config(mut self, reader: ReaderConfig) -> Self {
        self.reader = reader;
        self
    }

    /// Evaluates the inclusion predicate; entries pass when none is set.
    #[must_use]
    pub fn includes(&self, entry: &Entry) -> bool {
        self.filter.as_ref().is_none_or(|filter| filter(entry))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_defaults() {
        let options = ExtractOptions::default();
        assert_eq!(options.strip_components, 0);
        assert!(options.filter.is_none());
        assert!(!options.preserve_owner);
        assert!(options.preserve_permissions);
        assert_eq!(options.reader, ReaderConfig::default());
    }

    #[test]
    fn test_filter_applies() {
        let options = ExtractOptions::default().with_filter(|e| e.name.starts_with("keep"));
        assert!(options.includes(&Entry::file("keep/me", Vec::new())));
        assert!(!options.includes(&Entry::file("drop/me", Vec::new())));
        assert!(ExtractOptions::default().includes(&Entry::file("x", Vec::new())));
    }

    #[test]
    fn test_debug_hides_closure() {
        let options = ExtractOptions::default().with_filter(|_| true);
        let debug = format!("{options:?}");
        assert!(debug.contains("<fn>"));
        assert!(debug.contains("strip_components"));
    }
}
