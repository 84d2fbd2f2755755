//! Source filtering and archive-name computation.

use std::io;
use std::path::Component;
use std::path::Path;

use crate::Result;
use crate::creation::config::CreationConfig;

/// Returns `true` if `relative` (a path below a source root) should be left
/// out of the archive.
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use tarkit_core::creation::CreationConfig;
/// use tarkit_core::creation::filters;
///
/// let config = CreationConfig::default();
/// assert!(filters::should_skip(Path::new("src/.env"), &config));
/// assert!(filters::should_skip(Path::new("build/x.tmp"), &config));
/// assert!(!filters::should_skip(Path::new("src/main.rs"), &config));
/// ```
#[must_use]
pub fn should_skip(relative: &Path, config: &CreationConfig) -> bool {
    if !config.include_hidden && is_hidden(relative) {
        return true;
    }
    config
        .exclude_patterns
        .iter()
        .any(|pattern| matches_pattern(relative, pattern))
}

/// Returns `true` if the final component starts with `.`.
#[must_use]
pub fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| name.starts_with('.'))
}

/// Matches any normal component of `path` against a glob-style pattern.
///
/// Supported forms: exact (`.git`), suffix (`*.tmp`) and prefix (`temp*`).
#[must_use]
pub fn matches_pattern(path: &Path, pattern: &str) -> bool {
    path.components().any(|component| match component {
        Component::Normal(name) => name
            .to_str()
            .is_some_and(|name| pattern_matches(name, pattern)),
        _ => false,
    })
}

fn pattern_matches(s: &str, pattern: &str) -> bool {
    if pattern == s {
        return true;
    }
    if let Some(prefix) = pattern.strip_suffix('*') {
        return s.starts_with(prefix);
    }
    if let Some(suffix) = pattern.strip_prefix('*') {
        return s.ends_with(suffix);
    }
    false
}

/// Converts a relative filesystem path into a forward-slash entry name.
///
/// Directories get a trailing `/`. Root, `.` and `..` components are
/// dropped, so the name is always relative.
///
/// # Errors
///
/// Returns an invalid-data I/O error if the path is not valid UTF-8 or has no
/// normal components.
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use tarkit_core::creation::filters::archive_name;
///
/// assert_eq!(archive_name(Path::new("proj/src"), true).unwrap(), "proj/src/");
/// assert_eq!(archive_name(Path::new("./a.txt"), false).unwrap(), "a.txt");
/// ```
pub fn archive_name(relative: &Path, is_dir: bool) -> Result<String> {
    let mut segments = Vec::new();
    for component in relative.components() {
        if let Component::Normal(segment) = component {
            let segment = segment.to_str().ok_or_else(|| {
                io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!("path is not valid UTF-8: {}", relative.display()),
                )
            })?;
            segments.push(segment);
        }
    }
    if segments.is_empty() {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("cannot derive an entry name from {}", relative.display()),
        )
        .into());
    }

    let mut name = segments.join("/");
    if is_dir {
        name.push('/');
    }
    Ok(name)
}
