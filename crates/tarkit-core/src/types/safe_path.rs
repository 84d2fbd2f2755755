//! Entry name resolution under the extraction root.

use crate::ArchiveError;
use crate::Result;
use std::io;
use std::path::Path;
use std::path::PathBuf;

use super::DestDir;

/// Removes the first `count` non-empty `/`-separated segments of `name`.
///
/// A leading `/` never counts as a segment, so absolute names become
/// relative. Returns `None` when nothing remains. A trailing `/` is kept.
///
/// # Examples
///
/// ```
/// use tarkit_core::types::strip_components;
///
/// assert_eq!(strip_components("pkg/src/lib.rs", 1).as_deref(), Some("src/lib.rs"));
/// assert_eq!(strip_components("/etc/passwd", 0).as_deref(), Some("etc/passwd"));
/// assert_eq!(strip_components("pkg/", 1), None);
/// ```
#[must_use]
pub fn strip_components(name: &str, count: usize) -> Option<String> {
    let segments: Vec<&str> = name
        .split('/')
        .filter(|s| !s.is_empty())
        .skip(count)
        .collect();
    if segments.is_empty() {
        return None;
    }
    let mut stripped = segments.join("/");
    if name.ends_with('/') {
        stripped.push('/');
    }
    Some(stripped)
}

/// A relative path proven to resolve inside a [`DestDir`].
///
/// Construction normalizes `.` and `..` lexically, then checks that the
/// deepest existing ancestor of the target, with symlinks resolved, is still
/// inside the root. An empty `SafePath` denotes the root itself.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SafePath(PathBuf);

impl SafePath {
    /// Validates `name` (already stripped) against `dest`.
    ///
    /// # Errors
    ///
    /// - [`ArchiveError::PathTraversal`] if `..` climbs above the root or an
    ///   existing ancestor resolves outside it.
    /// - [`ArchiveError::SecurityViolation`] if the name contains a NUL byte.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use tarkit_core::types::{DestDir, SafePath};
    ///
    /// # fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// let dest = DestDir::new("/tmp/out")?;
    /// let safe = SafePath::validate("a/./b/../c.txt", &dest)?;
    /// assert_eq!(safe.as_path(), std::path::Path::new("a/c.txt"));
    /// assert!(SafePath::validate("../../etc/evil", &dest).is_err());
    /// # Ok(())
    /// # }
    /// ```
    pub fn validate(name: &str, dest: &DestDir) -> Result<Self> {
        if name.contains('\0') {
            return Err(ArchiveError::SecurityViolation {
                reason: format!("path contains null bytes: {name:?}"),
            });
        }

        let mut segments: Vec<&str> = Vec::new();
        for segment in name.split('/') {
            match segment {
                "" | "." => {}
                ".." => {
                    if segments.pop().is_none() {
                        return Err(ArchiveError::PathTraversal {
                            path: PathBuf::from(name),
                        });
                    }
                }
                other => segments.push(other),
            }
        }
        let relative: PathBuf = segments.iter().collect();

        let target = dest.as_path().join(&relative);
        if let Some(parent) = target.parent()
            && target != dest.as_path()
        {
            let ancestor = deepest_existing(parent, dest.as_path());
            let canonical = ancestor.canonicalize()?;
            if !canonical.starts_with(dest.as_path()) {
                return Err(ArchiveError::PathTraversal {
                    path: PathBuf::from(name),
                });
            }
        }

        Ok(Self(relative))
    }

    /// Returns the normalized relative path.
    #[inline]
    #[must_use]
    pub fn as_path(&self) -> &Path {
        &self.0
    }

    /// Returns `true` if this path is the root itself.
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.0.as_os_str().is_empty()
    }
}

/// Walks up from `path` to the first ancestor that exists, stopping at `root`.
fn deepest_existing<'a>(path: &'a Path, root: &'a Path) -> &'a Path {
    let mut current = path;
    loop {
        match current.symlink_metadata() {
            Ok(_) => return current,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(_) => return current,
        }
        match current.parent() {
            Some(parent) if current != root => current = parent,
            _ => return root,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn dest() -> (TempDir, DestDir) {
        let temp = TempDir::new().expect("failed to create temp dir");
        let dest = DestDir::new(temp.path()).expect("valid dest");
        (temp, dest)
    }

    #[test]
    fn test_strip_components() {
        assert_eq!(strip_components("a/b/c", 0).as_deref(), Some("a/b/c"));
        assert_eq!(strip_components("a/b/c", 2).as_deref(), Some("c"));
        assert_eq!(strip_components("a/b/c", 3), None);
        assert_eq!(strip_components("a//b", 1).as_deref(), Some("b"));
        assert_eq!(strip_components("a/b/", 1).as_deref(), Some("b/"));
        assert_eq!(strip_components("/", 0), None);
        assert_eq!(strip_components("", 0), None);
    }

    #[test]
    fn test_validate_normal_path() {
        let (_temp, dest) = dest();
        let safe = SafePath::validate("foo/bar.txt", &dest).unwrap();
        assert_eq!(safe.as_path(), Path::new("foo/bar.txt"));
        assert!(dest.join(&safe).starts_with(dest.as_path()));
    }

    #[test]
    fn test_validate_normalizes_dots() {
        let (_temp, dest) = dest();
        let safe = SafePath::validate("./a/./b/../c", &dest).unwrap();
        assert_eq!(safe.as_path(), Path::new("a/c"));
        assert!(SafePath::validate("a/..", &dest).unwrap().is_root());
    }

    #[test]
    fn test_validate_rejects_escape() {
        let (_temp, dest) = dest();
        for name in ["..", "../x", "../../etc/evil", "a/../../x", "a/b/../../../x"] {
            assert!(
                matches!(
                    SafePath::validate(name, &dest),
                    Err(ArchiveError::PathTraversal { .. })
                ),
                "{name} should be rejected"
            );
        }
    }

    #[test]
    fn test_validate_rejects_null_byte() {
        let (_temp, dest) = dest();
        assert!(matches!(
            SafePath::validate("a\0b", &dest),
            Err(ArchiveError::SecurityViolation { .. })
        ));
    }

    #[test]
    #[cfg(unix)]
    fn test_validate_rejects_symlinked_parent_outside_root() {
        use std::os::unix::fs::symlink;

        let (temp, dest) = dest();
        let outside = TempDir::new().unwrap();
        symlink(outside.path(), temp.path().join("escape")).unwrap();

        assert!(matches!(
            SafePath::validate("escape/file.txt", &dest),
            Err(ArchiveError::PathTraversal { .. })
        ));
        assert!(matches!(
            SafePath::validate("escape/new/dir/file.txt", &dest),
            Err(ArchiveError::PathTraversal { .. })
        ));
    }

    #[test]
    #[cfg(unix)]
    fn test_validate_allows_symlinked_parent_inside_root() {
        use std::os::unix::fs::symlink;

        let (temp, dest) = dest();
        fs::create_dir(temp.path().join("real")).unwrap();
        symlink("real", temp.path().join("alias")).unwrap();
        assert!(SafePath::validate("alias/file.txt", &dest).is_ok());
    }

    #[test]
    #[cfg(unix)]
    fn test_final_component_symlink_not_followed() {
        use std::os::unix::fs::symlink;

        let (temp, dest) = dest();
        symlink("/etc/passwd", temp.path().join("link")).unwrap();
        // The link itself is replaced during extraction, never written through.
        assert!(SafePath::validate("link", &dest).is_ok());
    }
}
