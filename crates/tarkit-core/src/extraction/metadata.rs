//! Best-effort permission, ownership and timestamp updates.
//!
//! None of these fail the entry. Each failure is logged and handed back as a
//! warning string for the report.

use std::fs;
use std::fs::File;
use std::path::Path;
use std::time::Duration;
use std::time::SystemTime;

use log::warn;

/// Which attributes to apply.
#[derive(Debug, Clone, Copy)]
pub struct MetadataPolicy {
    /// Apply mode bits.
    pub permissions: bool,
    /// Apply uid/gid.
    pub owner: bool,
}

/// Attributes taken from an entry.
#[derive(Debug, Clone, Copy)]
pub struct Attributes {
    /// Permission bits.
    pub mode: u32,
    /// Owner user id.
    pub uid: u64,
    /// Owner group id.
    pub gid: u64,
    /// Modification time in seconds.
    pub mtime: u64,
}

/// Applies mtime, ownership and mode through an open file handle.
///
/// Mode is applied last because changing ownership may clear setuid bits.
pub fn apply_to_file(
    file: &File,
    path: &Path,
    attrs: Attributes,
    policy: MetadataPolicy,
    warnings: &mut Vec<String>,
) {
    if let Some(time) = to_system_time(attrs.mtime)
        && let Err(e) = file.set_modified(time)
    {
        note(warnings, format!("failed to set mtime on {}: {e}", path.display()));
    }

    #[cfg(unix)]
    if policy.owner
        && let Some((uid, gid)) = owner_ids(attrs, path, warnings)
        && let Err(e) = std::os::unix::fs::fchown(file, Some(uid), Some(gid))
    {
        note(warnings, format!("failed to set owner on {}: {e}", path.display()));
    }

    #[cfg(unix)]
    if policy.permissions {
        use std::os::unix::fs::PermissionsExt;
        if let Err(e) = file.set_permissions(fs::Permissions::from_mode(attrs.mode & 0o7777)) {
            note(warnings, format!("failed to set mode on {}: {e}", path.display()));
        }
    }
}

/// Applies ownership to a symlink itself.
///
/// Symlink mode and mtime are left alone: changing them would follow the
/// link.
#[allow(unused_variables)]
pub fn apply_to_symlink(
    path: &Path,
    attrs: Attributes,
    policy: MetadataPolicy,
    warnings: &mut Vec<String>,
) {
    #[cfg(unix)]
    if policy.owner
        && let Some((uid, gid)) = owner_ids(attrs, path, warnings)
        && let Err(e) = std::os::unix::fs::lchown(path, Some(uid), Some(gid))
    {
        note(warnings, format!("failed to set owner on {}: {e}", path.display()));
    }
}

/// Applies ownership to a directory right away.
#[allow(unused_variables)]
pub fn apply_owner_to_directory(
    path: &Path,
    attrs: Attributes,
    policy: MetadataPolicy,
    warnings: &mut Vec<String>,
) {
    #[cfg(unix)]
    if policy.owner
        && let Some((uid, gid)) = owner_ids(attrs, path, warnings)
        && let Err(e) = std::os::unix::fs::chown(path, Some(uid), Some(gid))
    {
        note(warnings, format!("failed to set owner on {}: {e}", path.display()));
    }
}

/// Applies mtime and mode to a directory once its children exist.
pub fn apply_deferred_directory(
    path: &Path,
    attrs: Attributes,
    policy: MetadataPolicy,
    warnings: &mut Vec<String>,
) {
    if let Some(time) = to_system_time(attrs.mtime) {
        let result = File::open(path).and_then(|dir| dir.set_modified(time));
        if let Err(e) = result {
            note(warnings, format!("failed to set mtime on {}: {e}", path.display()));
        }
    }

    #[cfg(unix)]
    if policy.permissions {
        use std::os::unix::fs::PermissionsExt;
        let perms = fs::Permissions::from_mode(attrs.mode & 0o7777);
        if let Err(e) = fs::set_permissions(path, perms) {
            note(warnings, format!("failed to set mode on {}: {e}", path.display()));
        }
    }
}

fn to_system_time(mtime: u64) -> Option<SystemTime> {
    SystemTime::UNIX_EPOCH.checked_add(Duration::from_secs(mtime))
}

#[cfg(unix)]
fn owner_ids(attrs: Attributes, path: &Path, warnings: &mut Vec<String>) -> Option<(u32, u32)> {
    match (u32::try_from(attrs.uid), u32::try_from(attrs.gid)) {
        (Ok(uid), Ok(gid)) => Some((uid, gid)),
        _ => {
            note(
                warnings,
                format!(
                    "owner {}:{} of {} out of range",
                    attrs.uid,
                    attrs.gid,
                    path.display()
                ),
            );
            None
        }
    }
}

fn note(warnings: &mut Vec<String>, message: String) {
    warn!("{message}");
    warnings.push(message);
}
