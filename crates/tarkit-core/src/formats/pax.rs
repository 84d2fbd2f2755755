//! PAX extended header records.
//!
//! A PAX payload is a sequence of `<len> <key>=<value>\n` records, where
//! `<len>` counts the whole record including its own digits. Only the keys
//! that override classic header fields are interpreted; everything else is
//! ignored.

use log::debug;
use log::trace;

use super::header;
use super::header::HeaderFields;
use super::header::MAX_OCTAL_SIZE;
use super::header::MAX_SPLIT_NAME_LEN;
use super::header::NAME_FIELD_LEN;
use crate::Result;
use crate::error::FormatIssue;
use crate::types::Entry;
use crate::types::EntryType;

/// PAX key for the full entry path.
pub const PAX_PATH: &str = "path";
/// PAX key for the full link target.
pub const PAX_LINKPATH: &str = "linkpath";
/// PAX key for the content size.
pub const PAX_SIZE: &str = "size";
/// PAX key for the modification time.
pub const PAX_MTIME: &str = "mtime";
/// PAX key for the owner user id.
pub const PAX_UID: &str = "uid";
/// PAX key for the owner group id.
pub const PAX_GID: &str = "gid";
/// PAX key for the owner user name.
pub const PAX_UNAME: &str = "uname";
/// PAX key for the owner group name.
pub const PAX_GNAME: &str = "gname";

/// Directory component of the placeholder name given to PAX header blocks.
const PLACEHOLDER_DIR: &str = "PaxHeaders/";

/// Sparse set of overrides decoded from one PAX payload.
///
/// Absent keys leave the corresponding header field untouched when the
/// overlay is applied.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PaxAttributes {
    /// Full entry path.
    pub path: Option<String>,
    /// Full link target.
    pub linkpath: Option<String>,
    /// Content size.
    pub size: Option<u64>,
    /// Modification time, possibly fractional.
    pub mtime: Option<f64>,
    /// Owner user id.
    pub uid: Option<u64>,
    /// Owner group id.
    pub gid: Option<u64>,
    /// Owner user name.
    pub uname: Option<String>,
    /// Owner group name.
    pub gname: Option<String>,
}

impl PaxAttributes {
    /// Returns `true` if no key is set.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.path.is_none()
            && self.linkpath.is_none()
            && self.size.is_none()
            && self.mtime.is_none()
            && self.uid.is_none()
            && self.gid.is_none()
            && self.uname.is_none()
            && self.gname.is_none()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            PAX_PATH => self.path = Some(value.to_string()),
            PAX_LINKPATH => self.linkpath = Some(value.to_string()),
            PAX_UNAME => self.uname = Some(value.to_string()),
            PAX_GNAME => self.gname = Some(value.to_string()),
            PAX_SIZE => self.size = Some(parse_integer(key, value)?),
            PAX_UID => self.uid = Some(parse_integer(key, value)?),
            PAX_GID => self.gid = Some(parse_integer(key, value)?),
            PAX_MTIME => self.mtime = Some(parse_time(key, value)?),
            _ => trace!("ignoring PAX key {key:?}"),
        }
        Ok(())
    }
}

fn invalid_value(key: &str, value: &str) -> FormatIssue {
    FormatIssue::InvalidPaxValue {
        key: key.to_string(),
        value: value.to_string(),
    }
}

fn parse_integer(key: &str, value: &str) -> Result<u64> {
    value
        .parse::<u64>()
        .map_err(|_| invalid_value(key, value).into())
}

fn parse_time(key: &str, value: &str) -> Result<f64> {
    match value.parse::<f64>() {
        Ok(t) if t.is_finite() && t >= 0.0 => Ok(t),
        _ => Err(invalid_value(key, value).into()),
    }
}

/// Encodes one record, solving for the self-referential length prefix.
///
/// # Examples
///
/// ```
/// use tarkit_core::formats::pax::encode_record;
///
/// assert_eq!(encode_record("path", "foo/bar.txt"), b"20 path=foo/bar.txt\n");
/// ```
#[must_use]
pub fn encode_record(key: &str, value: &str) -> Vec<u8> {
    // space, '=' and newline
    let body = key.len() + value.len() + 3;
    let mut len = body + 1;
    loop {
        let total = body + decimal_digits(len);
        if total == len {
            break;
        }
        len = total;
    }
    format!("{len} {key}={value}\n").into_bytes()
}

const fn decimal_digits(mut n: usize) -> usize {
    let mut digits = 1;
    while n >= 10 {
        n /= 10;
        digits += 1;
    }
    digits
}

/// Encodes every present attribute as a PAX payload.
#[must_use]
pub fn encode(attrs: &PaxAttributes) -> Vec<u8> {
    let mut out = Vec::new();
    if let Some(path) = &attrs.path {
        out.extend(encode_record(PAX_PATH, path));
    }
    if let Some(linkpath) = &attrs.linkpath {
        out.extend(encode_record(PAX_LINKPATH, linkpath));
    }
    if let Some(size) = attrs.size {
        out.extend(encode_record(PAX_SIZE, &size.to_string()));
    }
    if let Some(mtime) = attrs.mtime {
        out.extend(encode_record(PAX_MTIME, &format_time(mtime)));
    }
    if let Some(uid) = attrs.uid {
        out.extend(encode_record(PAX_UID, &uid.to_string()));
    }
    if let Some(gid) = attrs.gid {
        out.extend(encode_record(PAX_GID, &gid.to_string()));
    }
    if let Some(uname) = &attrs.uname {
        out.extend(encode_record(PAX_UNAME, uname));
    }
    if let Some(gname) = &attrs.gname {
        out.extend(encode_record(PAX_GNAME, gname));
    }
    out
}

fn format_time(t: f64) -> String {
    if t.fract() == 0.0 {
        format!("{t:.0}")
    } else {
        t.to_string()
    }
}

/// Decodes a PAX payload.
///
/// Decoding stops at the first structurally malformed record and returns the
/// attributes parsed up to that point.
///
/// # Errors
///
/// Returns [`FormatIssue::InvalidPaxValue`] when a numeric key carries a
/// negative, non-finite or non-numeric value.
///
/// # Examples
///
/// ```
/// use tarkit_core::formats::pax;
///
/// let attrs = pax::decode(b"20 path=foo/bar.txt\n12 uid=1000\ngarbage").unwrap();
/// assert_eq!(attrs.path.as_deref(), Some("foo/bar.txt"));
/// assert_eq!(attrs.uid, Some(1000));
/// ```
pub fn decode(payload: &[u8]) -> Result<PaxAttributes> {
    let mut attrs = PaxAttributes::default();
    let mut rest = payload;

    while !rest.is_empty() {
        let digits = rest.iter().take_while(|b| b.is_ascii_digit()).count();
        if digits == 0 || rest.get(digits) != Some(&b' ') {
            debug!("PAX record without length prefix, stopping");
            break;
        }
        let Some(len) = std::str::from_utf8(&rest[..digits])
            .ok()
            .and_then(|s| s.parse::<usize>().ok())
        else {
            break;
        };
        // Length, space and newline at minimum.
        if len < digits + 2 || len > rest.len() {
            debug!("PAX record length {len} out of range, stopping");
            break;
        }
        let record = &rest[digits + 1..len];
        let Some((&b'\n', kv)) = record.split_last() else {
            debug!("PAX record missing newline terminator, stopping");
            break;
        };
        let Some(eq) = kv.iter().position(|&b| b == b'=') else {
            debug!("PAX record without '=', stopping");
            break;
        };
        let key = String::from_utf8_lossy(&kv[..eq]);
        let value = String::from_utf8_lossy(&kv[eq + 1..]);
        attrs.set(&key, &value)?;
        rest = &rest[len..];
    }

    Ok(attrs)
}

/// Returns `true` if `entry` cannot be represented by a classic header alone.
///
/// Exact boundary values (255-byte name, 100-byte link name, 8,589,934,591
/// byte size) still fit.
#[must_use]
pub fn needs_pax(entry: &Entry) -> bool {
    entry.name.len() > MAX_SPLIT_NAME_LEN
        || entry.linkname.len() > NAME_FIELD_LEN
        || entry.size > MAX_OCTAL_SIZE
}

/// Builds the PAX attributes the writer emits for `entry`.
#[must_use]
pub fn attributes_for(entry: &Entry) -> PaxAttributes {
    PaxAttributes {
        path: (entry.name.len() > NAME_FIELD_LEN).then(|| entry.name.clone()),
        linkpath: (entry.linkname.len() > NAME_FIELD_LEN).then(|| entry.linkname.clone()),
        size: (entry.size > MAX_OCTAL_SIZE).then_some(entry.size),
        ..PaxAttributes::default()
    }
}

/// Emits a PAX header block followed by its padded payload.
///
/// The header carries a placeholder name derived from `name`; readers that
/// understand PAX use the attributes instead.
pub fn create_header_blocks(name: &str, attrs: &PaxAttributes) -> Result<Vec<u8>> {
    let payload = encode(attrs);
    let size = payload.len() as u64;

    let block = header::create(&HeaderFields {
        name: placeholder_name(name),
        entry_type: Some(EntryType::PaxHeader),
        size,
        mode: Some(0o644),
        mtime: Some(0),
        ..HeaderFields::default()
    })?;

    let mut out = Vec::with_capacity(header::BLOCK_SIZE + payload.len() + header::BLOCK_SIZE);
    out.extend_from_slice(&block);
    out.extend_from_slice(&payload);
    out.resize(out.len() + header::padding(size) as usize, 0);
    Ok(out)
}

fn placeholder_name(name: &str) -> String {
    let base = name
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or_default();
    let base = trailing_bytes(base, NAME_FIELD_LEN - PLACEHOLDER_DIR.len());
    format!("{PLACEHOLDER_DIR}{base}")
}

/// Returns the longest suffix of `s` that is at most `max` bytes and starts
/// on a character boundary.
#[must_use]
pub fn trailing_bytes(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut start = s.len() - max;
    while !s.is_char_boundary(start) {
        start += 1;
    }
    &s[start..]
}

/// Overrides the fields of `entry` present in `attrs`.
///
/// A fractional `mtime` is truncated to whole seconds.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn apply_overlay(mut entry: Entry, attrs: &PaxAttributes) -> Entry {
    if let Some(path) = &attrs.path {
        entry.name.clone_from(path);
    }
    if let Some(linkpath) = &attrs.linkpath {
        entry.linkname.clone_from(linkpath);
    }
    if let Some(size) = attrs.size {
        entry.size = size;
    }
    if let Some(mtime) = attrs.mtime {
        entry.mtime = mtime.trunc() as u64;
    }
    if let Some(uid) = attrs.uid {
        entry.uid = uid;
    }
    if let Some(gid) = attrs.gid {
        entry.gid = gid;
    }
    if let Some(uname) = &attrs.uname {
        entry.uname.clone_from(uname);
    }
    if let Some(gname) = &attrs.gname {
        entry.gname.clone_from(gname);
    }
    entry
}
