//! Fixed-layout ustar header block codec.
//!
//! Every archive element is aligned to 512-byte blocks. A header block has
//! the POSIX ustar layout:
//!
//! | Offset | Size | Field     |
//! |--------|------|-----------|
//! | 0      | 100  | name      |
//! | 100    | 8    | mode      |
//! | 108    | 8    | uid       |
//! | 116    | 8    | gid       |
//! | 124    | 12   | size      |
//! | 136    | 12   | mtime     |
//! | 148    | 8    | checksum  |
//! | 156    | 1    | typeflag  |
//! | 157    | 100  | linkname  |
//! | 257    | 6    | magic     |
//! | 263    | 2    | version   |
//! | 265    | 32   | uname     |
//! | 297    | 32   | gname     |
//! | 329    | 8    | devmajor  |
//! | 337    | 8    | devminor  |
//! | 345    | 155  | prefix    |
//!
//! Numeric fields are octal ASCII terminated by a NUL. Values too large for
//! the octal form are written in GNU base-256 (high bit of the first byte
//! set), which [`parse`] also accepts.

use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use zerocopy::FromBytes;
use zerocopy::Immutable;
use zerocopy::IntoBytes;
use zerocopy::KnownLayout;

use crate::ArchiveError;
use crate::Result;
use crate::error::FormatIssue;
use crate::types::Entry;
use crate::types::EntryType;

/// Size of a header block and of the archive's alignment unit.
pub const BLOCK_SIZE: usize = 512;

/// Width of the classic name and linkname fields.
pub const NAME_FIELD_LEN: usize = 100;

/// Width of the ustar prefix field.
pub const PREFIX_FIELD_LEN: usize = 155;

/// Longest name that can be split across prefix and name.
pub const MAX_SPLIT_NAME_LEN: usize = 255;

/// Largest value an 11-digit octal size field holds.
pub const MAX_OCTAL_SIZE: u64 = 0o777_7777_7777;

/// Magic value identifying a POSIX ustar header.
pub const USTAR_MAGIC: &[u8; 6] = b"ustar\0";

/// Version value of a POSIX ustar header.
pub const USTAR_VERSION: &[u8; 2] = b"00";

const CHECKSUM_RANGE: std::ops::Range<usize> = 148..156;

#[derive(Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout)]
#[repr(C)]
struct UstarHeader {
    name: [u8; 100],
    mode: [u8; 8],
    uid: [u8; 8],
    gid: [u8; 8],
    size: [u8; 12],
    mtime: [u8; 12],
    checksum: [u8; 8],
    typeflag: u8,
    linkname: [u8; 100],
    magic: [u8; 6],
    version: [u8; 2],
    uname: [u8; 32],
    gname: [u8; 32],
    devmajor: [u8; 8],
    devminor: [u8; 8],
    prefix: [u8; 155],
    pad: [u8; 12],
}

impl Default for UstarHeader {
    fn default() -> Self {
        Self {
            name: [0u8; 100],
            mode: [0u8; 8],
            uid: [0u8; 8],
            gid: [0u8; 8],
            size: [0u8; 12],
            mtime: [0u8; 12],
            checksum: [0u8; 8],
            typeflag: 0,
            linkname: [0u8; 100],
            magic: *USTAR_MAGIC,
            version: *USTAR_VERSION,
            uname: [0u8; 32],
            gname: [0u8; 32],
            devmajor: [0u8; 8],
            devminor: [0u8; 8],
            prefix: [0u8; 155],
            pad: [0u8; 12],
        }
    }
}

/// Inputs for [`create`]. Unset options take the documented defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderFields {
    /// Full entry name, split across prefix/name when longer than 100 bytes.
    pub name: String,
    /// Entry type; `None` means directory if `name` ends with `/`, else file.
    pub entry_type: Option<EntryType>,
    /// Content size.
    pub size: u64,
    /// Permission bits; `None` means 0755 for directories, 0644 otherwise.
    pub mode: Option<u32>,
    /// Owner user id.
    pub uid: u64,
    /// Owner group id.
    pub gid: u64,
    /// Modification time; `None` means now.
    pub mtime: Option<u64>,
    /// Owner user name.
    pub uname: String,
    /// Owner group name.
    pub gname: String,
    /// Link target.
    pub linkname: String,
    /// Device major number.
    pub devmajor: u32,
    /// Device minor number.
    pub devminor: u32,
}

impl From<&Entry> for HeaderFields {
    fn from(entry: &Entry) -> Self {
        Self {
            name: entry.name.clone(),
            entry_type: Some(entry.entry_type),
            size: entry.size,
            mode: Some(entry.mode),
            uid: entry.uid,
            gid: entry.gid,
            mtime: Some(entry.mtime),
            uname: entry.uname.clone(),
            gname: entry.gname.clone(),
            linkname: entry.linkname.clone(),
            devmajor: entry.devmajor,
            devminor: entry.devminor,
        }
    }
}

/// Decodes one header block.
///
/// Returns `Ok(None)` for an all-zero block, which marks the end of the
/// archive.
///
/// # Errors
///
/// Returns [`ArchiveError::Format`] if the block is not 512 bytes long, the
/// checksum does not verify, or a numeric field is malformed.
///
/// # Examples
///
/// ```
/// use tarkit_core::formats::header;
///
/// assert!(header::parse(&[0u8; 512]).unwrap().is_none());
/// assert!(header::parse(&[0u8; 100]).is_err());
/// ```
pub fn parse(block: &[u8]) -> Result<Option<Entry>> {
    if block.len() != BLOCK_SIZE {
        return Err(FormatIssue::WrongLength { len: block.len() }.into());
    }
    if is_zero_block(block) {
        return Ok(None);
    }
    let header = UstarHeader::ref_from_bytes(block)
        .map_err(|_| ArchiveError::from(FormatIssue::WrongLength { len: block.len() }))?;

    let expected = parse_octal(&header.checksum, "checksum")?;
    let computed = checksum(block);
    if expected != computed {
        return Err(FormatIssue::InvalidChecksum { expected, computed }.into());
    }

    let is_posix = &header.magic == USTAR_MAGIC;
    let is_ustar_family = header.magic.starts_with(b"ustar");

    let mut name = field_str(&header.name);
    if is_posix {
        let prefix = field_str(&header.prefix);
        if !prefix.is_empty() {
            name = format!("{prefix}/{name}");
        }
    }

    let mut entry_type = EntryType::from_byte(header.typeflag);
    if entry_type.is_file() && name.ends_with('/') {
        entry_type = EntryType::Directory;
    }

    let mut size = parse_numeric(&header.size, "size")?;
    if entry_type.is_contentless() {
        size = 0;
    }

    let (uname, gname, devmajor, devminor) = if is_ustar_family {
        (
            field_str(&header.uname),
            field_str(&header.gname),
            parse_u32(&header.devmajor, "devmajor")?,
            parse_u32(&header.devminor, "devminor")?,
        )
    } else {
        (String::new(), String::new(), 0, 0)
    };

    Ok(Some(Entry {
        name,
        entry_type,
        size,
        mode: (parse_numeric(&header.mode, "mode")? & 0o7777) as u32,
        uid: parse_numeric(&header.uid, "uid")?,
        gid: parse_numeric(&header.gid, "gid")?,
        mtime: parse_numeric(&header.mtime, "mtime")?,
        uname,
        gname,
        linkname: field_str(&header.linkname),
        devmajor,
        devminor,
        content: Vec::new(),
    }))
}

/// Encodes a header block.
///
/// # Errors
///
/// Returns [`ArchiveError::NameTooLong`] when the name has no valid
/// prefix/name split, and [`ArchiveError::LinkNameTooLong`] when the link
/// target exceeds 100 bytes. Callers that need longer names must emit a PAX
/// header first; this function never truncates.
///
/// # Examples
///
/// ```
/// use tarkit_core::formats::header::{self, HeaderFields};
///
/// let block = header::create(&HeaderFields {
///     name: "dir/".into(),
///     mtime: Some(0),
///     ..Default::default()
/// })
/// .unwrap();
/// let entry = header::parse(&block).unwrap().unwrap();
/// assert!(entry.entry_type.is_directory());
/// assert_eq!(entry.mode, 0o755);
/// ```
pub fn create(fields: &HeaderFields) -> Result<[u8; BLOCK_SIZE]> {
    let entry_type = fields.entry_type.unwrap_or(if fields.name.ends_with('/') {
        EntryType::Directory
    } else {
        EntryType::File
    });
    let mode = fields.mode.unwrap_or_else(|| entry_type.default_mode());
    let mtime = fields.mtime.unwrap_or_else(now_secs);

    let (prefix, name) = split_name(&fields.name)?;
    let linkname = fields.linkname.as_bytes();
    if linkname.len() > NAME_FIELD_LEN {
        return Err(ArchiveError::LinkNameTooLong {
            linkname: fields.linkname.clone(),
            len: linkname.len(),
        });
    }

    let mut header = UstarHeader::default();
    header.name[..name.len()].copy_from_slice(name);
    header.prefix[..prefix.len()].copy_from_slice(prefix);
    header.linkname[..linkname.len()].copy_from_slice(linkname);
    copy_truncated(&mut header.uname, fields.uname.as_bytes());
    copy_truncated(&mut header.gname, fields.gname.as_bytes());
    header.typeflag = entry_type.to_byte();

    write_numeric(&mut header.mode, u64::from(mode & 0o7777), "mode")?;
    write_numeric(&mut header.uid, fields.uid, "uid")?;
    write_numeric(&mut header.gid, fields.gid, "gid")?;
    write_numeric(&mut header.size, fields.size, "size")?;
    write_numeric(&mut header.mtime, mtime, "mtime")?;
    write_numeric(&mut header.devmajor, u64::from(fields.devmajor), "devmajor")?;
    write_numeric(&mut header.devminor, u64::from(fields.devminor), "devminor")?;

    let mut block = [0u8; BLOCK_SIZE];
    block.copy_from_slice(header.as_bytes());
    let sum = checksum(&block);
    write_numeric(&mut block[CHECKSUM_RANGE], sum, "checksum")?;
    Ok(block)
}

/// Splits a name into ustar `(prefix, name)` fields.
///
/// Names up to 100 bytes go entirely into the name field. Longer names are
/// split at the rightmost `/` at or before byte 155 that leaves a non-empty
/// suffix of at most 100 bytes.
///
/// # Errors
///
/// Returns [`ArchiveError::NameTooLong`] when no such split exists or the
/// name exceeds 255 bytes.
pub fn split_name(name: &str) -> Result<(&[u8], &[u8])> {
    let bytes = name.as_bytes();
    if bytes.len() <= NAME_FIELD_LEN {
        return Ok((&[], bytes));
    }
    let too_long = || ArchiveError::NameTooLong {
        name: name.to_string(),
        len: bytes.len(),
    };
    if bytes.len() > MAX_SPLIT_NAME_LEN {
        return Err(too_long());
    }

    let last_candidate = PREFIX_FIELD_LEN.min(bytes.len() - 1);
    for i in (1..=last_candidate).rev() {
        if bytes[i] != b'/' {
            continue;
        }
        let suffix = &bytes[i + 1..];
        if suffix.len() > NAME_FIELD_LEN {
            // Every separator further left leaves an even longer suffix.
            break;
        }
        if !suffix.is_empty() {
            return Ok((&bytes[..i], suffix));
        }
    }
    Err(too_long())
}

/// Number of zero bytes that follow `size` content bytes.
///
/// Always in `0..512`, zero exactly when `size` is block aligned.
#[inline]
#[must_use]
pub const fn padding(size: u64) -> u64 {
    let block = BLOCK_SIZE as u64;
    (block - size % block) % block
}

/// Returns `true` if every byte of `block` is zero.
#[inline]
#[must_use]
pub fn is_zero_block(block: &[u8]) -> bool {
    block.iter().all(|&b| b == 0)
}

/// Unsigned sum of a header block with the checksum field counted as spaces.
#[must_use]
pub fn checksum(block: &[u8]) -> u64 {
    block
        .iter()
        .enumerate()
        .map(|(i, &b)| {
            if CHECKSUM_RANGE.contains(&i) {
                u64::from(b' ')
            } else {
                u64::from(b)
            }
        })
        .sum()
}

/// Parses an octal or base-256 numeric field.
fn parse_numeric(field: &[u8], name: &'static str) -> Result<u64> {
    let invalid = || ArchiveError::from(FormatIssue::InvalidNumber { field: name });

    if let Some(&first) = field.first()
        && first & 0x80 != 0
    {
        // 0xff marks a negative base-256 value.
        if first == 0xff {
            return Err(invalid());
        }
        let mut value: u64 = u64::from(first & 0x7f);
        for &b in &field[1..] {
            value = value
                .checked_mul(256)
                .and_then(|v| v.checked_add(u64::from(b)))
                .ok_or_else(invalid)?;
        }
        return Ok(value);
    }

    parse_octal(field, name)
}

/// Parses an ASCII octal field.
///
/// Leading spaces are skipped; parsing stops at the first NUL or space after
/// the digits. An empty field is zero.
fn parse_octal(field: &[u8], name: &'static str) -> Result<u64> {
    let invalid = || ArchiveError::from(FormatIssue::InvalidNumber { field: name });

    let mut value: u64 = 0;
    let mut digits = field.iter().skip_while(|&&b| b == b' ').peekable();
    while let Some(&b) = digits.next() {
        match b {
            b'0'..=b'7' => {
                value = value
                    .checked_mul(8)
                    .and_then(|v| v.checked_add(u64::from(b - b'0')))
                    .ok_or_else(invalid)?;
            }
            0 | b' ' => break,
            _ => return Err(invalid()),
        }
    }
    Ok(value)
}

fn parse_u32(field: &[u8], name: &'static str) -> Result<u32> {
    u32::try_from(parse_numeric(field, name)?)
        .map_err(|_| FormatIssue::InvalidNumber { field: name }.into())
}

/// Writes `value` as zero-padded octal followed by a NUL, falling back to
/// base-256 when the octal form does not fit.
fn write_numeric(field: &mut [u8], value: u64, name: &'static str) -> Result<()> {
    let digits = field.len() - 1;
    let octal_limit = 1u128 << (3 * digits);
    if u128::from(value) < octal_limit {
        let text = format!("{value:0digits$o}");
        field[..digits].copy_from_slice(text.as_bytes());
        field[digits] = 0;
        return Ok(());
    }

    let bytes = value.to_be_bytes();
    let available = field.len() - 1;
    let significant = bytes.iter().skip_while(|&&b| b == 0).count();
    if significant > available || (significant == available && bytes[8 - significant] & 0x80 != 0)
    {
        return Err(FormatIssue::InvalidNumber { field: name }.into());
    }
    field.fill(0);
    field[0] = 0x80;
    let start = field.len() - significant;
    field[start..].copy_from_slice(&bytes[8 - significant..]);
    Ok(())
}

fn field_str(field: &[u8]) -> String {
    let end = field.iter().position(|&b| b == 0).unwrap_or(field.len());
    String::from_utf8_lossy(&field[..end]).into_owned()
}

fn copy_truncated(field: &mut [u8], value: &[u8]) {
    let len = value.len().min(field.len());
    field[..len].copy_from_slice(&value[..len]);
}

/// Current time in whole seconds since the Unix epoch, or 0 before it.
pub(crate) fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| d.as_secs())
}
