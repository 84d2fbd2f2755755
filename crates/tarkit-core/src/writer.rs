//! Archive writer.

use std::io;
use std::io::Read;
use std::io::Write;

use log::debug;

use crate::Result;
use crate::formats::header;
use crate::formats::header::BLOCK_SIZE;
use crate::formats::header::HeaderFields;
use crate::formats::header::NAME_FIELD_LEN;
use crate::formats::pax;
use crate::types::Entry;

/// Two zero blocks terminate every archive.
const END_OF_ARCHIVE: [u8; 2 * BLOCK_SIZE] = [0u8; 2 * BLOCK_SIZE];

/// Streams entries into a tar archive.
///
/// Entries whose name, link target or size do not fit a classic header are
/// preceded by a PAX extended header. Call [`finish`](Self::finish) to write
/// the end-of-archive marker.
///
/// # Examples
///
/// ```
/// use tarkit_core::{ArchiveWriter, Entry};
///
/// let mut writer = ArchiveWriter::new(Vec::new());
/// writer.append(&Entry::file("hello.txt", b"hello".to_vec())).unwrap();
/// writer.append(&Entry::directory("docs")).unwrap();
/// let bytes = writer.finish().unwrap();
/// assert_eq!(bytes.len(), 5 * 512);
/// ```
#[derive(Debug)]
pub struct ArchiveWriter<W: Write> {
    inner: W,
    entries_written: usize,
    bytes_written: u64,
}

impl<W: Write> ArchiveWriter<W> {
    /// Creates a writer over `inner`.
    pub const fn new(inner: W) -> Self {
        Self {
            inner,
            entries_written: 0,
            bytes_written: 0,
        }
    }

    /// Number of entries appended so far.
    #[must_use]
    pub const fn entries_written(&self) -> usize {
        self.entries_written
    }

    /// Bytes emitted so far, headers and padding included.
    #[must_use]
    pub const fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    /// Appends an entry whose content is held in memory.
    ///
    /// # Errors
    ///
    /// Returns [`ArchiveError::NameTooLong`](crate::ArchiveError::NameTooLong)
    /// for a name between 101 and 255 bytes with no usable split point, or an
    /// I/O error. A file whose `size` disagrees with its content is rejected
    /// as invalid input.
    pub fn append(&mut self, entry: &Entry) -> Result<()> {
        if !entry.entry_type.is_contentless() && entry.size != entry.content.len() as u64 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!(
                    "entry {:?} declares {} bytes but holds {}",
                    entry.name,
                    entry.size,
                    entry.content.len()
                ),
            )
            .into());
        }
        self.append_data(entry, entry.content())
    }

    /// Appends an entry whose `size` content bytes are read from `data`.
    ///
    /// # Errors
    ///
    /// Fails like [`append`](Self::append), and with
    /// [`io::ErrorKind::UnexpectedEof`] if `data` yields fewer than `size`
    /// bytes.
    pub fn append_data<R: Read>(&mut self, entry: &Entry, data: R) -> Result<()> {
        self.write_header(entry)?;
        if !entry.entry_type.is_contentless() && entry.size > 0 {
            let copied = io::copy(&mut data.take(entry.size), &mut self.inner)?;
            if copied != entry.size {
                return Err(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    format!(
                        "entry {:?} ended after {copied} of {} bytes",
                        entry.name, entry.size
                    ),
                )
                .into());
            }
            self.bytes_written += copied;
            self.write_zeros(header::padding(entry.size) as usize)?;
        }
        self.entries_written += 1;
        Ok(())
    }

    /// Writes the end-of-archive marker and returns the inner writer.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if writing or flushing fails.
    pub fn finish(mut self) -> Result<W> {
        self.inner.write_all(&END_OF_ARCHIVE)?;
        self.bytes_written += END_OF_ARCHIVE.len() as u64;
        self.inner.flush()?;
        debug!(
            "archive finished: {} entries, {} bytes",
            self.entries_written, self.bytes_written
        );
        Ok(self.inner)
    }

    fn write_header(&mut self, entry: &Entry) -> Result<()> {
        let mut fields = HeaderFields::from(entry);
        if entry.entry_type.is_contentless() {
            fields.size = 0;
        }

        if pax::needs_pax(entry) {
            let attrs = pax::attributes_for(entry);
            let blocks = pax::create_header_blocks(&entry.name, &attrs)?;
            self.inner.write_all(&blocks)?;
            self.bytes_written += blocks.len() as u64;
            fields.name = pax::trailing_bytes(&entry.name, NAME_FIELD_LEN).to_string();
            fields.linkname = pax::trailing_bytes(&entry.linkname, NAME_FIELD_LEN).to_string();
        }

        let block = header::create(&fields)?;
        self.inner.write_all(&block)?;
        self.bytes_written += BLOCK_SIZE as u64;
        Ok(())
    }

    fn write_zeros(&mut self, len: usize) -> Result<()> {
        if len > 0 {
            self.inner.write_all(&[0u8; BLOCK_SIZE][..len])?;
            self.bytes_written += len as u64;
        }
        Ok(())
    }
}

/// Serializes `entries` into an in-memory archive.
///
/// # Errors
///
/// Returns [`ArchiveError::NameTooLong`](crate::ArchiveError::NameTooLong)
/// when a name cannot be stored, or an invalid-input error when a file's size
/// disagrees with its content.
///
/// # Examples
///
/// ```
/// use tarkit_core::{Entry, create_archive};
///
/// let bytes = create_archive(&[Entry::file("a.txt", b"hi".to_vec())]).unwrap();
/// assert_eq!(bytes.len(), 512 + 512 + 1024);
/// assert_eq!(&bytes[512..514], b"hi");
/// ```
pub fn create_archive(entries: &[Entry]) -> Result<Vec<u8>> {
    let mut writer = ArchiveWriter::new(Vec::new());
    for entry in entries {
        writer.append(entry)?;
    }
    writer.finish()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::ArchiveError;
    use crate::parse_bytes;
    use crate::types::EntryType;

    #[test]
    fn test_layout_and_terminator() {
        let bytes = create_archive(&[
            Entry::file("a.txt", b"hi".to_vec()),
            Entry::directory("dir"),
        ])
        .unwrap();
        assert_eq!(bytes.len(), 5 * BLOCK_SIZE);
        assert!(bytes[514..1024].iter().all(|&b| b == 0));
        assert!(bytes[3 * BLOCK_SIZE..].iter().all(|&b| b == 0));
    }

    #[test]
    fn test_empty_archive_is_just_marker() {
        let bytes = create_archive(&[]).unwrap();
        assert_eq!(bytes, vec![0u8; 1024]);
        assert!(parse_bytes(&bytes).unwrap().is_empty());
    }

    #[test]
    fn test_roundtrip_metadata() {
        let entries = vec![
            Entry::file("etc/conf", b"x=1\n".to_vec())
                .with_mode(0o600)
                .with_mtime(1_600_000_000)
                .with_owner(1000, 1001, "alice", "staff"),
            Entry::directory("etc/").with_mtime(7),
            Entry::symlink("etc/link", "conf").with_mtime(8),
            Entry::hardlink("etc/hard", "etc/conf").with_mtime(9),
        ];
        let parsed = parse_bytes(&create_archive(&entries).unwrap()).unwrap();
        assert_eq!(parsed, entries);
    }

    #[test]
    fn test_pax_path_roundtrip_500_chars() {
        let name: String = (0..60).map(|i| format!("seg{i:05}/")).collect::<String>() + "f";
        let name = &name[name.len() - 500..];
        assert_eq!(name.len(), 500);
        let parsed =
            parse_bytes(&create_archive(&[Entry::file(name, b"data".to_vec())]).unwrap()).unwrap();
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].name, name);
        assert_eq!(parsed[0].content(), b"data");
    }

    #[test]
    fn test_long_linkname_uses_pax() {
        let target = "t/".repeat(80);
        let parsed =
            parse_bytes(&create_archive(&[Entry::symlink("l", target.clone())]).unwrap()).unwrap();
        assert_eq!(parsed[0].linkname, target);
        assert_eq!(parsed[0].entry_type, EntryType::Symlink);
    }

    #[test]
    fn test_splittable_name_needs_no_pax() {
        let name = format!("{}/{}", "a".repeat(60), "b".repeat(89));
        let bytes = create_archive(&[Entry::file(name.clone(), Vec::new())]).unwrap();
        assert_eq!(bytes.len(), 3 * BLOCK_SIZE);
        assert_eq!(parse_bytes(&bytes).unwrap()[0].name, name);
    }

    #[test]
    fn test_unsplittable_name_is_rejected() {
        let result = create_archive(&[Entry::file("n".repeat(150), Vec::new())]);
        assert!(matches!(result, Err(ArchiveError::NameTooLong { len: 150, .. })));
    }

    #[test]
    fn test_size_mismatch_rejected() {
        let mut entry = Entry::file("f", b"abc".to_vec());
        entry.size = 10;
        let err = create_archive(&[entry]).unwrap_err();
        assert!(matches!(err, ArchiveError::Io(ref e) if e.kind() == io::ErrorKind::InvalidInput));
    }

    #[test]
    fn test_append_data_short_source() {
        let mut entry = Entry::file("f", Vec::new());
        entry.size = 100;
        let mut writer = ArchiveWriter::new(Vec::new());
        let err = writer.append_data(&entry, &[1u8; 10][..]).unwrap_err();
        assert!(matches!(err, ArchiveError::Io(ref e) if e.kind() == io::ErrorKind::UnexpectedEof));
    }

    #[test]
    fn test_append_data_streams_content() {
        let mut entry = Entry::file("stream", Vec::new());
        entry.size = 1500;
        let mut writer = ArchiveWriter::new(Vec::new());
        writer.append_data(&entry, &vec![3u8; 1500][..]).unwrap();
        assert_eq!(writer.entries_written(), 1);
        assert_eq!(writer.bytes_written(), 512 + 1536);
        let parsed = parse_bytes(&writer.finish().unwrap()).unwrap();
        assert_eq!(parsed[0].content(), vec![3u8; 1500].as_slice());
    }
}
