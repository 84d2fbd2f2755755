//! Incremental archive reader.
//!
//! [`ArchiveReader`] is a push parser: callers feed it chunks of any size and
//! receive every entry completed by that chunk. It performs no I/O. The
//! [`Entries`] iterator drives it from a [`Read`] source.

use std::collections::VecDeque;
use std::io::ErrorKind;
use std::io::Read;

use log::debug;
use log::warn;

use crate::ArchiveError;
use crate::Result;
use crate::config::ReaderConfig;
use crate::error::FormatIssue;
use crate::formats::header;
use crate::formats::header::BLOCK_SIZE;
use crate::formats::pax;
use crate::formats::pax::PaxAttributes;
use crate::types::Entry;
use crate::types::EntryType;

/// Bytes requested from a [`Read`] source per call.
pub const CHUNK_SIZE: usize = 64 * 1024;

/// Consumed prefix length above which the buffer is compacted.
const COMPACT_THRESHOLD: usize = 64 * 1024;

#[derive(Debug)]
enum State {
    AwaitingHeader,
    ReadingContent { entry: Entry, remaining: u64 },
    SkippingPadding { remaining: u64 },
    /// Two consecutive zero blocks were seen; further input is ignored.
    Done,
}

/// Push-driven tar stream parser.
///
/// # Examples
///
/// ```
/// use tarkit_core::{ArchiveReader, Entry, create_archive};
///
/// let bytes = create_archive(&[Entry::file("a.txt", b"hi".to_vec())]).unwrap();
///
/// let mut reader = ArchiveReader::new();
/// let mut entries = Vec::new();
/// for chunk in bytes.chunks(100) {
///     entries.extend(reader.push(chunk).unwrap());
/// }
/// reader.finish().unwrap();
///
/// assert_eq!(entries.len(), 1);
/// assert_eq!(entries[0].content(), b"hi");
/// ```
#[derive(Debug)]
pub struct ArchiveReader {
    config: ReaderConfig,
    buf: Vec<u8>,
    pos: usize,
    state: State,
    empty_blocks: u8,
    pending: Option<PaxAttributes>,
}

impl Default for ArchiveReader {
    fn default() -> Self {
        Self::new()
    }
}

impl ArchiveReader {
    /// Creates a reader with default limits.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(ReaderConfig::default())
    }

    /// Creates a reader with the given limits.
    #[must_use]
    pub const fn with_config(config: ReaderConfig) -> Self {
        Self {
            config,
            buf: Vec::new(),
            pos: 0,
            state: State::AwaitingHeader,
            empty_blocks: 0,
            pending: None,
        }
    }

    /// Returns `true` once the end-of-archive marker has been read.
    #[must_use]
    pub const fn is_complete(&self) -> bool {
        matches!(self.state, State::Done)
    }

    /// Feeds a chunk and returns the entries it completed, in archive order.
    ///
    /// Chunks may be arbitrarily small; partial structures are buffered until
    /// the next call.
    ///
    /// # Errors
    ///
    /// Returns [`ArchiveError::Format`] on a corrupt header or PAX payload.
    pub fn push(&mut self, chunk: &[u8]) -> Result<Vec<Entry>> {
        let mut out = Vec::new();
        if self.is_complete() {
            return Ok(out);
        }
        self.buf.extend_from_slice(chunk);
        self.advance(&mut out)?;
        self.compact();
        Ok(out)
    }

    /// Signals end of input.
    ///
    /// A missing second terminator block, or no terminator at all, is
    /// accepted.
    ///
    /// # Errors
    ///
    /// Returns [`ArchiveError::Truncated`] if input ended inside an entry's
    /// content.
    pub fn finish(&self) -> Result<()> {
        match &self.state {
            State::ReadingContent { remaining, .. } => {
                return Err(ArchiveError::Truncated {
                    missing: *remaining,
                });
            }
            State::Done => return Ok(()),
            State::AwaitingHeader | State::SkippingPadding { .. } => {}
        }

        if self.empty_blocks == 1 {
            debug!("archive ended after a single terminator block");
        }
        let leftover = self.buf.len() - self.pos;
        if leftover > 0 {
            warn!("ignoring {leftover} trailing bytes that do not form a complete block");
        }
        if self.pending.is_some() {
            warn!("PAX header at end of archive has no entry to apply to");
        }
        Ok(())
    }

    fn advance(&mut self, out: &mut Vec<Entry>) -> Result<()> {
        loop {
            let available = self.buf.len() - self.pos;
            match &mut self.state {
                State::Done => return Ok(()),

                State::AwaitingHeader => {
                    if available < BLOCK_SIZE {
                        return Ok(());
                    }
                    let start = self.pos;
                    let Some(mut entry) = header::parse(&self.buf[start..start + BLOCK_SIZE])?
                    else {
                        self.pos += BLOCK_SIZE;
                        self.empty_blocks += 1;
                        if self.empty_blocks >= 2 {
                            debug!("end-of-archive marker reached");
                            self.state = State::Done;
                        }
                        continue;
                    };
                    self.empty_blocks = 0;

                    if entry.entry_type.is_pax() {
                        if entry.size > self.config.max_pax_size {
                            return Err(FormatIssue::PaxTooLarge {
                                size: entry.size,
                                limit: self.config.max_pax_size,
                            }
                            .into());
                        }
                        let size = entry.size as usize;
                        let total = BLOCK_SIZE + size + header::padding(entry.size) as usize;
                        if available < total {
                            // Leave the header unconsumed until the payload is buffered.
                            return Ok(());
                        }
                        let payload_start = start + BLOCK_SIZE;
                        let attrs = pax::decode(&self.buf[payload_start..payload_start + size])?;
                        self.pos += total;
                        if entry.entry_type == EntryType::PaxHeader {
                            debug!("captured PAX overlay from {:?}", entry.name);
                            self.pending = Some(attrs);
                        } else {
                            debug!("ignoring global PAX header {:?}", entry.name);
                        }
                        continue;
                    }

                    self.pos += BLOCK_SIZE;
                    if let Some(attrs) = self.pending.take() {
                        entry = pax::apply_overlay(entry, &attrs);
                    }
                    if entry.entry_type.is_contentless() {
                        entry.size = 0;
                    }
                    if entry.size == 0 {
                        out.push(entry);
                        continue;
                    }
                    if self.config.retain_content {
                        entry
                            .content
                            .reserve(entry.size.min(CHUNK_SIZE as u64) as usize);
                    }
                    let remaining = entry.size;
                    self.state = State::ReadingContent { entry, remaining };
                }

                State::ReadingContent { entry, remaining } => {
                    if available == 0 {
                        return Ok(());
                    }
                    let take = (*remaining).min(available as u64) as usize;
                    if self.config.retain_content {
                        entry
                            .content
                            .extend_from_slice(&self.buf[self.pos..self.pos + take]);
                    }
                    self.pos += take;
                    *remaining -= take as u64;
                    if *remaining > 0 {
                        return Ok(());
                    }
                    let entry = std::mem::take(entry);
                    let padding = header::padding(entry.size);
                    out.push(entry);
                    self.state = if padding == 0 {
                        State::AwaitingHeader
                    } else {
                        State::SkippingPadding { remaining: padding }
                    };
                }

                State::SkippingPadding { remaining } => {
                    if available == 0 {
                        return Ok(());
                    }
                    let take = (*remaining).min(available as u64);
                    self.pos += take as usize;
                    *remaining -= take;
                    if *remaining > 0 {
                        return Ok(());
                    }
                    self.state = State::AwaitingHeader;
                }
            }
        }
    }

    fn compact(&mut self) {
        if self.pos == self.buf.len() {
            self.buf.clear();
            self.pos = 0;
        } else if self.pos >= COMPACT_THRESHOLD {
            self.buf.drain(..self.pos);
            self.pos = 0;
        }
    }
}

/// Iterator over the entries of an archive read from `R`.
///
/// Reads [`CHUNK_SIZE`] bytes at a time and stops reading once the
/// end-of-archive marker has been seen. After the first error the iterator is
/// exhausted.
#[derive(Debug)]
pub struct Entries<R> {
    source: R,
    reader: ArchiveReader,
    ready: VecDeque<Entry>,
    chunk: Vec<u8>,
    finished: bool,
}

impl<R: Read> Entries<R> {
    /// Creates an iterator with default limits.
    pub fn new(source: R) -> Self {
        Self::with_config(source, ReaderConfig::default())
    }

    /// Creates an iterator with the given limits.
    pub fn with_config(source: R, config: ReaderConfig) -> Self {
        Self {
            source,
            reader: ArchiveReader::with_config(config),
            ready: VecDeque::new(),
            chunk: vec![0u8; CHUNK_SIZE],
            finished: false,
        }
    }

    fn fail(&mut self, err: ArchiveError) -> Option<Result<Entry>> {
        self.finished = true;
        self.ready.clear();
        Some(Err(err))
    }
}

impl<R: Read> Iterator for Entries<R> {
    type Item = Result<Entry>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(entry) = self.ready.pop_front() {
                return Some(Ok(entry));
            }
            if self.finished {
                return None;
            }
            if self.reader.is_complete() {
                self.finished = true;
                continue;
            }

            let n = match self.source.read(&mut self.chunk) {
                Ok(n) => n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return self.fail(e.into()),
            };
            if n == 0 {
                self.finished = true;
                if let Err(e) = self.reader.finish() {
                    return self.fail(e);
                }
                continue;
            }
            match self.reader.push(&self.chunk[..n]) {
                Ok(entries) => self.ready.extend(entries),
                Err(e) => return self.fail(e),
            }
        }
    }
}

/// Reads every entry from `source` into memory.
///
/// # Errors
///
/// Returns the first I/O, format or truncation error encountered.
pub fn parse_entries<R: Read>(source: R) -> Result<Vec<Entry>> {
    Entries::new(source).collect()
}

/// Parses an in-memory archive.
///
/// # Examples
///
/// ```
/// use tarkit_core::{Entry, create_archive, parse_bytes};
///
/// let bytes = create_archive(&[Entry::directory("dir")]).unwrap();
/// let entries = parse_bytes(&bytes).unwrap();
/// assert_eq!(entries[0].name, "dir/");
/// ```
pub fn parse_bytes(bytes: &[u8]) -> Result<Vec<Entry>> {
    let mut reader = ArchiveReader::new();
    let entries = reader.push(bytes)?;
    reader.finish()?;
    Ok(entries)
}
