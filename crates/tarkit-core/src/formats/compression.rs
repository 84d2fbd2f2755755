//! Compression wrappers around the tar byte stream.
//!
//! The codec never looks inside these: they are opaque `Read`/`Write`
//! transforms selected by file extension or leading magic bytes.
//!
//! # Supported Codecs
//!
//! - **Gzip** (.tar.gz, .tgz) via `flate2`
//! - **Xz** (.tar.xz, .txz) via `xz2` (liblzma)

use std::fs::File;
use std::io;
use std::io::BufRead;
use std::io::BufReader;
use std::io::Read;
use std::io::Write;
use std::path::Path;

use flate2::read::MultiGzDecoder;
use flate2::write::GzEncoder;
use xz2::read::XzDecoder;
use xz2::write::XzEncoder;

use crate::ArchiveError;
use crate::Result;

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];
const XZ_MAGIC: [u8; 6] = [0xfd, b'7', b'z', b'X', b'Z', 0x00];

/// Default xz preset.
const XZ_DEFAULT_LEVEL: u32 = 6;

/// Compression codec wrapped around a tar stream.
///
/// # Examples
///
/// ```
/// use tarkit_core::formats::compression::CompressionCodec;
///
/// assert_eq!(CompressionCodec::Gzip.extension(), "tar.gz");
/// assert_eq!(CompressionCodec::Xz.name(), "xz");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompressionCodec {
    /// Gzip (deflate).
    Gzip,

    /// Xz (LZMA2).
    Xz,
}

impl CompressionCodec {
    /// Typical file extension for a tar archive using this codec.
    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Gzip => "tar.gz",
            Self::Xz => "tar.xz",
        }
    }

    /// Human-readable codec name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Gzip => "gzip",
            Self::Xz => "xz",
        }
    }

    /// Selects the codec implied by a file name.
    ///
    /// Returns `Ok(None)` for a plain `.tar`.
    ///
    /// # Errors
    ///
    /// Returns [`ArchiveError::UnsupportedFormat`] for any other extension.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::path::Path;
    /// use tarkit_core::formats::compression::CompressionCodec;
    ///
    /// assert_eq!(
    ///     CompressionCodec::from_path(Path::new("a.tgz")).unwrap(),
    ///     Some(CompressionCodec::Gzip)
    /// );
    /// assert_eq!(CompressionCodec::from_path(Path::new("a.tar")).unwrap(), None);
    /// assert!(CompressionCodec::from_path(Path::new("a.zip")).is_err());
    /// ```
    pub fn from_path(path: &Path) -> Result<Option<Self>> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .ok_or(ArchiveError::UnsupportedFormat)?;

        match extension.to_ascii_lowercase().as_str() {
            "tar" => Ok(None),
            "gz" | "tgz" => Ok(Some(Self::Gzip)),
            "xz" | "txz" => Ok(Some(Self::Xz)),
            _ => Err(ArchiveError::UnsupportedFormat),
        }
    }

    /// Recognizes a codec from the first bytes of a stream.
    #[must_use]
    pub fn from_magic(bytes: &[u8]) -> Option<Self> {
        if bytes.starts_with(&GZIP_MAGIC) {
            Some(Self::Gzip)
        } else if bytes.starts_with(&XZ_MAGIC) {
            Some(Self::Xz)
        } else {
            None
        }
    }
}

impl std::str::FromStr for CompressionCodec {
    type Err = ArchiveError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "gzip" | "gz" => Ok(Self::Gzip),
            "xz" => Ok(Self::Xz),
            _ => Err(ArchiveError::UnsupportedFormat),
        }
    }
}

/// Maps a 1-9 level onto flate2's scale; `None` is the default level.
#[must_use]
pub fn flate2_level(level: Option<u8>) -> flate2::Compression {
    match level {
        None | Some(6) => flate2::Compression::default(),
        Some(n) => flate2::Compression::new(u32::from(n.min(9))),
    }
}

/// Maps a 1-9 level onto an xz preset; `None` is preset 6.
#[must_use]
pub fn xz_level(level: Option<u8>) -> u32 {
    level.map_or(XZ_DEFAULT_LEVEL, |n| u32::from(n.min(9)))
}

/// Wraps `reader` in the decoder for `codec`, or passes it through.
pub fn decoder<'a, R: Read + 'a>(codec: Option<CompressionCodec>, reader: R) -> Box<dyn Read + 'a> {
    match codec {
        None => Box::new(reader),
        Some(CompressionCodec::Gzip) => Box::new(MultiGzDecoder::new(reader)),
        Some(CompressionCodec::Xz) => Box::new(XzDecoder::new_multi_decoder(reader)),
    }
}

/// Opens an archive file and returns a reader over its decompressed bytes.
///
/// The codec is taken from the leading magic bytes; files without a known
/// signature are read as plain tar.
///
/// # Errors
///
/// Returns an I/O error if the file cannot be opened or read.
pub fn open_decompressed(path: &Path) -> Result<Box<dyn Read>> {
    let mut reader = BufReader::new(File::open(path)?);
    let codec = CompressionCodec::from_magic(reader.fill_buf()?);
    log::debug!(
        "{}: {}",
        path.display(),
        codec.map_or("uncompressed", CompressionCodec::name)
    );
    Ok(decoder(codec, reader))
}

/// Compressing writer; call [`finish`](Self::finish) to flush the trailer.
pub enum Encoder<W: Write> {
    /// No compression.
    Plain(W),
    /// Gzip stream.
    Gzip(GzEncoder<W>),
    /// Xz stream.
    Xz(XzEncoder<W>),
}

impl<W: Write> std::fmt::Debug for Encoder<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let variant = match self {
            Self::Plain(_) => "Plain",
            Self::Gzip(_) => "Gzip",
            Self::Xz(_) => "Xz",
        };
        f.debug_tuple("Encoder").field(&variant).finish()
    }
}

impl<W: Write> Encoder<W> {
    /// Wraps `inner` for `codec` at the given 1-9 level.
    pub fn new(inner: W, codec: Option<CompressionCodec>, level: Option<u8>) -> Self {
        match codec {
            None => Self::Plain(inner),
            Some(CompressionCodec::Gzip) => Self::Gzip(GzEncoder::new(inner, flate2_level(level))),
            Some(CompressionCodec::Xz) => Self::Xz(XzEncoder::new(inner, xz_level(level))),
        }
    }

    /// Writes any codec trailer and returns the inner writer.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the final write fails.
    pub fn finish(self) -> io::Result<W> {
        match self {
            Self::Plain(mut w) => {
                w.flush()?;
                Ok(w)
            }
            Self::Gzip(e) => e.finish(),
            Self::Xz(e) => e.finish(),
        }
    }
}

impl<W: Write> Write for Encoder<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Self::Plain(w) => w.write(buf),
            Self::Gzip(e) => e.write(buf),
            Self::Xz(e) => e.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Self::Plain(w) => w.flush(),
            Self::Gzip(e) => e.flush(),
            Self::Xz(e) => e.flush(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn roundtrip(codec: Option<CompressionCodec>) {
        let data: Vec<u8> = (0..20_000u32).map(|i| (i % 251) as u8).collect();
        let mut encoder = Encoder::new(Vec::new(), codec, Some(1));
        encoder.write_all(&data).unwrap();
        let compressed = encoder.finish().unwrap();
        assert_eq!(CompressionCodec::from_magic(&compressed), codec);

        let mut out = Vec::new();
        decoder(codec, &compressed[..]).read_to_end(&mut out).unwrap();
        assert_eq!(out, data);
    }

    #[test]
    fn test_plain_roundtrip() {
        roundtrip(None);
    }

    #[test]
    fn test_gzip_roundtrip() {
        roundtrip(Some(CompressionCodec::Gzip));
    }

    #[test]
    fn test_xz_roundtrip() {
        roundtrip(Some(CompressionCodec::Xz));
    }

    #[test]
    fn test_encoder_debug_names_variant() {
        let plain = Encoder::new(Vec::new(), None, None);
        let xz = Encoder::new(Vec::new(), Some(CompressionCodec::Xz), None);
        assert_eq!(format!("{plain:?}"), "Encoder(\"Plain\")");
        assert_eq!(format!("{xz:?}"), "Encoder(\"Xz\")");
    }

    #[test]
    fn test_from_path() {
        let cases = [
            ("a.tar", None),
            ("a.tar.gz", Some(CompressionCodec::Gzip)),
            ("a.TGZ", Some(CompressionCodec::Gzip)),
            ("a.tar.xz", Some(CompressionCodec::Xz)),
            ("a.txz", Some(CompressionCodec::Xz)),
        ];
        for (name, expected) in cases {
            assert_eq!(CompressionCodec::from_path(Path::new(name)).unwrap(), expected);
        }
        assert!(matches!(
            CompressionCodec::from_path(Path::new("noext")),
            Err(ArchiveError::UnsupportedFormat)
        ));
    }

    #[test]
    fn test_from_str() {
        assert_eq!("GZ".parse::<CompressionCodec>().unwrap(), CompressionCodec::Gzip);
        assert_eq!("xz".parse::<CompressionCodec>().unwrap(), CompressionCodec::Xz);
        assert!("zstd".parse::<CompressionCodec>().is_err());
    }

    #[test]
    fn test_levels() {
        assert_eq!(xz_level(None), 6);
        assert_eq!(xz_level(Some(12)), 9);
        assert_eq!(flate2_level(Some(1)).level(), 1);
        assert_eq!(flate2_level(None).level(), 6);
    }
}
