//! High-level file API for extraction, creation and listing.

use std::fs;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;
use std::time::Instant;

use log::info;
use log::warn;

use crate::ExtractOptions;
use crate::ExtractionReport;
use crate::NoopProgress;
use crate::ProgressCallback;
use crate::ReaderConfig;
use crate::Result;
use crate::creation::CreationConfig;
use crate::creation::CreationReport;
use crate::creation::SourceEntry;
use crate::creation::SourceKind;
use crate::creation::collect_entries;
use crate::creation::pack::append_sources;
use crate::extraction::extract_with_progress;
use crate::formats::compression::CompressionCodec;
use crate::formats::compression::Encoder;
use crate::formats::compression::open_decompressed;
use crate::reader::Entries;
use crate::types::Entry;
use crate::writer::ArchiveWriter;

/// Extracts an archive file into `output_dir`.
///
/// Gzip and xz wrappers are recognized from the leading bytes of the file;
/// anything else is read as plain tar.
///
/// # Errors
///
/// Returns an error if the file cannot be opened, the stream is malformed or
/// truncated, an entry escapes `output_dir`, or a filesystem write fails.
///
/// # Examples
///
/// ```no_run
/// use tarkit_core::ExtractOptions;
/// use tarkit_core::extract_archive;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let options = ExtractOptions::default().with_strip_components(1);
/// let report = extract_archive("release.tar.gz", "/tmp/output", &options)?;
/// println!("Extracted {} files", report.files_extracted);
/// # Ok(())
/// # }
/// ```
pub fn extract_archive<P: AsRef<Path>, Q: AsRef<Path>>(
    archive_path: P,
    output_dir: Q,
    options: &ExtractOptions,
) -> Result<ExtractionReport> {
    extract_archive_with_progress(archive_path, output_dir, options, &mut NoopProgress)
}

/// Like [`extract_archive`], reporting each entry to `progress`.
///
/// # Errors
///
/// See [`extract_archive`].
pub fn extract_archive_with_progress<P: AsRef<Path>, Q: AsRef<Path>>(
    archive_path: P,
    output_dir: Q,
    options: &ExtractOptions,
    progress: &mut dyn ProgressCallback,
) -> Result<ExtractionReport> {
    let archive_path = archive_path.as_ref();
    info!("extracting {}", archive_path.display());
    let source = open_decompressed(archive_path)?;
    extract_with_progress(source, output_dir, options, progress)
}

/// Creates an archive file from filesystem sources.
///
/// The compression wrapper is `config.compression` if set, otherwise it is
/// inferred from the output extension (`.tar`, `.tar.gz`/`.tgz`,
/// `.tar.xz`/`.txz`).
///
/// # Errors
///
/// Returns an error if the output extension is not recognized, a source is
/// missing or unreadable, or a name cannot be stored.
///
/// # Examples
///
/// ```no_run
/// use tarkit_core::create_archive_file;
/// use tarkit_core::creation::CreationConfig;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let config = CreationConfig::default();
/// let report = create_archive_file("backup.tar.xz", &["src", "Cargo.toml"], &config)?;
/// println!("Added {} files", report.files_added);
/// # Ok(())
/// # }
/// ```
pub fn create_archive_file<P: AsRef<Path>, Q: AsRef<Path>>(
    output_path: P,
    sources: &[Q],
    config: &CreationConfig,
) -> Result<CreationReport> {
    create_archive_file_with_progress(output_path, sources, config, &mut NoopProgress)
}

/// Like [`create_archive_file`], reporting each entry to `progress`.
///
/// # Errors
///
/// See [`create_archive_file`].
pub fn create_archive_file_with_progress<P: AsRef<Path>, Q: AsRef<Path>>(
    output_path: P,
    sources: &[Q],
    config: &CreationConfig,
    progress: &mut dyn ProgressCallback,
) -> Result<CreationReport> {
    let output = output_path.as_ref();
    let started = Instant::now();
    let codec = match config.compression {
        Some(codec) => Some(codec),
        None => CompressionCodec::from_path(output)?,
    };

    let mut entries = collect_entries(sources, config)?;
    let file = File::create(output)?;
    let mut report = CreationReport::new();
    skip_output_file(output, &mut entries, &mut report)?;

    info!(
        "creating {} ({}, {} entries)",
        output.display(),
        codec.map_or("uncompressed", CompressionCodec::name),
        entries.len()
    );

    let encoder = Encoder::new(BufWriter::new(file), codec, config.compression_level);
    let mut writer = ArchiveWriter::new(encoder);
    append_sources(&mut writer, &entries, &mut report, progress)?;
    report.archive_bytes = writer.bytes_written();

    let buffered = writer.finish()?.finish()?;
    let file = buffered.into_inner().map_err(|e| e.into_error())?;
    report.bytes_compressed = file.metadata()?.len();
    report.duration = started.elapsed();
    progress.on_complete();
    Ok(report)
}

/// Drops the archive being written from its own source list.
fn skip_output_file(
    output: &Path,
    entries: &mut Vec<SourceEntry>,
    report: &mut CreationReport,
) -> Result<()> {
    let output = fs::canonicalize(output)?;
    entries.retain(|entry| {
        let is_output = entry.kind == SourceKind::File
            && fs::canonicalize(&entry.path).is_ok_and(|path| path == output);
        if is_output {
            let message = format!("{}: file is the archive; not dumped", entry.name);
            warn!("{message}");
            report.add_warning(message);
        }
        !is_output
    });
    Ok(())
}

/// Lists the entries of an archive file without keeping content bytes.
///
/// # Errors
///
/// Returns an error if the file cannot be read or the stream is malformed or
/// truncated.
///
/// # Examples
///
/// ```no_run
/// use tarkit_core::list_archive;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// for entry in list_archive("archive.tar")? {
///     println!("{:>10} {}", entry.size, entry.name);
/// }
/// # Ok(())
/// # }
/// ```
pub fn list_archive<P: AsRef<Path>>(archive_path: P) -> Result<Vec<Entry>> {
    let source = open_decompressed(archive_path.as_ref())?;
    let config = ReaderConfig {
        retain_content: false,
        ..ReaderConfig::default()
    };
    Entries::with_config(source, config).collect()
}
