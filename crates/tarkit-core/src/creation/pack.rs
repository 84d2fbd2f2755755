//! Streams walked sources into an [`ArchiveWriter`].

use std::fs::File;
use std::io::BufReader;
use std::io::Write;
use std::path::Path;

use log::debug;

use crate::ProgressCallback;
use crate::Result;
use crate::creation::report::CreationReport;
use crate::creation::walker::SourceEntry;
use crate::creation::walker::SourceKind;
use crate::writer::ArchiveWriter;

/// Buffer size used when reading source files.
const READ_BUFFER_SIZE: usize = 64 * 1024;

/// Appends every source in order.
///
/// File content is read from disk while it is written, so only one buffer's
/// worth is held in memory at a time.
///
/// # Errors
///
/// Returns the first writer or I/O error, including a file that shrank
/// between enumeration and writing.
pub fn append_sources<W: Write>(
    writer: &mut ArchiveWriter<W>,
    sources: &[SourceEntry],
    report: &mut CreationReport,
    progress: &mut dyn ProgressCallback,
) -> Result<()> {
    for (index, source) in sources.iter().enumerate() {
        let name = Path::new(&source.name);
        progress.on_entry_start(name, index + 1);

        let entry = source.to_entry();
        if source.kind == SourceKind::File {
            let file = File::open(&source.path)?;
            writer.append_data(&entry, BufReader::with_capacity(READ_BUFFER_SIZE, file))?;
            progress.on_bytes_written(source.size);
        } else {
            writer.append(&entry)?;
        }
        debug!("added {}", source.name);

        report.record(source.kind, source.size);
        progress.on_entry_complete(name);
    }
    Ok(())
}
