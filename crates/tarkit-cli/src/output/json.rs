//! JSON output formatter for machine-readable results.

use super::formatter::JsonOutput;
use super::formatter::OutputFormatter;
use anyhow::Result;
use serde::Serialize;
use std::io::Write;
use std::io::{self};
use std::path::Path;
use tarkit_core::CreationReport;
use tarkit_core::Entry;
use tarkit_core::EntryType;
use tarkit_core::ExtractionReport;

pub struct JsonFormatter;

impl JsonFormatter {
    fn output<T: Serialize>(value: &T) -> Result<()> {
        let json = serde_json::to_string_pretty(value)?;
        writeln!(io::stdout(), "{json}")?;
        Ok(())
    }
}

#[derive(Serialize)]
struct EntryOutput<'a> {
    name: &'a str,
    #[serde(rename = "type")]
    entry_type: &'static str,
    size: u64,
    mode: u32,
    uid: u64,
    gid: u64,
    mtime: u64,
    #[serde(skip_serializing_if = "str::is_empty")]
    uname: &'a str,
    #[serde(skip_serializing_if = "str::is_empty")]
    gname: &'a str,
    #[serde(skip_serializing_if = "str::is_empty")]
    linkname: &'a str,
}

impl<'a> From<&'a Entry> for EntryOutput<'a> {
    fn from(entry: &'a Entry) -> Self {
        Self {
            name: &entry.name,
            entry_type: type_name(entry.entry_type),
            size: entry.size,
            mode: entry.mode,
            uid: entry.uid,
            gid: entry.gid,
            mtime: entry.mtime,
            uname: &entry.uname,
            gname: &entry.gname,
            linkname: &entry.linkname,
        }
    }
}

const fn type_name(entry_type: EntryType) -> &'static str {
    match entry_type {
        EntryType::File => "file",
        EntryType::Directory => "directory",
        EntryType::Symlink => "symlink",
        EntryType::Hardlink => "hardlink",
        EntryType::PaxHeader | EntryType::PaxGlobal => "pax",
    }
}

impl OutputFormatter for JsonFormatter {
    fn format_extraction_result(&self, report: &ExtractionReport) -> Result<()> {
        #[derive(Serialize)]
        struct ExtractionOutput<'a> {
            files_extracted: usize,
            directories_created: usize,
            symlinks_created: usize,
            hardlinks_created: usize,
            entries_skipped: usize,
            bytes_written: u64,
            duration_ms: u128,
            warnings: &'a [String],
            entries: Vec<&'a str>,
        }

        let data = ExtractionOutput {
            files_extracted: report.files_extracted,
            directories_created: report.directories_created,
            symlinks_created: report.symlinks_created,
            hardlinks_created: report.hardlinks_created,
            entries_skipped: report.entries_skipped,
            bytes_written: report.bytes_written,
            duration_ms: report.duration.as_millis(),
            warnings: &report.warnings,
            entries: report.entries.iter().map(|e| e.name.as_str()).collect(),
        };

        Self::output(&JsonOutput::success("extract", data))
    }

    fn format_creation_result(&self, output_path: &Path, report: &CreationReport) -> Result<()> {
        #[derive(Serialize)]
        struct CreationOutput<'a> {
            output_path: String,
            files_added: usize,
            directories_added: usize,
            symlinks_added: usize,
            bytes_written: u64,
            archive_bytes: u64,
            bytes_compressed: u64,
            compression_ratio: f64,
            duration_ms: u128,
            warnings: &'a [String],
        }

        let data = CreationOutput {
            output_path: output_path.display().to_string(),
            files_added: report.files_added,
            directories_added: report.directories_added,
            symlinks_added: report.symlinks_added,
            bytes_written: report.bytes_written,
            archive_bytes: report.archive_bytes,
            bytes_compressed: report.bytes_compressed,
            compression_ratio: report.compression_ratio(),
            duration_ms: report.duration.as_millis(),
            warnings: &report.warnings,
        };

        Self::output(&JsonOutput::success("create", data))
    }

    fn format_listing(&self, entries: &[Entry], _long: bool, _human_readable: bool) -> Result<()> {
        #[derive(Serialize)]
        struct ListingOutput<'a> {
            total_entries: usize,
            total_size: u64,
            entries: Vec<EntryOutput<'a>>,
        }

        let data = ListingOutput {
            total_entries: entries.len(),
            total_size: entries.iter().map(|e| e.size).sum(),
            entries: entries.iter().map(EntryOutput::from).collect(),
        };

        Self::output(&JsonOutput::success("list", data))
    }

    fn format_error(&self, operation: &str, error: &anyhow::Error) {
        let output = JsonOutput::error(operation, format!("{error:#}"));
        let _ = Self::output(&output);
    }

    fn format_warning(&self, message: &str) {
        #[derive(Serialize)]
        struct WarningData<'a> {
            message: &'a str,
        }

        // Warnings go to stderr so stdout stays a single JSON document.
        let output = JsonOutput::success("warning", WarningData { message });
        if let Ok(json) = serde_json::to_string(&output) {
            let _ = writeln!(io::stderr(), "{json}");
        }
    }
}
