//! Human-readable output formatter with colors and styling.

use super::formatter::OutputFormatter;
use anyhow::Result;
use console::Term;
use console::style;
use std::path::Path;
use tarkit_core::CreationReport;
use tarkit_core::Entry;
use tarkit_core::EntryType;
use tarkit_core::ExtractionReport;

pub struct HumanFormatter {
    verbose: bool,
    quiet: bool,
    use_colors: bool,
    term: Term,
}

impl HumanFormatter {
    pub fn new(verbose: bool, quiet: bool) -> Self {
        Self {
            verbose,
            quiet,
            use_colors: console::colors_enabled(),
            term: Term::stdout(),
        }
    }

    #[allow(clippy::cast_precision_loss)]
    fn format_size(bytes: u64) -> String {
        const KB: u64 = 1024;
        const MB: u64 = KB * 1024;
        const GB: u64 = MB * 1024;

        if bytes >= GB {
            format!("{:.1} GB", bytes as f64 / GB as f64)
        } else if bytes >= MB {
            format!("{:.1} MB", bytes as f64 / MB as f64)
        } else if bytes >= KB {
            format!("{:.1} KB", bytes as f64 / KB as f64)
        } else {
            format!("{bytes} B")
        }
    }

    fn format_number(n: usize) -> String {
        let s = n.to_string();
        let mut result = String::new();
        let mut count = 0;

        for c in s.chars().rev() {
            if count == 3 {
                result.push(',');
                count = 0;
            }
            result.push(c);
            count += 1;
        }

        result.chars().rev().collect()
    }

    /// `ls -l` style line: type, mode, owner, size, name and link target.
    fn format_long_line(entry: &Entry, human_readable: bool) -> String {
        let type_char = match entry.entry_type {
            EntryType::Directory => 'd',
            EntryType::Symlink => 'l',
            EntryType::Hardlink => 'h',
            EntryType::File | EntryType::PaxHeader | EntryType::PaxGlobal => '-',
        };
        let size_str = if human_readable {
            Self::format_size(entry.size)
        } else {
            entry.size.to_string()
        };
        let owner = if entry.uname.is_empty() && entry.gname.is_empty() {
            format!("{}/{}", entry.uid, entry.gid)
        } else {
            format!("{}/{}", entry.uname, entry.gname)
        };

        let mut line = format!(
            "{type_char}{:04o} {owner:<16} {size_str:>10}  {}",
            entry.mode & 0o7777,
            entry.name
        );
        if !entry.linkname.is_empty() {
            let arrow = if entry.entry_type == EntryType::Hardlink {
                "link to"
            } else {
                "->"
            };
            line.push_str(&format!(" {arrow} {}", entry.linkname));
        }
        line
    }

    fn write_warnings(&self, warnings: &[String]) {
        if warnings.is_empty() {
            return;
        }
        let _ = self.term.write_line("");
        if self.use_colors {
            let _ = self
                .term
                .write_line(&format!("{}", style("Warnings:").yellow().bold()));
        } else {
            let _ = self.term.write_line("Warnings:");
        }
        for warning in warnings {
            let _ = self.term.write_line(&format!("  - {warning}"));
        }
    }
}

impl OutputFormatter for HumanFormatter {
    fn format_extraction_result(&self, report: &ExtractionReport) -> Result<()> {
        if self.quiet {
            return Ok(());
        }

        if self.use_colors {
            let _ = self.term.write_line(&format!(
                "{} Extraction complete",
                style("✓").green().bold()
            ));
        } else {
            let _ = self.term.write_line("Extraction complete");
        }

        let _ = self
            .term
            .write_line(&format!("  Files extracted: {}", report.files_extracted));
        let _ = self
            .term
            .write_line(&format!("  Directories: {}", report.directories_created));
        let _ = self.term.write_line(&format!(
            "  Total size: {}",
            Self::format_size(report.bytes_written)
        ));
        if report.entries_skipped > 0 {
            let _ = self
                .term
                .write_line(&format!("  Skipped: {}", report.entries_skipped));
        }

        if self.verbose {
            let _ = self
                .term
                .write_line(&format!("  Symlinks: {}", report.symlinks_created));
            let _ = self
                .term
                .write_line(&format!("  Hardlinks: {}", report.hardlinks_created));
            let _ = self
                .term
                .write_line(&format!("  Duration: {:?}", report.duration));
            for entry in &report.entries {
                let _ = self.term.write_line(&format!("    {}", entry.name));
            }
        }

        self.write_warnings(&report.warnings);
        Ok(())
    }

    fn format_creation_result(&self, output_path: &Path, report: &CreationReport) -> Result<()> {
        if self.quiet {
            return Ok(());
        }

        if self.use_colors {
            let _ = self.term.write_line(&format!(
                "{} Archive created: {}",
                style("✓").green().bold(),
                output_path.display()
            ));
        } else {
            let _ = self
                .term
                .write_line(&format!("Archive created: {}", output_path.display()));
        }

        let _ = self.term.write_line("");
        let _ = self.term.write_line(&format!(
            "  Files added:      {}",
            Self::format_number(report.files_added)
        ));
        let _ = self.term.write_line(&format!(
            "  Directories:      {}",
            Self::format_number(report.directories_added)
        ));
        let _ = self.term.write_line(&format!(
            "  Total size:       {}",
            Self::format_size(report.bytes_written)
        ));
        let _ = self.term.write_line(&format!(
            "  Archive size:     {}",
            Self::format_size(report.bytes_compressed)
        ));

        if report.bytes_compressed != report.archive_bytes {
            let _ = self.term.write_line(&format!(
                "  Compression:      {:.2}x",
                report.compression_ratio()
            ));
        }

        if self.verbose {
            let _ = self
                .term
                .write_line(&format!("  Symlinks:         {}", report.symlinks_added));
            let _ = self
                .term
                .write_line(&format!("  Duration:         {:?}", report.duration));
        }

        self.write_warnings(&report.warnings);
        Ok(())
    }

    fn format_listing(&self, entries: &[Entry], long: bool, human_readable: bool) -> Result<()> {
        if self.quiet {
            return Ok(());
        }

        if !long {
            for entry in entries {
                let _ = self.term.write_line(&entry.name);
            }
            return Ok(());
        }

        for entry in entries {
            let _ = self
                .term
                .write_line(&Self::format_long_line(entry, human_readable));
        }

        let total_size: u64 = entries.iter().map(|e| e.size).sum();
        let _ = self.term.write_line("");
        let _ = self.term.write_line(&format!(
            "Total: {} entries, {}",
            Self::format_number(entries.len()),
            Self::format_size(total_size)
        ));

        Ok(())
    }

    fn format_error(&self, _operation: &str, error: &anyhow::Error) {
        // Always show errors, even in quiet mode
        let term = Term::stderr();
        if self.use_colors {
            let _ = term.write_line(&format!("{} {error:?}", style("ERROR:").red().bold()));
        } else {
            let _ = term.write_line(&format!("ERROR: {error:?}"));
        }
    }

    fn format_warning(&self, message: &str) {
        if self.quiet {
            return;
        }

        if self.use_colors {
            let _ = self
                .term
                .write_line(&format!("{} {message}", style("⚠").yellow().bold()));
        } else {
            let _ = self.term.write_line(&format!("WARNING: {message}"));
        }
    }
}
