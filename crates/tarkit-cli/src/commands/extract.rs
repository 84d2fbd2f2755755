//! Extract command implementation.

use crate::cli::ExtractArgs;
use crate::error::add_archive_context;
use crate::output::OutputFormatter;
use crate::progress::CliProgress;
use anyhow::Context;
use anyhow::Result;
use std::env;
use tarkit_core::ExtractOptions;
use tarkit_core::NoopProgress;
use tarkit_core::extract_archive_with_progress;

pub fn execute(args: &ExtractArgs, formatter: &dyn OutputFormatter, show_progress: bool) -> Result<()> {
    let output_dir = match &args.output_dir {
        Some(dir) => dir.clone(),
        None => env::current_dir().context("failed to get current directory")?,
    };

    let options = build_options(args);

    let report = if show_progress && CliProgress::should_show() {
        let mut progress = CliProgress::new("Extracting");
        add_archive_context(
            extract_archive_with_progress(&args.archive, &output_dir, &options, &mut progress),
            &args.archive,
        )?
    } else {
        let mut noop = NoopProgress;
        add_archive_context(
            extract_archive_with_progress(&args.archive, &output_dir, &options, &mut noop),
            &args.archive,
        )?
    };

    formatter.format_extraction_result(&report)?;

    Ok(())
}

fn build_options(args: &ExtractArgs) -> ExtractOptions {
    let mut options = ExtractOptions::default()
        .with_strip_components(args.strip_components)
        .with_preserve_owner(args.preserve_owner)
        .with_preserve_permissions(!args.no_preserve_permissions);

    if !args.include.is_empty() || !args.exclude.is_empty() {
        let include = args.include.clone();
        let exclude = args.exclude.clone();
        options = options.with_filter(move |entry| {
            let included = include.is_empty() || include.iter().any(|p| entry.name.contains(p.as_str()));
            included && !exclude.iter().any(|p| entry.name.contains(p.as_str()))
        });
    }

    options
}
