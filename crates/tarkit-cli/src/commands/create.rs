//! Create command implementation.

use crate::cli::CompressionArg;
use crate::cli::CreateArgs;
use crate::error::add_archive_context;
use crate::output::OutputFormatter;
use crate::progress::CliProgress;
use anyhow::Result;
use anyhow::bail;
use tarkit_core::CreationConfig;
use tarkit_core::NoopProgress;
use tarkit_core::create_archive_file_with_progress;

pub fn execute(args: &CreateArgs, formatter: &dyn OutputFormatter, show_progress: bool) -> Result<()> {
    if args.output.exists() && !args.force {
        bail!(
            "Output file '{}' already exists\n\
             HINT: Use --force to overwrite.",
            args.output.display()
        );
    }
    if args.output.exists() {
        formatter.format_warning(&format!("Overwriting '{}'", args.output.display()));
    }

    let config = build_config(args);

    let report = if show_progress && CliProgress::should_show() {
        let mut progress = CliProgress::new("Creating");
        add_archive_context(
            create_archive_file_with_progress(&args.output, &args.sources, &config, &mut progress),
            &args.output,
        )?
    } else {
        let mut noop = NoopProgress;
        add_archive_context(
            create_archive_file_with_progress(&args.output, &args.sources, &config, &mut noop),
            &args.output,
        )?
    };

    formatter.format_creation_result(&args.output, &report)?;

    Ok(())
}

fn build_config(args: &CreateArgs) -> CreationConfig {
    let mut config = CreationConfig::new()
        .with_follow_symlinks(args.follow_symlinks)
        .with_include_hidden(args.include_hidden)
        .with_compression(args.compression.map(CompressionArg::codec));

    if let Some(level) = args.compression_level {
        config = config.with_compression_level(level);
    }

    if !args.exclude.is_empty() {
        let mut patterns = config.exclude_patterns.clone();
        patterns.extend(args.exclude.iter().cloned());
        config = config.with_exclude_patterns(patterns);
    }

    config
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::cli::Cli;
    use crate::cli::Commands;
    use clap::Parser;
    use tarkit_core::CompressionCodec;

    fn parse(argv: &[&str]) -> CreateArgs {
        match Cli::try_parse_from(argv).unwrap().command {
            Commands::Create(args) => args,
            _ => panic!("expected create"),
        }
    }

    #[test]
    fn test_config_keeps_default_excludes() {
        let config = build_config(&parse(&["tarkit", "create", "o.tar", "src", "-x", "*.log"]));
        assert!(config.exclude_patterns.contains(&".git".to_string()));
        assert!(config.exclude_patterns.contains(&"*.log".to_string()));
        assert_eq!(config.compression, None);
    }

    #[test]
    fn test_config_flags() {
        let config = build_config(&parse(&[
            "tarkit",
            "create",
            "o.bin",
            "src",
            "--compression",
            "gzip",
            "-l",
            "3",
            "--include-hidden",
            "--follow-symlinks",
        ]));
        assert_eq!(config.compression, Some(CompressionCodec::Gzip));
        assert_eq!(config.compression_level, Some(3));
        assert!(config.include_hidden);
        assert!(config.follow_symlinks);
    }
}
