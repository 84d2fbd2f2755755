//! Tarkit CLI - Command-line utility for creating, listing and extracting
//! ustar/PAX archives.

mod cli;
mod commands;
mod error;
mod output;
mod progress;

use anyhow::Result;
use clap::Parser;
use cli::Cli;
use cli::Commands;
use output::OutputFormatter;
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    let formatter = output::create_formatter(cli.json, cli.verbose, cli.quiet);

    match run(&cli, &*formatter) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            formatter.format_error(operation_name(&cli.command), &err);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli, formatter: &dyn OutputFormatter) -> Result<()> {
    let show_progress = !cli.quiet && !cli.json;

    match &cli.command {
        Commands::Extract(args) => commands::extract::execute(args, formatter, show_progress),
        Commands::Create(args) => commands::create::execute(args, formatter, show_progress),
        Commands::List(args) => commands::list::execute(args, formatter),
        Commands::Completion(args) => {
            commands::completion::execute(args.shell);
            Ok(())
        }
    }
}

const fn operation_name(command: &Commands) -> &'static str {
    match command {
        Commands::Extract(_) => "extract",
        Commands::Create(_) => "create",
        Commands::List(_) => "list",
        Commands::Completion(_) => "completion",
    }
}

/// Library logs go to stderr; `RUST_LOG` takes precedence over the flags.
fn init_logging(verbose: bool, quiet: bool) {
    let default_level = if verbose {
        "debug"
    } else if quiet {
        "error"
    } else {
        "warn"
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_timestamp(None)
        .init();
}
