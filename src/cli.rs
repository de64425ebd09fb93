//! Command-line interface module for extcopy.
//!
//! This module handles all CLI-related functionality including:
//! - Argument parsing
//! - Merging arguments with the configuration file
//! - Running the copy and printing the summary
//! - Mapping the result to an exit status

use crate::config::{CopyConfig, CopySettings};
use crate::error::Result;
use crate::filter::{ExclusionSet, ExtensionSelection};
use crate::output::OutputFormatter;
use crate::pipeline::{self, RunOptions};
use crate::report::RunSummary;
use crate::select::SelectionMode;
use clap::Parser;
use std::path::PathBuf;

/// Exit status when `--strict` is set and at least one file failed.
pub const EXIT_PARTIAL_FAILURE: u8 = 2;

/// Find files below a folder and copy them, grouped by extension, into one
/// destination folder with collision-safe names.
#[derive(Debug, Clone, Parser)]
#[command(name = "extcopy", version, about)]
pub struct Cli {
    /// The root folder to search for files
    pub source: PathBuf,

    /// The destination folder to copy files to (created if missing)
    pub destination: PathBuf,

    /// Substrings to exclude from file names (case-sensitive, literal)
    #[arg(long, num_args = 0.., value_name = "SUBSTRING")]
    pub exclude: Vec<String>,

    /// Copy only these extensions, e.g. `--ext jpg png`
    #[arg(long = "ext", num_args = 1.., value_name = "EXT", conflicts_with = "select")]
    pub extensions: Vec<String>,

    /// List the discovered extensions and ask which ones to copy
    #[arg(long)]
    pub select: bool,

    /// Show what would be copied without writing anything
    #[arg(long)]
    pub dry_run: bool,

    /// Append one line per processed file to this log file
    #[arg(long, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Write a JSON record of the run to this file
    #[arg(long, value_name = "PATH")]
    pub manifest: Option<PathBuf>,

    /// Configuration file (defaults to .extcopyrc.toml or ~/.config/extcopy/config.toml)
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Hide the progress bar
    #[arg(long)]
    pub no_progress: bool,

    /// Also print every file outcome as a colored line
    #[arg(short, long)]
    pub verbose: bool,

    /// Exit with status 2 if any file could not be copied
    #[arg(long)]
    pub strict: bool,
}

impl Cli {
    /// Combines the parsed arguments with the loaded configuration.
    fn to_options(&self, settings: CopySettings) -> RunOptions {
        let selection = if self.select {
            SelectionMode::Prompt
        } else if settings.extensions.is_empty() {
            SelectionMode::Fixed(ExtensionSelection::All)
        } else {
            SelectionMode::Fixed(ExtensionSelection::only(&settings.extensions))
        };

        RunOptions {
            source: self.source.clone(),
            destination: self.destination.clone(),
            exclusions: ExclusionSet::new(settings.exclude),
            selection,
            dry_run: self.dry_run,
            show_progress: settings.progress,
            verbose: self.verbose,
            log_file: settings.log_file,
            manifest: self.manifest.clone(),
        }
    }
}

/// Runs the CLI application with already-parsed arguments.
///
/// Returns the run summary when the run completed, even if some files failed.
/// Returns an error when the run could not start.
///
/// # Examples
///
/// ```no_run
/// use clap::Parser;
/// use extcopy::cli::{Cli, run_cli};
///
/// let cli = Cli::parse_from(["extcopy", "/photos/export", "/photos/all", "--exclude", ".json"]);
/// match run_cli(&cli) {
///     Ok(summary) => println!("{}", summary),
///     Err(e) => eprintln!("Error: {}", e),
/// }
/// ```
pub fn run_cli(cli: &Cli) -> Result<RunSummary> {
    let config = CopyConfig::load(cli.config.as_deref())?.merge_cli(
        &cli.exclude,
        &cli.extensions,
        cli.log_file.as_deref(),
        cli.no_progress,
    );
    let options = cli.to_options(config.copy);

    if options.dry_run {
        OutputFormatter::dry_run_notice(&format!(
            "Analyzing {} (nothing will be written to {})",
            options.source.display(),
            options.destination.display()
        ));
    } else {
        OutputFormatter::info(&format!(
            "Copying files from {} to {}",
            options.source.display(),
            options.destination.display()
        ));
    }
    if !options.exclusions.is_empty() {
        let list: Vec<&str> = options.exclusions.iter().collect();
        OutputFormatter::info(&format!("Excluding names containing: {}", list.join(", ")));
    }

    let output = pipeline::run(&options)?;
    let report = output.report;

    if report.summary.found == 0 {
        OutputFormatter::warning("No files found in the source folder.");
    } else {
        OutputFormatter::summary_table(&report.tallies, &report.summary);
    }
    println!("\n{}", report.summary);

    if let Some(e) = output.manifest_error {
        OutputFormatter::warning(&e.to_string());
    }

    if report.summary.dry_run {
        OutputFormatter::dry_run_notice("Dry run complete. No files were copied.");
    } else if report.summary.is_clean() {
        OutputFormatter::success("Copy complete!");
    } else {
        OutputFormatter::warning("Some files could not be copied. Please review errors above.");
    }

    Ok(report.summary)
}

/// Exit status for a completed run.
///
/// A run that reaches the end is a success (0) even when individual files
/// failed; those failures are in the summary. With `strict`, any failed file
/// turns the status into [`EXIT_PARTIAL_FAILURE`].
pub fn exit_status(summary: &RunSummary, strict: bool) -> u8 {
    if strict && !summary.is_clean() {
        EXIT_PARTIAL_FAILURE
    } else {
        0
    }
}
