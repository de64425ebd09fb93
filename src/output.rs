//! Output formatting and styling module.
//!
//! Provides a centralized interface for all CLI output, including colored output,
//! progress tracking, and the per-extension summary table.

use crate::report::{ExtensionTally, OutcomeKind, OutcomeRecord, RunSummary};
use crate::traverse::extension_label;
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::BTreeMap;

/// Manages all CLI output with consistent styling and formatting.
///
/// This struct provides methods for:
/// - Success messages (green with ✓)
/// - Error messages (red with ✗)
/// - Warning messages (yellow with ⚠)
/// - Info messages (cyan)
/// - Progress bars for copy runs
/// - Summary tables with statistics
pub struct OutputFormatter;

impl OutputFormatter {
    /// Prints a success message in green with a checkmark.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use extcopy::output::OutputFormatter;
    /// OutputFormatter::success("Copy complete!");
    /// ```
    pub fn success(message: &str) {
        println!("{} {}", "✓".green(), message);
    }

    /// Prints an error message in red with an X mark.
    pub fn error(message: &str) {
        eprintln!("{} {}", "✗".red(), message);
    }

    /// Prints a warning message in yellow with a warning symbol.
    pub fn warning(message: &str) {
        eprintln!("{} {}", "⚠".yellow(), message);
    }

    /// Prints an info message in cyan.
    pub fn info(message: &str) {
        println!("{}", message.cyan());
    }

    /// Prints a section header.
    pub fn header(header: &str) {
        println!("\n{}", header.bold());
    }

    /// Creates and returns a progress bar for a copy run.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use extcopy::output::OutputFormatter;
    /// let pb = OutputFormatter::create_progress_bar(100);
    /// pb.inc(1);
    /// pb.finish_with_message("Completed!");
    /// ```
    pub fn create_progress_bar(total: u64) -> ProgressBar {
        let style = ProgressStyle::default_bar()
            .template("{spinner:.cyan} [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▓░");
        let pb = ProgressBar::new(total);
        pb.set_style(style);
        pb
    }

    /// Formats one outcome record for the console.
    pub fn outcome_line(record: &OutcomeRecord, dry_run: bool) -> String {
        match record.outcome {
            OutcomeKind::Copied => {
                let target = record
                    .destination
                    .as_deref()
                    .and_then(|d| d.file_name())
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default();
                let verb = if dry_run { "would copy" } else { "copied" };
                format!(
                    "{} {} {} {}",
                    "✓".green(),
                    record.relative.display(),
                    format!("→ {}", verb).dimmed(),
                    target
                )
            }
            OutcomeKind::Excluded => format!(
                "{} {} {}",
                "-".yellow(),
                record.relative.display(),
                format!("({})", record.reason.as_deref().unwrap_or("excluded")).dimmed()
            ),
            OutcomeKind::Failed => format!(
                "{} {}: {}",
                "✗".red(),
                record.relative.display(),
                record.reason.as_deref().unwrap_or("failed").red()
            ),
        }
    }

    /// Prints a summary table with per-extension statistics.
    pub fn summary_table(tallies: &BTreeMap<Option<String>, ExtensionTally>, summary: &RunSummary) {
        Self::header("SUMMARY");

        let labels: Vec<(String, &ExtensionTally)> = tallies
            .iter()
            .map(|(ext, tally)| (extension_label(ext.as_deref()), tally))
            .collect();

        let width = labels
            .iter()
            .map(|(label, _)| label.len())
            .max()
            .unwrap_or(0)
            .max(9); // At least "Extension" width

        let copied_header = if summary.dry_run { "To copy" } else { "Copied" };
        println!(
            "{:<width$} | {:>7} | {:>8} | {:>8} | {:>7}",
            "Extension".bold(),
            "Found".bold(),
            copied_header.bold(),
            "Excluded".bold(),
            "Failed".bold(),
            width = width
        );
        println!("{}", "-".repeat(width + 44));

        for (label, tally) in &labels {
            println!(
                "{:<width$} | {:>7} | {:>8} | {:>8} | {:>7}",
                label,
                tally.found,
                tally.copied.to_string().green(),
                tally.excluded.to_string().yellow(),
                if tally.failed > 0 {
                    tally.failed.to_string().red()
                } else {
                    tally.failed.to_string().normal()
                },
                width = width
            );
        }

        println!("{}", "-".repeat(width + 44));
        println!(
            "{:<width$} | {:>7} | {:>8} | {:>8} | {:>7}",
            "Total".bold(),
            summary.found,
            summary.copied.to_string().green().bold(),
            summary.excluded,
            summary.failed,
            width = width
        );
    }

    /// Prints a dry-run notice message.
    pub fn dry_run_notice(message: &str) {
        println!("{}", format!("[DRY RUN] {}", message).yellow());
    }
}
