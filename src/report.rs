//! Progress, per-file log records and the end-of-run summary.
//!
//! The [`Reporter`] sees every discovered file exactly once. For each one it
//! writes a log record, advances the progress bar and updates the
//! [`RunSummary`]. Logging never interrupts a copy: if the log sink fails,
//! the failure is reported once through `tracing` and the sink is dropped.

use crate::error::{ExtcopyError, Result};
use crate::output::OutputFormatter;
use crate::paths::DestinationPath;
use crate::traverse::FileEntry;
use chrono::{DateTime, Utc};
use indicatif::ProgressBar;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::fs::{self, OpenOptions};
use std::io::{self, LineWriter, Write};
use std::path::{Path, PathBuf};

/// Why a file was not copied even though nothing went wrong.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExcludeReason {
    /// The file name contains this exclusion substring.
    Substring(String),
    /// The file's extension group was not selected.
    ExtensionNotSelected(Option<String>),
}

impl fmt::Display for ExcludeReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Substring(sub) => write!(f, "name contains \"{}\"", sub),
            Self::ExtensionNotSelected(Some(ext)) => write!(f, "extension .{} not selected", ext),
            Self::ExtensionNotSelected(None) => write!(f, "files without extension not selected"),
        }
    }
}

/// How one file was resolved.
#[derive(Debug)]
pub enum Outcome {
    /// Copied (or, in a dry run, would be copied) to `destination`.
    Copied {
        destination: DestinationPath,
        bytes: u64,
    },
    Excluded(ExcludeReason),
    Failed(ExtcopyError),
}

/// Outcome class, as written to logs and the manifest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OutcomeKind {
    Copied,
    Excluded,
    Failed,
}

impl OutcomeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Copied => "copied",
            Self::Excluded => "excluded",
            Self::Failed => "failed",
        }
    }
}

/// One resolved file, in a form that can be logged and serialized.
#[derive(Debug, Clone, Serialize)]
pub struct OutcomeRecord {
    pub source: PathBuf,
    pub relative: PathBuf,
    pub extension: Option<String>,
    pub outcome: OutcomeKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub destination: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl OutcomeRecord {
    fn new(entry: &FileEntry, outcome: &Outcome) -> Self {
        let (kind, destination, reason) = match outcome {
            Outcome::Copied { destination, .. } => (
                OutcomeKind::Copied,
                Some(destination.as_path().to_path_buf()),
                None,
            ),
            Outcome::Excluded(reason) => (OutcomeKind::Excluded, None, Some(reason.to_string())),
            Outcome::Failed(err) => (
                OutcomeKind::Failed,
                None,
                Some(format!("{}: {}", err.kind(), err)),
            ),
        };

        Self {
            source: entry.source.as_path().to_path_buf(),
            relative: entry.relative.as_path().to_path_buf(),
            extension: entry.extension.clone(),
            outcome: kind,
            destination,
            reason,
        }
    }

    /// Single-line, human-readable form used by the log sink.
    pub fn log_line(&self) -> String {
        let mut line = format!("{:<8} {}", self.outcome.as_str(), self.source.display());
        if let Some(dest) = &self.destination {
            line.push_str(&format!(" -> {}", dest.display()));
        }
        if let Some(reason) = &self.reason {
            line.push_str(&format!(" ({})", reason));
        }
        line
    }
}

/// Counts for a finished run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub found: usize,
    pub excluded: usize,
    pub copied: usize,
    pub failed: usize,
    /// Directory entries the traversal could not read.
    pub unreadable: usize,
    pub bytes_copied: u64,
    pub dry_run: bool,
}

impl RunSummary {
    /// True when no file failed and the whole tree could be read.
    pub fn is_clean(&self) -> bool {
        self.failed == 0 && self.unreadable == 0
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "found {}, excluded {}, {} {}, failed {}",
            self.found,
            self.excluded,
            if self.dry_run { "would copy" } else { "copied" },
            self.copied,
            self.failed
        )?;
        if self.unreadable > 0 {
            write!(f, ", unreadable {}", self.unreadable)?;
        }
        Ok(())
    }
}

/// Per-extension counts for the summary table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ExtensionTally {
    pub found: usize,
    pub copied: usize,
    pub excluded: usize,
    pub failed: usize,
}

/// Everything a finished run produced.
#[derive(Debug)]
pub struct RunReport {
    pub summary: RunSummary,
    pub tallies: BTreeMap<Option<String>, ExtensionTally>,
    pub records: Vec<OutcomeRecord>,
}

/// Tracks progress and writes per-file records.
pub struct Reporter {
    total: usize,
    progress: ProgressBar,
    sink: Option<Box<dyn Write>>,
    verbose: bool,
    summary: RunSummary,
    tallies: BTreeMap<Option<String>, ExtensionTally>,
    records: Vec<OutcomeRecord>,
}

impl Reporter {
    /// Creates a reporter for `total` files.
    ///
    /// With `show_progress` false the bar stays hidden. Every record is
    /// emitted as a `tracing` event (failures at warn level, the rest at
    /// info). With `verbose` each record is also echoed in color.
    pub fn new(total: usize, show_progress: bool, verbose: bool, dry_run: bool) -> Self {
        let progress = if show_progress {
            OutputFormatter::create_progress_bar(total as u64)
        } else {
            ProgressBar::hidden()
        };

        Self {
            total,
            progress,
            sink: None,
            verbose,
            summary: RunSummary {
                dry_run,
                ..RunSummary::default()
            },
            tallies: BTreeMap::new(),
            records: Vec::new(),
        }
    }

    /// Sends log records to `sink` as well.
    pub fn with_sink(mut self, sink: Box<dyn Write>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Opens `path` for appending, creating it if needed.
    pub fn open_log_file(path: &Path) -> io::Result<Box<dyn Write>> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Box::new(LineWriter::new(file)))
    }

    /// Records the resolution of one discovered file.
    pub fn record(&mut self, entry: &FileEntry, outcome: Outcome) {
        let record = OutcomeRecord::new(entry, &outcome);
        let tally = self.tallies.entry(entry.extension.clone()).or_default();

        self.summary.found += 1;
        tally.found += 1;
        match &outcome {
            Outcome::Copied { bytes, .. } => {
                self.summary.copied += 1;
                self.summary.bytes_copied += bytes;
                tally.copied += 1;
            }
            Outcome::Excluded(_) => {
                self.summary.excluded += 1;
                tally.excluded += 1;
            }
            Outcome::Failed(_) => {
                self.summary.failed += 1;
                tally.failed += 1;
            }
        }

        let line = record.log_line();
        self.write_log(&line);
        self.progress.suspend(|| {
            if record.outcome == OutcomeKind::Failed {
                tracing::warn!("{}", line);
            } else {
                tracing::info!("{}", line);
            }
            if self.verbose {
                eprintln!(
                    "{}",
                    OutputFormatter::outcome_line(&record, self.summary.dry_run)
                );
            }
        });

        self.records.push(record);
        self.progress.inc(1);
    }

    /// Records a directory entry the traversal could not read.
    pub fn record_unreadable(&mut self, error: &ExtcopyError) {
        self.summary.unreadable += 1;
        let line = format!("{:<8} {}", "skipped", error);
        self.write_log(&line);
        self.progress
            .suspend(|| OutputFormatter::warning(&format!("Skipped unreadable entry: {}", error)));
    }

    /// Writes the summary line and hands back the collected results.
    pub fn finish(mut self) -> RunReport {
        if self.summary.found != self.total {
            tracing::warn!(
                expected = self.total,
                resolved = self.summary.found,
                "resolved file count differs from discovered count"
            );
        }

        let line = format!("summary  {}", self.summary);
        self.write_log(&line);
        if let Some(sink) = self.sink.as_mut()
            && let Err(e) = sink.flush()
        {
            tracing::warn!(error = %e, "could not flush log file");
        }
        self.progress.finish_and_clear();
        tracing::info!(summary = %self.summary, "run finished");

        RunReport {
            summary: self.summary,
            tallies: self.tallies,
            records: self.records,
        }
    }

    fn write_log(&mut self, line: &str) {
        let Some(sink) = self.sink.as_mut() else {
            return;
        };
        if let Err(e) = writeln!(sink, "{}", line) {
            tracing::warn!(error = %e, "log file write failed; further log lines are dropped");
            self.sink = None;
        }
    }
}

/// Serializable record of a whole run.
#[derive(Debug, Serialize)]
pub struct RunManifest<'a> {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub source: &'a Path,
    pub destination: &'a Path,
    pub exclusions: Vec<&'a str>,
    pub summary: &'a RunSummary,
    pub records: &'a [OutcomeRecord],
}

impl RunManifest<'_> {
    /// Writes the manifest as pretty-printed JSON.
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).map_err(|e| ExtcopyError::Manifest {
            path: path.to_path_buf(),
            reason: format!("JSON serialization failed: {}", e),
        })?;

        fs::write(path, json).map_err(|e| ExtcopyError::Manifest {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }
}
