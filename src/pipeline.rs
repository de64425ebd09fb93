//! The copy run.
//!
//! A run scans the whole source tree first, grouping files by extension. The
//! group sizes give the exact total for progress reporting and let the user
//! choose extensions before anything is written. Entries are then resolved one
//! at a time: exclusion check, extension check, naming, copying, reporting.

use crate::copier::Copier;
use crate::error::{ExtcopyError, Result};
use crate::filter::{ExclusionSet, ExtensionSelection};
use crate::namer::Namer;
use crate::paths::{DestinationDir, SourceRoot};
use crate::report::{ExcludeReason, Outcome, Reporter, RunManifest, RunReport};
use crate::select::{SelectionMode, prompt_extensions};
use crate::traverse::{ExtensionGroups, FileEntry, Traverser};
use std::io;
use std::path::PathBuf;

/// Everything a run needs to know.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    pub source: PathBuf,
    pub destination: PathBuf,
    pub exclusions: ExclusionSet,
    pub selection: SelectionMode,
    /// Resolve names and report, but write nothing.
    pub dry_run: bool,
    pub show_progress: bool,
    pub verbose: bool,
    pub log_file: Option<PathBuf>,
    pub manifest: Option<PathBuf>,
}

/// A finished run plus anything that went wrong after the copying was done.
#[derive(Debug)]
pub struct RunOutput {
    pub report: RunReport,
    /// Set when the manifest was requested but could not be written.
    pub manifest_error: Option<ExtcopyError>,
}

/// Copies every selected, non-excluded file below `options.source` into
/// `options.destination`.
///
/// Returns an error only for problems that prevent the run from starting:
/// unreadable source, unusable destination, or a rejected extension prompt.
/// Per-file problems are recorded in the returned report.
pub fn run(options: &RunOptions) -> Result<RunOutput> {
    let started_at = chrono::Utc::now();

    // The source is checked before the destination is created, so a bad
    // source leaves no trace on disk.
    let root = SourceRoot::open(&options.source)?;
    let destination = if options.dry_run {
        DestinationDir::unchecked(&options.destination)
    } else {
        DestinationDir::prepare(&options.destination)?
    };
    tracing::info!(
        source = %root.as_path().display(),
        destination = %destination.as_path().display(),
        dry_run = options.dry_run,
        "starting run"
    );

    let skip = destination
        .as_path()
        .starts_with(root.as_path())
        .then(|| destination.as_path().to_path_buf())
        .filter(|dest| dest != root.as_path());

    let (groups, unreadable) = scan(Traverser::skipping(root.clone(), skip));
    tracing::info!(
        files = groups.total_files(),
        extensions = groups.extensions().len(),
        "scan complete"
    );

    let selection = match &options.selection {
        SelectionMode::Fixed(selection) => selection.clone(),
        SelectionMode::Prompt if groups.is_empty() => ExtensionSelection::All,
        SelectionMode::Prompt => {
            prompt_extensions(&groups, io::stdin().lock(), io::stdout().lock())?
        }
    };

    let mut reporter = Reporter::new(
        groups.total_files(),
        options.show_progress,
        options.verbose,
        options.dry_run,
    );
    if let Some(path) = &options.log_file {
        match Reporter::open_log_file(path) {
            Ok(sink) => reporter = reporter.with_sink(sink),
            Err(e) => tracing::warn!(
                path = %path.display(),
                error = %e,
                "could not open log file; continuing without it"
            ),
        }
    }

    for error in &unreadable {
        reporter.record_unreadable(error);
    }

    let mut namer = Namer::for_run();
    for entry in groups.into_entries() {
        let outcome = resolve(
            &entry,
            &options.exclusions,
            &selection,
            &mut namer,
            &destination,
            options.dry_run,
        );
        reporter.record(&entry, outcome);
    }

    let report = reporter.finish();

    let manifest_error = options.manifest.as_ref().and_then(|path| {
        let manifest = RunManifest {
            started_at,
            finished_at: chrono::Utc::now(),
            source: root.as_path(),
            destination: destination.as_path(),
            exclusions: options.exclusions.iter().collect(),
            summary: &report.summary,
            records: &report.records,
        };
        manifest.save(path).err()
    });

    Ok(RunOutput {
        report,
        manifest_error,
    })
}

/// Runs the traversal to completion, grouping files and collecting the
/// errors met below the root.
fn scan(traverser: Traverser) -> (ExtensionGroups, Vec<ExtcopyError>) {
    let mut groups = ExtensionGroups::new();
    let mut unreadable = Vec::new();

    for item in traverser {
        match item {
            Ok(entry) => groups.push(entry),
            Err(e) => {
                tracing::warn!(error = %e, "unreadable entry during scan");
                unreadable.push(e);
            }
        }
    }

    (groups, unreadable)
}

/// Decides and carries out what happens to one file.
fn resolve(
    entry: &FileEntry,
    exclusions: &ExclusionSet,
    selection: &ExtensionSelection,
    namer: &mut Namer,
    destination: &DestinationDir,
    dry_run: bool,
) -> Outcome {
    if let Some(substring) = exclusions.matching(&entry.name_lossy()) {
        return Outcome::Excluded(ExcludeReason::Substring(substring.to_string()));
    }

    if !selection.allows(entry.extension.as_deref()) {
        return Outcome::Excluded(ExcludeReason::ExtensionNotSelected(entry.extension.clone()));
    }

    let task = match namer.assign(entry, destination) {
        Ok(task) => task,
        Err(e) => return Outcome::Failed(e),
    };

    if dry_run {
        return Outcome::Copied {
            destination: task.destination,
            bytes: entry.size,
        };
    }

    match Copier::execute(&task) {
        Ok(bytes) => Outcome::Copied {
            destination: task.destination,
            bytes,
        },
        Err(e) => Outcome::Failed(e),
    }
}
