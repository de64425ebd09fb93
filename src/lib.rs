//! extcopy - collect files from a directory tree into one folder
//!
//! This library walks a source tree, groups the files it finds by extension,
//! skips files whose names contain any of a set of exclusion substrings, and
//! copies the rest into a single destination folder. Every copy gets a
//! uniqueness token prefixed to its name, so files that share a name in
//! different subfolders never overwrite each other.

pub mod cli;
pub mod config;
pub mod copier;
pub mod error;
pub mod filter;
pub mod namer;
pub mod output;
pub mod paths;
pub mod pipeline;
pub mod report;
pub mod select;
pub mod traverse;

pub use config::{ConfigError, CopyConfig};
pub use copier::Copier;
pub use error::{ExtcopyError, Result};
pub use filter::{ExclusionSet, ExtensionSelection, should_exclude};
pub use namer::{CopyTask, Namer, make_destination_name};
pub use pipeline::{RunOptions, RunOutput, run};
pub use report::{Outcome, Reporter, RunSummary};
pub use traverse::{ExtensionGroups, FileEntry, Traverser};

pub use cli::{Cli, exit_status, run_cli};
