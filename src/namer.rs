//! Collision-free destination names.
//!
//! Every copy is named `<token>_<original name>`. The token combines the run
//! stamp (Unix seconds when the run started) with a per-run counter, e.g.
//! `1760853300-000042_IMG_0001.jpg`. If that name is already taken, either by
//! an earlier task of the same run or by a file already in the destination,
//! an attempt suffix is added to the token until the name is free.

use crate::error::{ExtcopyError, Result};
use crate::paths::{DestinationDir, DestinationPath};
use crate::traverse::FileEntry;
use std::collections::HashSet;
use std::ffi::{OsStr, OsString};
use std::fs;

/// Upper bound on alternative tokens tried for one file.
pub const MAX_NAME_ATTEMPTS: u32 = 1000;

/// A file scheduled for copying.
#[derive(Debug, Clone)]
pub struct CopyTask {
    pub entry: FileEntry,
    pub destination: DestinationPath,
}

/// Prefixes `original_filename` with `uniqueness_token`.
pub fn make_destination_name(original_filename: &OsStr, uniqueness_token: &str) -> OsString {
    let mut name = OsString::with_capacity(uniqueness_token.len() + 1 + original_filename.len());
    name.push(uniqueness_token);
    name.push("_");
    name.push(original_filename);
    name
}

/// Hands out unique destination paths for one run.
#[derive(Debug)]
pub struct Namer {
    run_stamp: i64,
    counter: u64,
    claimed: HashSet<DestinationPath>,
}

impl Namer {
    /// Creates a namer whose tokens start with `run_stamp`.
    pub fn new(run_stamp: i64) -> Self {
        Self {
            run_stamp,
            counter: 0,
            claimed: HashSet::new(),
        }
    }

    /// Creates a namer stamped with the current time.
    pub fn for_run() -> Self {
        Self::new(chrono::Utc::now().timestamp())
    }

    /// Token for the current file at the given retry attempt.
    fn token(&self, attempt: u32) -> String {
        if attempt == 0 {
            format!("{}-{:06}", self.run_stamp, self.counter)
        } else {
            format!("{}-{:06}-{}", self.run_stamp, self.counter, attempt)
        }
    }

    /// Assigns a destination for `entry` inside `destination`.
    ///
    /// The returned path is guaranteed not to be claimed by this namer before
    /// and not to exist on disk (not even as a dangling link) at the time of
    /// the call. Fails with [`ExtcopyError::Collision`] once
    /// [`MAX_NAME_ATTEMPTS`] names have been tried.
    pub fn assign(&mut self, entry: &FileEntry, destination: &DestinationDir) -> Result<CopyTask> {
        self.counter += 1;

        for attempt in 0..MAX_NAME_ATTEMPTS {
            let name = make_destination_name(&entry.file_name, &self.token(attempt));
            let candidate = destination.join(&name);

            // Dangling links count as taken.
            let on_disk = fs::symlink_metadata(candidate.as_path()).is_ok();
            if on_disk || self.claimed.contains(&candidate) {
                tracing::debug!(candidate = %candidate, attempt, "destination name taken");
                continue;
            }

            self.claimed.insert(candidate.clone());
            return Ok(CopyTask {
                entry: entry.clone(),
                destination: candidate,
            });
        }

        Err(ExtcopyError::Collision {
            path: destination
                .join(&make_destination_name(&entry.file_name, &self.token(0)))
                .as_path()
                .to_path_buf(),
            reason: format!("no free name after {} attempts", MAX_NAME_ATTEMPTS),
        })
    }
}
