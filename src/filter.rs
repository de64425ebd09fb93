//! Exclusion rules.
//!
//! Two independent checks decide whether a discovered file is skipped:
//! - the exclusion substrings, matched literally and case-sensitively anywhere
//!   in the file name
//! - the extension selection, which limits a run to chosen extension groups

use std::collections::BTreeSet;

/// Substrings that exclude a file when they occur in its name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExclusionSet {
    substrings: BTreeSet<String>,
}

impl ExclusionSet {
    /// Builds a set from user input. Empty strings are dropped, since they
    /// would match every file name.
    pub fn new<I, S>(substrings: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            substrings: substrings
                .into_iter()
                .map(Into::into)
                .filter(|s| !s.is_empty())
                .collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.substrings.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.substrings.iter().map(String::as_str)
    }

    /// Returns the first substring contained in `filename`, if any.
    pub fn matching<'a>(&'a self, filename: &str) -> Option<&'a str> {
        self.iter().find(|sub| filename.contains(*sub))
    }
}

/// Returns true if any member of `exclusions` occurs in `filename`.
pub fn should_exclude(filename: &str, exclusions: &ExclusionSet) -> bool {
    exclusions.matching(filename).is_some()
}

/// Which extension groups a run copies.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ExtensionSelection {
    /// Copy every extension group.
    #[default]
    All,
    /// Copy only these extensions, stored lowercase without a leading dot.
    /// An empty string selects files that have no extension.
    Only(BTreeSet<String>),
    /// Copy only these extension groups, compared exactly as discovered.
    Groups(BTreeSet<Option<String>>),
}

impl ExtensionSelection {
    /// Builds a selection from user-supplied extensions such as `jpg` or `.JPG`.
    pub fn only<I, S>(extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self::Only(extensions.into_iter().map(|e| normalize(e.as_ref())).collect())
    }

    /// Returns true if files with `extension` should be copied.
    pub fn allows(&self, extension: Option<&str>) -> bool {
        match self {
            Self::All => true,
            Self::Only(selected) => selected.contains(&normalize(extension.unwrap_or(""))),
            Self::Groups(selected) => selected.contains(&extension.map(str::to_string)),
        }
    }
}

fn normalize(extension: &str) -> String {
    extension.trim().trim_start_matches('.').to_ascii_lowercase()
}
