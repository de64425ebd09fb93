//! Recursive discovery of source files and grouping by extension.
//!
//! The [`Traverser`] is a lazy iterator over every regular file below a
//! [`SourceRoot`]. Symbolic links are neither followed nor yielded, which
//! keeps cyclic link structures from producing an endless walk. Errors below
//! the root are yielded as items so one unreadable subdirectory does not stop
//! the scan.

use crate::error::{ExtcopyError, Result};
use crate::paths::{RelativePath, SourcePath, SourceRoot};
use std::collections::BTreeMap;
use std::ffi::OsString;
use std::path::PathBuf;
use walkdir::{DirEntry, WalkDir};

/// One discovered source file.
#[derive(Debug, Clone)]
pub struct FileEntry {
    /// Absolute path to the file.
    pub source: SourcePath,
    /// Path relative to the source root.
    pub relative: RelativePath,
    /// The file name as stored on disk.
    pub file_name: OsString,
    /// Extension without the leading dot, if any.
    pub extension: Option<String>,
    /// Size in bytes at discovery time.
    pub size: u64,
}

impl FileEntry {
    fn from_dir_entry(root: &SourceRoot, entry: &DirEntry) -> Result<Self> {
        let metadata = entry.metadata()?;
        let path = entry.path();

        Ok(Self {
            source: SourcePath::new(path.to_path_buf()),
            relative: RelativePath::between(root, path),
            file_name: entry.file_name().to_os_string(),
            extension: path
                .extension()
                .map(|ext| ext.to_string_lossy().into_owned()),
            size: metadata.len(),
        })
    }

    /// File name for substring matching and display.
    pub fn name_lossy(&self) -> String {
        self.file_name.to_string_lossy().into_owned()
    }
}

/// Lazy, single-pass walk over a source tree.
pub struct Traverser {
    root: SourceRoot,
    walker: Box<dyn Iterator<Item = walkdir::Result<DirEntry>>>,
}

impl Traverser {
    /// Starts a walk at `root`.
    pub fn new(root: SourceRoot) -> Self {
        Self::skipping(root, None)
    }

    /// Starts a walk at `root` that never descends into `skip_dir`.
    ///
    /// Used when the destination lives inside the source tree, so earlier
    /// copies are not picked up again.
    pub fn skipping(root: SourceRoot, skip_dir: Option<PathBuf>) -> Self {
        let walker = WalkDir::new(root.as_path())
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(move |entry| match &skip_dir {
                Some(skip) => entry.depth() == 0 || entry.path() != skip.as_path(),
                None => true,
            });

        Self {
            root,
            walker: Box::new(walker),
        }
    }
}

impl Iterator for Traverser {
    type Item = Result<FileEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let entry = match self.walker.next()? {
                Ok(entry) => entry,
                Err(err) => return Some(Err(ExtcopyError::from(err))),
            };

            let file_type = entry.file_type();
            if file_type.is_file() {
                return Some(FileEntry::from_dir_entry(&self.root, &entry));
            }
            if file_type.is_symlink() {
                tracing::debug!(path = %entry.path().display(), "skipping symbolic link");
            }
        }
    }
}

/// Files grouped by extension, in extension order.
///
/// Files without an extension are grouped under `None`, which sorts first.
#[derive(Debug, Default)]
pub struct ExtensionGroups {
    groups: BTreeMap<Option<String>, Vec<FileEntry>>,
}

impl ExtensionGroups {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, entry: FileEntry) {
        self.groups
            .entry(entry.extension.clone())
            .or_default()
            .push(entry);
    }

    /// Number of files across all groups.
    pub fn total_files(&self) -> usize {
        self.groups.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Extensions with their file counts, in processing order.
    pub fn extensions(&self) -> Vec<(Option<&str>, usize)> {
        self.groups
            .iter()
            .map(|(ext, files)| (ext.as_deref(), files.len()))
            .collect()
    }

    /// Consumes the groups, yielding entries extension by extension.
    pub fn into_entries(self) -> impl Iterator<Item = FileEntry> {
        self.groups.into_values().flatten()
    }
}

/// Display label for an extension group.
pub fn extension_label(extension: Option<&str>) -> String {
    match extension {
        Some(ext) => format!(".{}", ext),
        None => "(no extension)".to_string(),
    }
}
