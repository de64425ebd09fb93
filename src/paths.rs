//! Path newtypes.
//!
//! Source and destination paths flow through the same pipeline, so each role
//! gets its own type and the compiler keeps them apart.

use crate::error::{ExtcopyError, Result};
use std::ffi::OsStr;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Root directory of the tree being scanned. Always absolute once validated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceRoot(PathBuf);

impl SourceRoot {
    /// Validates that `path` exists, is a directory and can be listed.
    pub fn open(path: &Path) -> Result<Self> {
        let metadata = fs::metadata(path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => ExtcopyError::NotFound(path.to_path_buf()),
            _ => ExtcopyError::io(path, e),
        })?;

        if !metadata.is_dir() {
            return Err(ExtcopyError::Io {
                path: path.to_path_buf(),
                source: io::Error::new(io::ErrorKind::InvalidInput, "not a directory"),
            });
        }

        // Listing is the real readability check; metadata succeeds on 0o000 dirs.
        fs::read_dir(path).map_err(|e| ExtcopyError::io(path, e))?;

        let absolute = path.canonicalize().map_err(|e| ExtcopyError::io(path, e))?;
        Ok(Self(absolute))
    }

    pub fn as_path(&self) -> &Path {
        &self.0
    }
}

/// Absolute path of one file inside the source tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourcePath(PathBuf);

impl SourcePath {
    pub fn new(path: PathBuf) -> Self {
        Self(path)
    }

    pub fn as_path(&self) -> &Path {
        &self.0
    }
}

impl fmt::Display for SourcePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.display())
    }
}

/// Path of a file relative to its [`SourceRoot`], used for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelativePath(PathBuf);

impl RelativePath {
    pub fn new(path: PathBuf) -> Self {
        Self(path)
    }

    /// Strips `root` from `path`; falls back to the full path when `path` is
    /// not below `root`.
    pub fn between(root: &SourceRoot, path: &Path) -> Self {
        Self(
            path.strip_prefix(root.as_path())
                .unwrap_or(path)
                .to_path_buf(),
        )
    }

    pub fn as_path(&self) -> &Path {
        &self.0
    }
}

impl fmt::Display for RelativePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.display())
    }
}

/// Directory that receives the copies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DestinationDir(PathBuf);

impl DestinationDir {
    /// Wraps a destination without touching the filesystem (dry runs).
    pub fn unchecked(path: &Path) -> Self {
        Self(absolutize(path))
    }

    /// Creates the directory if needed and probes that it is writable.
    pub fn prepare(path: &Path) -> Result<Self> {
        fs::create_dir_all(path).map_err(|e| ExtcopyError::io(path, e))?;

        tempfile::Builder::new()
            .prefix(".extcopy-probe")
            .tempfile_in(path)
            .map_err(|e| ExtcopyError::io(path, e))?;

        let absolute = path.canonicalize().map_err(|e| ExtcopyError::io(path, e))?;
        Ok(Self(absolute))
    }

    pub fn as_path(&self) -> &Path {
        &self.0
    }

    /// Joins a file name produced by the namer.
    pub fn join(&self, file_name: &OsStr) -> DestinationPath {
        DestinationPath(self.0.join(file_name))
    }
}

/// Full path of one copy inside the [`DestinationDir`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DestinationPath(PathBuf);

impl DestinationPath {
    pub fn as_path(&self) -> &Path {
        &self.0
    }

    pub fn file_name(&self) -> Option<&OsStr> {
        self.0.file_name()
    }
}

impl fmt::Display for DestinationPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.display())
    }
}

fn absolutize(path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .map(|cwd| cwd.join(path))
            .unwrap_or_else(|_| path.to_path_buf())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_source_root_missing_is_not_found() {
        let result = SourceRoot::open(Path::new("/non/existent/source"));
        assert!(matches!(result, Err(ExtcopyError::NotFound(_))));
    }

    #[test]
    fn test_source_root_rejects_file() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let file_path = temp_dir.path().join("file.txt");
        fs::write(&file_path, "x").expect("Failed to write file");

        assert!(SourceRoot::open(&file_path).is_err());
    }

    #[test]
    fn test_relative_path_strips_root() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let root = SourceRoot::open(temp_dir.path()).expect("Failed to open root");
        let nested = root.as_path().join("a").join("x.jpg");

        let relative = RelativePath::between(&root, &nested);
        assert_eq!(relative.as_path(), Path::new("a/x.jpg"));
    }

    #[test]
    fn test_destination_prepare_creates_directory() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let dest = temp_dir.path().join("out").join("nested");

        let prepared = DestinationDir::prepare(&dest).expect("Failed to prepare destination");
        assert!(dest.is_dir());
        // The probe file must not linger.
        assert_eq!(fs::read_dir(prepared.as_path()).unwrap().count(), 0);
    }
}
