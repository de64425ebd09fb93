//! Error types for extcopy.
//!
//! Root-level variants (`NotFound`, `Access` on the source or destination,
//! `Config`, `Selection`) abort a run. The same `Access`, `Collision` and `Io`
//! variants are also produced per file; the pipeline records those and moves
//! on to the next entry.

use crate::config::ConfigError;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Main error type for extcopy operations.
#[derive(Error, Debug)]
pub enum ExtcopyError {
    /// The source root does not exist.
    #[error("Source directory not found: {}", .0.display())]
    NotFound(PathBuf),

    /// Permission denied reading a directory or file, or writing the destination.
    #[error("Permission denied at '{}': {source}", path.display())]
    Access {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// No unique destination name could be produced, or the destination already exists.
    #[error("Destination collision at '{}': {reason}", path.display())]
    Collision { path: PathBuf, reason: String },

    /// Read or write failure during traversal or copy.
    #[error("I/O error at '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Configuration could not be loaded.
    #[error("Error loading configuration: {0}")]
    Config(#[from] ConfigError),

    /// The interactive extension selection was not usable.
    #[error("Invalid extension selection: {0}")]
    Selection(String),

    /// The run manifest could not be written.
    #[error("Could not write manifest '{}': {reason}", path.display())]
    Manifest { path: PathBuf, reason: String },
}

impl ExtcopyError {
    /// Classifies an I/O error on `path`, separating permission problems from
    /// the rest.
    pub fn io(path: impl AsRef<Path>, source: io::Error) -> Self {
        let path = path.as_ref().to_path_buf();
        match source.kind() {
            io::ErrorKind::PermissionDenied => Self::Access { path, source },
            _ => Self::Io { path, source },
        }
    }

    /// Short name of the error class, used in log records.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "not-found",
            Self::Access { .. } => "access",
            Self::Collision { .. } => "collision",
            Self::Io { .. } => "io",
            Self::Config(_) => "config",
            Self::Selection(_) => "selection",
            Self::Manifest { .. } => "manifest",
        }
    }
}

impl From<walkdir::Error> for ExtcopyError {
    fn from(err: walkdir::Error) -> Self {
        let path = err.path().map(Path::to_path_buf).unwrap_or_default();
        match err.into_io_error() {
            Some(source) => Self::io(path, source),
            None => Self::Io {
                path,
                source: io::Error::other("filesystem loop detected"),
            },
        }
    }
}

/// Result type for extcopy operations.
pub type Result<T> = std::result::Result<T, ExtcopyError>;
