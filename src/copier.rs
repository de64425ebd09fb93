/// Byte-for-byte file copying into the destination directory.
///
/// Each copy is streamed into a hidden temporary file next to its final
/// location and renamed into place only after the data has been flushed. The
/// rename refuses to replace an existing file, so a copy never clobbers
/// anything and an interrupted or failed copy leaves no partial file behind.
use crate::error::{ExtcopyError, Result};
use crate::namer::CopyTask;
use crate::paths::{DestinationPath, SourcePath};
use std::fs::{self, File};
use std::io;

/// Prefix of in-flight copies inside the destination directory.
pub const STAGING_PREFIX: &str = ".extcopy-";

/// Copies source files to their assigned destinations.
pub struct Copier;

impl Copier {
    /// Runs one [`CopyTask`], returning the number of bytes written.
    pub fn execute(task: &CopyTask) -> Result<u64> {
        Self::copy(&task.entry.source, &task.destination)
    }

    /// Copies `source` to `destination`.
    ///
    /// Parent directories of `destination` are created as needed. Fails with
    /// [`ExtcopyError::Collision`] if `destination` already exists, and with
    /// `Access` or `Io` on read/write failures. The source permission bits are
    /// carried over.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use extcopy::copier::Copier;
    /// use extcopy::paths::{DestinationDir, SourcePath};
    /// use std::ffi::OsStr;
    /// use std::path::{Path, PathBuf};
    ///
    /// let dest = DestinationDir::prepare(Path::new("/path/to/out")).unwrap();
    /// let result = Copier::copy(
    ///     &SourcePath::new(PathBuf::from("/path/to/photo.jpg")),
    ///     &dest.join(OsStr::new("1700000000-000001_photo.jpg")),
    /// );
    ///
    /// match result {
    ///     Ok(bytes) => println!("Copied {} bytes", bytes),
    ///     Err(e) => eprintln!("Copy failed: {}", e),
    /// }
    /// ```
    pub fn copy(source: &SourcePath, destination: &DestinationPath) -> Result<u64> {
        let dest = destination.as_path();

        if fs::symlink_metadata(dest).is_ok() {
            return Err(ExtcopyError::Collision {
                path: dest.to_path_buf(),
                reason: "destination already exists".to_string(),
            });
        }

        let parent = dest.parent().ok_or_else(|| ExtcopyError::Io {
            path: dest.to_path_buf(),
            source: io::Error::new(io::ErrorKind::InvalidInput, "destination has no parent"),
        })?;
        fs::create_dir_all(parent).map_err(|e| ExtcopyError::io(parent, e))?;

        let mut reader =
            File::open(source.as_path()).map_err(|e| ExtcopyError::io(source.as_path(), e))?;
        let permissions = reader
            .metadata()
            .map_err(|e| ExtcopyError::io(source.as_path(), e))?
            .permissions();

        // Dropping `staging` on any early return deletes the partial file.
        let mut staging = tempfile::Builder::new()
            .prefix(STAGING_PREFIX)
            .suffix(".part")
            .tempfile_in(parent)
            .map_err(|e| ExtcopyError::io(parent, e))?;

        let bytes = io::copy(&mut reader, staging.as_file_mut())
            .map_err(|e| ExtcopyError::io(dest, e))?;
        staging
            .as_file()
            .sync_all()
            .map_err(|e| ExtcopyError::io(dest, e))?;
        fs::set_permissions(staging.path(), permissions).map_err(|e| ExtcopyError::io(dest, e))?;

        staging.persist_noclobber(dest).map_err(|e| {
            if e.error.kind() == io::ErrorKind::AlreadyExists {
                ExtcopyError::Collision {
                    path: dest.to_path_buf(),
                    reason: "destination appeared during copy".to_string(),
                }
            } else {
                ExtcopyError::io(dest, e.error)
            }
        })?;

        tracing::trace!(source = %source, destination = %destination, bytes, "copied");
        Ok(bytes)
    }
}
