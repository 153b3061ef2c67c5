// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

/// File operations for publishing artifacts.
///
/// Provides directory mirroring used to move rendered charts and the
/// statistics snapshot into the cloned repository.
use std::{
    fs,
    path::{Path, PathBuf}
};

use tracing::debug;

use crate::error::{self, Error};

/// Result of a directory mirror operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MirrorResult {
    /// Destination directory that now mirrors the source.
    pub destination: PathBuf,
    /// Number of regular files copied.
    pub files:       usize
}

/// Replaces `destination` with a recursive copy of `source`.
///
/// Any existing destination is removed first, so files that no longer exist
/// in the source do not survive. Parent directories are created as needed.
///
/// # Arguments
///
/// * `source` - Directory holding the freshly generated artifacts
/// * `destination` - Directory to replace
///
/// # Returns
///
/// [`MirrorResult`] containing the destination path and copied file count.
///
/// # Errors
///
/// Returns [`Error::Validation`] when source is missing or not a directory
/// and [`Error::Io`] when removing or copying fails.
///
/// # Example
///
/// ```no_run
/// use langstat::mirror_directory;
///
/// # fn example() -> Result<(), langstat::Error> {
/// let result = mirror_directory(".langstat/output".as_ref(), "repo/stats".as_ref())?;
/// println!("Copied {} files to {}", result.files, result.destination.display());
/// # Ok(())
/// # }
/// ```
pub fn mirror_directory(source: &Path, destination: &Path) -> Result<MirrorResult, Error> {
    if !source.exists() {
        return Err(Error::validation(format!(
            "source directory not found: {}",
            source.display()
        )));
    }

    if !source.is_dir() {
        return Err(Error::validation(format!(
            "source is not a directory: {}",
            source.display()
        )));
    }

    if destination.exists() {
        debug!("Removing stale artifacts at {}", destination.display());
        fs::remove_dir_all(destination).map_err(|e| error::io_error(destination, e))?;
    }

    let files = copy_recursive(source, destination)?;

    Ok(MirrorResult {
        destination: destination.to_path_buf(),
        files
    })
}

fn copy_recursive(source: &Path, destination: &Path) -> Result<usize, Error> {
    fs::create_dir_all(destination).map_err(|e| error::io_error(destination, e))?;

    let mut copied = 0;
    let entries = fs::read_dir(source).map_err(|e| error::io_error(source, e))?;
    for entry in entries {
        let entry = entry.map_err(|e| error::io_error(source, e))?;
        let path = entry.path();
        let target = destination.join(entry.file_name());
        let file_type = entry.file_type().map_err(|e| error::io_error(&path, e))?;

        if file_type.is_dir() {
            copied += copy_recursive(&path, &target)?;
        } else {
            fs::copy(&path, &target).map_err(|e| error::io_error(&target, e))?;
            copied += 1;
        }
    }

    Ok(copied)
}
