//! Archival of the current file.
//!
//! Archiving closes the outgoing handle and renames the file at the stable
//! path to `{path}.{YYYYMMDDHHMMSS}`. Archives are never reopened.

use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, TimeZone};

use crate::error::{Result, RotationError};

/// chrono format for the archive suffix: 14 digits, no separators.
pub const ARCHIVE_TIMESTAMP_FORMAT: &str = "%Y%m%d%H%M%S";

/// Returns the archive path for a rotation triggered at `at`.
///
/// The timestamp is rendered on `at`'s own clock; the writer passes local
/// time.
///
/// # Examples
///
/// ```rust
/// use chrono::{TimeZone, Utc};
/// use rotalog::archive::archive_path;
/// use std::path::Path;
///
/// let at = Utc.with_ymd_and_hms(2024, 1, 1, 12, 1, 0).unwrap();
/// assert_eq!(
///     archive_path(Path::new("logs/day.log"), &at),
///     Path::new("logs/day.log.20240101120100"),
/// );
/// ```
pub fn archive_path<Tz>(path: &Path, at: &DateTime<Tz>) -> PathBuf
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    let mut name = OsString::from(path.as_os_str());
    name.push(".");
    name.push(at.format(ARCHIVE_TIMESTAMP_FORMAT).to_string());
    PathBuf::from(name)
}

/// What happened to the current file during archival.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Archived {
    /// The file was renamed to the contained path.
    Renamed(PathBuf),
    /// There was no file at the stable path, so nothing was renamed.
    Missing,
}

/// Flushes and closes `file`.
///
/// The handle is consumed even when the flush fails, so the caller never
/// ends up holding a half-closed file.
///
/// # Errors
///
/// Returns [`RotationError::Close`] if the final flush fails.
pub fn close(path: &Path, mut file: File) -> Result<()> {
    file.flush().map_err(|source| RotationError::Close {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(())
}

/// Renames the file at `path` to its archive name for time `at`.
///
/// An existing archive is never overwritten. A missing source file is
/// reported as [`Archived::Missing`] rather than an error: it means there
/// is nothing left to archive.
///
/// # Errors
///
/// - [`RotationError::ArchiveExists`] if the archive name is already taken
/// - [`RotationError::Archive`] if the rename fails
pub fn rename<Tz>(path: &Path, at: &DateTime<Tz>) -> Result<Archived>
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    let target = archive_path(path, at);

    match fs::symlink_metadata(&target) {
        Ok(_) => return Err(RotationError::ArchiveExists { path: target }.into()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(source) => {
            return Err(RotationError::Archive {
                from: path.to_path_buf(),
                to: target,
                source,
            }
            .into());
        }
    }

    match fs::rename(path, &target) {
        Ok(()) => Ok(Archived::Renamed(target)),
        Err(e) if e.kind() == io::ErrorKind::NotFound && !path.exists() => Ok(Archived::Missing),
        Err(source) => Err(RotationError::Archive {
            from: path.to_path_buf(),
            to: target,
            source,
        }
        .into()),
    }
}
