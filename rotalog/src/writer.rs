//! The rotating writer.
//!
//! [`RotatingWriter`] owns the single open handle to the current file and
//! the schedule of the next rotation. Every write takes one lock, checks
//! whether the next boundary has passed, archives and reopens if it has,
//! then appends. There is no background thread: a boundary only takes
//! effect on the first write after it.
//!
//! # File Layout
//!
//! ```text
//! logs/
//! ├── day.log                    <- current file, always at the configured path
//! ├── day.log.20240101120100     <- archive, rotation triggered at 12:01:00
//! └── day.log.20240101120200
//! ```
//!
//! # Example Usage
//!
//! ```rust,no_run
//! use rotalog::{RotateInterval, RotatingWriter};
//! use std::io::Write;
//! use std::sync::Arc;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let writer = Arc::new(RotatingWriter::open("logs/day.log", RotateInterval::PerMinute)?);
//!
//! let handles: Vec<_> = (0..4)
//!     .map(|worker| {
//!         let writer = Arc::clone(&writer);
//!         std::thread::spawn(move || writeln!(&*writer, "worker {worker} started"))
//!     })
//!     .collect();
//! for handle in handles {
//!     handle.join().expect("worker panicked")?;
//! }
//! # Ok(())
//! # }
//! ```

use std::fs::{self, DirBuilder, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use parking_lot::Mutex;

use crate::archive::{self, Archived};
use crate::clock::{Clock, SystemClock};
use crate::config::{StartupPolicy, WriterConfig};
use crate::error::{Result, RotalogError, RotationError, SetupError, WriteError};
use crate::interval::RotateInterval;

/// An append-only file writer that rotates on calendar boundaries.
///
/// The file at [`RotatingWriter::path`] is always the current segment.
/// When a write arrives after the scheduled boundary, the current file is
/// closed, renamed to `{path}.{YYYYMMDDHHMMSS}` (local time of the
/// rotation) and a fresh file is opened at the same path before the
/// payload is appended.
///
/// # Thread Safety
///
/// All methods take `&self`. The rotation check and the append run as a
/// single critical section, so concurrent writers never interleave with a
/// rotation and every payload lands whole in exactly one file.
/// [`io::Write`] is implemented for `&RotatingWriter`, so an
/// `Arc<RotatingWriter>` can be shared between threads.
#[derive(Debug)]
pub struct RotatingWriter<C: Clock = SystemClock> {
    /// Stable path of the current file.
    path: PathBuf,
    /// Rotation granularity.
    interval: RotateInterval,
    /// Policy applied at construction.
    startup: StartupPolicy,
    /// Permission bits for newly created files.
    file_mode: u32,
    /// Source of "now" for rotation decisions.
    clock: C,
    /// Handle and schedule, guarded together.
    state: Mutex<State>,
}

/// Mutable part of the writer, only touched under the lock.
#[derive(Debug, Default)]
struct State {
    /// The open handle to the current file.
    file: Option<File>,
    /// Set when the previous handle was closed but its file could not be
    /// archived yet. Implies `file` is `None`.
    unarchived: bool,
    /// Writes after this instant must rotate first. `None` means a rotation
    /// check is due immediately.
    rotate_next: Option<DateTime<Local>>,
}

impl RotatingWriter<SystemClock> {
    /// Creates a writer for `path` with the default startup policy and
    /// permission modes.
    ///
    /// The parent directory is created if it does not exist. The file itself
    /// is opened on the first write.
    ///
    /// # Errors
    ///
    /// - [`crate::ConfigError`] if `path` does not name a file
    /// - [`SetupError::CreateDir`] if the parent directory cannot be created
    pub fn open<P: AsRef<Path>>(path: P, interval: RotateInterval) -> Result<Self> {
        Self::from_config(WriterConfig::new(path.as_ref(), interval))
    }

    /// Creates a writer from a configuration, using the system clock.
    ///
    /// # Errors
    ///
    /// See [`RotatingWriter::with_clock`].
    pub fn from_config(config: WriterConfig) -> Result<Self> {
        Self::with_clock(config, SystemClock)
    }
}

impl<C: Clock> RotatingWriter<C> {
    /// Creates a writer from a configuration and an explicit clock.
    ///
    /// With [`StartupPolicy::Lazy`] nothing beyond directory creation
    /// happens here. With [`StartupPolicy::CatchUp`] an existing file whose
    /// rotation boundary has already passed is archived immediately, named
    /// after its modification time.
    ///
    /// # Errors
    ///
    /// - [`crate::ConfigError`] if the configuration is invalid
    /// - [`SetupError::CreateDir`] if the parent directory cannot be created
    /// - [`SetupError::Inspect`] if the existing file cannot be inspected
    /// - [`RotationError`] if the catch-up archival fails
    pub fn with_clock(config: WriterConfig, clock: C) -> Result<Self> {
        config.validate()?;
        create_parent_dir(&config.path, config.dir_mode)?;

        let rotate_next = match config.startup {
            StartupPolicy::Lazy => None,
            StartupPolicy::CatchUp => catch_up(&config.path, config.interval, clock.now())?,
        };

        Ok(Self {
            path: config.path,
            interval: config.interval,
            startup: config.startup,
            file_mode: config.file_mode,
            clock,
            state: Mutex::new(State {
                rotate_next,
                ..State::default()
            }),
        })
    }

    /// Appends `buf` to the current file, rotating first if a boundary has
    /// passed.
    ///
    /// The whole payload is written before the lock is released. An empty
    /// payload still runs the rotation check.
    ///
    /// # Returns
    ///
    /// The number of bytes written, always `buf.len()` on success.
    ///
    /// # Errors
    ///
    /// - [`RotationError`] if a due rotation fails; nothing is written and
    ///   the next call retries the rotation
    /// - [`WriteError::Append`] if the append fails; the handle stays open
    pub fn write(&self, buf: &[u8]) -> Result<usize> {
        let mut state = self.state.lock();
        let now = self.clock.now();
        let (file, _) = state.prepare(self, now)?;

        file.write_all(buf).map_err(|source| WriteError::Append {
            path: self.path.clone(),
            source,
        })?;
        Ok(buf.len())
    }

    /// Runs the rotation check without writing.
    ///
    /// Returns the archive created by this call, if any. Calling it again
    /// before the next boundary neither renames nor reopens anything.
    ///
    /// # Errors
    ///
    /// Returns [`RotationError`] if a due rotation fails.
    pub fn rotate_if_due(&self) -> Result<Option<PathBuf>> {
        let mut state = self.state.lock();
        let now = self.clock.now();
        let (_, archived) = state.prepare(self, now)?;
        Ok(archived)
    }

    /// Flushes the current file, if one is open.
    ///
    /// # Errors
    ///
    /// Returns [`WriteError::Flush`] if the flush fails.
    pub fn flush(&self) -> Result<()> {
        if let Some(file) = self.state.lock().file.as_mut() {
            file.flush().map_err(|source| WriteError::Flush {
                path: self.path.clone(),
                source,
            })?;
        }
        Ok(())
    }

    /// Syncs data and metadata of the current file to disk.
    ///
    /// # Errors
    ///
    /// Returns [`WriteError::Sync`] if the sync fails.
    pub fn sync(&self) -> Result<()> {
        if let Some(file) = self.state.lock().file.as_ref() {
            file.sync_all().map_err(|source| WriteError::Sync {
                path: self.path.clone(),
                source,
            })?;
        }
        Ok(())
    }

    /// Flushes, syncs and closes the current file.
    ///
    /// The file stays at its path; nothing is archived. Dropping the writer
    /// closes the handle too, but without the sync and without reporting
    /// errors.
    ///
    /// # Errors
    ///
    /// Returns [`WriteError`] if the final flush or sync fails.
    pub fn close(self) -> Result<()> {
        let Some(mut file) = self.state.into_inner().file else {
            return Ok(());
        };
        file.flush().map_err(|source| WriteError::Flush {
            path: self.path.clone(),
            source,
        })?;
        file.sync_all().map_err(|source| WriteError::Sync {
            path: self.path,
            source,
        })?;
        Ok(())
    }

    /// Returns the stable path of the current file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the rotation interval.
    pub fn interval(&self) -> RotateInterval {
        self.interval
    }

    /// Returns the startup policy the writer was built with.
    pub fn startup_policy(&self) -> StartupPolicy {
        self.startup
    }

    /// Returns the scheduled rotation instant, or `None` if a rotation
    /// check is due on the next write.
    pub fn next_rotation(&self) -> Option<DateTime<Local>> {
        self.state.lock().rotate_next
    }

    /// Returns the path an archive created at `at` would get.
    pub fn archive_path_for(&self, at: &DateTime<Local>) -> PathBuf {
        archive::archive_path(&self.path, at)
    }

    /// Opens the current file in append mode.
    fn open_current(&self) -> Result<File> {
        let mut options = OpenOptions::new();
        options.create(true).append(true);

        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(self.file_mode);
        }
        #[cfg(not(unix))]
        let _ = self.file_mode;

        options.open(&self.path).map_err(|source| {
            RotationError::Open {
                path: self.path.clone(),
                source,
            }
            .into()
        })
    }
}

impl State {
    /// Brings the state up to date for a write at `now`.
    ///
    /// Archives the current file if the boundary has passed, then makes
    /// sure a handle is open. Returns the handle and the archive created,
    /// if any.
    fn prepare<C: Clock>(
        &mut self,
        writer: &RotatingWriter<C>,
        now: DateTime<Local>,
    ) -> Result<(&mut File, Option<PathBuf>)> {
        let mut archived = None;

        if self.rotate_next.is_none_or(|next| now > next) {
            archived = self.archive(&writer.path, now)?;
            let next = writer.interval.next_after(&now);
            tracing::debug!("next rotation of {} at {next}", writer.path.display());
            self.rotate_next = Some(next);
        }

        let file = match self.file.take() {
            Some(file) => file,
            None => {
                let file = writer.open_current()?;
                tracing::debug!("opened {}", writer.path.display());
                file
            }
        };

        Ok((self.file.insert(file), archived))
    }

    /// Closes the current handle and renames its file.
    ///
    /// On failure the file is left unarchived and `rotate_next` untouched,
    /// so the next call tries again.
    ///
    /// A rename that fails with `NotFound` because the file was removed from
    /// the path is not returned as an error: it is logged at `warn` and the
    /// rotation proceeds with nothing archived. Every other rename error is
    /// returned.
    fn archive(&mut self, path: &Path, now: DateTime<Local>) -> Result<Option<PathBuf>> {
        if let Some(file) = self.file.take() {
            self.unarchived = true;
            archive::close(path, file)?;
        }

        if !self.unarchived {
            return Ok(None);
        }

        let archived = archive::rename(path, &now)?;
        self.unarchived = false;

        match archived {
            Archived::Renamed(target) => {
                tracing::debug!("archived {} as {}", path.display(), target.display());
                Ok(Some(target))
            }
            Archived::Missing => {
                tracing::warn!(
                    "{} disappeared before it could be archived",
                    path.display()
                );
                Ok(None)
            }
        }
    }
}

impl<C: Clock> Write for RotatingWriter<C> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        RotatingWriter::write(self, buf).map_err(Into::into)
    }

    fn flush(&mut self) -> io::Result<()> {
        RotatingWriter::flush(self).map_err(Into::into)
    }
}

impl<C: Clock> Write for &RotatingWriter<C> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        RotatingWriter::write(*self, buf).map_err(Into::into)
    }

    fn flush(&mut self) -> io::Result<()> {
        RotatingWriter::flush(*self).map_err(Into::into)
    }
}

/// Creates the parent directory of `path` and any missing ancestors.
fn create_parent_dir(path: &Path, mode: u32) -> Result<()> {
    let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) else {
        return Ok(());
    };

    let mut builder = DirBuilder::new();
    builder.recursive(true);

    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        builder.mode(mode);
    }
    #[cfg(not(unix))]
    let _ = mode;

    builder.create(parent).map_err(|source| {
        SetupError::CreateDir {
            path: parent.to_path_buf(),
            source,
        }
        .into()
    })
}

/// Applies [`StartupPolicy::CatchUp`] to an existing file.
///
/// A stale file is archived under its modification time, or under `now` if
/// that name is already taken. Returns the boundary at which the existing file is due, or `None` if
/// there was no file or it was archived here.
fn catch_up(
    path: &Path,
    interval: RotateInterval,
    now: DateTime<Local>,
) -> Result<Option<DateTime<Local>>> {
    let inspect_err = |source| SetupError::Inspect {
        path: path.to_path_buf(),
        source,
    };

    let metadata = match fs::metadata(path) {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(inspect_err(e).into()),
    };
    let modified: DateTime<Local> = metadata.modified().map_err(inspect_err)?.into();

    let due = interval.next_after(&modified);
    if now <= due {
        return Ok(Some(due));
    }

    // The last write of the previous run may share its second with the
    // archive that write created.
    let archived = match archive::rename(path, &modified) {
        Err(RotalogError::Rotation(RotationError::ArchiveExists { path: taken })) => {
            tracing::debug!(
                "{} already exists, archiving under startup time",
                taken.display()
            );
            archive::rename(path, &now)?
        }
        other => other?,
    };
    if let Archived::Renamed(target) = archived {
        tracing::info!(
            "archived stale {} as {} on startup",
            path.display(),
            target.display()
        );
    }
    Ok(None)
}
