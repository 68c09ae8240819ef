//! Error types for the rotating file writer.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// The main error type for all rotalog operations.
///
/// Each variant wraps the error enum for one phase of the writer's life:
/// construction, rotation, the append itself, or configuration validation.
#[derive(Error, Debug)]
pub enum RotalogError {
    /// Error preparing the writer at construction time.
    #[error("setup error: {0}")]
    Setup(#[from] SetupError),

    /// Error archiving the current file or opening its replacement.
    #[error("rotation error: {0}")]
    Rotation(#[from] RotationError),

    /// Error appending to, flushing or syncing the current file.
    #[error("write error: {0}")]
    Write(#[from] WriteError),

    /// Error validating a writer configuration.
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
}

/// Errors that can occur while constructing a writer.
#[derive(Error, Debug)]
pub enum SetupError {
    /// The parent directory of the target file could not be created.
    #[error("failed to create directory '{}': {source}", path.display())]
    CreateDir {
        /// The directory that could not be created.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// The existing file could not be inspected for a catch-up rotation.
    #[error("failed to inspect '{}': {source}", path.display())]
    Inspect {
        /// The file that could not be inspected.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: io::Error,
    },
}

/// Errors that can occur while rotating the current file.
#[derive(Error, Debug)]
pub enum RotationError {
    /// Renaming the current file to its archive name failed.
    #[error("failed to archive '{}' as '{}': {source}", from.display(), to.display())]
    Archive {
        /// The current file path.
        from: PathBuf,
        /// The archive path.
        to: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// An archive with the computed name already exists.
    #[error("archive '{}' already exists", path.display())]
    ArchiveExists {
        /// The archive path that is already taken.
        path: PathBuf,
    },

    /// The fresh current file could not be opened.
    #[error("failed to open '{}': {source}", path.display())]
    Open {
        /// The current file path.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// Flushing the outgoing file before archival failed.
    #[error("failed to close '{}': {source}", path.display())]
    Close {
        /// The current file path.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: io::Error,
    },
}

/// Errors that can occur on the append path.
#[derive(Error, Debug)]
pub enum WriteError {
    /// Appending the payload failed.
    #[error("failed to append to '{}': {source}", path.display())]
    Append {
        /// The current file path.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// Flushing the current file failed.
    #[error("failed to flush '{}': {source}", path.display())]
    Flush {
        /// The current file path.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// Syncing the current file to disk failed.
    #[error("failed to sync '{}': {source}", path.display())]
    Sync {
        /// The current file path.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: io::Error,
    },
}

/// Errors that can occur when validating a [`crate::config::WriterConfig`].
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The target path is empty.
    #[error("target path cannot be empty")]
    EmptyPath,

    /// The target path has no file name component (e.g. ends in `..`).
    #[error("target path '{}' does not name a file", path.display())]
    NoFileName {
        /// The offending path.
        path: PathBuf,
    },

    /// A permission mode has bits outside `0o7777`.
    #[error("invalid permission mode {mode:#o}")]
    InvalidMode {
        /// The offending mode.
        mode: u32,
    },
}

impl RotalogError {
    /// Returns the underlying I/O error, if this error was caused by one.
    pub fn io_source(&self) -> Option<&io::Error> {
        match self {
            Self::Setup(SetupError::CreateDir { source, .. } | SetupError::Inspect { source, .. })
            | Self::Rotation(
                RotationError::Archive { source, .. }
                | RotationError::Open { source, .. }
                | RotationError::Close { source, .. },
            )
            | Self::Write(
                WriteError::Append { source, .. }
                | WriteError::Flush { source, .. }
                | WriteError::Sync { source, .. },
            ) => Some(source),
            Self::Rotation(RotationError::ArchiveExists { .. }) | Self::Config(_) => None,
        }
    }
}

impl From<RotalogError> for io::Error {
    fn from(err: RotalogError) -> Self {
        let kind = match &err {
            RotalogError::Rotation(RotationError::ArchiveExists { .. }) => {
                io::ErrorKind::AlreadyExists
            }
            RotalogError::Config(_) => io::ErrorKind::InvalidInput,
            other => other
                .io_source()
                .map_or(io::ErrorKind::Other, io::Error::kind),
        };
        io::Error::new(kind, err)
    }
}

/// Type alias for `Result<T, RotalogError>`.
pub type Result<T> = std::result::Result<T, RotalogError>;
