//! Writer configuration.
//!
//! A [`WriterConfig`] carries everything needed to build a
//! [`crate::RotatingWriter`]. It can be built in code or deserialized, for
//! example from the logging section of a host application's JSON config:
//!
//! ```json
//! { "path": "logs/day.log", "interval": "minute", "startup": "catch_up" }
//! ```

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Result};
use crate::interval::RotateInterval;

/// Default permission bits for the current file.
pub const DEFAULT_FILE_MODE: u32 = 0o664;

/// Default permission bits for created parent directories.
pub const DEFAULT_DIR_MODE: u32 = 0o775;

/// Highest value accepted for a permission mode.
const MAX_MODE: u32 = 0o7777;

/// What to do with a file already present at the target path when the
/// writer is constructed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StartupPolicy {
    /// Do not inspect the existing file. The first write appends to it, and
    /// it is archived at the first boundary after process start.
    #[default]
    Lazy,

    /// Inspect the existing file's modification time. If the boundary that
    /// followed its last write has already passed, archive it immediately
    /// under its modification time; otherwise rotate at that boundary.
    CatchUp,
}

/// Configuration for a [`crate::RotatingWriter`].
///
/// # Example
///
/// ```rust
/// use rotalog::{RotateInterval, StartupPolicy, WriterConfig};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let config = WriterConfig::new("logs/day.log", RotateInterval::PerHour)
///     .with_startup(StartupPolicy::CatchUp)
///     .with_file_mode(0o640);
/// config.validate()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WriterConfig {
    /// Stable path of the current file.
    pub path: PathBuf,

    /// Rotation granularity.
    #[serde(default)]
    pub interval: RotateInterval,

    /// Handling of a file left over from a previous run.
    #[serde(default)]
    pub startup: StartupPolicy,

    /// Permission bits for the current file (Unix only).
    #[serde(default = "default_file_mode")]
    pub file_mode: u32,

    /// Permission bits for created parent directories (Unix only).
    #[serde(default = "default_dir_mode")]
    pub dir_mode: u32,
}

fn default_file_mode() -> u32 {
    DEFAULT_FILE_MODE
}

fn default_dir_mode() -> u32 {
    DEFAULT_DIR_MODE
}

impl WriterConfig {
    /// Creates a configuration with default startup policy and modes.
    pub fn new(path: impl Into<PathBuf>, interval: RotateInterval) -> Self {
        Self {
            path: path.into(),
            interval,
            startup: StartupPolicy::default(),
            file_mode: DEFAULT_FILE_MODE,
            dir_mode: DEFAULT_DIR_MODE,
        }
    }

    /// Sets the startup policy.
    #[must_use]
    pub fn with_startup(mut self, startup: StartupPolicy) -> Self {
        self.startup = startup;
        self
    }

    /// Sets the permission bits for the current file.
    #[must_use]
    pub fn with_file_mode(mut self, mode: u32) -> Self {
        self.file_mode = mode;
        self
    }

    /// Sets the permission bits for created directories.
    #[must_use]
    pub fn with_dir_mode(mut self, mode: u32) -> Self {
        self.dir_mode = mode;
        self
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if:
    /// - the path is empty or does not end in a file name
    /// - either mode has bits outside `0o7777`
    pub fn validate(&self) -> Result<()> {
        if self.path.as_os_str().is_empty() {
            return Err(ConfigError::EmptyPath.into());
        }

        if self.path.file_name().is_none() {
            return Err(ConfigError::NoFileName {
                path: self.path.clone(),
            }
            .into());
        }

        for mode in [self.file_mode, self.dir_mode] {
            if mode > MAX_MODE {
                return Err(ConfigError::InvalidMode { mode }.into());
            }
        }

        Ok(())
    }
}
