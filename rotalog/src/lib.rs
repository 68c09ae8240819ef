//! # rotalog
//!
//! Append-only file writer that rotates on calendar-aligned time boundaries.
//!
//! rotalog is an output sink for log-style data. It keeps writing to one
//! stable path and, once a second, minute, hour or day boundary has passed,
//! archives that file under a timestamped name and starts a fresh one.
//! Formatting, retention and fan-out are left to the surrounding pipeline.
//!
//! ## Key Properties
//!
//! - Lazy rotation: checked on every write, no background threads or timers
//! - Boundaries aligned to the local calendar, recomputed from "now" on
//!   each rotation so idle periods never cause drift
//! - One lock serializes the rotation check and the append
//! - Exactly one open handle, owned by the writer
//! - Errors are returned to the caller, never swallowed or retried
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use rotalog::{RotateInterval, RotatingWriter};
//! use std::io::Write;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut log = RotatingWriter::open("logs/day.log", RotateInterval::PerMinute)?;
//!
//! // Appends to logs/day.log; after the next minute boundary the file is
//! // moved to logs/day.log.YYYYMMDDHHMMSS and a new one is started.
//! writeln!(log, "service started")?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! - [`RotatingWriter`] - The sink; owns the file handle and the schedule
//! - [`RotateInterval`] - Rotation granularity and boundary computation
//! - [`WriterConfig`] - Serde-friendly construction parameters
//! - [`StartupPolicy`] - Handling of a file left behind by a previous run
//!
//! ## Modules
//!
//! - [`writer`] - Rotation check, append, lifecycle
//! - [`interval`] - Calendar-aligned boundary computation
//! - [`archive`] - Archive naming and renaming
//! - [`config`] - Writer configuration and validation
//! - [`clock`] - Wall-clock abstraction
//! - [`error`] - Error types

pub mod archive;
pub mod clock;
pub mod config;
pub mod error;
pub mod interval;
pub mod writer;

// Re-export primary API types at crate root for convenience.
pub use clock::{Clock, SystemClock};
pub use config::{StartupPolicy, WriterConfig};
pub use error::{ConfigError, Result, RotalogError, RotationError, SetupError, WriteError};
pub use interval::RotateInterval;
pub use writer::RotatingWriter;
