//! Rotation intervals and calendar-aligned boundary computation.
//!
//! A boundary is always derived from the wall-clock time at which the
//! rotation decision is made, never from the previous boundary plus a fixed
//! step. A writer that sees no traffic for an hour therefore rotates onto
//! the *current* hour's boundary on its next write instead of catching up
//! one stale boundary at a time.

use std::fmt;

use chrono::{
    DateTime, LocalResult, NaiveDateTime, NaiveTime, Offset, TimeDelta, TimeZone, Timelike,
};
use serde::{Deserialize, Serialize};

const SECONDS_PER_MINUTE: u32 = 60;
const SECONDS_PER_HOUR: u32 = 60 * SECONDS_PER_MINUTE;
const SECONDS_PER_DAY: u32 = 24 * SECONDS_PER_HOUR;

/// How often the current file is archived and replaced.
///
/// Boundaries are aligned to the calendar unit in the time zone of the
/// timestamp passed to [`RotateInterval::next_after`]; the writer uses the
/// local zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum RotateInterval {
    /// Rotate at the start of every second.
    #[serde(rename = "second")]
    PerSecond,

    /// Rotate at the start of every minute.
    #[serde(rename = "minute")]
    PerMinute,

    /// Rotate at the start of every hour.
    #[serde(rename = "hour")]
    PerHour,

    /// Rotate at local midnight.
    #[default]
    #[serde(rename = "day")]
    PerDay,
}

impl RotateInterval {
    /// Length of one interval unit in seconds.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use rotalog::RotateInterval;
    ///
    /// assert_eq!(RotateInterval::PerMinute.as_secs(), 60);
    /// assert_eq!(RotateInterval::PerDay.as_secs(), 86_400);
    /// ```
    pub const fn as_secs(self) -> u32 {
        match self {
            Self::PerSecond => 1,
            Self::PerMinute => SECONDS_PER_MINUTE,
            Self::PerHour => SECONDS_PER_HOUR,
            Self::PerDay => SECONDS_PER_DAY,
        }
    }

    /// Returns the first boundary strictly after `now`.
    ///
    /// The boundary is the start of the next second, minute, hour or day on
    /// the local clock of `now`'s time zone. Around daylight-saving
    /// transitions:
    ///
    /// - if the local clock is set back, the transition instant is itself a
    ///   boundary when the repeated local time is aligned, and a boundary
    ///   whose local time occurs twice resolves to the earliest occurrence
    ///   after `now`;
    /// - if the boundary's local time is skipped, the transition instant
    ///   itself is returned.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use chrono::{TimeZone, Utc};
    /// use rotalog::RotateInterval;
    ///
    /// let now = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 30).unwrap();
    /// let next = RotateInterval::PerMinute.next_after(&now);
    /// assert_eq!(next, Utc.with_ymd_and_hms(2024, 1, 1, 12, 1, 0).unwrap());
    /// ```
    pub fn next_after<Tz: TimeZone>(self, now: &DateTime<Tz>) -> DateTime<Tz> {
        let tz = now.timezone();
        let candidate = self.next_local(now.naive_local());

        // The instant the local clock would reach `candidate` if the offset
        // in force at `now` did not change. Always later than `now`.
        let offset = TimeDelta::seconds(i64::from(now.offset().fix().local_minus_utc()));
        let unshifted = tz.from_utc_datetime(&(candidate - offset));

        let mapped = match tz.from_local_datetime(&candidate) {
            LocalResult::Single(t) => t,
            LocalResult::Ambiguous(earliest, latest) => {
                if earliest > *now {
                    earliest
                } else {
                    latest
                }
            }
            // Skipped by a forward transition: `unshifted` is the transition
            // instant.
            LocalResult::None => return unshifted,
        };

        // A backward transition before `candidate` can make the local clock
        // hit an aligned time earlier than `mapped`.
        if unshifted < mapped && self.is_aligned(&unshifted.naive_local()) {
            unshifted
        } else {
            mapped
        }
    }

    /// Whether `local` falls exactly on a boundary of this interval.
    fn is_aligned(self, local: &NaiveDateTime) -> bool {
        local.nanosecond() == 0 && local.num_seconds_from_midnight() % self.as_secs() == 0
    }

    /// Next boundary on the naive local clock.
    fn next_local(self, local: NaiveDateTime) -> NaiveDateTime {
        let unit = self.as_secs();
        let elapsed = local.num_seconds_from_midnight();
        let aligned = elapsed - elapsed % unit + unit;
        local.date().and_time(NaiveTime::MIN) + TimeDelta::seconds(i64::from(aligned))
    }
}

impl From<u64> for RotateInterval {
    /// Maps a unit length in seconds to an interval.
    ///
    /// Values other than 1, 60, 3600 and 86400 fall back to
    /// [`RotateInterval::PerDay`].
    fn from(secs: u64) -> Self {
        match secs {
            1 => Self::PerSecond,
            60 => Self::PerMinute,
            3600 => Self::PerHour,
            _ => Self::PerDay,
        }
    }
}

impl fmt::Display for RotateInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::PerSecond => "second",
            Self::PerMinute => "minute",
            Self::PerHour => "hour",
            Self::PerDay => "day",
        };
        f.write_str(name)
    }
}
