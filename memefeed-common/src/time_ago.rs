//! "x minutes ago" style rendering of timestamps.
//!
//! Units are calendar-naive: a month is 30 days and a year is 365 days.

use crate::model::Timestamp;
use std::fmt::{Display, Formatter};
use time::Duration;

pub const SECONDS_PER_MINUTE: u64 = 60;
pub const SECONDS_PER_HOUR: u64 = 60 * SECONDS_PER_MINUTE;
pub const SECONDS_PER_DAY: u64 = 24 * SECONDS_PER_HOUR;
pub const SECONDS_PER_MONTH: u64 = 30 * SECONDS_PER_DAY;
pub const SECONDS_PER_YEAR: u64 = 365 * SECONDS_PER_DAY;

/// Elapsed time expressed in its coarsest applicable unit.
///
/// Variants are declared from finest to coarsest, so the derived ordering
/// compares coarseness first and magnitude second.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Hash)]
pub enum RelativeTime {
    JustNow,
    Minutes(u64),
    Hours(u64),
    Days(u64),
    Months(u64),
    Years(u64),
}

impl RelativeTime {
    /// Non-positive durations, i.e. timestamps in the future, are "just now".
    #[must_use]
    pub fn from_elapsed(elapsed: Duration) -> Self {
        match u64::try_from(elapsed.whole_seconds()) {
            Ok(seconds) => Self::from_elapsed_seconds(seconds),
            Err(_) => Self::JustNow,
        }
    }

    #[must_use]
    pub fn from_elapsed_seconds(seconds: u64) -> Self {
        if seconds >= SECONDS_PER_YEAR {
            Self::Years(seconds / SECONDS_PER_YEAR)
        } else if seconds >= SECONDS_PER_MONTH {
            Self::Months(seconds / SECONDS_PER_MONTH)
        } else if seconds >= SECONDS_PER_DAY {
            Self::Days(seconds / SECONDS_PER_DAY)
        } else if seconds >= SECONDS_PER_HOUR {
            Self::Hours(seconds / SECONDS_PER_HOUR)
        } else if seconds >= SECONDS_PER_MINUTE {
            Self::Minutes(seconds / SECONDS_PER_MINUTE)
        } else {
            Self::JustNow
        }
    }

    #[must_use]
    pub fn between(then: Timestamp, now: Timestamp) -> Self {
        Self::from_elapsed(then.until(now))
    }
}

impl Display for RelativeTime {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            RelativeTime::JustNow => f.write_str("just now"),
            RelativeTime::Minutes(n) => write!(f, "{n}m ago"),
            RelativeTime::Hours(n) => write!(f, "{n}h ago"),
            RelativeTime::Days(n) => write!(f, "{n}d ago"),
            RelativeTime::Months(n) => write!(f, "{n}mo ago"),
            RelativeTime::Years(n) => write!(f, "{n}y ago"),
        }
    }
}

#[must_use]
pub fn format_relative_time(now: Timestamp, then: Timestamp) -> String {
    RelativeTime::between(then, now).to_string()
}
