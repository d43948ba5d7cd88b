//! Time constants for the maintenance windows.
//!
//! All timestamps in the data model are unix seconds. The engine never reads
//! the wall clock; "now" is always supplied by the caller so that every
//! maintenance pass is deterministic and replayable.

/// A point in time, in seconds since the unix epoch.
pub type UnixTime = u64;

/// Seconds per day.
pub const DAY_SECS: u64 = 24 * 60 * 60;

/// Days in the short reliability window.
pub const WEEK_DAYS: u64 = 7;

/// Days in the medium reliability window.
pub const MONTH_DAYS: u64 = 28;

/// Days in the trailing activity/reliability year.
pub const YEAR_DAYS: u64 = 365;

/// Seconds in the trailing activity/reliability year.
pub const YEAR_SECS: u64 = YEAR_DAYS * DAY_SECS;
