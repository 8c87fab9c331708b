//! Planning clock and time windows.
//!
//! All scheduling times are integer minute offsets from a common planning
//! origin (t=0). The engine never looks at wall-clock time; rendering and
//! data-entry collaborators use [`TimeOrigin`] to convert between offsets
//! and timestamps.

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

/// Hour of day that a nominal planning day starts at.
pub const NOMINAL_START_HOUR: i64 = 8;

/// A time interval [start, end) in minutes.
///
/// Half-open: includes start, excludes end. A zero-length window is empty
/// and overlaps nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    /// Interval start (inclusive).
    pub start: i64,
    /// Interval end (exclusive).
    pub end: i64,
}

impl TimeWindow {
    /// Creates a new time window.
    pub fn new(start: i64, end: i64) -> Self {
        Self { start, end }
    }

    /// Length of this window (minutes).
    #[inline]
    pub fn duration(&self) -> i64 {
        self.end - self.start
    }

    /// Whether the window contains no instant.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }

    /// Whether a time falls within this window.
    #[inline]
    pub fn contains(&self, time: i64) -> bool {
        time >= self.start && time < self.end
    }

    /// Whether two windows share at least one instant.
    ///
    /// Touching endpoints do not overlap.
    pub fn overlaps(&self, other: &Self) -> bool {
        self.start.max(other.start) < self.end.min(other.end)
    }
}

/// Maps minute offsets to wall-clock timestamps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeOrigin {
    /// The timestamp that corresponds to offset 0.
    pub origin: NaiveDateTime,
}

impl TimeOrigin {
    /// Creates an origin at an explicit timestamp.
    pub fn new(origin: NaiveDateTime) -> Self {
        Self { origin }
    }

    /// Creates an origin at the nominal start of the given day (08:00).
    pub fn start_of_day(date: NaiveDate) -> Self {
        let midnight = date.and_time(NaiveTime::default());
        Self::new(midnight + Duration::hours(NOMINAL_START_HOUR))
    }

    /// Timestamp for a minute offset.
    pub fn to_datetime(&self, offset_minutes: i64) -> NaiveDateTime {
        self.origin + Duration::minutes(offset_minutes)
    }

    /// Minute offset of a timestamp, rounded down to whole minutes.
    ///
    /// Timestamps before the origin give negative offsets.
    pub fn to_offset(&self, timestamp: NaiveDateTime) -> i64 {
        (timestamp - self.origin).num_seconds().div_euclid(60)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 4).unwrap()
    }

    #[test]
    fn test_window_basics() {
        let w = TimeWindow::new(10, 40);
        assert_eq!(w.duration(), 30);
        assert!(w.contains(10));
        assert!(!w.contains(40));
        assert!(!w.is_empty());
    }

    #[test]
    fn test_window_overlap_half_open() {
        let a = TimeWindow::new(0, 45);
        assert!(a.overlaps(&TimeWindow::new(30, 75)));
        assert!(!a.overlaps(&TimeWindow::new(45, 90)));
        assert!(!TimeWindow::new(45, 90).overlaps(&a));
    }

    #[test]
    fn test_zero_length_window_overlaps_nothing() {
        let point = TimeWindow::new(20, 20);
        assert!(point.is_empty());
        assert!(!point.overlaps(&TimeWindow::new(0, 45)));
        assert!(!TimeWindow::new(0, 45).overlaps(&point));
    }

    #[test]
    fn test_start_of_day() {
        let origin = TimeOrigin::start_of_day(day());
        assert_eq!(origin.origin, day().and_hms_opt(8, 0, 0).unwrap());
    }

    #[test]
    fn test_offset_conversion() {
        let origin = TimeOrigin::start_of_day(day());
        let t = origin.to_datetime(195);
        assert_eq!(t, day().and_hms_opt(11, 15, 0).unwrap());
        assert_eq!(origin.to_offset(t), 195);

        // partial minutes round down
        let early = day().and_hms_opt(7, 59, 30).unwrap();
        assert_eq!(origin.to_offset(early), -1);
    }
}
