//! Half-open time windows and 15-minute slicing.
//!
//! Every overlap test in the engine goes through [`TimeWindow::overlaps`],
//! so generic capacity, laser rooms and event rooms all share one rule:
//! `a.start < b.end && a.end > b.start`. Touching windows do not overlap.

use chrono::{DurationRound, TimeDelta};
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::Timestamp;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Length of one capacity slice, in minutes.
pub const SLICE_MINUTES: i64 = 15;

/// Length of one capacity slice.
pub fn slice_length() -> TimeDelta {
    TimeDelta::minutes(SLICE_MINUTES)
}

/// Round `ts` down to the start of its 15-minute slice.
pub fn slice_floor(ts: Timestamp) -> Timestamp {
    ts.duration_trunc(slice_length()).unwrap_or(ts)
}

// ---------------------------------------------------------------------------
// TimeWindow
// ---------------------------------------------------------------------------

/// A half-open interval `[start, end)` with `end > start`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "RawWindow")]
pub struct TimeWindow {
    start: Timestamp,
    end: Timestamp,
}

#[derive(Deserialize)]
struct RawWindow {
    start: Timestamp,
    end: Timestamp,
}

impl TryFrom<RawWindow> for TimeWindow {
    type Error = CoreError;

    fn try_from(raw: RawWindow) -> Result<Self, Self::Error> {
        TimeWindow::new(raw.start, raw.end)
    }
}

impl TimeWindow {
    /// Build a window, rejecting empty or inverted intervals.
    pub fn new(start: Timestamp, end: Timestamp) -> Result<Self, CoreError> {
        if end <= start {
            return Err(CoreError::Validation(format!(
                "Window end ({end}) must be after start ({start})"
            )));
        }
        Ok(Self { start, end })
    }

    /// Build a window from a start and a positive length in minutes.
    pub fn starting_at(start: Timestamp, minutes: i64) -> Result<Self, CoreError> {
        Self::new(start, start + TimeDelta::minutes(minutes))
    }

    pub fn start(&self) -> Timestamp {
        self.start
    }

    pub fn end(&self) -> Timestamp {
        self.end
    }

    pub fn duration(&self) -> TimeDelta {
        self.end - self.start
    }

    /// Half-open overlap test.
    pub fn overlaps(&self, other: &TimeWindow) -> bool {
        self.start < other.end && self.end > other.start
    }

    /// Whether `other` lies entirely inside this window.
    pub fn covers(&self, other: &TimeWindow) -> bool {
        self.start <= other.start && other.end <= self.end
    }

    pub fn contains(&self, ts: Timestamp) -> bool {
        self.start <= ts && ts < self.end
    }

    /// Smallest window containing both.
    pub fn hull(&self, other: &TimeWindow) -> TimeWindow {
        TimeWindow {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }

    /// Every quarter-hour-aligned slice this window touches, in order.
    pub fn slices(&self) -> Slices {
        Slices {
            next: slice_floor(self.start),
            end: self.end,
        }
    }
}

impl std::fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}-{}",
            self.start.format("%Y-%m-%d %H:%M"),
            self.end.format("%H:%M")
        )
    }
}

/// Iterator over the aligned 15-minute slices touched by a window.
#[derive(Debug, Clone)]
pub struct Slices {
    next: Timestamp,
    end: Timestamp,
}

impl Iterator for Slices {
    type Item = TimeWindow;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= self.end {
            return None;
        }
        let start = self.next;
        let end = start + slice_length();
        self.next = end;
        Some(TimeWindow { start, end })
    }
}
