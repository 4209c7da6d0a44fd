//! Sleep periods - inactivity gaps accepted as sleep.

use chrono::{DateTime, FixedOffset, NaiveDate, TimeDelta};
use serde::{Deserialize, Serialize};

use crate::event::ActivityEvent;
use crate::types::ActivitySource;

const SECONDS_PER_HOUR: f64 = 3600.0;

/// Converts a signed duration into fractional hours without rounding.
#[allow(clippy::cast_precision_loss)]
pub fn delta_hours(delta: TimeDelta) -> f64 {
    (delta.num_seconds() as f64 + f64::from(delta.subsec_nanos()) / 1e9) / SECONDS_PER_HOUR
}

/// An inferred sleep interval bounded by two adjacent activity events.
///
/// Instants are expressed in the analysis offset, so `date` and the
/// hour-of-day of either end read as local wall-clock values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SleepPeriod {
    /// Last activity before the gap.
    pub sleep_start: DateTime<FixedOffset>,

    /// First activity after the gap.
    pub sleep_end: DateTime<FixedOffset>,

    /// Length of the gap in fractional hours.
    pub duration_hours: f64,

    /// Calendar date of `sleep_start`.
    pub date: NaiveDate,

    pub start_source: ActivitySource,

    pub end_source: ActivitySource,
}

impl SleepPeriod {
    /// Builds the period spanning the gap between two events.
    ///
    /// Callers guarantee `start` precedes `end`.
    pub fn between(start: &ActivityEvent, end: &ActivityEvent, offset: &FixedOffset) -> Self {
        let sleep_start = start.timestamp.with_timezone(offset);
        let sleep_end = end.timestamp.with_timezone(offset);
        Self {
            sleep_start,
            sleep_end,
            duration_hours: delta_hours(end.timestamp - start.timestamp),
            date: sleep_start.date_naive(),
            start_source: start.source,
            end_source: end.source,
        }
    }
}
