//! Summary statistics over inferred sleep periods.

use chrono::{NaiveDate, Timelike};
use serde::Serialize;

use crate::period::SleepPeriod;

/// Aggregate view of a set of sleep periods.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SleepStatistics {
    /// Mean duration in hours.
    pub average_hours: f64,

    /// Sample standard deviation (n - 1) of duration in hours.
    /// `None` when fewer than two periods exist.
    pub std_dev_hours: Option<f64>,

    /// Median duration in hours.
    pub median_hours: f64,

    /// Number of periods. Two periods on the same date count twice.
    pub night_count: usize,

    pub date_range_start: NaiveDate,

    pub date_range_end: NaiveDate,

    /// Most frequent hour-of-day (0-23) at which sleep started.
    pub most_common_sleep_hour: u32,

    /// Most frequent hour-of-day (0-23) at which sleep ended.
    pub most_common_wake_hour: u32,
}

/// Result of summarizing sleep periods.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SleepSummary {
    /// No periods were inferred, so no statistic is defined.
    NoData,
    Summary(SleepStatistics),
}

impl SleepSummary {
    pub const fn statistics(&self) -> Option<&SleepStatistics> {
        match self {
            Self::NoData => None,
            Self::Summary(stats) => Some(stats),
        }
    }
}

/// Reduces a set of sleep periods to summary statistics.
///
/// Hours of day are truncated, not rounded, and read in each period's own
/// offset. Ties for the most common hour go to the smallest hour.
#[allow(clippy::cast_precision_loss)]
pub fn summarize(periods: &[SleepPeriod]) -> SleepSummary {
    let Some(first) = periods.first() else {
        return SleepSummary::NoData;
    };

    let n = periods.len() as f64;
    let average_hours = periods.iter().map(|p| p.duration_hours).sum::<f64>() / n;

    let std_dev_hours = (periods.len() >= 2).then(|| {
        let sum_sq: f64 = periods
            .iter()
            .map(|p| (p.duration_hours - average_hours).powi(2))
            .sum();
        (sum_sq / (n - 1.0)).sqrt()
    });

    let mut durations: Vec<f64> = periods.iter().map(|p| p.duration_hours).collect();
    durations.sort_by(f64::total_cmp);
    let mid = durations.len() / 2;
    let median_hours = if durations.len() % 2 == 0 {
        (durations[mid - 1] + durations[mid]) / 2.0
    } else {
        durations[mid]
    };

    let (date_range_start, date_range_end) = periods
        .iter()
        .fold((first.date, first.date), |(lo, hi), p| {
            (lo.min(p.date), hi.max(p.date))
        });

    SleepSummary::Summary(SleepStatistics {
        average_hours,
        std_dev_hours,
        median_hours,
        night_count: periods.len(),
        date_range_start,
        date_range_end,
        most_common_sleep_hour: hour_mode(periods.iter().map(|p| p.sleep_start.hour())),
        most_common_wake_hour: hour_mode(periods.iter().map(|p| p.sleep_end.hour())),
    })
}

/// Most frequent hour in `hours`, smallest hour on ties.
fn hour_mode(hours: impl Iterator<Item = u32>) -> u32 {
    let mut counts = [0usize; 24];
    for hour in hours {
        counts[hour as usize % 24] += 1;
    }

    let mut best = 0;
    for (hour, &count) in counts.iter().enumerate() {
        if count > counts[best] {
            best = hour;
        }
    }
    #[allow(clippy::cast_possible_truncation)]
    let best = best as u32;
    best
}
