//! Sleep inference algorithm.
//!
//! Walks a merged [`Timeline`] and treats every silence between two adjacent
//! events as candidate sleep:
//! 1. Gaps shorter than the lower bound are ordinary breaks in activity
//! 2. Gaps longer than the upper bound are missing data (device off, travel)
//!    rather than one very long night

use chrono::{FixedOffset, Offset, Utc};
use serde::Serialize;
use thiserror::Error;

use crate::period::{SleepPeriod, delta_hours};
use crate::timeline::Timeline;

/// Default lower bound for a gap to count as sleep, in hours.
pub const DEFAULT_MIN_GAP_HOURS: f64 = 4.0;

/// Default upper bound for a gap to count as sleep, in hours.
pub const DEFAULT_MAX_GAP_HOURS: f64 = 14.0;

/// Invalid gap bounds.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum PolicyError {
    #[error("{bound} gap bound must be a finite, non-negative number of hours, got {value}")]
    InvalidBound { bound: &'static str, value: f64 },

    #[error("minimum gap ({min}h) is greater than maximum gap ({max}h)")]
    InvertedBounds { min: f64, max: f64 },
}

/// Which inactivity gaps are accepted as sleep.
///
/// The interval is closed: a gap exactly equal to either bound is accepted.
/// Without an upper bound every gap of at least `min_hours` is accepted.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GapPolicy {
    min_hours: f64,
    max_hours: Option<f64>,
}

impl Default for GapPolicy {
    fn default() -> Self {
        Self {
            min_hours: DEFAULT_MIN_GAP_HOURS,
            max_hours: Some(DEFAULT_MAX_GAP_HOURS),
        }
    }
}

impl GapPolicy {
    /// Lower-bound-only policy: any gap of at least `min_hours`.
    pub fn at_least(min_hours: f64) -> Result<Self, PolicyError> {
        Ok(Self {
            min_hours: check_bound("minimum", min_hours)?,
            max_hours: None,
        })
    }

    /// Closed-range policy: gaps within `[min_hours, max_hours]`.
    pub fn bounded(min_hours: f64, max_hours: f64) -> Result<Self, PolicyError> {
        let min = check_bound("minimum", min_hours)?;
        let max = check_bound("maximum", max_hours)?;
        if min > max {
            return Err(PolicyError::InvertedBounds { min, max });
        }
        Ok(Self {
            min_hours: min,
            max_hours: Some(max),
        })
    }

    /// Builds a policy from independently supplied bounds.
    ///
    /// - Neither bound: the default `[4, 14]` range
    /// - Lower bound only: lower-bound-only policy
    /// - Upper bound only: default lower bound with the given upper bound
    pub fn new(min_hours: Option<f64>, max_hours: Option<f64>) -> Result<Self, PolicyError> {
        match (min_hours, max_hours) {
            (None, None) => Ok(Self::default()),
            (Some(min), None) => Self::at_least(min),
            (None, Some(max)) => Self::bounded(DEFAULT_MIN_GAP_HOURS, max),
            (Some(min), Some(max)) => Self::bounded(min, max),
        }
    }

    pub const fn min_hours(&self) -> f64 {
        self.min_hours
    }

    pub const fn max_hours(&self) -> Option<f64> {
        self.max_hours
    }

    /// Returns true if a gap of `gap_hours` counts as sleep.
    pub fn accepts(&self, gap_hours: f64) -> bool {
        gap_hours >= self.min_hours && self.max_hours.is_none_or(|max| gap_hours <= max)
    }
}

fn check_bound(bound: &'static str, value: f64) -> Result<f64, PolicyError> {
    if value.is_finite() && value >= 0.0 {
        Ok(value)
    } else {
        Err(PolicyError::InvalidBound { bound, value })
    }
}

/// Configuration for sleep inference.
#[derive(Debug, Clone)]
pub struct InferenceConfig {
    /// Gap acceptance policy.
    pub policy: GapPolicy,

    /// Offset used to express period boundaries and derive calendar dates.
    pub utc_offset: FixedOffset,
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            policy: GapPolicy::default(),
            utc_offset: Utc.fix(),
        }
    }
}

/// Infers sleep periods from a merged timeline.
///
/// # Algorithm
///
/// 1. For each adjacent pair of events, compute the gap in fractional hours
/// 2. Keep the gap if the policy accepts it
/// 3. Emit a period bounded by the pair, dated by the earlier event
///
/// Output is ascending by `sleep_start` and holds at most `n - 1` periods.
/// A gap crossing midnight is a single period.
pub fn infer_sleep_periods(timeline: &Timeline, config: &InferenceConfig) -> Vec<SleepPeriod> {
    let mut periods = Vec::new();
    let mut too_short = 0usize;
    let mut too_long = 0usize;

    for pair in timeline.events().windows(2) {
        let (before, after) = (&pair[0], &pair[1]);
        let gap_hours = delta_hours(after.timestamp - before.timestamp);

        if config.policy.accepts(gap_hours) {
            periods.push(SleepPeriod::between(before, after, &config.utc_offset));
        } else if gap_hours < config.policy.min_hours {
            too_short += 1;
        } else {
            too_long += 1;
        }
    }

    tracing::debug!(
        events = timeline.len(),
        accepted = periods.len(),
        too_short,
        too_long,
        "sleep inference complete"
    );

    periods
}
