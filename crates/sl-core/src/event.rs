//! Timestamped activity signals from exported history.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::ActivitySource;

/// A single moment of observed activity.
///
/// Events carry no payload beyond the instant and where it came from;
/// URLs, titles and the like are discarded at ingestion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ActivityEvent {
    /// When the activity happened.
    pub timestamp: DateTime<Utc>,
    /// Which export the timestamp was read from.
    pub source: ActivitySource,
}

impl ActivityEvent {
    pub const fn new(timestamp: DateTime<Utc>, source: ActivitySource) -> Self {
        Self { timestamp, source }
    }
}
