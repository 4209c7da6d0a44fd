//! Merging per-source activity into one chronological timeline.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use crate::event::ActivityEvent;
use crate::types::ActivitySource;

/// Chronologically ordered activity, unique by instant.
///
/// The only way to build a `Timeline` is through [`Timeline::merge`] (or
/// [`Timeline::from_events`]), so every instance is sorted ascending by
/// timestamp and holds at most one event per instant.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Timeline {
    events: Vec<ActivityEvent>,
}

impl Timeline {
    /// Merges event sequences from any number of sources.
    ///
    /// Inputs may be unsorted and may overlap. They are concatenated in
    /// argument order and stable-sorted by timestamp; when several events
    /// share an instant the first one seen is kept, so earlier inputs take
    /// priority over later ones.
    pub fn merge<I>(sources: I) -> Self
    where
        I: IntoIterator<Item = Vec<ActivityEvent>>,
    {
        let mut iter = sources.into_iter();
        let mut events = iter.next().unwrap_or_default();
        for more in iter {
            events.extend(more);
        }

        events.sort_by_key(|e| e.timestamp);
        events.dedup_by_key(|e| e.timestamp);

        Self { events }
    }

    /// Builds a timeline from a single source's events.
    pub fn from_events(events: Vec<ActivityEvent>) -> Self {
        Self::merge([events])
    }

    pub fn events(&self) -> &[ActivityEvent] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Earliest activity, if any.
    pub fn first(&self) -> Option<DateTime<Utc>> {
        self.events.first().map(|e| e.timestamp)
    }

    /// Latest activity, if any.
    pub fn last(&self) -> Option<DateTime<Utc>> {
        self.events.last().map(|e| e.timestamp)
    }

    /// Number of surviving events per source after deduplication.
    pub fn count_by_source(&self) -> BTreeMap<ActivitySource, usize> {
        let mut counts = BTreeMap::new();
        for event in &self.events {
            *counts.entry(event.source).or_insert(0) += 1;
        }
        counts
    }
}

impl<'a> IntoIterator for &'a Timeline {
    type Item = &'a ActivityEvent;
    type IntoIter = std::slice::Iter<'a, ActivityEvent>;

    fn into_iter(self) -> Self::IntoIter {
        self.events.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use chrono::TimeZone;

    fn at(secs: i64, source: ActivitySource) -> ActivityEvent {
        ActivityEvent::new(Utc.timestamp_opt(secs, 0).unwrap(), source)
    }

    fn secs(timeline: &Timeline) -> Vec<i64> {
        timeline.events().iter().map(|e| e.timestamp.timestamp()).collect()
    }

    #[test]
    fn test_merge_collapses_shared_instants() {
        let a = vec![at(100, ActivitySource::Chrome)];
        let b = vec![at(100, ActivitySource::YouTube), at(200, ActivitySource::YouTube)];

        let merged = Timeline::merge([a, b]);

        assert_eq!(secs(&merged), vec![100, 200]);
    }

    #[test]
    fn test_merge_first_seen_source_wins() {
        let a = vec![at(100, ActivitySource::YouTube)];
        let b = vec![at(100, ActivitySource::Chrome)];

        let merged = Timeline::merge([a.clone(), b.clone()]);
        assert_eq!(merged.events()[0].source, ActivitySource::YouTube);

        let merged = Timeline::merge([b, a]);
        assert_eq!(merged.events()[0].source, ActivitySource::Chrome);
    }

    #[test]
    fn test_merge_sorts_unsorted_input() {
        let a = vec![
            at(300, ActivitySource::Chrome),
            at(100, ActivitySource::Chrome),
            at(200, ActivitySource::Chrome),
        ];
        let b = vec![at(250, ActivitySource::YouTube), at(50, ActivitySource::YouTube)];

        let merged = Timeline::merge([a, b]);

        assert_eq!(secs(&merged), vec![50, 100, 200, 250, 300]);
    }

    #[test]
    fn test_merge_is_idempotent() {
        let t = vec![
            at(500, ActivitySource::Chrome),
            at(10, ActivitySource::YouTube),
            at(10, ActivitySource::Chrome),
            at(7_200, ActivitySource::Chrome),
        ];

        let once = Timeline::merge([t.clone()]);
        let twice = Timeline::merge([t.clone(), t]);

        assert_eq!(once, twice);
    }

    #[test]
    fn test_merge_of_merged_timeline_is_stable() {
        let t = Timeline::merge([vec![
            at(30, ActivitySource::Chrome),
            at(20, ActivitySource::YouTube),
        ]]);

        let again = Timeline::from_events(t.events().to_vec());

        assert_eq!(t, again);
    }

    #[test]
    fn test_merge_empty_inputs() {
        let none: [Vec<ActivityEvent>; 0] = [];
        assert!(Timeline::merge(none).is_empty());
        assert!(Timeline::merge([Vec::new(), Vec::new()]).is_empty());
    }

    #[test]
    fn test_first_and_last() {
        let t = Timeline::merge([vec![
            at(30, ActivitySource::Chrome),
            at(10, ActivitySource::Chrome),
        ]]);

        assert_eq!(t.first().unwrap().timestamp(), 10);
        assert_eq!(t.last().unwrap().timestamp(), 30);
        assert!(Timeline::default().first().is_none());
    }

    #[test]
    fn test_count_by_source() {
        let t = Timeline::merge([
            vec![at(1, ActivitySource::Chrome), at(2, ActivitySource::Chrome)],
            vec![at(2, ActivitySource::YouTube), at(3, ActivitySource::YouTube)],
        ]);

        let counts = t.count_by_source();
        assert_eq!(counts[&ActivitySource::Chrome], 2);
        assert_eq!(counts[&ActivitySource::YouTube], 1);
    }
}
