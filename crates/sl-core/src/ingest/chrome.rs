//! Chrome browser history from Takeout's `BrowserHistory.json`.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Deserialize;

use super::{
    ActivityProvider, ExportFormat, IngestError, LoadOptions, SourceLoad, open_buffered,
};
use crate::types::ActivitySource;

/// Top-level layout of the export. Only the visit list matters.
#[derive(Debug, Deserialize)]
struct BrowserHistoryFile {
    #[serde(rename = "Browser History")]
    entries: Vec<serde_json::Value>,
}

/// Reads page-visit timestamps from a Chrome history export.
#[derive(Debug, Clone)]
pub struct ChromeHistory {
    path: PathBuf,
}

impl ChromeHistory {
    pub const fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl ActivityProvider for ChromeHistory {
    fn source(&self) -> ActivitySource {
        ActivitySource::Chrome
    }

    fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self, options: &LoadOptions) -> Result<SourceLoad, IngestError> {
        if ExportFormat::detect(&self.path) != Some(ExportFormat::Json) {
            return Err(IngestError::UnsupportedFormat {
                source_name: self.source(),
                path: self.path.clone(),
            });
        }

        let reader = open_buffered(&self.path)?;
        let file: BrowserHistoryFile =
            serde_json::from_reader(reader).map_err(|e| IngestError::json(&self.path, e))?;

        let mut load = SourceLoad::empty(self.source());
        load.events.reserve(file.entries.len());
        for entry in &file.entries {
            load.record(visit_time(entry), options);
        }

        tracing::debug!(
            path = %self.path.display(),
            events = load.events.len(),
            skipped = load.skipped,
            filtered = load.filtered,
            "loaded chrome history"
        );

        Ok(load)
    }
}

/// Extracts `time_usec` (microseconds since the Unix epoch).
///
/// Exports write it as a number; older ones as a numeric string.
fn visit_time(entry: &serde_json::Value) -> Option<DateTime<Utc>> {
    let micros = match entry.get("time_usec")? {
        serde_json::Value::Number(n) => n.as_i64()?,
        serde_json::Value::String(s) => s.trim().parse().ok()?,
        _ => return None,
    };
    DateTime::from_timestamp_micros(micros)
}

#[cfg(test)]
mod tests {
    use super::*;

    use chrono::TimeZone;
    use serde_json::json;

    fn write_export(contents: &str) -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("BrowserHistory.json");
        std::fs::write(&path, contents).unwrap();
        (dir, path)
    }

    #[test]
    fn test_visit_time_number_and_string() {
        let expected = Utc.with_ymd_and_hms(2023, 11, 14, 22, 13, 20).unwrap();

        assert_eq!(
            visit_time(&json!({"time_usec": 1_700_000_000_000_000_i64})),
            Some(expected)
        );
        assert_eq!(
            visit_time(&json!({"time_usec": "1700000000000000"})),
            Some(expected)
        );
    }

    #[test]
    fn test_visit_time_malformed() {
        assert_eq!(visit_time(&json!({"url": "https://example.com"})), None);
        assert_eq!(visit_time(&json!({"time_usec": "yesterday"})), None);
        assert_eq!(visit_time(&json!({"time_usec": null})), None);
        assert_eq!(visit_time(&json!({"time_usec": 1.5})), None);
    }

    #[test]
    fn test_load_skips_malformed_records() {
        let (_dir, path) = write_export(
            r#"{"Browser History": [
                {"title": "a", "url": "https://a.example", "time_usec": 1700000000000000},
                {"title": "b", "url": "https://b.example"},
                {"title": "c", "url": "https://c.example", "time_usec": "1700003600000000"},
                {"title": "d", "url": "https://d.example", "time_usec": "soon"}
            ]}"#,
        );

        let load = ChromeHistory::new(path)
            .load(&LoadOptions::default())
            .unwrap();

        assert_eq!(load.events.len(), 2);
        assert_eq!(load.skipped, 2);
        assert!(load.events.iter().all(|e| e.source == ActivitySource::Chrome));
    }

    #[test]
    fn test_load_applies_recency_window() {
        let (_dir, path) = write_export(
            r#"{"Browser History": [
                {"time_usec": 1600000000000000},
                {"time_usec": 1700000000000000}
            ]}"#,
        );
        let options = LoadOptions {
            since: Some(Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap()),
            ..LoadOptions::default()
        };

        let load = ChromeHistory::new(path).load(&options).unwrap();

        assert_eq!(load.events.len(), 1);
        assert_eq!(load.filtered, 1);
    }

    #[test]
    fn test_load_rejects_document_without_history() {
        let (_dir, path) = write_export(r#"{"Bookmarks": []}"#);

        let err = ChromeHistory::new(path)
            .load(&LoadOptions::default())
            .unwrap_err();

        assert!(matches!(err, IngestError::Json { .. }));
    }

    #[test]
    fn test_load_rejects_html_path() {
        let err = ChromeHistory::new(PathBuf::from("History.html"))
            .load(&LoadOptions::default())
            .unwrap_err();

        assert!(matches!(err, IngestError::UnsupportedFormat { .. }));
    }
}
