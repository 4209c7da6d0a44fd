//! YouTube watch history from Takeout.
//!
//! Takeout offers the history either as `watch-history.json` (an array of
//! records with an RFC 3339 `time`) or as `watch-history.html`, a single
//! enormous page where each entry ends with a human-readable timestamp such
//! as `Jan 5, 2024, 11:32:10 PM EST`. The JSON form is parsed in bulk; the
//! HTML form is scanned incrementally.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime, TimeZone, Utc};
use regex::bytes::Regex;

use super::{
    ActivityProvider, BUFFER_SIZE, ChunkedScanner, ExportFormat, IngestError, LoadOptions,
    SourceLoad, open_buffered, open_export,
};
use crate::types::ActivitySource;

/// Timestamp as printed in the HTML export. The separator before the
/// meridiem is a plain, no-break or narrow no-break space depending on the
/// export's age.
static WATCH_TIME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(Jan|Feb|Mar|Apr|May|Jun|Jul|Aug|Sep|Oct|Nov|Dec)[a-z]{0,6} ([0-9]{1,2}), ([0-9]{4}), ([0-9]{1,2}):([0-9]{2}):([0-9]{2})(?:(?: |\x{00A0}|\x{202F})(AM|PM))?(?: ([A-Z]{2,5})\b)?",
    )
    .unwrap()
});

/// Upper bound on the byte length of a [`WATCH_TIME_RE`] match.
const MAX_WATCH_TIME_LEN: usize = 64;

/// Reads watch timestamps from a YouTube history export.
#[derive(Debug, Clone)]
pub struct YouTubeHistory {
    path: PathBuf,
    scan_buffer_bytes: usize,
}

impl YouTubeHistory {
    pub const fn new(path: PathBuf) -> Self {
        Self {
            path,
            scan_buffer_bytes: BUFFER_SIZE,
        }
    }

    /// Sets the read buffer size used when scanning HTML exports.
    #[must_use]
    pub const fn with_scan_buffer(mut self, bytes: usize) -> Self {
        self.scan_buffer_bytes = bytes;
        self
    }

    fn load_json(&self, options: &LoadOptions) -> Result<SourceLoad, IngestError> {
        let reader = open_buffered(&self.path)?;
        let entries: Vec<serde_json::Value> =
            serde_json::from_reader(reader).map_err(|e| IngestError::json(&self.path, e))?;

        let mut load = SourceLoad::empty(self.source());
        load.events.reserve(entries.len());
        for entry in &entries {
            let parsed = entry
                .get("time")
                .and_then(serde_json::Value::as_str)
                .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
                .map(|dt| dt.with_timezone(&Utc));
            load.record(parsed, options);
        }
        Ok(load)
    }

    fn load_html(&self, options: &LoadOptions) -> Result<SourceLoad, IngestError> {
        let reader = open_export(&self.path)?;
        let scanner =
            ChunkedScanner::new(&WATCH_TIME_RE, self.scan_buffer_bytes, MAX_WATCH_TIME_LEN);

        let mut load = SourceLoad::empty(self.source());
        let stats = scanner
            .scan(reader, |m| {
                let parsed = std::str::from_utf8(m)
                    .ok()
                    .and_then(|text| parse_watch_timestamp(text, &options.utc_offset));
                load.record(parsed, options);
            })
            .map_err(|e| IngestError::io(&self.path, e))?;

        tracing::debug!(
            path = %self.path.display(),
            bytes = stats.bytes_read,
            peak_window = stats.peak_window,
            "scanned watch history page"
        );
        Ok(load)
    }
}

impl ActivityProvider for YouTubeHistory {
    fn source(&self) -> ActivitySource {
        ActivitySource::YouTube
    }

    fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self, options: &LoadOptions) -> Result<SourceLoad, IngestError> {
        let load = match ExportFormat::detect(&self.path) {
            Some(ExportFormat::Json) => self.load_json(options)?,
            Some(ExportFormat::Html) => self.load_html(options)?,
            None => {
                return Err(IngestError::UnsupportedFormat {
                    source_name: self.source(),
                    path: self.path.clone(),
                });
            }
        };

        tracing::debug!(
            path = %self.path.display(),
            events = load.events.len(),
            skipped = load.skipped,
            filtered = load.filtered,
            "loaded youtube history"
        );

        Ok(load)
    }
}

/// Parses a timestamp as printed in the HTML watch history.
///
/// A recognised zone abbreviation sets the offset; otherwise `default_offset`
/// is assumed. Returns `None` for impossible dates or times.
pub fn parse_watch_timestamp(text: &str, default_offset: &FixedOffset) -> Option<DateTime<Utc>> {
    let caps = WATCH_TIME_RE.captures(text.as_bytes())?;
    let field = |i: usize| caps.get(i).and_then(|m| std::str::from_utf8(m.as_bytes()).ok());

    let month = month_number(field(1)?)?;
    let day: u32 = field(2)?.parse().ok()?;
    let year: i32 = field(3)?.parse().ok()?;
    let mut hour: u32 = field(4)?.parse().ok()?;
    let minute: u32 = field(5)?.parse().ok()?;
    let second: u32 = field(6)?.parse().ok()?;

    match field(7) {
        Some(meridiem) => {
            if !(1..=12).contains(&hour) {
                return None;
            }
            hour %= 12;
            if meridiem == "PM" {
                hour += 12;
            }
        }
        None if hour > 23 => return None,
        None => {}
    }

    let naive = NaiveDate::from_ymd_opt(year, month, day)?
        .and_time(NaiveTime::from_hms_opt(hour, minute, second)?);
    let offset = field(8)
        .and_then(zone_offset)
        .unwrap_or(*default_offset);

    offset
        .from_local_datetime(&naive)
        .single()
        .map(|dt| dt.with_timezone(&Utc))
}

fn month_number(name: &str) -> Option<u32> {
    let month = match name {
        "Jan" => 1,
        "Feb" => 2,
        "Mar" => 3,
        "Apr" => 4,
        "May" => 5,
        "Jun" => 6,
        "Jul" => 7,
        "Aug" => 8,
        "Sep" => 9,
        "Oct" => 10,
        "Nov" => 11,
        "Dec" => 12,
        _ => return None,
    };
    Some(month)
}

/// Offsets for zone abbreviations commonly printed by Takeout.
fn zone_offset(abbreviation: &str) -> Option<FixedOffset> {
    let hours = match abbreviation {
        "UTC" | "GMT" => 0,
        "BST" | "CET" => 1,
        "CEST" => 2,
        "EDT" => -4,
        "EST" | "CDT" => -5,
        "CST" | "MDT" => -6,
        "MST" | "PDT" => -7,
        "PST" => -8,
        _ => return None,
    };
    FixedOffset::east_opt(hours * 3600)
}
