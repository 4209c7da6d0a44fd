//! Activity providers for Google Takeout exports.
//!
//! Each provider reads one export file and yields bare activity timestamps.
//! Individual malformed records are skipped and counted; only failures that
//! make the whole file unusable (missing file, broken JSON document) are
//! returned as errors.

mod chrome;
mod scanner;
mod youtube;

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use chrono::{DateTime, FixedOffset, Offset, Utc};
use flate2::read::GzDecoder;
use thiserror::Error;

pub use chrome::ChromeHistory;
pub use scanner::{ChunkedScanner, ScanStats};
pub use youtube::{YouTubeHistory, parse_watch_timestamp};

use crate::event::ActivityEvent;
use crate::types::ActivitySource;

/// Buffer size for readers (64KB for large exports).
pub const BUFFER_SIZE: usize = 64 * 1024;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid JSON in {}: {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("unsupported export format for {source_name}: {}", path.display())]
    UnsupportedFormat {
        source_name: ActivitySource,
        path: PathBuf,
    },
}

impl IngestError {
    pub(crate) fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    pub(crate) fn json(path: &Path, source: serde_json::Error) -> Self {
        Self::Json {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Options shared by every provider for one run.
#[derive(Debug, Clone)]
pub struct LoadOptions {
    /// Drop events older than this instant.
    pub since: Option<DateTime<Utc>>,

    /// Offset for timestamps that carry no zone of their own.
    pub utc_offset: FixedOffset,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            since: None,
            utc_offset: Utc.fix(),
        }
    }
}

impl LoadOptions {
    fn admits(&self, timestamp: DateTime<Utc>) -> bool {
        self.since.is_none_or(|since| timestamp >= since)
    }
}

/// Events read from one source, plus bookkeeping for reporting.
#[derive(Debug, Clone)]
pub struct SourceLoad {
    pub source: ActivitySource,

    /// Events inside the recency window, in file order.
    pub events: Vec<ActivityEvent>,

    /// Records that could not be parsed.
    pub skipped: usize,

    /// Valid records outside the recency window.
    pub filtered: usize,
}

impl SourceLoad {
    pub const fn empty(source: ActivitySource) -> Self {
        Self {
            source,
            events: Vec::new(),
            skipped: 0,
            filtered: 0,
        }
    }

    /// Records the outcome of parsing a single record.
    fn record(&mut self, parsed: Option<DateTime<Utc>>, options: &LoadOptions) {
        match parsed {
            Some(timestamp) if options.admits(timestamp) => {
                self.events.push(ActivityEvent::new(timestamp, self.source));
            }
            Some(_) => self.filtered += 1,
            None => self.skipped += 1,
        }
    }
}

/// A source of activity timestamps.
pub trait ActivityProvider {
    /// Which source this provider reads.
    fn source(&self) -> ActivitySource;

    /// Path of the export being read.
    fn path(&self) -> &Path;

    /// Reads all events admitted by `options`.
    fn load(&self, options: &LoadOptions) -> Result<SourceLoad, IngestError>;
}

/// Export file layouts, detected from the file name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Json,
    Html,
}

impl ExportFormat {
    /// Detects the format from the extension, looking through a `.gz` suffix.
    pub fn detect(path: &Path) -> Option<Self> {
        let inner = if is_gzip(path) {
            Path::new(path.file_stem()?)
        } else {
            path
        };
        match inner
            .extension()?
            .to_str()?
            .to_ascii_lowercase()
            .as_str()
        {
            "json" => Some(Self::Json),
            "html" | "htm" => Some(Self::Html),
            _ => None,
        }
    }
}

fn is_gzip(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("gz"))
}

/// Opens an export, decompressing `.gz` files on the fly.
pub(crate) fn open_export(path: &Path) -> Result<Box<dyn Read>, IngestError> {
    let file = File::open(path).map_err(|e| IngestError::io(path, e))?;
    if is_gzip(path) {
        Ok(Box::new(GzDecoder::new(file)))
    } else {
        Ok(Box::new(file))
    }
}

/// Opens an export behind a large read buffer for bulk parsing.
pub(crate) fn open_buffered(path: &Path) -> Result<BufReader<Box<dyn Read>>, IngestError> {
    Ok(BufReader::with_capacity(BUFFER_SIZE, open_export(path)?))
}

/// Builds the provider for `source` reading `path`.
///
/// `scan_buffer_bytes` sizes the read buffer of incremental text scans.
pub fn provider_for(
    source: ActivitySource,
    path: PathBuf,
    scan_buffer_bytes: usize,
) -> Box<dyn ActivityProvider> {
    match source {
        ActivitySource::Chrome => Box::new(ChromeHistory::new(path)),
        ActivitySource::YouTube => {
            Box::new(YouTubeHistory::new(path).with_scan_buffer(scan_buffer_bytes))
        }
    }
}
