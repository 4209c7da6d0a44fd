//! Core type definitions with validation.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Validation errors for core types.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// The provided source name is not a known activity source.
    #[error("unknown activity source: {value}")]
    UnknownSource { value: String },
}

/// Where an activity timestamp was recorded.
///
/// The declaration order doubles as the default source priority: when two
/// sources report the same instant, the earlier one is kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivitySource {
    /// Chrome browser history (`BrowserHistory.json`).
    Chrome,
    /// YouTube watch history (`watch-history.json` or `watch-history.html`).
    #[serde(rename = "youtube")]
    YouTube,
}

impl ActivitySource {
    /// All known sources in priority order.
    pub const ALL: [Self; 2] = [Self::Chrome, Self::YouTube];

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Chrome => "chrome",
            Self::YouTube => "youtube",
        }
    }
}

impl fmt::Display for ActivitySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ActivitySource {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "chrome" => Ok(Self::Chrome),
            "youtube" => Ok(Self::YouTube),
            _ => Err(ValidationError::UnknownSource {
                value: s.to_string(),
            }),
        }
    }
}
