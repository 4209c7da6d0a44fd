//! Command-line argument definitions.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use sl_core::ActivitySource;

/// Sleep pattern analysis from Google Takeout activity history.
///
/// Infers sleep from long gaps in browsing and watch history, then reports
/// statistics and renders charts.
#[derive(Debug, Parser)]
#[command(name = "sleeplog", version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to config file.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Infer sleep periods, print statistics and render charts.
    Analyze {
        #[command(flatten)]
        sources: SourceArgs,

        /// Output as JSON.
        #[arg(long)]
        json: bool,

        /// Skip chart rendering.
        #[arg(long)]
        no_charts: bool,

        /// Directory for chart files.
        #[arg(long)]
        out_dir: Option<PathBuf>,
    },

    /// List inferred sleep periods.
    Periods {
        #[command(flatten)]
        sources: SourceArgs,

        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },
}

/// Inputs and inference settings shared by every analysis command.
///
/// Each option overrides the matching configuration key.
#[derive(Debug, Clone, Default, Args)]
pub struct SourceArgs {
    /// Chrome history export (`BrowserHistory.json`).
    #[arg(long, value_name = "PATH")]
    pub chrome: Option<PathBuf>,

    /// YouTube watch history export (`watch-history.json` or `.html`).
    #[arg(long, value_name = "PATH")]
    pub youtube: Option<PathBuf>,

    /// Sources to use, in priority order. The first one is required.
    #[arg(long, value_delimiter = ',', value_name = "SOURCE")]
    pub sources: Option<Vec<ActivitySource>>,

    /// Only use activity from the last N days.
    #[arg(long, value_name = "N", conflicts_with = "since")]
    pub days: Option<u32>,

    /// Only use activity after this time (ISO 8601 or e.g. '30 days ago').
    #[arg(long, value_name = "WHEN")]
    pub since: Option<String>,

    /// Shortest gap, in hours, counted as sleep.
    #[arg(long, value_name = "HOURS")]
    pub min_hours: Option<f64>,

    /// Longest gap, in hours, counted as sleep.
    #[arg(long, value_name = "HOURS", conflicts_with = "no_max")]
    pub max_hours: Option<f64>,

    /// Accept gaps of any length above the minimum.
    #[arg(long)]
    pub no_max: bool,

    /// UTC offset for dates and hours ('local', 'utc' or '+HH:MM').
    #[arg(long, value_name = "OFFSET", allow_hyphen_values = true)]
    pub utc_offset: Option<String>,
}

impl SourceArgs {
    /// Export path given on the command line for `source`.
    pub const fn path_for(&self, source: ActivitySource) -> Option<&PathBuf> {
        match source {
            ActivitySource::Chrome => self.chrome.as_ref(),
            ActivitySource::YouTube => self.youtube.as_ref(),
        }
    }
}
