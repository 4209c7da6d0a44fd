//! Configuration loading and management.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use chrono::{DateTime, Duration, FixedOffset, Local, Offset, Utc};
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};
use sl_core::ingest::BUFFER_SIZE;
use sl_core::{ActivitySource, GapPolicy, LoadOptions};

use crate::cli::SourceArgs;
use crate::commands::util::parse_datetime_at;

/// Longest accepted lookback window (~100 years).
const MAX_LOOKBACK_DAYS: u32 = 100 * 365;

/// Application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Chrome history export.
    pub chrome_history: Option<PathBuf>,

    /// YouTube watch history export.
    pub youtube_history: Option<PathBuf>,

    /// Enabled sources in priority order. The first one with a path is the
    /// primary source and must load.
    pub sources: Vec<ActivitySource>,

    /// Only use activity from the last N days.
    pub lookback_days: Option<u32>,

    /// Shortest gap counted as sleep, in hours.
    pub min_gap_hours: Option<f64>,

    /// Longest gap counted as sleep, in hours.
    pub max_gap_hours: Option<f64>,

    /// Drop the upper gap bound entirely.
    pub unbounded: bool,

    /// `local`, `utc` or a fixed offset such as `+02:00`.
    pub utc_offset: String,

    /// Directory for chart files.
    pub output_dir: PathBuf,

    /// Read buffer size for incremental scans of HTML exports.
    pub scan_buffer_bytes: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            chrome_history: Some(PathBuf::from("Takeout/Chrome/BrowserHistory.json")),
            youtube_history: Some(PathBuf::from(
                "Takeout/YouTube and YouTube Music/history/watch-history.json",
            )),
            sources: ActivitySource::ALL.to_vec(),
            lookback_days: None,
            min_gap_hours: None,
            max_gap_hours: None,
            unbounded: false,
            utc_offset: "local".to_string(),
            output_dir: PathBuf::from("."),
            scan_buffer_bytes: BUFFER_SIZE,
        }
    }
}

impl Config {
    /// Loads configuration, optionally from a specific file.
    #[expect(
        clippy::result_large_err,
        reason = "figment::Error is large but only returned at startup"
    )]
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, figment::Error> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        // Load from default config location
        if let Some(config_dir) = dirs_config_path() {
            figment = figment.merge(Toml::file(config_dir.join("config.toml")));
        }

        // Load from specified config file
        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }

        // Load from environment variables (SLEEPLOG_*)
        figment = figment.merge(Env::prefixed("SLEEPLOG_"));

        figment.extract()
    }

    fn path_for(&self, source: ActivitySource) -> Option<&PathBuf> {
        match source {
            ActivitySource::Chrome => self.chrome_history.as_ref(),
            ActivitySource::YouTube => self.youtube_history.as_ref(),
        }
    }
}

/// Returns the platform-specific config directory for sleeplog.
fn dirs_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("sleeplog"))
}

/// Fully resolved settings for one run: configuration with command-line
/// overrides applied and every value validated.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Sources to load, in priority order. Never empty; the first is primary.
    pub sources: Vec<(ActivitySource, PathBuf)>,
    pub since: Option<DateTime<Utc>>,
    pub policy: GapPolicy,
    pub utc_offset: FixedOffset,
    /// Human-readable name of the analysis time zone.
    pub timezone: String,
    pub scan_buffer_bytes: usize,
    pub output_dir: PathBuf,
}

impl Settings {
    /// Applies `args` on top of `config`.
    ///
    /// `now` anchors the lookback window.
    pub fn resolve(config: &Config, args: &SourceArgs, now: DateTime<Utc>) -> Result<Self> {
        let mut enabled: Vec<ActivitySource> = Vec::new();
        for &source in args.sources.as_ref().unwrap_or(&config.sources) {
            if !enabled.contains(&source) {
                enabled.push(source);
            }
        }
        // Without an explicit order, paths given on the command line outrank
        // configured ones, so the primary source is one the user named.
        if args.sources.is_none() {
            enabled.sort_by_key(|&source| args.path_for(source).is_none());
        }

        let sources: Vec<_> = enabled
            .into_iter()
            .filter_map(|source| {
                args.path_for(source)
                    .or_else(|| config.path_for(source))
                    .map(|path| (source, path.clone()))
            })
            .collect();
        if sources.is_empty() {
            bail!("no activity source configured; pass --chrome or --youtube");
        }

        let since = match (&args.since, args.days.or(config.lookback_days)) {
            (Some(when), _) => Some(parse_datetime_at(when, now)?),
            (None, Some(days)) => Some(lookback_start(now, days)?),
            (None, None) => None,
        };

        let min = args.min_hours.or(config.min_gap_hours);
        let max = args.max_hours.or(config.max_gap_hours);
        let unbounded = args.no_max || (config.unbounded && args.max_hours.is_none());
        let policy = if unbounded {
            GapPolicy::at_least(min.unwrap_or(sl_core::DEFAULT_MIN_GAP_HOURS))
        } else {
            GapPolicy::new(min, max)
        }
        .context("invalid sleep gap bounds")?;

        let offset_spec = args.utc_offset.as_deref().unwrap_or(&config.utc_offset);
        let (utc_offset, timezone) = resolve_offset(offset_spec)?;

        if config.scan_buffer_bytes == 0 {
            bail!("scan_buffer_bytes must be greater than zero");
        }

        Ok(Self {
            sources,
            since,
            policy,
            utc_offset,
            timezone,
            scan_buffer_bytes: config.scan_buffer_bytes,
            output_dir: config.output_dir.clone(),
        })
    }

    pub fn load_options(&self) -> LoadOptions {
        LoadOptions {
            since: self.since,
            utc_offset: self.utc_offset,
        }
    }
}

/// Start of a lookback window of `days` days ending at `now`.
fn lookback_start(now: DateTime<Utc>, days: u32) -> Result<DateTime<Utc>> {
    if days > MAX_LOOKBACK_DAYS {
        bail!("lookback of {days} days is too large (at most {MAX_LOOKBACK_DAYS})");
    }
    now.checked_sub_signed(Duration::days(i64::from(days)))
        .with_context(|| format!("lookback of {days} days is out of range"))
}

/// Resolves an offset spec into an offset and a display name.
pub fn resolve_offset(spec: &str) -> Result<(FixedOffset, String)> {
    let spec = spec.trim();
    match spec.to_ascii_lowercase().as_str() {
        "local" => {
            let offset = Local::now().offset().fix();
            let name = iana_time_zone::get_timezone().unwrap_or_else(|_| "local".to_string());
            Ok((offset, format!("{name} ({offset})")))
        }
        "utc" | "z" => Ok((Utc.fix(), "UTC (+00:00)".to_string())),
        _ => {
            let offset = parse_fixed_offset(spec)
                .with_context(|| format!("invalid UTC offset: {spec} (use local, utc or +HH:MM)"))?;
            Ok((offset, format!("UTC{offset}")))
        }
    }
}

/// Parses `+HH:MM`, `-HH:MM` or `+HHMM`.
fn parse_fixed_offset(spec: &str) -> Option<FixedOffset> {
    let (sign, rest) = match spec.as_bytes().first()? {
        b'+' => (1, &spec[1..]),
        b'-' => (-1, &spec[1..]),
        _ => return None,
    };
    let digits: String = rest.chars().filter(|c| *c != ':').collect();
    if digits.len() != 4 || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let hours: i32 = digits[..2].parse().ok()?;
    let minutes: i32 = digits[2..].parse().ok()?;
    if hours > 14 || minutes > 59 {
        return None;
    }
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
}
