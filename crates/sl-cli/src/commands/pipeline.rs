//! The analysis pipeline shared by every command.
//!
//! Sources are loaded in priority order. The first one is the primary source
//! and must load; later ones are best effort and contribute nothing when
//! they fail.

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use sl_core::{
    ActivityEvent, ActivitySource, InferenceConfig, SleepPeriod, SleepSummary, Timeline,
    infer_sleep_periods, provider_for, summarize,
};

use crate::config::Settings;

/// Outcome of loading one source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SourceStatus {
    Loaded {
        /// Events read inside the recency window.
        events: usize,
        /// Events left after merging with higher-priority sources.
        merged: usize,
        skipped: usize,
        filtered: usize,
    },
    Failed {
        error: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceReport {
    pub source: ActivitySource,
    pub path: PathBuf,
    pub primary: bool,
    #[serde(flatten)]
    pub status: SourceStatus,
}

/// Everything a command needs to report on one run.
#[derive(Debug, Clone)]
pub struct Analysis {
    pub sources: Vec<SourceReport>,
    pub timeline_events: usize,
    pub first_activity: Option<DateTime<Utc>>,
    pub last_activity: Option<DateTime<Utc>>,
    pub periods: Vec<SleepPeriod>,
    pub summary: SleepSummary,
}

/// Runs ingestion, merging, inference and aggregation.
pub fn run(settings: &Settings) -> Result<Analysis> {
    let options = settings.load_options();
    let mut reports = Vec::with_capacity(settings.sources.len());
    let mut loaded: Vec<Vec<ActivityEvent>> = Vec::with_capacity(settings.sources.len());

    for (index, (source, path)) in settings.sources.iter().enumerate() {
        let primary = index == 0;
        let provider = provider_for(*source, path.clone(), settings.scan_buffer_bytes);
        let source = provider.source();
        let path = provider.path();
        match provider.load(&options) {
            Ok(load) => {
                tracing::debug!(
                    %source,
                    path = %path.display(),
                    events = load.events.len(),
                    skipped = load.skipped,
                    filtered = load.filtered,
                    "loaded source"
                );
                reports.push(SourceReport {
                    source,
                    path: path.to_path_buf(),
                    primary,
                    status: SourceStatus::Loaded {
                        events: load.events.len(),
                        merged: 0,
                        skipped: load.skipped,
                        filtered: load.filtered,
                    },
                });
                loaded.push(load.events);
            }
            Err(e) if primary => {
                return Err(e).with_context(|| format!("failed to load primary source {source}"));
            }
            Err(e) => {
                tracing::warn!(%source, path = %path.display(), error = %e, "skipping source");
                reports.push(SourceReport {
                    source,
                    path: path.to_path_buf(),
                    primary,
                    status: SourceStatus::Failed {
                        error: e.to_string(),
                    },
                });
            }
        }
    }

    let timeline = Timeline::merge(loaded);
    let merged_counts = timeline.count_by_source();
    for report in &mut reports {
        if let SourceStatus::Loaded { merged, .. } = &mut report.status {
            *merged = merged_counts.get(&report.source).copied().unwrap_or(0);
        }
    }
    tracing::debug!(events = timeline.len(), "merged timeline");

    let config = InferenceConfig {
        policy: settings.policy,
        utc_offset: settings.utc_offset,
    };
    let periods = infer_sleep_periods(&timeline, &config);
    let summary = summarize(&periods);

    Ok(Analysis {
        sources: reports,
        timeline_events: timeline.len(),
        first_activity: timeline.first(),
        last_activity: timeline.last(),
        periods,
        summary,
    })
}
