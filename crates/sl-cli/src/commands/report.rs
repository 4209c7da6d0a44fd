//! Report rendering for `sleeplog analyze`.
//!
//! Produces either a human-readable summary or a JSON document. Both are
//! pure functions of [`ReportData`] so they can be snapshot-tested.

use std::fmt::Write;
use std::path::PathBuf;

use anyhow::Result;
use chrono::{DateTime, FixedOffset, Utc};
use serde::Serialize;
use sl_core::{GapPolicy, SleepSummary};

use super::pipeline::{Analysis, SourceReport, SourceStatus};
use super::util::format_hours;

/// Width of the label column in the text report.
const LABEL_WIDTH: usize = 19;

/// Everything shown in a report.
#[derive(Debug)]
pub struct ReportData<'a> {
    pub generated_at: DateTime<Utc>,
    pub timezone: String,
    pub utc_offset: FixedOffset,
    pub policy: GapPolicy,
    pub analysis: &'a Analysis,
    pub charts: Vec<PathBuf>,
}

fn field(output: &mut String, label: &str, value: impl std::fmt::Display) {
    let label = format!("{label}:");
    writeln!(output, "{label:<LABEL_WIDTH$}{value}").unwrap();
}

fn section(output: &mut String, title: &str) {
    writeln!(output).unwrap();
    writeln!(output, "{title}").unwrap();
    writeln!(output, "{}", "─".repeat(title.chars().count())).unwrap();
}

/// Describes the gap policy, e.g. `gaps from 4h 00m to 14h 00m`.
pub fn describe_policy(policy: &GapPolicy) -> String {
    let min = format_hours(policy.min_hours());
    match policy.max_hours() {
        Some(max) => format!("gaps from {min} to {}", format_hours(max)),
        None => format!("gaps of at least {min}"),
    }
}

fn format_local(instant: DateTime<Utc>, offset: &FixedOffset) -> String {
    instant
        .with_timezone(offset)
        .format("%Y-%m-%d %H:%M")
        .to_string()
}

fn format_source(output: &mut String, report: &SourceReport) {
    let name = report.source.as_str();
    match &report.status {
        SourceStatus::Loaded {
            events,
            merged,
            skipped,
            filtered,
        } => {
            let primary = if report.primary { " (primary)" } else { "" };
            writeln!(
                output,
                "  {name:<8}{events} loaded, {merged} kept, {skipped} skipped, {filtered} outside window{primary}"
            )
            .unwrap();
        }
        SourceStatus::Failed { error } => {
            writeln!(output, "  {name:<8}unavailable: {error}").unwrap();
        }
    }
}

/// Formats the human-readable report output.
pub fn format_report(data: &ReportData) -> String {
    let mut output = String::new();
    let analysis = data.analysis;

    writeln!(output, "SLEEP REPORT").unwrap();
    writeln!(output, "════════════").unwrap();
    field(&mut output, "Timezone", &data.timezone);
    field(&mut output, "Policy", describe_policy(&data.policy));

    section(&mut output, "SOURCES");
    for report in &analysis.sources {
        format_source(&mut output, report);
    }

    section(&mut output, "TIMELINE");
    field(&mut output, "Events", analysis.timeline_events);
    if let (Some(first), Some(last)) = (analysis.first_activity, analysis.last_activity) {
        field(
            &mut output,
            "First activity",
            format_local(first, &data.utc_offset),
        );
        field(
            &mut output,
            "Last activity",
            format_local(last, &data.utc_offset),
        );
    }

    let Some(stats) = analysis.summary.statistics() else {
        writeln!(output).unwrap();
        writeln!(output, "No sleep periods detected.").unwrap();
        return output;
    };

    section(&mut output, "SLEEP");
    field(&mut output, "Nights detected", stats.night_count);
    field(
        &mut output,
        "Date range",
        format!("{} to {}", stats.date_range_start, stats.date_range_end),
    );
    field(
        &mut output,
        "Average duration",
        format_hours(stats.average_hours),
    );
    field(
        &mut output,
        "Std deviation",
        stats
            .std_dev_hours
            .map_or_else(|| "n/a".to_string(), format_hours),
    );
    field(
        &mut output,
        "Median duration",
        format_hours(stats.median_hours),
    );
    field(
        &mut output,
        "Usual sleep hour",
        format!("{:02}:00", stats.most_common_sleep_hour),
    );
    field(
        &mut output,
        "Usual wake hour",
        format!("{:02}:00", stats.most_common_wake_hour),
    );

    if !data.charts.is_empty() {
        section(&mut output, "CHARTS");
        for chart in &data.charts {
            writeln!(output, "  {}", chart.display()).unwrap();
        }
    }

    output
}

// ========== JSON Output ==========

/// JSON report structure.
#[derive(Debug, Serialize)]
pub struct JsonReport<'a> {
    pub generated_at: String,
    pub timezone: &'a str,
    pub policy: &'a GapPolicy,
    pub sources: &'a [SourceReport],
    pub timeline: JsonTimeline,
    pub statistics: &'a SleepSummary,
    pub charts: &'a [PathBuf],
}

#[derive(Debug, Serialize)]
pub struct JsonTimeline {
    pub events: usize,
    pub first: Option<String>,
    pub last: Option<String>,
}

/// Formats report data as JSON.
pub fn format_report_json(data: &ReportData) -> Result<String> {
    let analysis = data.analysis;
    let to_local = |t: DateTime<Utc>| t.with_timezone(&data.utc_offset).to_rfc3339();

    let report = JsonReport {
        generated_at: data.generated_at.to_rfc3339(),
        timezone: &data.timezone,
        policy: &data.policy,
        sources: &analysis.sources,
        timeline: JsonTimeline {
            events: analysis.timeline_events,
            first: analysis.first_activity.map(to_local),
            last: analysis.last_activity.map(to_local),
        },
        statistics: &analysis.summary,
        charts: &data.charts,
    };

    Ok(serde_json::to_string_pretty(&report)?)
}
