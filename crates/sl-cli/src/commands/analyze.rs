//! `sleeplog analyze`: statistics report and charts.

use std::path::{Path, PathBuf};

use anyhow::Result;
use chrono::Utc;

use super::pipeline::{self, Analysis};
use super::report::{ReportData, format_report, format_report_json};
use crate::charts::{SvgCharts, VisualizationSink};
use crate::cli::SourceArgs;
use crate::config::{Config, Settings};

/// Output switches for `analyze`.
#[derive(Debug, Clone, Default)]
pub struct AnalyzeOptions {
    pub json: bool,
    pub no_charts: bool,
    /// Overrides the configured output directory.
    pub out_dir: Option<PathBuf>,
}

/// Runs the pipeline and hands the periods to `sink`, if any.
pub fn execute(
    settings: &Settings,
    sink: Option<&dyn VisualizationSink>,
) -> Result<(Analysis, Vec<PathBuf>)> {
    let analysis = pipeline::run(settings)?;
    let charts = match sink {
        Some(sink) => sink.render(&analysis.periods)?,
        None => Vec::new(),
    };
    Ok((analysis, charts))
}

/// Runs the analyze command.
pub fn run(config: &Config, args: &SourceArgs, options: &AnalyzeOptions) -> Result<()> {
    let generated_at = Utc::now();
    let settings = Settings::resolve(config, args, generated_at)?;
    tracing::debug!(?settings, "resolved settings");

    let out_dir = options
        .out_dir
        .as_deref()
        .unwrap_or_else(|| Path::new(&settings.output_dir));
    let svg = SvgCharts::new(out_dir.to_path_buf());
    let sink: Option<&dyn VisualizationSink> = if options.no_charts { None } else { Some(&svg) };

    let (analysis, charts) = execute(&settings, sink)?;

    let data = ReportData {
        generated_at,
        timezone: settings.timezone.clone(),
        utc_offset: settings.utc_offset,
        policy: settings.policy,
        analysis: &analysis,
        charts,
    };

    if options.json {
        println!("{}", format_report_json(&data)?);
    } else {
        print!("{}", format_report(&data));
    }

    Ok(())
}
