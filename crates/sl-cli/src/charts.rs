//! Chart rendering for inferred sleep periods.
//!
//! Charts are plain SVG documents written with `std::fmt::Write`.

use std::fmt::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{Datelike, NaiveDate, Timelike};
use sl_core::SleepPeriod;

/// Destination for sleep-period charts.
pub trait VisualizationSink {
    /// Renders charts for `periods`, returning the files written.
    ///
    /// Writes nothing for an empty slice.
    fn render(&self, periods: &[SleepPeriod]) -> Result<Vec<PathBuf>>;
}

pub const DURATION_CHART: &str = "sleep_duration.svg";
pub const SCHEDULE_CHART: &str = "sleep_schedule.svg";
pub const HISTOGRAM_CHART: &str = "sleep_duration_dist.svg";

const HISTOGRAM_BINS: usize = 20;

const WIDTH: f64 = 800.0;
const HEIGHT: f64 = 400.0;
const MARGIN_LEFT: f64 = 60.0;
const MARGIN_RIGHT: f64 = 20.0;
const MARGIN_TOP: f64 = 40.0;
const MARGIN_BOTTOM: f64 = 50.0;

const START_COLOR: &str = "#3b5bdb";
const END_COLOR: &str = "#f08c00";

/// Writes the duration, schedule and histogram charts as SVG files.
#[derive(Debug, Clone)]
pub struct SvgCharts {
    out_dir: PathBuf,
}

impl SvgCharts {
    pub const fn new(out_dir: PathBuf) -> Self {
        Self { out_dir }
    }

    fn write(&self, name: &str, contents: &str) -> Result<PathBuf> {
        let path = self.out_dir.join(name);
        std::fs::write(&path, contents)
            .with_context(|| format!("failed to write chart {}", path.display()))?;
        tracing::debug!(path = %path.display(), "wrote chart");
        Ok(path)
    }
}

impl VisualizationSink for SvgCharts {
    fn render(&self, periods: &[SleepPeriod]) -> Result<Vec<PathBuf>> {
        if periods.is_empty() {
            return Ok(Vec::new());
        }
        ensure_dir(&self.out_dir)?;

        Ok(vec![
            self.write(DURATION_CHART, &duration_chart(periods))?,
            self.write(SCHEDULE_CHART, &schedule_chart(periods))?,
            self.write(HISTOGRAM_CHART, &histogram_chart(periods))?,
        ])
    }
}

fn ensure_dir(dir: &Path) -> Result<()> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("failed to create chart directory {}", dir.display()))
}

/// Maps data coordinates onto the plot area.
struct Frame {
    x_min: f64,
    x_max: f64,
    y_min: f64,
    y_max: f64,
}

impl Frame {
    fn new(x_min: f64, x_max: f64, y_min: f64, y_max: f64) -> Self {
        // A single point still needs a non-empty range.
        let (x_min, x_max) = if x_max > x_min {
            (x_min, x_max)
        } else {
            (x_min - 1.0, x_max + 1.0)
        };
        let y_max = if y_max > y_min { y_max } else { y_min + 1.0 };
        Self {
            x_min,
            x_max,
            y_min,
            y_max,
        }
    }

    fn x(&self, value: f64) -> f64 {
        let plot_width = WIDTH - MARGIN_LEFT - MARGIN_RIGHT;
        MARGIN_LEFT + (value - self.x_min) / (self.x_max - self.x_min) * plot_width
    }

    fn y(&self, value: f64) -> f64 {
        let plot_height = HEIGHT - MARGIN_TOP - MARGIN_BOTTOM;
        HEIGHT - MARGIN_BOTTOM - (value - self.y_min) / (self.y_max - self.y_min) * plot_height
    }
}

fn open_svg(svg: &mut String, title: &str) {
    writeln!(
        svg,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{WIDTH}" height="{HEIGHT}" viewBox="0 0 {WIDTH} {HEIGHT}" font-family="sans-serif" font-size="12">"#
    )
    .unwrap();
    writeln!(svg, r#"<rect width="100%" height="100%" fill="white"/>"#).unwrap();
    writeln!(
        svg,
        r#"<text x="{:.1}" y="24" text-anchor="middle" font-size="16">{title}</text>"#,
        WIDTH / 2.0
    )
    .unwrap();
}

fn close_svg(svg: &mut String) {
    svg.push_str("</svg>\n");
}

/// Draws both axes with tick labels and axis titles.
fn axes(
    svg: &mut String,
    frame: &Frame,
    x_ticks: &[(f64, String)],
    y_ticks: &[(f64, String)],
    x_label: &str,
    y_label: &str,
) {
    let left = MARGIN_LEFT;
    let right = WIDTH - MARGIN_RIGHT;
    let top = MARGIN_TOP;
    let bottom = HEIGHT - MARGIN_BOTTOM;

    writeln!(svg, r#"<g stroke="black" stroke-width="1">"#).unwrap();
    writeln!(
        svg,
        r#"<line x1="{left}" y1="{bottom}" x2="{right}" y2="{bottom}"/>"#
    )
    .unwrap();
    writeln!(svg, r#"<line x1="{left}" y1="{top}" x2="{left}" y2="{bottom}"/>"#).unwrap();
    svg.push_str("</g>\n");

    for (value, label) in y_ticks {
        let y = frame.y(*value);
        writeln!(
            svg,
            r##"<line x1="{left}" y1="{y:.1}" x2="{right}" y2="{y:.1}" stroke="#e9ecef"/>"##
        )
        .unwrap();
        writeln!(
            svg,
            r#"<text x="{:.1}" y="{:.1}" text-anchor="end">{label}</text>"#,
            left - 6.0,
            y + 4.0
        )
        .unwrap();
    }
    for (value, label) in x_ticks {
        let x = frame.x(*value);
        writeln!(
            svg,
            r#"<text x="{x:.1}" y="{:.1}" text-anchor="middle">{label}</text>"#,
            bottom + 18.0
        )
        .unwrap();
    }

    writeln!(
        svg,
        r#"<text x="{:.1}" y="{:.1}" text-anchor="middle">{x_label}</text>"#,
        (left + right) / 2.0,
        HEIGHT - 8.0
    )
    .unwrap();
    writeln!(
        svg,
        r#"<text x="16" y="{y:.1}" text-anchor="middle" transform="rotate(-90 16 {y:.1})">{y_label}</text>"#,
        y = (top + bottom) / 2.0
    )
    .unwrap();
}

fn day_number(date: NaiveDate) -> f64 {
    f64::from(date.num_days_from_ce())
}

/// Up to six evenly spaced date ticks across `[first, last]`.
#[allow(clippy::cast_possible_truncation)]
fn date_ticks(first: NaiveDate, last: NaiveDate) -> Vec<(f64, String)> {
    let start = day_number(first);
    let span = day_number(last) - start;
    let steps = span.clamp(0.0, 5.0);
    let mut ticks = Vec::new();
    let mut last_day = None;
    for i in 0..=(steps as i32) {
        let day = if steps == 0.0 {
            start
        } else {
            (start + span * f64::from(i) / steps).round()
        };
        if last_day == Some(day) {
            continue;
        }
        last_day = Some(day);
        if let Some(date) = NaiveDate::from_num_days_from_ce_opt(day as i32) {
            ticks.push((day, date.format("%Y-%m-%d").to_string()));
        }
    }
    ticks
}

fn hour_ticks(max: f64, step: f64) -> Vec<(f64, String)> {
    let mut ticks = Vec::new();
    let mut value = 0.0;
    while value <= max + f64::EPSILON {
        ticks.push((value, format!("{value:.0}")));
        value += step;
    }
    ticks
}

fn date_bounds(periods: &[SleepPeriod]) -> (NaiveDate, NaiveDate) {
    let first = periods.iter().map(|p| p.date).min().unwrap_or_default();
    let last = periods.iter().map(|p| p.date).max().unwrap_or_default();
    (first, last)
}

/// Fractional hour of day, e.g. 23:30 is 23.5.
fn hour_of_day<T: Timelike>(t: &T) -> f64 {
    f64::from(t.hour()) + f64::from(t.minute()) / 60.0
}

/// Line chart of sleep duration per date.
pub fn duration_chart(periods: &[SleepPeriod]) -> String {
    let (first, last) = date_bounds(periods);
    let longest = periods
        .iter()
        .map(|p| p.duration_hours)
        .fold(0.0_f64, f64::max);
    let y_max = (longest / 2.0).ceil().max(1.0) * 2.0;
    let frame = Frame::new(day_number(first), day_number(last), 0.0, y_max);

    let mut svg = String::new();
    open_svg(&mut svg, "Sleep duration");
    axes(
        &mut svg,
        &frame,
        &date_ticks(first, last),
        &hour_ticks(y_max, 2.0),
        "Date",
        "Hours asleep",
    );

    let points: Vec<String> = periods
        .iter()
        .map(|p| {
            format!(
                "{:.1},{:.1}",
                frame.x(day_number(p.date)),
                frame.y(p.duration_hours)
            )
        })
        .collect();
    writeln!(
        svg,
        r#"<polyline fill="none" stroke="{START_COLOR}" stroke-width="2" points="{}"/>"#,
        points.join(" ")
    )
    .unwrap();
    for p in periods {
        writeln!(
            svg,
            r#"<circle cx="{:.1}" cy="{:.1}" r="3" fill="{START_COLOR}"/>"#,
            frame.x(day_number(p.date)),
            frame.y(p.duration_hours)
        )
        .unwrap();
    }

    close_svg(&mut svg);
    svg
}

/// Scatter of sleep and wake hour-of-day per date on a fixed 0-24 axis.
pub fn schedule_chart(periods: &[SleepPeriod]) -> String {
    let (first, last) = date_bounds(periods);
    let frame = Frame::new(day_number(first), day_number(last), 0.0, 24.0);

    let mut svg = String::new();
    open_svg(&mut svg, "Sleep schedule");
    axes(
        &mut svg,
        &frame,
        &date_ticks(first, last),
        &hour_ticks(24.0, 3.0),
        "Date",
        "Hour of day",
    );

    for p in periods {
        let x = frame.x(day_number(p.date));
        writeln!(
            svg,
            r#"<circle class="sleep" cx="{x:.1}" cy="{:.1}" r="4" fill="{START_COLOR}"/>"#,
            frame.y(hour_of_day(&p.sleep_start))
        )
        .unwrap();
        writeln!(
            svg,
            r#"<circle class="wake" cx="{x:.1}" cy="{:.1}" r="4" fill="{END_COLOR}"/>"#,
            frame.y(hour_of_day(&p.sleep_end))
        )
        .unwrap();
    }

    let legend_x = WIDTH - MARGIN_RIGHT - 110.0;
    for (row, (label, color)) in [("Sleep start", START_COLOR), ("Sleep end", END_COLOR)]
        .into_iter()
        .enumerate()
    {
        #[allow(clippy::cast_precision_loss)]
        let y = MARGIN_TOP + 10.0 + 16.0 * row as f64;
        writeln!(
            svg,
            r#"<circle cx="{legend_x}" cy="{y}" r="4" fill="{color}"/><text x="{}" y="{}">{label}</text>"#,
            legend_x + 10.0,
            y + 4.0
        )
        .unwrap();
    }

    close_svg(&mut svg);
    svg
}

/// Counts durations into `bins` equal-width bins spanning their range.
///
/// Returns the lower edge, the bin width and the counts.
#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
pub fn histogram(durations: &[f64], bins: usize) -> (f64, f64, Vec<usize>) {
    let mut counts = vec![0; bins];
    if durations.is_empty() || bins == 0 {
        return (0.0, 1.0, counts);
    }
    let min = durations.iter().copied().fold(f64::INFINITY, f64::min);
    let max = durations.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let (low, high) = if max > min {
        (min, max)
    } else {
        (min - 0.5, max + 0.5)
    };
    let width = (high - low) / bins as f64;
    for d in durations {
        let index = (((d - low) / width).floor() as usize).min(bins - 1);
        counts[index] += 1;
    }
    (low, width, counts)
}

/// Histogram of sleep durations.
#[allow(clippy::cast_precision_loss)]
pub fn histogram_chart(periods: &[SleepPeriod]) -> String {
    let durations: Vec<f64> = periods.iter().map(|p| p.duration_hours).collect();
    let (low, width, counts) = histogram(&durations, HISTOGRAM_BINS);
    let tallest = counts.iter().copied().max().unwrap_or(0).max(1);
    let high = width.mul_add(HISTOGRAM_BINS as f64, low);
    let frame = Frame::new(low, high, 0.0, tallest as f64);

    let x_ticks: Vec<(f64, String)> = (0..=4)
        .map(|i| {
            let value = (high - low).mul_add(f64::from(i) / 4.0, low);
            (value, format!("{value:.1}"))
        })
        .collect();
    let count_step = (tallest as f64 / 5.0).ceil().max(1.0);

    let mut svg = String::new();
    open_svg(&mut svg, "Sleep duration distribution");
    axes(
        &mut svg,
        &frame,
        &x_ticks,
        &hour_ticks(tallest as f64, count_step),
        "Hours asleep",
        "Nights",
    );

    for (i, count) in counts.iter().enumerate() {
        let left = frame.x(width.mul_add(i as f64, low));
        let right = frame.x(width.mul_add((i + 1) as f64, low));
        let top = frame.y(*count as f64);
        let bottom = frame.y(0.0);
        writeln!(
            svg,
            r#"<rect class="bar" x="{left:.1}" y="{top:.1}" width="{:.1}" height="{:.1}" fill="{START_COLOR}" stroke="white"/>"#,
            right - left,
            bottom - top
        )
        .unwrap();
    }

    close_svg(&mut svg);
    svg
}
