//! `sleeplog periods`: list every inferred sleep period.

use std::fmt::Write;

use anyhow::Result;
use chrono::Utc;
use sl_core::SleepPeriod;

use super::pipeline;
use super::util::format_hours;
use crate::cli::SourceArgs;
use crate::config::{Config, Settings};

/// Formats periods as a fixed-width table.
pub fn format_periods(periods: &[SleepPeriod]) -> String {
    let mut output = String::new();
    if periods.is_empty() {
        writeln!(output, "No sleep periods detected.").unwrap();
        return output;
    }

    writeln!(
        output,
        "{:<12}{:<18}{:<18}{:<10}SOURCES",
        "DATE", "SLEEP", "WAKE", "DURATION"
    )
    .unwrap();
    for period in periods {
        writeln!(
            output,
            "{:<12}{:<18}{:<18}{:<10}{} -> {}",
            period.date.to_string(),
            period.sleep_start.format("%Y-%m-%d %H:%M").to_string(),
            period.sleep_end.format("%Y-%m-%d %H:%M").to_string(),
            format_hours(period.duration_hours),
            period.start_source,
            period.end_source
        )
        .unwrap();
    }

    let noun = if periods.len() == 1 { "period" } else { "periods" };
    writeln!(output).unwrap();
    writeln!(output, "{} {noun}", periods.len()).unwrap();
    output
}

/// Formats periods as a JSON array.
pub fn format_periods_json(periods: &[SleepPeriod]) -> Result<String> {
    Ok(serde_json::to_string_pretty(periods)?)
}

/// Runs the periods command.
pub fn run(config: &Config, args: &SourceArgs, json: bool) -> Result<()> {
    let settings = Settings::resolve(config, args, Utc::now())?;
    let analysis = pipeline::run(&settings)?;

    if json {
        println!("{}", format_periods_json(&analysis.periods)?);
    } else {
        print!("{}", format_periods(&analysis.periods));
    }
    Ok(())
}
