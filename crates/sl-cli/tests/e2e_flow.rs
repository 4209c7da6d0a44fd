//! End-to-end tests for the `sleeplog` binary.
//!
//! Tests the full pipeline: Takeout exports → merge → inference → report
//! and charts, through the real command-line surface.

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use tempfile::TempDir;

fn sleeplog_binary() -> String {
    env!("CARGO_BIN_EXE_sleeplog").to_string()
}

/// Runs `sleeplog` with an isolated home and config directory.
fn sleeplog(temp: &Path, args: &[&str]) -> Output {
    Command::new(sleeplog_binary())
        .current_dir(temp)
        .env("HOME", temp)
        .env("XDG_CONFIG_HOME", temp.join(".config"))
        .env_remove("RUST_LOG")
        .env_remove("SLEEPLOG_SOURCES")
        .env_remove("SLEEPLOG_MIN_GAP_HOURS")
        .env_remove("SLEEPLOG_MAX_GAP_HOURS")
        .env_remove("SLEEPLOG_UTC_OFFSET")
        .args(args)
        .output()
        .expect("failed to run sleeplog")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

/// Chrome history with visits at the given UTC times.
fn write_chrome(dir: &Path, times: &[&str]) -> PathBuf {
    let records: Vec<_> = times
        .iter()
        .map(|t| {
            let micros = chrono::DateTime::parse_from_rfc3339(t)
                .unwrap()
                .timestamp_micros();
            serde_json::json!({
                "page_transition": "LINK",
                "title": "Some page",
                "url": "https://example.com/",
                "time_usec": micros,
            })
        })
        .collect();
    let path = dir.join("BrowserHistory.json");
    std::fs::write(
        &path,
        serde_json::to_string_pretty(&serde_json::json!({ "Browser History": records })).unwrap(),
    )
    .unwrap();
    path
}

/// YouTube HTML watch history with the given printed timestamps.
fn write_youtube_html(dir: &Path, stamps: &[&str]) -> PathBuf {
    let mut page = String::from("<html><body><div class=\"mdl-grid\">");
    for stamp in stamps {
        page.push_str(&format!(
            r#"<div class="content-cell">Watched&nbsp;<a href="https://www.youtube.com/watch?v=abc">A video</a><br><a href="https://www.youtube.com/channel/xyz">A channel</a><br>{stamp}<br></div>"#
        ));
    }
    page.push_str("</div></body></html>");
    let path = dir.join("watch-history.html");
    std::fs::write(&path, page).unwrap();
    path
}

/// Two 8-hour nights: Chrome carries the days, YouTube the mornings.
fn two_night_fixture(temp: &Path) -> (PathBuf, PathBuf) {
    let chrome = write_chrome(
        temp,
        &[
            "2025-01-01T20:00:00Z",
            "2025-01-01T23:10:00Z",
            "2025-01-02T10:00:00Z",
            "2025-01-02T13:00:00Z",
            "2025-01-02T16:00:00Z",
            "2025-01-02T19:30:00Z",
            "2025-01-02T22:40:00Z",
        ],
    );
    let youtube = write_youtube_html(
        temp,
        &[
            "Jan 2, 2025, 7:10:00 AM UTC",
            "Jan 3, 2025, 6:40:00\u{202F}AM UTC",
        ],
    );
    (chrome, youtube)
}

#[test]
fn test_analyze_text_report_and_charts() {
    let temp = TempDir::new().unwrap();
    let (chrome, youtube) = two_night_fixture(temp.path());
    let charts = temp.path().join("charts");

    let output = sleeplog(
        temp.path(),
        &[
            "analyze",
            "--chrome",
            chrome.to_str().unwrap(),
            "--youtube",
            youtube.to_str().unwrap(),
            "--utc-offset",
            "utc",
            "--out-dir",
            charts.to_str().unwrap(),
        ],
    );

    assert!(output.status.success(), "analyze failed: {}", stderr(&output));
    let report = stdout(&output);
    assert!(report.contains("Nights detected:   2"), "{report}");
    assert!(report.contains("Average duration:  8h 00m"), "{report}");
    assert!(report.contains("Usual sleep hour:  22:00"), "{report}");
    assert!(report.contains("Usual wake hour:   06:00"), "{report}");
    assert!(report.contains("Events:            9"), "{report}");

    for name in [
        "sleep_duration.svg",
        "sleep_schedule.svg",
        "sleep_duration_dist.svg",
    ] {
        let svg = std::fs::read_to_string(charts.join(name)).unwrap();
        assert!(svg.starts_with("<svg"), "{name}");
    }
}

#[test]
fn test_analyze_json_report() {
    let temp = TempDir::new().unwrap();
    let (chrome, youtube) = two_night_fixture(temp.path());

    let output = sleeplog(
        temp.path(),
        &[
            "analyze",
            "--json",
            "--no-charts",
            "--chrome",
            chrome.to_str().unwrap(),
            "--youtube",
            youtube.to_str().unwrap(),
            "--utc-offset",
            "+00:00",
        ],
    );

    assert!(output.status.success(), "analyze failed: {}", stderr(&output));
    let report: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(report["statistics"]["status"], "summary");
    assert_eq!(report["statistics"]["night_count"], 2);
    assert_eq!(report["statistics"]["average_hours"], 8.0);
    assert_eq!(report["statistics"]["std_dev_hours"], 0.0);
    assert_eq!(report["timeline"]["events"], 9);
    assert_eq!(report["sources"][0]["source"], "chrome");
    assert_eq!(report["sources"][1]["events"], 2);
    assert_eq!(report["charts"], serde_json::json!([]));
    assert!(!temp.path().join("sleep_duration.svg").exists());
}

#[test]
fn test_periods_json() {
    let temp = TempDir::new().unwrap();
    let (chrome, youtube) = two_night_fixture(temp.path());

    let output = sleeplog(
        temp.path(),
        &[
            "periods",
            "--json",
            "--chrome",
            chrome.to_str().unwrap(),
            "--youtube",
            youtube.to_str().unwrap(),
            "--utc-offset",
            "+01:00",
        ],
    );

    assert!(output.status.success(), "periods failed: {}", stderr(&output));
    let periods: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    let periods = periods.as_array().unwrap();
    assert_eq!(periods.len(), 2);
    assert_eq!(periods[0]["sleep_start"], "2025-01-02T00:10:00+01:00");
    assert_eq!(periods[0]["date"], "2025-01-02");
    assert_eq!(periods[0]["start_source"], "chrome");
    assert_eq!(periods[0]["end_source"], "youtube");
}

#[test]
fn test_missing_primary_source_fails() {
    let temp = TempDir::new().unwrap();
    let (_, youtube) = two_night_fixture(temp.path());

    let output = sleeplog(
        temp.path(),
        &[
            "analyze",
            "--no-charts",
            "--chrome",
            "does-not-exist.json",
            "--youtube",
            youtube.to_str().unwrap(),
        ],
    );

    assert!(!output.status.success());
    let err = stderr(&output);
    assert!(err.contains("primary source chrome"), "{err}");
    assert!(err.contains("does-not-exist.json"), "{err}");
}

#[test]
fn test_missing_secondary_source_is_skipped() {
    let temp = TempDir::new().unwrap();
    let (chrome, _) = two_night_fixture(temp.path());

    let output = sleeplog(
        temp.path(),
        &[
            "analyze",
            "--no-charts",
            "--chrome",
            chrome.to_str().unwrap(),
            "--youtube",
            "does-not-exist.json",
            "--utc-offset",
            "utc",
        ],
    );

    assert!(output.status.success(), "analyze failed: {}", stderr(&output));
    let report = stdout(&output);
    assert!(report.contains("youtube unavailable"), "{report}");
    // Without the morning videos only 23:10 -> 10:00 remains
    assert!(report.contains("Nights detected:   1"), "{report}");
}

#[test]
fn test_youtube_only_run_uses_given_path() {
    let temp = TempDir::new().unwrap();
    let youtube = write_youtube_html(
        temp.path(),
        &["Jan 1, 2025, 11:00:00 PM UTC", "Jan 2, 2025, 7:00:00 AM UTC"],
    );

    let output = sleeplog(
        temp.path(),
        &[
            "periods",
            "--json",
            "--youtube",
            youtube.to_str().unwrap(),
            "--utc-offset",
            "utc",
        ],
    );

    assert!(output.status.success(), "periods failed: {}", stderr(&output));
    let periods: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    let periods = periods.as_array().unwrap();
    assert_eq!(periods.len(), 1);
    assert_eq!(periods[0]["start_source"], "youtube");
    assert_eq!(periods[0]["duration_hours"], 8.0);
}

#[test]
fn test_oversized_lookback_rejected() {
    let temp = TempDir::new().unwrap();
    let (chrome, _) = two_night_fixture(temp.path());

    let output = sleeplog(
        temp.path(),
        &[
            "periods",
            "--chrome",
            chrome.to_str().unwrap(),
            "--days",
            "4000000000",
        ],
    );

    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("too large"), "{}", stderr(&output));
}

#[test]
fn test_no_max_accepts_long_gaps() {
    let temp = TempDir::new().unwrap();
    // An 8-hour night followed by a 30-hour silence
    let chrome = write_chrome(
        temp.path(),
        &[
            "2025-01-01T23:00:00Z",
            "2025-01-02T07:00:00Z",
            "2025-01-03T13:00:00Z",
        ],
    );

    let count_periods = |extra: &[&str]| {
        let mut args = vec![
            "periods",
            "--json",
            "--sources",
            "chrome",
            "--chrome",
            chrome.to_str().unwrap(),
        ];
        args.extend_from_slice(extra);
        let output = sleeplog(temp.path(), &args);
        assert!(output.status.success(), "periods failed: {}", stderr(&output));
        let periods: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
        periods.as_array().unwrap().len()
    };

    assert_eq!(count_periods(&[]), 1);
    assert_eq!(count_periods(&["--no-max"]), 2);
}

#[test]
fn test_config_file_sets_paths_and_bounds() {
    let temp = TempDir::new().unwrap();
    let (chrome, youtube) = two_night_fixture(temp.path());
    let config = temp.path().join("sleeplog.toml");
    std::fs::write(
        &config,
        format!(
            "chrome_history = {chrome:?}\nyoutube_history = {youtube:?}\nutc_offset = \"utc\"\nmin_gap_hours = 8.5\nmax_gap_hours = 12.0\n",
            chrome = chrome.to_str().unwrap(),
            youtube = youtube.to_str().unwrap(),
        ),
    )
    .unwrap();

    let output = sleeplog(
        temp.path(),
        &[
            "--config",
            config.to_str().unwrap(),
            "periods",
            "--json",
        ],
    );

    assert!(output.status.success(), "periods failed: {}", stderr(&output));
    let periods: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    // Both nights last exactly 8 hours, below the configured minimum
    assert_eq!(periods, serde_json::json!([]));
}

#[test]
fn test_inverted_bounds_rejected() {
    let temp = TempDir::new().unwrap();
    let (chrome, _) = two_night_fixture(temp.path());

    let output = sleeplog(
        temp.path(),
        &[
            "periods",
            "--chrome",
            chrome.to_str().unwrap(),
            "--min-hours",
            "10",
            "--max-hours",
            "5",
        ],
    );

    assert!(!output.status.success());
    assert!(stderr(&output).contains("invalid sleep gap bounds"));
}

#[test]
fn test_no_subcommand_prints_help() {
    let temp = TempDir::new().unwrap();

    let output = sleeplog(temp.path(), &[]);

    assert!(output.status.success());
    assert!(stdout(&output).contains("analyze"));
    assert!(stdout(&output).contains("periods"));
}
