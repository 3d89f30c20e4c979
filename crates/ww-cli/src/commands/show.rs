//! Show command for inspecting the last saved snapshot.
//!
//! Totals are the closed totals recorded in the snapshot. An interval that
//! was open when the snapshot was written is not included.

use std::io::Write;

use anyhow::{Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use ww_core::{Snapshot, StopWatch, TimerId, TimerState, format_duration, sum_durations};
use ww_store::JsonStore;

use crate::Config;
use crate::render::{TimerRow, write_timer_table, write_totals};

/// One saved timer.
#[derive(Debug, Clone, Serialize)]
pub struct SavedTimer {
    pub id: TimerId,
    pub name: String,
    pub state: TimerState,
    pub total_ms: i64,
    pub total: String,
    pub events: usize,
}

/// Summary of a saved snapshot.
#[derive(Debug, Clone, Serialize)]
pub struct SavedReport {
    pub schema_version: String,
    /// Timestamp of the most recent recorded event.
    pub last_change: Option<DateTime<Utc>>,
    pub idle_total: String,
    pub total: String,
    pub events: usize,
    pub timers: Vec<SavedTimer>,
}

pub fn build_report(snapshot: &Snapshot) -> SavedReport {
    let every_watch = || std::iter::once(&snapshot.stop_timer).chain(&snapshot.timer_list);

    let last_change = every_watch()
        .filter_map(|w| w.history().last().map(|e| e.timestamp))
        .max();
    let events: usize = every_watch().map(|w| w.history().len()).sum();
    let total = sum_durations(snapshot.timer_list.iter().map(StopWatch::total));

    SavedReport {
        schema_version: snapshot.schema_version.clone(),
        last_change,
        idle_total: format_duration(snapshot.stop_timer.total()),
        total: format_duration(total),
        events,
        timers: snapshot.timer_list.iter().map(saved_timer).collect(),
    }
}

fn saved_timer(watch: &StopWatch) -> SavedTimer {
    SavedTimer {
        id: watch.id(),
        name: watch.name().to_string(),
        state: watch.state(),
        total_ms: watch.total().num_milliseconds(),
        total: format_duration(watch.total()),
        events: watch.history().len(),
    }
}

pub fn format_report<W: Write>(writer: &mut W, report: &SavedReport) -> Result<()> {
    match report.last_change {
        Some(at) => writeln!(
            writer,
            "Saved timers (schema {}, last change {})",
            report.schema_version,
            at.to_rfc3339_opts(SecondsFormat::Secs, true)
        )?,
        None => writeln!(writer, "Saved timers (schema {})", report.schema_version)?,
    }

    if report.timers.is_empty() {
        writeln!(writer, "No timers saved.")?;
    } else {
        let rows: Vec<TimerRow<'_>> = report
            .timers
            .iter()
            .enumerate()
            .map(|(index, t)| TimerRow {
                index,
                id: t.id,
                state: t.state,
                total: t.total.clone(),
                name: &t.name,
            })
            .collect();
        write_timer_table(writer, &rows)?;
    }
    write_totals(writer, &report.idle_total, &report.total)?;
    writeln!(writer, "Events recorded: {}", report.events)?;
    Ok(())
}

pub fn run<W: Write>(writer: &mut W, config: &Config, json: bool) -> Result<()> {
    let store = JsonStore::new(&config.data_path);
    let saved = store
        .load()
        .with_context(|| format!("failed to load {}", config.data_path.display()))?;

    let Some(snapshot) = saved else {
        if json {
            writeln!(writer, "null")?;
        } else {
            writeln!(writer, "No saved timers at {}.", config.data_path.display())?;
        }
        return Ok(());
    };

    let report = build_report(&snapshot);
    if json {
        let out = serde_json::to_string_pretty(&report).context("failed to serialize report")?;
        writeln!(writer, "{out}")?;
    } else {
        format_report(writer, &report)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::TimeDelta;
    use ww_core::Chronometer;

    use insta::assert_snapshot;

    use super::*;

    fn at(secs: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000 + secs, 0).unwrap()
    }

    fn saved_config(dir: &std::path::Path) -> Config {
        let config = Config {
            data_path: dir.join("chronometer.json"),
            save_to_file: true,
            default_timers: Vec::new(),
        };
        let chrono =
            Chronometer::new_at(at(0)).with_sink(JsonStore::new(&config.data_path));
        let mgmt = chrono.add_at("mgmt", at(0));
        let review = chrono.add_at("review", at(0));
        chrono.start_at(mgmt, at(10)).unwrap();
        chrono.start_at(review, at(70)).unwrap();
        chrono.stop_at(at(100));
        config
    }

    #[test]
    fn show_prints_saved_totals() {
        let temp = tempfile::tempdir().unwrap();
        let config = saved_config(temp.path());

        let mut output = Vec::new();
        run(&mut output, &config, false).unwrap();

        let output = String::from_utf8(output).unwrap();
        assert_snapshot!(output, @r"
        Saved timers (schema 1, last change 2023-11-14T22:15:00Z)
        #   ID   State        Total  Name
        0   1    stopped   00:01:00  mgmt
        1   2    stopped   00:00:30  review
        Idle:  00:00:10
        Total: 00:01:30
        Events recorded: 13
        ");
    }

    #[test]
    fn show_json_output() {
        let temp = tempfile::tempdir().unwrap();
        let config = saved_config(temp.path());

        let mut output = Vec::new();
        run(&mut output, &config, true).unwrap();

        let value: serde_json::Value = serde_json::from_slice(&output).unwrap();
        assert_eq!(value["schema_version"], "1");
        assert_eq!(value["total"], "00:01:30");
        assert_eq!(value["timers"][0]["name"], "mgmt");
        assert_eq!(value["timers"][0]["total_ms"], 60_000);
        assert_eq!(value["timers"][1]["state"], "stopped");
        assert_eq!(value["last_change"], "2023-11-14T22:15:00Z");
    }

    #[test]
    fn show_without_saved_file() {
        let temp = tempfile::tempdir().unwrap();
        let config = Config {
            data_path: temp.path().join("missing.json"),
            save_to_file: true,
            default_timers: Vec::new(),
        };

        let mut output = Vec::new();
        run(&mut output, &config, true).unwrap();
        assert_eq!(String::from_utf8(output).unwrap(), "null\n");
    }

    #[test]
    fn report_saturates_huge_totals() {
        let chrono = Chronometer::new_at(at(0));
        chrono.add_at("mgmt", at(0));
        chrono.add_at("review", at(0));
        let mut value = serde_json::to_value(chrono.snapshot()).unwrap();
        let near_half = i64::MAX / 2 + 10;
        value["timer_list"][0]["total_ms"] = near_half.into();
        value["timer_list"][1]["total_ms"] = near_half.into();
        let snapshot: Snapshot = serde_json::from_value(value).unwrap();

        let report = build_report(&snapshot);
        assert_eq!(report.total, format_duration(TimeDelta::MAX));
        assert_eq!(report.timers[0].total_ms, near_half);
    }

    #[test]
    fn report_for_empty_snapshot() {
        let snapshot = Chronometer::new_at(at(0)).snapshot();
        let report = build_report(&snapshot);

        assert!(report.timers.is_empty());
        assert_eq!(report.events, 3);
        assert_eq!(report.total, "00:00:00");
        assert_eq!(report.last_change, Some(at(0)));
    }
}
