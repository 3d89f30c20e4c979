//! Run command: the interactive tracking session.

use std::io::{BufRead, Write};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use ww_core::Chronometer;
use ww_store::JsonStore;

use crate::Config;
use crate::shell::Shell;

/// Runs an interactive session until `quit` or end of input.
pub fn run<R: BufRead, W: Write>(
    input: R,
    output: &mut W,
    config: &Config,
    resume: bool,
) -> Result<()> {
    let chrono = build_chronometer(config, resume, Utc::now())?;
    Shell::new(&chrono, Utc::now).run(input, output)
}

/// Builds the session's chronometer and attaches the snapshot store.
///
/// With `resume`, the saved snapshot is restored if there is one; otherwise
/// the configured default timers are created.
pub fn build_chronometer(config: &Config, resume: bool, now: DateTime<Utc>) -> Result<Chronometer> {
    let store = JsonStore::new(&config.data_path);

    let saved = if resume {
        store
            .load()
            .with_context(|| format!("failed to load {}", config.data_path.display()))?
    } else {
        None
    };

    let chrono = if let Some(snapshot) = saved {
        tracing::info!(path = %config.data_path.display(), "resuming saved timers");
        Chronometer::restore(snapshot, now).context("failed to restore saved timers")?
    } else {
        if resume {
            tracing::info!(path = %config.data_path.display(), "no saved timers, starting fresh");
        }
        let chrono = Chronometer::new_at(now);
        for name in &config.default_timers {
            chrono.add_at(name.as_str(), now);
        }
        chrono
    };

    if config.save_to_file {
        Ok(chrono.with_sink(store))
    } else {
        Ok(chrono)
    }
}

#[cfg(test)]
mod tests {
    use ww_core::TimerState;

    use super::*;

    fn at(secs: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000 + secs, 0).unwrap()
    }

    fn config_in(dir: &std::path::Path, save_to_file: bool) -> Config {
        Config {
            data_path: dir.join("chronometer.json"),
            save_to_file,
            default_timers: vec!["mgmt".to_string(), "review".to_string()],
        }
    }

    #[test]
    fn fresh_session_creates_default_timers() {
        let temp = tempfile::tempdir().unwrap();
        let config = config_in(temp.path(), true);

        let chrono = build_chronometer(&config, false, at(0)).unwrap();

        assert_eq!(chrono.names(), vec!["mgmt", "review"]);
        assert!(chrono.is_idle());
    }

    #[test]
    fn mutations_are_saved_when_enabled() {
        let temp = tempfile::tempdir().unwrap();
        let config = config_in(temp.path(), true);

        let chrono = build_chronometer(&config, false, at(0)).unwrap();
        let id = chrono.id_at(0).unwrap();
        chrono.start_at(id, at(1)).unwrap();

        let saved = JsonStore::new(&config.data_path).load().unwrap().unwrap();
        assert_eq!(saved, chrono.snapshot());
    }

    #[test]
    fn nothing_is_saved_when_disabled() {
        let temp = tempfile::tempdir().unwrap();
        let config = config_in(temp.path(), false);

        let chrono = build_chronometer(&config, false, at(0)).unwrap();
        chrono.stop_at(at(1));
        chrono.add_at("extra", at(2));

        assert!(!config.data_path.exists());
    }

    #[test]
    fn resume_restores_saved_timers() {
        let temp = tempfile::tempdir().unwrap();
        let config = config_in(temp.path(), true);

        let first = build_chronometer(&config, false, at(0)).unwrap();
        let id = first.id_at(1).unwrap();
        first.start_at(id, at(0)).unwrap();
        first.stop_at(at(90));
        first.update_name(id, "code review").unwrap();
        drop(first);

        let resumed = build_chronometer(&config, true, at(500)).unwrap();
        assert_eq!(resumed.names(), vec!["mgmt", "code review"]);
        assert_eq!(resumed.states(), vec![TimerState::Loaded; 2]);
        assert_eq!(resumed.totals(at(600)), vec!["00:00:00", "00:01:30"]);
    }

    #[test]
    fn resume_without_saved_file_starts_fresh() {
        let temp = tempfile::tempdir().unwrap();
        let config = config_in(temp.path(), true);

        let chrono = build_chronometer(&config, true, at(0)).unwrap();
        assert_eq!(chrono.names(), vec!["mgmt", "review"]);
    }

    #[test]
    fn resume_with_corrupt_file_fails() {
        let temp = tempfile::tempdir().unwrap();
        let config = config_in(temp.path(), true);
        std::fs::write(&config.data_path, "[]").unwrap();

        let err = build_chronometer(&config, true, at(0)).unwrap_err();
        assert!(err.to_string().starts_with("failed to load"));
    }
}
