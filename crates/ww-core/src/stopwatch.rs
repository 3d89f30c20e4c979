//! A single named time accumulator and its state machine.

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

use crate::duration::saturating_add;
use crate::event::Event;
use crate::types::{TimerId, TimerState};

/// A named accumulator of elapsed time.
///
/// `start_timestamp` is `Some` exactly when the state is `Started`. The
/// accumulated `total` only grows, and only when leaving `Started`.
///
/// Stopwatches are mutated only through their owning
/// [`Chronometer`](crate::Chronometer).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StopWatch {
    id: TimerId,
    name: String,
    #[serde(rename = "total_ms", with = "crate::duration::millis")]
    total: TimeDelta,
    state: TimerState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    start_timestamp: Option<DateTime<Utc>>,
    #[serde(default)]
    history: Vec<Event>,
}

impl StopWatch {
    /// Creates a stopwatch, recording the `Created` bootstrap event followed
    /// by the transition into `Stopped`.
    pub(crate) fn new(id: TimerId, name: impl Into<String>, now: DateTime<Utc>) -> Self {
        let mut watch = Self {
            id,
            name: name.into(),
            total: TimeDelta::zero(),
            state: TimerState::Created,
            start_timestamp: None,
            history: Vec::new(),
        };
        watch.record(now, TimeDelta::zero());
        watch.state_change(TimerState::Stopped, now);
        watch
    }

    pub const fn id(&self) -> TimerId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Accumulated time of closed intervals, excluding any open one.
    pub const fn total(&self) -> TimeDelta {
        self.total
    }

    pub const fn state(&self) -> TimerState {
        self.state
    }

    /// When the current `Started` interval began.
    pub const fn start_timestamp(&self) -> Option<DateTime<Utc>> {
        self.start_timestamp
    }

    pub fn history(&self) -> &[Event] {
        &self.history
    }

    pub const fn is_running(&self) -> bool {
        self.start_timestamp.is_some()
    }

    /// Total including the open interval, as seen at `now`.
    ///
    /// Never mutates the stopwatch, so polling for display cannot perturb
    /// recorded totals.
    pub fn live_total(&self, now: DateTime<Utc>) -> TimeDelta {
        match self.start_timestamp {
            Some(start) => saturating_add(self.total, (now - start).max(TimeDelta::zero())),
            None => self.total,
        }
    }

    /// Renames the stopwatch. Renames are not recorded in the history.
    pub(crate) fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Moves the stopwatch into `target`, recording an event.
    ///
    /// Returns `false` without recording anything when already in `target`.
    pub(crate) fn state_change(&mut self, target: TimerState, now: DateTime<Utc>) -> bool {
        if self.state == target {
            return false;
        }

        let mut run_duration = TimeDelta::zero();
        match target {
            TimerState::Started => {
                self.start_timestamp = Some(now);
            }
            TimerState::Stopped => {
                if let Some(start) = self.start_timestamp.take() {
                    run_duration = now - start;
                    if run_duration < TimeDelta::zero() {
                        tracing::warn!(
                            id = %self.id,
                            %start,
                            %now,
                            "clock moved backwards, interval counted as zero"
                        );
                        run_duration = TimeDelta::zero();
                    }
                    self.total = saturating_add(self.total, run_duration);
                }
            }
            TimerState::Created | TimerState::Loaded => {
                // An interval left open by a previous process cannot be closed
                // with a trustworthy end time.
                if let Some(start) = self.start_timestamp.take() {
                    tracing::warn!(id = %self.id, %start, "discarding open interval");
                }
            }
        }

        tracing::debug!(id = %self.id, from = %self.state, to = %target, "state change");
        self.state = target;
        self.record(now, run_duration);
        true
    }

    fn record(&mut self, now: DateTime<Utc>, run_duration: TimeDelta) {
        self.history.push(Event {
            timestamp: now,
            state: self.state,
            name: self.name.clone(),
            run_duration,
            total: self.total,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(secs: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000 + secs, 0).unwrap()
    }

    fn history_states(watch: &StopWatch) -> Vec<TimerState> {
        watch.history().iter().map(|e| e.state).collect()
    }

    #[test]
    fn new_records_created_then_stopped() {
        let watch = StopWatch::new(TimerId::new(1), "docs", at(0));

        assert_eq!(watch.state(), TimerState::Stopped);
        assert_eq!(watch.start_timestamp(), None);
        assert_eq!(watch.total(), TimeDelta::zero());
        assert_eq!(
            history_states(&watch),
            vec![TimerState::Created, TimerState::Stopped]
        );
    }

    #[test]
    fn start_then_stop_accumulates_exact_interval() {
        let mut watch = StopWatch::new(TimerId::new(1), "docs", at(0));

        assert!(watch.state_change(TimerState::Started, at(10)));
        assert_eq!(watch.start_timestamp(), Some(at(10)));
        assert!(watch.state_change(TimerState::Stopped, at(25)));

        assert_eq!(watch.total(), TimeDelta::seconds(15));
        assert_eq!(watch.start_timestamp(), None);

        let last = watch.history().last().unwrap();
        assert_eq!(last.state, TimerState::Stopped);
        assert_eq!(last.run_duration, TimeDelta::seconds(15));
        assert_eq!(last.total, TimeDelta::seconds(15));
    }

    #[test]
    fn repeated_target_is_noop() {
        let mut watch = StopWatch::new(TimerId::new(1), "docs", at(0));
        watch.state_change(TimerState::Started, at(10));
        watch.state_change(TimerState::Stopped, at(20));
        let events = watch.history().len();

        assert!(!watch.state_change(TimerState::Stopped, at(30)));
        assert_eq!(watch.history().len(), events);
        assert_eq!(watch.total(), TimeDelta::seconds(10));
    }

    #[test]
    fn second_start_keeps_original_start() {
        let mut watch = StopWatch::new(TimerId::new(1), "docs", at(0));
        watch.state_change(TimerState::Started, at(10));
        watch.state_change(TimerState::Started, at(50));

        assert_eq!(watch.start_timestamp(), Some(at(10)));
    }

    #[test]
    fn live_total_does_not_mutate() {
        let mut watch = StopWatch::new(TimerId::new(1), "docs", at(0));
        watch.state_change(TimerState::Started, at(100));
        let before = watch.clone();

        assert_eq!(watch.live_total(at(160)), TimeDelta::seconds(60));
        assert_eq!(watch.live_total(at(100)), TimeDelta::zero());
        assert_eq!(watch, before);
    }

    #[test]
    fn live_total_of_stopped_watch_is_total() {
        let mut watch = StopWatch::new(TimerId::new(1), "docs", at(0));
        watch.state_change(TimerState::Started, at(0));
        watch.state_change(TimerState::Stopped, at(30));

        assert_eq!(watch.live_total(at(1000)), TimeDelta::seconds(30));
    }

    #[test]
    fn backwards_clock_adds_nothing() {
        let mut watch = StopWatch::new(TimerId::new(1), "docs", at(0));
        watch.state_change(TimerState::Started, at(100));
        watch.state_change(TimerState::Stopped, at(90));

        assert_eq!(watch.total(), TimeDelta::zero());
        assert_eq!(watch.live_total(at(50)), TimeDelta::zero());
    }

    #[test]
    fn total_saturates_near_max() {
        let mut watch = StopWatch::new(TimerId::new(1), "docs", at(0));
        watch.total = TimeDelta::MAX - TimeDelta::seconds(5);
        watch.state_change(TimerState::Started, at(0));

        assert_eq!(watch.live_total(at(60)), TimeDelta::MAX);
        watch.state_change(TimerState::Stopped, at(60));
        assert_eq!(watch.total(), TimeDelta::MAX);
    }

    #[test]
    fn loaded_discards_open_interval() {
        let mut watch = StopWatch::new(TimerId::new(1), "docs", at(0));
        watch.state_change(TimerState::Started, at(0));
        watch.state_change(TimerState::Stopped, at(20));
        watch.state_change(TimerState::Started, at(30));

        assert!(watch.state_change(TimerState::Loaded, at(500)));
        assert_eq!(watch.state(), TimerState::Loaded);
        assert_eq!(watch.start_timestamp(), None);
        assert_eq!(watch.total(), TimeDelta::seconds(20));

        // Leaving Loaded contributes nothing.
        watch.state_change(TimerState::Stopped, at(600));
        assert_eq!(watch.total(), TimeDelta::seconds(20));
    }

    #[test]
    fn events_capture_name_at_transition() {
        let mut watch = StopWatch::new(TimerId::new(1), "draft", at(0));
        watch.set_name("final");
        watch.state_change(TimerState::Started, at(5));

        let names: Vec<&str> = watch.history().iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["draft", "draft", "final"]);
    }

    #[test]
    fn stopwatch_serde_roundtrip() {
        let mut watch = StopWatch::new(TimerId::new(3), "docs", at(0));
        watch.state_change(TimerState::Started, at(1));

        let json = serde_json::to_string(&watch).unwrap();
        let parsed: StopWatch = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, watch);
    }
}
