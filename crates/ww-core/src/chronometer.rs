//! Mutually exclusive timers plus an idle timer behind a single lock.
//!
//! # Invariant
//!
//! Across the idle timer and every work timer, at most one stopwatch is
//! `Started`, and the idle timer runs exactly when no work timer does.
//!
//! # Thread Safety
//!
//! All state lives behind one [`Mutex`]. Every mutation and every multi-entry
//! read holds it for its whole duration, so readers never observe a
//! half-applied transition. Share a `Chronometer` by reference or `Arc`; it
//! never spawns threads or timers of its own.
//!
//! # Clock
//!
//! Mutations come in two forms: `start(id)` reads `Utc::now()` once, and
//! `start_at(id, now)` takes the caller's instant. Reads always take `now`.

use std::collections::HashSet;
use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, TimeDelta, Utc};
use thiserror::Error;

use crate::duration::{format_duration, sum_durations};
use crate::snapshot::{SCHEMA_VERSION, Snapshot, SnapshotSink};
use crate::stopwatch::StopWatch;
use crate::types::{TimerId, TimerState};

/// Name of the idle timer.
pub const IDLE_TIMER_NAME: &str = "tracking_stopped";

/// Largest `next_id` a restored snapshot may carry. Minting IDs one at a
/// time from here cannot reach `u64::MAX`.
pub const MAX_TIMER_ID: u64 = u64::MAX >> 1;

/// Chronometer operation errors.
///
/// None of these leave the chronometer modified.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ChronoError {
    /// A positional lookup was past the end of the timer list.
    #[error("index {index} is out of range, length is {len}")]
    IndexOutOfRange { index: usize, len: usize },

    /// No work timer carries this ID.
    #[error("no timer with id {id}")]
    UnknownTimer { id: TimerId },

    /// Removal was refused because the timer has time logged to it.
    #[error(
        "timer {name} has time logged to it: total {total}, state {state}; \
         removing it drops that time from the total"
    )]
    TimerHasLoggedTime {
        name: String,
        total: String,
        state: TimerState,
    },

    /// There is no timer to remove.
    #[error("there are no timers to remove")]
    NoTimers,

    /// The snapshot's timer IDs cannot be trusted.
    #[error("invalid snapshot: {reason}")]
    InvalidSnapshot { reason: String },

    /// The snapshot was written with a different schema.
    #[error("unsupported snapshot schema version {found}, expected {expected}")]
    SchemaMismatch {
        found: String,
        expected: &'static str,
    },
}

/// Owner of all stopwatches.
pub struct Chronometer {
    state: Mutex<Snapshot>,
    sink: Option<Box<dyn SnapshotSink>>,
}

impl fmt::Debug for Chronometer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Chronometer")
            .field("state", &*self.lock())
            .field("has_sink", &self.sink.is_some())
            .finish()
    }
}

impl Default for Chronometer {
    fn default() -> Self {
        Self::new()
    }
}

impl Chronometer {
    /// Creates a chronometer with no work timers and the idle timer running.
    pub fn new() -> Self {
        Self::new_at(Utc::now())
    }

    /// Creates a chronometer whose idle timer starts at `now`.
    pub fn new_at(now: DateTime<Utc>) -> Self {
        let mut stop_timer = StopWatch::new(TimerId::IDLE, IDLE_TIMER_NAME, now);
        stop_timer.state_change(TimerState::Started, now);
        Self::from_state(Snapshot {
            schema_version: SCHEMA_VERSION.to_string(),
            next_id: 1,
            stop_timer,
            timer_list: Vec::new(),
        })
    }

    /// Rebuilds a chronometer from a persisted snapshot.
    ///
    /// The idle timer must carry [`TimerId::IDLE`], work timer IDs must be
    /// unique and non-zero, and totals must not be negative; otherwise the
    /// snapshot is rejected with [`ChronoError::InvalidSnapshot`]. Every stopwatch moves to `Loaded`; an interval that was open when the
    /// snapshot was written is not credited. The idle timer then starts at
    /// `now`.
    pub fn restore(snapshot: Snapshot, now: DateTime<Utc>) -> Result<Self, ChronoError> {
        if snapshot.schema_version != SCHEMA_VERSION {
            return Err(ChronoError::SchemaMismatch {
                found: snapshot.schema_version,
                expected: SCHEMA_VERSION,
            });
        }

        let next_id = validate_ids(&snapshot)?;

        let mut snapshot = snapshot;
        snapshot.next_id = next_id;
        snapshot.stop_timer.state_change(TimerState::Loaded, now);
        for watch in &mut snapshot.timer_list {
            watch.state_change(TimerState::Loaded, now);
        }
        snapshot.stop_timer.state_change(TimerState::Started, now);

        tracing::debug!(
            timers = snapshot.timer_list.len(),
            next_id = snapshot.next_id,
            "restored chronometer"
        );
        Ok(Self::from_state(snapshot))
    }

    const fn from_state(state: Snapshot) -> Self {
        Self {
            state: Mutex::new(state),
            sink: None,
        }
    }

    /// Attaches a sink that receives a snapshot after every mutation.
    #[must_use]
    pub fn with_sink(mut self, sink: impl SnapshotSink + 'static) -> Self {
        self.sink = Some(Box::new(sink));
        self
    }

    fn lock(&self) -> MutexGuard<'_, Snapshot> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Best-effort write. The in-memory state is already committed.
    fn persist(&self, state: &Snapshot) {
        let Some(sink) = &self.sink else {
            return;
        };
        if let Err(err) = sink.persist(state) {
            tracing::error!(error = %err, "failed to persist chronometer snapshot");
        }
    }

    // ========== Mutations ==========

    /// Appends a stopped timer and returns its ID.
    pub fn add(&self, name: impl Into<String>) -> TimerId {
        self.add_at(name, Utc::now())
    }

    pub fn add_at(&self, name: impl Into<String>, now: DateTime<Utc>) -> TimerId {
        let mut state = self.lock();
        let id = TimerId::new(state.next_id);
        // Bounded by MAX_TIMER_ID at restore.
        state.next_id += 1;
        state.timer_list.push(StopWatch::new(id, name, now));
        tracing::debug!(%id, "timer added");
        self.persist(&state);
        id
    }

    /// Starts timer `id`, stopping the idle timer and every other timer.
    ///
    /// Starting the timer that is already running changes nothing.
    pub fn start(&self, id: TimerId) -> Result<(), ChronoError> {
        self.start_at(id, Utc::now())
    }

    pub fn start_at(&self, id: TimerId, now: DateTime<Utc>) -> Result<(), ChronoError> {
        let mut state = self.lock();
        let index = position(&state, id)?;
        if state.timer_list[index].is_running() {
            return Ok(());
        }

        state.stop_timer.state_change(TimerState::Stopped, now);
        for (i, watch) in state.timer_list.iter_mut().enumerate() {
            let target = if i == index {
                TimerState::Started
            } else {
                TimerState::Stopped
            };
            watch.state_change(target, now);
        }
        tracing::debug!(%id, "timer started");
        self.persist(&state);
        Ok(())
    }

    /// Goes idle: starts the idle timer and stops every work timer.
    pub fn stop(&self) {
        self.stop_at(Utc::now());
    }

    pub fn stop_at(&self, now: DateTime<Utc>) {
        let mut state = self.lock();
        if state.stop_timer.is_running() {
            return;
        }

        state.stop_timer.state_change(TimerState::Started, now);
        for watch in &mut state.timer_list {
            watch.state_change(TimerState::Stopped, now);
        }
        tracing::debug!("tracking stopped");
        self.persist(&state);
    }

    /// Renames timer `id`. Renames do not appear in the history.
    pub fn update_name(&self, id: TimerId, name: impl Into<String>) -> Result<(), ChronoError> {
        let mut state = self.lock();
        let index = position(&state, id)?;
        state.timer_list[index].set_name(name);
        tracing::debug!(%id, "timer renamed");
        self.persist(&state);
        Ok(())
    }

    /// Removes timer `id` and returns it, stopped.
    ///
    /// A timer with logged time is only removed when `force` is set; its time
    /// then leaves every aggregate. Removing the running timer starts the
    /// idle timer. Other timers keep their IDs.
    pub fn remove(&self, id: TimerId, force: bool) -> Result<StopWatch, ChronoError> {
        self.remove_at(id, force, Utc::now())
    }

    pub fn remove_at(
        &self,
        id: TimerId,
        force: bool,
        now: DateTime<Utc>,
    ) -> Result<StopWatch, ChronoError> {
        let mut state = self.lock();
        let index = position(&state, id)?;
        let removed = remove_index(&mut state, index, force, now)?;
        self.persist(&state);
        Ok(removed)
    }

    /// Removes the most recently added timer, under the same rules as [`Self::remove`].
    pub fn remove_last(&self, force: bool) -> Result<StopWatch, ChronoError> {
        self.remove_last_at(force, Utc::now())
    }

    pub fn remove_last_at(&self, force: bool, now: DateTime<Utc>) -> Result<StopWatch, ChronoError> {
        let mut state = self.lock();
        let Some(index) = state.timer_list.len().checked_sub(1) else {
            return Err(ChronoError::NoTimers);
        };
        let removed = remove_index(&mut state, index, force, now)?;
        self.persist(&state);
        Ok(removed)
    }

    // ========== Read projections ==========

    /// ID of the timer at display position `index`.
    pub fn id_at(&self, index: usize) -> Result<TimerId, ChronoError> {
        let state = self.lock();
        state
            .timer_list
            .get(index)
            .map(StopWatch::id)
            .ok_or(ChronoError::IndexOutOfRange {
                index,
                len: state.timer_list.len(),
            })
    }

    /// Current display position of timer `id`.
    pub fn index_of(&self, id: TimerId) -> Option<usize> {
        position(&self.lock(), id).ok()
    }

    pub fn len(&self) -> usize {
        self.lock().timer_list.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().timer_list.is_empty()
    }

    /// Whether the idle timer is running.
    pub fn is_idle(&self) -> bool {
        self.lock().stop_timer.is_running()
    }

    pub fn ids(&self) -> Vec<TimerId> {
        self.lock().timer_list.iter().map(StopWatch::id).collect()
    }

    pub fn names(&self) -> Vec<String> {
        self.lock()
            .timer_list
            .iter()
            .map(|w| w.name().to_string())
            .collect()
    }

    pub fn states(&self) -> Vec<TimerState> {
        self.lock().timer_list.iter().map(StopWatch::state).collect()
    }

    /// Formatted live totals, positionally aligned with [`Self::names`].
    pub fn totals(&self, now: DateTime<Utc>) -> Vec<String> {
        self.lock()
            .timer_list
            .iter()
            .map(|w| format_duration(w.live_total(now)))
            .collect()
    }

    /// Sum of every work timer's live total. Idle time is not included.
    pub fn total_duration(&self, now: DateTime<Utc>) -> TimeDelta {
        sum_durations(self.lock().timer_list.iter().map(|w| w.live_total(now)))
    }

    pub fn total(&self, now: DateTime<Utc>) -> String {
        format_duration(self.total_duration(now))
    }

    /// Live total of the idle timer.
    pub fn stop_total_duration(&self, now: DateTime<Utc>) -> TimeDelta {
        self.lock().stop_timer.live_total(now)
    }

    pub fn stop_total(&self, now: DateTime<Utc>) -> String {
        format_duration(self.stop_total_duration(now))
    }

    /// Consistent copy of the full state.
    pub fn snapshot(&self) -> Snapshot {
        self.lock().clone()
    }
}

/// Checks restored IDs and totals, returning the repaired `next_id`.
fn validate_ids(snapshot: &Snapshot) -> Result<u64, ChronoError> {
    let invalid = |reason: String| ChronoError::InvalidSnapshot { reason };

    if snapshot.stop_timer.id() != TimerId::IDLE {
        return Err(invalid(format!(
            "idle timer has id {}, expected {}",
            snapshot.stop_timer.id(),
            TimerId::IDLE
        )));
    }

    for watch in std::iter::once(&snapshot.stop_timer).chain(&snapshot.timer_list) {
        if watch.total() < TimeDelta::zero() {
            return Err(invalid(format!("timer {} has a negative total", watch.id())));
        }
    }

    let mut seen = HashSet::new();
    for watch in &snapshot.timer_list {
        let id = watch.id();
        if id == TimerId::IDLE {
            return Err(invalid(format!(
                "timer {} uses the reserved idle id {id}",
                watch.name()
            )));
        }
        if !seen.insert(id) {
            return Err(invalid(format!("duplicate timer id {id}")));
        }
    }

    let max_id = snapshot
        .timer_list
        .iter()
        .map(|w| w.id().value())
        .max()
        .unwrap_or(TimerId::IDLE.value());
    max_id
        .checked_add(1)
        .map(|next| next.max(snapshot.next_id))
        .filter(|&next| next <= MAX_TIMER_ID)
        .ok_or_else(|| invalid(format!("timer id space exhausted (largest id {max_id})")))
}

fn position(state: &Snapshot, id: TimerId) -> Result<usize, ChronoError> {
    state
        .timer_list
        .iter()
        .position(|w| w.id() == id)
        .ok_or(ChronoError::UnknownTimer { id })
}

fn remove_index(
    state: &mut Snapshot,
    index: usize,
    force: bool,
    now: DateTime<Utc>,
) -> Result<StopWatch, ChronoError> {
    let watch = &state.timer_list[index];
    let logged = watch.live_total(now);
    if !force && logged > TimeDelta::zero() {
        return Err(ChronoError::TimerHasLoggedTime {
            name: watch.name().to_string(),
            total: format_duration(logged),
            state: watch.state(),
        });
    }

    let mut removed = state.timer_list.remove(index);
    let was_running = removed.is_running();
    removed.state_change(TimerState::Stopped, now);
    if was_running {
        state.stop_timer.state_change(TimerState::Started, now);
    }
    tracing::debug!(id = %removed.id(), force, "timer removed");
    Ok(removed)
}
