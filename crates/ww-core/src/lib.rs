//! Core domain logic for workwinder.
//!
//! This crate contains:
//! - `StopWatch`: a named time accumulator with an append-only event history
//! - `Chronometer`: mutually exclusive stopwatches plus an idle timer
//! - Snapshots: the persisted shape and the sink it is handed to
//! - Duration formatting for display

mod chronometer;
mod duration;
pub mod event;
pub mod snapshot;
mod stopwatch;
pub mod types;

pub use chronometer::{ChronoError, Chronometer, IDLE_TIMER_NAME, MAX_TIMER_ID};
pub use duration::{format_duration, saturating_add, sum_durations};
pub use event::Event;
pub use snapshot::{SCHEMA_VERSION, SinkError, Snapshot, SnapshotSink};
pub use stopwatch::StopWatch;
pub use types::{TimerId, TimerState, ValidationError};
