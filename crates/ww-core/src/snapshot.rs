//! Serializable mirror of a chronometer and the sink it is written to.

use serde::{Deserialize, Serialize};

use crate::stopwatch::StopWatch;

/// Version tag of the snapshot shape.
///
/// Bump whenever [`TimerState`](crate::TimerState) or [`Event`](crate::Event) changes.
pub const SCHEMA_VERSION: &str = "1";

/// Boxed error returned by snapshot sinks.
pub type SinkError = Box<dyn std::error::Error + Send + Sync>;

/// Full chronometer state, including every stopwatch's history.
///
/// This is a dump, not a transactional log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub schema_version: String,
    /// Next ID to hand out. Recomputed on restore if it lags behind the timers.
    #[serde(default)]
    pub next_id: u64,
    /// The idle ("tracking stopped") timer.
    pub stop_timer: StopWatch,
    /// Work timers in insertion order.
    #[serde(default)]
    pub timer_list: Vec<StopWatch>,
}

/// Destination for snapshots written after every mutation.
///
/// Failures are logged by the chronometer and never undo the mutation.
pub trait SnapshotSink: Send + Sync {
    fn persist(&self, snapshot: &Snapshot) -> Result<(), SinkError>;
}

impl<F> SnapshotSink for F
where
    F: Fn(&Snapshot) -> Result<(), SinkError> + Send + Sync,
{
    fn persist(&self, snapshot: &Snapshot) -> Result<(), SinkError> {
        self(snapshot)
    }
}
