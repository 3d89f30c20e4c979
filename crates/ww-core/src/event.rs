//! Stopwatch history records.

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

use crate::types::TimerState;

/// One executed state transition of a stopwatch.
///
/// Events are appended to a stopwatch's history and never modified.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    /// When the transition happened.
    pub timestamp: DateTime<Utc>,
    /// The state the stopwatch moved into.
    pub state: TimerState,
    /// Stopwatch name at the moment of the transition.
    pub name: String,
    /// Length of the interval this transition closed. Zero unless leaving `Started`.
    #[serde(rename = "run_duration_ms", with = "crate::duration::millis")]
    pub run_duration: TimeDelta,
    /// Accumulated total after the transition.
    #[serde(rename = "total_ms", with = "crate::duration::millis")]
    pub total: TimeDelta,
}
