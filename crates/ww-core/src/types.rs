//! Core type definitions with validation.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Validation errors for core types.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// The provided value was empty.
    #[error("{field} cannot be empty")]
    Empty { field: &'static str },

    /// Unknown timer state string.
    #[error("invalid timer state: {value}")]
    InvalidTimerState { value: String },

    /// Timer ID that is not a non-negative integer.
    #[error("invalid timer id: {value}")]
    InvalidTimerId { value: String },
}

/// Opaque identifier of a stopwatch within a chronometer.
///
/// IDs are minted in increasing order and never reused, so removing one timer
/// never changes how any other timer is addressed. The idle timer always
/// carries [`TimerId::IDLE`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TimerId(u64);

impl TimerId {
    /// ID of the idle ("tracking stopped") timer.
    pub const IDLE: Self = Self(0);

    /// Wraps a raw ID value.
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Returns the raw ID value.
    #[must_use]
    pub const fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for TimerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for TimerId {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(ValidationError::Empty { field: "timer id" });
        }
        s.parse::<u64>()
            .map(Self)
            .map_err(|_| ValidationError::InvalidTimerId {
                value: s.to_string(),
            })
    }
}

/// Lifecycle state of a stopwatch.
///
/// If this changes the snapshot schema version should be bumped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerState {
    /// Bootstrap state, immediately followed by `Stopped`.
    Created,
    /// The stopwatch is accumulating time.
    Started,
    /// The stopwatch is not accumulating time.
    Stopped,
    /// The stopwatch was rebuilt from a snapshot and has not moved since.
    Loaded,
}

impl TimerState {
    /// String representation used in snapshots and output.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Started => "started",
            Self::Stopped => "stopped",
            Self::Loaded => "loaded",
        }
    }
}

impl fmt::Display for TimerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for TimerState {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "created" => Ok(Self::Created),
            "started" => Ok(Self::Started),
            "stopped" => Ok(Self::Stopped),
            "loaded" => Ok(Self::Loaded),
            _ => Err(ValidationError::InvalidTimerState {
                value: s.to_string(),
            }),
        }
    }
}
