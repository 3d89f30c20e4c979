//! Duration display and serialization helpers.

use chrono::TimeDelta;

/// Formats a duration as `HH:MM:SS`, rounded to the nearest second.
///
/// Hours are unbounded (`125:03:07`). Negative durations display as zero.
pub fn format_duration(duration: TimeDelta) -> String {
    let ms = duration.num_milliseconds().max(0);
    let secs = ms.saturating_add(500) / 1000;
    let hours = secs / 3600;
    let minutes = (secs % 3600) / 60;
    let seconds = secs % 60;
    format!("{hours:02}:{minutes:02}:{seconds:02}")
}

/// Adds two durations, clamping at [`TimeDelta::MIN`] and [`TimeDelta::MAX`].
pub fn saturating_add(lhs: TimeDelta, rhs: TimeDelta) -> TimeDelta {
    lhs.checked_add(&rhs).unwrap_or(if rhs < TimeDelta::zero() {
        TimeDelta::MIN
    } else {
        TimeDelta::MAX
    })
}

/// Sums durations without overflowing.
pub fn sum_durations(durations: impl IntoIterator<Item = TimeDelta>) -> TimeDelta {
    durations
        .into_iter()
        .fold(TimeDelta::zero(), saturating_add)
}

/// Serializes a [`TimeDelta`] as integer milliseconds.
pub(crate) mod millis {
    use chrono::TimeDelta;
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(duration: &TimeDelta, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_i64(duration.num_milliseconds())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<TimeDelta, D::Error>
    where
        D: Deserializer<'de>,
    {
        let ms = i64::deserialize(deserializer)?;
        TimeDelta::try_milliseconds(ms)
            .ok_or_else(|| D::Error::custom(format!("duration out of range: {ms}ms")))
    }
}
