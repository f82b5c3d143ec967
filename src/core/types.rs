/*!
 * Core Types
 * Time representations and identifiers shared across the pipeline
 */

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Sub};
use uuid::Uuid;

/// Milliseconds elapsed since the pipeline time origin
///
/// This is the clock every timer and every instrumentation input is expressed in.
#[derive(Debug, Clone, Copy, Default, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RelativeTime(pub f64);

/// Milliseconds since the Unix epoch
#[derive(Debug, Clone, Copy, Default, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TimeStamp(pub f64);

/// Duration in nanoseconds, the unit used on the wire
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ServerDuration(pub i64);

impl RelativeTime {
    pub const ZERO: RelativeTime = RelativeTime(0.0);

    #[inline]
    pub fn millis(self) -> f64 {
        self.0
    }
}

impl Add<f64> for RelativeTime {
    type Output = RelativeTime;

    fn add(self, millis: f64) -> Self::Output {
        RelativeTime(self.0 + millis)
    }
}

impl Sub for RelativeTime {
    type Output = f64;

    fn sub(self, other: RelativeTime) -> f64 {
        self.0 - other.0
    }
}

impl fmt::Display for RelativeTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}ms", self.0)
    }
}

impl ServerDuration {
    /// Convert a millisecond measure to wire nanoseconds
    #[inline]
    pub fn from_millis(millis: f64) -> Self {
        ServerDuration((millis * 1_000_000.0).round() as i64)
    }
}

/// A point in time expressed on both clocks
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ClocksState {
    pub relative: RelativeTime,
    pub time_stamp: TimeStamp,
}

impl ClocksState {
    /// Build clocks for a relative time given the epoch of the time origin
    #[inline]
    pub fn at(relative: RelativeTime, time_origin: TimeStamp) -> Self {
        Self {
            relative,
            time_stamp: TimeStamp(time_origin.0 + relative.0),
        }
    }
}

/// Elapsed milliseconds between two relative times
#[inline]
pub fn elapsed(start: RelativeTime, end: RelativeTime) -> f64 {
    end - start
}

/// Identifier of a view
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ViewId(pub String);

/// Identifier of an action
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActionId(pub String);

impl ViewId {
    pub fn generate() -> Self {
        ViewId(Uuid::new_v4().to_string())
    }
}

impl ActionId {
    pub fn generate() -> Self {
        ActionId(Uuid::new_v4().to_string())
    }
}

impl fmt::Display for ViewId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for ActionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Free-form JSON object used for global and customer contexts
pub type Context = serde_json::Map<String, serde_json::Value>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_duration_conversion() {
        assert_eq!(ServerDuration::from_millis(80.0), ServerDuration(80_000_000));
        assert_eq!(ServerDuration::from_millis(0.5), ServerDuration(500_000));
    }

    #[test]
    fn test_clocks_at() {
        let clocks = ClocksState::at(RelativeTime(250.0), TimeStamp(1_000_000.0));
        assert_eq!(clocks.time_stamp, TimeStamp(1_000_250.0));
        assert_eq!(clocks.relative, RelativeTime(250.0));
    }

    #[test]
    fn test_elapsed() {
        assert_eq!(elapsed(RelativeTime(100.0), RelativeTime(180.0)), 80.0);
    }

    #[test]
    fn test_generated_ids_are_unique() {
        assert_ne!(ViewId::generate(), ViewId::generate());
        assert_ne!(ActionId::generate(), ActionId::generate());
    }
}
