use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::outcome::TestOutcome;
use crate::timestamp;

/// A single execution of one test case within a session.
///
/// `nodeid` is the stable identifier used as the join key across sessions.
/// The value is immutable after capture; the owning session holds it
/// exclusively and the engines only ever read it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestResult {
    /// Stable test identifier.
    pub nodeid: String,
    pub outcome: TestOutcome,
    #[serde(with = "timestamp")]
    pub start_time: DateTime<Utc>,
    /// Wall-clock duration in seconds, never negative.
    pub duration: f64,
    /// Captured log output.
    #[serde(default)]
    pub log: String,
    /// Captured standard output.
    #[serde(default)]
    pub stdout: String,
    /// Captured standard error.
    #[serde(default)]
    pub stderr: String,
    /// Failure detail text; empty unless the test failed or errored.
    #[serde(default)]
    pub long_repr: String,
    #[serde(default)]
    pub has_warning: bool,
    /// Capture-side flag for tests with inconsistent historical outcomes,
    /// independent of rerun grouping.
    #[serde(default)]
    pub unreliable: bool,
}

impl TestResult {
    /// Instant the execution finished, derived from start time and duration.
    pub fn stop_time(&self) -> DateTime<Utc> {
        self.start_time + Duration::milliseconds((self.duration * 1000.0) as i64)
    }
}
