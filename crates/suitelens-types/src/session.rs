use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::rerun::{RerunTestGroup, group_reruns};
use crate::result::TestResult;
use crate::timestamp;

/// One complete test-suite execution against a named system under test.
///
/// A session owns its results and rerun groups exclusively. It is produced
/// once by the capture collaborator and read-only afterwards: the query,
/// comparison, and analytics engines never edit a session in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestSession {
    pub session_id: String,
    /// Name of the system under test this session exercised.
    pub sut_name: String,
    #[serde(with = "timestamp")]
    pub session_start_time: DateTime<Utc>,
    #[serde(with = "timestamp")]
    pub session_stop_time: DateTime<Utc>,
    /// Derived from start/stop at construction; stored for serialization.
    #[serde(default)]
    pub session_duration: f64,
    #[serde(default)]
    pub session_tags: BTreeMap<String, String>,
    /// Results in capture order.
    #[serde(default)]
    pub test_results: Vec<TestResult>,
    /// Derived: one group per nodeid that ran more than once.
    #[serde(default)]
    pub rerun_test_groups: Vec<RerunTestGroup>,
}

impl TestSession {
    /// Build a session from captured results, deriving duration and rerun
    /// groups.
    pub fn new(
        session_id: impl Into<String>,
        sut_name: impl Into<String>,
        session_start_time: DateTime<Utc>,
        session_stop_time: DateTime<Utc>,
        session_tags: BTreeMap<String, String>,
        test_results: Vec<TestResult>,
    ) -> Self {
        let rerun_test_groups = group_reruns(&test_results);
        let session_duration =
            (session_stop_time - session_start_time).num_milliseconds() as f64 / 1000.0;
        Self {
            session_id: session_id.into(),
            sut_name: sut_name.into(),
            session_start_time,
            session_stop_time,
            session_duration,
            session_tags,
            test_results,
            rerun_test_groups,
        }
    }

    /// Whether any result in this session raised a warning.
    pub fn has_warnings(&self) -> bool {
        self.test_results.iter().any(|t| t.has_warning)
    }

    /// Whether any nodeid in this session was rerun.
    pub fn has_reruns(&self) -> bool {
        !self.rerun_test_groups.is_empty()
    }
}
