//! Deterministic builders for sessions and results.

use chrono::{DateTime, Duration, TimeZone, Utc};
use std::collections::BTreeMap;

use suitelens_types::{TestOutcome, TestResult, TestSession};

/// Fixed reference instant shared by all fixtures.
pub fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 2, 12, 0, 0).unwrap()
}

/// Builder for a [`TestResult`] with sensible defaults: passed, one
/// second, started at [`base_time`], no captured output.
#[derive(Debug, Clone)]
pub struct ResultBuilder {
    inner: TestResult,
}

impl ResultBuilder {
    pub fn new(nodeid: &str) -> Self {
        Self {
            inner: TestResult {
                nodeid: nodeid.to_string(),
                outcome: TestOutcome::Passed,
                start_time: base_time(),
                duration: 1.0,
                log: String::new(),
                stdout: String::new(),
                stderr: String::new(),
                long_repr: String::new(),
                has_warning: false,
                unreliable: false,
            },
        }
    }

    pub fn outcome(mut self, outcome: TestOutcome) -> Self {
        self.inner.outcome = outcome;
        self
    }

    /// Start the result `secs` seconds after [`base_time`].
    pub fn start_offset_secs(mut self, secs: i64) -> Self {
        self.inner.start_time = base_time() + Duration::seconds(secs);
        self
    }

    pub fn at(mut self, ts: DateTime<Utc>) -> Self {
        self.inner.start_time = ts;
        self
    }

    pub fn duration(mut self, secs: f64) -> Self {
        self.inner.duration = secs;
        self
    }

    pub fn log(mut self, text: &str) -> Self {
        self.inner.log = text.to_string();
        self
    }

    pub fn stdout(mut self, text: &str) -> Self {
        self.inner.stdout = text.to_string();
        self
    }

    pub fn stderr(mut self, text: &str) -> Self {
        self.inner.stderr = text.to_string();
        self
    }

    pub fn long_repr(mut self, text: &str) -> Self {
        self.inner.long_repr = text.to_string();
        self
    }

    pub fn warning(mut self) -> Self {
        self.inner.has_warning = true;
        self
    }

    pub fn unreliable(mut self) -> Self {
        self.inner.unreliable = true;
        self
    }

    pub fn build(self) -> TestResult {
        self.inner
    }
}

/// Builder for a [`TestSession`]. Defaults to a one-minute session
/// starting at [`base_time`].
#[derive(Debug, Clone)]
pub struct SessionBuilder {
    session_id: String,
    sut_name: String,
    start: DateTime<Utc>,
    stop: Option<DateTime<Utc>>,
    tags: BTreeMap<String, String>,
    results: Vec<TestResult>,
}

impl SessionBuilder {
    pub fn new(session_id: &str, sut_name: &str) -> Self {
        Self {
            session_id: session_id.to_string(),
            sut_name: sut_name.to_string(),
            start: base_time(),
            stop: None,
            tags: BTreeMap::new(),
            results: Vec::new(),
        }
    }

    pub fn started_at(mut self, ts: DateTime<Utc>) -> Self {
        self.start = ts;
        self
    }

    /// Start the session `secs` seconds after [`base_time`].
    pub fn start_offset_secs(mut self, secs: i64) -> Self {
        self.start = base_time() + Duration::seconds(secs);
        self
    }

    pub fn stopped_at(mut self, ts: DateTime<Utc>) -> Self {
        self.stop = Some(ts);
        self
    }

    pub fn tag(mut self, key: &str, value: &str) -> Self {
        self.tags.insert(key.to_string(), value.to_string());
        self
    }

    pub fn result(mut self, result: TestResult) -> Self {
        self.results.push(result);
        self
    }

    pub fn results<I>(mut self, results: I) -> Self
    where
        I: IntoIterator<Item = TestResult>,
    {
        self.results.extend(results);
        self
    }

    pub fn build(self) -> TestSession {
        let stop = self.stop.unwrap_or(self.start + Duration::seconds(60));
        TestSession::new(
            self.session_id,
            self.sut_name,
            self.start,
            stop,
            self.tags,
            self.results,
        )
    }
}
