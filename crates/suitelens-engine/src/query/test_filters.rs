use std::collections::BTreeMap;

use regex::Regex;
use serde::Serialize;

use suitelens_types::{TestOutcome, TestResult, TestSession};

use crate::error::{Error, Result};

use super::{SessionFilter, SessionQuery};

/// Text fields a pattern filter may target. Fixed allow-list; anything
/// else is rejected at construction or deserialization time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextField {
    NodeId,
    Log,
    Stdout,
    Stderr,
    LongRepr,
}

impl TextField {
    pub(crate) fn as_str(self) -> &'static str {
        match self {
            TextField::NodeId => "nodeid",
            TextField::Log => "log",
            TextField::Stdout => "stdout",
            TextField::Stderr => "stderr",
            TextField::LongRepr => "long_repr",
        }
    }

    pub(crate) fn parse(raw: &str) -> Result<Self> {
        match raw {
            "nodeid" => Ok(TextField::NodeId),
            "log" => Ok(TextField::Log),
            "stdout" => Ok(TextField::Stdout),
            "stderr" => Ok(TextField::Stderr),
            "long_repr" => Ok(TextField::LongRepr),
            other => Err(Error::InvalidFilterKind(format!(
                "unknown text field: {other}"
            ))),
        }
    }

    fn value(self, test: &TestResult) -> &str {
        match self {
            TextField::NodeId => &test.nodeid,
            TextField::Log => &test.log,
            TextField::Stdout => &test.stdout,
            TextField::Stderr => &test.stderr,
            TextField::LongRepr => &test.long_repr,
        }
    }
}

pub(crate) fn duration_bounds(min: f64, max: f64) -> Result<(f64, f64)> {
    if !(min >= 0.0) {
        return Err(Error::InvalidFilterKind(
            "duration min must be >= 0".to_string(),
        ));
    }
    if !(max >= min) {
        return Err(Error::InvalidFilterKind(
            "duration max must be >= min".to_string(),
        ));
    }
    Ok((min, max))
}

pub(crate) fn compile_regex(pattern: &str) -> Result<Regex> {
    Regex::new(pattern)
        .map_err(|err| Error::InvalidFilterKind(format!("invalid regex {pattern:?}: {err}")))
}

/// Test-level predicate, one variant per filter kind.
///
/// Substring and regex matching are case-sensitive, unlike SUT matching:
/// captured output and nodeids are compared verbatim.
#[derive(Debug, Clone)]
pub(crate) enum TestFilter {
    Substring { field: TextField, pattern: String },
    Regex { field: TextField, pattern: String, regex: Regex },
    Duration { min: f64, max: f64 },
    Outcome(TestOutcome),
    HasWarning,
    Unreliable,
}

impl TestFilter {
    pub(crate) fn matches(&self, test: &TestResult) -> bool {
        match self {
            TestFilter::Substring { field, pattern } => field.value(test).contains(pattern),
            TestFilter::Regex { field, regex, .. } => regex.is_match(field.value(test)),
            TestFilter::Duration { min, max } => test.duration >= *min && test.duration <= *max,
            TestFilter::Outcome(outcome) => test.outcome == *outcome,
            TestFilter::HasWarning => test.has_warning,
            TestFilter::Unreliable => test.unreliable,
        }
    }
}

/// Builder for test-level predicates bound to a parent [`SessionQuery`].
///
/// Test-level filtering is a session selector, not a test extractor:
/// [`TestQuery::apply`] keeps a session iff at least one test satisfies
/// every registered predicate, and kept sessions come back with their
/// full original test list so downstream comparison and trend logic keeps
/// cross-test correlation intact.
#[derive(Debug)]
pub struct TestQuery {
    query: SessionQuery,
    filters: Vec<TestFilter>,
}

impl TestQuery {
    pub(crate) fn new(query: SessionQuery) -> Self {
        Self {
            query,
            filters: Vec::new(),
        }
    }

    /// Match tests whose nodeid contains the pattern.
    pub fn with_name(self, pattern: &str) -> Result<Self> {
        self.with_pattern(pattern, TextField::NodeId)
    }

    /// Match tests whose chosen field contains the pattern.
    pub fn with_pattern(mut self, pattern: &str, field: TextField) -> Result<Self> {
        if pattern.is_empty() {
            return Err(Error::InvalidFilterKind(
                "pattern must be non-empty".to_string(),
            ));
        }
        self.filters.push(TestFilter::Substring {
            field,
            pattern: pattern.to_string(),
        });
        Ok(self)
    }

    /// Match tests whose chosen field satisfies a regex search.
    pub fn with_regex(mut self, pattern: &str, field: TextField) -> Result<Self> {
        if pattern.is_empty() {
            return Err(Error::InvalidFilterKind(
                "pattern must be non-empty".to_string(),
            ));
        }
        let regex = compile_regex(pattern)?;
        self.filters.push(TestFilter::Regex {
            field,
            pattern: pattern.to_string(),
            regex,
        });
        Ok(self)
    }

    /// Match tests whose duration lies inside the inclusive range.
    pub fn with_duration(mut self, min: f64, max: f64) -> Result<Self> {
        let (min, max) = duration_bounds(min, max)?;
        self.filters.push(TestFilter::Duration { min, max });
        Ok(self)
    }

    /// Match tests with the given outcome.
    pub fn with_outcome(mut self, outcome: TestOutcome) -> Self {
        self.filters.push(TestFilter::Outcome(outcome));
        self
    }

    /// Match tests that raised a warning.
    pub fn with_warning(mut self) -> Self {
        self.filters.push(TestFilter::HasWarning);
        self
    }

    /// Match tests flagged unreliable.
    pub fn with_unreliable(mut self) -> Self {
        self.filters.push(TestFilter::Unreliable);
        self
    }

    /// Fold the accumulated test predicates into the parent query and
    /// return it.
    ///
    /// The combined predicate ANDs across filters and ORs across a
    /// session's tests. With no accumulated filters this is a no-op.
    pub fn apply(mut self) -> SessionQuery {
        if !self.filters.is_empty() {
            self.query
                .filters
                .push(SessionFilter::TestLevel(std::mem::take(&mut self.filters)));
        }
        self.query
    }

    /// Per-nodeid aggregates over the matching tests of the filtered
    /// sessions.
    ///
    /// This is the one place individual test statistics escape
    /// full-session context, and only as derived read-only numbers:
    /// reliability (`passes/runs`), failure count (failed or errored),
    /// and average duration, keyed and sorted by nodeid.
    pub fn insight(&self, sessions: Option<&[TestSession]>) -> Result<Vec<TestInsight>> {
        let result = self.query.execute(sessions)?;

        struct Acc {
            runs: usize,
            passes: usize,
            failures: usize,
            total_duration: f64,
        }
        let mut per_nodeid: BTreeMap<String, Acc> = BTreeMap::new();

        for session in result.iter() {
            for test in &session.test_results {
                if !self.filters.iter().all(|f| f.matches(test)) {
                    continue;
                }
                let acc = per_nodeid.entry(test.nodeid.clone()).or_insert(Acc {
                    runs: 0,
                    passes: 0,
                    failures: 0,
                    total_duration: 0.0,
                });
                acc.runs += 1;
                if test.outcome == TestOutcome::Passed {
                    acc.passes += 1;
                }
                if test.outcome.is_failed() {
                    acc.failures += 1;
                }
                acc.total_duration += test.duration;
            }
        }

        Ok(per_nodeid
            .into_iter()
            .map(|(nodeid, acc)| TestInsight {
                nodeid,
                runs: acc.runs,
                passes: acc.passes,
                failures: acc.failures,
                reliability: acc.passes as f64 / acc.runs as f64,
                avg_duration: acc.total_duration / acc.runs as f64,
            })
            .collect())
    }
}

/// Aggregated per-nodeid statistics surfaced by [`TestQuery::insight`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TestInsight {
    pub nodeid: String,
    pub runs: usize,
    pub passes: usize,
    /// Runs that failed or errored.
    pub failures: usize,
    /// `passes / runs`.
    pub reliability: f64,
    pub avg_duration: f64,
}
