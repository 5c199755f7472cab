//! Two-level query engine over recorded test sessions.
//!
//! Session-level predicates select whole sessions; test-level predicates
//! (built through [`SessionQuery::filter_by_test`]) also select whole
//! sessions — a kept session always carries its full original test list.
//! Predicates accumulate in registration order and are applied as a
//! left-to-right intersection, so every added filter can only narrow the
//! result.

mod serialize;
mod session_filters;
mod test_filters;

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use suitelens_storage::StoreHandle;
use suitelens_types::{TestOutcome, TestResult, TestSession};

use crate::error::{Error, Result};

pub(crate) use session_filters::{SessionFilter, TextMatcher, glob_regex};

pub use test_filters::{TestInsight, TestQuery, TextField};

/// How a textual filter compares its pattern against a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchKind {
    /// Case-insensitive equality.
    Exact,
    /// Case-insensitive containment.
    Substring,
    /// Case-insensitive regex search, compiled at construction.
    Regex,
}

impl MatchKind {
    pub(crate) fn as_str(self) -> &'static str {
        match self {
            MatchKind::Exact => "exact",
            MatchKind::Substring => "substring",
            MatchKind::Regex => "regex",
        }
    }

    pub(crate) fn parse(raw: &str) -> Result<Self> {
        match raw {
            "exact" => Ok(MatchKind::Exact),
            "substring" => Ok(MatchKind::Substring),
            "regex" => Ok(MatchKind::Regex),
            other => Err(Error::InvalidFilterKind(format!(
                "unsupported match kind: {other}"
            ))),
        }
    }
}

/// Whether an outcome filter requires any or every test to match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutcomeScope {
    /// Keep the session if at least one test has the outcome.
    #[default]
    AnyTest,
    /// Keep the session only if every test has the outcome.
    AllTests,
}

impl OutcomeScope {
    pub(crate) fn as_str(self) -> &'static str {
        match self {
            OutcomeScope::AnyTest => "any_test",
            OutcomeScope::AllTests => "all_tests",
        }
    }

    pub(crate) fn parse(raw: &str) -> Result<Self> {
        match raw {
            "any_test" => Ok(OutcomeScope::AnyTest),
            "all_tests" => Ok(OutcomeScope::AllTests),
            other => Err(Error::InvalidFilterKind(format!(
                "unsupported outcome scope: {other}"
            ))),
        }
    }
}

/// Fluent builder over session-level predicates.
///
/// Methods consume and return the builder, so a query under configuration
/// cannot be shared between pipelines; once [`SessionQuery::execute`] has
/// produced a [`QueryResult`], that result is plain owned data and safe to
/// share. Time-window cutoffs are fixed at registration time, which makes
/// repeated `execute` calls idempotent.
#[derive(Clone, Default)]
pub struct SessionQuery {
    pub(crate) store: Option<StoreHandle>,
    pub(crate) session_ids: Option<Vec<String>>,
    pub(crate) filters: Vec<SessionFilter>,
}

impl fmt::Debug for SessionQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionQuery")
            .field("has_store", &self.store.is_some())
            .field("session_ids", &self.session_ids)
            .field("filters", &self.filters.len())
            .finish()
    }
}

impl SessionQuery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a storage collaborator, used when [`SessionQuery::execute`]
    /// is called without an explicit session pool.
    pub fn with_store(mut self, store: StoreHandle) -> Self {
        self.store = Some(store);
        self
    }

    /// Keep sessions whose SUT name matches the pattern.
    pub fn for_sut(mut self, pattern: &str, kind: MatchKind) -> Result<Self> {
        if pattern.trim().is_empty() {
            return Err(Error::InvalidFilterKind(
                "SUT pattern must be non-empty".to_string(),
            ));
        }
        self.filters
            .push(SessionFilter::Sut(TextMatcher::new(pattern, kind)?));
        Ok(self)
    }

    /// Keep sessions that started no more than `days` days before the
    /// moment this filter was registered.
    pub fn in_last_days(mut self, days: u32) -> Self {
        let cutoff = Utc::now() - Duration::days(i64::from(days));
        self.filters.push(SessionFilter::InLastDays { days, cutoff });
        self
    }

    /// Keep sessions that started no more than `hours` hours before the
    /// moment this filter was registered.
    pub fn in_last_hours(mut self, hours: u32) -> Self {
        let cutoff = Utc::now() - Duration::hours(i64::from(hours));
        self.filters
            .push(SessionFilter::InLastHours { hours, cutoff });
        self
    }

    /// Keep sessions that started inside the inclusive window.
    pub fn date_range(mut self, start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self> {
        if start > end {
            return Err(Error::InvalidFilterKind(
                "date range start must not be after end".to_string(),
            ));
        }
        self.filters.push(SessionFilter::DateRange { start, end });
        Ok(self)
    }

    /// Keep sessions with at least one rerun group.
    pub fn with_reruns(mut self) -> Self {
        self.filters.push(SessionFilter::HasReruns);
        self
    }

    /// Keep sessions whose tags match every supplied key/value pair.
    ///
    /// A key missing from a session compares against the empty string.
    pub fn with_tags(mut self, tags: &BTreeMap<String, String>, kind: MatchKind) -> Result<Self> {
        let compiled = tags
            .iter()
            .map(|(key, pattern)| Ok((key.clone(), TextMatcher::new(pattern, kind)?)))
            .collect::<Result<Vec<_>>>()?;
        self.filters.push(SessionFilter::Tags {
            kind,
            tags: compiled,
        });
        Ok(self)
    }

    /// Keep sessions with at least one warning-raising result.
    pub fn with_warning(mut self) -> Self {
        self.filters.push(SessionFilter::HasWarning);
        self
    }

    /// Keep sessions by test outcome: any test, or every test, depending
    /// on `scope`.
    pub fn with_outcome(mut self, outcome: TestOutcome, scope: OutcomeScope) -> Self {
        self.filters.push(SessionFilter::Outcome { outcome, scope });
        self
    }

    /// Keep sessions with at least one result flagged unreliable.
    pub fn with_unreliable(mut self) -> Self {
        self.filters.push(SessionFilter::HasUnreliable);
        self
    }

    /// Keep sessions whose id matches a glob pattern (`*` and `?`).
    ///
    /// Useful for the `base-*` / `target-*` naming convention the
    /// comparison engine relies on.
    pub fn with_session_id_pattern(mut self, pattern: &str) -> Result<Self> {
        if pattern.trim().is_empty() {
            return Err(Error::InvalidFilterKind(
                "session id pattern must be non-empty".to_string(),
            ));
        }
        let regex = glob_regex(pattern)?;
        self.filters.push(SessionFilter::SessionIdPattern {
            pattern: pattern.to_string(),
            regex,
        });
        Ok(self)
    }

    /// Pin the candidate pool to the listed session ids.
    pub fn with_session_ids<I>(mut self, ids: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        self.session_ids = Some(ids.into_iter().map(Into::into).collect());
        self
    }

    /// Start building test-level predicates bound to this query.
    pub fn filter_by_test(self) -> TestQuery {
        TestQuery::new(self)
    }

    /// Apply all accumulated predicates, in registration order, as a
    /// left-to-right intersection.
    ///
    /// The pool is the supplied slice if given, otherwise the attached
    /// store. Execution never mutates a session: surviving sessions are
    /// returned whole.
    pub fn execute(&self, sessions: Option<&[TestSession]>) -> Result<QueryResult> {
        let mut pool: Vec<TestSession> = match sessions {
            Some(list) => list.to_vec(),
            None => match &self.store {
                Some(store) => store.load_sessions()?,
                None => {
                    return Err(Error::Query(
                        "no session pool supplied and no store attached".to_string(),
                    ));
                }
            },
        };

        if let Some(ids) = &self.session_ids {
            pool.retain(|s| ids.iter().any(|id| id == &s.session_id));
        }
        for filter in &self.filters {
            pool.retain(|s| filter.matches(s));
        }
        Ok(QueryResult::new(pool))
    }

    /// Serialize this query's predicates (and id pin) to a JSON value.
    pub fn to_value(&self) -> serde_json::Value {
        serialize::query_to_value(self)
    }

    /// Reconstruct a query from [`SessionQuery::to_value`] output.
    ///
    /// Unknown filter type tags fail with
    /// [`Error::UnknownSerializedFilterType`]; malformed parameters fail
    /// with [`Error::InvalidFilterKind`].
    pub fn from_value(value: &serde_json::Value) -> Result<Self> {
        serialize::query_from_value(value)
    }
}

/// Sessions surviving a query, always whole.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryResult {
    sessions: Vec<TestSession>,
}

impl QueryResult {
    pub(crate) fn new(sessions: Vec<TestSession>) -> Self {
        Self { sessions }
    }

    pub fn sessions(&self) -> &[TestSession] {
        &self.sessions
    }

    pub fn into_sessions(self) -> Vec<TestSession> {
        self.sessions
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, TestSession> {
        self.sessions.iter()
    }

    /// Every result across surviving sessions, in session order.
    pub fn test_results(&self) -> impl Iterator<Item = &TestResult> {
        self.sessions.iter().flat_map(|s| s.test_results.iter())
    }
}

impl<'a> IntoIterator for &'a QueryResult {
    type Item = &'a TestSession;
    type IntoIter = std::slice::Iter<'a, TestSession>;

    fn into_iter(self) -> Self::IntoIter {
        self.sessions.iter()
    }
}
