//! Two-session diff engine.
//!
//! A [`Comparison`] pairs an independent base and target query, selects
//! the latest matching session on each side, and classifies every nodeid
//! into change categories. Categories deliberately overlap: a test that
//! flips from passed to failed while also running slower lands in
//! `new_failures`, `flaky_tests`, and `slower_tests` at once.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use suitelens_storage::ProfileRegistry;
use suitelens_types::{TestOutcome, TestResult, TestSession};

use crate::error::{Error, Result};
use crate::query::{MatchKind, QueryResult, SessionQuery};

/// Default slowdown threshold: a test counts as slower above 1.2x its
/// base duration.
pub const DEFAULT_SLOWER_PERCENT: f64 = 20.0;
/// Default speedup threshold: a test counts as faster below 0.8x its
/// base duration.
pub const DEFAULT_FASTER_PERCENT: f64 = 20.0;

const BASE_PREFIX: &str = "base-";
const TARGET_PREFIX: &str = "target-";

/// Builder pairing a base and a target query for a two-session diff.
///
/// Two phases: configuration (the chainable methods below) and execution
/// ([`Comparison::execute`], which consumes the builder — a comparison is
/// single-use).
pub struct Comparison {
    base: SessionQuery,
    target: SessionQuery,
    slower_percent: f64,
    faster_percent: f64,
}

impl Default for Comparison {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Comparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Comparison")
            .field("base", &self.base)
            .field("target", &self.target)
            .field("slower_percent", &self.slower_percent)
            .field("faster_percent", &self.faster_percent)
            .finish()
    }
}

impl Comparison {
    pub fn new() -> Self {
        Self {
            base: SessionQuery::new(),
            target: SessionQuery::new(),
            slower_percent: DEFAULT_SLOWER_PERCENT,
            faster_percent: DEFAULT_FASTER_PERCENT,
        }
    }

    /// Resolve a named profile for the base side.
    pub fn with_base_profile(mut self, name: &str, profiles: &ProfileRegistry) -> Result<Self> {
        let store = profiles
            .get(name)
            .ok_or_else(|| Error::Comparison(format!("unknown profile: {name}")))?;
        self.base = self.base.with_store(store);
        Ok(self)
    }

    /// Resolve a named profile for the target side.
    pub fn with_target_profile(mut self, name: &str, profiles: &ProfileRegistry) -> Result<Self> {
        let store = profiles
            .get(name)
            .ok_or_else(|| Error::Comparison(format!("unknown profile: {name}")))?;
        self.target = self.target.with_store(store);
        Ok(self)
    }

    /// Resolve named profiles for both sides.
    pub fn with_profiles(
        self,
        base_name: &str,
        target_name: &str,
        profiles: &ProfileRegistry,
    ) -> Result<Self> {
        self.with_base_profile(base_name, profiles)?
            .with_target_profile(target_name, profiles)
    }

    /// Compare two SUTs, applying the `base-*` / `target-*` session-id
    /// convention on top of an exact SUT match per side.
    pub fn between_suts(mut self, base_sut: &str, target_sut: &str) -> Result<Self> {
        self.base = self
            .base
            .for_sut(base_sut, MatchKind::Exact)?
            .with_session_id_pattern("base-*")?;
        self.target = self
            .target
            .for_sut(target_sut, MatchKind::Exact)?
            .with_session_id_pattern("target-*")?;
        Ok(self)
    }

    /// Override the duration-change thresholds, in percent.
    ///
    /// `slower_percent` must be positive; `faster_percent` must lie
    /// strictly between 0 and 100 (a test cannot get 100% faster).
    pub fn with_performance_thresholds(
        mut self,
        slower_percent: f64,
        faster_percent: f64,
    ) -> Result<Self> {
        if !(slower_percent > 0.0) {
            return Err(Error::Comparison(format!(
                "slower_percent must be > 0, got {slower_percent}"
            )));
        }
        if !(faster_percent > 0.0 && faster_percent < 100.0) {
            return Err(Error::Comparison(format!(
                "faster_percent must be in (0, 100), got {faster_percent}"
            )));
        }
        self.slower_percent = slower_percent;
        self.faster_percent = faster_percent;
        Ok(self)
    }

    /// Filter each side by exact environment tags.
    pub fn with_environment(
        mut self,
        base_tags: &BTreeMap<String, String>,
        target_tags: &BTreeMap<String, String>,
    ) -> Result<Self> {
        self.base = self.base.with_tags(base_tags, MatchKind::Exact)?;
        self.target = self.target.with_tags(target_tags, MatchKind::Exact)?;
        Ok(self)
    }

    /// Apply an arbitrary query transform symmetrically to both sides.
    pub fn apply_to_both<F>(mut self, mut transform: F) -> Result<Self>
    where
        F: FnMut(SessionQuery) -> Result<SessionQuery>,
    {
        self.base = transform(self.base)?;
        self.target = transform(self.target)?;
        Ok(self)
    }

    fn configured(&self) -> bool {
        !self.base.filters.is_empty() || !self.target.filters.is_empty()
    }

    /// Run the comparison.
    ///
    /// With a session slice and no configured filters, the slice must hold
    /// exactly the base and target session (ids prefixed `base-` and
    /// `target-`) and querying is skipped. With filters configured, both
    /// queries run against the slice if given, otherwise against each
    /// side's own store. Per side the session with the latest start time
    /// wins (ties: last in iteration order).
    pub fn execute(self, sessions: Option<&[TestSession]>) -> Result<ComparisonResult> {
        let (base_results, target_results) = match sessions {
            Some(pair) if !self.configured() => {
                if pair.len() != 2 {
                    return Err(Error::Comparison(format!(
                        "direct comparison takes exactly 2 sessions, got {}",
                        pair.len()
                    )));
                }
                if !pair[0].session_id.starts_with(BASE_PREFIX) {
                    return Err(Error::Comparison(format!(
                        "base session id must start with {BASE_PREFIX:?}, got {:?}",
                        pair[0].session_id
                    )));
                }
                if !pair[1].session_id.starts_with(TARGET_PREFIX) {
                    return Err(Error::Comparison(format!(
                        "target session id must start with {TARGET_PREFIX:?}, got {:?}",
                        pair[1].session_id
                    )));
                }
                (
                    QueryResult::new(vec![pair[0].clone()]),
                    QueryResult::new(vec![pair[1].clone()]),
                )
            }
            Some(pool) => (
                self.base.execute(Some(pool))?,
                self.target.execute(Some(pool))?,
            ),
            None => {
                if !self.configured() {
                    return Err(Error::Comparison(
                        "neither sessions nor filters were configured".to_string(),
                    ));
                }
                (self.base.execute(None)?, self.target.execute(None)?)
            }
        };

        let Some(base_session) = latest(base_results.sessions()) else {
            return Err(Error::Comparison(
                "no matching base sessions found".to_string(),
            ));
        };
        let Some(target_session) = latest(target_results.sessions()) else {
            return Err(Error::Comparison(
                "no matching target sessions found".to_string(),
            ));
        };
        let base_session = base_session.clone();
        let target_session = target_session.clone();

        let slower_ratio = 1.0 + self.slower_percent / 100.0;
        let faster_ratio = 1.0 - self.faster_percent / 100.0;

        // Later duplicates of a nodeid overwrite earlier ones, matching
        // capture order.
        let base_tests: BTreeMap<&str, &TestResult> = base_session
            .test_results
            .iter()
            .map(|t| (t.nodeid.as_str(), t))
            .collect();
        let target_tests: BTreeMap<&str, &TestResult> = target_session
            .test_results
            .iter()
            .map(|t| (t.nodeid.as_str(), t))
            .collect();

        let missing_tests: Vec<String> = base_tests
            .keys()
            .filter(|nodeid| !target_tests.contains_key(*nodeid))
            .map(|nodeid| nodeid.to_string())
            .collect();
        let new_tests: Vec<String> = target_tests
            .keys()
            .filter(|nodeid| !base_tests.contains_key(*nodeid))
            .map(|nodeid| nodeid.to_string())
            .collect();

        let mut new_failures = Vec::new();
        let mut new_passes = Vec::new();
        let mut flaky_tests = Vec::new();
        let mut slower_tests = Vec::new();
        let mut faster_tests = Vec::new();
        let mut outcome_changes = BTreeMap::new();

        for (nodeid, base_test) in &base_tests {
            let Some(target_test) = target_tests.get(nodeid) else {
                continue;
            };

            if base_test.outcome != target_test.outcome {
                outcome_changes.insert(
                    nodeid.to_string(),
                    (base_test.outcome, target_test.outcome),
                );
                // An outcome flip is flaky regardless of direction; the
                // directional categories come on top.
                flaky_tests.push(nodeid.to_string());

                match (base_test.outcome, target_test.outcome) {
                    (TestOutcome::Passed, TestOutcome::Failed) => {
                        new_failures.push(nodeid.to_string());
                    }
                    (TestOutcome::Failed, TestOutcome::Passed) => {
                        new_passes.push(nodeid.to_string());
                    }
                    _ => {}
                }
            }

            // Duration comparison is independent of any outcome change.
            if target_test.duration > base_test.duration * slower_ratio {
                slower_tests.push(nodeid.to_string());
            } else if target_test.duration < base_test.duration * faster_ratio {
                faster_tests.push(nodeid.to_string());
            }
        }

        Ok(ComparisonResult {
            base_results,
            target_results,
            base_session,
            target_session,
            new_failures,
            new_passes,
            flaky_tests,
            slower_tests,
            faster_tests,
            missing_tests,
            new_tests,
            outcome_changes,
        })
    }
}

fn latest(sessions: &[TestSession]) -> Option<&TestSession> {
    sessions.iter().max_by_key(|s| s.session_start_time)
}

/// Outcome of one comparison execution. Read-only.
///
/// The seven category lists are not mutually exclusive; every list is
/// sorted by nodeid.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonResult {
    pub base_results: QueryResult,
    pub target_results: QueryResult,
    /// Session selected from the base side.
    pub base_session: TestSession,
    /// Session selected from the target side.
    pub target_session: TestSession,
    /// Passed in base, failed in target.
    pub new_failures: Vec<String>,
    /// Failed in base, passed in target.
    pub new_passes: Vec<String>,
    /// Any outcome change between base and target.
    pub flaky_tests: Vec<String>,
    /// Slower than base duration times the slower threshold.
    pub slower_tests: Vec<String>,
    /// Faster than base duration times the faster threshold.
    pub faster_tests: Vec<String>,
    /// Present in base, absent in target.
    pub missing_tests: Vec<String>,
    /// Present in target, absent in base.
    pub new_tests: Vec<String>,
    /// nodeid -> (base outcome, target outcome) for every change.
    pub outcome_changes: BTreeMap<String, (TestOutcome, TestOutcome)>,
}

impl ComparisonResult {
    /// Whether any of the seven category lists is non-empty.
    pub fn has_changes(&self) -> bool {
        !self.new_failures.is_empty()
            || !self.new_passes.is_empty()
            || !self.flaky_tests.is_empty()
            || !self.slower_tests.is_empty()
            || !self.faster_tests.is_empty()
            || !self.missing_tests.is_empty()
            || !self.new_tests.is_empty()
    }
}
