use chrono::{DateTime, Utc};
use regex::{Regex, RegexBuilder};

use suitelens_types::{TestOutcome, TestSession};

use crate::error::{Error, Result};

use super::test_filters::TestFilter;
use super::{MatchKind, OutcomeScope};

/// Pattern matcher shared by SUT and tag filters.
///
/// Stores the original pattern so the filter can serialize; comparisons
/// are case-insensitive for every kind.
#[derive(Debug, Clone)]
pub(crate) enum TextMatcher {
    Exact(String),
    Substring(String),
    Regex { pattern: String, regex: Regex },
}

impl TextMatcher {
    pub(crate) fn new(pattern: &str, kind: MatchKind) -> Result<Self> {
        match kind {
            MatchKind::Exact => Ok(TextMatcher::Exact(pattern.to_string())),
            MatchKind::Substring => Ok(TextMatcher::Substring(pattern.to_string())),
            MatchKind::Regex => {
                let regex = RegexBuilder::new(pattern)
                    .case_insensitive(true)
                    .build()
                    .map_err(|err| {
                        Error::InvalidFilterKind(format!("invalid regex {pattern:?}: {err}"))
                    })?;
                Ok(TextMatcher::Regex {
                    pattern: pattern.to_string(),
                    regex,
                })
            }
        }
    }

    pub(crate) fn kind(&self) -> MatchKind {
        match self {
            TextMatcher::Exact(_) => MatchKind::Exact,
            TextMatcher::Substring(_) => MatchKind::Substring,
            TextMatcher::Regex { .. } => MatchKind::Regex,
        }
    }

    pub(crate) fn pattern(&self) -> &str {
        match self {
            TextMatcher::Exact(p) | TextMatcher::Substring(p) => p,
            TextMatcher::Regex { pattern, .. } => pattern,
        }
    }

    pub(crate) fn matches(&self, value: &str) -> bool {
        match self {
            TextMatcher::Exact(p) => value.eq_ignore_ascii_case(p),
            TextMatcher::Substring(p) => value
                .to_ascii_lowercase()
                .contains(&p.to_ascii_lowercase()),
            TextMatcher::Regex { regex, .. } => regex.is_match(value),
        }
    }
}

/// Translate a glob pattern (`*`, `?`) into an anchored regex.
pub(crate) fn glob_regex(pattern: &str) -> Result<Regex> {
    let mut expr = String::with_capacity(pattern.len() + 8);
    expr.push('^');
    for ch in pattern.chars() {
        match ch {
            '*' => expr.push_str(".*"),
            '?' => expr.push('.'),
            other => expr.push_str(&regex::escape(other.encode_utf8(&mut [0; 4]))),
        }
    }
    expr.push('$');
    Regex::new(&expr)
        .map_err(|err| Error::InvalidFilterKind(format!("invalid glob {pattern:?}: {err}")))
}

/// Session-level predicate, one variant per filter kind.
///
/// Variants carry their parameters (and compiled regexes), so a filter
/// can both execute and serialize without reflecting into closures.
/// Time-window variants keep the cutoff computed at registration time.
#[derive(Debug, Clone)]
pub(crate) enum SessionFilter {
    Sut(TextMatcher),
    InLastDays { days: u32, cutoff: DateTime<Utc> },
    InLastHours { hours: u32, cutoff: DateTime<Utc> },
    DateRange { start: DateTime<Utc>, end: DateTime<Utc> },
    HasReruns,
    Tags { kind: MatchKind, tags: Vec<(String, TextMatcher)> },
    HasWarning,
    Outcome { outcome: TestOutcome, scope: OutcomeScope },
    HasUnreliable,
    SessionIdPattern { pattern: String, regex: Regex },
    /// Folded test-level predicates: a session matches iff at least one
    /// test satisfies every inner filter.
    TestLevel(Vec<TestFilter>),
}

impl SessionFilter {
    pub(crate) fn matches(&self, session: &TestSession) -> bool {
        match self {
            SessionFilter::Sut(matcher) => matcher.matches(&session.sut_name),
            SessionFilter::InLastDays { cutoff, .. }
            | SessionFilter::InLastHours { cutoff, .. } => {
                session.session_start_time >= *cutoff
            }
            SessionFilter::DateRange { start, end } => {
                session.session_start_time >= *start && session.session_start_time <= *end
            }
            SessionFilter::HasReruns => session.has_reruns(),
            SessionFilter::Tags { tags, .. } => tags.iter().all(|(key, matcher)| {
                let value = session
                    .session_tags
                    .get(key)
                    .map(String::as_str)
                    .unwrap_or("");
                matcher.matches(value)
            }),
            SessionFilter::HasWarning => session.has_warnings(),
            SessionFilter::Outcome { outcome, scope } => match scope {
                OutcomeScope::AnyTest => {
                    session.test_results.iter().any(|t| t.outcome == *outcome)
                }
                OutcomeScope::AllTests => {
                    !session.test_results.is_empty()
                        && session.test_results.iter().all(|t| t.outcome == *outcome)
                }
            },
            SessionFilter::HasUnreliable => session.test_results.iter().any(|t| t.unreliable),
            SessionFilter::SessionIdPattern { regex, .. } => regex.is_match(&session.session_id),
            SessionFilter::TestLevel(filters) => session
                .test_results
                .iter()
                .any(|test| filters.iter().all(|f| f.matches(test))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_and_substring_ignore_case() {
        let exact = TextMatcher::new("API-Service", MatchKind::Exact).unwrap();
        assert!(exact.matches("api-service"));
        assert!(!exact.matches("api-service-2"));

        let substring = TextMatcher::new("API", MatchKind::Substring).unwrap();
        assert!(substring.matches("api-service"));
        assert!(!substring.matches("db-service"));
    }

    #[test]
    fn regex_matcher_searches_case_insensitively() {
        let matcher = TextMatcher::new(r"^api-\d+$", MatchKind::Regex).unwrap();
        assert!(matcher.matches("API-42"));
        assert!(!matcher.matches("api-service"));
    }

    #[test]
    fn bad_regex_fails_at_construction() {
        let err = TextMatcher::new("[unclosed", MatchKind::Regex).unwrap_err();
        assert!(matches!(err, Error::InvalidFilterKind(_)));
    }

    #[test]
    fn glob_translates_star_and_question_mark() {
        let regex = glob_regex("base-*").unwrap();
        assert!(regex.is_match("base-001"));
        assert!(!regex.is_match("rebase-001"));

        let regex = glob_regex("run-?.json").unwrap();
        assert!(regex.is_match("run-7.json"));
        assert!(!regex.is_match("run-77.json"));
        // The dot is literal, not a regex wildcard.
        assert!(!regex.is_match("run-7xjson"));
    }
}
