//! Query persistence: `{sessions: [...], filters: [...]}` with one
//! `{"type": tag, ...params}` object per predicate.
//!
//! The set of known type tags is a fixed, process-wide table; there is no
//! mutable registry to extend at runtime. Unknown tags fail with
//! [`Error::UnknownSerializedFilterType`], malformed parameters with
//! [`Error::InvalidFilterKind`]. Relative time windows (`in_last_days`,
//! `in_last_hours`) re-anchor their cutoff when reconstructed, matching
//! the intent of replaying a saved query against fresh data.

use chrono::{Duration, Utc};
use serde_json::{Map, Value, json};

use suitelens_types::TestOutcome;
use suitelens_types::timestamp::parse_normalized;

use crate::error::{Error, Result};

use super::session_filters::{SessionFilter, TextMatcher, glob_regex};
use super::test_filters::{TestFilter, compile_regex, duration_bounds};
use super::{MatchKind, OutcomeScope, SessionQuery, TextField};

pub(crate) fn query_to_value(query: &SessionQuery) -> Value {
    let filters: Vec<Value> = query.filters.iter().map(session_filter_to_value).collect();
    let mut map = Map::new();
    if let Some(ids) = &query.session_ids {
        map.insert("sessions".to_string(), json!(ids));
    }
    map.insert("filters".to_string(), Value::Array(filters));
    Value::Object(map)
}

pub(crate) fn query_from_value(value: &Value) -> Result<SessionQuery> {
    let map = as_object(value)?;
    let mut query = SessionQuery::new();

    if let Some(ids) = map.get("sessions") {
        let ids = ids
            .as_array()
            .ok_or_else(|| Error::InvalidFilterKind("sessions must be an array".to_string()))?
            .iter()
            .map(|id| {
                id.as_str()
                    .map(str::to_string)
                    .ok_or_else(|| {
                        Error::InvalidFilterKind("session ids must be strings".to_string())
                    })
            })
            .collect::<Result<Vec<_>>>()?;
        query.session_ids = Some(ids);
    }

    if let Some(filters) = map.get("filters") {
        let filters = filters
            .as_array()
            .ok_or_else(|| Error::InvalidFilterKind("filters must be an array".to_string()))?;
        for filter in filters {
            query.filters.push(session_filter_from_value(filter)?);
        }
    }

    Ok(query)
}

fn session_filter_to_value(filter: &SessionFilter) -> Value {
    match filter {
        SessionFilter::Sut(matcher) => json!({
            "type": "sut",
            "kind": matcher.kind().as_str(),
            "pattern": matcher.pattern(),
        }),
        SessionFilter::InLastDays { days, .. } => json!({
            "type": "in_last_days",
            "days": days,
        }),
        SessionFilter::InLastHours { hours, .. } => json!({
            "type": "in_last_hours",
            "hours": hours,
        }),
        SessionFilter::DateRange { start, end } => json!({
            "type": "date_range",
            "start": start.to_rfc3339(),
            "end": end.to_rfc3339(),
        }),
        SessionFilter::HasReruns => json!({ "type": "has_reruns" }),
        SessionFilter::Tags { kind, tags } => {
            let mut entries = Map::new();
            for (key, matcher) in tags {
                entries.insert(key.clone(), Value::String(matcher.pattern().to_string()));
            }
            json!({
                "type": "tags",
                "kind": kind.as_str(),
                "tags": entries,
            })
        }
        SessionFilter::HasWarning => json!({ "type": "has_warning" }),
        SessionFilter::Outcome { outcome, scope } => json!({
            "type": "outcome",
            "outcome": outcome.as_str(),
            "scope": scope.as_str(),
        }),
        SessionFilter::HasUnreliable => json!({ "type": "has_unreliable" }),
        SessionFilter::SessionIdPattern { pattern, .. } => json!({
            "type": "session_id_pattern",
            "pattern": pattern,
        }),
        SessionFilter::TestLevel(filters) => {
            let inner: Vec<Value> = filters.iter().map(test_filter_to_value).collect();
            json!({
                "type": "test_level",
                "filters": inner,
            })
        }
    }
}

fn session_filter_from_value(value: &Value) -> Result<SessionFilter> {
    let map = as_object(value)?;
    let tag = str_param(map, "type")?;

    // This match is the full registration table of known session filter
    // kinds; there is no runtime registry to extend.
    match tag {
        "sut" => {
            let kind = MatchKind::parse(str_param(map, "kind")?)?;
            let matcher = TextMatcher::new(str_param(map, "pattern")?, kind)?;
            Ok(SessionFilter::Sut(matcher))
        }
        "in_last_days" => {
            let days = u32_param(map, "days")?;
            let cutoff = Utc::now() - Duration::days(i64::from(days));
            Ok(SessionFilter::InLastDays { days, cutoff })
        }
        "in_last_hours" => {
            let hours = u32_param(map, "hours")?;
            let cutoff = Utc::now() - Duration::hours(i64::from(hours));
            Ok(SessionFilter::InLastHours { hours, cutoff })
        }
        "date_range" => {
            let start = parse_normalized(str_param(map, "start")?)
                .map_err(|err| Error::InvalidFilterKind(err.to_string()))?;
            let end = parse_normalized(str_param(map, "end")?)
                .map_err(|err| Error::InvalidFilterKind(err.to_string()))?;
            if start > end {
                return Err(Error::InvalidFilterKind(
                    "date range start must not be after end".to_string(),
                ));
            }
            Ok(SessionFilter::DateRange { start, end })
        }
        "has_reruns" => Ok(SessionFilter::HasReruns),
        "tags" => {
            let kind = MatchKind::parse(str_param(map, "kind")?)?;
            let entries = map
                .get("tags")
                .and_then(Value::as_object)
                .ok_or_else(|| {
                    Error::InvalidFilterKind("tags filter requires a tags object".to_string())
                })?;
            let mut tags = Vec::with_capacity(entries.len());
            for (key, pattern) in entries {
                let pattern = pattern.as_str().ok_or_else(|| {
                    Error::InvalidFilterKind("tag patterns must be strings".to_string())
                })?;
                tags.push((key.clone(), TextMatcher::new(pattern, kind)?));
            }
            Ok(SessionFilter::Tags { kind, tags })
        }
        "has_warning" => Ok(SessionFilter::HasWarning),
        "outcome" => {
            let outcome = parse_outcome(str_param(map, "outcome")?)?;
            let scope = match map.get("scope") {
                Some(scope) => OutcomeScope::parse(scope.as_str().ok_or_else(|| {
                    Error::InvalidFilterKind("outcome scope must be a string".to_string())
                })?)?,
                None => OutcomeScope::AnyTest,
            };
            Ok(SessionFilter::Outcome { outcome, scope })
        }
        "has_unreliable" => Ok(SessionFilter::HasUnreliable),
        "session_id_pattern" => {
            let pattern = str_param(map, "pattern")?;
            Ok(SessionFilter::SessionIdPattern {
                pattern: pattern.to_string(),
                regex: glob_regex(pattern)?,
            })
        }
        "test_level" => {
            let inner = map
                .get("filters")
                .and_then(Value::as_array)
                .ok_or_else(|| {
                    Error::InvalidFilterKind(
                        "test_level filter requires a filters array".to_string(),
                    )
                })?;
            let filters = inner
                .iter()
                .map(test_filter_from_value)
                .collect::<Result<Vec<_>>>()?;
            Ok(SessionFilter::TestLevel(filters))
        }
        other => Err(Error::UnknownSerializedFilterType(other.to_string())),
    }
}

fn test_filter_to_value(filter: &TestFilter) -> Value {
    match filter {
        TestFilter::Substring { field, pattern } => json!({
            "type": "substring",
            "field": field.as_str(),
            "pattern": pattern,
        }),
        TestFilter::Regex { field, pattern, .. } => json!({
            "type": "regex",
            "field": field.as_str(),
            "pattern": pattern,
        }),
        TestFilter::Duration { min, max } => json!({
            "type": "duration",
            "min": min,
            "max": max,
        }),
        TestFilter::Outcome(outcome) => json!({
            "type": "outcome",
            "outcome": outcome.as_str(),
        }),
        TestFilter::HasWarning => json!({ "type": "has_warning" }),
        TestFilter::Unreliable => json!({ "type": "unreliable" }),
    }
}

fn test_filter_from_value(value: &Value) -> Result<TestFilter> {
    let map = as_object(value)?;
    let tag = str_param(map, "type")?;

    // Registration table of known test filter kinds.
    match tag {
        "substring" => Ok(TestFilter::Substring {
            field: TextField::parse(str_param(map, "field")?)?,
            pattern: str_param(map, "pattern")?.to_string(),
        }),
        "regex" => {
            let pattern = str_param(map, "pattern")?;
            Ok(TestFilter::Regex {
                field: TextField::parse(str_param(map, "field")?)?,
                pattern: pattern.to_string(),
                regex: compile_regex(pattern)?,
            })
        }
        "duration" => {
            let (min, max) = duration_bounds(f64_param(map, "min")?, f64_param(map, "max")?)?;
            Ok(TestFilter::Duration { min, max })
        }
        "outcome" => Ok(TestFilter::Outcome(parse_outcome(str_param(
            map, "outcome",
        )?)?)),
        "has_warning" => Ok(TestFilter::HasWarning),
        "unreliable" => Ok(TestFilter::Unreliable),
        other => Err(Error::UnknownSerializedFilterType(other.to_string())),
    }
}

fn parse_outcome(raw: &str) -> Result<TestOutcome> {
    raw.parse()
        .map_err(|_| Error::InvalidFilterKind(format!("unknown outcome: {raw}")))
}

fn as_object(value: &Value) -> Result<&Map<String, Value>> {
    value
        .as_object()
        .ok_or_else(|| Error::InvalidFilterKind("expected a JSON object".to_string()))
}

fn str_param<'a>(map: &'a Map<String, Value>, key: &str) -> Result<&'a str> {
    map.get(key)
        .and_then(Value::as_str)
        .ok_or_else(|| Error::InvalidFilterKind(format!("missing string parameter: {key}")))
}

fn u32_param(map: &Map<String, Value>, key: &str) -> Result<u32> {
    map.get(key)
        .and_then(Value::as_u64)
        .and_then(|n| u32::try_from(n).ok())
        .ok_or_else(|| Error::InvalidFilterKind(format!("missing integer parameter: {key}")))
}

fn f64_param(map: &Map<String, Value>, key: &str) -> Result<f64> {
    map.get(key)
        .and_then(Value::as_f64)
        .ok_or_else(|| Error::InvalidFilterKind(format!("missing numeric parameter: {key}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn filters_serialize_with_type_tags() {
        let mut tags = BTreeMap::new();
        tags.insert("env".to_string(), "prod".to_string());
        let query = SessionQuery::new()
            .for_sut("api", MatchKind::Substring)
            .unwrap()
            .with_tags(&tags, MatchKind::Exact)
            .unwrap()
            .with_reruns();

        let value = query.to_value();
        assert_eq!(
            value,
            json!({
                "filters": [
                    { "type": "sut", "kind": "substring", "pattern": "api" },
                    { "type": "tags", "kind": "exact", "tags": { "env": "prod" } },
                    { "type": "has_reruns" },
                ]
            })
        );
    }

    #[test]
    fn unknown_type_tag_is_rejected() {
        let value = json!({ "filters": [ { "type": "telepathy" } ] });
        let err = SessionQuery::from_value(&value).unwrap_err();
        assert!(matches!(err, Error::UnknownSerializedFilterType(tag) if tag == "telepathy"));
    }

    #[test]
    fn malformed_parameters_are_invalid_not_unknown() {
        let value = json!({ "filters": [ { "type": "sut", "kind": "psychic", "pattern": "x" } ] });
        let err = SessionQuery::from_value(&value).unwrap_err();
        assert!(matches!(err, Error::InvalidFilterKind(_)));

        let value = json!({ "filters": [ { "type": "duration-ish" } ] });
        assert!(matches!(
            SessionQuery::from_value(&value).unwrap_err(),
            Error::UnknownSerializedFilterType(_)
        ));
    }

    #[test]
    fn bad_regex_in_serialized_filter_fails_fast() {
        let value = json!({
            "filters": [
                { "type": "test_level", "filters": [
                    { "type": "regex", "field": "log", "pattern": "[unclosed" }
                ]}
            ]
        });
        assert!(matches!(
            SessionQuery::from_value(&value).unwrap_err(),
            Error::InvalidFilterKind(_)
        ));
    }
}
