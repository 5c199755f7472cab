use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Timelike, Utc};
use serde::Serialize;

use suitelens_types::{TestOutcome, TestResult};

/// Failure recurrence profile for one nodeid.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeidFailures {
    pub count: usize,
    pub avg_duration: f64,
    pub first_failure: DateTime<Utc>,
    pub last_failure: DateTime<Utc>,
}

/// Failure count and distinct tests sharing one bucket.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FailureBucket {
    pub count: usize,
    pub unique_nodeids: usize,
}

/// Three independent groupings of the failed results in a series.
///
/// The groupings overlap by construction: a single failure contributes to
/// its nodeid, its minute, and its duration bucket.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FailurePatterns {
    pub total_failures: usize,
    pub by_nodeid: BTreeMap<String, NodeidFailures>,
    /// Keyed by start time truncated to the minute.
    pub by_minute: BTreeMap<DateTime<Utc>, FailureBucket>,
    /// Keyed by the lower bound of a 10-second duration bucket.
    pub by_duration: BTreeMap<u64, FailureBucket>,
}

fn truncate_to_minute(ts: DateTime<Utc>) -> DateTime<Utc> {
    ts.with_second(0)
        .and_then(|t| t.with_nanosecond(0))
        .unwrap_or(ts)
}

/// Group the failed results of a series by nodeid, minute, and duration
/// bucket.
pub fn detect_patterns(results: &[TestResult]) -> FailurePatterns {
    let failed: Vec<&TestResult> = results
        .iter()
        .filter(|r| r.outcome == TestOutcome::Failed)
        .collect();

    let mut by_nodeid: BTreeMap<String, NodeidFailures> = BTreeMap::new();
    for failure in &failed {
        by_nodeid
            .entry(failure.nodeid.clone())
            .and_modify(|entry| {
                entry.count += 1;
                entry.avg_duration += failure.duration;
                entry.first_failure = entry.first_failure.min(failure.start_time);
                entry.last_failure = entry.last_failure.max(failure.start_time);
            })
            .or_insert(NodeidFailures {
                count: 1,
                avg_duration: failure.duration,
                first_failure: failure.start_time,
                last_failure: failure.start_time,
            });
    }
    for entry in by_nodeid.values_mut() {
        entry.avg_duration /= entry.count as f64;
    }

    let mut minute_nodeids: BTreeMap<DateTime<Utc>, BTreeSet<&str>> = BTreeMap::new();
    let mut by_minute: BTreeMap<DateTime<Utc>, FailureBucket> = BTreeMap::new();
    for failure in &failed {
        let key = truncate_to_minute(failure.start_time);
        let bucket = by_minute.entry(key).or_insert(FailureBucket {
            count: 0,
            unique_nodeids: 0,
        });
        bucket.count += 1;
        minute_nodeids
            .entry(key)
            .or_default()
            .insert(failure.nodeid.as_str());
    }
    for (key, nodeids) in &minute_nodeids {
        if let Some(bucket) = by_minute.get_mut(key) {
            bucket.unique_nodeids = nodeids.len();
        }
    }

    let mut duration_nodeids: BTreeMap<u64, BTreeSet<&str>> = BTreeMap::new();
    let mut by_duration: BTreeMap<u64, FailureBucket> = BTreeMap::new();
    for failure in &failed {
        let key = (failure.duration / 10.0).floor() as u64 * 10;
        let bucket = by_duration.entry(key).or_insert(FailureBucket {
            count: 0,
            unique_nodeids: 0,
        });
        bucket.count += 1;
        duration_nodeids
            .entry(key)
            .or_default()
            .insert(failure.nodeid.as_str());
    }
    for (key, nodeids) in &duration_nodeids {
        if let Some(bucket) = by_duration.get_mut(key) {
            bucket.unique_nodeids = nodeids.len();
        }
    }

    FailurePatterns {
        total_failures: failed.len(),
        by_nodeid,
        by_minute,
        by_duration,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use suitelens_testing::{ResultBuilder, base_time};

    #[test]
    fn only_failed_results_are_grouped() {
        let results = vec![
            ResultBuilder::new("a").outcome(TestOutcome::Passed).build(),
            ResultBuilder::new("b").outcome(TestOutcome::Error).build(),
            ResultBuilder::new("c").outcome(TestOutcome::Failed).build(),
        ];
        let patterns = detect_patterns(&results);
        assert_eq!(patterns.total_failures, 1);
        assert_eq!(patterns.by_nodeid.len(), 1);
        assert!(patterns.by_nodeid.contains_key("c"));
    }

    #[test]
    fn nodeid_grouping_tracks_count_window_and_average() {
        let results = vec![
            ResultBuilder::new("flaky")
                .outcome(TestOutcome::Failed)
                .start_offset_secs(0)
                .duration(2.0)
                .build(),
            ResultBuilder::new("flaky")
                .outcome(TestOutcome::Failed)
                .start_offset_secs(600)
                .duration(4.0)
                .build(),
        ];
        let patterns = detect_patterns(&results);
        let entry = &patterns.by_nodeid["flaky"];
        assert_eq!(entry.count, 2);
        assert_eq!(entry.avg_duration, 3.0);
        assert_eq!(entry.first_failure, base_time());
        assert_eq!(entry.last_failure, base_time() + chrono::Duration::seconds(600));
    }

    #[test]
    fn minute_buckets_count_distinct_nodeids() {
        let results = vec![
            ResultBuilder::new("a")
                .outcome(TestOutcome::Failed)
                .start_offset_secs(10)
                .build(),
            ResultBuilder::new("a")
                .outcome(TestOutcome::Failed)
                .start_offset_secs(20)
                .build(),
            ResultBuilder::new("b")
                .outcome(TestOutcome::Failed)
                .start_offset_secs(30)
                .build(),
            ResultBuilder::new("c")
                .outcome(TestOutcome::Failed)
                .start_offset_secs(90)
                .build(),
        ];
        let patterns = detect_patterns(&results);
        assert_eq!(patterns.by_minute.len(), 2);

        let first_minute = &patterns.by_minute[&base_time()];
        assert_eq!(first_minute.count, 3);
        assert_eq!(first_minute.unique_nodeids, 2);
    }

    #[test]
    fn duration_buckets_round_down_to_tens() {
        let results = vec![
            ResultBuilder::new("a")
                .outcome(TestOutcome::Failed)
                .duration(3.0)
                .build(),
            ResultBuilder::new("b")
                .outcome(TestOutcome::Failed)
                .duration(9.9)
                .build(),
            ResultBuilder::new("c")
                .outcome(TestOutcome::Failed)
                .duration(25.0)
                .build(),
        ];
        let patterns = detect_patterns(&results);
        assert_eq!(patterns.by_duration[&0].count, 2);
        assert_eq!(patterns.by_duration[&20].count, 1);
    }
}
