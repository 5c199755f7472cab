use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::outcome::TestOutcome;
use crate::result::TestResult;

/// Chronological sequence of repeated executions of one nodeid within a
/// session.
///
/// Groups exist only for nodeids that ran more than once. Capture
/// guarantees that every member but the last carries
/// [`TestOutcome::Rerun`]; see [`RerunTestGroup::is_consistent`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RerunTestGroup {
    pub nodeid: String,
    /// Attempts ordered by start time; the last entry is the final attempt.
    pub tests: Vec<TestResult>,
}

impl RerunTestGroup {
    /// Outcome of the final attempt, if the group has any.
    pub fn final_outcome(&self) -> Option<TestOutcome> {
        self.tests.last().map(|t| t.outcome)
    }

    /// Whether the capture-side sequencing contract holds: every attempt
    /// but the last is a rerun, and the last is not.
    ///
    /// The grouping transform trusts capture and does not re-verify this;
    /// the method exists so callers can observe the gap instead of
    /// silently assuming it away.
    pub fn is_consistent(&self) -> bool {
        match self.tests.split_last() {
            Some((last, rest)) => {
                last.outcome != TestOutcome::Rerun
                    && rest.iter().all(|t| t.outcome == TestOutcome::Rerun)
            }
            None => false,
        }
    }
}

/// Bucket a session's flat result list into rerun groups.
///
/// Results are grouped by nodeid and ordered by start time within each
/// bucket; only nodeids with more than one result produce a group. Groups
/// come back in first-appearance order of their nodeid in the input.
pub fn group_reruns(results: &[TestResult]) -> Vec<RerunTestGroup> {
    let mut order: Vec<&str> = Vec::new();
    let mut buckets: HashMap<&str, Vec<&TestResult>> = HashMap::new();
    for result in results {
        let bucket = buckets.entry(result.nodeid.as_str()).or_insert_with(|| {
            order.push(result.nodeid.as_str());
            Vec::new()
        });
        bucket.push(result);
    }

    order
        .into_iter()
        .filter_map(|nodeid| {
            let attempts = buckets.remove(nodeid)?;
            if attempts.len() < 2 {
                return None;
            }
            let mut tests: Vec<TestResult> = attempts.into_iter().cloned().collect();
            tests.sort_by_key(|t| t.start_time);
            Some(RerunTestGroup {
                nodeid: nodeid.to_string(),
                tests,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn result(nodeid: &str, outcome: TestOutcome, offset_secs: i64) -> TestResult {
        TestResult {
            nodeid: nodeid.to_string(),
            outcome,
            start_time: Utc.with_ymd_and_hms(2026, 3, 2, 12, 0, 0).unwrap()
                + chrono::Duration::seconds(offset_secs),
            duration: 1.0,
            log: String::new(),
            stdout: String::new(),
            stderr: String::new(),
            long_repr: String::new(),
            has_warning: false,
            unreliable: false,
        }
    }

    #[test]
    fn single_results_produce_no_group() {
        let results = vec![
            result("test_a", TestOutcome::Passed, 0),
            result("test_b", TestOutcome::Failed, 1),
        ];
        assert!(group_reruns(&results).is_empty());
    }

    #[test]
    fn repeated_nodeids_group_in_chronological_order() {
        let results = vec![
            result("test_a", TestOutcome::Passed, 10),
            result("test_a", TestOutcome::Rerun, 0),
            result("test_a", TestOutcome::Rerun, 5),
            result("test_b", TestOutcome::Passed, 2),
        ];

        let groups = group_reruns(&results);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].nodeid, "test_a");
        assert_eq!(groups[0].tests.len(), 3);
        let offsets: Vec<_> = groups[0].tests.iter().map(|t| t.start_time).collect();
        assert!(offsets.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(groups[0].final_outcome(), Some(TestOutcome::Passed));
        assert!(groups[0].is_consistent());
    }

    #[test]
    fn inconsistent_sequences_are_grouped_but_flagged() {
        let results = vec![
            result("test_a", TestOutcome::Failed, 0),
            result("test_a", TestOutcome::Passed, 5),
        ];

        let groups = group_reruns(&results);
        assert_eq!(groups.len(), 1);
        assert!(!groups[0].is_consistent());
    }
}
