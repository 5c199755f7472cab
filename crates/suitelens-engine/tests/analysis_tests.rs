use suitelens_engine::{
    MatchKind, SessionQuery, TrendDirection, TrendMetric, detect_patterns, detect_trends,
    failure_rate, health_report, suite_metrics, test_metrics,
};
use suitelens_testing::{ResultBuilder, SessionBuilder};
use suitelens_types::{TestOutcome, TestResult, TestSession};

fn nightly_sessions() -> Vec<TestSession> {
    // Five nightly runs of the same suite; test_search degrades over time.
    (0..5)
        .map(|night| {
            let offset = night as i64 * 86_400;
            SessionBuilder::new(&format!("nightly-{night}"), "api-service")
                .start_offset_secs(offset)
                .result(
                    ResultBuilder::new("test_search")
                        .start_offset_secs(offset)
                        .duration(if night == 4 { 5.0 } else { 1.0 })
                        .build(),
                )
                .result(
                    ResultBuilder::new("test_login")
                        .start_offset_secs(offset + 10)
                        .outcome(if night >= 3 {
                            TestOutcome::Failed
                        } else {
                            TestOutcome::Passed
                        })
                        .duration(0.5)
                        .build(),
                )
                .build()
        })
        .collect()
}

fn flat_results(sessions: &[TestSession]) -> Vec<TestResult> {
    sessions
        .iter()
        .flat_map(|s| s.test_results.iter().cloned())
        .collect()
}

#[test]
fn filtered_sessions_feed_the_analysis_primitives() {
    let pool = nightly_sessions();

    let result = SessionQuery::new()
        .for_sut("api-service", MatchKind::Exact)
        .unwrap()
        .execute(Some(&pool))
        .unwrap();

    let results: Vec<TestResult> = result.test_results().cloned().collect();
    assert_eq!(results.len(), 10);

    // 2 failed logins out of 10 non-skipped results.
    assert_eq!(failure_rate(&results), 0.2);

    let metrics = test_metrics(&results);
    assert_eq!(metrics.total_count, 10);
    assert_eq!(metrics.min_duration, 0.5);
    assert_eq!(metrics.max_duration, 5.0);

    let rollup = suite_metrics(&results);
    assert_eq!(rollup.success_rate, 0.8);
    assert_eq!(rollup.skipped_rate, 0.0);
    assert_eq!(rollup.total_duration, 11.5);
}

#[test]
fn search_durations_trend_upward_across_nights() {
    let pool = nightly_sessions();
    let search_runs: Vec<TestResult> = flat_results(&pool)
        .into_iter()
        .filter(|r| r.nodeid == "test_search")
        .collect();

    let analysis = detect_trends(&search_runs, TrendMetric::Duration);
    assert_eq!(analysis.direction, TrendDirection::Increasing);
    assert_eq!(analysis.points.len(), 5);
    assert!(analysis.volatility > 0.0);
}

#[test]
fn login_outcomes_trend_downward_across_nights() {
    let pool = nightly_sessions();
    let login_runs: Vec<TestResult> = flat_results(&pool)
        .into_iter()
        .filter(|r| r.nodeid == "test_login")
        .collect();

    let analysis = detect_trends(&login_runs, TrendMetric::Outcome);
    assert_eq!(analysis.direction, TrendDirection::Decreasing);
}

#[test]
fn failure_patterns_group_the_failing_logins() {
    let pool = nightly_sessions();
    let results = flat_results(&pool);

    let patterns = detect_patterns(&results);
    assert_eq!(patterns.total_failures, 2);
    assert_eq!(patterns.by_nodeid.len(), 1);
    let login = &patterns.by_nodeid["test_login"];
    assert_eq!(login.count, 2);
    assert_eq!(login.avg_duration, 0.5);
    assert!(login.first_failure < login.last_failure);
    // Failures happened on different nights, so distinct minute buckets.
    assert_eq!(patterns.by_minute.len(), 2);
    // Both sub-second failures share the lowest duration bucket.
    assert_eq!(patterns.by_duration[&0].count, 2);
    assert_eq!(patterns.by_duration[&0].unique_nodeids, 1);
}

#[test]
fn health_score_blends_failures_duration_and_warnings() {
    let results = vec![
        ResultBuilder::new("a").duration(5.0).build(),
        ResultBuilder::new("b")
            .outcome(TestOutcome::Failed)
            .duration(5.0)
            .warning()
            .build(),
    ];

    let report = health_report(&results);
    // failure_rate 0.5, avg duration 5s (half the ceiling), warning rate 0.5:
    // 0.4*0.5 + 0.3*0.5 + 0.3*0.5 = 0.5 -> 50.
    assert!((report.score - 50.0).abs() < 1e-9);
    assert_eq!(report.failure_rate, 0.5);
    assert_eq!(report.warning_rate, 0.5);
    assert_eq!(report.avg_duration, 5.0);
}
