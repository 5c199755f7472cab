use serde::Serialize;

use suitelens_types::{TestOutcome, TestResult};

/// Basic aggregate statistics for a result series.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TestMetrics {
    pub total_count: usize,
    pub failure_rate: f64,
    pub avg_duration: f64,
    pub min_duration: f64,
    pub max_duration: f64,
}

/// Extended rollup used by report front ends.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SuiteMetrics {
    pub total_count: usize,
    pub failure_rate: f64,
    /// `1 - failure_rate`.
    pub success_rate: f64,
    pub skipped_rate: f64,
    pub warning_rate: f64,
    pub total_duration: f64,
    pub avg_duration: f64,
}

/// Share of failed results among the non-skipped ones.
///
/// Skipped tests never ran, so they are excluded from the denominator;
/// 0.0 when nothing relevant ran.
pub fn failure_rate(results: &[TestResult]) -> f64 {
    let relevant = results
        .iter()
        .filter(|r| r.outcome != TestOutcome::Skipped)
        .count();
    if relevant == 0 {
        return 0.0;
    }
    let failures = results
        .iter()
        .filter(|r| r.outcome == TestOutcome::Failed)
        .count();
    failures as f64 / relevant as f64
}

/// Count, failure rate, and duration spread; all zero on empty input.
pub fn test_metrics(results: &[TestResult]) -> TestMetrics {
    if results.is_empty() {
        return TestMetrics {
            total_count: 0,
            failure_rate: 0.0,
            avg_duration: 0.0,
            min_duration: 0.0,
            max_duration: 0.0,
        };
    }

    let mut min_duration = f64::INFINITY;
    let mut max_duration = f64::NEG_INFINITY;
    let mut total_duration = 0.0;
    for result in results {
        min_duration = min_duration.min(result.duration);
        max_duration = max_duration.max(result.duration);
        total_duration += result.duration;
    }

    TestMetrics {
        total_count: results.len(),
        failure_rate: failure_rate(results),
        avg_duration: total_duration / results.len() as f64,
        min_duration,
        max_duration,
    }
}

/// Totals plus success, skip, and warning rates for a result series.
pub fn suite_metrics(results: &[TestResult]) -> SuiteMetrics {
    let base = test_metrics(results);
    let total_duration: f64 = results.iter().map(|r| r.duration).sum();
    let (skipped_rate, warning_rate) = if results.is_empty() {
        (0.0, 0.0)
    } else {
        let skipped = results
            .iter()
            .filter(|r| r.outcome == TestOutcome::Skipped)
            .count();
        let warned = results.iter().filter(|r| r.has_warning).count();
        (
            skipped as f64 / results.len() as f64,
            warned as f64 / results.len() as f64,
        )
    };

    SuiteMetrics {
        total_count: base.total_count,
        failure_rate: base.failure_rate,
        success_rate: 1.0 - base.failure_rate,
        skipped_rate,
        warning_rate,
        total_duration,
        avg_duration: base.avg_duration,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use suitelens_testing::ResultBuilder;

    #[test]
    fn skipped_results_leave_the_denominator() {
        let results = vec![
            ResultBuilder::new("a").outcome(TestOutcome::Failed).build(),
            ResultBuilder::new("b").outcome(TestOutcome::Passed).build(),
            ResultBuilder::new("c").outcome(TestOutcome::Skipped).build(),
            ResultBuilder::new("d").outcome(TestOutcome::Skipped).build(),
        ];
        // One failure among two non-skipped results.
        assert_eq!(failure_rate(&results), 0.5);
    }

    #[test]
    fn all_skipped_means_zero_rate() {
        let results = vec![
            ResultBuilder::new("a").outcome(TestOutcome::Skipped).build(),
        ];
        assert_eq!(failure_rate(&results), 0.0);
        assert_eq!(failure_rate(&[]), 0.0);
    }

    #[test]
    fn metrics_are_zero_on_empty_input() {
        let metrics = test_metrics(&[]);
        assert_eq!(metrics.total_count, 0);
        assert_eq!(metrics.failure_rate, 0.0);
        assert_eq!(metrics.avg_duration, 0.0);
        assert_eq!(metrics.min_duration, 0.0);
        assert_eq!(metrics.max_duration, 0.0);
    }

    #[test]
    fn duration_spread_is_computed() {
        let results = vec![
            ResultBuilder::new("a").duration(1.0).build(),
            ResultBuilder::new("b").duration(3.0).build(),
            ResultBuilder::new("c").duration(5.0).build(),
        ];
        let metrics = test_metrics(&results);
        assert_eq!(metrics.total_count, 3);
        assert_eq!(metrics.avg_duration, 3.0);
        assert_eq!(metrics.min_duration, 1.0);
        assert_eq!(metrics.max_duration, 5.0);
    }

    #[test]
    fn suite_rollup_tracks_rates() {
        let results = vec![
            ResultBuilder::new("a").outcome(TestOutcome::Failed).build(),
            ResultBuilder::new("b").warning().build(),
            ResultBuilder::new("c").outcome(TestOutcome::Skipped).build(),
            ResultBuilder::new("d").build(),
        ];
        let rollup = suite_metrics(&results);
        assert_eq!(rollup.skipped_rate, 0.25);
        assert_eq!(rollup.warning_rate, 0.25);
        assert!((rollup.failure_rate - 1.0 / 3.0).abs() < 1e-12);
        assert!((rollup.success_rate - 2.0 / 3.0).abs() < 1e-12);
    }
}
