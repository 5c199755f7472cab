use serde::Serialize;

use suitelens_types::TestResult;

use super::metrics::failure_rate;

const FAILURE_WEIGHT: f64 = 0.4;
const DURATION_WEIGHT: f64 = 0.3;
const WARNING_WEIGHT: f64 = 0.3;
/// Average duration (seconds) at which the duration component bottoms out.
const DURATION_CEILING_SECS: f64 = 10.0;

/// Weighted 0-100 health blend of failure, duration, and warning pressure,
/// with the component rates that produced it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HealthReport {
    pub score: f64,
    pub failure_rate: f64,
    pub warning_rate: f64,
    pub avg_duration: f64,
}

/// Score a result series: 40% failure-free, 30% fast (relative to a
/// 10-second average ceiling), 30% warning-free. An empty series scores
/// a clean 100.
pub fn health_report(results: &[TestResult]) -> HealthReport {
    if results.is_empty() {
        return HealthReport {
            score: 100.0,
            failure_rate: 0.0,
            warning_rate: 0.0,
            avg_duration: 0.0,
        };
    }

    let failure_rate = failure_rate(results);
    let avg_duration =
        results.iter().map(|r| r.duration).sum::<f64>() / results.len() as f64;
    let warning_rate =
        results.iter().filter(|r| r.has_warning).count() as f64 / results.len() as f64;

    let duration_pressure = (avg_duration / DURATION_CEILING_SECS).min(1.0);
    let score = (FAILURE_WEIGHT * (1.0 - failure_rate)
        + DURATION_WEIGHT * (1.0 - duration_pressure)
        + WARNING_WEIGHT * (1.0 - warning_rate))
        * 100.0;

    HealthReport {
        score: score.clamp(0.0, 100.0),
        failure_rate,
        warning_rate,
        avg_duration,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use suitelens_types::TestOutcome;
    use suitelens_testing::ResultBuilder;

    #[test]
    fn clean_fast_suite_scores_high() {
        let results = vec![
            ResultBuilder::new("a").duration(0.1).build(),
            ResultBuilder::new("b").duration(0.1).build(),
        ];
        let report = health_report(&results);
        assert!(report.score > 99.0);
        assert_eq!(report.failure_rate, 0.0);
    }

    #[test]
    fn failures_warnings_and_slowness_all_drag_the_score() {
        let results = vec![
            ResultBuilder::new("a")
                .outcome(TestOutcome::Failed)
                .duration(20.0)
                .warning()
                .build(),
        ];
        // Every component bottoms out: 0.4*0 + 0.3*0 + 0.3*0.
        let report = health_report(&results);
        assert_eq!(report.score, 0.0);
        assert_eq!(report.failure_rate, 1.0);
        assert_eq!(report.warning_rate, 1.0);
    }

    #[test]
    fn empty_series_scores_clean() {
        assert_eq!(health_report(&[]).score, 100.0);
    }

    #[test]
    fn duration_component_saturates_at_the_ceiling() {
        let slow = vec![ResultBuilder::new("a").duration(10.0).build()];
        let slower = vec![ResultBuilder::new("a").duration(500.0).build()];
        assert_eq!(health_report(&slow).score, health_report(&slower).score);
    }
}
