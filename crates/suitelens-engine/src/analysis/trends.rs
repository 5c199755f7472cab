use chrono::{DateTime, Utc};
use serde::Serialize;

use suitelens_types::{TestOutcome, TestResult};

/// Metric a trend analysis tracks across a result series.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrendMetric {
    /// Wall-clock duration in seconds.
    Duration,
    /// 1.0 for passed, 0.0 for anything else.
    Outcome,
}

/// Direction of a detected trend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendDirection {
    Increasing,
    Decreasing,
    Stable,
    /// Fewer than two results; no direction can be computed.
    InsufficientData,
}

/// One sample of the analyzed series, ordered by time for plotting.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendPoint {
    pub timestamp: DateTime<Utc>,
    pub value: f64,
}

/// Result of a trend detection pass.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendAnalysis {
    pub direction: TrendDirection,
    /// Population standard deviation over the series mean; 0 when the
    /// mean is 0.
    pub volatility: f64,
    pub points: Vec<TrendPoint>,
}

/// Detect the direction and volatility of a metric over time.
///
/// Sorts the series by start time, then compares the average of the first
/// three samples against the average of the last three (or fewer when the
/// series is short). A delta under 10% of the leading average is stable.
pub fn detect_trends(results: &[TestResult], metric: TrendMetric) -> TrendAnalysis {
    if results.len() < 2 {
        return TrendAnalysis {
            direction: TrendDirection::InsufficientData,
            volatility: 0.0,
            points: Vec::new(),
        };
    }

    let mut sorted: Vec<&TestResult> = results.iter().collect();
    sorted.sort_by_key(|r| r.start_time);

    let points: Vec<TrendPoint> = sorted
        .iter()
        .map(|r| TrendPoint {
            timestamp: r.start_time,
            value: match metric {
                TrendMetric::Duration => r.duration,
                TrendMetric::Outcome => {
                    if r.outcome == TestOutcome::Passed {
                        1.0
                    } else {
                        0.0
                    }
                }
            },
        })
        .collect();

    let window = points.len().min(3);
    let head: f64 = points[..window].iter().map(|p| p.value).sum::<f64>() / window as f64;
    let tail: f64 = points[points.len() - window..]
        .iter()
        .map(|p| p.value)
        .sum::<f64>()
        / window as f64;
    let delta = tail - head;

    let direction = if delta.abs() < 0.1 * head {
        TrendDirection::Stable
    } else if delta > 0.0 {
        TrendDirection::Increasing
    } else if delta < 0.0 {
        TrendDirection::Decreasing
    } else {
        // delta == 0 with a zero leading average.
        TrendDirection::Stable
    };

    let mean = points.iter().map(|p| p.value).sum::<f64>() / points.len() as f64;
    let volatility = if mean == 0.0 {
        0.0
    } else {
        let variance = points
            .iter()
            .map(|p| (p.value - mean).powi(2))
            .sum::<f64>()
            / points.len() as f64;
        variance.sqrt() / mean
    };

    TrendAnalysis {
        direction,
        volatility,
        points,
    }
}
