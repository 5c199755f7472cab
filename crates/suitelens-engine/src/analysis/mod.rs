//! Analytics primitives over flat result series.
//!
//! Pure functions: nothing here touches storage or mutates its input.
//! Callers typically feed them `QueryResult::test_results()` output.

pub mod health;
pub mod metrics;
pub mod patterns;
pub mod trends;

pub use health::{HealthReport, health_report};
pub use metrics::{SuiteMetrics, TestMetrics, failure_rate, suite_metrics, test_metrics};
pub use patterns::{FailureBucket, FailurePatterns, NodeidFailures, detect_patterns};
pub use trends::{TrendAnalysis, TrendDirection, TrendMetric, TrendPoint, detect_trends};
