// Engine crate - query, comparison, and analytics over recorded sessions
// This layer sits between the domain model (types) and any front end

pub mod analysis;
pub mod comparison;
pub mod error;
pub mod query;

pub use analysis::{
    FailurePatterns, HealthReport, SuiteMetrics, TestMetrics, TrendAnalysis, TrendDirection,
    TrendMetric, detect_patterns, detect_trends, failure_rate, health_report, suite_metrics,
    test_metrics,
};
pub use comparison::{Comparison, ComparisonResult};
pub use error::{Error, Result};
pub use query::{
    MatchKind, OutcomeScope, QueryResult, SessionQuery, TestInsight, TestQuery, TextField,
};
