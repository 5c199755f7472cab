use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// Outcome of a single test execution.
///
/// `Rerun` marks an intermediate attempt inside a rerun group; every other
/// variant is a terminal outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TestOutcome {
    Passed,
    Failed,
    Error,
    Skipped,
    Xfailed,
    Xpassed,
    Rerun,
}

impl TestOutcome {
    /// Whether this outcome counts as a failure (failed or errored).
    pub fn is_failed(self) -> bool {
        matches!(self, TestOutcome::Failed | TestOutcome::Error)
    }

    /// Lowercase wire representation.
    pub fn as_str(self) -> &'static str {
        match self {
            TestOutcome::Passed => "passed",
            TestOutcome::Failed => "failed",
            TestOutcome::Error => "error",
            TestOutcome::Skipped => "skipped",
            TestOutcome::Xfailed => "xfailed",
            TestOutcome::Xpassed => "xpassed",
            TestOutcome::Rerun => "rerun",
        }
    }
}

impl fmt::Display for TestOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TestOutcome {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "passed" => Ok(TestOutcome::Passed),
            "failed" => Ok(TestOutcome::Failed),
            "error" => Ok(TestOutcome::Error),
            "skipped" => Ok(TestOutcome::Skipped),
            "xfailed" => Ok(TestOutcome::Xfailed),
            "xpassed" => Ok(TestOutcome::Xpassed),
            "rerun" => Ok(TestOutcome::Rerun),
            _ => Err(Error::InvalidOutcome(s.to_string())),
        }
    }
}
