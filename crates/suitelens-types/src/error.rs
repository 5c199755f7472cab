use std::fmt;

/// Result type for suitelens-types operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur in the types layer
#[derive(Debug)]
pub enum Error {
    /// A string did not name a known test outcome
    InvalidOutcome(String),
    /// A timestamp could not be parsed in any accepted form
    InvalidTimestamp(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidOutcome(raw) => write!(f, "invalid test outcome: {}", raw),
            Error::InvalidTimestamp(raw) => write!(f, "invalid timestamp: {}", raw),
        }
    }
}

impl std::error::Error for Error {}
