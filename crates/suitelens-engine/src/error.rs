use std::fmt;

/// Result type for suitelens-engine operations
pub type Result<T> = std::result::Result<T, Error>;

/// Failures produced by the query, comparison, and serialization layers.
///
/// Every variant is a synchronous, non-retryable usage or configuration
/// error: no partial results accompany an error, and nothing here is a
/// transient fault worth retrying.
#[derive(Debug)]
pub enum Error {
    /// A filter was constructed with an unsupported match kind, an unknown
    /// field, unusable bounds, or an unparsable regex. Detected at
    /// construction time so malformed pipelines fail before touching data.
    InvalidFilterKind(String),
    /// Comparison configuration or execution failed.
    Comparison(String),
    /// A serialized filter carried a type tag with no registered kind.
    UnknownSerializedFilterType(String),
    /// A query was executed without a session pool or an attached store.
    Query(String),
    /// The storage collaborator failed.
    Store(suitelens_storage::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidFilterKind(msg) => write!(f, "invalid filter: {}", msg),
            Error::Comparison(msg) => write!(f, "comparison error: {}", msg),
            Error::UnknownSerializedFilterType(tag) => {
                write!(f, "unknown serialized filter type: {}", tag)
            }
            Error::Query(msg) => write!(f, "query error: {}", msg),
            Error::Store(err) => write!(f, "store error: {}", err),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Store(err) => Some(err),
            _ => None,
        }
    }
}

impl From<suitelens_storage::Error> for Error {
    fn from(err: suitelens_storage::Error) -> Self {
        Error::Store(err)
    }
}
