use std::fmt;

/// Result type for suitelens-storage operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur at the storage boundary
#[derive(Debug)]
pub enum Error {
    /// The backing store failed to produce or persist a session
    Backend(String),
    /// A store lock was poisoned by a panicking writer
    LockPoisoned,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Backend(msg) => write!(f, "storage backend error: {}", msg),
            Error::LockPoisoned => write!(f, "storage lock poisoned"),
        }
    }
}

impl std::error::Error for Error {}
