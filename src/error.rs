//! Error types shared by every stormtrack module.

use thiserror::Error;

/// Errors raised while loading, filtering or matching storms.
///
/// "No storm nearby" is never an error: the matcher reports it as a
/// `None` id with an infinite distance.
#[derive(Debug, Error)]
pub enum StormError {
    /// Persisted format is not recognized
    #[error("Unrecognized storm data format: {0}")]
    InvalidFormat(String),

    /// A record is missing a required column or holds a malformed value
    #[error("Parse error: {0}")]
    Parse(String),

    /// Unknown filter key, unknown storm type or unparseable bound
    #[error("Invalid filter: {0}")]
    InvalidFilter(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Projection error: {0}")]
    Projection(String),
}

impl From<csv::Error> for StormError {
    fn from(err: csv::Error) -> Self {
        let message = err.to_string();
        match err.into_kind() {
            csv::ErrorKind::Io(io) => StormError::Io(io),
            _ => StormError::Parse(message),
        }
    }
}

impl From<serde_json::Error> for StormError {
    fn from(err: serde_json::Error) -> Self {
        StormError::Serialization(err.to_string())
    }
}

#[cfg(feature = "snapshot")]
impl From<bincode::Error> for StormError {
    fn from(err: bincode::Error) -> Self {
        match *err {
            bincode::ErrorKind::Io(io) => StormError::Io(io),
            other => StormError::Serialization(other.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, StormError>;
