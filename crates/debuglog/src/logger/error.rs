use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum LoggerError {
    #[error("Logger config is missing")]
    MissingConfig,

    #[error("Logger already initialized")]
    AlreadyInitialized,

    #[error("Invalid timezone: {0}")]
    InvalidTimeZone(String),

    #[error("Invalid log level: {0}")]
    InvalidLevel(String),

    #[error("Invalid field order: {0} (expected: msg_last|alphabetical)")]
    InvalidFieldOrder(String),
}

pub type LoggerResult<T> = Result<T, LoggerError>;

/// Recoverable problem hit while resolving the log location.
///
/// Never aborts initialization; the logger falls back and reports it
/// through [`crate::Logger::warnings`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathWarning {
    #[error("cannot get current directory: {reason}; falling back to \".\"")]
    WorkingDirUnavailable { reason: String },

    #[error("cannot create log directory {}: {reason}; falling back to {}", .path.display(), .fallback.display())]
    LogDirCreateFailed {
        path: PathBuf,
        fallback: PathBuf,
        reason: String,
    },
}
