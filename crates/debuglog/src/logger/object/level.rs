use std::{convert::TryFrom, str::FromStr};

use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;

use crate::logger::LoggerError;

/// Validated `tracing_subscriber::EnvFilter` expression.
///
/// Stores the raw filter string (e.g. `"info"`, `"my_crate=trace,info"`),
/// checked with `EnvFilter::try_new` on construction, and turned into a
/// real filter when the logger is built.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "String")]
#[serde(into = "String")]
pub struct LoggerLevel(String);

impl LoggerLevel {
    /// Creates a new `LoggerLevel` from a string-like value.
    ///
    /// # Examples
    /// ```
    /// use debuglog::LoggerLevel;
    ///
    /// let lvl = LoggerLevel::new("debug").unwrap();
    /// assert_eq!(lvl.as_str(), "debug");
    /// ```
    pub fn new(s: impl Into<String>) -> Result<Self, LoggerError> {
        Self::try_from(s.into())
    }

    /// Returns the filter string exactly as configured.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Builds the `EnvFilter` for this expression.
    pub fn to_env_filter(&self) -> EnvFilter {
        EnvFilter::try_new(self.as_str()).unwrap_or_else(|_| EnvFilter::new("info"))
    }
}

impl Default for LoggerLevel {
    fn default() -> Self {
        Self("info".to_string())
    }
}

impl FromStr for LoggerLevel {
    type Err = LoggerError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::try_from(s.to_owned())
    }
}

impl TryFrom<String> for LoggerLevel {
    type Error = LoggerError;
    fn try_from(s: String) -> Result<Self, Self::Error> {
        match EnvFilter::try_new(&s) {
            Ok(_) => Ok(LoggerLevel(s)),
            Err(e) => Err(LoggerError::InvalidLevel(format!("{}: {}", s, e))),
        }
    }
}

impl From<LoggerLevel> for String {
    fn from(l: LoggerLevel) -> Self {
        l.0
    }
}
