use std::{
    fmt,
    str::FromStr,
    sync::{OnceLock, RwLock},
};

use serde::{Deserialize, Serialize};
use time::UtcOffset;

use crate::logger::error::LoggerError;

/// Cached local UTC offset.
///
/// Written by `init_local_offset()` or by the first lazy detection.
static LOCAL_OFFSET: RwLock<UtcOffset> = RwLock::new(UtcOffset::UTC);

/// Set once local offset detection has been attempted.
static INIT_DONE: OnceLock<()> = OnceLock::new();

/// Timezone for log timestamps and timestamped file names.
///
/// - `Local`: system timezone (default, falls back to UTC when undetectable)
/// - `Utc`: all timestamps in UTC
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LoggerTimeZone {
    /// UTC timezone.
    Utc,
    /// Local system timezone.
    Local,
}

impl Default for LoggerTimeZone {
    fn default() -> Self {
        Self::Local
    }
}

impl LoggerTimeZone {
    /// Offset to apply to UTC instants for this zone.
    pub(crate) fn offset(self) -> UtcOffset {
        match self {
            LoggerTimeZone::Utc => UtcOffset::UTC,
            LoggerTimeZone::Local => get_or_detect_local_offset(),
        }
    }
}

impl FromStr for LoggerTimeZone {
    type Err = LoggerError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalize = s.trim().to_ascii_lowercase();

        match normalize.as_str() {
            "utc" => Ok(Self::Utc),
            "local" => Ok(Self::Local),
            _ => Err(LoggerError::InvalidTimeZone(s.to_string())),
        }
    }
}

impl fmt::Display for LoggerTimeZone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LoggerTimeZone::Utc => "utc",
            LoggerTimeZone::Local => "local",
        };
        f.write_str(s)
    }
}

/// Detects the local timezone offset early in the program.
///
/// **CRITICAL**: call in `main()` **before spawning any threads**.
/// Offset detection fails in multi-thread contexts on most Unix platforms.
///
/// Falls back to UTC silently if detection fails.
///
/// # Example
/// ```no_run
/// use debuglog::init_local_offset;
///
/// fn main() {
///     init_local_offset();
///     // spawn threads, build loggers...
/// }
/// ```
pub fn init_local_offset() {
    let offset = UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC);
    if let Ok(mut guard) = LOCAL_OFFSET.write() {
        *guard = offset;
    }
    let _ = INIT_DONE.set(());
}

/// Returns the cached local offset, detecting it on first use.
pub(crate) fn get_or_detect_local_offset() -> UtcOffset {
    INIT_DONE.get_or_init(|| {
        if let Ok(detected) = UtcOffset::current_local_offset() {
            if let Ok(mut guard) = LOCAL_OFFSET.write() {
                *guard = detected;
            }
        }
    });

    LOCAL_OFFSET
        .read()
        .map(|guard| *guard)
        .unwrap_or(UtcOffset::UTC)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_local() {
        assert_eq!(LoggerTimeZone::default(), LoggerTimeZone::Local);
    }

    #[test]
    fn parses_case_insensitive() {
        assert_eq!(LoggerTimeZone::from_str("utc").unwrap(), LoggerTimeZone::Utc);
        assert_eq!(LoggerTimeZone::from_str("UTC").unwrap(), LoggerTimeZone::Utc);
        assert_eq!(
            LoggerTimeZone::from_str(" Local ").unwrap(),
            LoggerTimeZone::Local
        );
    }

    #[test]
    fn rejects_invalid_timezone() {
        assert!(LoggerTimeZone::from_str("").is_err());
        assert!(LoggerTimeZone::from_str("pst").is_err());
    }

    #[test]
    fn display_returns_canonical_names() {
        assert_eq!(LoggerTimeZone::Utc.to_string(), "utc");
        assert_eq!(LoggerTimeZone::Local.to_string(), "local");
    }

    #[test]
    fn serde_uses_lowercase_names() {
        let json = serde_json::to_string(&LoggerTimeZone::Utc).unwrap();
        assert_eq!(json, r#""utc""#);

        let parsed: LoggerTimeZone = serde_json::from_str(r#""local""#).unwrap();
        assert_eq!(parsed, LoggerTimeZone::Local);
    }

    #[test]
    fn utc_offset_is_zero() {
        assert_eq!(LoggerTimeZone::Utc.offset(), UtcOffset::UTC);
    }

    #[test]
    fn local_offset_is_sane() {
        init_local_offset();
        let offset = LoggerTimeZone::Local.offset();
        assert!(offset.whole_hours().abs() <= 14);
    }
}
