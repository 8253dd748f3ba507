use std::{path::PathBuf, time::Duration};

use serde::{Deserialize, Serialize};

use crate::logger::object::{FieldOrder, LoggerLevel, LoggerTimeZone};

/// Default rotation threshold in megabytes.
pub const DEFAULT_MAX_SIZE_MB: u64 = 500;
/// Default number of rotated files to keep.
pub const DEFAULT_MAX_BACKUPS: u32 = 3;
/// Default retention of rotated files in days.
pub const DEFAULT_MAX_AGE_DAYS: u32 = 3;

const MEGABYTE: u64 = 1024 * 1024;
const DAY: Duration = Duration::from_secs(24 * 60 * 60);

/// Logger configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Base name of the log file.
    pub name: String,
    /// Create a `log` subdirectory under the base path.
    pub make_dir: bool,
    /// Name the file by process ID instead of a start timestamp.
    pub use_pid: bool,
    /// Duplicate every record to stdout.
    pub use_multi_writer: bool,
    /// Rotation limits.
    #[serde(rename = "rotate_config")]
    pub rotate: RotateConfig,
    /// Log level filter expression (e.g., "info", "my_crate=debug,info").
    pub level: LoggerLevel,
    /// Timezone for record timestamps and the file-name stamp.
    pub tz: LoggerTimeZone,
    /// Precedence rule for rendered fields.
    pub field_order: FieldOrder,
    /// Explicit base directory; wins over `LOG_BASE_PATH`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_path: Option<PathBuf>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            name: "app".to_string(),
            make_dir: false,
            use_pid: false,
            use_multi_writer: false,
            rotate: RotateConfig::default(),
            level: LoggerLevel::default(),
            tz: LoggerTimeZone::default(),
            field_order: FieldOrder::default(),
            base_path: None,
        }
    }
}

/// Rotation limits as configured.
///
/// Zero in a numeric field means "use the default"; see [`RotateConfig::effective`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RotateConfig {
    /// Rotate once the active file would exceed this many megabytes.
    pub max_size: u64,
    /// Keep at most this many rotated files.
    pub max_backups: u32,
    /// Remove rotated files older than this many days.
    pub max_age: u32,
    /// Gzip rotated files.
    pub compress: bool,
}

impl RotateConfig {
    /// Returns a copy with every zero-valued limit replaced by its default.
    ///
    /// # Examples
    /// ```
    /// use debuglog::RotateConfig;
    ///
    /// let cfg = RotateConfig::default().effective();
    /// assert_eq!((cfg.max_size, cfg.max_backups, cfg.max_age), (500, 3, 3));
    /// assert!(!cfg.compress);
    /// ```
    pub fn effective(&self) -> Self {
        Self {
            max_size: non_zero_or(self.max_size, DEFAULT_MAX_SIZE_MB),
            max_backups: non_zero_or(self.max_backups, DEFAULT_MAX_BACKUPS),
            max_age: non_zero_or(self.max_age, DEFAULT_MAX_AGE_DAYS),
            compress: self.compress,
        }
    }

    /// Converts the (defaulted) limits into writer units.
    pub fn policy(&self) -> RotatePolicy {
        let cfg = self.effective();
        RotatePolicy {
            max_bytes: cfg.max_size.saturating_mul(MEGABYTE),
            max_backups: cfg.max_backups as usize,
            max_age: DAY.saturating_mul(cfg.max_age),
            compress: cfg.compress,
        }
    }
}

fn non_zero_or<T: Default + PartialEq>(value: T, default: T) -> T {
    if value == T::default() { default } else { value }
}

/// Effective rotation limits used by [`crate::RotatingFile`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RotatePolicy {
    pub max_bytes: u64,
    pub max_backups: usize,
    pub max_age: Duration,
    pub compress: bool,
}

impl Default for RotatePolicy {
    fn default() -> Self {
        RotateConfig::default().policy()
    }
}
