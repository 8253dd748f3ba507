mod config;
mod error;
mod format;
mod log;
mod object;
mod path;
mod writer;

pub use config::{LogConfig, RotateConfig, RotatePolicy};
pub use error::{LoggerError, LoggerResult, PathWarning};
pub use format::TextFormat;
pub use log::Logger;
pub use object::{FieldOrder, LoggerLevel, LoggerTimeZone, init_local_offset};
pub use path::{BaseSource, LOG_BASE_PATH_ENV, LOG_SUBDIR};
pub use writer::{RotatingFile, RotatingFileWriter};

/// Builds a logger writing to a rotated file described by `cfg`.
///
/// Resolution of the log location never fails: an unreadable working
/// directory or an uncreatable `log/` subdirectory is replaced by a fallback
/// and reported through [`Logger::warnings`] and as a warning record in the
/// new log. Only an absent config is an error.
///
/// The logger is not installed anywhere; see [`Logger::in_scope`] and
/// [`Logger::install_global`].
///
/// # Important: Local Timezone
/// With `LoggerTimeZone::Local`, call [`init_local_offset`] in `main()`
/// before spawning any threads, otherwise timestamps may fall back to UTC.
///
/// # Examples
/// ```no_run
/// use debuglog::{LogConfig, init_logger};
///
/// fn main() {
///     let config = LogConfig {
///         name: "worker".into(),
///         make_dir: true,
///         use_pid: true,
///         ..Default::default()
///     };
///     let logger = init_logger(Some(&config)).expect("Failed to initialize logger");
///     logger.install_global().expect("Logger already installed");
///
///     tracing::info!(path = %logger.path().display(), "ready");
/// }
/// ```
pub fn init_logger(cfg: Option<&LogConfig>) -> LoggerResult<Logger> {
    let cfg = cfg.ok_or(LoggerError::MissingConfig)?;
    let location = path::resolve_log_dir(cfg);
    Ok(log::build_logger(cfg, location))
}
