use std::{
    io,
    path::{Path, PathBuf},
    process,
};

use tracing::{Dispatch, dispatcher, info, warn};
use tracing_subscriber::{
    fmt::{
        self,
        MakeWriter,
        writer::{BoxMakeWriter, MakeWriterExt},
    },
    layer::SubscriberExt,
};

use crate::logger::{
    config::LogConfig,
    error::{LoggerError, LoggerResult, PathWarning},
    format::{SpanFieldsLayer, TextFormat},
    object::clock,
    path::{self, FileStamp},
    writer::RotatingFile,
};

/// A configured logger writing to a rotated file.
///
/// Not installed anywhere by default: use [`Logger::in_scope`] for a
/// thread-local scope or [`Logger::install_global`] to make it the process default.
#[derive(Clone)]
pub struct Logger {
    dispatch: Dispatch,
    file: RotatingFile,
    path: PathBuf,
    warnings: Vec<PathWarning>,
}

impl Logger {
    /// Resolved path of the active log file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Problems recovered from while resolving the log location.
    pub fn warnings(&self) -> &[PathWarning] {
        &self.warnings
    }

    /// The underlying `tracing` dispatcher.
    pub fn dispatch(&self) -> &Dispatch {
        &self.dispatch
    }

    /// Runs `f` with this logger as the thread-local default.
    pub fn in_scope<T>(&self, f: impl FnOnce() -> T) -> T {
        dispatcher::with_default(&self.dispatch, f)
    }

    /// Installs this logger as the global default.
    pub fn install_global(&self) -> LoggerResult<()> {
        dispatcher::set_global_default(self.dispatch.clone())
            .map_err(|_| LoggerError::AlreadyInitialized)
    }

    /// Forces rotation of the active file.
    pub fn rotate(&self) -> io::Result<()> {
        self.file.rotate()
    }
}

impl std::fmt::Debug for Logger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Logger")
            .field("path", &self.path)
            .field("warnings", &self.warnings)
            .finish_non_exhaustive()
    }
}

/// Wires the sink, formatter and filter for `cfg` into a logger writing under `location`.
pub(crate) fn build_logger(cfg: &LogConfig, location: path::LogDir) -> Logger {
    build_logger_with(cfg, location, std::io::stdout)
}

/// Same as [`build_logger`], with `console` as the second target when
/// `use_multi_writer` is set.
pub(crate) fn build_logger_with<C>(cfg: &LogConfig, location: path::LogDir, console: C) -> Logger
where
    C: for<'a> MakeWriter<'a> + Send + Sync + 'static,
{
    let stamp = if cfg.use_pid {
        FileStamp::Pid(process::id())
    } else {
        FileStamp::Time(clock::now(cfg.tz))
    };
    let file_path = path::log_file_path(&location.dir, &cfg.name, stamp);
    let file = RotatingFile::new(&file_path, cfg.rotate.policy());

    let writer = if cfg.use_multi_writer {
        BoxMakeWriter::new(file.clone().and(console))
    } else {
        BoxMakeWriter::new(file.clone())
    };
    let fmt_layer = fmt::layer()
        .with_ansi(false)
        .event_format(TextFormat::new(cfg.field_order, cfg.tz))
        .with_writer(writer);

    let subscriber = tracing_subscriber::registry()
        .with(cfg.level.to_env_filter())
        .with(SpanFieldsLayer)
        .with(fmt_layer);

    let logger = Logger {
        dispatch: Dispatch::new(subscriber),
        file,
        path: file_path,
        warnings: location.warnings,
    };

    logger.in_scope(|| {
        for warning in &logger.warnings {
            warn!(%warning, "log location fallback");
        }
        info!(
            path = %logger.path.display(),
            base = %location.source,
            "logging initialized"
        );
    });
    logger
}
