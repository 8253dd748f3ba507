//! Log location: base directory, optional `log/` subdirectory, file name.

use std::{
    ffi::OsString,
    fmt, fs, io,
    path::{Path, PathBuf},
};

use time::OffsetDateTime;

use crate::logger::{config::LogConfig, error::PathWarning, object::clock};

/// Environment variable overriding the base log directory.
pub const LOG_BASE_PATH_ENV: &str = "LOG_BASE_PATH";

/// Subdirectory created under the base path when `make_dir` is set.
pub const LOG_SUBDIR: &str = "log";

/// Where the base directory came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BaseSource {
    /// `LogConfig::base_path`.
    Config,
    /// The `LOG_BASE_PATH` environment variable.
    Env,
    /// The process working directory.
    WorkingDir,
    /// `.` after the working directory could not be read.
    Fallback,
}

impl fmt::Display for BaseSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            BaseSource::Config => "config",
            BaseSource::Env => "env",
            BaseSource::WorkingDir => "cwd",
            BaseSource::Fallback => "fallback",
        };
        f.write_str(s)
    }
}

/// Resolved log directory together with everything that was recovered on the way.
#[derive(Debug, Clone)]
pub(crate) struct LogDir {
    pub dir: PathBuf,
    pub source: BaseSource,
    pub warnings: Vec<PathWarning>,
}

/// How the log file is told apart from other runs.
#[derive(Debug, Clone, Copy)]
pub(crate) enum FileStamp {
    Pid(u32),
    Time(OffsetDateTime),
}

impl fmt::Display for FileStamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileStamp::Pid(pid) => write!(f, "{pid}"),
            FileStamp::Time(ts) => f.write_str(&clock::file_stamp(*ts)),
        }
    }
}

/// Resolves the log directory from the process environment.
pub(crate) fn resolve_log_dir(cfg: &LogConfig) -> LogDir {
    resolve_log_dir_with(
        cfg,
        std::env::var_os(LOG_BASE_PATH_ENV),
        std::env::current_dir,
    )
}

/// Resolution with the environment lookups injected.
///
/// Precedence: `cfg.base_path`, then `env_base`, then `cwd()`, then `.`.
/// With `make_dir`, `<base>/log` is created; on failure the base itself is used.
pub(crate) fn resolve_log_dir_with(
    cfg: &LogConfig,
    env_base: Option<OsString>,
    cwd: impl FnOnce() -> io::Result<PathBuf>,
) -> LogDir {
    let mut warnings = Vec::new();

    let configured = cfg
        .base_path
        .clone()
        .filter(|p| !p.as_os_str().is_empty());
    let (base, source) = if let Some(base) = configured {
        (base, BaseSource::Config)
    } else if let Some(base) = env_base.filter(|v| !v.is_empty()) {
        (PathBuf::from(base), BaseSource::Env)
    } else {
        match cwd() {
            Ok(dir) => (dir, BaseSource::WorkingDir),
            Err(e) => {
                warnings.push(PathWarning::WorkingDirUnavailable {
                    reason: e.to_string(),
                });
                (PathBuf::from("."), BaseSource::Fallback)
            }
        }
    };

    let dir = if cfg.make_dir {
        let sub = base.join(LOG_SUBDIR);
        match fs::create_dir_all(&sub) {
            Ok(()) => sub,
            Err(e) => {
                warnings.push(PathWarning::LogDirCreateFailed {
                    path: sub,
                    fallback: base.clone(),
                    reason: e.to_string(),
                });
                base
            }
        }
    } else {
        base
    };

    LogDir {
        dir,
        source,
        warnings,
    }
}

/// `<dir>/<name>.<stamp>.log`
pub(crate) fn log_file_path(dir: &Path, name: &str, stamp: FileStamp) -> PathBuf {
    dir.join(format!("{name}.{stamp}.log"))
}

#[cfg(test)]
mod tests {
    use time::{Date, Month, PrimitiveDateTime, Time, UtcOffset};

    use super::*;

    fn no_cwd() -> io::Result<PathBuf> {
        Err(io::Error::new(io::ErrorKind::NotFound, "gone"))
    }

    fn cfg(make_dir: bool) -> LogConfig {
        LogConfig {
            make_dir,
            ..Default::default()
        }
    }

    #[test]
    fn env_base_with_make_dir_appends_log() {
        let tmp = tempfile::tempdir().unwrap();
        let base = tmp.path().join("x");

        let resolved = resolve_log_dir_with(&cfg(true), Some(base.clone().into()), no_cwd);

        assert_eq!(resolved.dir, base.join("log"));
        assert!(resolved.dir.is_dir());
        assert_eq!(resolved.source, BaseSource::Env);
        assert!(resolved.warnings.is_empty());
    }

    #[test]
    fn unset_env_uses_working_dir() {
        let resolved = resolve_log_dir_with(&cfg(false), None, || Ok(PathBuf::from("/home/u")));

        assert_eq!(resolved.dir, PathBuf::from("/home/u"));
        assert_eq!(resolved.source, BaseSource::WorkingDir);
        assert!(resolved.warnings.is_empty());
    }

    #[test]
    fn empty_env_is_treated_as_unset() {
        let resolved = resolve_log_dir_with(&cfg(false), Some(OsString::new()), || {
            Ok(PathBuf::from("/srv"))
        });

        assert_eq!(resolved.dir, PathBuf::from("/srv"));
        assert_eq!(resolved.source, BaseSource::WorkingDir);
    }

    #[test]
    fn config_base_wins_over_env() {
        let config = LogConfig {
            base_path: Some(PathBuf::from("/from/config")),
            ..Default::default()
        };

        let resolved = resolve_log_dir_with(&config, Some("/from/env".into()), no_cwd);

        assert_eq!(resolved.dir, PathBuf::from("/from/config"));
        assert_eq!(resolved.source, BaseSource::Config);
    }

    #[test]
    fn missing_working_dir_falls_back_to_dot() {
        let resolved = resolve_log_dir_with(&cfg(false), None, no_cwd);

        assert_eq!(resolved.dir, PathBuf::from("."));
        assert_eq!(resolved.source, BaseSource::Fallback);
        assert!(matches!(
            resolved.warnings.as_slice(),
            [PathWarning::WorkingDirUnavailable { .. }]
        ));
    }

    #[test]
    fn failed_make_dir_falls_back_to_base() {
        let tmp = tempfile::tempdir().unwrap();
        let base = tmp.path().join("occupied");
        fs::write(&base, "not a directory").unwrap();

        let resolved = resolve_log_dir_with(&cfg(true), Some(base.clone().into()), no_cwd);

        assert_eq!(resolved.dir, base);
        match resolved.warnings.as_slice() {
            [PathWarning::LogDirCreateFailed { path, fallback, .. }] => {
                assert_eq!(path, &base.join("log"));
                assert_eq!(fallback, &base);
            }
            other => panic!("unexpected warnings: {other:?}"),
        }
    }

    #[test]
    fn pid_file_name() {
        let path = log_file_path(Path::new("/var/log"), "svc", FileStamp::Pid(4242));
        assert_eq!(path, PathBuf::from("/var/log/svc.4242.log"));
    }

    #[test]
    fn timestamp_file_name() {
        let date = Date::from_calendar_date(2024, Month::January, 2).unwrap();
        let ts = PrimitiveDateTime::new(date, Time::from_hms(3, 4, 5).unwrap())
            .assume_offset(UtcOffset::UTC);

        let path = log_file_path(Path::new("/var/log"), "svc", FileStamp::Time(ts));
        assert_eq!(path, PathBuf::from("/var/log/svc.20240102_030405.log"));
    }

    #[test]
    fn distinct_timestamps_give_distinct_paths() {
        let date = Date::from_calendar_date(2024, Month::January, 2).unwrap();
        let first = PrimitiveDateTime::new(date, Time::from_hms(3, 4, 5).unwrap())
            .assume_offset(UtcOffset::UTC);
        let second = first + time::Duration::seconds(1);

        let dir = Path::new("/logs");
        assert_ne!(
            log_file_path(dir, "svc", FileStamp::Time(first)),
            log_file_path(dir, "svc", FileStamp::Time(second)),
        );
    }
}
