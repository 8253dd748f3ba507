use std::{fs, path::PathBuf};

use clap::Parser;
use tracing::{debug, info, info_span, warn};

use debuglog::{
    FieldOrder, LogConfig, LoggerLevel, LoggerTimeZone, RotateConfig, init_local_offset,
    init_logger,
};

/// Builds a rotated file logger and writes a few sample records to it.
#[derive(Debug, Parser)]
#[command(name = "debuglog-demo", version)]
struct Args {
    /// JSON config file; overrides every other flag. `null` means no config.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Base name of the log file.
    #[arg(long, default_value = "demo")]
    name: String,

    /// Create a `log` subdirectory under the base path.
    #[arg(long)]
    make_dir: bool,

    /// Name the file by PID instead of a timestamp.
    #[arg(long)]
    use_pid: bool,

    /// Also write every record to stdout.
    #[arg(long)]
    multi_writer: bool,

    /// Rotate after this many megabytes (0 = default).
    #[arg(long, default_value_t = 0)]
    max_size: u64,

    /// Keep at most this many rotated files (0 = default).
    #[arg(long, default_value_t = 0)]
    max_backups: u32,

    /// Drop rotated files older than this many days (0 = default).
    #[arg(long, default_value_t = 0)]
    max_age: u32,

    /// Gzip rotated files.
    #[arg(long)]
    compress: bool,

    /// Level filter expression.
    #[arg(long, default_value = "info")]
    level: String,

    /// Timezone for timestamps: utc|local.
    #[arg(long, default_value = "local")]
    tz: String,

    /// Field order: msg_last|alphabetical.
    #[arg(long, default_value = "msg_last")]
    field_order: String,

    /// Number of sample records to write.
    #[arg(long, default_value_t = 10)]
    lines: usize,
}

impl Args {
    fn load_config(&self) -> anyhow::Result<Option<LogConfig>> {
        if let Some(path) = &self.config {
            let raw = fs::read_to_string(path)?;
            return Ok(serde_json::from_str(&raw)?);
        }

        Ok(Some(LogConfig {
            name: self.name.clone(),
            make_dir: self.make_dir,
            use_pid: self.use_pid,
            use_multi_writer: self.multi_writer,
            rotate: RotateConfig {
                max_size: self.max_size,
                max_backups: self.max_backups,
                max_age: self.max_age,
                compress: self.compress,
            },
            level: LoggerLevel::new(self.level.as_str())?,
            tz: self.tz.parse::<LoggerTimeZone>()?,
            field_order: self.field_order.parse::<FieldOrder>()?,
            base_path: None,
        }))
    }
}

fn main() -> anyhow::Result<()> {
    init_local_offset();

    let args = Args::parse();
    let cfg = args.load_config()?;

    // 1) logger
    let logger = init_logger(cfg.as_ref())?;
    logger.install_global()?;
    for warning in logger.warnings() {
        eprintln!("warning: {warning}");
    }

    // 2) sample records
    let span = info_span!("demo", run = %std::process::id());
    let _guard = span.enter();
    for line in 0..args.lines {
        debug!(line, "debug record");
        if line % 5 == 4 {
            warn!(line, every = 5, "periodic warning");
        }
        info!(line, total = args.lines, "sample record");
    }

    println!("{}", logger.path().display());
    Ok(())
}
