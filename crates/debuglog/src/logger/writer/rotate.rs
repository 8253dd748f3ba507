//! Size-triggered rotating file sink.
//!
//! The active file lives at the configured path. Rotated copies sit next to
//! it as `<file>.1`, `<file>.2`, ... (newest first), each optionally gzipped
//! to `<file>.N.gz`. Retention is bounded by count and by age.

use std::{
    fs::{self, File, OpenOptions},
    io::{self, Write},
    path::{Path, PathBuf},
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::SystemTime,
};

use flate2::{Compression, write::GzEncoder};
use tracing_subscriber::fmt::MakeWriter;

use crate::logger::config::RotatePolicy;

const GZ_SUFFIX: &str = ".gz";

/// Shared handle to a rotating log file.
///
/// Cloning is cheap; all clones write to the same file under one lock.
/// The file is opened lazily on the first write.
#[derive(Debug, Clone)]
pub struct RotatingFile {
    inner: Arc<Mutex<Rotator>>,
}

impl RotatingFile {
    pub fn new(path: impl Into<PathBuf>, policy: RotatePolicy) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Rotator {
                path: path.into(),
                policy,
                file: None,
                size: 0,
            })),
        }
    }

    /// Path of the active file.
    pub fn path(&self) -> PathBuf {
        self.lock().path.clone()
    }

    /// Closes the active file and starts a new one, keeping the old as backup `.1`.
    pub fn rotate(&self) -> io::Result<()> {
        self.lock().rotate()
    }

    fn lock(&self) -> MutexGuard<'_, Rotator> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<'a> MakeWriter<'a> for RotatingFile {
    type Writer = RotatingFileWriter<'a>;

    fn make_writer(&'a self) -> Self::Writer {
        RotatingFileWriter(self.lock())
    }
}

/// Exclusive writer for one formatted record.
pub struct RotatingFileWriter<'a>(MutexGuard<'a, Rotator>);

impl Write for RotatingFileWriter<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.0.flush()
    }
}

#[derive(Debug)]
struct Rotator {
    path: PathBuf,
    policy: RotatePolicy,
    file: Option<File>,
    size: u64,
}

/// A rotated copy of the active file.
#[derive(Debug)]
struct Backup {
    index: usize,
    path: PathBuf,
    compressed: bool,
}

impl Rotator {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let len = buf.len() as u64;
        if len > self.policy.max_bytes {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!(
                    "write length {len} exceeds maximum file size {}",
                    self.policy.max_bytes
                ),
            ));
        }

        if self.file.is_none() {
            self.open_existing_or_new(len)?;
        }
        if self.size + len > self.policy.max_bytes {
            self.rotate()?;
        }

        let n = self.active()?.write(buf)?;
        self.size += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        match self.file.as_mut() {
            Some(file) => file.flush(),
            None => Ok(()),
        }
    }

    fn active(&mut self) -> io::Result<&mut File> {
        if self.file.is_none() {
            self.open_new()?;
        }
        self.file
            .as_mut()
            .ok_or_else(|| io::Error::other("log file is not open"))
    }

    /// Appends to an existing file unless the pending write would overflow it.
    fn open_existing_or_new(&mut self, pending: u64) -> io::Result<()> {
        let size = match fs::metadata(&self.path) {
            Ok(meta) => meta.len(),
            Err(e) if e.kind() == io::ErrorKind::NotFound => return self.open_new(),
            Err(e) => return Err(e),
        };
        if size + pending > self.policy.max_bytes {
            return self.rotate();
        }

        let file = OpenOptions::new().append(true).open(&self.path)?;
        self.file = Some(file);
        self.size = size;
        Ok(())
    }

    fn open_new(&mut self) -> io::Result<()> {
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)?;
        }
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&self.path)?;
        self.file = Some(file);
        self.size = 0;
        Ok(())
    }

    fn rotate(&mut self) -> io::Result<()> {
        self.file = None;
        if self.path.exists() {
            self.shift_backups()?;
            let backup = self.backup_path(1, false);
            fs::rename(&self.path, &backup)?;
            // backup age counts from rotation, not from the last write
            File::options()
                .write(true)
                .open(&backup)?
                .set_modified(SystemTime::now())?;
        }
        self.open_new()?;
        self.mill()
    }

    /// Makes room for a new `.1` backup, dropping whatever falls off the end.
    fn shift_backups(&self) -> io::Result<()> {
        let mut backups = self.backups()?;
        backups.sort_by(|a, b| b.index.cmp(&a.index));

        for backup in backups {
            if backup.index >= self.policy.max_backups {
                remove_if_exists(&backup.path)?;
            } else {
                let to = self.backup_path(backup.index + 1, backup.compressed);
                fs::rename(&backup.path, to)?;
            }
        }
        Ok(())
    }

    /// Post-rotation housekeeping: compression and age-based pruning.
    fn mill(&self) -> io::Result<()> {
        if self.policy.compress {
            let plain = self.backup_path(1, false);
            if plain.exists() {
                compress_file(&plain, &self.backup_path(1, true))?;
            }
        }

        let now = SystemTime::now();
        for backup in self.backups()? {
            let modified = fs::metadata(&backup.path)?.modified()?;
            let expired = now
                .duration_since(modified)
                .is_ok_and(|age| age > self.policy.max_age);
            if expired {
                remove_if_exists(&backup.path)?;
            }
        }
        Ok(())
    }

    fn backup_path(&self, index: usize, compressed: bool) -> PathBuf {
        let mut name = self.path.as_os_str().to_owned();
        name.push(format!(".{index}"));
        if compressed {
            name.push(GZ_SUFFIX);
        }
        PathBuf::from(name)
    }

    fn backups(&self) -> io::Result<Vec<Backup>> {
        let Some(base) = self.path.file_name().and_then(|n| n.to_str()) else {
            return Ok(Vec::new());
        };
        let dir = match self.path.parent() {
            Some(d) if !d.as_os_str().is_empty() => d,
            _ => Path::new("."),
        };
        let prefix = format!("{base}.");

        let mut out = Vec::new();
        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            let name = entry.file_name();
            let Some(suffix) = name.to_str().and_then(|n| n.strip_prefix(&prefix)) else {
                continue;
            };
            let (digits, compressed) = match suffix.strip_suffix(GZ_SUFFIX) {
                Some(d) => (d, true),
                None => (suffix, false),
            };
            if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
                continue;
            }
            let Ok(index) = digits.parse::<usize>() else {
                continue;
            };
            out.push(Backup {
                index,
                path: entry.path(),
                compressed,
            });
        }
        Ok(out)
    }
}

fn compress_file(src: &Path, dst: &Path) -> io::Result<()> {
    let result = (|| {
        let mut input = File::open(src)?;
        let output = File::create(dst)?;
        let mut encoder = GzEncoder::new(output, Compression::default());
        io::copy(&mut input, &mut encoder)?;
        encoder.finish()?.sync_all()
    })();

    match result {
        Ok(()) => fs::remove_file(src),
        Err(e) => {
            let _ = fs::remove_file(dst);
            Err(e)
        }
    }
}

fn remove_if_exists(path: &Path) -> io::Result<()> {
    match fs::remove_file(path) {
        Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use std::{io::Read, time::Duration};

    use flate2::read::GzDecoder;
    use tempfile::tempdir;

    use super::*;

    fn policy(max_bytes: u64, max_backups: usize, compress: bool) -> RotatePolicy {
        RotatePolicy {
            max_bytes,
            max_backups,
            max_age: Duration::from_secs(3 * 86_400),
            compress,
        }
    }

    fn write_line(file: &RotatingFile, line: &str) {
        file.make_writer().write_all(line.as_bytes()).unwrap();
    }

    #[test]
    fn opens_lazily_and_creates_parents() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested/deeper/app.log");
        let file = RotatingFile::new(&path, policy(1024, 3, false));

        assert_eq!(file.path(), path);
        assert!(!path.exists());
        write_line(&file, "hello\n");

        assert_eq!(fs::read_to_string(&path).unwrap(), "hello\n");
    }

    #[test]
    fn appends_to_existing_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("app.log");
        fs::write(&path, "old\n").unwrap();

        let file = RotatingFile::new(&path, policy(1024, 3, false));
        write_line(&file, "new\n");

        assert_eq!(fs::read_to_string(&path).unwrap(), "old\nnew\n");
    }

    #[test]
    fn rotates_when_size_would_be_exceeded() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("app.log");
        let file = RotatingFile::new(&path, policy(10, 3, false));

        write_line(&file, "aaaaaa\n");
        write_line(&file, "bbbbbb\n");

        assert_eq!(fs::read_to_string(&path).unwrap(), "bbbbbb\n");
        assert_eq!(
            fs::read_to_string(dir.path().join("app.log.1")).unwrap(),
            "aaaaaa\n"
        );
    }

    #[test]
    fn full_existing_file_is_rotated_on_open() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("app.log");
        fs::write(&path, "123456789\n").unwrap();

        let file = RotatingFile::new(&path, policy(12, 3, false));
        write_line(&file, "next\n");

        assert_eq!(fs::read_to_string(&path).unwrap(), "next\n");
        assert!(dir.path().join("app.log.1").exists());
    }

    #[test]
    fn keeps_at_most_max_backups() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("app.log");
        let file = RotatingFile::new(&path, policy(4, 2, false));

        for line in ["one\n", "two\n", "thr\n", "fou\n"] {
            write_line(&file, line);
        }

        assert_eq!(fs::read_to_string(&path).unwrap(), "fou\n");
        assert_eq!(
            fs::read_to_string(dir.path().join("app.log.1")).unwrap(),
            "thr\n"
        );
        assert_eq!(
            fs::read_to_string(dir.path().join("app.log.2")).unwrap(),
            "two\n"
        );
        assert!(!dir.path().join("app.log.3").exists());
    }

    #[test]
    fn compresses_rotated_files() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("app.log");
        let file = RotatingFile::new(&path, policy(6, 3, true));

        write_line(&file, "first\n");
        write_line(&file, "second"); // 6 bytes, forces rotation

        assert!(!dir.path().join("app.log.1").exists());
        let gz = File::open(dir.path().join("app.log.1.gz")).unwrap();
        let mut text = String::new();
        GzDecoder::new(gz).read_to_string(&mut text).unwrap();
        assert_eq!(text, "first\n");
    }

    #[test]
    fn compressed_backups_shift_too() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("app.log");
        let file = RotatingFile::new(&path, policy(2, 3, true));

        for line in ["a\n", "b\n", "c\n"] {
            write_line(&file, line);
        }

        assert!(dir.path().join("app.log.1.gz").exists());
        assert!(dir.path().join("app.log.2.gz").exists());
        assert!(!dir.path().join("app.log.3.gz").exists());
    }

    #[test]
    fn prunes_backups_older_than_max_age() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("app.log");
        let stale = dir.path().join("app.log.1");
        fs::write(&stale, "stale\n").unwrap();
        let ten_days_ago = SystemTime::now() - Duration::from_secs(10 * 86_400);
        File::options()
            .write(true)
            .open(&stale)
            .unwrap()
            .set_modified(ten_days_ago)
            .unwrap();

        let file = RotatingFile::new(&path, policy(1024, 3, false));
        write_line(&file, "current\n");
        file.rotate().unwrap();

        // the stale file was shifted to .2 and then pruned by age
        assert!(dir.path().join("app.log.1").exists());
        assert!(!dir.path().join("app.log.2").exists());
    }

    #[test]
    fn fresh_backup_survives_age_pruning() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("app.log");
        let file = RotatingFile::new(&path, policy(10, 3, false));

        write_line(&file, "old data\n");
        let five_days_ago = SystemTime::now() - Duration::from_secs(5 * 86_400);
        File::options()
            .write(true)
            .open(&path)
            .unwrap()
            .set_modified(five_days_ago)
            .unwrap();
        write_line(&file, "new data\n");

        let backup = dir.path().join("app.log.1");
        assert!(backup.exists(), "rotated backup was pruned on creation");
        assert_eq!(fs::read_to_string(&backup).unwrap(), "old data\n");
        assert_eq!(fs::read_to_string(&path).unwrap(), "new data\n");
    }

    #[test]
    fn ignores_unrelated_files() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("app.log");
        let other = dir.path().join("app.log.bak");
        fs::write(&other, "keep").unwrap();

        let file = RotatingFile::new(&path, policy(1024, 1, false));
        write_line(&file, "x\n");
        file.rotate().unwrap();
        file.rotate().unwrap();

        assert!(other.exists());
    }

    #[test]
    fn oversized_write_is_rejected() {
        let dir = tempdir().unwrap();
        let file = RotatingFile::new(dir.path().join("app.log"), policy(4, 3, false));

        let err = file.make_writer().write(b"too long").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
    }

    #[test]
    fn manual_rotate_without_file_just_opens() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("app.log");
        let file = RotatingFile::new(&path, policy(1024, 3, false));

        file.rotate().unwrap();

        assert!(path.exists());
        assert!(!dir.path().join("app.log.1").exists());
    }
}
