//! # Rotating File Writer
//!
//! Appends to one file and rotates it once it reaches a size limit. A
//! rotation syncs and closes the file, renames it to
//! `<stem>-<YYYYmmddTHHMMSS.nnnnnnnnn><ext>` in the same directory, and
//! reopens an empty file at the original path. Old backups are pruned on a
//! background thread, oldest first, down to the configured count.
//!
//! The size limit is approximate: the counter is checked after each write,
//! so the file may grow past the limit by up to one write. Concurrent writes
//! share a read lock over the file handle and append in parallel; only the
//! handle swap during rotation, reopen and close takes the write lock. Wrap
//! the writer in a [`crate::writers::MutexWriter`] when whole writes must be
//! ordered.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write as _};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{Local, NaiveDateTime, TimeDelta};
use once_cell::sync::OnceCell;
use parking_lot::RwLock;
use tokio::sync::mpsc;

use crate::core::diagnostics::{Phase, report};
use crate::core::error::LogError;
use crate::writers::worker::PruneWorker;
use crate::writers::{self, SharedWriter, Writer};

const BACKUP_TIME_LAYOUT: &str = "%Y%m%dT%H%M%S%.9f";
// "20240102T030405.123456789"
const BACKUP_TIME_LEN: usize = 25;

/// Naming scheme for the backups of one log file.
#[derive(Debug, Clone)]
pub(crate) struct BackupPattern {
    dir: PathBuf,
    base: String,
    stem: String,
    ext: String,
}

impl BackupPattern {
    fn new(path: &Path) -> Self {
        let dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
        let base = file_name_string(path.file_name());
        let stem = file_name_string(path.file_stem());
        let ext = path
            .extension()
            .map(|e| format!(".{}", e.to_string_lossy()))
            .unwrap_or_default();
        Self {
            dir,
            base,
            stem,
            ext,
        }
    }

    pub(crate) fn dir(&self) -> &Path {
        &self.dir
    }

    /// A free backup path for the current time. Taken names are skipped by
    /// advancing the timestamp one nanosecond at a time.
    fn next_path(&self) -> PathBuf {
        let mut now = Local::now().naive_local();
        loop {
            let path = self.dir.join(self.file_name(now));
            if !path.exists() {
                return path;
            }
            now += TimeDelta::nanoseconds(1);
        }
    }

    fn file_name(&self, time: NaiveDateTime) -> String {
        format!(
            "{}-{}{}",
            self.stem,
            time.format(BACKUP_TIME_LAYOUT),
            self.ext
        )
    }

    /// Reports whether `name` was produced by [`BackupPattern::file_name`].
    pub(crate) fn matches(&self, name: &str) -> bool {
        if name == self.base {
            return false;
        }
        let Some(rest) = name
            .strip_prefix(self.stem.as_str())
            .and_then(|r| r.strip_prefix('-'))
            .and_then(|r| r.strip_suffix(self.ext.as_str()))
        else {
            return false;
        };
        rest.len() == BACKUP_TIME_LEN
            && NaiveDateTime::parse_from_str(rest, BACKUP_TIME_LAYOUT).is_ok()
    }

    /// Backups currently on disk, oldest first.
    pub(crate) fn list(&self) -> io::Result<Vec<PathBuf>> {
        let mut names = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().into_owned();
            if self.matches(&name) {
                names.push(name);
            }
        }
        names.sort();
        Ok(names.into_iter().map(|n| self.dir.join(n)).collect())
    }
}

fn file_name_string(name: Option<&std::ffi::OsStr>) -> String {
    name.map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

struct Inner {
    path: PathBuf,
    pattern: BackupPattern,
    file: RwLock<Option<File>>,
    size: AtomicU64,
    max_size: u64,
    max_backups: u32,
    errors: SharedWriter,
    prune: OnceCell<mpsc::Sender<()>>,
}

/// Size-rotated log file. Cloning shares the same file.
#[derive(Clone)]
pub struct FileWriter {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for FileWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileWriter")
            .field("path", &self.inner.path)
            .field("size", &self.size())
            .field("max_size", &self.inner.max_size)
            .field("max_backups", &self.inner.max_backups)
            .finish()
    }
}

impl FileWriter {
    /// Opens `path` for appending.
    ///
    /// `max_size` is in bytes, 0 disables rotation. `max_backups` is the
    /// number of rotated files to keep, 0 keeps all of them. An existing
    /// file already larger than `max_size` is rotated before opening.
    pub fn open(path: impl AsRef<Path>, max_size: u64, max_backups: u32) -> Result<Self, LogError> {
        FileWriterBuilder::new(path)
            .max_size(max_size)
            .max_backups(max_backups)
            .open()
    }

    /// Panicking variant of [`FileWriter::open`] for static setup.
    pub fn must_open(path: impl AsRef<Path>, max_size: u64, max_backups: u32) -> Self {
        match Self::open(path, max_size, max_backups) {
            Ok(w) => w,
            Err(err) => panic!("{err}"),
        }
    }

    pub fn path(&self) -> &Path {
        &self.inner.path
    }

    /// Bytes written to the current file, as tracked by the rotation counter.
    pub fn size(&self) -> u64 {
        self.inner.size.load(Ordering::Acquire)
    }

    pub fn is_open(&self) -> bool {
        self.inner.file.read().is_some()
    }

    /// Rotated files currently on disk, oldest first.
    pub fn backups(&self) -> io::Result<Vec<PathBuf>> {
        self.inner.pattern.list()
    }

    /// Flushes file contents to disk.
    pub fn sync(&self) -> io::Result<()> {
        match self.inner.file.read().as_ref() {
            Some(file) => file.sync_all(),
            None => Ok(()),
        }
    }

    /// Syncs and closes the file. Closing twice is fine; a later write
    /// reopens the file.
    pub fn close(&self) -> io::Result<()> {
        let file = self.inner.file.write().take();
        self.inner.size.store(0, Ordering::Release);
        match file {
            Some(file) => file.sync_all(),
            None => Ok(()),
        }
    }

    /// Rotates now, regardless of the current size.
    pub fn rotate(&self) {
        let mut slot = self.inner.file.write();
        self.inner.rotate_locked(&mut slot);
    }

    pub fn into_shared(self) -> SharedWriter {
        Arc::new(self)
    }
}

impl Inner {
    fn report(&self, phase: Phase, err: &dyn std::fmt::Display) {
        report(
            self.errors.as_ref(),
            &self.path.to_string_lossy(),
            phase,
            err,
        );
    }

    /// Opens the file into `slot`, rotating a pre-existing oversized file first.
    fn open_locked(&self, slot: &mut Option<File>) -> Result<(), LogError> {
        create_dir_all(self.pattern.dir())?;
        match fs::metadata(&self.path) {
            Ok(meta) => {
                if !meta.is_file() {
                    return Err(LogError::NotRegularFile(self.path.clone()));
                }
                if self.max_size > 0 && meta.len() > self.max_size {
                    fs::rename(&self.path, self.pattern.next_path())?;
                    self.request_prune();
                }
            }
            Err(err) if err.kind() == io::ErrorKind::NotFound => {}
            Err(err) => return Err(err.into()),
        }
        let file = open_append(&self.path)?;
        let size = file.metadata()?.len();
        self.size.store(size, Ordering::Release);
        *slot = Some(file);
        Ok(())
    }

    fn reopen(&self) -> io::Result<()> {
        let mut slot = self.file.write();
        if slot.is_some() {
            return Ok(());
        }
        self.open_locked(&mut slot).map_err(|err| match err {
            LogError::Io(err) => err,
            other => io::Error::other(other),
        })
    }

    /// Rotates if the counter is still over the limit once the lock is held,
    /// so concurrent writers crossing the limit together rotate only once.
    fn rotate_if_full(&self) {
        let mut slot = self.file.write();
        if self.size.load(Ordering::Acquire) < self.max_size {
            return;
        }
        self.rotate_locked(&mut slot);
    }

    fn rotate_locked(&self, slot: &mut Option<File>) {
        if let Some(file) = slot.take() {
            if let Err(err) = file.sync_all() {
                self.report(Phase::Sync, &err);
            }
        }
        self.size.store(0, Ordering::Release);
        if let Err(err) = fs::rename(&self.path, self.pattern.next_path()) {
            if err.kind() != io::ErrorKind::NotFound {
                self.report(Phase::Rename, &err);
            }
        }
        // A failed reopen is retried by the next write.
        if let Err(err) = self.open_locked(slot) {
            self.report(Phase::Open, &err);
        }
        self.request_prune();
    }

    fn request_prune(&self) {
        if self.max_backups == 0 {
            return;
        }
        let sender = self.prune.get_or_try_init(|| {
            PruneWorker::spawn(
                self.pattern.clone(),
                self.max_backups,
                self.errors.clone(),
            )
        });
        match sender {
            // A full channel already holds a pending prune.
            Ok(tx) => {
                let _ = tx.try_send(());
            }
            Err(err) => self.report(Phase::Prune, &err),
        }
    }
}

impl Writer for FileWriter {
    fn write(&self, buf: &[u8]) -> io::Result<usize> {
        let inner = &*self.inner;
        loop {
            {
                let slot = inner.file.read();
                if let Some(mut file) = slot.as_ref() {
                    file.write_all(buf)?;
                    break;
                }
            }
            inner.reopen()?;
        }
        let len = buf.len() as u64;
        let size = inner.size.fetch_add(len, Ordering::AcqRel) + len;
        if inner.max_size > 0 && size >= inner.max_size {
            inner.rotate_if_full();
        }
        Ok(buf.len())
    }

    fn flush(&self) -> io::Result<()> {
        match self.inner.file.read().as_ref() {
            Some(mut file) => file.flush(),
            None => Ok(()),
        }
    }
}

/// Configures and opens a [`FileWriter`].
pub struct FileWriterBuilder {
    path: PathBuf,
    max_size: u64,
    max_backups: u32,
    errors: Option<SharedWriter>,
}

impl FileWriterBuilder {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            max_size: 0,
            max_backups: 0,
            errors: None,
        }
    }

    pub fn max_size(mut self, bytes: u64) -> Self {
        self.max_size = bytes;
        self
    }

    pub fn max_backups(mut self, count: u32) -> Self {
        self.max_backups = count;
        self
    }

    /// Sink for sync, rename and prune failures. Defaults to stderr.
    pub fn error_output(mut self, writer: SharedWriter) -> Self {
        self.errors = Some(writer);
        self
    }

    pub fn open(self) -> Result<FileWriter, LogError> {
        let path = std::path::absolute(&self.path)?;
        let inner = Inner {
            pattern: BackupPattern::new(&path),
            path,
            file: RwLock::new(None),
            size: AtomicU64::new(0),
            max_size: self.max_size,
            max_backups: self.max_backups,
            errors: self.errors.unwrap_or_else(writers::stderr),
            prune: OnceCell::new(),
        };
        {
            let mut slot = inner.file.write();
            inner.open_locked(&mut slot)?;
        }
        Ok(FileWriter {
            inner: Arc::new(inner),
        })
    }
}

fn create_dir_all(dir: &Path) -> io::Result<()> {
    if dir.as_os_str().is_empty() {
        return Ok(());
    }
    let mut builder = fs::DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        builder.mode(0o755);
    }
    builder.create(dir)
}

fn open_append(path: &Path) -> io::Result<File> {
    let mut options = OpenOptions::new();
    options.create(true).append(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o644);
    }
    options.open(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pattern() -> BackupPattern {
        BackupPattern::new(Path::new("/var/log/app.log"))
    }

    #[test]
    fn backup_names_round_trip() {
        let p = pattern();
        let time = NaiveDateTime::parse_from_str("20240102T030405.000000007", BACKUP_TIME_LAYOUT)
            .unwrap();
        let name = p.file_name(time);
        assert_eq!(name, "app-20240102T030405.000000007.log");
        assert!(p.matches(&name));
    }

    #[test]
    fn rejects_foreign_names() {
        let p = pattern();
        assert!(!p.matches("app.log"));
        assert!(!p.matches("app-20240102T030405.log"));
        assert!(!p.matches("app-20241302T030405.000000007.log"));
        assert!(!p.matches("other-20240102T030405.000000007.log"));
        assert!(!p.matches("app-20240102T030405.000000007.txt"));
    }

    #[test]
    fn extensionless_paths() {
        let p = BackupPattern::new(Path::new("/tmp/server"));
        let time = NaiveDateTime::parse_from_str("20240102T030405.000000000", BACKUP_TIME_LAYOUT)
            .unwrap();
        assert_eq!(p.file_name(time), "server-20240102T030405.000000000");
        assert!(p.matches("server-20240102T030405.000000000"));
    }
}
