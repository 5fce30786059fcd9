use std::fs;
use std::io;
use std::thread;

use tokio::sync::mpsc;

use crate::core::diagnostics::{Phase, report};
use crate::writers::SharedWriter;
use crate::writers::file::BackupPattern;

/// Deletes old backups of one rotating file.
///
/// Requests arrive on a single-slot channel: while one prune is pending,
/// further requests are dropped by the sender, so a burst of rotations costs
/// one directory scan. The worker runs on its own thread and exits when the
/// owning [`crate::writers::FileWriter`] is dropped.
pub struct PruneWorker {
    receiver: mpsc::Receiver<()>,
    pattern: BackupPattern,
    keep: usize,
    errors: SharedWriter,
}

impl PruneWorker {
    pub(crate) fn new(
        receiver: mpsc::Receiver<()>,
        pattern: BackupPattern,
        keep: u32,
        errors: SharedWriter,
    ) -> Self {
        Self {
            receiver,
            pattern,
            keep: keep as usize,
            errors,
        }
    }

    /// Starts a worker thread and returns the request sender.
    pub(crate) fn spawn(
        pattern: BackupPattern,
        keep: u32,
        errors: SharedWriter,
    ) -> io::Result<mpsc::Sender<()>> {
        let (tx, rx) = mpsc::channel(1);
        let worker = PruneWorker::new(rx, pattern, keep, errors);
        thread::Builder::new()
            .name("rs_log_ng-prune".into())
            .spawn(move || worker.run())?;
        Ok(tx)
    }

    /// Serves requests until every sender is gone. Runs outside any async
    /// runtime, so the blocking receive is safe.
    pub fn run(mut self) {
        while self.receiver.blocking_recv().is_some() {
            self.prune();
        }
    }

    fn prune(&self) {
        let backups = match self.pattern.list() {
            Ok(backups) => backups,
            Err(err) => {
                self.report(&self.pattern.dir().to_string_lossy(), &err);
                return;
            }
        };
        if backups.len() <= self.keep {
            return;
        }
        let excess = backups.len() - self.keep;
        for path in &backups[..excess] {
            if let Err(err) = fs::remove_file(path) {
                if err.kind() != io::ErrorKind::NotFound {
                    self.report(&path.to_string_lossy(), &err);
                }
            }
        }
    }

    fn report(&self, origin: &str, err: &io::Error) {
        report(self.errors.as_ref(), origin, Phase::Prune, err);
    }
}
