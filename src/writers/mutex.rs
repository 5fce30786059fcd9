use std::io;

use parking_lot::{Mutex, MutexGuard};

use crate::writers::Writer;

/// Serializes writes to an [`io::Write`] sink.
///
/// This is also the way to turn any plain `io::Write` (a `Vec<u8>`, a
/// socket, a `BufWriter`) into a shareable [`Writer`].
#[derive(Debug, Default)]
pub struct MutexWriter<W> {
    inner: Mutex<W>,
}

impl<W: io::Write + Send> MutexWriter<W> {
    pub fn new(inner: W) -> Self {
        Self {
            inner: Mutex::new(inner),
        }
    }

    /// Locks the wrapped sink, for example to read back captured output.
    pub fn lock(&self) -> MutexGuard<'_, W> {
        self.inner.lock()
    }

    pub fn into_inner(self) -> W {
        self.inner.into_inner()
    }
}

impl<W: io::Write + Send> Writer for MutexWriter<W> {
    fn write(&self, buf: &[u8]) -> io::Result<usize> {
        let mut inner = self.inner.lock();
        inner.write_all(buf)?;
        Ok(buf.len())
    }

    fn flush(&self) -> io::Result<()> {
        self.inner.lock().flush()
    }
}

impl MutexWriter<Vec<u8>> {
    /// Captured bytes as text.
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.inner.lock()).into_owned()
    }

    /// Takes the captured bytes, leaving the buffer empty.
    pub fn take(&self) -> Vec<u8> {
        std::mem::take(&mut *self.inner.lock())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn concurrent_writes_do_not_interleave() {
        let w = Arc::new(MutexWriter::new(Vec::new()));
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let w = w.clone();
                thread::spawn(move || {
                    let line = format!("{}\n", i.to_string().repeat(64));
                    for _ in 0..50 {
                        w.write(line.as_bytes()).unwrap();
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        let out = w.contents();
        assert_eq!(out.lines().count(), 400);
        for line in out.lines() {
            assert_eq!(line.len(), 64);
            assert!(line.chars().all(|c| c == line.chars().next().unwrap()));
        }
    }
}
