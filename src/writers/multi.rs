use std::io;
use std::sync::Arc;

use crate::writers::{SharedWriter, Writer};

/// Fans each write out to several writers.
///
/// Every writer is tried even after one fails. The result is the first error,
/// if any, otherwise the largest byte count any writer reported. A writer
/// that accepts fewer bytes than offered counts as a failed write. With no
/// writers at all every write succeeds in full.
#[derive(Clone, Default)]
pub struct MultiWriter {
    writers: Vec<SharedWriter>,
}

impl MultiWriter {
    /// Nested multi-writers are flattened into this one.
    pub fn new<I>(writers: I) -> Self
    where
        I: IntoIterator<Item = SharedWriter>,
    {
        let mut flat = Vec::new();
        for writer in writers {
            match writer.as_multi_writer() {
                Some(multi) => flat.extend(multi.writers.iter().cloned()),
                None => flat.push(writer),
            }
        }
        Self { writers: flat }
    }

    pub fn len(&self) -> usize {
        self.writers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.writers.is_empty()
    }

    pub fn into_shared(self) -> SharedWriter {
        Arc::new(self)
    }

    /// Writes to every writer and returns both the largest byte count and
    /// the first error, which [`Writer::write`] has to collapse into one.
    pub fn write_each(&self, buf: &[u8]) -> (usize, Option<io::Error>) {
        if self.writers.is_empty() {
            return (buf.len(), None);
        }
        let mut first_err = None;
        let mut max = 0;
        for writer in &self.writers {
            match writer.write(buf) {
                Ok(n) => {
                    max = max.max(n);
                    if n < buf.len() && first_err.is_none() {
                        first_err = Some(io::Error::from(io::ErrorKind::WriteZero));
                    }
                }
                Err(err) => {
                    if first_err.is_none() {
                        first_err = Some(err);
                    }
                }
            }
        }
        (max, first_err)
    }
}

impl Writer for MultiWriter {
    fn write(&self, buf: &[u8]) -> io::Result<usize> {
        match self.write_each(buf) {
            (_, Some(err)) => Err(err),
            (n, None) => Ok(n),
        }
    }

    fn flush(&self) -> io::Result<()> {
        let mut first_err = None;
        for writer in &self.writers {
            if let Err(err) = writer.flush() {
                first_err.get_or_insert(err);
            }
        }
        first_err.map_or(Ok(()), Err)
    }

    fn as_multi_writer(&self) -> Option<&MultiWriter> {
        Some(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::writers::MutexWriter;

    struct Failing;

    impl Writer for Failing {
        fn write(&self, _: &[u8]) -> io::Result<usize> {
            Err(io::Error::other("sink down"))
        }
    }

    #[test]
    fn flattens_nested_writers() {
        let a: SharedWriter = Arc::new(MutexWriter::new(Vec::new()));
        let b: SharedWriter = Arc::new(MutexWriter::new(Vec::new()));
        let inner = MultiWriter::new([a.clone(), b]).into_shared();
        let outer = MultiWriter::new([inner, a]);
        assert_eq!(outer.len(), 3);
    }

    #[test]
    fn empty_always_succeeds() {
        assert_eq!(MultiWriter::default().write(b"xyz").unwrap(), 3);
    }

    #[test]
    fn keeps_writing_after_failure() {
        let good = Arc::new(MutexWriter::new(Vec::new()));
        let w = MultiWriter::new([Arc::new(Failing) as SharedWriter, good.clone() as SharedWriter]);
        let (n, err) = w.write_each(b"payload");
        assert_eq!(n, 7);
        assert_eq!(err.unwrap().to_string(), "sink down");
        assert!(w.write(b"").is_err());
        assert_eq!(good.contents(), "payload");
    }
}
