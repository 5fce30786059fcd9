//! # Writers
//!
//! The byte sink abstraction used by every logger: the default writer, the
//! per-level overrides, the diagnostic sink, and the composition wrappers in
//! this module's children.
//!
//! Unlike [`std::io::Write`], a [`Writer`] is written through a shared
//! reference so one sink can be handed to many loggers and threads at once.
//! Whether concurrent writes interleave is up to the implementation; wrap a
//! sink in [`MutexWriter`] when whole-write ordering matters.

use std::io::{self, Write as _};
use std::sync::Arc;

pub mod file;
pub mod level;
pub mod multi;
pub mod mutex;
pub(crate) mod worker;

pub use file::{FileWriter, FileWriterBuilder};
pub use level::LevelWriter;
pub use multi::MultiWriter;
pub use mutex::MutexWriter;

/// A sink accepting one formatted record (or any byte slice) per call.
pub trait Writer: Send + Sync {
    /// Writes `buf` and returns how many bytes the sink accepted.
    fn write(&self, buf: &[u8]) -> io::Result<usize>;

    /// Flushes buffered data, if the sink buffers at all.
    fn flush(&self) -> io::Result<()> {
        Ok(())
    }

    /// Lets [`MultiWriter::new`] flatten nested fan-outs.
    #[doc(hidden)]
    fn as_multi_writer(&self) -> Option<&MultiWriter> {
        None
    }
}

/// Reference-counted writer handle shared between loggers.
pub type SharedWriter = Arc<dyn Writer>;

/// Process standard output.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdoutWriter;

impl Writer for StdoutWriter {
    fn write(&self, buf: &[u8]) -> io::Result<usize> {
        io::stdout().lock().write_all(buf)?;
        Ok(buf.len())
    }

    fn flush(&self) -> io::Result<()> {
        io::stdout().lock().flush()
    }
}

/// Process standard error.
#[derive(Debug, Default, Clone, Copy)]
pub struct StderrWriter;

impl Writer for StderrWriter {
    fn write(&self, buf: &[u8]) -> io::Result<usize> {
        io::stderr().lock().write_all(buf)?;
        Ok(buf.len())
    }
}

/// Returns a shared handle to standard output.
pub fn stdout() -> SharedWriter {
    Arc::new(StdoutWriter)
}

/// Returns a shared handle to standard error.
pub fn stderr() -> SharedWriter {
    Arc::new(StderrWriter)
}

impl<W: Writer + ?Sized> Writer for Arc<W> {
    fn write(&self, buf: &[u8]) -> io::Result<usize> {
        (**self).write(buf)
    }

    fn flush(&self) -> io::Result<()> {
        (**self).flush()
    }

    fn as_multi_writer(&self) -> Option<&MultiWriter> {
        (**self).as_multi_writer()
    }
}
