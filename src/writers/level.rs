use std::io;
use std::panic::Location;

use crate::loggers::level::Level;
use crate::loggers::log::Log;
use crate::writers::Writer;

/// Turns every write into one log message at a fixed level.
///
/// One trailing `\n` is stripped, since formatters add their own line end.
/// Invalid UTF-8 is replaced lossily. This bridges libraries that only know
/// how to write to an `io::Write`.
#[derive(Debug, Clone)]
pub struct LevelWriter {
    level: Level,
    log: Log,
}

impl LevelWriter {
    pub fn new(level: Level, log: Log) -> Self {
        Self { level, log }
    }

    pub fn level(&self) -> Level {
        self.level
    }

    #[track_caller]
    fn emit(&self, buf: &[u8]) -> usize {
        let body = buf.strip_suffix(b"\n").unwrap_or(buf);
        let message = String::from_utf8_lossy(body);
        self.log.emit(self.level, Location::caller(), &message);
        buf.len()
    }
}

impl Writer for LevelWriter {
    fn write(&self, buf: &[u8]) -> io::Result<usize> {
        Ok(self.emit(buf))
    }
}

impl io::Write for LevelWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        Ok(self.emit(buf))
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
