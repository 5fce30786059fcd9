//! # Formatter Contract
//!
//! A formatter turns a [`Record`] into bytes appended to a buffer. When it
//! returns an error the record is dropped: no hook fires and nothing is
//! written. The library adds no line terminator of its own, so line-oriented
//! formatters append exactly one `\n`.

use std::sync::Arc;

use crate::core::error::LogError;
use crate::loggers::level::Level;
use crate::loggers::record::Record;
use crate::writers::SharedWriter;

/// Renders records.
pub trait Formatter: Send + Sync {
    fn format(&self, record: &Record, buf: &mut Vec<u8>) -> Result<(), LogError>;
}

/// A formatter that also picks the destination for each record.
///
/// Returning `Ok(None)` keeps the normal writer selection (per-level
/// override, then the default writer).
pub trait FormatOutput: Send + Sync {
    fn format_output(
        &self,
        record: &Record,
        buf: &mut Vec<u8>,
    ) -> Result<Option<SharedWriter>, LogError>;
}

/// Adapts a closure into a [`Formatter`].
pub struct FormatterFn<F>(pub F);

impl<F> Formatter for FormatterFn<F>
where
    F: Fn(&Record, &mut Vec<u8>) -> Result<(), LogError> + Send + Sync,
{
    fn format(&self, record: &Record, buf: &mut Vec<u8>) -> Result<(), LogError> {
        (self.0)(record, buf)
    }
}

/// Adapts a closure into a [`FormatOutput`].
pub struct FormatOutputFn<F>(pub F);

impl<F> FormatOutput for FormatOutputFn<F>
where
    F: Fn(&Record, &mut Vec<u8>) -> Result<Option<SharedWriter>, LogError> + Send + Sync,
{
    fn format_output(
        &self,
        record: &Record,
        buf: &mut Vec<u8>,
    ) -> Result<Option<SharedWriter>, LogError> {
        (self.0)(record, buf)
    }
}

/// Routes one formatter's output to a writer chosen by level.
///
/// Levels without an entry fall back to the logger's normal selection.
pub struct LevelRouter {
    formatter: Arc<dyn Formatter>,
    routes: Vec<(Level, SharedWriter)>,
}

impl LevelRouter {
    pub fn new(formatter: Arc<dyn Formatter>) -> Self {
        Self {
            formatter,
            routes: Vec::new(),
        }
    }

    pub fn route(mut self, level: Level, writer: SharedWriter) -> Self {
        self.routes.retain(|(l, _)| *l != level);
        self.routes.push((level, writer));
        self
    }
}

impl FormatOutput for LevelRouter {
    fn format_output(
        &self,
        record: &Record,
        buf: &mut Vec<u8>,
    ) -> Result<Option<SharedWriter>, LogError> {
        self.formatter.format(record, buf)?;
        Ok(self
            .routes
            .iter()
            .find(|(l, _)| *l == record.level())
            .map(|(_, w)| w.clone()))
    }
}
