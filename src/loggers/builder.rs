use std::io;
use std::ops::Deref;
use std::sync::Arc;

use chrono::{DateTime, Local};

use crate::core::error::LogError;
use crate::loggers::caller::{CallerReporter, format_known_stack_prefixes};
use crate::loggers::core::{
    Core, Interceptor, Settings, default_exit, default_now, default_panic,
};
use crate::loggers::formatter::{FormatOutput, Formatter};
use crate::loggers::hook::{Hook, HookError, HookFn};
use crate::loggers::json::default_json_formatter;
use crate::loggers::level::{Level, parse_level};
use crate::loggers::log::Log;
use crate::loggers::pool::PoolStats;
use crate::loggers::record::{Record, check_time_layout};
use crate::writers::{self, SharedWriter, Writer};

/// A named logger: the root [`Log`] handle plus the configuration setters.
///
/// `Logger` dereferences to [`Log`], so it logs and derives children
/// directly. Setters take `&self` and return `&Self` for chaining. Only
/// [`Logger::set_level`] is meant to be called while other threads log; the
/// others belong to setup.
#[derive(Clone)]
pub struct Logger {
    root: Log,
}

impl Deref for Logger {
    type Target = Log;

    fn deref(&self) -> &Log {
        &self.root
    }
}

impl std::fmt::Debug for Logger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Logger")
            .field("name", &self.name())
            .field("level", &self.get_level())
            .finish_non_exhaustive()
    }
}

impl Logger {
    /// Creates a logger at `TRACE` writing JSON lines to stdout.
    pub fn new(name: &str) -> Self {
        Self::with_settings(name, Level::TRACE, Settings::default())
    }

    fn with_settings(name: &str, level: Level, settings: Settings) -> Self {
        Logger {
            root: Log::root(Arc::new(Core::new(name, level, settings))),
        }
    }

    fn core(&self) -> &Core {
        self.root.core()
    }

    /// The root handle, detached from the setters.
    pub fn as_log(&self) -> Log {
        self.root.clone()
    }

    pub fn get_level(&self) -> Level {
        self.core().level()
    }

    /// Sets the threshold. Safe to call while other threads log.
    pub fn set_level(&self, level: Level) -> &Self {
        self.core().set_level(level);
        self
    }

    /// Parses and sets the threshold. On error the level is unchanged.
    pub fn set_level_str(&self, level: &str) -> Result<&Self, LogError> {
        let level = parse_level(level)?;
        Ok(self.set_level(level))
    }

    /// Like [`Logger::set_level_str`], ignoring unknown names.
    pub fn force_set_level_str(&self, level: &str) -> &Self {
        if let Ok(level) = parse_level(level) {
            self.set_level(level);
        }
        self
    }

    pub fn set_output(&self, writer: SharedWriter) -> &Self {
        self.core().update(|s| s.writer = writer.clone());
        self
    }

    /// Sets or clears the writer used for one level. Invalid levels are ignored.
    pub fn set_level_output(&self, level: Level, writer: Option<SharedWriter>) -> &Self {
        if let Some(index) = level.index() {
            self.core()
                .update(|s| s.level_writers[index] = writer.clone());
        }
        self
    }

    /// Sets or clears the writer for several levels at once.
    pub fn set_levels_output(&self, levels: &[Level], writer: Option<SharedWriter>) -> &Self {
        let indexes: Vec<usize> = levels.iter().filter_map(|l| l.index()).collect();
        self.core().update(|s| {
            for &index in &indexes {
                s.level_writers[index] = writer.clone();
            }
        });
        self
    }

    /// Replaces writing with `f`. `None` restores normal writing.
    pub fn set_output_interceptor(&self, f: Option<Interceptor>) -> &Self {
        self.core().update(|s| s.interceptor = f.clone());
        self
    }

    /// Convenience form of [`Logger::set_output_interceptor`] for closures.
    pub fn set_output_interceptor_fn<F>(&self, f: F) -> &Self
    where
        F: Fn(&Record, &SharedWriter) -> io::Result<usize> + Send + Sync + 'static,
    {
        self.set_output_interceptor(Some(Arc::new(f)))
    }

    /// Replaces the clock. `None` restores `Local::now`.
    pub fn set_now_fn(
        &self,
        f: Option<Arc<dyn Fn() -> DateTime<Local> + Send + Sync>>,
    ) -> &Self {
        let f = f.unwrap_or_else(default_now);
        self.core().update(|s| s.now = f.clone());
        self
    }

    /// Replaces the action taken after a `FATAL` record. `None` restores
    /// `std::process::exit`.
    pub fn set_exit_fn(&self, f: Option<Arc<dyn Fn(i32) + Send + Sync>>) -> &Self {
        let f = f.unwrap_or_else(default_exit);
        self.core().update(|s| s.exit = f.clone());
        self
    }

    /// Replaces the action taken after a `PANIC` record. `None` restores `panic!`.
    pub fn set_panic_fn(&self, f: Option<Arc<dyn Fn(&str) + Send + Sync>>) -> &Self {
        let f = f.unwrap_or_else(default_panic);
        self.core().update(|s| s.panic = f.clone());
        self
    }

    /// Sets the formatter and clears any format-output selector. `None`
    /// restores the default JSON formatter.
    pub fn set_formatter(&self, formatter: Option<Arc<dyn Formatter>>) -> &Self {
        let formatter: Arc<dyn Formatter> = match formatter {
            Some(f) => f,
            None => default_json_formatter(),
        };
        self.core().update(|s| {
            s.formatter = formatter.clone();
            s.format_output = None;
        });
        self
    }

    /// Sets a formatter that also chooses the writer per record.
    pub fn set_format_output(&self, selector: Option<Arc<dyn FormatOutput>>) -> &Self {
        self.core().update(|s| s.format_output = selector.clone());
        self
    }

    /// Sets the strftime layout behind [`Record::time_string`]. An empty
    /// layout disables the time string.
    pub fn set_default_time_layout(&self, layout: &str) -> Result<&Self, LogError> {
        check_time_layout(layout)?;
        let layout: Arc<str> = Arc::from(layout);
        self.core().update(|s| s.time_layout = layout.clone());
        Ok(self)
    }

    /// Reports `file.rs:line` for every level, `skip` frames above the call.
    pub fn enable_caller(&self, skip: usize) -> &Self {
        self.core()
            .update(|s| s.caller = Some(CallerReporter::new(skip)));
        self
    }

    /// Reports `parent/file.rs:line` for every level.
    pub fn enable_long_caller(&self, skip: usize) -> &Self {
        self.core()
            .update(|s| s.caller = Some(CallerReporter::long(skip)));
        self
    }

    /// Reports the caller for one level, taking precedence over the global setting.
    pub fn enable_level_caller(&self, level: Level, reporter: CallerReporter) -> &Self {
        self.enable_levels_caller(&[level], reporter)
    }

    pub fn enable_levels_caller(&self, levels: &[Level], reporter: CallerReporter) -> &Self {
        let indexes: Vec<usize> = levels.iter().filter_map(|l| l.index()).collect();
        self.core().update(|s| {
            for &index in &indexes {
                s.level_callers[index] = Some(reporter);
            }
        });
        self
    }

    /// Turns off global and per-level caller reporting. Handles created with
    /// `with_caller` keep reporting.
    pub fn disable_caller(&self) -> &Self {
        self.core().update(|s| {
            s.caller = None;
            s.level_callers = [None; Level::COUNT];
        });
        self
    }

    /// Extra symbol prefixes hidden from stacks and skipped when resolving callers.
    pub fn set_stack_prefixes<I, S>(&self, prefixes: I) -> &Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let prefixes = format_known_stack_prefixes(prefixes);
        self.core().update(|s| s.stack_prefixes = prefixes.clone());
        self
    }

    pub fn add_hook(&self, hook: Arc<dyn Hook>) -> &Self {
        self.core().update(|s| s.hooks.add(hook.clone()));
        self
    }

    pub fn add_hook_fn<F>(&self, levels: &[Level], f: F) -> &Self
    where
        F: Fn(&Record) -> Result<(), HookError> + Send + Sync + 'static,
    {
        self.add_hook(Arc::new(HookFn::new(levels.to_vec(), f)))
    }

    /// Turns hook firing on or off without removing the hooks.
    pub fn enable_hook(&self, enabled: bool) -> &Self {
        self.core().update(|s| s.hooks_enabled = enabled);
        self
    }

    /// Sets the sink for internal pipeline errors. Defaults to stderr.
    pub fn set_error_output(&self, writer: SharedWriter) -> &Self {
        self.core().update(|s| s.error_writer = writer.clone());
        self
    }

    pub fn pool_stats(&self) -> PoolStats {
        self.core().pool_stats()
    }
}

/// Builds a [`Logger`] in one expression.
pub struct LoggerBuilder {
    name: String,
    level: Level,
    settings: Settings,
}

impl LoggerBuilder {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            level: Level::TRACE,
            settings: Settings::default(),
        }
    }

    pub fn with_level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    pub fn with_output(mut self, writer: SharedWriter) -> Self {
        self.settings.writer = writer;
        self
    }

    pub fn with_output_writer<W: Writer + 'static>(self, writer: W) -> Self {
        self.with_output(Arc::new(writer))
    }

    pub fn with_stdout(self) -> Self {
        self.with_output(writers::stdout())
    }

    pub fn with_level_output(mut self, level: Level, writer: SharedWriter) -> Self {
        if let Some(index) = level.index() {
            self.settings.level_writers[index] = Some(writer);
        }
        self
    }

    pub fn with_formatter<F: Formatter + 'static>(mut self, formatter: F) -> Self {
        self.settings.formatter = Arc::new(formatter);
        self.settings.format_output = None;
        self
    }

    pub fn with_time_layout(mut self, layout: &str) -> Self {
        self.settings.time_layout = Arc::from(layout);
        self
    }

    pub fn with_caller(mut self, reporter: CallerReporter) -> Self {
        self.settings.caller = Some(reporter);
        self
    }

    pub fn with_stack_prefixes<I, S>(mut self, prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.settings.stack_prefixes = format_known_stack_prefixes(prefixes);
        self
    }

    pub fn with_hook(mut self, hook: Arc<dyn Hook>) -> Self {
        self.settings.hooks.add(hook);
        self
    }

    pub fn with_error_output(mut self, writer: SharedWriter) -> Self {
        self.settings.error_writer = writer;
        self
    }

    /// Validates the collected settings and creates the logger.
    pub fn build(self) -> Result<Logger, LogError> {
        if !self.level.is_valid() {
            return Err(LogError::InvalidLevel(self.level.bits().to_string()));
        }
        check_time_layout(&self.settings.time_layout)?;
        Ok(Logger::with_settings(&self.name, self.level, self.settings))
    }
}
