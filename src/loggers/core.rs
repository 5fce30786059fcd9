//! # Logger Core
//!
//! One [`Core`] exists per named logger and is shared by every [`Log`]
//! handle derived from it. It owns the level, the record pool, and a
//! [`Settings`] snapshot holding everything else (writers, formatter, hooks,
//! clock, terminal actions, caller reporting).
//!
//! The level is an atomic and may be changed at any time. Settings are
//! published through `ArcSwap`: logging calls read a snapshot without locking,
//! and each setter swaps in a modified copy. Setters racing each other can
//! lose an update, so configure a logger before sharing it.

use std::fmt;
use std::io;
use std::panic::Location;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use arc_swap::ArcSwap;
use chrono::{DateTime, Local};

use crate::core::diagnostics::{Phase, report};
use crate::loggers::caller::{CallerReporter, format_known_stack_prefixes, get_stack};
use crate::loggers::formatter::{FormatOutput, Formatter};
use crate::loggers::hook::HookBag;
use crate::loggers::json::default_json_formatter;
use crate::loggers::level::Level;
use crate::loggers::log::Log;
use crate::loggers::pool::{PoolStats, RecordPool};
use crate::loggers::record::Record;
use crate::writers::{self, SharedWriter};

/// Default time layout (RFC 3339 with seconds precision).
pub const DEFAULT_TIME_LAYOUT: &str = "%Y-%m-%dT%H:%M:%S%:z";

/// Exit status used when a `FATAL` record is logged.
pub const FATAL_EXIT_CODE: i32 = 1;

pub type NowFn = Arc<dyn Fn() -> DateTime<Local> + Send + Sync>;
pub type ExitFn = Arc<dyn Fn(i32) + Send + Sync>;
pub type PanicFn = Arc<dyn Fn(&str) + Send + Sync>;

/// Replaces the write step. Receives the finished record and the writer
/// the record would otherwise have gone to.
pub type Interceptor = Arc<dyn Fn(&Record, &SharedWriter) -> io::Result<usize> + Send + Sync>;

/// Configuration snapshot shared by every handle of one logger.
#[derive(Clone)]
pub(crate) struct Settings {
    pub(crate) writer: SharedWriter,
    pub(crate) level_writers: [Option<SharedWriter>; Level::COUNT],
    pub(crate) interceptor: Option<Interceptor>,
    pub(crate) formatter: Arc<dyn Formatter>,
    pub(crate) format_output: Option<Arc<dyn FormatOutput>>,
    pub(crate) hooks: HookBag,
    pub(crate) hooks_enabled: bool,
    pub(crate) now: NowFn,
    pub(crate) exit: ExitFn,
    pub(crate) panic: PanicFn,
    pub(crate) time_layout: Arc<str>,
    pub(crate) caller: Option<CallerReporter>,
    pub(crate) level_callers: [Option<CallerReporter>; Level::COUNT],
    pub(crate) stack_prefixes: Vec<String>,
    pub(crate) error_writer: SharedWriter,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            writer: writers::stdout(),
            level_writers: Default::default(),
            interceptor: None,
            formatter: default_json_formatter(),
            format_output: None,
            hooks: HookBag::new(),
            hooks_enabled: true,
            now: default_now(),
            exit: default_exit(),
            panic: default_panic(),
            time_layout: Arc::from(DEFAULT_TIME_LAYOUT),
            caller: None,
            level_callers: [None; Level::COUNT],
            stack_prefixes: format_known_stack_prefixes(Vec::<String>::new()),
            error_writer: writers::stderr(),
        }
    }
}

pub(crate) fn default_now() -> NowFn {
    Arc::new(Local::now)
}

pub(crate) fn default_exit() -> ExitFn {
    Arc::new(|code| std::process::exit(code))
}

pub(crate) fn default_panic() -> PanicFn {
    Arc::new(|msg| panic!("{msg}"))
}

pub struct Core {
    name: Arc<str>,
    level: AtomicU32,
    settings: ArcSwap<Settings>,
    pool: RecordPool,
}

impl Core {
    pub(crate) fn new(name: &str, level: Level, settings: Settings) -> Self {
        Core {
            name: Arc::from(name),
            level: AtomicU32::new(level.bits()),
            settings: ArcSwap::from_pointee(settings),
            pool: RecordPool::default(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn level(&self) -> Level {
        Level::from_bits(self.level.load(Ordering::Acquire))
    }

    pub(crate) fn set_level(&self, level: Level) {
        self.level.store(level.bits(), Ordering::Release);
    }

    pub fn is_enabled(&self, level: Level) -> bool {
        self.level().is_enabled(level)
    }

    pub fn pool_stats(&self) -> PoolStats {
        self.pool.stats()
    }

    pub(crate) fn settings(&self) -> Arc<Settings> {
        self.settings.load_full()
    }

    /// Publishes a modified copy of the current settings.
    pub(crate) fn update(&self, f: impl Fn(&mut Settings)) {
        self.settings.rcu(|current| {
            let mut next = Settings::clone(current);
            f(&mut next);
            next
        });
    }

    /// Runs one record through the pipeline.
    ///
    /// Disabled levels return before touching the pool. `message` renders
    /// the message body after the handle prefix.
    pub(crate) fn emit(
        &self,
        handle: &Log,
        level: Level,
        site: &'static Location<'static>,
        message: &dyn Fn(&mut String),
    ) {
        if !self.is_enabled(level) {
            return;
        }
        let settings = self.settings();
        let panic_message = {
            let mut record = self.pool.acquire();
            record.name = self.name.clone();
            record.time = (settings.now)();
            record.time_layout = settings.time_layout.clone();
            record.level = level;
            if let Some(prefix) = handle.prefix() {
                record.message.push_str(prefix);
            }
            message(&mut record.message);
            record.fields = handle.fields_arc();
            record.context = handle.context().cloned();

            let reporter = handle
                .caller_override()
                .or_else(|| level.index().and_then(|i| settings.level_callers[i]))
                .or(settings.caller);
            if let Some(reporter) = reporter {
                record.caller = reporter.report(site, &settings.stack_prefixes);
            }
            if handle.wants_stack() {
                record.stack = Some(get_stack(&settings.stack_prefixes));
            }

            self.format_and_write(&settings, &mut record);
            (level == Level::PANIC).then(|| record.message.clone())
        };

        if level == Level::FATAL {
            (settings.exit)(FATAL_EXIT_CODE);
        } else if let Some(msg) = panic_message {
            (settings.panic)(&msg);
        }
    }

    fn format_and_write(&self, settings: &Settings, record: &mut Record) {
        let mut buf = std::mem::take(&mut record.buffer);
        let formatted = match &settings.format_output {
            Some(selector) => selector.format_output(record, &mut buf),
            None => settings.formatter.format(record, &mut buf).map(|_| None),
        };
        record.buffer = buf;

        let target = match formatted {
            Ok(target) => target,
            Err(err) => {
                self.report(settings, Phase::Format, &err);
                return;
            }
        };

        if settings.hooks_enabled {
            if let Err(err) = settings.hooks.fire(record) {
                self.report(settings, Phase::Hook, &err);
            }
        }

        let writer = target
            .or_else(|| {
                record
                    .level
                    .index()
                    .and_then(|i| settings.level_writers[i].clone())
            })
            .unwrap_or_else(|| settings.writer.clone());
        let written = match &settings.interceptor {
            Some(intercept) => intercept(record, &writer),
            None => writer.write(record.bytes()),
        };
        if let Err(err) = written {
            self.report(settings, Phase::Write, &err);
        }
    }

    fn report(&self, settings: &Settings, phase: Phase, err: &dyn fmt::Display) {
        report(settings.error_writer.as_ref(), &self.name, phase, err);
    }
}
