//! # Log Handles
//!
//! A [`Log`] is a cheap, immutable view of a logger: a shared [`Core`] plus
//! the fields, context, caller override, message prefix and stack flag
//! accumulated by `with_*` calls. Every `with_*` returns a new handle; the
//! receiver is never changed, so a parent can hand out any number of
//! independent children.
//!
//! Logging methods are `#[track_caller]`, which makes the call site available
//! to caller reporting without walking the stack.

use std::error::Error as StdError;
use std::fmt::{self, Write as _};
use std::panic::Location;
use std::sync::Arc;

use crate::loggers::caller::CallerReporter;
use crate::loggers::core::Core;
use crate::loggers::fields::{FieldValue, Fields, fields_from_pairs};
use crate::loggers::level::Level;
use crate::loggers::record::Context;

#[derive(Clone)]
pub struct Log {
    core: Arc<Core>,
    fields: Option<Arc<Fields>>,
    ctx: Option<Context>,
    caller: Option<CallerReporter>,
    prefix: Option<Arc<str>>,
    stack: bool,
}

impl fmt::Debug for Log {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Log")
            .field("name", &self.core.name())
            .field("fields", &self.fields)
            .field("caller", &self.caller)
            .field("prefix", &self.prefix)
            .field("stack", &self.stack)
            .finish_non_exhaustive()
    }
}

impl Log {
    pub(crate) fn root(core: Arc<Core>) -> Self {
        Log {
            core,
            fields: None,
            ctx: None,
            caller: None,
            prefix: None,
            stack: false,
        }
    }

    /// Logger name.
    pub fn name(&self) -> &str {
        self.core.name()
    }

    pub(crate) fn core(&self) -> &Arc<Core> {
        &self.core
    }

    /// Fields carried by this handle.
    pub fn fields(&self) -> Option<&Fields> {
        self.fields.as_deref()
    }

    pub fn context(&self) -> Option<&Context> {
        self.ctx.as_ref()
    }

    pub fn prefix(&self) -> Option<&str> {
        self.prefix.as_deref()
    }

    pub(crate) fn fields_arc(&self) -> Option<Arc<Fields>> {
        self.fields.clone()
    }

    pub(crate) fn caller_override(&self) -> Option<CallerReporter> {
        self.caller
    }

    pub(crate) fn wants_stack(&self) -> bool {
        self.stack
    }

    fn with_fields_map(&self, fields: Fields) -> Log {
        Log {
            fields: Some(Arc::new(fields)),
            ..self.clone()
        }
    }

    fn current_fields(&self) -> &Fields {
        static EMPTY: once_cell::sync::Lazy<Fields> = once_cell::sync::Lazy::new(Fields::new);
        self.fields.as_deref().unwrap_or(&EMPTY)
    }

    /// Adds one field.
    pub fn with_field(&self, key: impl Into<String>, value: impl Into<FieldValue>) -> Log {
        let mut fields = self.current_fields().clone_with_capacity(1);
        fields.insert(key, value);
        self.with_fields_map(fields)
    }

    /// Adds `err` under the key `"error"`. It is stringified only when rendered.
    pub fn with_error<E: StdError + Send + Sync + 'static>(&self, err: E) -> Log {
        self.with_field("error", FieldValue::error(err))
    }

    /// Adds several fields; later keys win.
    pub fn with_fields<I, K, V>(&self, fields: I) -> Log
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<FieldValue>,
    {
        self.with_fields_map(self.current_fields().with(fields))
    }

    /// Adds fields from a flat `key, value, key, value, ...` list.
    pub fn with_field_pairs<I, V>(&self, pairs: I) -> Log
    where
        I: IntoIterator<Item = V>,
        V: Into<FieldValue>,
    {
        let pairs = fields_from_pairs(pairs);
        self.with_fields_map(
            self.current_fields()
                .with(pairs.iter().map(|(k, v)| (k.to_string(), v.clone()))),
        )
    }

    /// Attaches an opaque context, visible to hooks and formatters.
    pub fn with_context(&self, ctx: Context) -> Log {
        Log {
            ctx: Some(ctx),
            ..self.clone()
        }
    }

    /// Reports `file.rs:line` for records from this handle, overriding the
    /// logger's caller settings. `skip` counts frames above the call site.
    pub fn with_caller(&self, skip: usize) -> Log {
        self.with_reporter(CallerReporter::new(skip))
    }

    /// Like [`Log::with_caller`], but keeps the parent directory.
    pub fn with_long_caller(&self, skip: usize) -> Log {
        self.with_reporter(CallerReporter::long(skip))
    }

    fn with_reporter(&self, reporter: CallerReporter) -> Log {
        if self.caller == Some(reporter) {
            return self.clone();
        }
        Log {
            caller: Some(reporter),
            ..self.clone()
        }
    }

    /// Captures the call stack for every record from this handle.
    pub fn with_stack(&self) -> Log {
        Log {
            stack: true,
            ..self.clone()
        }
    }

    /// Appends `prefix` to this handle's message prefix.
    pub fn with_message_prefix(&self, prefix: &str) -> Log {
        if prefix.is_empty() {
            return self.clone();
        }
        let joined = match &self.prefix {
            Some(current) => format!("{current}{prefix}"),
            None => prefix.to_string(),
        };
        Log {
            prefix: Some(Arc::from(joined)),
            ..self.clone()
        }
    }

    pub fn is_enabled(&self, level: Level) -> bool {
        self.core.is_enabled(level)
    }

    /// Logs `message` at `level`. Invalid levels are discarded.
    #[track_caller]
    pub fn log(&self, level: Level, message: impl fmt::Display) {
        self.emit(level, Location::caller(), &message);
    }

    /// Logs preformatted arguments, as produced by `format_args!`.
    #[track_caller]
    pub fn log_args(&self, level: Level, args: fmt::Arguments<'_>) {
        self.emit(level, Location::caller(), &args);
    }

    pub(crate) fn emit(
        &self,
        level: Level,
        site: &'static Location<'static>,
        message: &dyn fmt::Display,
    ) {
        self.core.emit(self, level, site, &|out: &mut String| {
            // Writing into a String only fails if Display itself errors.
            let _ = write!(out, "{message}");
        });
    }

    #[track_caller]
    pub fn trace(&self, message: impl fmt::Display) {
        self.emit(Level::TRACE, Location::caller(), &message);
    }

    /// Alias of [`Log::trace`].
    #[track_caller]
    pub fn print(&self, message: impl fmt::Display) {
        self.emit(Level::TRACE, Location::caller(), &message);
    }

    #[track_caller]
    pub fn debug(&self, message: impl fmt::Display) {
        self.emit(Level::DEBUG, Location::caller(), &message);
    }

    #[track_caller]
    pub fn info(&self, message: impl fmt::Display) {
        self.emit(Level::INFO, Location::caller(), &message);
    }

    /// Alias of [`Log::info`].
    #[track_caller]
    pub fn echo(&self, message: impl fmt::Display) {
        self.emit(Level::INFO, Location::caller(), &message);
    }

    #[track_caller]
    pub fn warn(&self, message: impl fmt::Display) {
        self.emit(Level::WARN, Location::caller(), &message);
    }

    /// Alias of [`Log::warn`].
    #[track_caller]
    pub fn warning(&self, message: impl fmt::Display) {
        self.emit(Level::WARN, Location::caller(), &message);
    }

    #[track_caller]
    pub fn error(&self, message: impl fmt::Display) {
        self.emit(Level::ERROR, Location::caller(), &message);
    }

    /// Logs and then calls the logger's exit function with status 1.
    #[track_caller]
    pub fn fatal(&self, message: impl fmt::Display) {
        self.emit(Level::FATAL, Location::caller(), &message);
    }

    /// Logs and then calls the logger's panic function with the message.
    #[track_caller]
    pub fn panic(&self, message: impl fmt::Display) {
        self.emit(Level::PANIC, Location::caller(), &message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loggers::core::Settings;

    fn root() -> Log {
        Log::root(Arc::new(Core::new("t", Level::TRACE, Settings::default())))
    }

    #[test]
    fn children_are_independent() {
        let parent = root().with_field("a", 1);
        let left = parent.with_field("k", "v1");
        let right = parent.with_field("k", "v2");

        assert_eq!(left.fields().unwrap().get("k"), Some(&FieldValue::from("v1")));
        assert_eq!(right.fields().unwrap().get("k"), Some(&FieldValue::from("v2")));
        assert!(!parent.fields().unwrap().contains_key("k"));
        assert_eq!(left.fields().unwrap().len(), 2);
    }

    #[test]
    fn field_pairs_and_prefix() {
        let log = root()
            .with_field_pairs(["a", "1", "b"])
            .with_message_prefix("[db] ")
            .with_message_prefix("[tx] ");
        let fields = log.fields().unwrap();
        assert_eq!(fields.get("a"), Some(&FieldValue::from("1")));
        assert_eq!(fields.get("b"), Some(&FieldValue::from("")));
        assert_eq!(log.prefix(), Some("[db] [tx] "));
    }

    #[test]
    fn same_caller_is_a_no_op() {
        let log = root().with_caller(0);
        let again = log.with_caller(0);
        assert_eq!(again.caller_override(), Some(CallerReporter::new(0)));
        assert_eq!(log.with_long_caller(0).caller_override(), Some(CallerReporter::long(0)));
    }
}
