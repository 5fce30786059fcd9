//! # Log Records
//!
//! A [`Record`] carries one log event through the pipeline: it is filled by
//! the logger core, rendered by the formatter into its own buffer, shown to
//! hooks, written, and then scrubbed and returned to the pool.
//!
//! Formatters see the record before its buffer is filled. Hooks and output
//! interceptors see the final state, where [`Record::bytes`] holds the
//! formatted line; that content does not change afterwards.

use std::any::Any;
use std::sync::Arc;

use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, Local};
use once_cell::sync::Lazy;

use crate::core::error::LogError;
use crate::loggers::fields::{FieldValue, Fields};
use crate::loggers::level::Level;

/// Opaque, user-supplied context carried by a handle into its records.
pub type Context = Arc<dyn Any + Send + Sync>;

/// Buffers that grew beyond this are dropped instead of reused.
pub(crate) const MAX_POOLED_BUFFER: usize = 1024;

static EMPTY_STR: Lazy<Arc<str>> = Lazy::new(|| Arc::from(""));
static EMPTY_FIELDS: Lazy<Fields> = Lazy::new(Fields::new);

/// Rejects strftime layouts chrono cannot render.
///
/// Rendering an invalid layout through `Display` fails at format time, so
/// every layout is checked once when it is configured.
pub(crate) fn check_time_layout(layout: &str) -> Result<(), LogError> {
    if StrftimeItems::new(layout).any(|item| matches!(item, Item::Error)) {
        return Err(LogError::InvalidTimeLayout(layout.to_string()));
    }
    Ok(())
}

/// One log event plus its rendering buffer.
pub struct Record {
    pub(crate) name: Arc<str>,
    pub(crate) time: DateTime<Local>,
    pub(crate) time_layout: Arc<str>,
    pub(crate) level: Level,
    pub(crate) message: String,
    pub(crate) fields: Option<Arc<Fields>>,
    pub(crate) context: Option<Context>,
    pub(crate) caller: String,
    pub(crate) stack: Option<Vec<String>>,
    pub(crate) buffer: Vec<u8>,
}

impl Default for Record {
    fn default() -> Self {
        Record {
            name: EMPTY_STR.clone(),
            time: DateTime::<Local>::default(),
            time_layout: EMPTY_STR.clone(),
            level: Level::from_bits(0),
            message: String::new(),
            fields: None,
            context: None,
            caller: String::new(),
            stack: None,
            buffer: Vec::new(),
        }
    }
}

impl Record {
    /// Logger name.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn time(&self) -> DateTime<Local> {
        self.time
    }

    /// The time rendered with the logger's default layout, or an empty
    /// string when the layout is empty.
    pub fn time_string(&self) -> String {
        if self.time_layout.is_empty() {
            return String::new();
        }
        // Layouts are validated when set; rendering cannot fail here.
        self.time.format(&self.time_layout).to_string()
    }

    pub fn level(&self) -> Level {
        self.level
    }

    /// The message, including any handle prefix.
    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn has_fields(&self) -> bool {
        self.fields.as_ref().is_some_and(|f| !f.is_empty())
    }

    /// Field snapshot. Empty when the handle carried none.
    pub fn fields(&self) -> &Fields {
        self.fields.as_deref().unwrap_or(&EMPTY_FIELDS)
    }

    pub fn field(&self, key: &str) -> Option<&FieldValue> {
        self.fields.as_ref().and_then(|f| f.get(key))
    }

    pub fn has_context(&self) -> bool {
        self.context.is_some()
    }

    pub fn context(&self) -> Option<&Context> {
        self.context.as_ref()
    }

    /// Downcasts the context to a concrete type.
    pub fn context_ref<T: Any>(&self) -> Option<&T> {
        self.context.as_ref().and_then(|c| c.downcast_ref::<T>())
    }

    pub fn has_caller(&self) -> bool {
        !self.caller.is_empty()
    }

    /// `file:line` of the call site, empty when caller reporting is off.
    pub fn caller(&self) -> &str {
        &self.caller
    }

    pub fn has_stack(&self) -> bool {
        self.stack.as_ref().is_some_and(|s| !s.is_empty())
    }

    /// Stack frames captured at the call site, empty unless requested.
    pub fn stack(&self) -> &[String] {
        self.stack.as_deref().unwrap_or(&[])
    }

    /// Formatted content. Empty while the formatter is running.
    pub fn bytes(&self) -> &[u8] {
        &self.buffer
    }

    /// Formatted content as text (lossy for non UTF-8 output).
    pub fn as_str(&self) -> std::borrow::Cow<'_, str> {
        String::from_utf8_lossy(&self.buffer)
    }

    pub fn size(&self) -> usize {
        self.buffer.len()
    }

    /// Copies everything but the context out of the record, so a hook can
    /// keep it after the record goes back to the pool.
    pub fn to_snapshot(&self) -> RecordSnapshot {
        RecordSnapshot {
            name: self.name.to_string(),
            time: self.time,
            time_string: self.time_string(),
            level: self.level,
            message: self.message.clone(),
            fields: self.fields().clone(),
            caller: self.caller.clone(),
            stack: self.stack().to_vec(),
            bytes: self.buffer.clone(),
        }
    }

    /// Drops every reference the record holds so nothing leaks into the next use.
    pub(crate) fn scrub(&mut self) {
        if self.buffer.capacity() > MAX_POOLED_BUFFER {
            self.buffer = Vec::new();
        } else {
            self.buffer.clear();
        }
        self.name = EMPTY_STR.clone();
        self.time_layout = EMPTY_STR.clone();
        self.level = Level::from_bits(0);
        self.message.clear();
        self.fields = None;
        self.context = None;
        self.caller.clear();
        self.stack = None;
    }
}

/// Owned copy of a finished record.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordSnapshot {
    pub name: String,
    pub time: DateTime<Local>,
    pub time_string: String,
    pub level: Level,
    pub message: String,
    pub fields: Fields,
    pub caller: String,
    pub stack: Vec<String>,
    pub bytes: Vec<u8>,
}

impl RecordSnapshot {
    pub fn as_str(&self) -> std::borrow::Cow<'_, str> {
        String::from_utf8_lossy(&self.bytes)
    }
}
