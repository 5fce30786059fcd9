//! # JSON Formatter
//!
//! Renders one JSON object per line. The seven record keys (`name`, `time`,
//! `level`, `message`, `fields`, `caller`, `stack`) can each be renamed. In
//! full mode every key is present on every line, using `""`, `{}` and `[]`
//! for missing data, so downstream schemas stay stable.

use std::collections::HashMap;
use std::sync::Arc;

use once_cell::sync::Lazy;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::core::error::LogError;
use crate::loggers::fields::{FieldValue, Fields};
use crate::loggers::formatter::Formatter;
use crate::loggers::record::Record;

const KEYS: [&str; 7] = ["name", "time", "level", "message", "fields", "caller", "stack"];

static DEFAULT_JSON_FORMATTER: Lazy<Arc<JsonFormatter>> =
    Lazy::new(|| Arc::new(JsonFormatter::with_defaults(false)));

/// The process-wide default formatter: default keys, full mode off.
pub fn default_json_formatter() -> Arc<JsonFormatter> {
    DEFAULT_JSON_FORMATTER.clone()
}

#[derive(Debug, Clone)]
pub struct JsonFormatter {
    name: String,
    time: String,
    level: String,
    message: String,
    fields: String,
    caller: String,
    stack: String,
    full: bool,
    // True while every key keeps its default name.
    structure: bool,
}

impl JsonFormatter {
    /// Builds a formatter with renamed keys.
    ///
    /// `keys` maps default key names to output names. Unknown keys are
    /// rejected; empty output names leave the default in place.
    pub fn new(keys: &HashMap<String, String>, full: bool) -> Result<Self, LogError> {
        let mut f = Self::with_defaults(full);
        for (key, value) in keys {
            let slot = match key.as_str() {
                "name" => &mut f.name,
                "time" => &mut f.time,
                "level" => &mut f.level,
                "message" => &mut f.message,
                "fields" => &mut f.fields,
                "caller" => &mut f.caller,
                "stack" => &mut f.stack,
                _ => return Err(LogError::InvalidFormatterKey(key.clone())),
            };
            if !value.is_empty() && slot != value {
                *slot = value.clone();
                f.structure = false;
            }
        }
        Ok(f)
    }

    /// Panicking variant of [`JsonFormatter::new`] for static setup.
    pub fn must_new(keys: &HashMap<String, String>, full: bool) -> Self {
        match Self::new(keys, full) {
            Ok(f) => f,
            Err(err) => panic!("{err}"),
        }
    }

    pub fn with_defaults(full: bool) -> Self {
        let [name, time, level, message, fields, caller, stack] = KEYS.map(String::from);
        Self {
            name,
            time,
            level,
            message,
            fields,
            caller,
            stack,
            full,
            structure: true,
        }
    }

    pub fn is_full(&self) -> bool {
        self.full
    }

    fn format_structure(&self, record: &Record, buf: &mut Vec<u8>) -> Result<(), LogError> {
        let time = record.time_string();
        let line = JsonLine {
            caller: (self.full || record.has_caller()).then(|| record.caller()),
            fields: if record.has_fields() {
                Some(JsonFields::Some(record.fields()))
            } else {
                self.full.then_some(JsonFields::Empty)
            },
            level: record.level().as_str(),
            message: record.message(),
            name: (self.full || !record.name().is_empty()).then(|| record.name()),
            stack: (self.full || record.has_stack()).then(|| record.stack()),
            time: (self.full || !time.is_empty()).then_some(time.as_str()),
        };
        serde_json::to_writer(&mut *buf, &line)?;
        buf.push(b'\n');
        Ok(())
    }

    fn format_map(&self, record: &Record, buf: &mut Vec<u8>) -> Result<(), LogError> {
        let mut kv = Map::new();
        kv.insert(self.level.clone(), Value::from(record.level().as_str()));
        kv.insert(self.message.clone(), Value::from(record.message()));
        if self.full || !record.name().is_empty() {
            kv.insert(self.name.clone(), Value::from(record.name()));
        }
        let time = record.time_string();
        if self.full || !time.is_empty() {
            kv.insert(self.time.clone(), Value::from(time));
        }
        if record.has_fields() {
            kv.insert(
                self.fields.clone(),
                Value::Object(crate::loggers::fields::fields_to_json(record.fields())),
            );
        } else if self.full {
            kv.insert(self.fields.clone(), Value::Object(Map::new()));
        }
        if self.full || record.has_caller() {
            kv.insert(self.caller.clone(), Value::from(record.caller()));
        }
        if self.full || record.has_stack() {
            kv.insert(self.stack.clone(), Value::from(record.stack().to_vec()));
        }
        serde_json::to_writer(&mut *buf, &kv)?;
        buf.push(b'\n');
        Ok(())
    }
}

impl Default for JsonFormatter {
    fn default() -> Self {
        Self::with_defaults(false)
    }
}

impl Formatter for JsonFormatter {
    fn format(&self, record: &Record, buf: &mut Vec<u8>) -> Result<(), LogError> {
        if self.structure {
            self.format_structure(record, buf)
        } else {
            self.format_map(record, buf)
        }
    }
}

// Borrowed view of a record with keys in sorted order.
#[derive(Serialize)]
struct JsonLine<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    caller: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    fields: Option<JsonFields<'a>>,
    level: &'a str,
    message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stack: Option<&'a [String]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    time: Option<&'a str>,
}

enum JsonFields<'a> {
    Some(&'a Fields),
    Empty,
}

impl Serialize for JsonFields<'_> {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeMap;

        let fields = match self {
            JsonFields::Some(fields) => *fields,
            JsonFields::Empty => return serializer.serialize_map(Some(0))?.end(),
        };
        let keys = fields.sorted_keys();
        let mut map = serializer.serialize_map(Some(keys.len()))?;
        for key in keys {
            match fields.get(key) {
                Some(FieldValue::Value(v)) => map.serialize_entry(key, v)?,
                Some(other) => map.serialize_entry(key, &other.to_text())?,
                None => {}
            }
        }
        map.end()
    }
}
