//! # Fields
//!
//! Key/value data attached to log records. A [`Fields`] map that has been
//! handed to a [`crate::loggers::Log`] handle is never mutated again: every
//! addition goes through [`Fields::with`] or [`Fields::clone_with_capacity`]
//! and produces a new map.
//!
//! Values are kept in their original form. Errors and `Display` values are
//! only turned into strings when a formatter renders the record.

use std::collections::HashMap;
use std::error::Error as StdError;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use serde_json::Value;

/// Text substituted when an error's `Display` implementation panics.
pub const ERROR_PANIC_TEXT: &str = "!!PANIC(Error::to_string)";

/// Text substituted when a value's `Display` implementation panics.
pub const DISPLAY_PANIC_TEXT: &str = "!!PANIC(Display::fmt)";

/// One field value.
#[derive(Clone)]
pub enum FieldValue {
    /// A plain JSON-compatible value.
    Value(Value),
    /// An error, stringified at render time.
    Error(Arc<dyn StdError + Send + Sync>),
    /// Any displayable value, stringified at render time.
    Display(Arc<dyn fmt::Display + Send + Sync>),
}

impl FieldValue {
    /// Wraps an error value.
    pub fn error<E: StdError + Send + Sync + 'static>(err: E) -> Self {
        FieldValue::Error(Arc::new(err))
    }

    /// Wraps a value rendered through its `Display` implementation.
    pub fn display<D: fmt::Display + Send + Sync + 'static>(value: D) -> Self {
        FieldValue::Display(Arc::new(value))
    }

    /// Serializes any `serde` value, falling back to `null`.
    pub fn serialize<T: serde::Serialize>(value: &T) -> Self {
        FieldValue::Value(serde_json::to_value(value).unwrap_or(Value::Null))
    }

    /// Returns the JSON form, if this is a plain value.
    pub fn as_value(&self) -> Option<&Value> {
        match self {
            FieldValue::Value(v) => Some(v),
            _ => None,
        }
    }

    /// Returns the error, if this field holds one.
    pub fn as_error(&self) -> Option<&(dyn StdError + Send + Sync)> {
        match self {
            FieldValue::Error(e) => Some(e.as_ref()),
            _ => None,
        }
    }

    /// Converts to a JSON value. Errors and display values become strings.
    pub fn to_json(&self) -> Value {
        match self {
            FieldValue::Value(v) => v.clone(),
            other => Value::String(other.to_text()),
        }
    }

    /// Converts to the text form used by the text and console formatters.
    ///
    /// Strings are emitted without quotes; `null` becomes the empty string.
    pub fn to_text(&self) -> String {
        match self {
            FieldValue::Value(Value::String(s)) => s.clone(),
            FieldValue::Value(Value::Null) => String::new(),
            FieldValue::Value(v) => v.to_string(),
            FieldValue::Error(e) => guarded_to_string(e.as_ref(), ERROR_PANIC_TEXT),
            FieldValue::Display(d) => guarded_to_string(d.as_ref(), DISPLAY_PANIC_TEXT),
        }
    }
}

fn guarded_to_string<T: fmt::Display + ?Sized>(value: &T, fallback: &str) -> String {
    // A Display impl may panic, or report fmt::Error which makes to_string panic.
    panic::catch_unwind(AssertUnwindSafe(|| value.to_string()))
        .unwrap_or_else(|_| fallback.to_string())
}

impl fmt::Debug for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Value(v) => write!(f, "{v}"),
            FieldValue::Error(_) => write!(f, "Error({:?})", self.to_text()),
            FieldValue::Display(_) => write!(f, "Display({:?})", self.to_text()),
        }
    }
}

impl PartialEq for FieldValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (FieldValue::Value(a), FieldValue::Value(b)) => a == b,
            (FieldValue::Error(a), FieldValue::Error(b)) => Arc::ptr_eq(a, b),
            (FieldValue::Display(a), FieldValue::Display(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl From<Value> for FieldValue {
    fn from(v: Value) -> Self {
        FieldValue::Value(v)
    }
}

impl From<&str> for FieldValue {
    fn from(v: &str) -> Self {
        FieldValue::Value(Value::String(v.to_string()))
    }
}

impl From<String> for FieldValue {
    fn from(v: String) -> Self {
        FieldValue::Value(Value::String(v))
    }
}

impl From<&String> for FieldValue {
    fn from(v: &String) -> Self {
        FieldValue::Value(Value::String(v.clone()))
    }
}

impl From<bool> for FieldValue {
    fn from(v: bool) -> Self {
        FieldValue::Value(Value::Bool(v))
    }
}

macro_rules! impl_from_number {
    ($($t:ty),*) => {
        $(
            impl From<$t> for FieldValue {
                fn from(v: $t) -> Self {
                    FieldValue::Value(Value::from(v))
                }
            }
        )*
    };
}

impl_from_number!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize, f32, f64);

impl<T: Into<FieldValue>> From<Option<T>> for FieldValue {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(FieldValue::Value(Value::Null))
    }
}

impl From<Arc<dyn StdError + Send + Sync>> for FieldValue {
    fn from(e: Arc<dyn StdError + Send + Sync>) -> Self {
        FieldValue::Error(e)
    }
}

impl From<Box<dyn StdError + Send + Sync>> for FieldValue {
    fn from(e: Box<dyn StdError + Send + Sync>) -> Self {
        FieldValue::Error(Arc::from(e))
    }
}

/// Key/value collection attached to a log handle or record.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Fields {
    map: HashMap<String, FieldValue>,
}

impl Fields {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy pre-sized for `additional` more inserts.
    pub fn clone_with_capacity(&self, additional: usize) -> Fields {
        let mut map = HashMap::with_capacity(self.map.len() + additional);
        map.extend(self.map.iter().map(|(k, v)| (k.clone(), v.clone())));
        Fields { map }
    }

    /// Returns a copy with `additions` laid over it. Later keys win.
    pub fn with<I, K, V>(&self, additions: I) -> Fields
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<FieldValue>,
    {
        let additions = additions.into_iter();
        let mut out = self.clone_with_capacity(additions.size_hint().0);
        for (k, v) in additions {
            out.map.insert(k.into(), v.into());
        }
        out
    }

    /// Inserts in place. Only used while a map is still private to its builder.
    pub(crate) fn insert(&mut self, key: impl Into<String>, value: impl Into<FieldValue>) {
        self.map.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&FieldValue> {
        self.map.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.map.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.map.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Keys in sorted order.
    pub fn sorted_keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self.map.keys().map(String::as_str).collect();
        keys.sort_unstable();
        keys
    }
}

impl<K: Into<String>, V: Into<FieldValue>> FromIterator<(K, V)> for Fields {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Fields {
            map: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }
}

/// Normalizes fields into a JSON object, stringifying errors and display values.
pub fn fields_to_json(fields: &Fields) -> serde_json::Map<String, Value> {
    fields
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_json()))
        .collect()
}

/// Renders fields as `k=v` pairs sorted by key and joined with `", "`.
pub fn fields_to_text(fields: &Fields) -> String {
    fields
        .sorted_keys()
        .into_iter()
        .filter_map(|k| fields.get(k).map(|v| format!("{k}={}", v.to_text())))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Builds fields from a flat key, value, key, value sequence.
///
/// Keys are rendered with [`FieldValue::to_text`]. A trailing key without a
/// value is stored with an empty string.
pub fn fields_from_pairs<I, V>(pairs: I) -> Fields
where
    I: IntoIterator<Item = V>,
    V: Into<FieldValue>,
{
    let mut out = Fields::new();
    let mut pairs = pairs.into_iter();
    while let Some(key) = pairs.next() {
        let key = key.into().to_text();
        match pairs.next() {
            Some(value) => out.insert(key, value),
            None => out.insert(key, ""),
        }
    }
    out
}
