//! # Core Error Module
//!
//! This module defines the central `LogError` type used throughout the library.
//! It leverages `thiserror` for error message formatting.
//!
//! Only setup-time operations (parsing a level, building a formatter, opening a
//! file writer, loading options) return these errors to the caller. Failures on
//! the logging path are routed to the diagnostic sink instead, see
//! [`crate::core::diagnostics`].

use std::path::PathBuf;
use thiserror::Error;

/// Central error type for the `rs_log_ng` library.
#[derive(Debug, Error)]
pub enum LogError {
    /// A level string did not match any known level name or alias.
    #[error("invalid logger level string: {0:?}")]
    InvalidLevel(String),

    /// A JSON formatter key mapping referenced a key that does not exist.
    #[error("invalid json formatter key {0:?}")]
    InvalidFormatterKey(String),

    /// A text formatter template contained no recognised placeholder.
    #[error("invalid text formatter template {0:?}")]
    InvalidTextTemplate(String),

    /// A strftime layout could not be parsed.
    #[error("invalid time layout {0:?}")]
    InvalidTimeLayout(String),

    /// Error related to configuration loading or merging.
    #[error("configuration error: {0}")]
    ConfigError(String),

    /// The file writer target exists but is not a regular file.
    #[error("path {0} exists, but is not a regular file")]
    NotRegularFile(PathBuf),

    /// A formatter could not render a record.
    #[error("format error: {0}")]
    Format(String),

    /// JSON encoding failure.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// Underlying I/O failure.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
