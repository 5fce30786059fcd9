//! Structured, leveled logging with copy-on-write handles, pluggable
//! formatters, level-scoped hooks, and a size-rotated file writer.
//!
//! ```no_run
//! use rs_log_ng::{Level, LoggerBuilder, info};
//!
//! let logger = LoggerBuilder::new("svc").with_level(Level::INFO).build().unwrap();
//! let db = logger.with_field("component", "db");
//! info!(db, "connected", "pool" => 8);
//! db.warn("slow query");
//! ```

pub mod configs;
pub mod core;
pub mod loggers;
pub mod writers;

pub use configs::LoggerOptions;
pub use core::error::LogError;
pub use loggers::{
    CallerReporter, FieldValue, Fields, Formatter, Hook, Level, Log, Logger, LoggerBuilder,
    Record,
};
pub use writers::{FileWriter, LevelWriter, MultiWriter, MutexWriter, SharedWriter, Writer};
