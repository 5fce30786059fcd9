// src/loggers/mod.rs

pub mod builder;
pub mod caller;
pub mod core;
pub mod fields;
pub mod formatter;
pub mod hook;
pub mod json;
pub mod level;
pub mod log;
pub mod pool;
pub mod record;
pub mod text;

pub use builder::{Logger, LoggerBuilder};
pub use caller::CallerReporter;
pub use fields::{FieldValue, Fields};
pub use formatter::{FormatOutput, FormatOutputFn, Formatter, FormatterFn, LevelRouter};
pub use hook::{Hook, HookBag, HookError, HookFn};
pub use json::{JsonFormatter, default_json_formatter};
pub use level::{Level, all_levels, must_parse_level, parse_level};
pub use log::Log;
pub use pool::PoolStats;
pub use record::{Context, Record, RecordSnapshot};
pub use text::{ConsoleFormatter, TextFormatter};

#[macro_export]
macro_rules! log_base {
    // No kv pairs
    ($logger:expr, $level:expr, $msg:expr) => {
        $crate::log_base!($logger, $level, $msg, );
    };
    // With kv pairs (zero or more)
    ($logger:expr, $level:expr, $msg:expr, $( $k:expr => $v:expr ),* $(,)? ) => {
        {
            let log: &$crate::loggers::log::Log = &$logger;
            let level: $crate::loggers::level::Level = $level;
            // Skip building fields for disabled levels
            if log.is_enabled(level) {
                let pairs: ::std::vec::Vec<(::std::string::String, $crate::loggers::fields::FieldValue)> =
                    ::std::vec![$( ($k.to_string(), $crate::loggers::fields::FieldValue::from($v)) ),*];
                if pairs.is_empty() {
                    log.log(level, $msg);
                } else {
                    log.with_fields(pairs).log(level, $msg);
                }
            }
        }
    };
}

#[macro_export]
macro_rules! trace {
    ($logger:expr, $msg:expr $(, $k:expr => $v:expr )* $(,)? ) => {
        $crate::log_base!($logger, $crate::loggers::level::Level::TRACE, $msg $(, $k => $v )* )
    };
}

#[macro_export]
macro_rules! debug {
    ($logger:expr, $msg:expr $(, $k:expr => $v:expr )* $(,)? ) => {
        $crate::log_base!($logger, $crate::loggers::level::Level::DEBUG, $msg $(, $k => $v )* )
    };
}

#[macro_export]
macro_rules! info {
    ($logger:expr, $msg:expr $(, $k:expr => $v:expr )* $(,)? ) => {
        $crate::log_base!($logger, $crate::loggers::level::Level::INFO, $msg $(, $k => $v )* )
    };
}

#[macro_export]
macro_rules! warn {
    ($logger:expr, $msg:expr $(, $k:expr => $v:expr )* $(,)? ) => {
        $crate::log_base!($logger, $crate::loggers::level::Level::WARN, $msg $(, $k => $v )* )
    };
}

#[macro_export]
macro_rules! error {
    ($logger:expr, $msg:expr $(, $k:expr => $v:expr )* $(,)? ) => {
        $crate::log_base!($logger, $crate::loggers::level::Level::ERROR, $msg $(, $k => $v )* )
    };
}

#[macro_export]
macro_rules! fatal {
    ($logger:expr, $msg:expr $(, $k:expr => $v:expr )* $(,)? ) => {
        $crate::log_base!($logger, $crate::loggers::level::Level::FATAL, $msg $(, $k => $v )* )
    };
}

#[macro_export]
macro_rules! panic_log {
    ($logger:expr, $msg:expr $(, $k:expr => $v:expr )* $(,)? ) => {
        $crate::log_base!($logger, $crate::loggers::level::Level::PANIC, $msg $(, $k => $v )* )
    };
}
