//! # Log Levels
//!
//! Seven ordered severities, from `PANIC` (most severe) to `TRACE` (most
//! verbose). Each level is a single bit, so a smaller numeric value is always
//! more severe and enablement is a plain integer comparison.
//!
//! `Level` is a newtype rather than an enum: values read back from an atomic
//! or built with [`Level::from_bits`] may fall outside the declared set, and
//! such values are consistently treated as "unknown" and disabled.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::core::error::LogError;

/// Severity of a log record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Level(u32);

impl Level {
    pub const PANIC: Level = Level(1 << 0);
    pub const FATAL: Level = Level(1 << 1);
    pub const ERROR: Level = Level(1 << 2);
    pub const WARN: Level = Level(1 << 3);
    pub const INFO: Level = Level(1 << 4);
    pub const DEBUG: Level = Level(1 << 5);
    pub const TRACE: Level = Level(1 << 6);

    /// Number of valid levels.
    pub const COUNT: usize = 7;

    /// Wraps a raw value. The result may be invalid.
    pub const fn from_bits(bits: u32) -> Level {
        Level(bits)
    }

    pub const fn bits(self) -> u32 {
        self.0
    }

    /// Reports whether this is one of the seven declared levels.
    pub const fn is_valid(self) -> bool {
        self.0 != 0 && self.0 & (self.0 - 1) == 0 && self.0 <= Level::TRACE.0
    }

    /// Reports whether `candidate` passes when `self` is the configured threshold.
    ///
    /// A level is enabled when it is at least as severe as the threshold. An
    /// invalid threshold or candidate never enables anything.
    pub const fn is_enabled(self, candidate: Level) -> bool {
        self.is_valid() && candidate.is_valid() && candidate.0 <= self.0
    }

    /// Dense index in `0..Level::COUNT` for valid levels.
    pub(crate) const fn index(self) -> Option<usize> {
        if self.is_valid() {
            Some(self.0.trailing_zeros() as usize)
        } else {
            None
        }
    }

    /// Lower-case canonical name, `"unknown"` for invalid values.
    pub const fn as_str(self) -> &'static str {
        match self {
            Level::PANIC => "panic",
            Level::FATAL => "fatal",
            Level::ERROR => "error",
            Level::WARN => "warn",
            Level::INFO => "info",
            Level::DEBUG => "debug",
            Level::TRACE => "trace",
            _ => "unknown",
        }
    }

    pub const fn capital_str(self) -> &'static str {
        match self {
            Level::PANIC => "PANIC",
            Level::FATAL => "FATAL",
            Level::ERROR => "ERROR",
            Level::WARN => "WARN",
            Level::INFO => "INFO",
            Level::DEBUG => "DEBUG",
            Level::TRACE => "TRACE",
            _ => "UNKNOWN",
        }
    }

    /// Three-letter form used by compact layouts.
    pub const fn short_str(self) -> &'static str {
        match self {
            Level::PANIC => "pnc",
            Level::FATAL => "fat",
            Level::ERROR => "err",
            Level::WARN => "wan",
            Level::INFO => "inf",
            Level::DEBUG => "dbg",
            Level::TRACE => "tac",
            _ => "uno",
        }
    }

    pub const fn short_capital_str(self) -> &'static str {
        match self {
            Level::PANIC => "PNC",
            Level::FATAL => "FAT",
            Level::ERROR => "ERR",
            Level::WARN => "WAN",
            Level::INFO => "INF",
            Level::DEBUG => "DBG",
            Level::TRACE => "TAC",
            _ => "UNO",
        }
    }

    /// ANSI color escape for this level.
    const fn color(self) -> &'static str {
        match self {
            Level::PANIC | Level::FATAL => "\x1b[1;31m",
            Level::ERROR => "\x1b[31m",
            Level::WARN => "\x1b[33m",
            Level::INFO => "\x1b[32m",
            Level::DEBUG => "\x1b[36m",
            Level::TRACE => "\x1b[37m",
            _ => "\x1b[90m",
        }
    }

    pub fn colored_str(self) -> String {
        paint(self.color(), self.as_str())
    }

    pub fn colored_capital_str(self) -> String {
        paint(self.color(), self.capital_str())
    }

    pub fn colored_short_str(self) -> String {
        paint(self.color(), self.short_str())
    }

    pub fn colored_short_capital_str(self) -> String {
        paint(self.color(), self.short_capital_str())
    }
}

fn paint(color: &str, text: &str) -> String {
    format!("{color}{text}\x1b[0m")
}

/// All valid levels, most severe first.
pub const fn all_levels() -> [Level; Level::COUNT] {
    [
        Level::PANIC,
        Level::FATAL,
        Level::ERROR,
        Level::WARN,
        Level::INFO,
        Level::DEBUG,
        Level::TRACE,
    ]
}

/// Parses a level name, ignoring case and surrounding whitespace.
///
/// `"warning"` is accepted as an alias of `"warn"`.
pub fn parse_level(s: &str) -> Result<Level, LogError> {
    match s.trim().to_ascii_lowercase().as_str() {
        "panic" => Ok(Level::PANIC),
        "fatal" => Ok(Level::FATAL),
        "error" => Ok(Level::ERROR),
        "warn" | "warning" => Ok(Level::WARN),
        "info" => Ok(Level::INFO),
        "debug" => Ok(Level::DEBUG),
        "trace" => Ok(Level::TRACE),
        _ => Err(LogError::InvalidLevel(s.to_string())),
    }
}

/// Like [`parse_level`], but panics on an unknown name. Meant for static setup.
pub fn must_parse_level(s: &str) -> Level {
    match parse_level(s) {
        Ok(level) => level,
        Err(err) => panic!("{err}"),
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Level {
    type Err = LogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_level(s)
    }
}

impl Default for Level {
    fn default() -> Self {
        Level::TRACE
    }
}

impl Serialize for Level {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Level {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        parse_level(&s).map_err(serde::de::Error::custom)
    }
}
