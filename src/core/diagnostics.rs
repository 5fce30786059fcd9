//! # Internal Diagnostics
//!
//! Logging calls never return errors. When formatting, a hook, or a write
//! fails, or when the file writer cannot finish a maintenance step, the
//! failure is reported here as one line on a replaceable sink (standard error
//! unless configured otherwise).

use std::fmt;

use crate::writers::Writer;

/// The pipeline step that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Format,
    Hook,
    Write,
    Open,
    Sync,
    Rename,
    Prune,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Format => "format",
            Phase::Hook => "hook",
            Phase::Write => "write",
            Phase::Open => "open",
            Phase::Sync => "sync",
            Phase::Rename => "rename",
            Phase::Prune => "prune",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Writes one diagnostic line for a failed `phase` of the component `origin`
/// (a logger name or a file path).
///
/// Errors from the sink itself are swallowed; there is nowhere left to report them.
pub fn report(sink: &dyn Writer, origin: &str, phase: Phase, err: &dyn fmt::Display) {
    let line = format!("rs_log_ng: [{origin}] {phase} failed: {err}\n");
    let _ = sink.write(line.as_bytes());
}
