//! # Caller and Stack Reporting
//!
//! Both captures are opt-in: callers gate them behind `enable_caller`,
//! `with_caller` or `with_stack`, never run them unconditionally.
//!
//! The direct call site (skip 0) comes from `#[track_caller]` and costs
//! nothing beyond formatting. Deeper frames and stacks are read from a
//! captured [`Backtrace`], whose textual form pairs a numbered symbol line
//! with an indented `at file:line:col` line. Frames belonging to this crate
//! and to the backtrace machinery are filtered out by symbol prefix.

use std::backtrace::Backtrace;
use std::panic::Location;
use std::path::Path;

/// Returned when no location is available for the requested frame.
pub const UNKNOWN_CALLER: &str = "???:0";

/// Symbol prefixes that always belong to the capture path itself.
pub const KNOWN_STACK_PREFIXES: &[&str] = &[
    concat!(env!("CARGO_CRATE_NAME"), "::"),
    "std::backtrace",
    "std::backtrace_rs",
    "backtrace_rs::",
];

/// Merges user prefixes with [`KNOWN_STACK_PREFIXES`], sorted and deduplicated.
pub fn format_known_stack_prefixes<I, S>(prefixes: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut out: Vec<String> = KNOWN_STACK_PREFIXES
        .iter()
        .map(|p| p.to_string())
        .chain(prefixes.into_iter().map(Into::into))
        .filter(|p| !p.is_empty())
        .collect();
    out.sort();
    out.dedup();
    out
}

/// Caller reporting settings: how many frames above the call site to skip,
/// and whether to keep the parent directory in the reported path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CallerReporter {
    skip: usize,
    long: bool,
}

impl CallerReporter {
    /// Reports `file.rs:line`.
    pub const fn new(skip: usize) -> Self {
        Self { skip, long: false }
    }

    /// Reports `parent/file.rs:line`.
    pub const fn long(skip: usize) -> Self {
        Self { skip, long: true }
    }

    pub const fn skip(&self) -> usize {
        self.skip
    }

    pub const fn is_long(&self) -> bool {
        self.long
    }

    /// Resolves the caller string for a log call made at `site`.
    pub fn report(&self, site: &'static Location<'static>, prefixes: &[String]) -> String {
        get_caller(self.skip, self.long, site, prefixes)
    }
}

/// Returns `file:line` of the frame `skip` levels above the logging call.
///
/// `site` is the `#[track_caller]` location of the logging call and answers
/// `skip == 0` directly. Larger skips walk a captured backtrace; when symbols
/// are unavailable or the stack is too shallow, [`UNKNOWN_CALLER`] is returned.
pub fn get_caller(
    skip: usize,
    long: bool,
    site: &'static Location<'static>,
    prefixes: &[String],
) -> String {
    if skip == 0 {
        return format_location(site.file(), site.line(), long);
    }
    let frames = parse_frames(&Backtrace::force_capture().to_string());
    let start = frames
        .iter()
        .position(|f| !has_stack_prefix(&f.symbol, prefixes))
        .unwrap_or(frames.len());
    frames
        .get(start + skip)
        .and_then(|f| f.location.as_deref())
        .and_then(split_location)
        .map(|(file, line)| format_location(file, line, long))
        .unwrap_or_else(|| UNKNOWN_CALLER.to_string())
}

/// Captures the current stack with internal frames removed.
///
/// Each entry reads `symbol at file:line:col`, or just `symbol` when the
/// location is unknown. This call is expensive.
pub fn get_stack(prefixes: &[String]) -> Vec<String> {
    parse_frames(&Backtrace::force_capture().to_string())
        .into_iter()
        .filter(|f| !has_stack_prefix(&f.symbol, prefixes))
        .map(|f| match f.location {
            Some(at) => format!("{} at {}", f.symbol, at),
            None => f.symbol,
        })
        .collect()
}

struct Frame {
    symbol: String,
    location: Option<String>,
}

fn parse_frames(text: &str) -> Vec<Frame> {
    let mut frames: Vec<Frame> = Vec::new();
    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if let Some(at) = line.strip_prefix("at ") {
            // Only the first location belongs to the symbol line above it.
            if let Some(last) = frames.last_mut() {
                if last.location.is_none() {
                    last.location = Some(at.to_string());
                }
            }
            continue;
        }
        if let Some((index, symbol)) = line.split_once(": ") {
            if !index.is_empty() && index.bytes().all(|b| b.is_ascii_digit()) {
                frames.push(Frame {
                    symbol: symbol.to_string(),
                    location: None,
                });
            }
        }
    }
    frames
}

fn has_stack_prefix(symbol: &str, prefixes: &[String]) -> bool {
    let symbol = symbol.trim_start_matches('<');
    KNOWN_STACK_PREFIXES.iter().any(|p| symbol.starts_with(p))
        || prefixes.iter().any(|p| symbol.starts_with(p.as_str()))
}

/// Splits `path:line:col` (or `path:line`) into path and line.
fn split_location(at: &str) -> Option<(&str, u32)> {
    let mut parts = at.rsplitn(3, ':');
    let last = parts.next()?;
    let middle = parts.next()?;
    match parts.next() {
        Some(file) => middle.parse().ok().map(|line| (file, line)),
        None => last.parse().ok().map(|line| (middle, line)),
    }
}

fn format_location(file: &str, line: u32, long: bool) -> String {
    let path = Path::new(file);
    let base = path
        .file_name()
        .map(|s| s.to_string_lossy())
        .unwrap_or_else(|| file.into());
    if long {
        if let Some(parent) = path.parent().and_then(Path::file_name) {
            return format!("{}/{}:{}", parent.to_string_lossy(), base, line);
        }
    }
    format!("{base}:{line}")
}
