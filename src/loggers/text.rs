//! # Text and Console Formatters
//!
//! [`TextFormatter`] renders a user template such as
//! `"{time} {level@sc} {message} {fields}"`. Recognized placeholders:
//!
//! | placeholder          | output                                         |
//! |----------------------|------------------------------------------------|
//! | `{name}`             | logger name                                    |
//! | `{time}`             | time in the logger's default layout            |
//! | `{time@<strftime>}`  | time in the given layout                       |
//! | `{level}`            | `info`; `@s` short, `@c` capital, `@sc` both   |
//! | `{message}`          | message                                        |
//! | `{caller}`           | caller, empty when not reported                |
//! | `{fields}`           | `k=v` pairs sorted by key                      |
//! | `{stack}`            | stack frames, one per tab-indented line        |
//!
//! Anything else in braces is copied through as literal text.
//!
//! [`ConsoleFormatter`] is a fixed, colored layout for terminals.

use crate::core::error::LogError;
use crate::loggers::fields::fields_to_text;
use crate::loggers::formatter::Formatter;
use crate::loggers::level::Level;
use crate::loggers::record::{Record, check_time_layout};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LevelStyle {
    Plain,
    Short,
    Capital,
    ShortCapital,
}

impl LevelStyle {
    fn parse(args: &str) -> LevelStyle {
        match args {
            "s" => LevelStyle::Short,
            "c" => LevelStyle::Capital,
            "sc" | "cs" => LevelStyle::ShortCapital,
            _ => LevelStyle::Plain,
        }
    }

    fn render(self, level: Level) -> &'static str {
        match self {
            LevelStyle::Plain => level.as_str(),
            LevelStyle::Short => level.short_str(),
            LevelStyle::Capital => level.capital_str(),
            LevelStyle::ShortCapital => level.short_capital_str(),
        }
    }
}

#[derive(Debug, Clone)]
enum Segment {
    Literal(String),
    Name,
    Time(Option<String>),
    Level(LevelStyle),
    Message,
    Caller,
    Fields,
    Stack,
}

/// Template-driven single-line formatter.
#[derive(Debug, Clone)]
pub struct TextFormatter {
    segments: Vec<Segment>,
    quote: bool,
}

impl TextFormatter {
    /// Compiles `template`. With `quote`, the rendered line is escaped so that
    /// newlines and other invisible characters stay on one line.
    pub fn new(template: &str, quote: bool) -> Result<Self, LogError> {
        let segments = parse_template(template)?;
        if !segments.iter().any(|s| !matches!(s, Segment::Literal(_))) {
            return Err(LogError::InvalidTextTemplate(template.to_string()));
        }
        Ok(Self { segments, quote })
    }

    /// Panicking variant of [`TextFormatter::new`] for static setup.
    pub fn must_new(template: &str, quote: bool) -> Self {
        match Self::new(template, quote) {
            Ok(f) => f,
            Err(err) => panic!("{err}"),
        }
    }

    fn render(&self, record: &Record) -> String {
        let mut out = String::with_capacity(128);
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Name => out.push_str(record.name()),
                Segment::Time(None) => out.push_str(&record.time_string()),
                Segment::Time(Some(layout)) => {
                    out.push_str(&record.time().format(layout).to_string())
                }
                Segment::Level(style) => out.push_str(style.render(record.level())),
                Segment::Message => out.push_str(record.message()),
                Segment::Caller => out.push_str(record.caller()),
                Segment::Fields => out.push_str(&fields_to_text(record.fields())),
                Segment::Stack => out.push_str(&record.stack().join("\n\t")),
            }
        }
        out
    }
}

impl Formatter for TextFormatter {
    fn format(&self, record: &Record, buf: &mut Vec<u8>) -> Result<(), LogError> {
        let line = self.render(record);
        if self.quote {
            buf.extend_from_slice(quote(&line).as_bytes());
        } else {
            buf.extend_from_slice(line.as_bytes());
        }
        buf.push(b'\n');
        Ok(())
    }
}

/// Escapes `s` like a Rust string literal, without the surrounding quotes.
fn quote(s: &str) -> String {
    let quoted = format!("{s:?}");
    quoted[1..quoted.len() - 1].to_string()
}

fn parse_template(template: &str) -> Result<Vec<Segment>, LogError> {
    let mut segments = Vec::new();
    let mut literal = String::new();
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        literal.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let placeholder = after
            .find(['{', '}'])
            .filter(|&end| after.as_bytes()[end] == b'}')
            .and_then(|end| parse_placeholder(&after[..end]).map(|p| (end, p)));

        match placeholder {
            Some((end, segment)) => {
                if !literal.is_empty() {
                    segments.push(Segment::Literal(std::mem::take(&mut literal)));
                }
                segments.push(segment?);
                rest = &after[end + 1..];
            }
            None => {
                literal.push('{');
                rest = after;
            }
        }
    }
    literal.push_str(rest);
    if !literal.is_empty() {
        segments.push(Segment::Literal(literal));
    }
    Ok(segments)
}

// Returns None when `inner` is not a placeholder at all.
fn parse_placeholder(inner: &str) -> Option<Result<Segment, LogError>> {
    let (key, args) = match inner.split_once('@') {
        Some((key, args)) => (key, args),
        None => (inner, ""),
    };
    let segment = match key {
        "name" => Segment::Name,
        "time" if args.is_empty() => Segment::Time(None),
        "time" => {
            if let Err(err) = check_time_layout(args) {
                return Some(Err(err));
            }
            Segment::Time(Some(args.to_string()))
        }
        "level" => Segment::Level(LevelStyle::parse(args)),
        "message" => Segment::Message,
        "caller" => Segment::Caller,
        "fields" => Segment::Fields,
        "stack" => Segment::Stack,
        _ => return None,
    };
    Some(Ok(segment))
}

/// Colored layout for interactive terminals:
/// `name [time][LVL] message caller k=v, ...`, followed by one tab-indented
/// line per stack frame.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleFormatter;

impl ConsoleFormatter {
    pub fn new() -> Self {
        ConsoleFormatter
    }
}

impl Formatter for ConsoleFormatter {
    fn format(&self, record: &Record, buf: &mut Vec<u8>) -> Result<(), LogError> {
        let mut out = String::with_capacity(128);
        if !record.name().is_empty() {
            out.push_str(record.name());
            out.push(' ');
        }
        let time = record.time_string();
        if !time.is_empty() {
            out.push('[');
            out.push_str(&time);
            out.push(']');
        }
        out.push('[');
        out.push_str(&record.level().colored_short_capital_str());
        out.push_str("] ");
        out.push_str(record.message());
        if record.has_caller() {
            out.push(' ');
            out.push_str(record.caller());
        }
        if record.has_fields() {
            out.push(' ');
            out.push_str(&fields_to_text(record.fields()));
        }
        for frame in record.stack() {
            out.push_str("\n\t");
            out.push_str(frame);
        }
        out.push('\n');
        buf.extend_from_slice(out.as_bytes());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loggers::fields::Fields;
    use chrono::{Local, TimeZone};
    use std::sync::Arc;

    fn record() -> Record {
        let mut r = Record::default();
        r.name = Arc::from("svc");
        r.level = Level::WARN;
        r.message = "disk low".into();
        r.time = Local.with_ymd_and_hms(2024, 5, 6, 7, 8, 9).unwrap();
        r.fields = Some(Arc::new(Fields::from_iter([("pct", 91), ("mount", 0)])));
        r
    }

    fn render(f: &dyn Formatter, r: &Record) -> String {
        let mut buf = Vec::new();
        f.format(r, &mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn renders_placeholders() {
        let f = TextFormatter::new("{name} {time@%Y/%m/%d} [{level@sc}] {message} {fields}", false)
            .unwrap();
        assert_eq!(render(&f, &record()), "svc 2024/05/06 [WAN] disk low mount=0, pct=91\n");
    }

    #[test]
    fn level_styles() {
        let r = record();
        for (args, want) in [("", "warn"), ("@s", "wan"), ("@c", "WARN"), ("@cs", "WAN")] {
            let f = TextFormatter::new(&format!("{{level{args}}}"), false).unwrap();
            assert_eq!(render(&f, &r), format!("{want}\n"));
        }
    }

    #[test]
    fn unknown_braces_are_literal() {
        let f = TextFormatter::new("{user} {message} {", false).unwrap();
        assert_eq!(render(&f, &record()), "{user} disk low {\n");
    }

    #[test]
    fn template_without_placeholders_is_rejected() {
        assert!(matches!(
            TextFormatter::new("plain text", false),
            Err(LogError::InvalidTextTemplate(_))
        ));
        assert!(matches!(
            TextFormatter::new("{time@%Y-%}", false),
            Err(LogError::InvalidTimeLayout(_))
        ));
    }

    #[test]
    fn quote_keeps_one_line() {
        let f = TextFormatter::new("{message}", true).unwrap();
        let mut r = record();
        r.message = "a\nb\t\"c\"".into();
        assert_eq!(render(&f, &r), "a\\nb\\t\\\"c\\\"\n");
    }

    #[test]
    fn console_layout() {
        let mut r = record();
        r.caller = "main.rs:3".into();
        r.stack = Some(vec!["app::main at src/main.rs:3:5".into()]);
        let out = render(&ConsoleFormatter, &r);
        assert_eq!(
            out,
            format!(
                "svc [{}] disk low main.rs:3 mount=0, pct=91\n\tapp::main at src/main.rs:3:5\n",
                Level::WARN.colored_short_capital_str()
            )
        );
    }
}
