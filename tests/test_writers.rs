use rs_log_ng::writers::{self, LevelWriter, MultiWriter, MutexWriter, SharedWriter, Writer};
use rs_log_ng::{Level, Logger};
use serde_json::Value;
use std::io::{self, Write as _};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

struct Short(usize);

impl Writer for Short {
    fn write(&self, buf: &[u8]) -> io::Result<usize> {
        Ok(buf.len().min(self.0))
    }
}

struct Counting(AtomicUsize);

impl Writer for Counting {
    fn write(&self, _: &[u8]) -> io::Result<usize> {
        self.0.fetch_add(1, Ordering::Relaxed);
        Err(io::Error::other("closed"))
    }
}

fn capture(name: &str) -> (Logger, Arc<MutexWriter<Vec<u8>>>) {
    let logger = Logger::new(name);
    let out = Arc::new(MutexWriter::new(Vec::new()));
    logger.set_output(out.clone());
    (logger, out)
}

#[test]
fn multi_writer_reaches_every_writer() {
    let a = Arc::new(MutexWriter::new(Vec::new()));
    let b = Arc::new(MutexWriter::new(Vec::new()));
    let failing = Arc::new(Counting(AtomicUsize::new(0)));
    let multi = MultiWriter::new([
        failing.clone() as SharedWriter,
        a.clone() as SharedWriter,
        b.clone() as SharedWriter,
    ]);

    let (n, err) = multi.write_each(b"line\n");
    assert_eq!(n, 5);
    assert_eq!(err.unwrap().to_string(), "closed");
    assert_eq!(failing.0.load(Ordering::Relaxed), 1);
    assert_eq!(a.contents(), "line\n");
    assert_eq!(b.contents(), "line\n");
}

#[test]
fn short_write_is_an_error() {
    let multi = MultiWriter::new([Arc::new(Short(2)) as SharedWriter]);
    let (n, err) = multi.write_each(b"abcd");
    assert_eq!(n, 2);
    assert_eq!(err.unwrap().kind(), io::ErrorKind::WriteZero);
}

#[test]
fn logger_fans_out_and_reports_failures() {
    let (logger, out) = capture("fan");
    let errors = Arc::new(MutexWriter::new(Vec::new()));
    let multi = MultiWriter::new([
        out.clone() as SharedWriter,
        Arc::new(Counting(AtomicUsize::new(0))) as SharedWriter,
    ]);
    logger.set_output(multi.into_shared());
    logger.set_error_output(errors.clone());

    logger.info("hello");

    assert!(out.contents().contains("\"message\":\"hello\""));
    assert_eq!(errors.contents(), "rs_log_ng: [fan] write failed: closed\n");
}

#[test]
fn level_writer_turns_lines_into_records() {
    let (logger, out) = capture("bridge");
    let mut bridge = LevelWriter::new(Level::WARN, logger.as_log());
    assert_eq!(bridge.level(), Level::WARN);

    assert_eq!(io::Write::write(&mut bridge, b"disk low\n").unwrap(), 9);
    bridge.write_all(b"second\n").unwrap();
    Writer::write(&bridge, b"keep\n\n").unwrap();
    Writer::write(&bridge, b"bad \xff byte").unwrap();

    let recs: Vec<Value> = out
        .contents()
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();
    let messages: Vec<_> = recs.iter().map(|r| r["message"].as_str().unwrap()).collect();
    assert_eq!(messages, ["disk low", "second", "keep\n", "bad \u{fffd} byte"]);
    assert!(recs.iter().all(|r| r["level"] == "warn"));
}

#[test]
fn level_writer_respects_the_level_gate() {
    let (logger, out) = capture("bridge");
    logger.set_level(Level::ERROR);
    let bridge = LevelWriter::new(Level::DEBUG, logger.as_log());
    assert_eq!(Writer::write(&bridge, b"dropped\n").unwrap(), 8);
    assert_eq!(out.contents(), "");
}

#[test]
fn mutex_writer_wraps_any_io_write() {
    let w = MutexWriter::new(io::Cursor::new(Vec::new()));
    w.write(b"abc").unwrap();
    w.flush().unwrap();
    assert_eq!(w.into_inner().into_inner(), b"abc");

    let captured = MutexWriter::new(Vec::new());
    captured.write(b"xyz").unwrap();
    assert_eq!(captured.take(), b"xyz");
    assert_eq!(captured.contents(), "");
}

#[test]
fn standard_streams_are_shared_writers() {
    let out = writers::stdout();
    let err = writers::stderr();
    assert_eq!(out.write(b"").unwrap(), 0);
    assert_eq!(err.write(b"").unwrap(), 0);
}
