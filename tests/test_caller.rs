use rs_log_ng::loggers::caller::{UNKNOWN_CALLER, get_stack};
use rs_log_ng::writers::MutexWriter;
use rs_log_ng::{CallerReporter, Level, Log, Logger};
use serde_json::Value;
use std::sync::Arc;

fn setup() -> (Logger, Arc<MutexWriter<Vec<u8>>>) {
    let logger = Logger::new("caller");
    let out = Arc::new(MutexWriter::new(Vec::new()));
    logger.set_output(out.clone());
    (logger, out)
}

fn records(out: &MutexWriter<Vec<u8>>) -> Vec<Value> {
    out.contents()
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect()
}

#[inline(never)]
fn log_from_helper(log: &Log) {
    log.info("from helper");
}

#[test]
fn direct_call_site_is_reported() {
    let (logger, out) = setup();
    logger.enable_caller(0);
    logger.info("here");
    let line = line!() - 1;
    logger.enable_long_caller(0);
    logger.info("long");
    let long_line = line!() - 1;

    let recs = records(&out);
    assert_eq!(recs[0]["caller"], format!("test_caller.rs:{line}"));
    assert_eq!(recs[1]["caller"], format!("tests/test_caller.rs:{long_line}"));
}

#[test]
fn skip_walks_up_the_stack() {
    let (logger, out) = setup();
    log_from_helper(&logger.with_caller(1));
    let line = line!() - 1;

    let recs = records(&out);
    let caller = recs[0]["caller"].as_str().unwrap();
    if cfg!(debug_assertions) {
        assert_eq!(caller, format!("test_caller.rs:{line}"));
    } else {
        assert!(caller == format!("test_caller.rs:{line}") || caller == UNKNOWN_CALLER, "{caller}");
    }
}

#[test]
fn precedence_handle_then_level_then_global() {
    let (logger, out) = setup();
    logger.enable_caller(0);
    logger.enable_level_caller(Level::WARN, CallerReporter::long(0));

    logger.info("global");
    logger.warn("per level");
    logger.with_long_caller(0).info("handle");
    logger.disable_caller();
    logger.info("none");
    logger.with_caller(0).info("handle only");

    let recs = records(&out);
    let callers: Vec<_> = recs.iter().map(|r| r.get("caller").and_then(Value::as_str)).collect();
    assert!(callers[0].unwrap().starts_with("test_caller.rs:"));
    assert!(callers[1].unwrap().starts_with("tests/test_caller.rs:"));
    assert!(callers[2].unwrap().starts_with("tests/test_caller.rs:"));
    assert_eq!(callers[3], None);
    assert!(callers[4].unwrap().starts_with("test_caller.rs:"));
}

#[test]
fn stack_excludes_library_frames() {
    let (logger, out) = setup();
    logger.with_stack().error("with stack");
    logger.error("without");

    let recs = records(&out);
    let frames = recs[0]["stack"].as_array().unwrap();
    assert!(!frames.is_empty());
    for frame in frames {
        let frame = frame.as_str().unwrap();
        assert!(!frame.starts_with("rs_log_ng::"), "{frame}");
        assert!(!frame.starts_with("std::backtrace"), "{frame}");
    }
    assert!(recs[1].get("stack").is_none());
}

#[test]
fn user_prefixes_filter_frames() {
    let all = get_stack(&[]);
    let filtered = get_stack(&["test_caller::".to_string()]);
    assert!(all.iter().any(|f| f.starts_with("test_caller::")));
    assert!(filtered.iter().all(|f| !f.starts_with("test_caller::")));
}
