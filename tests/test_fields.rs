use rs_log_ng::loggers::fields::{
    DISPLAY_PANIC_TEXT, ERROR_PANIC_TEXT, fields_from_pairs, fields_to_json, fields_to_text,
};
use rs_log_ng::{FieldValue, Fields};
use serde_json::json;
use std::fmt;

struct Exploding;

impl fmt::Display for Exploding {
    fn fmt(&self, _: &mut fmt::Formatter<'_>) -> fmt::Result {
        panic!("display blew up")
    }
}

#[derive(Debug)]
struct BadError;

impl fmt::Display for BadError {
    fn fmt(&self, _: &mut fmt::Formatter<'_>) -> fmt::Result {
        Err(fmt::Error)
    }
}

impl std::error::Error for BadError {}

#[test]
fn clone_and_with_never_mutate_the_receiver() {
    let base = Fields::from_iter([("a", 1), ("b", 2)]);
    let snapshot = base.clone();

    let grown = base.clone_with_capacity(4).with([("b", 20), ("c", 30)]);

    assert_eq!(base, snapshot);
    assert_eq!(grown.len(), 3);
    assert_eq!(grown.get("b"), Some(&FieldValue::from(20)));
}

#[test]
fn later_keys_win() {
    let f = Fields::new().with([("k", "first"), ("k", "second")]);
    assert_eq!(f.get("k"), Some(&FieldValue::from("second")));
}

#[test]
fn json_normalizes_errors_and_display_values() {
    let f = Fields::new()
        .with([("n", FieldValue::from(1))])
        .with([("err", FieldValue::error(std::io::Error::other("io down")))])
        .with([("addr", FieldValue::display(std::net::Ipv4Addr::LOCALHOST))])
        .with([("missing", FieldValue::from(None::<i32>))]);
    let v = serde_json::Value::Object(fields_to_json(&f));
    assert_eq!(v, json!({"n": 1, "err": "io down", "addr": "127.0.0.1", "missing": null}));
}

#[test]
fn text_is_sorted_and_unquoted() {
    let f = Fields::from_iter([("zeta", FieldValue::from("z")), ("alpha", FieldValue::from(true))]);
    assert_eq!(fields_to_text(&f), "alpha=true, zeta=z");
    assert_eq!(fields_to_text(&Fields::new()), "");
}

#[test]
fn panicking_conversions_are_contained() {
    let f = Fields::new()
        .with([("d", FieldValue::display(Exploding))])
        .with([("e", FieldValue::error(BadError))]);
    assert_eq!(fields_to_text(&f), format!("d={DISPLAY_PANIC_TEXT}, e={ERROR_PANIC_TEXT}"));
    let json = fields_to_json(&f);
    assert_eq!(json["e"], ERROR_PANIC_TEXT);
}

#[test]
fn pairs_build_fields() {
    let f = fields_from_pairs([FieldValue::from("user"), FieldValue::from(7), FieldValue::from(3)]);
    assert_eq!(f.get("user"), Some(&FieldValue::from(7)));
    assert_eq!(f.get("3"), Some(&FieldValue::from("")));
    assert_eq!(f.sorted_keys(), ["3", "user"]);
}
