// ABOUTME: Unit tests for the crate-level convenience functions.
// ABOUTME: Tests json, to_string, to_vec, and to_writer.

use crate::{jog, json, to_string, to_vec, to_writer};
use serde::Serialize;

#[derive(Serialize)]
struct Point {
    x: i32,
    y: i32,
}

#[test]
fn test_json() {
    assert_eq!(json(&jog!([1, null, "x"])), r#"[1,null,"x"]"#);
    assert_eq!(json(&jog!({})), "{}");
}

#[test]
fn test_to_string() {
    assert_eq!(to_string(&Point { x: 1, y: -2 }).unwrap(), r#"{"x":1,"y":-2}"#);
    assert_eq!(to_string(&true).unwrap(), "true");
}

#[test]
fn test_to_vec() {
    assert_eq!(to_vec(&vec![1u8, 2]).unwrap(), b"[1,2]");
}

#[test]
fn test_to_writer() {
    let mut out = Vec::new();
    to_writer(&mut out, &Point { x: 3, y: 4 }).unwrap();
    assert_eq!(out, br#"{"x":3,"y":4}"#);
}
