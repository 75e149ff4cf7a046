// ABOUTME: Unit tests for the builder module.
// ABOUTME: Tests frame keying rules, popping, and result assembly.

use crate::{jog, Builder, Value};

#[test]
fn test_flat_object() {
    let mut b = Builder::new();
    b.object(None).unwrap();
    b.value(Value::from("a"), Some("x")).unwrap();
    b.value(Value::Int(2), Some("y")).unwrap();
    b.pop();
    assert_eq!(b.result(), jog!({"x": "a", "y": 2}));
}

#[test]
fn test_flat_array() {
    let mut b = Builder::new();
    b.array(None).unwrap();
    b.value(Value::Int(1), None).unwrap();
    b.value(Value::Null, None).unwrap();
    b.value(Value::from("z"), None).unwrap();
    b.pop();
    assert_eq!(b.result(), jog!([1, null, "z"]));
}

#[test]
fn test_nested_object_in_object() {
    let mut b = Builder::new();
    b.object(None).unwrap();
    b.object(Some("inner")).unwrap();
    b.value(Value::Int(3), Some("n")).unwrap();
    b.pop();
    b.value(Value::Bool(true), Some("flag")).unwrap();
    b.pop();
    assert_eq!(b.result(), jog!({"inner": {"n": 3}, "flag": true}));
}

#[test]
fn test_nested_array_in_object() {
    let mut b = Builder::new();
    b.object(None).unwrap();
    b.array(Some("nums")).unwrap();
    b.value(Value::Int(1), None).unwrap();
    b.value(Value::Int(2), None).unwrap();
    b.pop();
    b.pop();
    assert_eq!(b.result(), jog!({"nums": [1, 2]}));
}

#[test]
fn test_nested_containers_in_array() {
    let mut b = Builder::new();
    b.array(None).unwrap();
    b.object(None).unwrap();
    b.value(Value::Int(1), Some("a")).unwrap();
    b.pop();
    b.array(None).unwrap();
    b.value(Value::Int(2), None).unwrap();
    b.pop();
    b.pop();
    assert_eq!(b.result(), jog!([{"a": 1}, [2]]));
}

#[test]
fn test_pop_all() {
    let mut b = Builder::new();
    b.object(None).unwrap();
    b.array(Some("a")).unwrap();
    b.array(None).unwrap();
    b.value(Value::Int(9), None).unwrap();
    b.pop_all();
    assert_eq!(b.result(), jog!({"a": [[9]]}));
}

#[test]
fn test_key_misuse() {
    let mut b = Builder::new();
    // A key is forbidden at the root.
    assert!(b.object(Some("k")).is_err());
    assert!(b.array(Some("k")).is_err());

    b.array(None).unwrap();
    let err = b.object(Some("k")).unwrap_err();
    assert_eq!(err.to_string(), "can not use a key when pushing to an array");
    assert!(b.value(Value::Null, Some("k")).is_err());

    let mut b = Builder::new();
    b.object(None).unwrap();
    let err = b.object(None).unwrap_err();
    assert_eq!(err.to_string(), "must have a key when pushing to an object");
    assert!(b.array(None).is_err());
    assert!(b.value(Value::Null, None).is_err());
}

#[test]
fn test_root_value() {
    let mut b = Builder::new();
    b.value(Value::Int(7), None).unwrap();
    assert_eq!(b.result(), Value::Int(7));
}

#[test]
fn test_empty_result_is_null() {
    let b = Builder::new();
    assert_eq!(b.result(), Value::Null);
}

#[test]
fn test_reset() {
    let mut b = Builder::new();
    b.object(None).unwrap();
    b.value(Value::Int(1), Some("a")).unwrap();
    b.pop();
    b.reset();
    assert_eq!(b.result(), Value::Null);
    b.array(None).unwrap();
    b.pop();
    assert_eq!(b.result(), jog!([]));
}

#[test]
fn test_object_entry_order_preserved() {
    let mut b = Builder::new();
    b.object(None).unwrap();
    b.value(Value::Int(1), Some("z")).unwrap();
    b.value(Value::Int(2), Some("a")).unwrap();
    b.pop();
    let result = b.result();
    let keys: Vec<&String> = result.as_object().unwrap().keys().collect();
    assert_eq!(keys, ["z", "a"]);
}
