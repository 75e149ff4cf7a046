// ABOUTME: Unit tests for the value module.
// ABOUTME: Tests the Value type, accessors, conversions, and the jog! macro.

use crate::{jog, Map, Value};
use chrono::DateTime;

#[test]
fn test_value_types() {
    assert!(Value::Null.is_null());
    assert!(Value::Bool(true).is_bool());
    assert!(Value::Int(42).is_number());
    assert!(Value::Uint(42).is_number());
    assert!(Value::Float(2.5).is_number());
    assert!(Value::String("hello".into()).is_string());
    assert!(Value::Time(DateTime::from_timestamp_nanos(0)).is_time());
    assert!(Value::Array(vec![]).is_array());
    assert!(Value::Object(Map::new()).is_object());
}

#[test]
fn test_value_accessors() {
    assert_eq!(Value::Bool(true).as_bool(), Some(true));
    assert_eq!(Value::Int(42).as_i64(), Some(42));
    assert_eq!(Value::Uint(100).as_u64(), Some(100));
    assert_eq!(Value::Float(2.5).as_f64(), Some(2.5));
    assert_eq!(Value::String("hello".into()).as_str(), Some("hello"));

    // Cross-variant coercions stay in range.
    assert_eq!(Value::Uint(7).as_i64(), Some(7));
    assert_eq!(Value::Uint(u64::MAX).as_i64(), None);
    assert_eq!(Value::Int(-1).as_u64(), None);
    assert_eq!(Value::Int(3).as_f64(), Some(3.0));
}

#[test]
fn test_value_from() {
    let v: Value = 42i32.into();
    assert!(matches!(v, Value::Int(42)));

    // Unsigned sources stay unsigned.
    let v: Value = 42u32.into();
    assert!(matches!(v, Value::Uint(42)));

    let v: Value = 1.5f32.into();
    assert_eq!(v.as_f64(), Some(1.5));

    let v: Value = "hello".into();
    assert_eq!(v.as_str(), Some("hello"));

    let v: Value = vec![1, 2, 3].into();
    assert!(v.is_array());

    let v: Value = Option::<i64>::None.into();
    assert!(v.is_null());

    let v: Value = DateTime::from_timestamp_nanos(5).into();
    assert_eq!(v.as_time().and_then(|t| t.timestamp_nanos_opt()), Some(5));
}

#[test]
fn test_value_collect() {
    let v: Value = (0..3).collect();
    assert_eq!(v.get(2).and_then(Value::as_i64), Some(2));

    let m: Map = vec![("a".to_string(), Value::Int(1)), ("b".to_string(), Value::Int(2))]
        .into_iter()
        .collect();
    let v = Value::from(m);
    assert_eq!(v.get_key("b").and_then(Value::as_i64), Some(2));
}

#[test]
fn test_jog_macro() {
    let v = jog!(null);
    assert!(v.is_null());

    let v = jog!([1, 2, 3]);
    assert!(v.is_array());
    assert_eq!(v.get(0).and_then(|v| v.as_i64()), Some(1));

    let v = jog!({
        "name": "test",
        "value": 42,
        "nested": {"flag": true}
    });
    assert!(v.is_object());
    assert_eq!(v.get_key("name").and_then(|v| v.as_str()), Some("test"));
    assert_eq!(
        v.get_key("nested").and_then(|n| n.get_key("flag")).and_then(Value::as_bool),
        Some(true)
    );
}

#[test]
fn test_empty_and_dup() {
    assert!(Value::Null.empty());
    assert!(jog!("").empty());
    assert!(jog!([]).empty());
    assert!(jog!({}).empty());
    assert!(!jog!(0).empty());
    assert!(!jog!(false).empty());

    let v = jog!({"a": [1, {"b": null}]});
    let d = v.dup();
    assert_eq!(d, v);
    assert_eq!(v.simplify(), v);
}

#[test]
fn test_object_insertion_order() {
    let v = jog!({"z": 1, "a": 2, "m": 3});
    let keys: Vec<&String> = v.as_object().unwrap().keys().collect();
    assert_eq!(keys, ["z", "a", "m"]);
}

#[test]
fn test_display_is_compact_json() {
    assert_eq!(Value::Null.to_string(), "null");
    assert_eq!(Value::Int(-3).to_string(), "-3");
    assert_eq!(jog!({"x": "a"}).to_string(), r#"{"x":"a"}"#);
    assert_eq!(jog!([1, null]).to_string(), "[1,null]");
}
