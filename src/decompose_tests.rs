// ABOUTME: Unit tests for the decompose module.
// ABOUTME: Tests reduction, tagging, capability dispatch, and the alterer.

use crate::{alter, decompose, jog, Converter, Options, Simplify, Value};
use chrono::DateTime;
use serde::Serialize;

#[test]
fn test_primitive_narrowing() {
    let opts = Options::default();
    assert!(matches!(decompose(&7i32, &opts).unwrap(), Value::Int(7)));
    assert!(matches!(decompose(&7u8, &opts).unwrap(), Value::Uint(7)));
    assert!(matches!(decompose(&1.5f32, &opts).unwrap(), Value::Float(_)));
    assert_eq!(decompose(&"hi", &opts).unwrap().as_str(), Some("hi"));
    assert!(decompose(&(), &opts).unwrap().is_null());
}

#[test]
fn test_sequences_and_tuples() {
    let opts = Options::default();
    let v = decompose(&vec![1, 2, 3], &opts).unwrap();
    assert_eq!(v, jog!([1, 2, 3]));

    let v = decompose(&(1i64, "x"), &opts).unwrap();
    assert_eq!(v.get(1).and_then(Value::as_str), Some("x"));
}

#[test]
fn test_map_key_coercion() {
    let opts = Options::default();
    let mut m = std::collections::BTreeMap::new();
    m.insert(10, "ten");
    let v = decompose(&m, &opts).unwrap();
    assert_eq!(v.get_key("10").and_then(Value::as_str), Some("ten"));
}

#[derive(Serialize)]
struct Person {
    name: String,
    age: u32,
}

#[test]
fn test_struct_tagging() {
    let opts = Options::decompose();
    let v = decompose(
        &Person {
            name: "Bob".to_string(),
            age: 30,
        },
        &opts,
    )
    .unwrap();
    let keys: Vec<&String> = v.as_object().unwrap().keys().collect();
    assert_eq!(keys, ["type", "name", "age"]);
    assert_eq!(v.get_key("type").and_then(Value::as_str), Some("Person"));
    assert_eq!(v.get_key("age").and_then(Value::as_u64), Some(30));
}

#[test]
fn test_struct_full_type_path() {
    crate::register_record::<Person>();
    let mut opts = Options::decompose();
    opts.full_type_path = true;
    let v = decompose(&Person { name: "B".to_string(), age: 1 }, &opts).unwrap();
    let tag = v.get_key("type").and_then(Value::as_str).unwrap();
    assert!(tag.ends_with("Person"));
    assert!(tag.contains("::"));
}

#[derive(Serialize)]
struct Sparse {
    a: Option<i32>,
    b: i32,
}

#[test]
fn test_omit_nil() {
    let v = decompose(&Sparse { a: None, b: 2 }, &Options::default()).unwrap();
    assert_eq!(v.get_key("a"), Some(&Value::Null));

    let mut opts = Options::default();
    opts.omit_nil = true;
    let v = decompose(&Sparse { a: None, b: 2 }, &opts).unwrap();
    assert!(v.get_key("a").is_none());
    assert_eq!(v.get_key("b").and_then(Value::as_i64), Some(2));
}

#[test]
fn test_value_input_preserves_time() {
    let opts = Options::default();
    let t = Value::Time(DateTime::from_timestamp_nanos(9));
    let v = decompose(&t, &opts).unwrap();
    assert_eq!(v, t);
}

#[test]
fn test_idempotence() {
    let opts = Options::default();
    let v = jog!({"a": [1, 2.5, null], "b": {"c": "x"}});
    let once = decompose(&v, &opts).unwrap();
    assert_eq!(once, v);
    let twice = decompose(&once, &opts).unwrap();
    assert_eq!(twice, once);
}

#[test]
fn test_converter_at_root() {
    let mut opts = Options::default();
    opts.converter = Some(Converter::nano());
    let v = decompose(&1_500_000_000i64, &opts).unwrap();
    assert_eq!(
        v.as_time().and_then(|t| t.timestamp_nanos_opt()),
        Some(1_500_000_000)
    );
}

#[derive(Serialize)]
struct Fahrenheit(f64);

impl Simplify for Fahrenheit {
    fn simplify(&self) -> Value {
        jog!({"fahrenheit": (self.0)})
    }
}

#[test]
fn test_capability_dispatch() {
    crate::register_simplify::<Fahrenheit>();
    let v = decompose(&Fahrenheit(70.0), &Options::default()).unwrap();
    assert_eq!(v.get_key("fahrenheit").and_then(Value::as_f64), Some(70.0));
}

#[test]
fn test_depth_limit() {
    let mut opts = Options::default();
    opts.max_depth = 3;
    assert!(decompose(&jog!([[[1]]]), &opts).is_ok());
    assert_eq!(
        decompose(&jog!([[[[1]]]]), &opts),
        Err(crate::Error::DepthExceeded)
    );
    assert_eq!(
        decompose(&vec![vec![vec![vec![1]]]], &opts),
        Err(crate::Error::DepthExceeded)
    );
}

#[test]
fn test_alter_in_place() {
    let mut opts = Options::default();
    opts.omit_nil = true;
    let mut v = jog!({"a": null, "b": [1, {"c": null, "d": 2}]});
    alter(&mut v, &opts).unwrap();
    assert_eq!(v, jog!({"b": [1, {"d": 2}]}));
}

#[test]
fn test_alter_converter_root() {
    let mut opts = Options::default();
    opts.converter = Some(Converter::rfc3339());
    let mut v = Value::String("1970-01-01T00:00:01Z".to_string());
    alter(&mut v, &opts).unwrap();
    assert_eq!(
        v.as_time().and_then(|t| t.timestamp_nanos_opt()),
        Some(1_000_000_000)
    );

    // Non-matching roots are left alone.
    let mut v = Value::String("plain".to_string());
    alter(&mut v, &opts).unwrap();
    assert_eq!(v.as_str(), Some("plain"));
}

#[derive(Serialize)]
enum Shade {
    Red,
    Gray(u8),
}

#[test]
fn test_enum_shapes() {
    let opts = Options::default();
    assert_eq!(decompose(&Shade::Red, &opts).unwrap().as_str(), Some("Red"));
    let v = decompose(&Shade::Gray(5), &opts).unwrap();
    assert_eq!(v.get_key("Gray").and_then(Value::as_u64), Some(5));
}
