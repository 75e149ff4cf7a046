// ABOUTME: Integration suite for encoding, decomposition, and builder behavior.
// ABOUTME: Cross-checks writer output against serde_json parsing for validity.

use chrono::DateTime;
use jog::{decompose, jog, Builder, Options, Value, Writer};
use serde::{Deserialize, Serialize};

fn tight() -> Writer {
    Writer::new(Options::default())
}

#[test]
fn sorted_compact_object() {
    let mut wr = tight();
    wr.options.sort = true;
    assert_eq!(wr.json(&jog!({"b": 2, "a": 1})), r#"{"a":1,"b":2}"#);
}

#[test]
fn array_with_null() {
    assert_eq!(tight().json(&jog!(["x", null, "y"])), r#"["x",null,"y"]"#);
}

#[test]
fn omit_nil_object() {
    let mut wr = tight();
    wr.options.omit_nil = true;
    assert_eq!(wr.json(&jog!({"k": null, "j": 1})), r#"{"j":1}"#);
    assert_eq!(wr.json(&jog!({"k": null})), "{}");
}

#[test]
fn html_escaping_default_and_unsafe() {
    let mut wr = tight();
    assert_eq!(wr.json(&jog!("a<b>&c")), "\"a\\u003cb\\u003e\\u0026c\"");
    wr.options.html_unsafe = true;
    assert_eq!(wr.json(&jog!("a<b>&c")), r#""a<b>&c""#);
}

#[test]
fn second_format_epsilon() {
    let mut wr = tight();
    wr.options.time_format = "second".to_string();
    let t = Value::Time(DateTime::from_timestamp_nanos(1));
    assert_eq!(wr.json(&t), "0.000000001");
}

#[test]
fn negative_second_format() {
    let mut wr = tight();
    wr.options.time_format = "second".to_string();
    let t = Value::Time(DateTime::from_timestamp_nanos(-2_000_000_001));
    assert_eq!(wr.json(&t), "-2.000000001");
}

#[derive(Serialize, Deserialize, Debug, PartialEq)]
struct Person {
    #[serde(rename = "Name")]
    name: String,
    #[serde(rename = "Age")]
    age: u32,
}

#[test]
fn decompose_tags_records() {
    let v = decompose(
        &Person {
            name: "Bob".to_string(),
            age: 30,
        },
        &Options::decompose(),
    )
    .unwrap();
    assert_eq!(
        tight().json(&v),
        r#"{"type":"Person","Name":"Bob","Age":30}"#
    );
}

#[test]
fn builder_keyed_value() {
    let mut b = Builder::new();
    b.object(None).unwrap();
    b.value(Value::from("a"), Some("x")).unwrap();
    b.pop();
    assert_eq!(tight().json(&b.result()), r#"{"x":"a"}"#);
}

#[test]
fn float32_shortest_form() {
    assert_eq!(tight().json_of(&1.5f32), "1.5");
}

#[test]
fn min_int64() {
    assert_eq!(
        tight().json(&Value::Int(i64::MIN)),
        "-9223372036854775808"
    );
}

#[test]
fn empty_containers_have_no_whitespace() {
    let mut wr = tight();
    wr.options.indent = 2;
    assert_eq!(wr.json(&jog!({})), "{}");
    assert_eq!(wr.json(&jog!([])), "[]");
    assert_eq!(wr.json(&jog!({"a": {}, "b": []})), "{\n  \"a\": {},\n  \"b\": []\n}");
}

#[test]
fn builder_rejects_bad_keying() {
    let mut b = Builder::new();
    b.array(None).unwrap();
    assert!(b.object(Some("k")).is_err());

    let mut b = Builder::new();
    b.object(None).unwrap();
    assert!(b.object(None).is_err());
}

// ---- Universal properties ----

fn sample_values() -> Vec<Value> {
    vec![
        Value::Null,
        Value::Bool(false),
        Value::Int(-42),
        Value::Uint(42),
        Value::Float(2.25),
        jog!("plain and \"quoted\" text with <html> & \u{2028} separators"),
        jog!([1, [true, null], {"deep": {"deeper": [2.5]}}]),
        jog!({"b": 1, "a": [null, "x"], "c": {"k": 0}}),
    ]
}

#[test]
fn decompose_is_idempotent_on_simple_values() {
    let opts = Options::default();
    for v in sample_values() {
        let once = decompose(&v, &opts).unwrap();
        assert_eq!(once, v);
        let twice = decompose(&once, &opts).unwrap();
        assert_eq!(twice, once);
    }
}

#[test]
fn output_parses_back_with_serde_json() {
    let mut wr = tight();
    for v in sample_values() {
        let text = wr.json(&v);
        let parsed: serde_json::Value = serde_json::from_str(&text).expect("invalid JSON emitted");
        // Re-encode through serde_json to confirm structural stability.
        let again: serde_json::Value =
            serde_json::from_str(&serde_json::to_string(&parsed).unwrap()).unwrap();
        assert_eq!(parsed, again);
    }
}

#[test]
fn indented_output_parses_back() {
    let mut wr = tight();
    wr.options.indent = 3;
    for v in sample_values() {
        let text = wr.json(&v);
        serde_json::from_str::<serde_json::Value>(&text).expect("invalid indented JSON");
    }
}

#[test]
fn sorted_keys_are_strictly_ascending() {
    let mut wr = tight();
    wr.options.sort = true;
    let v = jog!({"zeta": 1, "alpha": {"m": 1, "b": 2, "a": 3}, "mid": 2});
    let text = wr.json(&v);
    assert_eq!(
        text,
        r#"{"alpha":{"a":3,"b":2,"m":1},"mid":2,"zeta":1}"#
    );
}

#[test]
fn safe_output_contains_no_html_significant_bytes() {
    let mut wr = tight();
    let v = jog!({"html": "<a href=\"x\">&amp;</a>", "sep": "a\u{2028}b\u{2029}c"});
    let text = wr.json(&v);
    assert!(!text.contains('<'));
    assert!(!text.contains('>'));
    assert!(!text.contains('&'));
    assert!(!text.contains('\u{2028}'));
    assert!(!text.contains('\u{2029}'));
}

#[test]
fn repeated_encodes_are_identical() {
    let mut wr = tight();
    let v = jog!({"a": [1, 2, 3], "b": {"c": "text"}});
    assert_eq!(wr.json(&v), wr.json(&v));
}

#[test]
fn streamed_bytes_match_buffered_bytes() {
    let mut wr = tight();
    wr.options.write_limit = 6;
    let v = jog!({"alpha": [1, 2, 3], "beta": "a longer string to force flushing"});
    let expected = wr.json(&v);
    let mut sink = Vec::new();
    wr.write(&mut sink, &v).unwrap();
    assert_eq!(String::from_utf8(sink).unwrap(), expected);
}

#[test]
fn round_trip_through_recompose() {
    let original = Person {
        name: "Ada".to_string(),
        age: 36,
    };
    let v = decompose(&original, &Options::decompose()).unwrap();
    let back: Person = jog::recompose(&v).unwrap();
    assert_eq!(back, original);
}
