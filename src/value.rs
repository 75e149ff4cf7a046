// ABOUTME: Dynamic JSON value type for jog.
// ABOUTME: Covers the simple subset: primitives, times, arrays, and ordered objects.

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::ser::Error as _;
use std::fmt;

/// The mapping type backing [`Value::Object`]. Preserves insertion order.
pub type Map = IndexMap<String, Value>;

/// A JSON-shaped value.
///
/// Every `Value` lies in the simple subset: primitives, times, arrays of
/// simple values, and string-keyed objects of simple values. Signed and
/// unsigned 64-bit integers are distinct variants and are never widened
/// into each other.
#[derive(Clone, PartialEq, Default)]
pub enum Value {
    /// JSON null
    #[default]
    Null,
    /// JSON boolean
    Bool(bool),
    /// A signed 64-bit integer
    Int(i64),
    /// An unsigned 64-bit integer
    Uint(u64),
    /// A 64-bit floating point number
    Float(f64),
    /// A UTF-8 string
    String(String),
    /// A wall-clock instant with nanosecond resolution
    Time(DateTime<Utc>),
    /// A JSON array
    Array(Vec<Value>),
    /// A JSON object, preserving insertion order
    Object(Map),
}

impl Value {
    /// Returns true if this value is null.
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Returns true if this value is a boolean.
    #[must_use]
    pub fn is_bool(&self) -> bool {
        matches!(self, Value::Bool(_))
    }

    /// Returns true if this value is any numeric type.
    #[must_use]
    pub fn is_number(&self) -> bool {
        matches!(self, Value::Int(_) | Value::Uint(_) | Value::Float(_))
    }

    /// Returns true if this value is a string.
    #[must_use]
    pub fn is_string(&self) -> bool {
        matches!(self, Value::String(_))
    }

    /// Returns true if this value is a time.
    #[must_use]
    pub fn is_time(&self) -> bool {
        matches!(self, Value::Time(_))
    }

    /// Returns true if this value is an array.
    #[must_use]
    pub fn is_array(&self) -> bool {
        matches!(self, Value::Array(_))
    }

    /// Returns true if this value is an object.
    #[must_use]
    pub fn is_object(&self) -> bool {
        matches!(self, Value::Object(_))
    }

    /// If this is a boolean, returns the value.
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// If this is an integer representable as i64, returns it.
    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            Value::Uint(n) => i64::try_from(*n).ok(),
            _ => None,
        }
    }

    /// If this is a non-negative integer, returns it as u64.
    #[must_use]
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Value::Uint(n) => Some(*n),
            Value::Int(n) => u64::try_from(*n).ok(),
            _ => None,
        }
    }

    /// If this is a number, returns it as f64.
    #[must_use]
    #[allow(clippy::cast_precision_loss)] // Intentional: int-to-float conversion may lose precision
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            Value::Int(n) => Some(*n as f64),
            Value::Uint(n) => Some(*n as f64),
            _ => None,
        }
    }

    /// If this is a string, returns a reference to it.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// If this is a time, returns it.
    #[must_use]
    pub fn as_time(&self) -> Option<DateTime<Utc>> {
        match self {
            Value::Time(t) => Some(*t),
            _ => None,
        }
    }

    /// If this is an array, returns a reference to it.
    #[must_use]
    pub fn as_array(&self) -> Option<&Vec<Value>> {
        match self {
            Value::Array(a) => Some(a),
            _ => None,
        }
    }

    /// If this is an array, returns a mutable reference to it.
    pub fn as_array_mut(&mut self) -> Option<&mut Vec<Value>> {
        match self {
            Value::Array(a) => Some(a),
            _ => None,
        }
    }

    /// If this is an object, returns a reference to it.
    #[must_use]
    pub fn as_object(&self) -> Option<&Map> {
        match self {
            Value::Object(o) => Some(o),
            _ => None,
        }
    }

    /// If this is an object, returns a mutable reference to it.
    pub fn as_object_mut(&mut self) -> Option<&mut Map> {
        match self {
            Value::Object(o) => Some(o),
            _ => None,
        }
    }

    /// Index into an array. Returns None if not an array or out of bounds.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Value> {
        self.as_array().and_then(|a| a.get(index))
    }

    /// Index into an object by key. Returns None if not an object or the
    /// key is absent.
    #[must_use]
    pub fn get_key(&self, key: &str) -> Option<&Value> {
        self.as_object().and_then(|o| o.get(key))
    }

    /// Returns a deep copy of this value.
    #[must_use]
    pub fn dup(&self) -> Value {
        self.clone()
    }

    /// Returns true for null, the empty string, an empty array, or an
    /// empty object.
    #[must_use]
    pub fn empty(&self) -> bool {
        match self {
            Value::Null => true,
            Value::String(s) => s.is_empty(),
            Value::Array(a) => a.is_empty(),
            Value::Object(o) => o.is_empty(),
            _ => false,
        }
    }

    /// Returns the simple-subset representation of this value. Every
    /// `Value` is already simple, so this is a deep copy.
    #[must_use]
    pub fn simplify(&self) -> Value {
        self.clone()
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "Null"),
            Value::Bool(b) => write!(f, "Bool({b})"),
            Value::Int(n) => write!(f, "Int({n})"),
            Value::Uint(n) => write!(f, "Uint({n})"),
            Value::Float(n) => write!(f, "Float({n})"),
            Value::String(s) => write!(f, "String({s:?})"),
            Value::Time(t) => write!(f, "Time({t})"),
            Value::Array(a) => f.debug_tuple("Array").field(a).finish(),
            Value::Object(o) => {
                write!(f, "Object(")?;
                f.debug_map().entries(o.iter()).finish()?;
                write!(f, ")")
            }
        }
    }
}

// Display renders compact JSON with default options. Errors degrade to an
// empty string, matching the soft encoding API.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut wr = crate::Writer::new(crate::Options::default());
        f.write_str(&wr.json(self))
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i8> for Value {
    fn from(n: i8) -> Self {
        Value::Int(i64::from(n))
    }
}

impl From<i16> for Value {
    fn from(n: i16) -> Self {
        Value::Int(i64::from(n))
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Int(i64::from(n))
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<u8> for Value {
    fn from(n: u8) -> Self {
        Value::Uint(u64::from(n))
    }
}

impl From<u16> for Value {
    fn from(n: u16) -> Self {
        Value::Uint(u64::from(n))
    }
}

impl From<u32> for Value {
    fn from(n: u32) -> Self {
        Value::Uint(u64::from(n))
    }
}

impl From<u64> for Value {
    fn from(n: u64) -> Self {
        Value::Uint(n)
    }
}

impl From<f32> for Value {
    fn from(n: f32) -> Self {
        Value::Float(f64::from(n))
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Float(n)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_owned())
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(t: DateTime<Utc>) -> Self {
        Value::Time(t)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        match v {
            Some(v) => v.into(),
            None => Value::Null,
        }
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Self {
        Value::Array(v.into_iter().map(Into::into).collect())
    }
}

impl From<Map> for Value {
    fn from(m: Map) -> Self {
        Value::Object(m)
    }
}

impl<T: Into<Value>> FromIterator<T> for Value {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Value::Array(iter.into_iter().map(Into::into).collect())
    }
}

// Times serialize as a newtype struct named "Time" over epoch nanoseconds
// so the crate's own serializers can recognize and rebuild them. Foreign
// formats see a plain integer.
impl serde::Serialize for Value {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_unit(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Int(n) => serializer.serialize_i64(*n),
            Value::Uint(n) => serializer.serialize_u64(*n),
            Value::Float(f) => serializer.serialize_f64(*f),
            Value::String(s) => serializer.serialize_str(s),
            Value::Time(t) => {
                let nanos = t
                    .timestamp_nanos_opt()
                    .ok_or_else(|| S::Error::custom("time out of nanosecond range"))?;
                serializer.serialize_newtype_struct(crate::TIME_TYPE, &nanos)
            }
            Value::Array(arr) => {
                use serde::ser::SerializeSeq;
                let mut seq = serializer.serialize_seq(Some(arr.len()))?;
                for item in arr {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Value::Object(map) => {
                use serde::ser::SerializeMap;
                let mut m = serializer.serialize_map(Some(map.len()))?;
                for (key, val) in map {
                    m.serialize_entry(key, val)?;
                }
                m.end()
            }
        }
    }
}

/// Macro for building [`Value`] trees from JSON-shaped literals.
///
/// # Examples
///
/// ```rust
/// use jog::jog;
///
/// let value = jog!({
///     "name": "test",
///     "values": [1, 2, 3],
///     "active": true
/// });
/// assert_eq!(value.get_key("name").and_then(|v| v.as_str()), Some("test"));
/// ```
#[macro_export]
macro_rules! jog {
    // null
    (null) => {
        $crate::Value::Null
    };

    // bool
    (true) => {
        $crate::Value::Bool(true)
    };
    (false) => {
        $crate::Value::Bool(false)
    };

    // array
    ([ $($elem:tt),* $(,)? ]) => {
        $crate::Value::Array(vec![ $( $crate::jog!($elem) ),* ])
    };

    // object
    ({ $($key:tt : $value:tt),* $(,)? }) => {
        {
            let mut map = $crate::Map::new();
            $(
                map.insert(String::from($key), $crate::jog!($value));
            )*
            $crate::Value::Object(map)
        }
    };

    // other expressions (numbers, strings, etc.)
    ($other:expr) => {
        $crate::Value::from($other)
    };
}
