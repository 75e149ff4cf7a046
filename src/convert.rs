// ABOUTME: Root-value converters applied before encoding or decomposition.
// ABOUTME: Ships RFC 3339, nanosecond, and Mongo $date built-ins.

use chrono::{DateTime, Utc};
use std::fmt;

use crate::error::{Error, Result};
use crate::value::Value;

/// A transformer applied once to the root value of an encode, decompose,
/// or alter call.
///
/// The hook returns `Ok(Some(_))` with a replacement value, `Ok(None)`
/// when the input is not its shape (leaving the root untouched), or an
/// error that aborts the call as [`Error::Converter`].
#[derive(Clone, Copy)]
pub struct Converter {
    name: &'static str,
    f: fn(&Value) -> Result<Option<Value>>,
}

impl Converter {
    /// Create a converter from a named hook function.
    #[must_use]
    pub const fn new(name: &'static str, f: fn(&Value) -> Result<Option<Value>>) -> Self {
        Self { name, f }
    }

    /// The converter's name, used in error messages.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Apply the hook to a root value.
    pub fn convert(&self, v: &Value) -> Result<Option<Value>> {
        (self.f)(v)
    }

    /// Strings parsing as RFC 3339 instants become times.
    #[must_use]
    pub fn rfc3339() -> Self {
        Self::new("rfc3339", conv_rfc3339)
    }

    /// Integers become times, interpreted as nanoseconds since the epoch.
    #[must_use]
    pub fn nano() -> Self {
        Self::new("nano", conv_nano)
    }

    /// Objects shaped `{"$date": <rfc3339>}` or `{"$date": <millis>}`
    /// become times.
    #[must_use]
    pub fn mongo() -> Self {
        Self::new("mongo", conv_mongo)
    }
}

impl fmt::Debug for Converter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Converter({})", self.name)
    }
}

fn parse_rfc3339(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|t| t.with_timezone(&Utc))
}

fn conv_rfc3339(v: &Value) -> Result<Option<Value>> {
    if let Value::String(s) = v {
        if let Some(t) = parse_rfc3339(s) {
            return Ok(Some(Value::Time(t)));
        }
    }
    Ok(None)
}

fn conv_nano(v: &Value) -> Result<Option<Value>> {
    match v {
        Value::Int(n) => Ok(Some(Value::Time(DateTime::from_timestamp_nanos(*n)))),
        Value::Uint(n) => {
            let n = i64::try_from(*n)
                .map_err(|_| Error::converter("nano: integer out of time range"))?;
            Ok(Some(Value::Time(DateTime::from_timestamp_nanos(n))))
        }
        _ => Ok(None),
    }
}

fn conv_mongo(v: &Value) -> Result<Option<Value>> {
    let Value::Object(m) = v else {
        return Ok(None);
    };
    let Some(date) = m.get("$date") else {
        return Ok(None);
    };
    // The key marks intent, so a malformed payload is an error rather
    // than a pass-through.
    let t = match date {
        Value::String(s) => {
            parse_rfc3339(s).ok_or_else(|| Error::converter("mongo: invalid $date string"))?
        }
        Value::Int(ms) => DateTime::from_timestamp_millis(*ms)
            .ok_or_else(|| Error::converter("mongo: $date out of range"))?,
        Value::Uint(ms) => i64::try_from(*ms)
            .ok()
            .and_then(DateTime::from_timestamp_millis)
            .ok_or_else(|| Error::converter("mongo: $date out of range"))?,
        _ => return Err(Error::converter("mongo: unsupported $date payload")),
    };
    Ok(Some(Value::Time(t)))
}
