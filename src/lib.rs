// ABOUTME: JSON encoding and object-graph conversion core.
// ABOUTME: Streaming writer, decomposer/alterer, tree builder, and recomposer.

//! # jog
//!
//! A JSON encoding and object-graph conversion core. It converts
//! in-memory values into a canonical JSON byte stream and converts
//! between a simple JSON-shaped representation and richer domain types.
//!
//! ## Quick Start
//!
//! ```rust
//! use jog::{jog, Options, Writer};
//!
//! let mut wr = Writer::new(Options::default());
//! let value = jog!({"b": 2, "a": 1});
//! assert_eq!(wr.json(&value), r#"{"b":2,"a":1}"#);
//!
//! wr.options.sort = true;
//! assert_eq!(wr.json(&value), r#"{"a":1,"b":2}"#);
//! ```
//!
//! ## Encoding Rust types
//!
//! Anything implementing `serde::Serialize` can be encoded directly or
//! reduced to a [`Value`] tree, optionally tagged with its type name for
//! later reconstruction:
//!
//! ```rust
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Serialize, Deserialize, Debug, PartialEq)]
//! struct Person {
//!     name: String,
//!     age: u32,
//! }
//!
//! let bob = Person { name: "Bob".to_string(), age: 30 };
//! assert_eq!(jog::to_string(&bob).unwrap(), r#"{"name":"Bob","age":30}"#);
//!
//! let opts = jog::Options::decompose();
//! let v = jog::decompose(&bob, &opts).unwrap();
//! assert_eq!(v.get_key("type").and_then(|t| t.as_str()), Some("Person"));
//!
//! let back: Person = jog::recompose(&v).unwrap();
//! assert_eq!(back, bob);
//! ```
//!
//! ## Building trees
//!
//! ```rust
//! use jog::{Builder, Value};
//!
//! let mut b = Builder::default();
//! b.object(None).unwrap();
//! b.array(Some("nums")).unwrap();
//! b.value(Value::Int(1), None).unwrap();
//! b.value(Value::Int(2), None).unwrap();
//! b.pop_all();
//! assert_eq!(b.result().to_string(), r#"{"nums":[1,2]}"#);
//! ```

pub mod builder;
pub mod convert;
pub mod decompose;
pub mod error;
pub mod options;
pub mod recompose;
pub mod simplify;
pub mod value;
pub mod writer;

mod escape;
mod fields;
mod stream;

// Re-export commonly used items at the crate root
pub use builder::Builder;
pub use convert::Converter;
pub use decompose::{alter, decompose};
pub use error::{Error, Result};
pub use options::Options;
pub use recompose::{recompose, Recomposer};
pub use simplify::{register_generic, register_record, register_simplify, Generic, Simplify};
pub use value::{Map, Value};
pub use writer::Writer;

// The jog! macro is automatically exported at the crate root via #[macro_export]

use serde::Serialize;
use std::io;

/// Name of the newtype the crate's serializers use to tag times.
pub(crate) const TIME_TYPE: &str = "Time";

/// Encode a value as a JSON string with default options. On error an
/// empty string is returned.
///
/// # Example
///
/// ```rust
/// use jog::{jog, json};
///
/// assert_eq!(json(&jog!([1, null, "x"])), r#"[1,null,"x"]"#);
/// ```
pub fn json(value: &Value) -> String {
    Writer::default().json(value)
}

/// Encode any serializable value as a JSON string.
pub fn to_string<T>(value: &T) -> Result<String>
where
    T: Serialize + 'static,
{
    let mut wr = Writer::default();
    let bytes = wr.must_json_of(value)?;
    Ok(String::from_utf8(bytes.to_vec()).unwrap_or_default())
}

/// Encode any serializable value as a JSON byte vector.
pub fn to_vec<T>(value: &T) -> Result<Vec<u8>>
where
    T: Serialize + 'static,
{
    let mut wr = Writer::default();
    let bytes = wr.must_json_of(value)?;
    Ok(bytes.to_vec())
}

/// Encode any serializable value to a byte sink.
pub fn to_writer<W, T>(writer: &mut W, value: &T) -> Result<()>
where
    W: io::Write,
    T: Serialize + 'static,
{
    Writer::default().write_of(writer, value)
}

#[cfg(test)]
mod builder_tests;
#[cfg(test)]
mod decompose_tests;
#[cfg(test)]
mod lib_tests;
#[cfg(test)]
mod value_tests;
