// ABOUTME: Reduction of arbitrary serde-serializable values to simple Values.
// ABOUTME: Implements the decomposer and the in-place alterer.

use serde::ser::{self, Serialize};
use std::any::Any;

use crate::error::{Error, Result};
use crate::options::Options;
use crate::simplify;
use crate::value::{Map, Value};
use crate::TIME_TYPE;

/// Reduce `value` to a deep copy made solely of simple-subset values.
///
/// `Value` inputs are copied natively. Registered [`crate::Generic`] and
/// [`crate::Simplify`] capabilities are consulted next, and everything
/// else is reduced through its `Serialize` implementation: signed
/// integers narrow to `Int`, unsigned to `Uint`, floats to `Float`,
/// sequences to `Array`, maps to `Object` with non-string keys coerced
/// to their printed form, and record types to tagged objects when
/// `create_key` is configured. The converter, when set, is applied once
/// to the root.
pub fn decompose<T>(value: &T, options: &Options) -> Result<Value>
where
    T: Serialize + 'static,
{
    let any = value as &dyn Any;
    let mut out = if let Some(v) = any.downcast_ref::<Value>() {
        dup_simple(v, options, 0)?
    } else if let Some(v) = simplify::lookup(any) {
        v
    } else {
        value.serialize(ValueSerializer { opts: options, depth: 0 })?
    };
    if let Some(c) = &options.converter {
        if let Some(replaced) = c.convert(&out)? {
            out = replaced;
        }
    }
    Ok(out)
}

/// In-place counterpart of [`decompose`]: the converter is applied to the
/// root and, when `omit_nil` is set, null-valued object entries are
/// removed, mutating containers without reallocation.
pub fn alter(value: &mut Value, options: &Options) -> Result<()> {
    if let Some(c) = &options.converter {
        if let Some(replaced) = c.convert(value)? {
            *value = replaced;
        }
    }
    alter_node(value, options, 0)
}

fn alter_node(v: &mut Value, opts: &Options, depth: usize) -> Result<()> {
    match v {
        Value::Array(a) => {
            if depth >= opts.max_depth {
                return Err(Error::DepthExceeded);
            }
            for m in a.iter_mut() {
                alter_node(m, opts, depth + 1)?;
            }
        }
        Value::Object(o) => {
            if depth >= opts.max_depth {
                return Err(Error::DepthExceeded);
            }
            if opts.omit_nil {
                o.retain(|_, m| !m.is_null());
            }
            for m in o.values_mut() {
                alter_node(m, opts, depth + 1)?;
            }
        }
        _ => {}
    }
    Ok(())
}

fn dup_simple(v: &Value, opts: &Options, depth: usize) -> Result<Value> {
    Ok(match v {
        Value::Array(a) => {
            if depth >= opts.max_depth {
                return Err(Error::DepthExceeded);
            }
            Value::Array(
                a.iter()
                    .map(|m| dup_simple(m, opts, depth + 1))
                    .collect::<Result<_>>()?,
            )
        }
        Value::Object(o) => {
            if depth >= opts.max_depth {
                return Err(Error::DepthExceeded);
            }
            let mut out = Map::with_capacity(o.len());
            for (k, m) in o {
                if opts.omit_nil && m.is_null() {
                    continue;
                }
                out.insert(k.clone(), dup_simple(m, opts, depth + 1)?);
            }
            Value::Object(out)
        }
        _ => v.clone(),
    })
}

fn type_tag(name: &'static str, opts: &Options) -> Value {
    if opts.full_type_path {
        Value::String(simplify::full_name_for(name).unwrap_or(name).to_string())
    } else {
        Value::String(name.to_string())
    }
}

// ----------------------------------------------------------------------
// The serde Serializer producing a Value
// ----------------------------------------------------------------------

#[derive(Clone, Copy)]
struct ValueSerializer<'a> {
    opts: &'a Options,
    depth: usize,
}

impl ValueSerializer<'_> {
    #[inline]
    fn open(&self) -> Result<()> {
        if self.depth >= self.opts.max_depth {
            return Err(Error::DepthExceeded);
        }
        Ok(())
    }
}

impl<'a> ser::Serializer for ValueSerializer<'a> {
    type Ok = Value;
    type Error = Error;
    type SerializeSeq = SeqCollector<'a>;
    type SerializeTuple = SeqCollector<'a>;
    type SerializeTupleStruct = SeqCollector<'a>;
    type SerializeTupleVariant = VariantSeqCollector<'a>;
    type SerializeMap = MapCollector<'a>;
    type SerializeStruct = StructCollector<'a>;
    type SerializeStructVariant = VariantStructCollector<'a>;

    fn serialize_bool(self, v: bool) -> Result<Value> {
        Ok(Value::Bool(v))
    }

    fn serialize_i8(self, v: i8) -> Result<Value> {
        Ok(Value::Int(i64::from(v)))
    }

    fn serialize_i16(self, v: i16) -> Result<Value> {
        Ok(Value::Int(i64::from(v)))
    }

    fn serialize_i32(self, v: i32) -> Result<Value> {
        Ok(Value::Int(i64::from(v)))
    }

    fn serialize_i64(self, v: i64) -> Result<Value> {
        Ok(Value::Int(v))
    }

    fn serialize_u8(self, v: u8) -> Result<Value> {
        Ok(Value::Uint(u64::from(v)))
    }

    fn serialize_u16(self, v: u16) -> Result<Value> {
        Ok(Value::Uint(u64::from(v)))
    }

    fn serialize_u32(self, v: u32) -> Result<Value> {
        Ok(Value::Uint(u64::from(v)))
    }

    fn serialize_u64(self, v: u64) -> Result<Value> {
        Ok(Value::Uint(v))
    }

    fn serialize_f32(self, v: f32) -> Result<Value> {
        Ok(Value::Float(f64::from(v)))
    }

    fn serialize_f64(self, v: f64) -> Result<Value> {
        Ok(Value::Float(v))
    }

    fn serialize_char(self, v: char) -> Result<Value> {
        Ok(Value::String(v.to_string()))
    }

    fn serialize_str(self, v: &str) -> Result<Value> {
        Ok(Value::String(v.to_owned()))
    }

    fn serialize_bytes(self, v: &[u8]) -> Result<Value> {
        Ok(Value::Array(
            v.iter().map(|&b| Value::Uint(u64::from(b))).collect(),
        ))
    }

    fn serialize_none(self) -> Result<Value> {
        Ok(Value::Null)
    }

    fn serialize_some<T: ?Sized + Serialize>(self, value: &T) -> Result<Value> {
        value.serialize(self)
    }

    fn serialize_unit(self) -> Result<Value> {
        Ok(Value::Null)
    }

    fn serialize_unit_struct(self, _name: &'static str) -> Result<Value> {
        Ok(Value::Null)
    }

    fn serialize_unit_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
    ) -> Result<Value> {
        Ok(Value::String(variant.to_owned()))
    }

    fn serialize_newtype_struct<T: ?Sized + Serialize>(
        self,
        name: &'static str,
        value: &T,
    ) -> Result<Value> {
        let inner = value.serialize(self)?;
        if name == TIME_TYPE {
            if let Some(nanos) = inner.as_i64() {
                return Ok(Value::Time(chrono::DateTime::from_timestamp_nanos(nanos)));
            }
        }
        Ok(inner)
    }

    fn serialize_newtype_variant<T: ?Sized + Serialize>(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        value: &T,
    ) -> Result<Value> {
        let inner = value.serialize(self)?;
        let mut map = Map::with_capacity(1);
        map.insert(variant.to_owned(), inner);
        Ok(Value::Object(map))
    }

    fn serialize_seq(self, len: Option<usize>) -> Result<Self::SerializeSeq> {
        self.open()?;
        Ok(SeqCollector {
            opts: self.opts,
            depth: self.depth + 1,
            vec: Vec::with_capacity(len.unwrap_or(0)),
        })
    }

    fn serialize_tuple(self, len: usize) -> Result<Self::SerializeTuple> {
        self.serialize_seq(Some(len))
    }

    fn serialize_tuple_struct(
        self,
        _name: &'static str,
        len: usize,
    ) -> Result<Self::SerializeTupleStruct> {
        self.serialize_seq(Some(len))
    }

    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        len: usize,
    ) -> Result<Self::SerializeTupleVariant> {
        Ok(VariantSeqCollector {
            variant,
            seq: self.serialize_seq(Some(len))?,
        })
    }

    fn serialize_map(self, len: Option<usize>) -> Result<Self::SerializeMap> {
        self.open()?;
        Ok(MapCollector {
            opts: self.opts,
            depth: self.depth + 1,
            map: Map::with_capacity(len.unwrap_or(0)),
            key: None,
        })
    }

    fn serialize_struct(self, name: &'static str, len: usize) -> Result<Self::SerializeStruct> {
        self.open()?;
        let mut map = Map::with_capacity(len + 1);
        if !self.opts.create_key.is_empty() {
            map.insert(self.opts.create_key.clone(), type_tag(name, self.opts));
        }
        Ok(StructCollector {
            opts: self.opts,
            depth: self.depth + 1,
            map,
        })
    }

    fn serialize_struct_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        len: usize,
    ) -> Result<Self::SerializeStructVariant> {
        self.open()?;
        Ok(VariantStructCollector {
            variant,
            inner: StructCollector {
                opts: self.opts,
                depth: self.depth + 1,
                map: Map::with_capacity(len),
            },
        })
    }
}

struct SeqCollector<'a> {
    opts: &'a Options,
    depth: usize,
    vec: Vec<Value>,
}

impl SeqCollector<'_> {
    fn push<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<()> {
        self.vec.push(value.serialize(ValueSerializer {
            opts: self.opts,
            depth: self.depth,
        })?);
        Ok(())
    }
}

impl ser::SerializeSeq for SeqCollector<'_> {
    type Ok = Value;
    type Error = Error;

    fn serialize_element<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<()> {
        self.push(value)
    }

    fn end(self) -> Result<Value> {
        Ok(Value::Array(self.vec))
    }
}

impl ser::SerializeTuple for SeqCollector<'_> {
    type Ok = Value;
    type Error = Error;

    fn serialize_element<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<()> {
        self.push(value)
    }

    fn end(self) -> Result<Value> {
        Ok(Value::Array(self.vec))
    }
}

impl ser::SerializeTupleStruct for SeqCollector<'_> {
    type Ok = Value;
    type Error = Error;

    fn serialize_field<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<()> {
        self.push(value)
    }

    fn end(self) -> Result<Value> {
        Ok(Value::Array(self.vec))
    }
}

struct VariantSeqCollector<'a> {
    variant: &'static str,
    seq: SeqCollector<'a>,
}

impl ser::SerializeTupleVariant for VariantSeqCollector<'_> {
    type Ok = Value;
    type Error = Error;

    fn serialize_field<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<()> {
        self.seq.push(value)
    }

    fn end(self) -> Result<Value> {
        let mut map = Map::with_capacity(1);
        map.insert(self.variant.to_owned(), Value::Array(self.seq.vec));
        Ok(Value::Object(map))
    }
}

struct MapCollector<'a> {
    opts: &'a Options,
    depth: usize,
    map: Map,
    key: Option<String>,
}

impl ser::SerializeMap for MapCollector<'_> {
    type Ok = Value;
    type Error = Error;

    fn serialize_key<T: ?Sized + Serialize>(&mut self, key: &T) -> Result<()> {
        self.key = Some(key.serialize(KeySerializer)?);
        Ok(())
    }

    fn serialize_value<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<()> {
        let v = value.serialize(ValueSerializer {
            opts: self.opts,
            depth: self.depth,
        })?;
        let k = self
            .key
            .take()
            .ok_or_else(|| Error::encoding("map value without a key"))?;
        if !(self.opts.omit_nil && v.is_null()) {
            self.map.insert(k, v);
        }
        Ok(())
    }

    fn end(self) -> Result<Value> {
        Ok(Value::Object(self.map))
    }
}

struct StructCollector<'a> {
    opts: &'a Options,
    depth: usize,
    map: Map,
}

impl ser::SerializeStruct for StructCollector<'_> {
    type Ok = Value;
    type Error = Error;

    fn serialize_field<T: ?Sized + Serialize>(
        &mut self,
        key: &'static str,
        value: &T,
    ) -> Result<()> {
        let v = value.serialize(ValueSerializer {
            opts: self.opts,
            depth: self.depth,
        })?;
        if !(self.opts.omit_nil && v.is_null()) {
            self.map.insert(key.to_owned(), v);
        }
        Ok(())
    }

    fn end(self) -> Result<Value> {
        Ok(Value::Object(self.map))
    }
}

struct VariantStructCollector<'a> {
    variant: &'static str,
    inner: StructCollector<'a>,
}

impl ser::SerializeStructVariant for VariantStructCollector<'_> {
    type Ok = Value;
    type Error = Error;

    fn serialize_field<T: ?Sized + Serialize>(
        &mut self,
        key: &'static str,
        value: &T,
    ) -> Result<()> {
        ser::SerializeStruct::serialize_field(&mut self.inner, key, value)
    }

    fn end(self) -> Result<Value> {
        let mut map = Map::with_capacity(1);
        map.insert(self.variant.to_owned(), Value::Object(self.inner.map));
        Ok(Value::Object(map))
    }
}

/// Coerces map keys to their natural printed form. Strings pass through;
/// integers, booleans, and characters print; anything compound fails.
struct KeySerializer;

impl ser::Serializer for KeySerializer {
    type Ok = String;
    type Error = Error;
    type SerializeSeq = ser::Impossible<String, Error>;
    type SerializeTuple = ser::Impossible<String, Error>;
    type SerializeTupleStruct = ser::Impossible<String, Error>;
    type SerializeTupleVariant = ser::Impossible<String, Error>;
    type SerializeMap = ser::Impossible<String, Error>;
    type SerializeStruct = ser::Impossible<String, Error>;
    type SerializeStructVariant = ser::Impossible<String, Error>;

    fn serialize_str(self, v: &str) -> Result<String> {
        Ok(v.to_owned())
    }

    fn serialize_bool(self, v: bool) -> Result<String> {
        Ok(v.to_string())
    }

    fn serialize_i8(self, v: i8) -> Result<String> {
        Ok(v.to_string())
    }

    fn serialize_i16(self, v: i16) -> Result<String> {
        Ok(v.to_string())
    }

    fn serialize_i32(self, v: i32) -> Result<String> {
        Ok(v.to_string())
    }

    fn serialize_i64(self, v: i64) -> Result<String> {
        Ok(v.to_string())
    }

    fn serialize_u8(self, v: u8) -> Result<String> {
        Ok(v.to_string())
    }

    fn serialize_u16(self, v: u16) -> Result<String> {
        Ok(v.to_string())
    }

    fn serialize_u32(self, v: u32) -> Result<String> {
        Ok(v.to_string())
    }

    fn serialize_u64(self, v: u64) -> Result<String> {
        Ok(v.to_string())
    }

    fn serialize_f32(self, v: f32) -> Result<String> {
        Ok(v.to_string())
    }

    fn serialize_f64(self, v: f64) -> Result<String> {
        Ok(v.to_string())
    }

    fn serialize_char(self, v: char) -> Result<String> {
        Ok(v.to_string())
    }

    fn serialize_unit_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
    ) -> Result<String> {
        Ok(variant.to_owned())
    }

    fn serialize_newtype_struct<T: ?Sized + Serialize>(
        self,
        _name: &'static str,
        value: &T,
    ) -> Result<String> {
        value.serialize(self)
    }

    fn serialize_bytes(self, _v: &[u8]) -> Result<String> {
        Err(Error::encoding("map key must be a simple type"))
    }

    fn serialize_none(self) -> Result<String> {
        Err(Error::encoding("map key must be a simple type"))
    }

    fn serialize_some<T: ?Sized + Serialize>(self, _value: &T) -> Result<String> {
        Err(Error::encoding("map key must be a simple type"))
    }

    fn serialize_unit(self) -> Result<String> {
        Err(Error::encoding("map key must be a simple type"))
    }

    fn serialize_unit_struct(self, _name: &'static str) -> Result<String> {
        Err(Error::encoding("map key must be a simple type"))
    }

    fn serialize_newtype_variant<T: ?Sized + Serialize>(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _value: &T,
    ) -> Result<String> {
        Err(Error::encoding("map key must be a simple type"))
    }

    fn serialize_seq(self, _len: Option<usize>) -> Result<Self::SerializeSeq> {
        Err(Error::encoding("map key must be a simple type"))
    }

    fn serialize_tuple(self, _len: usize) -> Result<Self::SerializeTuple> {
        Err(Error::encoding("map key must be a simple type"))
    }

    fn serialize_tuple_struct(
        self,
        _name: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeTupleStruct> {
        Err(Error::encoding("map key must be a simple type"))
    }

    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeTupleVariant> {
        Err(Error::encoding("map key must be a simple type"))
    }

    fn serialize_map(self, _len: Option<usize>) -> Result<Self::SerializeMap> {
        Err(Error::encoding("map key must be a simple type"))
    }

    fn serialize_struct(self, _name: &'static str, _len: usize) -> Result<Self::SerializeStruct> {
        Err(Error::encoding("map key must be a simple type"))
    }

    fn serialize_struct_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeStructVariant> {
        Err(Error::encoding("map key must be a simple type"))
    }
}
