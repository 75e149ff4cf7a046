// ABOUTME: Reconstruction of rich types from simple Values.
// ABOUTME: Factories are selected by the create-key tag or driven through serde.

use serde::de::{self, DeserializeOwned, IntoDeserializer};
use std::any::Any;
use std::collections::HashMap;

use crate::error::{Error, Result};
use crate::value::Value;

type ComposeFn = Box<dyn Fn(&Value) -> Result<Box<dyn Any>> + Send + Sync>;

/// Rebuilds rich types from decomposed values.
///
/// Factories registered under a type name are selected by the object's
/// create-key tag in [`Recomposer::recompose_any`]; typed reconstruction
/// through [`Recomposer::recompose`] drives serde's `Deserialize` from
/// the value tree directly.
pub struct Recomposer {
    create_key: String,
    composers: HashMap<String, ComposeFn>,
}

impl Recomposer {
    /// Create a recomposer that finds type tags under `create_key`.
    pub fn new(create_key: impl Into<String>) -> Self {
        Self {
            create_key: create_key.into(),
            composers: HashMap::new(),
        }
    }

    /// The key under which type tags are expected.
    #[must_use]
    pub fn create_key(&self) -> &str {
        &self.create_key
    }

    /// Register an explicit factory for the type tagged `name`.
    pub fn register<T, F>(&mut self, name: impl Into<String>, f: F)
    where
        T: Any,
        F: Fn(&Value) -> Result<T> + Send + Sync + 'static,
    {
        self.composers.insert(
            name.into(),
            Box::new(move |v| f(v).map(|t| Box::new(t) as Box<dyn Any>)),
        );
    }

    /// Register a serde-backed factory for the type tagged `name`.
    pub fn register_default<T>(&mut self, name: impl Into<String>)
    where
        T: DeserializeOwned + Any,
    {
        self.register(name, |v| recompose::<T>(v));
    }

    /// Rebuild a `T` from a simple value.
    pub fn recompose<T: DeserializeOwned>(&self, value: &Value) -> Result<T> {
        recompose(value)
    }

    /// Rebuild a value whose target type is selected by its create-key
    /// tag. Fails when the tag is missing, names an unregistered type, or
    /// the factory rejects the value.
    pub fn recompose_any(&self, value: &Value) -> Result<Box<dyn Any>> {
        let Some(tag) = value.get_key(&self.create_key) else {
            return Err(Error::recompose(format!(
                "no {:?} entry to select a type",
                self.create_key
            )));
        };
        let Some(name) = tag.as_str() else {
            return Err(Error::recompose(format!(
                "the {:?} entry must be a string",
                self.create_key
            )));
        };
        let Some(f) = self.composers.get(name) else {
            return Err(Error::recompose(format!("{name} is not a registered type")));
        };
        f(value)
    }
}

impl Default for Recomposer {
    fn default() -> Self {
        Self::new("type")
    }
}

/// Rebuild a `T` from a simple value through its `Deserialize`
/// implementation. Object entries with no matching field, such as the
/// create-key tag, are ignored.
pub fn recompose<T: DeserializeOwned>(value: &Value) -> Result<T> {
    T::deserialize(ValueDeserializer { v: value })
}

// ----------------------------------------------------------------------
// A serde Deserializer over &Value
// ----------------------------------------------------------------------

struct ValueDeserializer<'a> {
    v: &'a Value,
}

impl<'de> de::Deserializer<'de> for ValueDeserializer<'_> {
    type Error = Error;

    fn deserialize_any<V: de::Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        match self.v {
            Value::Null => visitor.visit_unit(),
            Value::Bool(b) => visitor.visit_bool(*b),
            Value::Int(n) => visitor.visit_i64(*n),
            Value::Uint(n) => visitor.visit_u64(*n),
            Value::Float(f) => visitor.visit_f64(*f),
            Value::String(s) => visitor.visit_str(s),
            Value::Time(t) => {
                let nanos = t
                    .timestamp_nanos_opt()
                    .ok_or_else(|| Error::recompose("time out of nanosecond range"))?;
                visitor.visit_i64(nanos)
            }
            Value::Array(a) => visitor.visit_seq(SeqAccess { iter: a.iter() }),
            Value::Object(o) => visitor.visit_map(MapAccess {
                iter: o.iter(),
                value: None,
            }),
        }
    }

    fn deserialize_option<V: de::Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        match self.v {
            Value::Null => visitor.visit_none(),
            _ => visitor.visit_some(self),
        }
    }

    fn deserialize_newtype_struct<V: de::Visitor<'de>>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> Result<V::Value> {
        visitor.visit_newtype_struct(self)
    }

    fn deserialize_enum<V: de::Visitor<'de>>(
        self,
        _name: &'static str,
        _variants: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value> {
        match self.v {
            Value::String(s) => visitor.visit_enum(EnumAccess {
                variant: s,
                value: None,
            }),
            Value::Object(o) if o.len() == 1 => match o.iter().next() {
                Some((variant, value)) => visitor.visit_enum(EnumAccess {
                    variant,
                    value: Some(value),
                }),
                None => Err(Error::recompose("expected a variant entry")),
            },
            _ => Err(Error::recompose("expected a variant name or single-entry object")),
        }
    }

    serde::forward_to_deserialize_any! {
        bool i8 i16 i32 i64 i128 u8 u16 u32 u64 u128 f32 f64 char str string
        bytes byte_buf unit unit_struct seq tuple tuple_struct map struct
        identifier ignored_any
    }
}

struct SeqAccess<'a> {
    iter: std::slice::Iter<'a, Value>,
}

impl<'de> de::SeqAccess<'de> for SeqAccess<'_> {
    type Error = Error;

    fn next_element_seed<T: de::DeserializeSeed<'de>>(
        &mut self,
        seed: T,
    ) -> Result<Option<T::Value>> {
        match self.iter.next() {
            Some(v) => seed.deserialize(ValueDeserializer { v }).map(Some),
            None => Ok(None),
        }
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.iter.len())
    }
}

struct MapAccess<'a> {
    iter: indexmap::map::Iter<'a, String, Value>,
    value: Option<&'a Value>,
}

impl<'de> de::MapAccess<'de> for MapAccess<'_> {
    type Error = Error;

    fn next_key_seed<K: de::DeserializeSeed<'de>>(&mut self, seed: K) -> Result<Option<K::Value>> {
        match self.iter.next() {
            Some((k, v)) => {
                self.value = Some(v);
                seed.deserialize(k.as_str().into_deserializer()).map(Some)
            }
            None => Ok(None),
        }
    }

    fn next_value_seed<V: de::DeserializeSeed<'de>>(&mut self, seed: V) -> Result<V::Value> {
        let v = self
            .value
            .take()
            .ok_or_else(|| Error::recompose("value requested before key"))?;
        seed.deserialize(ValueDeserializer { v })
    }
}

struct EnumAccess<'a> {
    variant: &'a str,
    value: Option<&'a Value>,
}

impl<'de, 'a> de::EnumAccess<'de> for EnumAccess<'a> {
    type Error = Error;
    type Variant = VariantAccess<'a>;

    fn variant_seed<V: de::DeserializeSeed<'de>>(
        self,
        seed: V,
    ) -> Result<(V::Value, Self::Variant)> {
        let variant: V::Value = seed.deserialize(de::value::StrDeserializer::<Error>::new(self.variant))?;
        Ok((variant, VariantAccess { value: self.value }))
    }
}

struct VariantAccess<'a> {
    value: Option<&'a Value>,
}

impl<'de> de::VariantAccess<'de> for VariantAccess<'_> {
    type Error = Error;

    fn unit_variant(self) -> Result<()> {
        match self.value {
            None | Some(Value::Null) => Ok(()),
            Some(_) => Err(Error::recompose("unexpected payload for unit variant")),
        }
    }

    fn newtype_variant_seed<T: de::DeserializeSeed<'de>>(self, seed: T) -> Result<T::Value> {
        match self.value {
            Some(v) => seed.deserialize(ValueDeserializer { v }),
            None => Err(Error::recompose("missing payload for newtype variant")),
        }
    }

    fn tuple_variant<V: de::Visitor<'de>>(self, _len: usize, visitor: V) -> Result<V::Value> {
        match self.value {
            Some(Value::Array(a)) => visitor.visit_seq(SeqAccess { iter: a.iter() }),
            _ => Err(Error::recompose("missing payload for tuple variant")),
        }
    }

    fn struct_variant<V: de::Visitor<'de>>(
        self,
        _fields: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value> {
        match self.value {
            Some(Value::Object(o)) => visitor.visit_map(MapAccess {
                iter: o.iter(),
                value: None,
            }),
            _ => Err(Error::recompose("missing payload for struct variant")),
        }
    }
}
