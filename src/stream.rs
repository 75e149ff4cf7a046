// ABOUTME: Direct serde-to-bytes streaming, the writer's reflective emission path.
// ABOUTME: Tracks container frames for separators, indentation, and null rollback.

use serde::ser::{self, Serialize};

use crate::error::{Error, Result};
use crate::fields::key_prefix;
use crate::simplify;
use crate::writer::Emit;
use crate::TIME_TYPE;

/// One open container: separator state, indent slices, and the pending
/// map-entry rollback point used by `omit_nil`.
struct Frame {
    first: bool,
    is: &'static str,
    cs: &'static str,
    mark: usize,
    saved_first: bool,
    flushes_at: usize,
    skip: bool,
}

/// Serializes any `Serialize` value straight into the writer's buffer.
pub(crate) struct Stream<'a> {
    e: Emit<'a>,
    frames: Vec<Frame>,
    flushes: usize,
}

impl<'a> Stream<'a> {
    pub(crate) fn new(e: Emit<'a>) -> Self {
        Self {
            e,
            frames: Vec::new(),
            flushes: 0,
        }
    }

    pub(crate) fn finish(&mut self) -> Result<()> {
        self.e.flush_all()
    }

    // Flush through the emitter, counting buffer resets so entry
    // rollbacks can tell whether their mark is still valid.
    fn flush_point(&mut self) -> Result<()> {
        let before = self.e.buf.len();
        self.e.check_flush()?;
        if self.e.buf.len() < before {
            self.flushes += 1;
        }
        Ok(())
    }

    fn open(&mut self, c: u8) -> Result<()> {
        let depth = self.frames.len();
        if depth >= self.e.opts.max_depth {
            return Err(Error::DepthExceeded);
        }
        let (is, cs) = if self.e.opts.indented() {
            self.e.indents(depth)
        } else {
            ("", "")
        };
        self.e.buf.push(c);
        self.frames.push(Frame {
            first: true,
            is,
            cs,
            mark: 0,
            saved_first: true,
            flushes_at: 0,
            skip: false,
        });
        Ok(())
    }

    fn close(&mut self, c: u8) -> Result<()> {
        if let Some(f) = self.frames.pop() {
            if f.skip {
                return self.flush_point();
            }
            if self.e.opts.indented() && !f.first {
                self.e.buf.push(b'\n');
                self.e.buf.extend_from_slice(f.is.as_bytes());
            }
        }
        self.e.buf.push(c);
        self.flush_point()
    }

    fn element_sep(&mut self) {
        let indented = self.e.opts.indented();
        if let Some(f) = self.frames.last_mut() {
            if !f.first {
                self.e.buf.push(b',');
            }
            f.first = false;
            if indented {
                self.e.buf.extend_from_slice(f.cs.as_bytes());
            }
        }
    }

    fn in_skip_frame(&self) -> bool {
        self.frames.last().is_some_and(|f| f.skip)
    }

    fn first_in_frame(&self) -> bool {
        self.frames.last().is_none_or(|f| f.first)
    }

    fn restore_first(&mut self, first: bool) {
        if let Some(f) = self.frames.last_mut() {
            f.first = first;
        }
    }

    // True when the bytes appended since `vstart` are exactly `null` and
    // no flush invalidated the window.
    fn wrote_null(&self, vstart: usize, flushes_at: usize) -> bool {
        self.flushes == flushes_at
            && self.e.buf.len() == vstart + 4
            && &self.e.buf[vstart..] == b"null"
    }

    fn type_tag(&self, name: &'static str) -> &'static str {
        if self.e.opts.full_type_path {
            simplify::full_name_for(name).unwrap_or(name)
        } else {
            name
        }
    }
}

impl<'a, 'b> ser::Serializer for &'b mut Stream<'a> {
    type Ok = ();
    type Error = Error;
    type SerializeSeq = Self;
    type SerializeTuple = Self;
    type SerializeTupleStruct = Self;
    type SerializeTupleVariant = Self;
    type SerializeMap = Self;
    type SerializeStruct = Self;
    type SerializeStructVariant = Self;

    fn serialize_bool(self, v: bool) -> Result<()> {
        self.e.buf.extend_from_slice(if v { b"true" } else { b"false" });
        Ok(())
    }

    fn serialize_i8(self, v: i8) -> Result<()> {
        self.e.int(i64::from(v));
        Ok(())
    }

    fn serialize_i16(self, v: i16) -> Result<()> {
        self.e.int(i64::from(v));
        Ok(())
    }

    fn serialize_i32(self, v: i32) -> Result<()> {
        self.e.int(i64::from(v));
        Ok(())
    }

    fn serialize_i64(self, v: i64) -> Result<()> {
        self.e.int(v);
        Ok(())
    }

    fn serialize_u8(self, v: u8) -> Result<()> {
        self.e.uint(u64::from(v));
        Ok(())
    }

    fn serialize_u16(self, v: u16) -> Result<()> {
        self.e.uint(u64::from(v));
        Ok(())
    }

    fn serialize_u32(self, v: u32) -> Result<()> {
        self.e.uint(u64::from(v));
        Ok(())
    }

    fn serialize_u64(self, v: u64) -> Result<()> {
        self.e.uint(v);
        Ok(())
    }

    fn serialize_f32(self, v: f32) -> Result<()> {
        self.e.float32(v)
    }

    fn serialize_f64(self, v: f64) -> Result<()> {
        self.e.float(v)
    }

    fn serialize_char(self, v: char) -> Result<()> {
        let mut buf = [0u8; 4];
        self.e.string(v.encode_utf8(&mut buf));
        Ok(())
    }

    fn serialize_str(self, v: &str) -> Result<()> {
        self.e.string(v);
        Ok(())
    }

    fn serialize_bytes(self, v: &[u8]) -> Result<()> {
        self.open(b'[')?;
        for &b in v {
            self.element_sep();
            self.e.uint(u64::from(b));
        }
        self.close(b']')
    }

    fn serialize_none(self) -> Result<()> {
        self.e.buf.extend_from_slice(b"null");
        Ok(())
    }

    fn serialize_some<T: ?Sized + Serialize>(self, value: &T) -> Result<()> {
        value.serialize(self)
    }

    fn serialize_unit(self) -> Result<()> {
        self.e.buf.extend_from_slice(b"null");
        Ok(())
    }

    fn serialize_unit_struct(self, _name: &'static str) -> Result<()> {
        self.e.buf.extend_from_slice(b"null");
        Ok(())
    }

    fn serialize_unit_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
    ) -> Result<()> {
        self.e.string(variant);
        Ok(())
    }

    fn serialize_newtype_struct<T: ?Sized + Serialize>(
        self,
        name: &'static str,
        value: &T,
    ) -> Result<()> {
        if name == TIME_TYPE {
            let nano = value.serialize(NanoCapture)?;
            return self.e.time(chrono::DateTime::from_timestamp_nanos(nano));
        }
        value.serialize(self)
    }

    fn serialize_newtype_variant<T: ?Sized + Serialize>(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        value: &T,
    ) -> Result<()> {
        self.open(b'{')?;
        self.element_sep();
        let prefix = key_prefix(variant, !self.e.opts.html_unsafe, self.e.opts.indented());
        self.e.buf.extend_from_slice(prefix);
        value.serialize(&mut *self)?;
        self.close(b'}')
    }

    fn serialize_seq(self, _len: Option<usize>) -> Result<Self::SerializeSeq> {
        self.open(b'[')?;
        Ok(self)
    }

    fn serialize_tuple(self, _len: usize) -> Result<Self::SerializeTuple> {
        self.open(b'[')?;
        Ok(self)
    }

    fn serialize_tuple_struct(
        self,
        _name: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeTupleStruct> {
        self.open(b'[')?;
        Ok(self)
    }

    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeTupleVariant> {
        self.open(b'{')?;
        self.element_sep();
        let prefix = key_prefix(variant, !self.e.opts.html_unsafe, self.e.opts.indented());
        self.e.buf.extend_from_slice(prefix);
        self.open(b'[')?;
        Ok(self)
    }

    fn serialize_map(self, _len: Option<usize>) -> Result<Self::SerializeMap> {
        self.open(b'{')?;
        Ok(self)
    }

    fn serialize_struct(self, name: &'static str, _len: usize) -> Result<Self::SerializeStruct> {
        if self.e.opts.no_reflect {
            if self.e.opts.strict {
                return Err(Error::Encoding(format!(
                    "{name} can not be encoded as a JSON element"
                )));
            }
            // Lenient fallback: the record degrades to its type name and
            // its fields are swallowed by a skip frame.
            self.e.string(name);
            self.frames.push(Frame {
                first: true,
                is: "",
                cs: "",
                mark: 0,
                saved_first: true,
                flushes_at: 0,
                skip: true,
            });
            return Ok(self);
        }
        self.open(b'{')?;
        if !self.e.opts.create_key.is_empty() {
            self.element_sep();
            let indented = self.e.opts.indented();
            crate::escape::append_json_string(
                self.e.buf,
                &self.e.opts.create_key,
                !self.e.opts.html_unsafe,
            );
            self.e.buf.push(b':');
            if indented {
                self.e.buf.push(b' ');
            }
            let tag = self.type_tag(name);
            self.e.string(tag);
        }
        Ok(self)
    }

    fn serialize_struct_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeStructVariant> {
        self.open(b'{')?;
        self.element_sep();
        let prefix = key_prefix(variant, !self.e.opts.html_unsafe, self.e.opts.indented());
        self.e.buf.extend_from_slice(prefix);
        self.open(b'{')?;
        Ok(self)
    }
}

impl ser::SerializeSeq for &mut Stream<'_> {
    type Ok = ();
    type Error = Error;

    fn serialize_element<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<()> {
        self.element_sep();
        value.serialize(&mut **self)?;
        self.flush_point()
    }

    fn end(self) -> Result<()> {
        self.close(b']')
    }
}

impl ser::SerializeTuple for &mut Stream<'_> {
    type Ok = ();
    type Error = Error;

    fn serialize_element<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<()> {
        ser::SerializeSeq::serialize_element(self, value)
    }

    fn end(self) -> Result<()> {
        self.close(b']')
    }
}

impl ser::SerializeTupleStruct for &mut Stream<'_> {
    type Ok = ();
    type Error = Error;

    fn serialize_field<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<()> {
        ser::SerializeSeq::serialize_element(self, value)
    }

    fn end(self) -> Result<()> {
        self.close(b']')
    }
}

impl ser::SerializeTupleVariant for &mut Stream<'_> {
    type Ok = ();
    type Error = Error;

    fn serialize_field<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<()> {
        ser::SerializeSeq::serialize_element(self, value)
    }

    fn end(self) -> Result<()> {
        self.close(b']')?;
        self.close(b'}')
    }
}

impl ser::SerializeMap for &mut Stream<'_> {
    type Ok = ();
    type Error = Error;

    fn serialize_key<T: ?Sized + Serialize>(&mut self, key: &T) -> Result<()> {
        let mark = self.e.buf.len();
        let was_first = self.first_in_frame();
        let flushes = self.flushes;
        self.element_sep();
        key.serialize(KeyQuote { st: &mut **self })?;
        self.e.buf.push(b':');
        if self.e.opts.indented() {
            self.e.buf.push(b' ');
        }
        if let Some(f) = self.frames.last_mut() {
            f.mark = mark;
            f.saved_first = was_first;
            f.flushes_at = flushes;
        }
        Ok(())
    }

    fn serialize_value<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<()> {
        let vstart = self.e.buf.len();
        value.serialize(&mut **self)?;
        let (mark, saved_first, flushes_at) = match self.frames.last() {
            Some(f) => (f.mark, f.saved_first, f.flushes_at),
            None => return self.flush_point(),
        };
        if self.e.opts.omit_nil && self.wrote_null(vstart, flushes_at) {
            self.e.buf.truncate(mark);
            self.restore_first(saved_first);
            return Ok(());
        }
        self.flush_point()
    }

    fn end(self) -> Result<()> {
        self.close(b'}')
    }
}

impl ser::SerializeStruct for &mut Stream<'_> {
    type Ok = ();
    type Error = Error;

    fn serialize_field<T: ?Sized + Serialize>(
        &mut self,
        key: &'static str,
        value: &T,
    ) -> Result<()> {
        if self.in_skip_frame() {
            return Ok(());
        }
        let mark = self.e.buf.len();
        let was_first = self.first_in_frame();
        let flushes = self.flushes;
        self.element_sep();
        let prefix = key_prefix(key, !self.e.opts.html_unsafe, self.e.opts.indented());
        self.e.buf.extend_from_slice(prefix);
        let vstart = self.e.buf.len();
        value.serialize(&mut **self)?;
        if self.e.opts.omit_nil && self.wrote_null(vstart, flushes) {
            self.e.buf.truncate(mark);
            self.restore_first(was_first);
            return Ok(());
        }
        self.flush_point()
    }

    fn end(self) -> Result<()> {
        self.close(b'}')
    }
}

impl ser::SerializeStructVariant for &mut Stream<'_> {
    type Ok = ();
    type Error = Error;

    fn serialize_field<T: ?Sized + Serialize>(
        &mut self,
        key: &'static str,
        value: &T,
    ) -> Result<()> {
        ser::SerializeStruct::serialize_field(self, key, value)
    }

    fn end(self) -> Result<()> {
        self.close(b'}')?;
        self.close(b'}')
    }
}

/// Extracts the epoch-nanosecond payload of the `Time` newtype.
struct NanoCapture;

impl ser::Serializer for NanoCapture {
    type Ok = i64;
    type Error = Error;
    type SerializeSeq = ser::Impossible<i64, Error>;
    type SerializeTuple = ser::Impossible<i64, Error>;
    type SerializeTupleStruct = ser::Impossible<i64, Error>;
    type SerializeTupleVariant = ser::Impossible<i64, Error>;
    type SerializeMap = ser::Impossible<i64, Error>;
    type SerializeStruct = ser::Impossible<i64, Error>;
    type SerializeStructVariant = ser::Impossible<i64, Error>;

    fn serialize_i8(self, v: i8) -> Result<i64> {
        Ok(i64::from(v))
    }

    fn serialize_i16(self, v: i16) -> Result<i64> {
        Ok(i64::from(v))
    }

    fn serialize_i32(self, v: i32) -> Result<i64> {
        Ok(i64::from(v))
    }

    fn serialize_i64(self, v: i64) -> Result<i64> {
        Ok(v)
    }

    fn serialize_u8(self, v: u8) -> Result<i64> {
        Ok(i64::from(v))
    }

    fn serialize_u16(self, v: u16) -> Result<i64> {
        Ok(i64::from(v))
    }

    fn serialize_u32(self, v: u32) -> Result<i64> {
        Ok(i64::from(v))
    }

    fn serialize_u64(self, v: u64) -> Result<i64> {
        i64::try_from(v).map_err(|_| Error::encoding("time out of nanosecond range"))
    }

    fn serialize_bool(self, _v: bool) -> Result<i64> {
        Err(Error::encoding("invalid time payload"))
    }

    fn serialize_f32(self, _v: f32) -> Result<i64> {
        Err(Error::encoding("invalid time payload"))
    }

    fn serialize_f64(self, _v: f64) -> Result<i64> {
        Err(Error::encoding("invalid time payload"))
    }

    fn serialize_char(self, _v: char) -> Result<i64> {
        Err(Error::encoding("invalid time payload"))
    }

    fn serialize_str(self, _v: &str) -> Result<i64> {
        Err(Error::encoding("invalid time payload"))
    }

    fn serialize_bytes(self, _v: &[u8]) -> Result<i64> {
        Err(Error::encoding("invalid time payload"))
    }

    fn serialize_none(self) -> Result<i64> {
        Err(Error::encoding("invalid time payload"))
    }

    fn serialize_some<T: ?Sized + Serialize>(self, value: &T) -> Result<i64> {
        value.serialize(self)
    }

    fn serialize_unit(self) -> Result<i64> {
        Err(Error::encoding("invalid time payload"))
    }

    fn serialize_unit_struct(self, _name: &'static str) -> Result<i64> {
        Err(Error::encoding("invalid time payload"))
    }

    fn serialize_unit_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
    ) -> Result<i64> {
        Err(Error::encoding("invalid time payload"))
    }

    fn serialize_newtype_struct<T: ?Sized + Serialize>(
        self,
        _name: &'static str,
        value: &T,
    ) -> Result<i64> {
        value.serialize(self)
    }

    fn serialize_newtype_variant<T: ?Sized + Serialize>(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _value: &T,
    ) -> Result<i64> {
        Err(Error::encoding("invalid time payload"))
    }

    fn serialize_seq(self, _len: Option<usize>) -> Result<Self::SerializeSeq> {
        Err(Error::encoding("invalid time payload"))
    }

    fn serialize_tuple(self, _len: usize) -> Result<Self::SerializeTuple> {
        Err(Error::encoding("invalid time payload"))
    }

    fn serialize_tuple_struct(
        self,
        _name: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeTupleStruct> {
        Err(Error::encoding("invalid time payload"))
    }

    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeTupleVariant> {
        Err(Error::encoding("invalid time payload"))
    }

    fn serialize_map(self, _len: Option<usize>) -> Result<Self::SerializeMap> {
        Err(Error::encoding("invalid time payload"))
    }

    fn serialize_struct(self, _name: &'static str, _len: usize) -> Result<Self::SerializeStruct> {
        Err(Error::encoding("invalid time payload"))
    }

    fn serialize_struct_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeStructVariant> {
        Err(Error::encoding("invalid time payload"))
    }
}

/// Writes map keys as quoted JSON strings, coercing simple non-string
/// keys to their printed form.
struct KeyQuote<'s, 'a> {
    st: &'s mut Stream<'a>,
}

impl KeyQuote<'_, '_> {
    fn quoted_int(self, n: i64) -> Result<()> {
        self.st.e.buf.push(b'"');
        self.st.e.int(n);
        self.st.e.buf.push(b'"');
        Ok(())
    }

    fn quoted_uint(self, n: u64) -> Result<()> {
        self.st.e.buf.push(b'"');
        self.st.e.uint(n);
        self.st.e.buf.push(b'"');
        Ok(())
    }
}

impl ser::Serializer for KeyQuote<'_, '_> {
    type Ok = ();
    type Error = Error;
    type SerializeSeq = ser::Impossible<(), Error>;
    type SerializeTuple = ser::Impossible<(), Error>;
    type SerializeTupleStruct = ser::Impossible<(), Error>;
    type SerializeTupleVariant = ser::Impossible<(), Error>;
    type SerializeMap = ser::Impossible<(), Error>;
    type SerializeStruct = ser::Impossible<(), Error>;
    type SerializeStructVariant = ser::Impossible<(), Error>;

    fn serialize_str(self, v: &str) -> Result<()> {
        self.st.e.string(v);
        Ok(())
    }

    fn serialize_bool(self, v: bool) -> Result<()> {
        self.st
            .e
            .buf
            .extend_from_slice(if v { b"\"true\"" } else { b"\"false\"" });
        Ok(())
    }

    fn serialize_i8(self, v: i8) -> Result<()> {
        self.quoted_int(i64::from(v))
    }

    fn serialize_i16(self, v: i16) -> Result<()> {
        self.quoted_int(i64::from(v))
    }

    fn serialize_i32(self, v: i32) -> Result<()> {
        self.quoted_int(i64::from(v))
    }

    fn serialize_i64(self, v: i64) -> Result<()> {
        self.quoted_int(v)
    }

    fn serialize_u8(self, v: u8) -> Result<()> {
        self.quoted_uint(u64::from(v))
    }

    fn serialize_u16(self, v: u16) -> Result<()> {
        self.quoted_uint(u64::from(v))
    }

    fn serialize_u32(self, v: u32) -> Result<()> {
        self.quoted_uint(u64::from(v))
    }

    fn serialize_u64(self, v: u64) -> Result<()> {
        self.quoted_uint(v)
    }

    fn serialize_f32(self, v: f32) -> Result<()> {
        self.serialize_str(&v.to_string())
    }

    fn serialize_f64(self, v: f64) -> Result<()> {
        self.serialize_str(&v.to_string())
    }

    fn serialize_char(self, v: char) -> Result<()> {
        let mut buf = [0u8; 4];
        self.serialize_str(v.encode_utf8(&mut buf))
    }

    fn serialize_unit_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
    ) -> Result<()> {
        self.serialize_str(variant)
    }

    fn serialize_newtype_struct<T: ?Sized + Serialize>(
        self,
        _name: &'static str,
        value: &T,
    ) -> Result<()> {
        value.serialize(self)
    }

    fn serialize_bytes(self, _v: &[u8]) -> Result<()> {
        Err(Error::encoding("map key must be a simple type"))
    }

    fn serialize_none(self) -> Result<()> {
        Err(Error::encoding("map key must be a simple type"))
    }

    fn serialize_some<T: ?Sized + Serialize>(self, _value: &T) -> Result<()> {
        Err(Error::encoding("map key must be a simple type"))
    }

    fn serialize_unit(self) -> Result<()> {
        Err(Error::encoding("map key must be a simple type"))
    }

    fn serialize_unit_struct(self, _name: &'static str) -> Result<()> {
        Err(Error::encoding("map key must be a simple type"))
    }

    fn serialize_newtype_variant<T: ?Sized + Serialize>(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _value: &T,
    ) -> Result<()> {
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
