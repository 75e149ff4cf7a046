// ABOUTME: Streaming JSON writer with a reused internal buffer.
// ABOUTME: Emits compact or indented JSON per Options, to memory or a byte sink.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::any::Any;
use std::io;

use crate::decompose::decompose;
use crate::error::{Error, Result};
use crate::escape::append_json_string;
use crate::options::Options;
use crate::simplify;
use crate::stream::Stream;
use crate::value::{Map, Value};

// Sliced by depth for indentation; deeper nesting clamps to the slice end.
const SPACES: &str = "\n                                                                                                                                ";
const TABS: &str = "\n\t\t\t\t\t\t\t\t\t\t\t\t\t\t\t\t\t\t\t\t\t\t\t\t\t\t\t\t\t\t";

/// A JSON writer with a reused buffer for reduced allocations across
/// repeated encoding calls.
///
/// A `Writer` is single-threaded; run one per thread for parallel
/// encoding. The internal buffer is reset to length zero between calls
/// and retains its capacity.
pub struct Writer {
    /// Encoding configuration, read-only during a call.
    pub options: Options,
    buf: Vec<u8>,
}

impl Default for Writer {
    fn default() -> Self {
        Self::new(Options::default())
    }
}

impl Writer {
    /// Create a writer with the given options.
    #[must_use]
    pub fn new(options: Options) -> Self {
        Self {
            options,
            buf: Vec::new(),
        }
    }

    /// Encode `value` as JSON. On error, an empty string is returned and
    /// the internal buffer is reset.
    pub fn json(&mut self, value: &Value) -> String {
        match self.must_json(value) {
            Ok(b) => String::from_utf8(b.to_vec()).unwrap_or_default(),
            Err(_) => String::new(),
        }
    }

    /// Encode `value` as JSON bytes, borrowing the internal buffer.
    /// Unencodable input fails with the error instead of degrading.
    pub fn must_json(&mut self, value: &Value) -> Result<&[u8]> {
        self.prepare();
        let res = self.emit_root(value, true, None, usize::MAX);
        self.finish_buffer(res)
    }

    /// Encode `value` to a byte sink, flushing the internal buffer
    /// whenever it grows past `write_limit`. Bytes delivered to the sink
    /// always form a valid prefix of the final output.
    pub fn write<W: io::Write>(&mut self, w: &mut W, value: &Value) -> Result<()> {
        self.prepare();
        let limit = self.write_limit();
        let res = self.emit_root(value, true, Some(w), limit);
        if res.is_err() {
            self.buf.clear();
        }
        res
    }

    /// Encode any serializable value as JSON. On error, an empty string
    /// is returned and the internal buffer is reset.
    pub fn json_of<T>(&mut self, value: &T) -> String
    where
        T: Serialize + 'static,
    {
        match self.must_json_of(value) {
            Ok(b) => String::from_utf8(b.to_vec()).unwrap_or_default(),
            Err(_) => String::new(),
        }
    }

    /// Encode any serializable value as JSON bytes, borrowing the internal
    /// buffer. Registered `Generic`/`Simplify` capabilities are consulted
    /// for the root before the reflective (serde) emission path.
    pub fn must_json_of<T>(&mut self, value: &T) -> Result<&[u8]>
    where
        T: Serialize + 'static,
    {
        let any = value as &dyn Any;
        if let Some(v) = any.downcast_ref::<Value>() {
            return self.must_json(v);
        }
        if let Some(v) = simplify::lookup(any) {
            return self.must_json(&v);
        }
        if self.options.sort || self.options.converter.is_some() {
            // Sorted keys and root conversion need the whole tree; reduce
            // first and emit through the Value path.
            let v = decompose(value, &self.options)?;
            self.prepare();
            let res = self.emit_root(&v, false, None, usize::MAX);
            return self.finish_buffer(res);
        }
        self.prepare();
        let res = self.stream_value(value, None, usize::MAX);
        self.finish_buffer(res)
    }

    /// Streaming counterpart of [`Writer::must_json_of`].
    pub fn write_of<W, T>(&mut self, w: &mut W, value: &T) -> Result<()>
    where
        W: io::Write,
        T: Serialize + 'static,
    {
        let any = value as &dyn Any;
        if let Some(v) = any.downcast_ref::<Value>() {
            return self.write(w, v);
        }
        if let Some(v) = simplify::lookup(any) {
            return self.write(w, &v);
        }
        if self.options.sort || self.options.converter.is_some() {
            let v = decompose(value, &self.options)?;
            self.prepare();
            let limit = self.write_limit();
            let res = self.emit_root(&v, false, Some(w), limit);
            if res.is_err() {
                self.buf.clear();
            }
            return res;
        }
        self.prepare();
        let limit = self.write_limit();
        let res = self.stream_value(value, Some(w), limit);
        if res.is_err() {
            self.buf.clear();
        }
        res
    }

    fn prepare(&mut self) {
        let init = if self.options.init_size == 0 {
            256
        } else {
            self.options.init_size
        };
        if self.buf.capacity() < init {
            self.buf = Vec::with_capacity(init);
        } else {
            self.buf.clear();
        }
    }

    fn write_limit(&self) -> usize {
        if self.options.write_limit == 0 {
            1024
        } else {
            self.options.write_limit
        }
    }

    fn finish_buffer(&mut self, res: Result<()>) -> Result<&[u8]> {
        match res {
            Ok(()) => Ok(self.buf.as_slice()),
            Err(err) => {
                self.buf.clear();
                Err(err)
            }
        }
    }

    fn emit_root<'a>(
        &'a mut self,
        value: &Value,
        apply_converter: bool,
        sink: Option<&'a mut dyn io::Write>,
        limit: usize,
    ) -> Result<()> {
        let converted;
        let v = match (apply_converter, &self.options.converter) {
            (true, Some(c)) => match c.convert(value)? {
                Some(replaced) => {
                    converted = replaced;
                    &converted
                }
                None => value,
            },
            _ => value,
        };
        let mut e = Emit {
            opts: &self.options,
            buf: &mut self.buf,
            sink,
            limit,
        };
        e.append(v, 0)?;
        e.flush_all()
    }

    fn stream_value<'a, T: Serialize>(
        &'a mut self,
        value: &T,
        sink: Option<&'a mut dyn io::Write>,
        limit: usize,
    ) -> Result<()> {
        let e = Emit {
            opts: &self.options,
            buf: &mut self.buf,
            sink,
            limit,
        };
        let mut st = Stream::new(e);
        value.serialize(&mut st)?;
        st.finish()
    }
}

// ----------------------------------------------------------------------
// Byte emission
// ----------------------------------------------------------------------

/// Borrowed emission state for one encode call: the shared options, the
/// writer's buffer, and an optional sink with its flush threshold.
pub(crate) struct Emit<'a> {
    pub(crate) opts: &'a Options,
    pub(crate) buf: &'a mut Vec<u8>,
    sink: Option<&'a mut dyn io::Write>,
    limit: usize,
}

impl Emit<'_> {
    pub(crate) fn append(&mut self, v: &Value, depth: usize) -> Result<()> {
        match v {
            Value::Null => self.buf.extend_from_slice(b"null"),
            Value::Bool(true) => self.buf.extend_from_slice(b"true"),
            Value::Bool(false) => self.buf.extend_from_slice(b"false"),
            Value::Int(n) => self.int(*n),
            Value::Uint(n) => self.uint(*n),
            Value::Float(f) => self.float(*f)?,
            Value::String(s) => self.string(s),
            Value::Time(t) => self.time(*t)?,
            Value::Array(a) => {
                if self.opts.indented() {
                    self.indent_array(a, depth)?;
                } else {
                    self.tight_array(a, depth)?;
                }
            }
            Value::Object(o) => self.object(o, depth)?,
        }
        self.check_flush()
    }

    pub(crate) fn int(&mut self, n: i64) {
        let mut b = itoa::Buffer::new();
        self.buf.extend_from_slice(b.format(n).as_bytes());
    }

    pub(crate) fn uint(&mut self, n: u64) {
        let mut b = itoa::Buffer::new();
        self.buf.extend_from_slice(b.format(n).as_bytes());
    }

    pub(crate) fn float(&mut self, f: f64) -> Result<()> {
        if f.is_finite() {
            let mut b = ryu::Buffer::new();
            self.buf.extend_from_slice(b.format_finite(f).as_bytes());
        } else if self.opts.strict {
            return Err(Error::encoding("NaN and Infinity can not be encoded as JSON"));
        } else {
            self.buf.extend_from_slice(b"null");
        }
        Ok(())
    }

    /// 32-bit floats keep their own shortest round-trip form.
    pub(crate) fn float32(&mut self, f: f32) -> Result<()> {
        if f.is_finite() {
            let mut b = ryu::Buffer::new();
            self.buf.extend_from_slice(b.format_finite(f).as_bytes());
        } else if self.opts.strict {
            return Err(Error::encoding("NaN and Infinity can not be encoded as JSON"));
        } else {
            self.buf.extend_from_slice(b"null");
        }
        Ok(())
    }

    pub(crate) fn string(&mut self, s: &str) {
        append_json_string(self.buf, s, !self.opts.html_unsafe);
    }

    /// Indent slices for a container at `depth`: `is` opens the closer
    /// line without a newline, `cs` separates elements with one.
    pub(crate) fn indents(&self, depth: usize) -> (&'static str, &'static str) {
        let d2 = depth + 1;
        if self.opts.tab {
            let x = (depth + 1).min(TABS.len());
            let is = &TABS[1..x];
            let x = (d2 + 1).min(TABS.len());
            (is, &TABS[..x])
        } else {
            let x = (depth * self.opts.indent + 1).min(SPACES.len());
            let is = &SPACES[1..x];
            let x = (d2 * self.opts.indent + 1).min(SPACES.len());
            (is, &SPACES[..x])
        }
    }

    fn check_depth(&self, depth: usize) -> Result<()> {
        if depth >= self.opts.max_depth {
            return Err(Error::DepthExceeded);
        }
        Ok(())
    }

    fn tight_array(&mut self, a: &[Value], depth: usize) -> Result<()> {
        self.check_depth(depth)?;
        if a.is_empty() {
            self.buf.extend_from_slice(b"[]");
            return Ok(());
        }
        self.buf.push(b'[');
        for (i, m) in a.iter().enumerate() {
            if 0 < i {
                self.buf.push(b',');
            }
            self.append(m, depth + 1)?;
        }
        self.buf.push(b']');
        Ok(())
    }

    fn indent_array(&mut self, a: &[Value], depth: usize) -> Result<()> {
        self.check_depth(depth)?;
        if a.is_empty() {
            self.buf.extend_from_slice(b"[]");
            return Ok(());
        }
        let (is, cs) = self.indents(depth);
        self.buf.push(b'[');
        for (i, m) in a.iter().enumerate() {
            if 0 < i {
                self.buf.push(b',');
            }
            self.buf.extend_from_slice(cs.as_bytes());
            self.append(m, depth + 1)?;
        }
        self.buf.push(b'\n');
        self.buf.extend_from_slice(is.as_bytes());
        self.buf.push(b']');
        Ok(())
    }

    fn object(&mut self, o: &Map, depth: usize) -> Result<()> {
        self.check_depth(depth)?;
        if self.opts.sort {
            let mut entries: Vec<(&String, &Value)> = o.iter().collect();
            entries.sort_unstable_by(|a, b| a.0.cmp(b.0));
            self.entries(entries.into_iter(), depth)
        } else {
            self.entries(o.iter(), depth)
        }
    }

    fn entries<'v>(
        &mut self,
        entries: impl Iterator<Item = (&'v String, &'v Value)>,
        depth: usize,
    ) -> Result<()> {
        let indented = self.opts.indented();
        let (is, cs) = if indented {
            self.indents(depth)
        } else {
            ("", "")
        };
        self.buf.push(b'{');
        let mut empty = true;
        for (k, m) in entries {
            if self.opts.omit_nil && m.is_null() {
                continue;
            }
            if !empty {
                self.buf.push(b',');
            }
            if indented {
                self.buf.extend_from_slice(cs.as_bytes());
            }
            self.string(k);
            self.buf.push(b':');
            if indented {
                self.buf.push(b' ');
            }
            self.append(m, depth + 1)?;
            empty = false;
        }
        if !empty && indented {
            self.buf.push(b'\n');
            self.buf.extend_from_slice(is.as_bytes());
        }
        self.buf.push(b'}');
        Ok(())
    }

    pub(crate) fn time(&mut self, t: DateTime<Utc>) -> Result<()> {
        let nano = t
            .timestamp_nanos_opt()
            .ok_or_else(|| Error::encoding("time out of nanosecond range"))?;
        let html_safe = !self.opts.html_unsafe;
        let wrapped = if self.opts.time_map {
            self.buf.push(b'{');
            append_json_string(self.buf, &self.opts.create_key, html_safe);
            self.buf.push(b':');
            if self.opts.full_type_path {
                self.buf.extend_from_slice(b"\"time/Time\"");
            } else {
                self.buf.extend_from_slice(b"\"Time\"");
            }
            self.buf.extend_from_slice(b",\"value\":");
            true
        } else if !self.opts.time_wrap.is_empty() {
            self.buf.push(b'{');
            append_json_string(self.buf, &self.opts.time_wrap, html_safe);
            self.buf.push(b':');
            true
        } else {
            false
        };
        match self.opts.time_format.as_str() {
            "" | "nano" => self.int(nano),
            "second" => self.second_decimal(nano),
            layout => {
                use std::fmt::Write as _;
                let mut s = String::new();
                write!(&mut s, "{}", t.format(layout))
                    .map_err(|_| Error::encoding("invalid time layout"))?;
                append_json_string(self.buf, &s, html_safe);
            }
        }
        if wrapped {
            self.buf.push(b'}');
        }
        Ok(())
    }

    // Decimal seconds with exactly nine fractional digits. Float
    // conversion would lose precision, so the two parts are formatted
    // separately in integer arithmetic.
    fn second_decimal(&mut self, nano: i64) {
        let secs = nano / 1_000_000_000;
        let frac = (nano % 1_000_000_000).unsigned_abs();
        if nano < 0 && secs == 0 {
            self.buf.push(b'-');
        }
        self.int(secs);
        self.buf.push(b'.');
        let mut b = itoa::Buffer::new();
        let digits = b.format(frac);
        for _ in digits.len()..9 {
            self.buf.push(b'0');
        }
        self.buf.extend_from_slice(digits.as_bytes());
    }

    pub(crate) fn check_flush(&mut self) -> Result<()> {
        if let Some(w) = self.sink.as_mut() {
            if self.limit < self.buf.len() {
                w.write_all(self.buf).map_err(Error::from)?;
                self.buf.clear();
            }
        }
        Ok(())
    }

    pub(crate) fn flush_all(&mut self) -> Result<()> {
        if let Some(w) = self.sink.as_mut() {
            if !self.buf.is_empty() {
                w.write_all(self.buf).map_err(Error::from)?;
                self.buf.clear();
            }
        }
        Ok(())
    }
}
