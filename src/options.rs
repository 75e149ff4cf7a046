// ABOUTME: Immutable configuration record consumed by the writer and decomposer.
// ABOUTME: Constructed once with plain public fields and shared read-only.

use crate::convert::Converter;

/// Configuration for encoding and decomposition.
///
/// An `Options` value is never mutated during a call; it can be shared
/// freely across threads. Time encoding is selected by `time_format`:
/// `""` or `"nano"` emit integer nanoseconds since the Unix epoch,
/// `"second"` emits a decimal with exactly nine fractional digits, and
/// any other value is treated as a strftime layout producing a quoted
/// string.
#[derive(Clone, Debug)]
pub struct Options {
    /// Object key under which decomposed records record their type name.
    /// Empty disables type tagging.
    pub create_key: String,
    /// Tag records with their fully qualified type path instead of the
    /// short type name.
    pub full_type_path: bool,
    /// Skip object entries whose value is null.
    pub omit_nil: bool,
    /// Indentation width in spaces. Zero selects compact output.
    pub indent: usize,
    /// Indent with tabs instead of spaces.
    pub tab: bool,
    /// Emit object keys in ascending lexicographic order.
    pub sort: bool,
    /// When false, `<`, `>`, `&`, U+2028, and U+2029 are escaped so the
    /// output is safe to embed in HTML.
    pub html_unsafe: bool,
    /// Fail on values that have no JSON representation (non-finite floats,
    /// unreflectable types) instead of degrading them.
    pub strict: bool,
    /// Forbid reflective emission of record types.
    pub no_reflect: bool,
    /// Time encoding selector: `""`, `"nano"`, `"second"`, or a strftime
    /// layout.
    pub time_format: String,
    /// When non-empty, wrap each time as `{time_wrap: <encoded>}`.
    pub time_wrap: String,
    /// Wrap each time as `{create_key: "Time", "value": <encoded>}`.
    /// Overrides `time_wrap`.
    pub time_map: bool,
    /// Optional transformer applied once to the root value.
    pub converter: Option<Converter>,
    /// Initial buffer capacity in bytes.
    pub init_size: usize,
    /// Flush threshold for sink writing. Zero selects the default of 1024.
    pub write_limit: usize,
    /// Maximum recursion depth before an encode or decompose fails.
    pub max_depth: usize,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            create_key: String::new(),
            full_type_path: false,
            omit_nil: false,
            indent: 0,
            tab: false,
            sort: false,
            html_unsafe: false,
            strict: false,
            no_reflect: false,
            time_format: String::new(),
            time_wrap: String::new(),
            time_map: false,
            converter: None,
            init_size: 256,
            write_limit: 1024,
            max_depth: 1000,
        }
    }
}

impl Options {
    /// Defaults used when decomposing: null entries are dropped and record
    /// types are tagged under `"type"`.
    #[must_use]
    pub fn decompose() -> Self {
        Self {
            omit_nil: true,
            create_key: "type".to_string(),
            ..Self::default()
        }
    }

    /// True when output is indented rather than compact.
    #[inline]
    pub(crate) fn indented(&self) -> bool {
        self.tab || 0 < self.indent
    }
}
