// ABOUTME: Process-wide cache of precomputed object-key prefix bytes.
// ABOUTME: Keyed by the identity of serde's static field names, four variants per key.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::OnceLock;

use crate::escape::append_json_string;

/// Quoted, escaped key plus separator for each `(escape, indented)`
/// combination: `"key":` for compact output, `"key": ` for indented.
struct KeyPrefix {
    variants: [Box<[u8]>; 4],
}

#[inline]
fn variant_index(html_safe: bool, indented: bool) -> usize {
    ((html_safe as usize) << 1) | indented as usize
}

fn build(name: &str) -> KeyPrefix {
    let mut variants: [Box<[u8]>; 4] = Default::default();
    for html_safe in [false, true] {
        for indented in [false, true] {
            let mut buf = Vec::with_capacity(name.len() + 4);
            append_json_string(&mut buf, name, html_safe);
            buf.push(b':');
            if indented {
                buf.push(b' ');
            }
            variants[variant_index(html_safe, indented)] = buf.into_boxed_slice();
        }
    }
    KeyPrefix { variants }
}

// Field names coming from serde derives are 'static, so pointer identity
// is a valid cache key. Entries are interned for the process lifetime;
// a racing duplicate insert leaks one prefix, which is tolerable.
static CACHE: OnceLock<RwLock<HashMap<(usize, usize), &'static KeyPrefix>>> = OnceLock::new();

/// Look up (or compute) the serialized prefix for a struct field name.
pub(crate) fn key_prefix(name: &'static str, html_safe: bool, indented: bool) -> &'static [u8] {
    let key = (name.as_ptr() as usize, name.len());
    let idx = variant_index(html_safe, indented);
    let cache = CACHE.get_or_init(|| RwLock::new(HashMap::new()));
    if let Some(p) = cache.read().get(&key).copied() {
        return &p.variants[idx];
    }
    let built: &'static KeyPrefix = Box::leak(Box::new(build(name)));
    let mut map = cache.write();
    let p: &'static KeyPrefix = *map.entry(key).or_insert(built);
    &p.variants[idx]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefix_variants() {
        assert_eq!(key_prefix("name", false, false), b"\"name\":");
        assert_eq!(key_prefix("name", false, true), b"\"name\": ");
        assert_eq!(key_prefix("a<b", true, false), b"\"a\\u003cb\":");
        assert_eq!(key_prefix("a<b", false, false), b"\"a<b\":");
    }

    #[test]
    fn test_prefix_interned() {
        let a = key_prefix("interned", true, true);
        let b = key_prefix("interned", true, true);
        assert_eq!(a.as_ptr(), b.as_ptr());
    }
}
