// ABOUTME: Per-type simplification capabilities and their process-wide registry.
// ABOUTME: Hooks are keyed by TypeId and consulted before reflective fallback.

use parking_lot::RwLock;
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::OnceLock;

use crate::value::Value;

/// A type that can produce its own simple-subset representation.
///
/// Implement this for types whose reflective (serde) shape is not the
/// representation you want encoded, then install it with
/// [`register_simplify`]. The returned `Value` is simple by construction.
pub trait Simplify {
    fn simplify(&self) -> Value;
}

/// A type that produces a value-model node directly.
///
/// Equivalent in power to [`Simplify`]; when both are registered for a
/// type, `Generic` wins.
pub trait Generic {
    fn generic(&self) -> Value;
}

struct Entry {
    simplify: Option<fn(&dyn Any) -> Value>,
    generic: Option<fn(&dyn Any) -> Value>,
}

struct Registry {
    by_type: HashMap<TypeId, Entry>,
    // Short type name -> fully qualified path, for FullTypePath tagging of
    // nested records where only serde's short name is visible.
    full_names: HashMap<&'static str, &'static str>,
}

static REGISTRY: OnceLock<RwLock<Registry>> = OnceLock::new();

fn registry() -> &'static RwLock<Registry> {
    REGISTRY.get_or_init(|| {
        RwLock::new(Registry {
            by_type: HashMap::new(),
            full_names: HashMap::new(),
        })
    })
}

fn short_name_of(full: &'static str) -> &'static str {
    full.rsplit("::").next().unwrap_or(full)
}

fn entry_for<T: 'static>(reg: &mut Registry) -> &mut Entry {
    let full = std::any::type_name::<T>();
    reg.full_names.entry(short_name_of(full)).or_insert(full);
    reg.by_type.entry(TypeId::of::<T>()).or_insert(Entry {
        simplify: None,
        generic: None,
    })
}

fn simplify_shim<T: Simplify + 'static>(v: &dyn Any) -> Value {
    v.downcast_ref::<T>().map_or(Value::Null, Simplify::simplify)
}

fn generic_shim<T: Generic + 'static>(v: &dyn Any) -> Value {
    v.downcast_ref::<T>().map_or(Value::Null, Generic::generic)
}

/// Register `T`'s [`Simplify`] implementation for capability dispatch.
pub fn register_simplify<T: Simplify + 'static>() {
    let mut reg = registry().write();
    entry_for::<T>(&mut reg).simplify = Some(simplify_shim::<T>);
}

/// Register `T`'s [`Generic`] implementation for capability dispatch.
pub fn register_generic<T: Generic + 'static>() {
    let mut reg = registry().write();
    entry_for::<T>(&mut reg).generic = Some(generic_shim::<T>);
}

/// Record `T`'s type name so `full_type_path` tagging can resolve the
/// qualified path of nested records.
pub fn register_record<T: 'static>() {
    let mut reg = registry().write();
    entry_for::<T>(&mut reg);
}

/// Capability dispatch for a root value: `Generic` first, then `Simplify`.
pub(crate) fn lookup(v: &dyn Any) -> Option<Value> {
    let reg = registry().read();
    let entry = reg.by_type.get(&v.type_id())?;
    if let Some(f) = entry.generic {
        return Some(f(v));
    }
    entry.simplify.map(|f| f(v))
}

/// Resolve a short record name to its registered fully qualified path.
pub(crate) fn full_name_for(short: &str) -> Option<&'static str> {
    registry().read().full_names.get(short).copied()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jog;

    struct Celsius(f64);

    impl Simplify for Celsius {
        fn simplify(&self) -> Value {
            jog!({"celsius": (self.0)})
        }
    }

    #[test]
    fn test_registry_dispatch() {
        register_simplify::<Celsius>();
        let v = Celsius(21.5);
        let out = lookup(&v).unwrap();
        assert_eq!(out.get_key("celsius").and_then(Value::as_f64), Some(21.5));
        // Unregistered types stay unhandled.
        assert!(lookup(&"plain").is_none());
    }

    #[test]
    fn test_generic_wins_over_simplify() {
        struct Both;

        impl Simplify for Both {
            fn simplify(&self) -> Value {
                Value::String("simplified".to_string())
            }
        }

        impl Generic for Both {
            fn generic(&self) -> Value {
                Value::String("generic".to_string())
            }
        }

        register_simplify::<Both>();
        register_generic::<Both>();
        assert_eq!(lookup(&Both).and_then(|v| v.as_str().map(String::from)), Some("generic".to_string()));
    }

    #[test]
    fn test_full_name_resolution() {
        register_record::<Celsius>();
        let full = full_name_for("Celsius").unwrap();
        assert!(full.ends_with("Celsius"));
        assert!(full.contains("::"));
    }
}
