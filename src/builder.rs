// ABOUTME: Incremental stack-based construction of Value trees.
// ABOUTME: Frames are objects or arrays; keys are validated against the open frame.

use crate::error::{Error, Result};
use crate::value::{Map, Value};

enum Slot {
    Node(Value),
    Key(String),
}

/// Marker for an open frame: `None` is an object frame, `Some(i)` is an
/// array frame whose placeholder sits at node-stack index `i`.
type Marker = Option<usize>;

/// Assists in building a more complex [`Value`] step by step.
///
/// # Examples
///
/// ```rust
/// use jog::{Builder, Value};
///
/// let mut b = Builder::default();
/// b.object(None).unwrap();
/// b.value(Value::from("a"), Some("x")).unwrap();
/// b.pop();
/// assert_eq!(b.result().to_string(), r#"{"x":"a"}"#);
/// ```
#[derive(Default)]
pub struct Builder {
    stack: Vec<Slot>,
    starts: Vec<Marker>,
}

impl Builder {
    /// Create an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear previously built nodes, retaining allocations.
    pub fn reset(&mut self) {
        self.stack.clear();
        self.starts.clear();
    }

    fn in_object(&self) -> bool {
        matches!(self.starts.last(), Some(None))
    }

    fn check_key(&mut self, key: Option<&str>) -> Result<bool> {
        match key {
            Some(k) => {
                if !self.in_object() {
                    return Err(Error::builder("can not use a key when pushing to an array"));
                }
                self.stack.push(Slot::Key(k.to_string()));
                Ok(true)
            }
            None => {
                if self.in_object() {
                    return Err(Error::builder("must have a key when pushing to an object"));
                }
                Ok(false)
            }
        }
    }

    /// Open an object frame. A key is required exactly when the open
    /// frame is an object.
    pub fn object(&mut self, key: Option<&str>) -> Result<()> {
        self.check_key(key)?;
        self.starts.push(None);
        self.stack.push(Slot::Node(Value::Object(Map::new())));
        Ok(())
    }

    /// Open an array frame. A key is required exactly when the open frame
    /// is an object.
    pub fn array(&mut self, key: Option<&str>) -> Result<()> {
        self.check_key(key)?;
        self.starts.push(Some(self.stack.len()));
        self.stack.push(Slot::Node(Value::Array(Vec::new())));
        Ok(())
    }

    /// Add a leaf value. Inside an object it attaches under `key`; inside
    /// an array it is collected when the frame pops; at the root it
    /// becomes the result.
    pub fn value(&mut self, value: Value, key: Option<&str>) -> Result<()> {
        match key {
            Some(k) => {
                if !self.in_object() {
                    return Err(Error::builder("can not use a key when pushing to an array"));
                }
                if let Some(Slot::Node(Value::Object(obj))) = self.stack.last_mut() {
                    obj.insert(k.to_string(), value);
                }
            }
            None => {
                if self.in_object() {
                    return Err(Error::builder("must have a key when pushing to an object"));
                }
                self.stack.push(Slot::Node(value));
            }
        }
        Ok(())
    }

    /// Close the innermost open frame.
    pub fn pop(&mut self) {
        let Some(marker) = self.starts.pop() else {
            return;
        };
        match marker {
            Some(ix) => {
                // Array frame: collect the elements above the placeholder.
                let elems: Vec<Value> = self
                    .stack
                    .drain(ix + 1..)
                    .filter_map(|s| match s {
                        Slot::Node(v) => Some(v),
                        Slot::Key(_) => None,
                    })
                    .collect();
                self.stack[ix] = Slot::Node(Value::Array(elems));
                self.attach_keyed();
            }
            None => {
                // Object frame: entries were attached as they arrived.
                self.attach_keyed();
            }
        }
    }

    // Fold the completed node at the top of the stack into its parent
    // object when a pending key precedes it.
    fn attach_keyed(&mut self) {
        let n = self.stack.len();
        if n < 3 {
            return;
        }
        if !matches!(self.stack[n - 2], Slot::Key(_)) {
            return;
        }
        if !matches!(self.stack[n - 3], Slot::Node(Value::Object(_))) {
            return;
        }
        let Some(Slot::Node(node)) = self.stack.pop() else {
            return;
        };
        let Some(Slot::Key(k)) = self.stack.pop() else {
            return;
        };
        if let Some(Slot::Node(Value::Object(obj))) = self.stack.last_mut() {
            obj.insert(k, node);
        }
    }

    /// Close every open frame.
    pub fn pop_all(&mut self) {
        while !self.starts.is_empty() {
            self.pop();
        }
    }

    /// The currently built root, or null when nothing was added.
    #[must_use]
    pub fn result(&self) -> Value {
        match self.stack.first() {
            Some(Slot::Node(v)) => v.clone(),
            _ => Value::Null,
        }
    }
}
