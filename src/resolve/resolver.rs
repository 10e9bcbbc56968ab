//! Reference resolution against the pool.
//!
//! Every coercion here is built on [`Resolver::deref_chain`], and each one stops
//! at a different depth:
//!
//! - `to_text` follows chains and unwraps one `{name: ...}` wrapper
//! - `to_value` follows chains and returns whatever leaf it lands on
//! - `to_bool` is `to_value` plus truthiness
//! - `to_number` never dereferences at all
//!
//! Deep-resolving every integer would turn literal numeric fields (prices,
//! volumes, stat values) into references to unrelated pool entries.
//!
//! All methods are generic over the borrow of their input so they accept both
//! pool elements and ad-hoc values; results never outlive either.

use std::collections::HashSet;

use serde_json::{Number, Value};

use crate::pool::{Pool, IMAGE_PREFIX, TEXTURE_ICON_MARKER};

/// Default bound on chain length for [`Resolver::deref_chain`].
pub const MAX_CHAIN_STEPS: usize = 8;

/// Default bound on nesting depth for [`Resolver::deep_find_image_path`].
pub const MAX_SEARCH_DEPTH: usize = 10;

/// Read-only view over a pool that knows how to follow back-references.
#[derive(Debug, Clone, Copy)]
pub struct Resolver<'a> {
    pool: &'a Pool,
    max_steps: usize,
    max_depth: usize,
}

impl<'a> Resolver<'a> {
    pub fn new(pool: &'a Pool) -> Self {
        Self {
            pool,
            max_steps: MAX_CHAIN_STEPS,
            max_depth: MAX_SEARCH_DEPTH,
        }
    }

    pub fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = max_steps;
        self
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn pool(&self) -> &'a Pool {
        self.pool
    }

    /// `Pool[v]` when `v` is an in-range integer, otherwise `v` itself.
    pub fn deref_once<'v>(&self, value: &'v Value) -> &'v Value
    where
        'a: 'v,
    {
        match self.pool.index_of(value) {
            Some(idx) => &self.pool.values()[idx],
            None => value,
        }
    }

    /// Follow back-references until a non-reference is reached.
    ///
    /// Stops after `max_steps` hops, when an index repeats within this chain,
    /// or when an element points at itself. In the bounded cases the last
    /// integer reached is returned as-is.
    pub fn deref_chain<'v>(&self, value: &'v Value) -> &'v Value
    where
        'a: 'v,
    {
        let mut seen = HashSet::new();
        let mut current = value;
        let mut steps = 0;

        while steps < self.max_steps {
            let Some(idx) = self.pool.index_of(current) else {
                break;
            };
            if !seen.insert(idx) {
                break;
            }
            let next = &self.pool.values()[idx];
            if next == current {
                break;
            }
            current = next;
            steps += 1;
        }

        current
    }

    /// Resolve to display text.
    ///
    /// Accepts a string leaf, or a dictionary whose `name` field chains to a
    /// string. Asset paths are never display text and resolve to `None`.
    pub fn to_text<'v>(&self, value: &'v Value) -> Option<&'v str>
    where
        'a: 'v,
    {
        match self.deref_chain(value) {
            Value::String(s) => display_text(s),
            Value::Object(map) => match map.get("name").map(|n| self.deref_chain(n)) {
                Some(Value::String(s)) => display_text(s),
                _ => None,
            },
            _ => None,
        }
    }

    /// Resolve to the dereferenced leaf without interpreting it.
    pub fn to_value<'v>(&self, value: &'v Value) -> &'v Value
    where
        'a: 'v,
    {
        self.deref_chain(value)
    }

    pub fn to_bool(&self, value: &Value) -> bool {
        match self.to_value(value) {
            Value::Bool(b) => *b,
            Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
            other => is_truthy(other),
        }
    }

    /// Shallow numeric coercion.
    ///
    /// A number is always taken literally, even when it would be a valid
    /// index; nothing else is numeric. The pool is never consulted.
    pub fn to_number<'v>(&self, value: &'v Value) -> Option<&'v Number> {
        match value {
            Value::Number(n) => Some(n),
            _ => None,
        }
    }

    /// Depth-first search for the first `/images/...` string under `node`.
    ///
    /// Integers are followed into the pool once per index per call; dictionaries
    /// are searched value by value in source order, lists element by element.
    pub fn deep_find_image_path<'v>(&self, node: &'v Value) -> Option<&'v str>
    where
        'a: 'v,
    {
        let mut visited = HashSet::new();
        self.search_image_path(node, 0, &mut visited)
    }

    fn search_image_path<'v>(
        &self,
        node: &'v Value,
        depth: usize,
        visited: &mut HashSet<usize>,
    ) -> Option<&'v str>
    where
        'a: 'v,
    {
        if depth > self.max_depth {
            return None;
        }

        match node {
            Value::String(s) if s.starts_with(IMAGE_PREFIX) => Some(s.as_str()),
            Value::Number(_) => {
                let idx = self.pool.index_of(node)?;
                if !visited.insert(idx) {
                    return None;
                }
                self.search_image_path(&self.pool.values()[idx], depth + 1, visited)
            }
            Value::Object(map) => map
                .values()
                .find_map(|v| self.search_image_path(v, depth + 1, visited)),
            Value::Array(items) => items
                .iter()
                .find_map(|v| self.search_image_path(v, depth + 1, visited)),
            _ => None,
        }
    }
}

/// True for strings that are asset tokens rather than display text.
pub fn is_asset_path(s: &str) -> bool {
    s.starts_with(IMAGE_PREFIX) || s.contains(TEXTURE_ICON_MARKER)
}

fn display_text(s: &str) -> Option<&str> {
    (!is_asset_path(s)).then_some(s)
}

/// Generic truthiness: null and empty containers/strings are false.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}
