//! The object pool: a flat JSON array whose integers may point back into itself.
//!
//! The pool is loaded once and never mutated. Any integer element (or any integer
//! nested inside a dictionary or list) *may* be a back-reference to another
//! element. Nothing in the format says which integers are references and which
//! are literal numbers; callers decide contextually via [`Pool::index_of`].

use serde_json::Value;
use thiserror::Error;

/// Structural failures that make extraction meaningless.
#[derive(Debug, Error)]
pub enum PoolError {
    /// The document's top level is not an array.
    #[error("expected the pool to be a JSON array at the top level, found {found}")]
    NotAList { found: &'static str },

    /// The document is not JSON at all.
    #[error("pool is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Immutable snapshot of the pool.
#[derive(Debug, Clone, Default)]
pub struct Pool {
    values: Vec<Value>,
}

impl Pool {
    pub fn new(values: Vec<Value>) -> Self {
        Self { values }
    }

    /// Build a pool from an already parsed document.
    ///
    /// Fails with [`PoolError::NotAList`] when the document is not an array.
    pub fn from_value(document: Value) -> Result<Self, PoolError> {
        match document {
            Value::Array(values) => Ok(Self::new(values)),
            other => Err(PoolError::NotAList {
                found: json_type_name(&other),
            }),
        }
    }

    /// Parse a pool from JSON text.
    pub fn from_json_str(text: &str) -> Result<Self, PoolError> {
        let document: Value = serde_json::from_str(text)?;
        Self::from_value(document)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Value> {
        self.values.iter()
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// Interpret `value` as a back-reference.
    ///
    /// Returns the index only for a non-negative integer strictly below the pool
    /// length. Booleans and floats are never references.
    pub fn index_of(&self, value: &Value) -> Option<usize> {
        let Value::Number(n) = value else {
            return None;
        };
        let idx = n.as_u64()?;
        let idx = usize::try_from(idx).ok()?;
        (idx < self.values.len()).then_some(idx)
    }

    /// Every string element that looks like an image path, in pool order.
    pub fn image_paths(&self) -> impl Iterator<Item = &str> {
        self.values.iter().filter_map(|v| match v {
            Value::String(s) if s.starts_with(IMAGE_PREFIX) => Some(s.as_str()),
            _ => None,
        })
    }
}

/// Prefix shared by every asset path in the pool.
pub const IMAGE_PREFIX: &str = "/images/";

/// Marker for engine-internal texture references (never display text).
pub const TEXTURE_ICON_MARKER: &str = "/textures/icons/";

/// Human-readable JSON type name, for error messages.
pub fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_index_of_range_checks() {
        let pool = Pool::new(vec![json!("a"), json!("b"), json!(1)]);

        assert_eq!(pool.index_of(&json!(0)), Some(0));
        assert_eq!(pool.index_of(&json!(2)), Some(2));
        assert_eq!(pool.index_of(&json!(3)), None);
        assert_eq!(pool.index_of(&json!(-1)), None);
        assert_eq!(pool.index_of(&json!(1.0)), None);
        assert_eq!(pool.index_of(&json!(true)), None);
        assert_eq!(pool.index_of(&json!("1")), None);
    }

    #[test]
    fn test_from_value_rejects_non_array() {
        let err = Pool::from_value(json!({"items": []})).unwrap_err();
        assert!(matches!(err, PoolError::NotAList { found: "object" }));
        assert!(err.to_string().contains("object"));
    }

    #[test]
    fn test_from_json_str() {
        let pool = Pool::from_json_str(r#"["x", 0, {"name": 0}]"#).unwrap();
        assert_eq!(pool.len(), 3);

        assert!(matches!(
            Pool::from_json_str("not json"),
            Err(PoolError::Json(_))
        ));
    }

    #[test]
    fn test_image_paths() {
        let pool = Pool::new(vec![
            json!("/images/icons/a.webp"),
            json!("Plasteel"),
            json!({"icon": "/images/icons/b.webp"}),
            json!("/images/tiers/t1.webp"),
        ]);
        let paths: Vec<_> = pool.image_paths().collect();
        assert_eq!(paths, vec!["/images/icons/a.webp", "/images/tiers/t1.webp"]);
    }
}
