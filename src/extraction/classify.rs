//! Structural item recognition.
//!
//! The pool carries no type discriminator, so items are recognized by shape.

use serde_json::{Map, Value};

/// Keys of which an item dictionary has at least one.
pub const ITEM_KEYS: &[&str] = &[
    "mainCategoryId",
    "subCategoryId",
    "iconPath",
    "tier",
    "highestSellToVendorPrice",
    "volume",
    "filterCategoryIds",
];

/// Keys that make up a bare stat tuple.
const STAT_TUPLE_KEYS: [&str; 3] = ["key", "attribute", "value"];

/// Stat tuples carry at most this many fields.
const STAT_TUPLE_MAX_FIELDS: usize = 5;

/// Why a dictionary was not taken as an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Rejection {
    /// `{key, attribute, value}` with at most two extra fields.
    StatTuple,
    /// No `id` or no `name` key.
    MissingIdentity,
    /// None of [`ITEM_KEYS`] present.
    NoItemKeys,
}

/// Classify a dictionary, reporting why it is not an item.
pub fn classify(entry: &Map<String, Value>) -> Result<(), Rejection> {
    if STAT_TUPLE_KEYS.iter().all(|k| entry.contains_key(*k)) && entry.len() <= STAT_TUPLE_MAX_FIELDS {
        return Err(Rejection::StatTuple);
    }
    if !entry.contains_key("id") || !entry.contains_key("name") {
        return Err(Rejection::MissingIdentity);
    }
    if !ITEM_KEYS.iter().any(|k| entry.contains_key(*k)) {
        return Err(Rejection::NoItemKeys);
    }
    Ok(())
}

pub fn looks_like_item(entry: &Map<String, Value>) -> bool {
    classify(entry).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn dict(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("fixture must be an object"),
        }
    }

    #[test]
    fn test_stat_tuple_rejected() {
        let tuple = dict(json!({"key": "armor", "attribute": 3, "value": 12}));
        assert_eq!(classify(&tuple), Err(Rejection::StatTuple));

        // Even with id/name/tier, five fields is still a tuple.
        let padded = dict(json!({"key": 1, "attribute": 2, "value": 3, "id": 4, "name": 5}));
        assert!(!looks_like_item(&padded));
    }

    #[test]
    fn test_large_dict_with_tuple_keys_can_be_item() {
        let entry = dict(json!({
            "key": 1, "attribute": 2, "value": 3,
            "id": 4, "name": 5, "tier": 6
        }));
        assert!(looks_like_item(&entry));
    }

    #[test]
    fn test_identity_required() {
        let no_name = dict(json!({"id": 1, "tier": 2}));
        let no_id = dict(json!({"name": "Knife", "tier": 2}));
        assert_eq!(classify(&no_name), Err(Rejection::MissingIdentity));
        assert_eq!(classify(&no_id), Err(Rejection::MissingIdentity));
    }

    #[test]
    fn test_item_keys_required() {
        let category = dict(json!({"id": 1, "name": "Weapons", "parentId": 0}));
        assert_eq!(classify(&category), Err(Rejection::NoItemKeys));

        for key in ITEM_KEYS {
            let mut entry = dict(json!({"id": 1, "name": "Knife"}));
            entry.insert((*key).to_string(), json!(0));
            assert!(looks_like_item(&entry), "{key} should mark an item");
        }
    }
}
