//! Output records.
//!
//! Everything here owns its data. Items are built from the pool but hold only
//! resolved copies, so they can be serialized after the pool is dropped.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A single named stat on an item, e.g. "Armor: 12".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attribute {
    pub name: String,
    /// A number when one was derivable, otherwise the raw pool field.
    pub value: Value,
    /// `None` when the descriptor has no `percentBased` key.
    pub is_percent_based: Option<bool>,
    /// `None` when the descriptor has no `higherIsBetter` key.
    pub higher_is_better: Option<bool>,
}

/// An item reconstructed from the pool.
///
/// Text fields that failed to resolve are empty strings; icon paths that
/// failed to resolve are `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    pub id: i64,
    pub name: String,
    pub category: String,
    pub subcategory: String,
    pub tier: Option<Value>,
    pub is_unique: bool,
    pub description: String,
    pub attributes: Vec<Attribute>,
    /// Recipe entries: resolved text where possible, raw values otherwise.
    pub recipe: Vec<Value>,
    /// Source entries: resolved text where possible, raw values otherwise.
    pub sources: Vec<Value>,
    pub icon_path: Option<String>,
    pub icon_url: String,
    pub icon_local_path: String,
    pub tier_icon_path: Option<String>,
    pub tier_icon_url: String,
    pub tier_icon_local_path: String,
    /// Text form of the icon field before deep resolution (diagnostics).
    pub raw_icon_token: String,
    pub source_url: String,
}

/// An item scraped from a saved HTML listing page.
///
/// Serializes with the same field names as [`Item`]; the page carries no ids,
/// stats or recipes, so those stay empty.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotItem {
    pub id: Option<i64>,
    pub name: String,
    pub category: String,
    pub subcategory: String,
    pub tier: Option<Value>,
    pub is_unique: bool,
    pub description: String,
    pub attributes: Vec<Attribute>,
    pub recipe: Vec<Value>,
    pub sources: Vec<Value>,
    pub icon_path: Option<String>,
    pub icon_url: String,
    pub icon_local_path: String,
    pub tier_icon_path: Option<String>,
    pub tier_icon_url: String,
    pub tier_icon_local_path: String,
    pub raw_icon_token: String,
    pub source_url: String,
}

/// Export header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Meta {
    /// UTC date of the export, `YYYY-MM-DD`.
    pub last_updated: String,
    pub item_count: usize,
}

/// The exported document: `{ "meta": ..., "items": [...] }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Export<T> {
    pub meta: Meta,
    pub items: Vec<T>,
}

impl<T> Export<T> {
    pub fn new(items: Vec<T>, last_updated: impl Into<String>) -> Self {
        Self {
            meta: Meta {
                last_updated: last_updated.into(),
                item_count: items.len(),
            },
            items,
        }
    }
}

impl<T: Serialize> Export<T> {
    /// Pretty-printed JSON, non-ASCII kept as-is.
    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_item_serializes_camel_case() {
        let item = Item {
            id: 7,
            name: "Ration Pack".into(),
            category: "Consumables".into(),
            subcategory: String::new(),
            tier: Some(json!(1)),
            is_unique: false,
            description: String::new(),
            attributes: vec![Attribute {
                name: "Hydration".into(),
                value: json!(20),
                is_percent_based: None,
                higher_is_better: Some(true),
            }],
            recipe: vec![],
            sources: vec![json!("Vendor")],
            icon_path: None,
            icon_url: String::new(),
            icon_local_path: String::new(),
            tier_icon_path: None,
            tier_icon_url: String::new(),
            tier_icon_local_path: String::new(),
            raw_icon_token: String::new(),
            source_url: String::new(),
        };

        let value = serde_json::to_value(&item).unwrap();
        assert_eq!(value["isUnique"], json!(false));
        assert_eq!(value["attributes"][0]["higherIsBetter"], json!(true));
        assert_eq!(value["attributes"][0]["isPercentBased"], Value::Null);
        assert_eq!(value["tierIconLocalPath"], json!(""));
        assert_eq!(value["sources"], json!(["Vendor"]));
    }

    #[test]
    fn test_export_envelope() {
        let export = Export::new(vec![SnapshotItem::default(), SnapshotItem::default()], "2025-08-23");
        let text = export.to_json_pretty().unwrap();
        let value: Value = serde_json::from_str(&text).unwrap();

        assert_eq!(value["meta"]["itemCount"], json!(2));
        assert_eq!(value["meta"]["lastUpdated"], json!("2025-08-23"));
        assert_eq!(value["items"][0]["id"], Value::Null);
    }
}
