//! Item extraction: one pass over the pool, one [`Item`] per qualifying entry.

use rayon::prelude::*;
use serde_json::{Map, Value};

use super::attributes::humanize_attribute_values;
use super::classify::{classify, Rejection};
use crate::assets::AssetLocator;
use crate::pool::Pool;
use crate::resolve::{is_asset_path, is_truthy, IconResolver, Resolver};
use crate::types::Item;

/// Substrings that mark internal records rather than player-facing items.
pub const NON_ITEM_NAME_TOKENS: &[&str] = &["BP_", "InfoCard_", "ItemStats_", "seconds", "RPM"];

/// Why a candidate produced no item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Discard {
    Shape(Rejection),
    /// No integer id could be derived.
    NoId,
    /// Name missing, not text, or an internal identifier.
    InvalidName,
}

/// Counters for one extraction pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExtractionStats {
    pub pool_len: usize,
    /// Dictionaries examined.
    pub candidates: usize,
    pub items: usize,
    pub stat_tuples: usize,
    pub missing_identity: usize,
    pub no_item_keys: usize,
    pub no_id: usize,
    pub invalid_name: usize,
}

impl ExtractionStats {
    fn record(&mut self, discard: Discard) {
        match discard {
            Discard::Shape(Rejection::StatTuple) => self.stat_tuples += 1,
            Discard::Shape(Rejection::MissingIdentity) => self.missing_identity += 1,
            Discard::Shape(Rejection::NoItemKeys) => self.no_item_keys += 1,
            Discard::NoId => self.no_id += 1,
            Discard::InvalidName => self.invalid_name += 1,
        }
    }

    pub fn discarded(&self) -> usize {
        self.candidates - self.items
    }
}

/// Text that can be shown to a player: not an asset path, has a letter.
pub fn is_display_text(s: &str) -> bool {
    !is_asset_path(s) && s.chars().any(char::is_alphabetic)
}

/// Valid item names additionally exclude internal identifiers.
pub fn is_item_name(s: &str) -> bool {
    is_display_text(s) && !NON_ITEM_NAME_TOKENS.iter().any(|tok| s.contains(tok))
}

/// Builds items from pool entries.
#[derive(Debug, Clone)]
pub struct Extractor<'a> {
    resolver: Resolver<'a>,
    icons: IconResolver<'a>,
    locator: AssetLocator,
}

impl<'a> Extractor<'a> {
    pub fn new(pool: &'a Pool, locator: AssetLocator) -> Self {
        let resolver = Resolver::new(pool);
        Self {
            resolver,
            icons: IconResolver::new(resolver),
            locator,
        }
    }

    /// Classify and extract a single pool entry.
    pub fn extract(&self, entry: &'a Map<String, Value>) -> Result<Item, Discard> {
        classify(entry).map_err(Discard::Shape)?;

        let r = &self.resolver;
        let field = |key: &str| entry.get(key);
        let text = |key: &str| field(key).and_then(|v| r.to_text(v));

        let id = self.derive_id(field("id")).ok_or(Discard::NoId)?;

        let name = text("name")
            .filter(|n| is_item_name(n))
            .ok_or(Discard::InvalidName)?;

        let display = |key: &str| {
            text(key)
                .filter(|s| is_display_text(s))
                .unwrap_or_default()
                .to_string()
        };

        let tier = field("tier").map(|v| r.to_value(v).clone());
        let is_unique = field("isUnique").is_some_and(|v| r.to_bool(v));
        let attributes = field("attributeValues")
            .map(|v| humanize_attribute_values(r, v))
            .unwrap_or_default();
        let recipe = field("recipe").map(|v| self.humanize_list(v)).unwrap_or_default();
        let sources = field("sources").map(|v| self.humanize_list(v)).unwrap_or_default();

        let icon_path = field("iconPath")
            .and_then(|v| self.icons.resolve_icon_path(v))
            .or_else(|| field("icon").and_then(|v| self.icons.resolve_icon_path(v)));
        let tier_icon_path = field("tierIconPath").and_then(|v| self.icons.resolve_icon_path(v));

        let icon_link = icon_path.and_then(|p| self.locator.link(p));
        let tier_link = tier_icon_path.and_then(|p| self.locator.link(p));
        let shown_link = icon_link.as_ref().or(tier_link.as_ref());

        let raw_icon_token = text("iconPath")
            .filter(|s| !s.is_empty())
            .or_else(|| text("icon"))
            .unwrap_or_default()
            .to_string();

        Ok(Item {
            id,
            name: name.to_string(),
            category: display("mainCategoryId"),
            subcategory: display("subCategoryId"),
            tier,
            is_unique,
            description: text("description").unwrap_or_default().to_string(),
            attributes,
            recipe,
            sources,
            icon_path: icon_path.map(String::from),
            icon_url: shown_link.map(|l| l.url.clone()).unwrap_or_default(),
            icon_local_path: shown_link.map(|l| l.local_display()).unwrap_or_default(),
            tier_icon_path: tier_icon_path.map(String::from),
            tier_icon_url: tier_link.as_ref().map(|l| l.url.clone()).unwrap_or_default(),
            tier_icon_local_path: tier_link.as_ref().map(|l| l.local_display()).unwrap_or_default(),
            raw_icon_token,
            source_url: text("url").unwrap_or_default().to_string(),
        })
    }

    /// A direct integer wins; otherwise the reference must lead to a
    /// dictionary with a numeric `id` (or to an integer).
    fn derive_id(&self, raw: Option<&'a Value>) -> Option<i64> {
        let raw = raw?;
        if let Some(id) = raw.as_i64() {
            return Some(id);
        }

        match self.resolver.to_value(raw) {
            Value::Object(map) => match map.get("id") {
                Some(Value::Number(n)) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
                _ => None,
            },
            other => other.as_i64(),
        }
    }

    /// Recipe/source lists: text where an element renders as text, the
    /// dereferenced raw value otherwise.
    ///
    /// A non-empty value that is not a list becomes a one-element list; an
    /// empty one yields an empty list.
    fn humanize_list(&self, reference: &'a Value) -> Vec<Value> {
        let r = &self.resolver;
        let humanize = |element: &'a Value| match r.to_text(element) {
            Some(label) if !label.is_empty() => Value::String(label.to_string()),
            _ => r.to_value(element).clone(),
        };

        match r.deref_once(r.to_value(reference)) {
            Value::Array(elements) => elements.iter().map(humanize).collect(),
            other if is_truthy(other) => vec![humanize(other)],
            _ => Vec::new(),
        }
    }
}

/// Extract every item in the pool, in pool order.
///
/// Entries are processed in parallel; none depends on another.
pub fn extract_items(pool: &Pool, locator: AssetLocator) -> (Vec<Item>, ExtractionStats) {
    let extractor = Extractor::new(pool, locator);

    let outcomes: Vec<Option<Result<Item, Discard>>> = pool
        .values()
        .par_iter()
        .map(|value| match value {
            Value::Object(entry) => Some(extractor.extract(entry)),
            _ => None,
        })
        .collect();

    let mut stats = ExtractionStats {
        pool_len: pool.len(),
        ..Default::default()
    };
    let mut items = Vec::new();

    for outcome in outcomes.into_iter().flatten() {
        stats.candidates += 1;
        match outcome {
            Ok(item) => items.push(item),
            Err(discard) => stats.record(discard),
        }
    }
    stats.items = items.len();

    tracing::info!(
        pool = stats.pool_len,
        candidates = stats.candidates,
        items = stats.items,
        discarded = stats.discarded(),
        "extraction finished"
    );
    tracing::debug!(?stats, "discard breakdown");

    (items, stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn locator() -> AssetLocator {
        AssetLocator::new("https://cdn.example/dune", "42", "images")
    }

    fn entry(pool: &Pool, idx: usize) -> &Map<String, Value> {
        match &pool.values()[idx] {
            Value::Object(map) => map,
            _ => panic!("fixture entry {idx} must be an object"),
        }
    }

    #[test]
    fn test_scenario_ration_pack() {
        let pool = Pool::new(vec![
            json!({"id": 7, "name": 3, "mainCategoryId": 5, "tier": 2}),
            json!(1),
            json!(1),
            json!("Ration Pack"),
            json!("unused"),
            json!("Consumables"),
        ]);
        let extractor = Extractor::new(&pool, locator());
        let item = extractor.extract(entry(&pool, 0)).unwrap();

        assert_eq!(item.id, 7);
        assert_eq!(item.name, "Ration Pack");
        assert_eq!(item.category, "Consumables");
        assert_eq!(item.subcategory, "");
        assert_eq!(item.tier, Some(json!(1)));
        assert!(!item.is_unique);
        assert!(item.attributes.is_empty());
        assert!(item.icon_path.is_none());
        assert_eq!(item.icon_url, "");
    }

    #[test]
    fn test_direct_string_name_round_trips() {
        let pool = Pool::new(vec![json!({"id": 1, "name": "Stillsuit Mk2 (Épique)", "volume": 4})]);
        let extractor = Extractor::new(&pool, locator());
        let item = extractor.extract(entry(&pool, 0)).unwrap();
        assert_eq!(item.name, "Stillsuit Mk2 (Épique)");
    }

    #[test]
    fn test_id_derivation() {
        let pool = Pool::new(vec![
            json!({"id": 2, "name": "A", "volume": 1}),            // 0 direct
            json!({"id": 0, "name": "B", "volume": 1}),            // 1 direct, never dereferenced
            json!({"id": "abc", "name": "C", "volume": 1}),        // 2
            json!({"id": 1.5, "name": "D", "volume": 1}),          // 3
            json!({"id": {"id": 9}, "name": "E", "volume": 1}),    // 4
            json!({"id": {"id": 12.7}, "name": "F", "volume": 1}), // 5 truncated
            json!({"id": {"ref": 0}, "name": "G", "volume": 1}),   // 6
            json!({"id": [0], "name": "H", "volume": 1}),          // 7
        ]);
        let extractor = Extractor::new(&pool, locator());
        let id = |idx| extractor.extract(entry(&pool, idx)).map(|item| item.id);

        assert_eq!(id(0), Ok(2));
        assert_eq!(id(1), Ok(0));
        assert_eq!(id(2), Err(Discard::NoId));
        assert_eq!(id(3), Err(Discard::NoId));
        assert_eq!(id(4), Ok(9));
        assert_eq!(id(5), Ok(12));
        assert_eq!(id(6), Err(Discard::NoId));
        assert_eq!(id(7), Err(Discard::NoId));
    }

    #[test]
    fn test_name_validation() {
        for bad in ["BP_Knife", "InfoCard_Foo", "ItemStats_Bar", "12 seconds", "900 RPM", "1234", "", "/images/a.webp"] {
            assert!(!is_item_name(bad), "{bad:?} should be rejected");
        }
        assert!(is_item_name("Épée"));
        assert!(is_item_name("Mk3 Cutteray"));

        let pool = Pool::new(vec![json!({"id": 1, "name": "BP_Knife_C", "tier": 1})]);
        let extractor = Extractor::new(&pool, locator());
        assert_eq!(extractor.extract(entry(&pool, 0)), Err(Discard::InvalidName));
    }

    #[test]
    fn test_stat_tuple_is_not_item() {
        let pool = Pool::new(vec![json!({"key": "armor", "attribute": 1, "value": 3})]);
        let (items, stats) = extract_items(&pool, locator());
        assert!(items.is_empty());
        assert_eq!(stats.stat_tuples, 1);
    }

    #[test]
    fn test_full_item_fields() {
        let pool = Pool::new(vec![
            json!({
                "id": 100,
                "name": 1,
                "mainCategoryId": 2,
                "subCategoryId": 3,
                "description": 4,
                "isUnique": 5,
                "iconPath": 6,
                "tierIconPath": 7,
                "attributeValues": 8,
                "recipe": 11,
                "sources": 12,
                "url": 13
            }),
            json!("Sandbike Engine"),                       // 1
            json!({"name": "Vehicles"}),                    // 2
            json!(42),                                      // 3 -> nothing textual
            json!("A sturdy engine."),                      // 4
            json!(1),                                       // 5 -> "Sandbike Engine" (truthy)
            json!({"large": "/images/icons/engine.webp"}),  // 6
            json!("/Game/UI/Tiers/T_Tier3"),                // 7
            json!([9]),                                     // 8
            json!({"key": "hp", "attribute": 10, "value": 500}), // 9
            json!({"name": "Hull Points", "higherIsBetter": true}), // 10
            json!([1, {"qty": 3}, 4]),                      // 11
            json!(14),                                      // 12 -> list
            json!("/items/sandbike-engine"),                // 13
            json!(["Crafting", 3]),                         // 14
            json!("/images/tiers/t_tier3.webp"),            // 15
        ]);

        let (items, stats) = extract_items(&pool, locator());
        assert_eq!(stats.items, 1);
        let item = &items[0];

        assert_eq!(item.id, 100);
        assert_eq!(item.name, "Sandbike Engine");
        assert_eq!(item.category, "Vehicles");
        assert_eq!(item.subcategory, "");
        assert_eq!(item.description, "A sturdy engine.");
        assert!(item.is_unique);
        assert_eq!(item.tier, None);

        assert_eq!(item.attributes.len(), 1);
        assert_eq!(item.attributes[0].name, "Hull Points");
        assert_eq!(item.attributes[0].value, json!(500));
        assert_eq!(item.attributes[0].higher_is_better, Some(true));
        assert_eq!(item.attributes[0].is_percent_based, None);

        assert_eq!(
            item.recipe,
            vec![json!("Sandbike Engine"), json!({"qty": 3}), json!("A sturdy engine.")]
        );
        // 3 chains to the literal 42.
        assert_eq!(item.sources, vec![json!("Crafting"), json!(42)]);

        assert_eq!(item.icon_path.as_deref(), Some("/images/icons/engine.webp"));
        assert_eq!(item.icon_url, "https://cdn.example/dune/images/icons/engine.webp?v=42");
        assert_eq!(item.icon_local_path, "images/icons/engine.webp");
        assert_eq!(item.tier_icon_path.as_deref(), Some("/images/tiers/t_tier3.webp"));
        assert_eq!(item.tier_icon_local_path, "images/tiers/t_tier3.webp");
        assert_eq!(item.raw_icon_token, "");
        assert_eq!(item.source_url, "/items/sandbike-engine");
    }

    #[test]
    fn test_non_list_recipe_and_sources() {
        let pool = Pool::new(vec![
            json!({"id": 1, "name": "Knife", "volume": 1, "recipe": 2, "sources": 3}),
            json!({"id": 2, "name": "Rope", "volume": 1, "recipe": 4, "sources": {}}),
            json!({"name": "Fabricator"}),
            json!("Trader"),
            json!(""),
        ]);

        let (items, _) = extract_items(&pool, locator());
        assert_eq!(items.len(), 2);

        // A single non-empty value is kept as a one-element list.
        assert_eq!(items[0].recipe, vec![json!("Fabricator")]);
        assert_eq!(items[0].sources, vec![json!("Trader")]);

        // Empty values still yield empty lists.
        assert!(items[1].recipe.is_empty());
        assert!(items[1].sources.is_empty());
    }

    #[test]
    fn test_icon_fallbacks() {
        let pool = Pool::new(vec![
            json!({"id": 1, "name": "Knife", "volume": 1, "icon": 2, "tierIconPath": 3}),
            json!("unused"),
            json!("/Game/UI/Icons/T_Knife.T_Knife"),
            json!("/images/tiers/t1.webp"),
            json!("/images/icons/t_knife.webp"),
            json!({"id": 2, "name": "Rope", "volume": 1, "tierIconPath": 3}),
        ]);
        let extractor = Extractor::new(&pool, locator());

        let knife = extractor.extract(entry(&pool, 0)).unwrap();
        assert_eq!(knife.icon_path.as_deref(), Some("/images/icons/t_knife.webp"));
        assert_eq!(knife.raw_icon_token, "/Game/UI/Icons/T_Knife.T_Knife");

        // Without an icon, the tier icon fills the displayed icon fields.
        let rope = extractor.extract(entry(&pool, 5)).unwrap();
        assert_eq!(rope.icon_path, None);
        assert_eq!(rope.icon_url, "https://cdn.example/dune/images/tiers/t1.webp?v=42");
        assert_eq!(rope.icon_local_path, "images/tiers/t1.webp");
        assert_eq!(rope.tier_icon_url, rope.icon_url);
    }

    #[test]
    fn test_extract_items_preserves_pool_order() {
        let pool = Pool::new(vec![
            json!({"id": 3, "name": "Gamma", "tier": 1}),
            json!("filler"),
            json!({"id": 1, "name": "Alpha", "tier": 1}),
            json!({"id": 2, "name": "seconds", "tier": 1}),
            json!({"id": 2, "name": "Beta", "tier": 1}),
        ]);

        let (items, stats) = extract_items(&pool, locator());
        let names: Vec<_> = items.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["Gamma", "Alpha", "Beta"]);
        assert_eq!(stats.candidates, 4);
        assert_eq!(stats.invalid_name, 1);
        assert_eq!(stats.discarded(), 1);
    }
}
