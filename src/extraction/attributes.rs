//! Stat tuples to named attributes.
//!
//! Items reference a list of `{key, attribute, value}` tuples. `attribute`
//! points at a descriptor (`{name, percentBased, higherIsBetter, ...}`) or
//! directly at the stat's display name.

use serde_json::Value;

use crate::resolve::Resolver;
use crate::types::Attribute;

/// Resolve an `attributeValues` reference into attributes, in source order.
///
/// Tuples whose attribute name cannot be resolved are dropped.
pub fn humanize_attribute_values<'a>(resolver: &Resolver<'a>, reference: &'a Value) -> Vec<Attribute> {
    let root = resolver.deref_once(resolver.to_value(reference));
    let Value::Array(elements) = root else {
        return Vec::new();
    };

    elements
        .iter()
        .filter_map(|element| match resolver.deref_once(element) {
            Value::Object(tuple) => Some(tuple),
            _ => None,
        })
        .filter_map(|tuple| {
            let descriptor = tuple
                .get("attribute")
                .map(|a| resolver.deref_once(resolver.to_value(a)));

            let (name, is_percent_based, higher_is_better) = match descriptor {
                Some(desc @ Value::Object(fields)) => {
                    let name = fields
                        .get("name")
                        .and_then(|n| resolver.to_text(n))
                        .or_else(|| resolver.to_text(desc));
                    let flag = |key: &str| fields.get(key).map(|v| resolver.to_bool(v));
                    (name, flag("percentBased"), flag("higherIsBetter"))
                }
                Some(other) => (resolver.to_text(other), None, None),
                None => (None, None, None),
            };

            let name = name.filter(|n| !n.is_empty())?;

            let raw = tuple.get("value").unwrap_or(&Value::Null);
            let value = resolver
                .to_number(raw)
                .map(|n| Value::Number(n.clone()))
                .unwrap_or_else(|| raw.clone());

            Some(Attribute {
                name: name.to_string(),
                value,
                is_percent_based,
                higher_is_better,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::Pool;
    use serde_json::json;

    #[test]
    fn test_descriptors_and_flags() {
        let pool = Pool::new(vec![
            json!("Armor"),                                                        // 0
            json!({"name": 0, "percentBased": false, "higherIsBetter": true}),     // 1
            json!("Heat Protection"),                                              // 2
            json!({"name": 2, "percentBased": 1}),                                 // 3
            json!({"key": "armor", "attribute": 1, "value": 12}),                  // 4
            json!({"key": "heat", "attribute": 3, "value": 0.25}),                 // 5
            json!([4, 5]),                                                         // 6
        ]);
        let resolver = Resolver::new(&pool);
        let attrs = humanize_attribute_values(&resolver, &json!(6));

        assert_eq!(attrs.len(), 2);
        assert_eq!(attrs[0].name, "Armor");
        assert_eq!(attrs[0].value, json!(12));
        assert_eq!(attrs[0].is_percent_based, Some(false));
        assert_eq!(attrs[0].higher_is_better, Some(true));

        assert_eq!(attrs[1].name, "Heat Protection");
        assert_eq!(attrs[1].value, json!(0.25));
        // 1 points at a non-empty descriptor, which is truthy.
        assert_eq!(attrs[1].is_percent_based, Some(true));
        assert_eq!(attrs[1].higher_is_better, None);
    }

    #[test]
    fn test_drops_nameless_and_keeps_order() {
        let pool = Pool::new(vec![
            json!("Damage"),                                       // 0
            json!({"id": 99}),                                     // 1 descriptor without name
            json!("/images/icons/stat.webp"),                      // 2
            json!("Range"),                                        // 3
        ]);
        let resolver = Resolver::new(&pool);
        let list = json!([
            {"key": "a", "attribute": 0, "value": 5},
            {"key": "b", "attribute": 1, "value": 6},
            {"key": "c", "attribute": 2, "value": 7},
            "not a tuple",
            {"key": "d", "attribute": 3, "value": 8},
            {"key": "e", "value": 9}
        ]);

        let attrs = humanize_attribute_values(&resolver, &list);
        let names: Vec<_> = attrs.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["Damage", "Range"]);
    }

    #[test]
    fn test_non_numeric_value_kept_raw() {
        let pool = Pool::new(vec![json!("Charges")]);
        let resolver = Resolver::new(&pool);
        let list = json!([
            {"key": "a", "attribute": 0, "value": {"min": 1, "max": 3}},
            {"key": "b", "attribute": 0}
        ]);

        let attrs = humanize_attribute_values(&resolver, &list);
        assert_eq!(attrs[0].value, json!({"min": 1, "max": 3}));
        assert_eq!(attrs[1].value, Value::Null);
    }

    #[test]
    fn test_non_list_is_empty() {
        let pool = Pool::new(vec![json!({"not": "a list"})]);
        let resolver = Resolver::new(&pool);
        assert!(humanize_attribute_values(&resolver, &json!(0)).is_empty());
        assert!(humanize_attribute_values(&resolver, &json!(null)).is_empty());
    }
}
