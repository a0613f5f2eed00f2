//! Property submission normalization.
//!
//! # Responsibilities
//! - Merge the two accepted spellings of every attribute into one value and
//!   write BOTH keys back, since downstream validation rules reference both
//! - Collect indexed `features[n]` fields (or a JSON/array fallback)
//! - Derive defaults: `status`, `is_featured`, `is_available`, `price_type`
//!
//! # Design Decisions
//! - Pure, side-effect-free except logging: the canonical map is built once
//!   per request and handed straight to the validation rules.
//! - Merge precedence is camelCase ?? snake_case; a present camel value wins
//!   even when both spellings were submitted.

use serde_json::{Map, Value};

use crate::normalize::aliases::{coerce, coerce_boolean, coerce_integer, FIELD_ALIASES};

/// The normalized field map, one identical value per accepted spelling.
pub type CanonicalSubmission = Map<String, Value>;

/// Normalize a raw submission into its canonical shape.
pub fn normalize(raw: Map<String, Value>) -> CanonicalSubmission {
    let mut canonical = raw;

    merge_aliases(&mut canonical);
    collect_features(&mut canonical);
    apply_boolean_defaults(&mut canonical);
    apply_status_default(&mut canonical);
    apply_price_type_default(&mut canonical);

    canonical
}

/// For each aliased attribute: value = camelCase ?? snake_case, coerced, then
/// written under both spellings. Never leaves only one spelling populated.
fn merge_aliases(map: &mut Map<String, Value>) {
    for field in FIELD_ALIASES {
        let camel = map.get(field.canonical).filter(|v| !v.is_null()).cloned();
        let snake = map.get(field.alias).filter(|v| !v.is_null()).cloned();
        let Some(value) = camel.or(snake) else {
            continue;
        };
        let value = coerce(value, field.coerce);
        map.insert(field.canonical.to_string(), value.clone());
        map.insert(field.alias.to_string(), value);
    }
}

/// Collect repeated feature ids.
///
/// Indexed form fields `features[0]`, `features[1]`, … are probed from 0
/// until the first gap. Without indexed fields, a single `features` field is
/// accepted as a JSON-encoded string or a native array. Every surviving
/// value is coerced to an integer.
fn collect_features(map: &mut Map<String, Value>) {
    let mut collected: Vec<Value> = Vec::new();

    let mut index = 0;
    while let Some(value) = map.get(&format!("features[{}]", index)) {
        collected.push(value.clone());
        index += 1;
    }

    if collected.is_empty() {
        collected = match map.get("features") {
            Some(Value::Array(items)) => items.clone(),
            Some(Value::String(encoded)) => match serde_json::from_str::<Value>(encoded) {
                Ok(Value::Array(items)) => items,
                _ => Vec::new(),
            },
            _ => Vec::new(),
        };
    } else {
        // Drop the probed keys now that they are folded into one array.
        for i in 0..index {
            map.remove(&format!("features[{}]", i));
        }
    }

    if collected.is_empty() {
        return;
    }

    let features: Vec<Value> = collected
        .iter()
        .filter_map(coerce_integer)
        .map(Value::from)
        .collect();
    tracing::debug!(count = features.len(), "Collected property features");
    map.insert("features".to_string(), Value::Array(features));
}

/// `is_featured` defaults false; `is_available` defaults true, including when
/// present-but-null. Both accept `"1"`/`true`/`1` as true.
fn apply_boolean_defaults(map: &mut Map<String, Value>) {
    let featured = map
        .get("isFeatured")
        .or_else(|| map.get("is_featured"))
        .and_then(coerce_boolean)
        .unwrap_or(false);
    map.insert("isFeatured".to_string(), Value::from(featured));
    map.insert("is_featured".to_string(), Value::from(featured));

    let available = map
        .get("isAvailable")
        .or_else(|| map.get("is_available"))
        .and_then(coerce_boolean)
        .unwrap_or(true);
    map.insert("isAvailable".to_string(), Value::from(available));
    map.insert("is_available".to_string(), Value::from(available));
}

/// Every new submission awaits administrative approval: `status` defaults to
/// `pending` and an explicit client value is never overridden.
fn apply_status_default(map: &mut Map<String, Value>) {
    let missing = map.get("status").map(Value::is_null).unwrap_or(true);
    if missing {
        map.insert("status".to_string(), Value::from("pending"));
        tracing::debug!("Defaulted submission status to pending");
    }
}

/// `price_type` defaults from the listing type: monthly when renting, total
/// when selling. Applied only when the client supplied no price type.
fn apply_price_type_default(map: &mut Map<String, Value>) {
    let present = map
        .get("price_type")
        .or_else(|| map.get("priceType"))
        .map(|v| !v.is_null())
        .unwrap_or(false);
    if present {
        return;
    }

    let listing_type = map
        .get("listing_type")
        .or_else(|| map.get("listingType"))
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_default();
    let default = match listing_type.as_str() {
        "rent" => Some("monthly"),
        "sale" => Some("total"),
        _ => None,
    };

    if let Some(price_type) = default {
        map.insert("priceType".to_string(), Value::from(price_type));
        map.insert("price_type".to_string(), Value::from(price_type));
        tracing::debug!(listing_type = %listing_type, price_type, "Defaulted price type");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw(pairs: &[(&str, Value)]) -> Map<String, Value> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_snake_case_only_populates_both_spellings() {
        let out = normalize(raw(&[("property_type", json!("apartment"))]));
        assert_eq!(out["property_type"], "apartment");
        assert_eq!(out["propertyType"], "apartment");
    }

    #[test]
    fn test_camel_case_only_populates_both_spellings() {
        let out = normalize(raw(&[("floorNumber", json!("4"))]));
        assert_eq!(out["floorNumber"], 4);
        assert_eq!(out["floor_number"], 4);
    }

    #[test]
    fn test_camel_case_wins_when_both_present() {
        let out = normalize(raw(&[
            ("maintenanceFee", json!(120.5)),
            ("maintenance_fee", json!(99.0)),
        ]));
        assert_eq!(out["maintenance_fee"], 120.5);
        assert_eq!(out["maintenanceFee"], 120.5);
    }

    #[test]
    fn test_null_camel_falls_back_to_snake() {
        let out = normalize(raw(&[
            ("propertyType", json!(null)),
            ("property_type", json!("house")),
        ]));
        assert_eq!(out["propertyType"], "house");
    }

    #[test]
    fn test_indexed_features_probed_until_gap() {
        let out = normalize(raw(&[
            ("features[0]", json!("3")),
            ("features[1]", json!(5)),
            ("features[3]", json!(9)),
        ]));
        assert_eq!(out["features"], json!([3, 5]));
        assert!(!out.contains_key("features[0]"));
        // Beyond the gap, fields are left as submitted.
        assert!(out.contains_key("features[3]"));
    }

    #[test]
    fn test_features_fallback_accepts_json_string_and_array() {
        let out = normalize(raw(&[("features", json!("[1, 2, 3]"))]));
        assert_eq!(out["features"], json!([1, 2, 3]));

        let out = normalize(raw(&[("features", json!(["7", 8]))]));
        assert_eq!(out["features"], json!([7, 8]));
    }

    #[test]
    fn test_boolean_defaults() {
        let out = normalize(raw(&[]));
        assert_eq!(out["is_featured"], false);
        assert_eq!(out["is_available"], true);

        let out = normalize(raw(&[
            ("isFeatured", json!("1")),
            ("isAvailable", json!(null)),
        ]));
        assert_eq!(out["is_featured"], true);
        assert_eq!(out["isFeatured"], true);
        assert_eq!(out["is_available"], true);

        let out = normalize(raw(&[("is_available", json!("0"))]));
        assert_eq!(out["isAvailable"], false);
    }

    #[test]
    fn test_status_defaults_to_pending_without_overriding() {
        let out = normalize(raw(&[]));
        assert_eq!(out["status"], "pending");

        let out = normalize(raw(&[("status", json!("approved"))]));
        assert_eq!(out["status"], "approved");
    }

    #[test]
    fn test_price_type_derived_from_listing_type() {
        let out = normalize(raw(&[("listing_type", json!("rent"))]));
        assert_eq!(out["price_type"], "monthly");
        assert_eq!(out["priceType"], "monthly");

        let out = normalize(raw(&[("listingType", json!("sale"))]));
        assert_eq!(out["price_type"], "total");

        let out = normalize(raw(&[
            ("listing_type", json!("rent")),
            ("price_type", json!("weekly")),
        ]));
        assert_eq!(out["price_type"], "weekly");
    }
}
