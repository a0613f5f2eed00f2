//! Dual-spelling field alias table.
//!
//! The client application submits camelCase names; a compatibility alias in
//! snake_case is accepted for every field. Adding a field is a data change
//! here, not new merge code.

use serde_json::Value;

/// How a merged value is coerced before being written back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Coercion {
    /// Pass the value through unchanged.
    Text,
    /// Parse integers out of numbers or numeric strings.
    Integer,
    /// Parse floats out of numbers or numeric strings.
    Number,
    /// Truthy/falsy interpretation; unresolvable values pass through and the
    /// boolean-defaults pass settles them.
    Boolean,
}

/// One logical attribute with two accepted spellings.
#[derive(Debug, Clone, Copy)]
pub struct FieldAlias {
    pub canonical: &'static str,
    pub alias: &'static str,
    pub coerce: Coercion,
}

const fn alias(canonical: &'static str, alias: &'static str, coerce: Coercion) -> FieldAlias {
    FieldAlias {
        canonical,
        alias,
        coerce,
    }
}

/// Every dual-spelled property attribute.
pub const FIELD_ALIASES: &[FieldAlias] = &[
    alias("propertyType", "property_type", Coercion::Text),
    alias("listingType", "listing_type", Coercion::Text),
    alias("buildingType", "building_type", Coercion::Text),
    alias("priceType", "price_type", Coercion::Text),
    alias("floorNumber", "floor_number", Coercion::Integer),
    alias("totalFloors", "total_floors", Coercion::Integer),
    alias("roomCount", "room_count", Coercion::Integer),
    alias("bathroomCount", "bathroom_count", Coercion::Integer),
    alias("parkingSpaces", "parking_spaces", Coercion::Integer),
    alias("yearBuilt", "year_built", Coercion::Integer),
    alias("lotSize", "lot_size", Coercion::Number),
    alias("livingArea", "living_area", Coercion::Number),
    alias("maintenanceFee", "maintenance_fee", Coercion::Number),
    alias("isFeatured", "is_featured", Coercion::Boolean),
    alias("isAvailable", "is_available", Coercion::Boolean),
    alias("mainImage", "main_image", Coercion::Text),
    alias("contactPhone", "contact_phone", Coercion::Text),
    alias("virtualTourUrl", "virtual_tour_url", Coercion::Text),
];

/// Apply a coercion. Values that cannot be coerced pass through unchanged;
/// the normalizer reconciles names, the validation rules judge content.
pub fn coerce(value: Value, coercion: Coercion) -> Value {
    match coercion {
        Coercion::Text => value,
        Coercion::Integer => match coerce_integer(&value) {
            Some(n) => Value::from(n),
            None => value,
        },
        Coercion::Number => match coerce_number(&value) {
            Some(n) => Value::from(n),
            None => value,
        },
        Coercion::Boolean => match coerce_boolean(&value) {
            Some(b) => Value::from(b),
            None => value,
        },
    }
}

/// Integer out of a JSON number or a numeric string.
pub fn coerce_integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
}

/// Float out of a JSON number or a numeric string.
pub fn coerce_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

/// Truthy: `"1"`, `true`, `1`. Falsy: `"0"`, `false`, `0`. Anything else is
/// unresolved and left to the field's default.
pub fn coerce_boolean(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => match n.as_i64() {
            Some(1) => Some(true),
            Some(0) => Some(false),
            _ => None,
        },
        Value::String(s) => match s.as_str() {
            "1" => Some(true),
            "0" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_integer_coercion() {
        assert_eq!(coerce_integer(&json!(7)), Some(7));
        assert_eq!(coerce_integer(&json!("12")), Some(12));
        assert_eq!(coerce_integer(&json!(" 3 ")), Some(3));
        assert_eq!(coerce_integer(&json!("three")), None);
        assert_eq!(coerce_integer(&json!(null)), None);
    }

    #[test]
    fn test_boolean_coercion() {
        assert_eq!(coerce_boolean(&json!(true)), Some(true));
        assert_eq!(coerce_boolean(&json!(1)), Some(true));
        assert_eq!(coerce_boolean(&json!("1")), Some(true));
        assert_eq!(coerce_boolean(&json!("0")), Some(false));
        assert_eq!(coerce_boolean(&json!("yes")), None);
        assert_eq!(coerce_boolean(&json!(null)), None);
    }

    #[test]
    fn test_uncoercible_values_pass_through() {
        assert_eq!(coerce(json!("penthouse"), Coercion::Integer), json!("penthouse"));
        assert_eq!(coerce(json!("12"), Coercion::Integer), json!(12));
        assert_eq!(coerce(json!("2.5"), Coercion::Number), json!(2.5));
    }
}
