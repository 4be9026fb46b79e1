use anyhow::{anyhow, Result};
use serde_json::Value;

use crate::models::listing::Listing;

/// Turns a page payload into listings. Items without an `id` are skipped,
/// every other field falls back to its zero value when missing or malformed.
pub fn extract_listings(payload: &Value) -> Result<Vec<Listing>> {
    let items = payload
        .get("items")
        .and_then(Value::as_array)
        .ok_or_else(|| anyhow!("payload has no items array"))?;

    let listings = items
        .iter()
        .filter(|item| item.get("id").is_some())
        .map(item_into_listing)
        .collect();

    Ok(listings)
}

fn item_into_listing(item: &Value) -> Listing {
    Listing {
        id: parse_int(item.get("id")),
        title: string_field(item, &["title"]),
        active: bool_field(item, "active"),
        accepts_trade: bool_field(item, "acceptTrade"),
        pet_friendly: bool_field(item, "petFriendly"),
        description: string_field(item, &["description"]),
        total_area: parse_float(nested(item, &["area", "total"])),
        useful_area: parse_float(nested(item, &["area", "useful"])),
        category: string_field(item, &["category"]),
        price: parse_float(nested(item, &["prices", "rawPrice"])),
        price_formatted: string_field(item, &["prices", "main"]),
        iptu: string_field(item, &["prices", "iptuValue"]),
        images: images(item),
        transaction: string_field(item, &["transaction"]),
        bedrooms: extract_count(item, "bedrooms"),
        suites: parse_int(nested(item, &["suites", "count"])),
        bathrooms: parse_int(nested(item, &["bathrooms", "count"])),
        garages: parse_int(nested(item, &["garages", "count"])),
        latitude: extract_coordinate(item, "lat"),
        longitude: extract_coordinate(item, "lon"),
        street: extract_location(item, "street"),
        neighborhood: extract_location(item, "neighborhood"),
        city: extract_location(item, "city"),
        state: extract_location(item, "state"),
        zip_code: extract_location(item, "zipCode"),
        updated_at: string_field(item, &["updatedAt"]),
    }
}

fn nested<'a>(item: &'a Value, path: &[&str]) -> Option<&'a Value> {
    path.iter().try_fold(item, |value, key| value.get(*key))
}

fn string_field(item: &Value, path: &[&str]) -> String {
    nested(item, path)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

fn bool_field(item: &Value, key: &str) -> bool {
    item.get(key).and_then(Value::as_bool).unwrap_or(false)
}

fn images(item: &Value) -> Vec<String> {
    nested(item, &["pictures", "list"])
        .and_then(Value::as_array)
        .map(|list| {
            list.iter()
                .filter_map(Value::as_str)
                .map(String::from)
                .collect()
        })
        .unwrap_or_default()
}

/// Integers pass through, floats are truncated, numeric strings are parsed.
/// Everything else is 0.
fn parse_int(value: Option<&Value>) -> i64 {
    match value {
        Some(Value::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))
            .unwrap_or(0),
        Some(Value::String(s)) => s.trim().parse().unwrap_or(0),
        _ => 0,
    }
}

/// Numbers pass through, strings are parsed after turning `,` into `.`.
///
/// The replacement is naive, so `"1.234,56"` becomes `"1.234.56"` and
/// yields 0.0.
pub fn parse_float(value: Option<&Value>) -> f64 {
    match value {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
        Some(Value::String(s)) => s.trim().replace(',', ".").parse().unwrap_or(0.0),
        _ => 0.0,
    }
}

/// Reads `location.<prop_name>`, which is either a plain value or an
/// object carrying a `name`.
pub fn extract_location(item: &Value, prop_name: &str) -> String {
    let prop = match item.get("location").and_then(|location| location.get(prop_name)) {
        Some(prop) => prop,
        None => return String::new(),
    };

    match prop {
        Value::Object(map) => match map.get("name") {
            Some(name) => scalar_to_string(name),
            None => String::new(),
        },
        other => scalar_to_string(other),
    }
}

fn scalar_to_string(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.trim().to_string(),
        other => other.to_string().trim().to_string(),
    }
}

/// Reads `location.geoposition.<prop_name>` as a float.
pub fn extract_coordinate(item: &Value, prop_name: &str) -> f64 {
    match nested(item, &["location", "geoposition", prop_name]) {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
        Some(Value::String(s)) => s.trim().parse().unwrap_or(0.0),
        _ => 0.0,
    }
}

/// Bedroom-like counts come as `{count, max}`; a range prefers its `max`.
pub fn extract_count(item: &Value, prop_name: &str) -> i64 {
    let prop = item.get(prop_name);
    let count = prop.and_then(|p| p.get("count"));
    let max = prop.and_then(|p| p.get("max"));

    if is_zero(count) && is_zero(max) {
        return 0;
    }

    if let Some(max) = max.and_then(Value::as_i64) {
        return max;
    }

    match count {
        Some(Value::Number(n)) if n.as_i64().is_some() => n.as_i64().unwrap_or(0),
        Some(Value::String(s)) => s.trim().parse().unwrap_or(0),
        _ => 0,
    }
}

// Absent counts as zero.
fn is_zero(value: Option<&Value>) -> bool {
    match value {
        None => true,
        Some(v) => v.as_f64() == Some(0.0),
    }
}
