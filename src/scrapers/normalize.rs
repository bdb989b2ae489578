use crate::error::{Result, ScrapeError};
use crate::models::{Image, ListingBasic, SearchType};
use crate::scrapers::fragments::RawListing;
use crate::scrapers::url::listing_url;
use serde_json::Value;

/// Turn a raw record into a typed listing.
///
/// The listing URL is always rebuilt from the id. Absent keys stay absent;
/// only `flags` and `labels` fall back to empty lists.
pub fn normalize_listing(
    raw: &RawListing,
    search_type: SearchType,
    base_url: &str,
) -> Result<ListingBasic> {
    let id = raw
        .get("id")
        .and_then(coerce_string)
        .filter(|id| !id.is_empty())
        .ok_or(ScrapeError::MissingRequiredField { field: "id" })?;

    let heading = raw.get("heading").and_then(coerce_string).unwrap_or_default();
    let location = raw.get("location").and_then(coerce_string).unwrap_or_default();
    let url = listing_url(base_url, search_type, &id);

    let mut listing = ListingBasic::new(id, heading, location, search_type, url);
    listing.image = raw.get("image").and_then(coerce_image);
    listing.price = raw.get("price").and_then(coerce_string);
    listing.price_total = raw.get("price_total").and_then(coerce_i64);
    listing.price_suggestion = raw.get("price_suggestion").and_then(coerce_string);
    listing.area = raw.get("area").and_then(coerce_string);
    listing.bedrooms = raw
        .get("bedrooms")
        .and_then(coerce_i64)
        .and_then(|n| u32::try_from(n).ok());
    listing.property_type = raw.get("property_type").and_then(coerce_string);
    listing.flags = raw.get("flags").map(coerce_strings).unwrap_or_default();
    listing.timestamp = raw.get("timestamp").and_then(coerce_string);
    listing.labels = raw.get("labels").map(coerce_strings).unwrap_or_default();

    Ok(listing)
}

fn coerce_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn coerce_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => {
            let digits: String = s.chars().filter(|c| !c.is_whitespace()).collect();
            digits.parse().ok()
        }
        _ => None,
    }
}

fn coerce_u32(value: &Value) -> Option<u32> {
    coerce_i64(value).and_then(|n| u32::try_from(n).ok())
}

fn coerce_strings(value: &Value) -> Vec<String> {
    match value {
        Value::Array(items) => items.iter().filter_map(coerce_string).collect(),
        Value::String(s) if !s.is_empty() => vec![s.clone()],
        _ => Vec::new(),
    }
}

fn coerce_image(value: &Value) -> Option<Image> {
    let object = value.as_object()?;
    let url = object.get("url").and_then(coerce_string)?;

    Some(Image {
        url,
        path: object.get("path").and_then(coerce_string),
        width: object.get("width").and_then(coerce_u32),
        height: object.get("height").and_then(coerce_u32),
        aspect_ratio: object.get("aspect_ratio").and_then(Value::as_f64),
    })
}
