//! Scan search-page HTML for embedded listing objects.
//!
//! Result pages carry each listing as a serialized object starting with a
//! fixed run of fields (`type`, `id`, `main_search_key`, `heading`,
//! `location`). Those anchors are located with a regex; everything else is
//! read from the stretch of text between one anchor and the next. The
//! document itself is never parsed.

use crate::scrapers::traits::FragmentExtractor;
use regex::{Captures, Regex};
use serde_json::{json, Map, Value};
use std::collections::HashSet;
use std::sync::LazyLock;
use tracing::debug;

/// Loosely typed listing as pulled out of the page
pub type RawListing = Map<String, Value>;

/// Start of every listing object
const ANCHOR_PREFIX: &str = r#"{"type":"realestate""#;

/// Window used for the last listing on a page, where no next anchor bounds it.
/// Large enough for one listing's image and flags.
const FALLBACK_WINDOW: usize = 2000;

// A JSON string body, escapes included
pub(crate) const JSON_STR: &str = r#"((?:[^"\\]|\\.)*)"#;

#[allow(clippy::expect_used)]
static ANCHOR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r#"\{{"type":"realestate","id":"(\d+)","main_search_key":{s},"heading":{s},"location":{s}"#,
        s = format!(r#""{}""#, JSON_STR)
    ))
    .expect("valid regex")
});

#[allow(clippy::expect_used)]
static IMAGE_OBJECT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""image":\{([^{}]*)"#).expect("valid regex"));

#[allow(clippy::expect_used)]
static FLAGS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""flags":\[([^\]]*)\]"#).expect("valid regex"));

#[allow(clippy::expect_used)]
static LABELS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""labels":\[([^\]]*)\]"#).expect("valid regex"));

#[allow(clippy::expect_used)]
static QUOTED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&format!(r#""{}""#, JSON_STR)).expect("valid regex"));

/// One `"key":value` pair with a string or numeric value
#[allow(clippy::expect_used)]
static OBJECT_FIELD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r#""(\w+)":(?:"{}"|(-?[0-9]+(?:\.[0-9]+)?))"#,
        JSON_STR
    ))
    .expect("valid regex")
});

#[allow(clippy::expect_used)]
static PRICE_TOTAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""price_total":\{"amount":(\d+)"#).expect("valid regex"));

#[allow(clippy::expect_used)]
static PRICE_SUGGESTION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""price_suggestion":\{"amount":(\d+)"#).expect("valid regex"));

#[allow(clippy::expect_used)]
static AREA_RANGE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""area_range":\{([^{}]*)"#).expect("valid regex"));

#[allow(clippy::expect_used)]
static BEDROOMS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""number_of_bedrooms":(\d+)"#).expect("valid regex"));

#[allow(clippy::expect_used)]
static PROPERTY_TYPE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r#""property_type_description":"{}""#, JSON_STR)).expect("valid regex")
});

#[allow(clippy::expect_used)]
static TIMESTAMP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""timestamp":(\d+)"#).expect("valid regex"));

/// Default extractor: anchor regex plus bounded windows
#[derive(Debug, Default, Clone, Copy)]
pub struct AnchorScanner;

impl FragmentExtractor for AnchorScanner {
    fn extract_fragments(&self, html: &str) -> Vec<RawListing> {
        extract_fragments(html)
    }
}

/// Pull every distinct listing out of a result page, in page order.
///
/// A listing id seen twice keeps its first occurrence only.
pub fn extract_fragments(html: &str) -> Vec<RawListing> {
    let mut seen: HashSet<&str> = HashSet::new();
    let mut listings = Vec::new();

    for caps in ANCHOR.captures_iter(html) {
        let (Some(anchor), Some(id)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        if !seen.insert(id.as_str()) {
            continue;
        }

        let mut raw = RawListing::new();
        raw.insert("id".into(), json!(id.as_str()));
        raw.insert("main_search_key".into(), json!(group_text(&caps, 2)));
        raw.insert("heading".into(), json!(group_text(&caps, 3)));
        raw.insert("location".into(), json!(group_text(&caps, 4)));

        let window = fragment_window(html, anchor.start(), anchor.end());
        extract_window_fields(window, &mut raw);

        listings.push(raw);
    }

    debug!("Extracted {} listings from HTML", listings.len());
    listings
}

/// Text belonging to the listing whose anchor spans `start..anchor_end`
fn fragment_window(html: &str, start: usize, anchor_end: usize) -> &str {
    let end = match html[anchor_end..].find(ANCHOR_PREFIX) {
        Some(offset) => anchor_end + offset,
        None => {
            let mut end = start.saturating_add(FALLBACK_WINDOW).min(html.len());
            while !html.is_char_boundary(end) {
                end -= 1;
            }
            end.max(anchor_end)
        }
    };
    &html[start..end]
}

fn extract_window_fields(window: &str, raw: &mut RawListing) {
    if let Some(image) = extract_image(window) {
        raw.insert("image".into(), image);
    }

    let flags = FLAGS
        .captures(window)
        .map(|caps| quoted_strings(caps.get(1).map_or("", |m| m.as_str())))
        .unwrap_or_default();
    raw.insert("flags".into(), json!(flags));

    if let Some(amount) = capture_u64(&PRICE_TOTAL, window) {
        raw.insert("price_total".into(), json!(amount));
        raw.insert("price".into(), json!(format_amount(amount)));
    }
    if let Some(amount) = capture_u64(&PRICE_SUGGESTION, window) {
        raw.insert("price_suggestion".into(), json!(format_amount(amount)));
    }
    if let Some(area) = extract_area(window) {
        raw.insert("area".into(), json!(area));
    }
    if let Some(bedrooms) = capture_u64(&BEDROOMS, window) {
        raw.insert("bedrooms".into(), json!(bedrooms));
    }
    if let Some(caps) = PROPERTY_TYPE.captures(window) {
        raw.insert("property_type".into(), json!(group_text(&caps, 1)));
    }
    if let Some(caps) = TIMESTAMP.captures(window) {
        raw.insert("timestamp".into(), json!(group_text(&caps, 1)));
    }
    if let Some(caps) = LABELS.captures(window) {
        let body = caps.get(1).map_or("", |m| m.as_str());
        let labels: Vec<String> = ObjectFields::parse(body).strings("text").collect();
        if !labels.is_empty() {
            raw.insert("labels".into(), json!(labels));
        }
    }
}

/// The nested `image` object. Its fields are read independently; only the
/// url is needed for an image to count.
fn extract_image(window: &str) -> Option<Value> {
    let body = IMAGE_OBJECT.captures(window)?.get(1)?.as_str();
    let fields = ObjectFields::parse(body);
    let url = fields.string("url")?;

    let mut image = Map::new();
    image.insert("url".into(), json!(url));
    if let Some(path) = fields.string("path") {
        image.insert("path".into(), json!(path));
    }
    for key in ["width", "height"] {
        if let Some(n) = fields.number(key).and_then(|n| n.parse::<u64>().ok()) {
            image.insert(key.into(), json!(n));
        }
    }
    if let Some(ratio) = fields.number("aspect_ratio").and_then(|n| n.parse::<f64>().ok()) {
        image.insert("aspect_ratio".into(), json!(ratio));
    }
    Some(Value::Object(image))
}

fn extract_area(window: &str) -> Option<String> {
    let body = AREA_RANGE.captures(window)?.get(1)?.as_str();
    let fields = ObjectFields::parse(body);
    let from = fields.number("size_from")?;
    let unit = fields.string("unit").unwrap_or_else(|| "m²".to_string());

    match fields.number("size_to") {
        Some(to) if to != from => Some(format!("{}-{} {}", from, to, unit)),
        _ => Some(format!("{} {}", from, unit)),
    }
}

/// A value inside a flat object body, as written
#[derive(Debug, Clone, Copy, PartialEq)]
enum FieldValue<'a> {
    /// String contents, escapes not yet decoded
    Text(&'a str),
    Number(&'a str),
}

/// The `"key":value` pairs of a flat object body, read in a single pass.
///
/// Nested objects and arrays are skipped over rather than descended into.
struct ObjectFields<'a> {
    fields: Vec<(&'a str, FieldValue<'a>)>,
}

impl<'a> ObjectFields<'a> {
    fn parse(body: &'a str) -> Self {
        let fields = OBJECT_FIELD
            .captures_iter(body)
            .filter_map(|caps| {
                let key = caps.get(1)?.as_str();
                let value = match (caps.get(2), caps.get(3)) {
                    (Some(text), _) => FieldValue::Text(text.as_str()),
                    (None, Some(number)) => FieldValue::Number(number.as_str()),
                    (None, None) => return None,
                };
                Some((key, value))
            })
            .collect();
        Self { fields }
    }

    fn values<'s>(&'s self, key: &'s str) -> impl Iterator<Item = FieldValue<'a>> + 's {
        self.fields
            .iter()
            .filter(move |(k, _)| *k == key)
            .map(|(_, value)| *value)
    }

    /// First string value under `key`, decoded
    fn string(&self, key: &str) -> Option<String> {
        self.strings(key).next()
    }

    /// Every string value under `key`, in order
    fn strings<'s>(&'s self, key: &'s str) -> impl Iterator<Item = String> + 's {
        self.values(key).filter_map(|value| match value {
            FieldValue::Text(text) => Some(unescape(text)),
            FieldValue::Number(_) => None,
        })
    }

    /// First numeric value under `key`, as written
    fn number(&self, key: &str) -> Option<&'a str> {
        self.values(key).find_map(|value| match value {
            FieldValue::Number(number) => Some(number),
            FieldValue::Text(_) => None,
        })
    }
}

fn capture_u64(re: &Regex, window: &str) -> Option<u64> {
    re.captures(window)?.get(1)?.as_str().parse().ok()
}

fn quoted_strings(list: &str) -> Vec<String> {
    QUOTED
        .captures_iter(list)
        .filter_map(|caps| caps.get(1).map(|m| unescape(m.as_str())))
        .filter(|s| !s.is_empty())
        .collect()
}

fn group_text(caps: &Captures<'_>, index: usize) -> String {
    caps.get(index).map(|m| unescape(m.as_str())).unwrap_or_default()
}

/// Decode JSON string escapes, keeping the raw text if it does not decode
pub(crate) fn unescape(s: &str) -> String {
    if !s.contains('\\') {
        return s.to_string();
    }
    serde_json::from_str::<String>(&format!("\"{}\"", s)).unwrap_or_else(|_| s.to_string())
}

/// `12500` -> `12 500 kr`
pub(crate) fn format_amount(amount: u64) -> String {
    let digits = amount.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(' ');
        }
        grouped.push(ch);
    }
    grouped.push_str(" kr");
    grouped
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fragment(id: &str, heading: &str, tail: &str) -> String {
        format!(
            r#"{{"type":"realestate","id":"{}","main_search_key":"SEARCH_ID_REALESTATE_LETTINGS","heading":"{}","location":"Oslo"{}}}"#,
            id, heading, tail
        )
    }

    #[test]
    fn adjacent_fragments_do_not_bleed() {
        let html = format!(
            r#"<script>{}{}</script>"#,
            r#"{"type":"realestate","id":"123","main_search_key":"x","heading":"Flat","location":"Oslo"}"#,
            fragment(
                "456",
                "House",
                r#","image":{"url":"https://images.finncdn.no/456.jpg","path":"456.jpg","height":600,"width":800},"flags":["private"]"#
            )
        );

        let listings = extract_fragments(&html);
        assert_eq!(listings.len(), 2);
        assert_eq!(listings[0]["id"], "123");
        assert_eq!(listings[1]["id"], "456");

        assert!(listings[0].get("image").is_none());
        assert_eq!(listings[0]["flags"], json!([]));
        assert_eq!(listings[1]["flags"], json!(["private"]));
        assert_eq!(listings[1]["image"]["width"], 800);
    }

    #[test]
    fn duplicates_keep_first_occurrence() {
        let html = [
            fragment("1", "First", ""),
            fragment("2", "Second", ""),
            fragment("1", "First again", r#","flags":["late"]"#),
            fragment("3", "Third", ""),
            fragment("2", "Second again", ""),
        ]
        .concat();

        let listings = extract_fragments(&html);
        let ids: Vec<_> = listings.iter().map(|l| l["id"].as_str().unwrap()).collect();
        assert_eq!(ids, vec!["1", "2", "3"]);
        assert_eq!(listings[0]["heading"], "First");
        assert_eq!(listings[0]["flags"], json!([]));
    }

    #[test]
    fn image_fields_are_independent() {
        let html = fragment(
            "9",
            "Hytte",
            r#","image":{"aspect_ratio":1.5,"url":"https://images.finncdn.no/9.jpg","width":1600}"#,
        );

        let listings = extract_fragments(&html);
        let image = &listings[0]["image"];
        assert_eq!(image["url"], "https://images.finncdn.no/9.jpg");
        assert_eq!(image["width"], 1600);
        assert_eq!(image["aspect_ratio"], 1.5);
        assert!(image.get("height").is_none());
        assert!(image.get("path").is_none());
    }

    #[test]
    fn image_without_url_is_dropped() {
        let html = fragment("9", "Hytte", r#","image":{"path":"9.jpg","width":10}"#);
        let listings = extract_fragments(&html);
        assert!(listings[0].get("image").is_none());
    }

    #[test]
    fn picks_up_listing_extras() {
        let html = fragment(
            "77",
            "Leilighet",
            r#","timestamp":1700000000000,"price_suggestion":{"amount":3490000,"currency_code":"NOK"},"price_total":{"amount":3612000},"area_range":{"size_from":54,"size_to":54,"unit":"m²"},"number_of_bedrooms":2,"property_type_description":"Leilighet","labels":[{"id":"new","text":"Nyhet"},{"id":"visning","text":"Visning"}]"#,
        );

        let raw = &extract_fragments(&html)[0];
        assert_eq!(raw["price_total"], 3_612_000);
        assert_eq!(raw["price"], "3 612 000 kr");
        assert_eq!(raw["price_suggestion"], "3 490 000 kr");
        assert_eq!(raw["area"], "54 m²");
        assert_eq!(raw["bedrooms"], 2);
        assert_eq!(raw["property_type"], "Leilighet");
        assert_eq!(raw["timestamp"], "1700000000000");
        assert_eq!(raw["labels"], json!(["Nyhet", "Visning"]));
    }

    #[test]
    fn escaped_text_is_decoded() {
        let html = fragment("5", r#"Sjøutsikt \"penthouse\""#, "");
        let listings = extract_fragments(&html);
        assert_eq!(listings[0]["heading"], r#"Sjøutsikt "penthouse""#);
    }

    #[test]
    fn fallback_window_is_bounded() {
        let padding = "x".repeat(FALLBACK_WINDOW + 100);
        let html = format!(
            "{}{}{}",
            fragment("8", "Tomt", ""),
            padding,
            r#""flags":["far-away"]"#
        );

        let listings = extract_fragments(&html);
        assert_eq!(listings[0]["flags"], json!([]));
    }

    #[test]
    fn fallback_window_respects_char_boundaries() {
        let html = format!("{}{}", fragment("8", "Tomt", ""), "ø".repeat(FALLBACK_WINDOW));
        assert_eq!(extract_fragments(&html).len(), 1);
    }

    #[test]
    fn malformed_fragments_are_skipped() {
        let html = format!(
            r#"{{"type":"realestate","id":"abc","heading":"no"}} {{"type":"realestate","id":"1" {}"#,
            fragment("2", "Ok", "")
        );
        let listings = extract_fragments(&html);
        assert_eq!(listings.len(), 1);
        assert_eq!(listings[0]["id"], "2");
    }

    #[test]
    fn no_anchors_no_listings() {
        assert!(extract_fragments("<html><body>Ingen treff</body></html>").is_empty());
        assert!(extract_fragments("").is_empty());
    }

    #[test]
    fn object_fields_skip_keys_inside_strings() {
        let body = r#""path":"a\"url\":\"fake.jpg","url":"https://images.finncdn.no/real.jpg","width":800,"size_to":-1.5"#;
        let fields = ObjectFields::parse(body);

        assert_eq!(fields.string("url").as_deref(), Some("https://images.finncdn.no/real.jpg"));
        assert_eq!(fields.string("path").as_deref(), Some(r#"a"url":"fake.jpg"#));
        assert_eq!(fields.number("width"), Some("800"));
        assert_eq!(fields.number("size_to"), Some("-1.5"));
        assert_eq!(fields.number("url"), None);
        assert_eq!(fields.string("height"), None);
    }

    #[test]
    fn object_fields_collect_repeated_keys() {
        let body = r#"{"id":"new","text":"Nyhet"},{"id":"visning","text":"Visning \u00e5pen"}"#;
        let texts: Vec<String> = ObjectFields::parse(body).strings("text").collect();
        assert_eq!(texts, vec!["Nyhet", "Visning åpen"]);
    }

    #[test]
    fn formats_amounts_in_groups() {
        assert_eq!(format_amount(0), "0 kr");
        assert_eq!(format_amount(950), "950 kr");
        assert_eq!(format_amount(12_500), "12 500 kr");
        assert_eq!(format_amount(1_234_567), "1 234 567 kr");
    }
}
