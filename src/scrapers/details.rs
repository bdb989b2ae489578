use crate::models::{Image, ListingBasic, ListingDetails, SearchType};
use crate::scrapers::fragments::{unescape, JSON_STR};
use crate::scrapers::url::listing_url;
use regex::Regex;
use scraper::{Html, Selector};
use std::collections::HashSet;
use std::sync::LazyLock;
use tracing::debug;

/// `"key": "..."` with the string body captured, escaped quotes included
#[allow(clippy::expect_used)]
fn string_field(key: &str) -> Regex {
    Regex::new(&format!(r#""{}"\s*:\s*"{}""#, key, JSON_STR)).expect("valid regex")
}

static STREET_ADDRESS: LazyLock<Regex> = LazyLock::new(|| string_field("streetAddress"));

#[allow(clippy::expect_used)]
static POSTAL_CODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""postalCode"\s*:\s*"(\d+)""#).expect("valid regex"));

static CITY: LazyLock<Regex> = LazyLock::new(|| string_field("addressLocality"));

#[allow(clippy::expect_used)]
static LATITUDE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""latitude"\s*:\s*(-?[0-9.]+)"#).expect("valid regex"));

#[allow(clippy::expect_used)]
static LONGITUDE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""longitude"\s*:\s*(-?[0-9.]+)"#).expect("valid regex"));

#[allow(clippy::expect_used)]
static PRICE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""price"\s*:\s*(\d+)"#).expect("valid regex"));

static DESCRIPTION: LazyLock<Regex> = LazyLock::new(|| string_field("description"));

/// Images served from the listing CDN
#[allow(clippy::expect_used)]
static CDN_IMAGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#""image"\s*:\s*"(https://images\.finncdn\.no[^"]+)""#).expect("valid regex")
});

/// Read an ad page into a `ListingDetails`.
///
/// Each field comes from its own pass over the page and is left empty when
/// that pass finds nothing.
pub fn parse_listing_details(
    html: &str,
    listing_id: &str,
    search_type: SearchType,
    base_url: &str,
) -> ListingDetails {
    let heading = extract_heading(html).unwrap_or_default();
    let address = capture(&STREET_ADDRESS, html);
    let postal_code = capture(&POSTAL_CODE, html);
    let city = capture(&CITY, html);

    let location = [&address, &postal_code, &city]
        .into_iter()
        .flatten()
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(", ");

    let basic = ListingBasic {
        price_total: capture(&PRICE, html).and_then(|p| p.parse().ok()),
        ..ListingBasic::new(
            listing_id,
            heading,
            location,
            search_type,
            listing_url(base_url, search_type, listing_id),
        )
    };

    let mut details = ListingDetails::new(basic);
    details.address = address;
    details.postal_code = postal_code;
    details.city = city;
    details.latitude = capture(&LATITUDE, html).and_then(|v| v.parse().ok());
    details.longitude = capture(&LONGITUDE, html).and_then(|v| v.parse().ok());
    details.description = capture(&DESCRIPTION, html);
    details.images = extract_images(html);

    debug!(
        "Parsed details for {}: {} images, address {:?}",
        listing_id,
        details.images.len(),
        details.address
    );

    details
}

/// Text of the first `<h1>`
fn extract_heading(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    let selector = Selector::parse("h1").ok()?;
    let text = document
        .select(&selector)
        .next()?
        .text()
        .collect::<String>();
    let text = text.split_whitespace().collect::<Vec<_>>().join(" ");
    (!text.is_empty()).then_some(text)
}

/// Gallery images in page order, each URL once
fn extract_images(html: &str) -> Vec<Image> {
    let mut seen = HashSet::new();
    CDN_IMAGE
        .captures_iter(html)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str())
        .filter(|url| seen.insert(*url))
        .map(Image::new)
        .collect()
}

fn capture(re: &Regex, html: &str) -> Option<String> {
    re.captures(html)
        .and_then(|caps| caps.get(1))
        .map(|m| unescape(m.as_str()).trim().to_string())
        .filter(|s| !s.is_empty())
}
