use serde::{Deserialize, Serialize};
use std::fmt;

/// Market segment a listing belongs to
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum SearchType {
    Lettings,
    Homes,
    Newbuildings,
    Plots,
    Commercial,
    Leisure,
}

impl SearchType {
    pub const ALL: [SearchType; 6] = [
        SearchType::Lettings,
        SearchType::Homes,
        SearchType::Newbuildings,
        SearchType::Plots,
        SearchType::Commercial,
        SearchType::Leisure,
    ];

    /// Tag used in listing URLs and in serialized output
    pub fn as_str(&self) -> &'static str {
        match self {
            SearchType::Lettings => "lettings",
            SearchType::Homes => "homes",
            SearchType::Newbuildings => "newbuildings",
            SearchType::Plots => "plots",
            SearchType::Commercial => "commercial",
            SearchType::Leisure => "leisure",
        }
    }

    /// Path of the search page. Leisure is served from `leisuresale`.
    pub fn search_path(&self) -> &'static str {
        match self {
            SearchType::Lettings => "/realestate/lettings/search.html",
            SearchType::Homes => "/realestate/homes/search.html",
            SearchType::Newbuildings => "/realestate/newbuildings/search.html",
            SearchType::Plots => "/realestate/plots/search.html",
            SearchType::Commercial => "/realestate/commercial/search.html",
            SearchType::Leisure => "/realestate/leisuresale/search.html",
        }
    }

    /// Parse a category tag, case-insensitively
    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(tag))
    }
}

impl fmt::Display for SearchType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Property type codes accepted by the `property_type` filter
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum PropertyType {
    Apartment,
    Townhouse,
    Detached,
    SemiDetached,
    Other,
}

impl PropertyType {
    pub fn code(&self) -> &'static str {
        match self {
            PropertyType::Apartment => "1",
            PropertyType::Townhouse => "2",
            PropertyType::Detached => "3",
            PropertyType::SemiDetached => "4",
            PropertyType::Other => "5",
        }
    }
}

/// Result ordering
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SortOption {
    /// Server default; never serialized into the query
    #[default]
    Relevance,
    PublishedDesc,
    PublishedAsc,
    PriceDesc,
    PriceAsc,
}

impl SortOption {
    pub fn as_param(&self) -> &'static str {
        match self {
            SortOption::Relevance => "",
            SortOption::PublishedDesc => "PUBLISHED_DESC",
            SortOption::PublishedAsc => "PUBLISHED_ASC",
            SortOption::PriceDesc => "PRICE_DESC",
            SortOption::PriceAsc => "PRICE_ASC",
        }
    }
}

/// Image attached to a listing
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Image {
    pub url: String,
    pub path: Option<String>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub aspect_ratio: Option<f64>,
}

impl Image {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            path: None,
            width: None,
            height: None,
            aspect_ratio: None,
        }
    }
}

/// Listing as it appears on a search result page
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ListingBasic {
    pub id: String,
    pub heading: String,
    pub location: String,
    pub search_type: SearchType,
    pub url: String,
    pub image: Option<Image>,
    pub price: Option<String>,
    pub price_total: Option<i64>,
    pub price_suggestion: Option<String>,
    pub area: Option<String>,
    pub bedrooms: Option<u32>,
    pub property_type: Option<String>,
    #[serde(default)]
    pub flags: Vec<String>,
    pub timestamp: Option<String>,
    #[serde(default)]
    pub labels: Vec<String>,
}

impl ListingBasic {
    /// Listing with only the always-present fields set
    pub fn new(
        id: impl Into<String>,
        heading: impl Into<String>,
        location: impl Into<String>,
        search_type: SearchType,
        url: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            heading: heading.into(),
            location: location.into(),
            search_type,
            url: url.into(),
            image: None,
            price: None,
            price_total: None,
            price_suggestion: None,
            area: None,
            bedrooms: None,
            property_type: None,
            flags: Vec::new(),
            timestamp: None,
            labels: Vec::new(),
        }
    }
}

/// Full listing as extracted from an ad page.
///
/// Anything the page did not reveal stays `None` or empty.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ListingDetails {
    #[serde(flatten)]
    pub basic: ListingBasic,
    pub description: Option<String>,
    pub address: Option<String>,
    pub postal_code: Option<String>,
    pub city: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub floor: Option<String>,
    pub total_floors: Option<u32>,
    pub year_built: Option<u32>,
    pub energy_label: Option<String>,
    pub ownership_type: Option<String>,
    #[serde(default)]
    pub facilities: Vec<String>,
    pub contact_name: Option<String>,
    pub contact_phone: Option<String>,
    pub agency_name: Option<String>,
    #[serde(default)]
    pub images: Vec<Image>,
    #[serde(default)]
    pub viewing_dates: Vec<String>,
    pub common_costs: Option<i64>,
    pub deposit: Option<i64>,
}

impl ListingDetails {
    pub fn new(basic: ListingBasic) -> Self {
        Self {
            basic,
            description: None,
            address: None,
            postal_code: None,
            city: None,
            latitude: None,
            longitude: None,
            floor: None,
            total_floors: None,
            year_built: None,
            energy_label: None,
            ownership_type: None,
            facilities: Vec::new(),
            contact_name: None,
            contact_phone: None,
            agency_name: None,
            images: Vec::new(),
            viewing_dates: Vec::new(),
            common_costs: None,
            deposit: None,
        }
    }
}

/// One page of search results
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SearchResults {
    pub items: Vec<ListingBasic>,
    /// Count reported by the page; zero when it could not be read
    pub total_count: u64,
    pub page: u32,
    pub per_page: u32,
    /// Derived from `total_count`, so only as good as that number
    pub has_next_page: bool,
    pub search_type: SearchType,
    pub filters_applied: crate::scrapers::types::FilterSet,
}

impl SearchResults {
    pub fn total_pages(&self) -> u64 {
        total_pages(self.total_count, self.per_page)
    }
}

/// `ceil(total / per_page)`, zero for an empty result set
pub fn total_pages(total_count: u64, per_page: u32) -> u64 {
    if total_count == 0 || per_page == 0 {
        return 0;
    }
    total_count.div_ceil(u64::from(per_page))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_type_tags_round_trip() {
        for t in SearchType::ALL {
            assert_eq!(SearchType::from_tag(t.as_str()), Some(t));
        }
        assert_eq!(SearchType::from_tag("HOMES"), Some(SearchType::Homes));
        assert_eq!(SearchType::from_tag("boats"), None);
    }

    #[test]
    fn leisure_searches_leisuresale() {
        assert_eq!(SearchType::Leisure.as_str(), "leisure");
        assert!(SearchType::Leisure.search_path().contains("leisuresale"));
    }

    #[test]
    fn total_pages_rounds_up() {
        assert_eq!(total_pages(0, 51), 0);
        assert_eq!(total_pages(1, 51), 1);
        assert_eq!(total_pages(51, 51), 1);
        assert_eq!(total_pages(52, 51), 2);
    }

    #[test]
    fn details_serialize_flat() {
        let basic = ListingBasic::new(
            "42",
            "Flat",
            "Oslo",
            SearchType::Homes,
            "https://www.finn.no/realestate/homes/ad.html?finnkode=42",
        );
        let mut details = ListingDetails::new(basic);
        details.images.push(Image::new("https://images.finncdn.no/a.jpg"));

        let value = serde_json::to_value(&details).unwrap();
        assert_eq!(value["id"], "42");
        assert_eq!(value["search_type"], "homes");
        assert_eq!(value["images"][0]["url"], "https://images.finncdn.no/a.jpg");
        assert!(value["images"][0]["width"].is_null());
    }
}
