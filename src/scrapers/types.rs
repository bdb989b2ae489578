use crate::models::{PropertyType, SortOption};
use serde::{Deserialize, Serialize};

/// Search filters applied to a result page.
///
/// Unset, zero and empty values are never sent, so there is no way to ask
/// for an explicit zero.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct FilterSet {
    /// Location codes, sent as repeated `location=` parameters
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub location: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price_from: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price_to: Option<u64>,
    /// Area in square meters
    #[serde(skip_serializing_if = "Option::is_none")]
    pub area_from: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub area_to: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub no_of_bedrooms_from: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub no_of_bedrooms_to: Option<u32>,
    /// Property type codes, sent as repeated parameters
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub property_type: Vec<String>,
    #[serde(default, skip_serializing_if = "is_relevance")]
    pub sort: SortOption,
    /// Published-within bucket (1 = today, 2 = three days, 3 = a week, ...)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub published: Option<u32>,
    /// Monthly rent bounds, lettings only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rent_from: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rent_to: Option<u64>,
    /// Free-text keyword search
    #[serde(skip_serializing_if = "Option::is_none")]
    pub q: Option<String>,
}

fn is_relevance(sort: &SortOption) -> bool {
    *sort == SortOption::Relevance
}

impl FilterSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a location code
    pub fn location(mut self, code: impl Into<String>) -> Self {
        self.location.push(code.into());
        self
    }

    pub fn locations<I, S>(mut self, codes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.location.extend(codes.into_iter().map(Into::into));
        self
    }

    pub fn price(mut self, from: Option<u64>, to: Option<u64>) -> Self {
        self.price_from = from;
        self.price_to = to;
        self
    }

    pub fn area(mut self, from: Option<u64>, to: Option<u64>) -> Self {
        self.area_from = from;
        self.area_to = to;
        self
    }

    pub fn bedrooms(mut self, from: Option<u32>, to: Option<u32>) -> Self {
        self.no_of_bedrooms_from = from;
        self.no_of_bedrooms_to = to;
        self
    }

    pub fn rent(mut self, from: Option<u64>, to: Option<u64>) -> Self {
        self.rent_from = from;
        self.rent_to = to;
        self
    }

    pub fn property_type(mut self, kind: PropertyType) -> Self {
        self.property_type.push(kind.code().to_string());
        self
    }

    /// Add a raw property type code
    pub fn property_type_code(mut self, code: impl Into<String>) -> Self {
        self.property_type.push(code.into());
        self
    }

    pub fn sort(mut self, sort: SortOption) -> Self {
        self.sort = sort;
        self
    }

    pub fn published(mut self, bucket: u32) -> Self {
        self.published = Some(bucket);
        self
    }

    pub fn query(mut self, q: impl Into<String>) -> Self {
        self.q = Some(q.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn echo_omits_unset_filters() {
        let filters = FilterSet::new().location("0.20061").price(Some(5000), None);
        let value = serde_json::to_value(&filters).unwrap();

        assert_eq!(
            value,
            serde_json::json!({ "location": ["0.20061"], "price_from": 5000 })
        );
    }

    #[test]
    fn builders_append_in_order() {
        let filters = FilterSet::new()
            .locations(["0.20061", "0.20003"])
            .property_type(PropertyType::Apartment)
            .property_type_code("3");

        assert_eq!(filters.location, vec!["0.20061", "0.20003"]);
        assert_eq!(filters.property_type, vec!["1", "3"]);
    }
}
