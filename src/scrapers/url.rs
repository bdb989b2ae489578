use crate::models::SearchType;
use crate::scrapers::types::FilterSet;

/// Build the search URL for one result page.
///
/// Page 1 is the bare search path. Parameters come out in a fixed order so
/// the same filters always give the same URL.
pub fn build_search_url(
    base_url: &str,
    search_type: SearchType,
    page: u32,
    filters: &FilterSet,
) -> String {
    let mut params: Vec<(&str, String)> = Vec::new();

    if page > 1 {
        params.push(("page", page.to_string()));
    }

    push_codes(&mut params, "location", &filters.location);
    push_number(&mut params, "price_from", filters.price_from);
    push_number(&mut params, "price_to", filters.price_to);
    push_number(&mut params, "area_from", filters.area_from);
    push_number(&mut params, "area_to", filters.area_to);
    push_number(&mut params, "no_of_bedrooms_from", filters.no_of_bedrooms_from.map(u64::from));
    push_number(&mut params, "no_of_bedrooms_to", filters.no_of_bedrooms_to.map(u64::from));
    push_codes(&mut params, "property_type", &filters.property_type);

    let sort = filters.sort.as_param();
    if !sort.is_empty() {
        params.push(("sort", sort.to_string()));
    }

    push_number(&mut params, "published", filters.published.map(u64::from));

    if search_type == SearchType::Lettings {
        push_number(&mut params, "rent_from", filters.rent_from);
        push_number(&mut params, "rent_to", filters.rent_to);
    }

    if let Some(q) = filters.q.as_deref().filter(|q| !q.is_empty()) {
        params.push(("q", urlencoding::encode(q).into_owned()));
    }

    let mut url = format!("{}{}", base_url, search_type.search_path());
    if !params.is_empty() {
        let query: Vec<String> = params
            .iter()
            .map(|(key, value)| format!("{}={}", key, value))
            .collect();
        url.push('?');
        url.push_str(&query.join("&"));
    }

    url
}

/// URL of a listing's ad page
pub fn listing_url(base_url: &str, search_type: SearchType, id: &str) -> String {
    format!(
        "{}/realestate/{}/ad.html?finnkode={}",
        base_url,
        search_type.as_str(),
        id
    )
}

fn push_number(params: &mut Vec<(&'static str, String)>, key: &'static str, value: Option<u64>) {
    if let Some(v) = value.filter(|v| *v != 0) {
        params.push((key, v.to_string()));
    }
}

fn push_codes(params: &mut Vec<(&'static str, String)>, key: &'static str, codes: &[String]) {
    for code in codes.iter().filter(|c| !c.is_empty()) {
        params.push((key, code.clone()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{PropertyType, SortOption};

    const BASE: &str = "https://www.finn.no";

    #[test]
    fn first_page_has_no_page_param() {
        let url = build_search_url(BASE, SearchType::Homes, 1, &FilterSet::new());
        assert_eq!(url, "https://www.finn.no/realestate/homes/search.html");
    }

    #[test]
    fn later_pages_lead_with_page() {
        let filters = FilterSet::new().location("0.20061");
        let url = build_search_url(BASE, SearchType::Lettings, 3, &filters);
        assert_eq!(
            url,
            "https://www.finn.no/realestate/lettings/search.html?page=3&location=0.20061"
        );
    }

    #[test]
    fn empty_values_are_omitted() {
        let mut filters = FilterSet::new().price(Some(0), None).query("");
        filters.location.push(String::new());
        filters.no_of_bedrooms_from = Some(0);

        let url = build_search_url(BASE, SearchType::Homes, 1, &filters);
        assert!(!url.contains('?'), "unexpected query in {}", url);
    }

    #[test]
    fn multiple_locations_repeat_in_order() {
        let filters = FilterSet::new().locations(["0.20061", "0.20003", "0.20016"]);
        let url = build_search_url(BASE, SearchType::Homes, 1, &filters);
        assert!(url.ends_with("?location=0.20061&location=0.20003&location=0.20016"));
    }

    #[test]
    fn property_types_repeat_in_order() {
        let filters = FilterSet::new()
            .property_type(PropertyType::Townhouse)
            .property_type(PropertyType::Apartment);
        let url = build_search_url(BASE, SearchType::Homes, 1, &filters);
        assert!(url.ends_with("?property_type=2&property_type=1"));
    }

    #[test]
    fn rent_only_for_lettings() {
        let filters = FilterSet::new().rent(Some(8000), Some(15000));

        for search_type in SearchType::ALL {
            let url = build_search_url(BASE, search_type, 1, &filters);
            if search_type == SearchType::Lettings {
                assert!(url.contains("rent_from=8000&rent_to=15000"));
            } else {
                assert!(!url.contains("rent_"), "{} leaked rent params", search_type);
            }
        }
    }

    #[test]
    fn full_filter_order_is_stable() {
        let filters = FilterSet::new()
            .query("sjø utsikt")
            .location("0.20061")
            .price(Some(2_000_000), Some(5_000_000))
            .area(Some(50), Some(120))
            .bedrooms(Some(2), Some(4))
            .property_type(PropertyType::Apartment)
            .sort(SortOption::PriceAsc)
            .published(1)
            .rent(Some(1), Some(2));

        let url = build_search_url(BASE, SearchType::Homes, 2, &filters);
        assert_eq!(
            url,
            "https://www.finn.no/realestate/homes/search.html?page=2&location=0.20061\
             &price_from=2000000&price_to=5000000&area_from=50&area_to=120\
             &no_of_bedrooms_from=2&no_of_bedrooms_to=4&property_type=1\
             &sort=PRICE_ASC&published=1&q=sj%C3%B8%20utsikt"
        );
    }

    #[test]
    fn relevance_sort_is_implicit() {
        let filters = FilterSet::new().sort(SortOption::Relevance);
        let url = build_search_url(BASE, SearchType::Plots, 1, &filters);
        assert!(!url.contains("sort"));
    }

    #[test]
    fn listing_url_uses_category_tag() {
        assert_eq!(
            listing_url(BASE, SearchType::Leisure, "448603189"),
            "https://www.finn.no/realestate/leisure/ad.html?finnkode=448603189"
        );
    }
}
