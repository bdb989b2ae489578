use crate::config::ClientConfig;
use crate::error::{Result, TransportError};
use crate::models::{total_pages, ListingBasic, ListingDetails, SearchResults, SearchType};
use crate::scrapers::count::extract_total_count;
use crate::scrapers::details::parse_listing_details;
use crate::scrapers::fragments::AnchorScanner;
use crate::scrapers::http::HttpFetcher;
use crate::scrapers::normalize::normalize_listing;
use crate::scrapers::rate_limit::RateLimiter;
use crate::scrapers::traits::{Fetcher, FragmentExtractor};
use crate::scrapers::types::FilterSet;
use crate::scrapers::url::{build_search_url, listing_url};
use async_stream::try_stream;
use futures::Stream;
use serde_json::Value;
use tracing::{debug, error, info, warn};

/// Listings per result page. The site does not report it; this is what it
/// has been observed to serve.
pub const PER_PAGE: u32 = 51;

/// Categories tried, in order, when looking up a listing by id alone
pub const DETAIL_CANDIDATES: [SearchType; 3] =
    [SearchType::Lettings, SearchType::Homes, SearchType::Leisure];

/// FINN.no real estate client.
///
/// Requests are issued one at a time and spaced out by the client's rate
/// limiter, which every operation on the same instance shares.
pub struct FinnClient<F = HttpFetcher, E = AnchorScanner> {
    fetcher: F,
    extractor: E,
    limiter: RateLimiter,
    base_url: String,
}

impl FinnClient {
    /// Client with default settings
    pub fn new() -> Result<Self> {
        Self::with_config(ClientConfig::default())
    }

    pub fn with_config(config: ClientConfig) -> Result<Self> {
        let fetcher = HttpFetcher::new(&config)?;
        Ok(FinnClient::with_fetcher(fetcher, &config))
    }
}

impl<F: Fetcher> FinnClient<F> {
    /// Client over a custom transport
    pub fn with_fetcher(fetcher: F, config: &ClientConfig) -> Self {
        Self {
            fetcher,
            extractor: AnchorScanner,
            limiter: RateLimiter::new(config.rate_limit_delay),
            base_url: config.base_url.trim_end_matches('/').to_string(),
        }
    }
}

impl<F: Fetcher, E: FragmentExtractor> FinnClient<F, E> {
    /// Swap the strategy used to find listings in result pages
    pub fn with_extractor<X: FragmentExtractor>(self, extractor: X) -> FinnClient<F, X> {
        FinnClient {
            fetcher: self.fetcher,
            extractor,
            limiter: self.limiter,
            base_url: self.base_url,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn fetch(&self, url: &str) -> Result<String, TransportError> {
        self.limiter.wait().await;
        debug!("Requesting: {}", url);
        self.fetcher.fetch(url).await
    }

    pub fn search_url(&self, search_type: SearchType, page: u32, filters: &FilterSet) -> String {
        build_search_url(&self.base_url, search_type, page, filters)
    }

    /// Fetch one page of search results.
    ///
    /// Pages are 1-indexed; 0 is treated as 1. Only a failed fetch is an
    /// error. A page the extractors cannot make sense of gives an empty
    /// result with a zero count.
    pub async fn search(
        &self,
        search_type: SearchType,
        page: u32,
        filters: &FilterSet,
    ) -> Result<SearchResults> {
        let page = page.max(1);
        let url = self.search_url(search_type, page, filters);
        info!("Searching: {}", url);

        let html = self.fetch(&url).await?;

        let raw_listings = self.extractor.extract_fragments(&html);
        let total_count = extract_total_count(&html);

        let items: Vec<ListingBasic> = raw_listings
            .iter()
            .filter_map(|raw| match normalize_listing(raw, search_type, &self.base_url) {
                Ok(listing) => Some(listing),
                Err(err) => {
                    warn!("Dropping listing from {}: {}", url, err);
                    None
                }
            })
            .collect();

        let has_next_page = u64::from(page) < total_pages(total_count, PER_PAGE);
        debug!(
            "Page {}: {} listings, {} total, next page: {}",
            page,
            items.len(),
            total_count,
            has_next_page
        );

        Ok(SearchResults {
            items,
            total_count,
            page,
            per_page: PER_PAGE,
            has_next_page,
            search_type,
            filters_applied: filters.clone(),
        })
    }

    /// Rentals
    pub async fn search_lettings(&self, page: u32, filters: &FilterSet) -> Result<SearchResults> {
        self.search(SearchType::Lettings, page, filters).await
    }

    /// Homes for sale
    pub async fn search_homes(&self, page: u32, filters: &FilterSet) -> Result<SearchResults> {
        self.search(SearchType::Homes, page, filters).await
    }

    /// New construction projects
    pub async fn search_newbuildings(
        &self,
        page: u32,
        filters: &FilterSet,
    ) -> Result<SearchResults> {
        self.search(SearchType::Newbuildings, page, filters).await
    }

    /// Vacation homes
    pub async fn search_leisure(&self, page: u32, filters: &FilterSet) -> Result<SearchResults> {
        self.search(SearchType::Leisure, page, filters).await
    }

    /// Every listing across result pages, fetched on demand.
    ///
    /// A page is only requested once the consumer has drained the previous
    /// one and asks for more. Stops after the last page the reported count
    /// allows, or after `max_pages` pages. A transport error is yielded once
    /// and ends the stream. Listings repeated across pages are not filtered.
    pub fn search_all(
        &self,
        search_type: SearchType,
        filters: FilterSet,
        max_pages: Option<u32>,
    ) -> impl Stream<Item = Result<ListingBasic>> + '_ {
        try_stream! {
            let mut page: u32 = 1;
            loop {
                if max_pages.is_some_and(|max| page > max) {
                    debug!("Reached page limit for {} search", search_type);
                    break;
                }

                let results = self.search(search_type, page, &filters).await?;
                let has_next_page = results.has_next_page;

                for listing in results.items {
                    yield listing;
                }

                if !has_next_page {
                    break;
                }
                page += 1;
            }
        }
    }

    /// Look up a listing by its finnkode.
    ///
    /// The category is not known up front, so each candidate category's ad
    /// page is tried in turn. A page that does not mention the id belongs to
    /// another category. Failed fetches move on to the next candidate too.
    pub async fn get_listing_details(&self, listing_id: &str) -> Option<ListingDetails> {
        let listing_id = listing_id.trim();
        if listing_id.is_empty() {
            warn!("Empty listing id");
            return None;
        }

        for search_type in DETAIL_CANDIDATES {
            let url = listing_url(&self.base_url, search_type, listing_id);

            let html = match self.fetch(&url).await {
                Ok(html) => html,
                Err(err) => {
                    debug!("Failed to fetch {} listing: {}", search_type, err);
                    continue;
                }
            };

            if !html.contains(listing_id) {
                debug!("{} is not a {} listing", listing_id, search_type);
                continue;
            }

            info!("Found {} as a {} listing", listing_id, search_type);
            return Some(parse_listing_details(
                &html,
                listing_id,
                search_type,
                &self.base_url,
            ));
        }

        warn!("Listing {} not found", listing_id);
        None
    }

    /// Location suggestions for a free-text place name.
    ///
    /// Entries are passed through as the site returns them. Any failure
    /// gives an empty list.
    pub async fn get_location_suggestions(&self, query: &str) -> Vec<Value> {
        let url = format!(
            "{}/realestate/lettings/xhr?term={}",
            self.base_url,
            urlencoding::encode(query)
        );

        let body = match self.fetch(&url).await {
            Ok(body) => body,
            Err(err) => {
                error!("Location lookup failed: {}", err);
                return Vec::new();
            }
        };

        match serde_json::from_str::<Vec<Value>>(&body) {
            Ok(suggestions) => suggestions,
            Err(err) => {
                error!("Location lookup returned unexpected data: {}", err);
                Vec::new()
            }
        }
    }
}
