use crate::error::TransportError;
use crate::scrapers::fragments::RawListing;
use async_trait::async_trait;

/// Something that can turn a URL into a response body.
///
/// The client only ever talks to the network through this, so tests and
/// alternative transports can stand in for `HttpFetcher`.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<String, TransportError>;
}

/// Strategy for finding listing records in a result page
pub trait FragmentExtractor: Send + Sync {
    /// Distinct listings in page order
    fn extract_fragments(&self, html: &str) -> Vec<RawListing>;
}
