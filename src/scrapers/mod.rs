pub mod count;
pub mod details;
pub mod finn;
pub mod fragments;
pub mod http;
pub mod locations;
pub mod normalize;
pub mod rate_limit;
pub mod traits;
pub mod types;
pub mod url;

pub use finn::{FinnClient, DETAIL_CANDIDATES, PER_PAGE};
pub use fragments::{extract_fragments, AnchorScanner, RawListing};
pub use http::HttpFetcher;
pub use traits::{Fetcher, FragmentExtractor};
pub use types::FilterSet;
