//! Scraper for FINN.no real estate listings.
//!
//! Result pages embed each listing as a serialized object inside the HTML.
//! [`FinnClient`] builds search URLs from a [`FilterSet`], pulls those
//! objects out of the page, and returns typed [`models::SearchResults`].
//! Detail pages are resolved by id alone.

pub mod config;
pub mod error;
pub mod models;
pub mod scrapers;

pub use config::ClientConfig;
pub use error::{ScrapeError, TransportError};
pub use models::{Image, ListingBasic, ListingDetails, PropertyType, SearchResults, SearchType, SortOption};
pub use scrapers::{FilterSet, FinnClient};
