//! Error types.
//!
//! Only transport failures are meant to reach callers of a search. Anything
//! derived from parsing page markup degrades to an absent value instead.

use thiserror::Error;

/// A page could not be fetched
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("request to {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} returned status {status}")]
    Status { url: String, status: u16 },
}

impl TransportError {
    pub fn url(&self) -> &str {
        match self {
            TransportError::Http { url, .. } | TransportError::Status { url, .. } => url,
        }
    }
}

#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A raw record lacks a field that a listing cannot exist without
    #[error("raw listing is missing required field `{field}`")]
    MissingRequiredField { field: &'static str },
}

pub type Result<T, E = ScrapeError> = std::result::Result<T, E>;
