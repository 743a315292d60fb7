//! Typed errors for rate fetching and conversion.

use crate::currency::CurrencyPair;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RateError {
    /// Transport failure or non-2xx response from the rate API.
    #[error("network error: {0}")]
    Network(String),

    /// Response body did not match the expected JSON shape.
    #[error("invalid response from rate provider: {0}")]
    InvalidResponse(String),

    /// Requested target currency absent from the provider response.
    #[error("no rate available for {0}")]
    InvalidCurrencyPair(CurrencyPair),

    /// Offline provider has no table for the requested base.
    #[error("no rate data available for base {0}")]
    NoDataAvailable(String),

    /// Local sliding-window throttle tripped before any request was made.
    #[error("rate limit exceeded: {limit} requests per hour")]
    RateLimitExceeded { limit: usize },
}

impl From<reqwest::Error> for RateError {
    fn from(err: reqwest::Error) -> Self {
        RateError::Network(err.to_string())
    }
}

pub type RateResult<T> = Result<T, RateError>;
