use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::HashMap;
use tracing::{debug, instrument};

use crate::currency::is_known_currency;
use crate::error::{RateError, RateResult};
use crate::providers::limiter::RateLimiter;
use crate::rate_provider::RateProvider;

const PROVIDER_NAME: &str = "open.er-api.com";

/// Rate provider backed by an open.er-api.com compatible REST endpoint.
pub struct OpenExchangeProvider {
    base_url: String,
    api_key: Option<String>,
    client: reqwest::Client,
    limiter: RateLimiter,
}

impl OpenExchangeProvider {
    pub fn new(base_url: &str, api_key: Option<&str>, max_requests_per_hour: usize) -> Self {
        let client = reqwest::Client::builder()
            .user_agent("fxq/0.2")
            .build()
            .unwrap_or_default();

        OpenExchangeProvider {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.map(str::to_string),
            client,
            limiter: RateLimiter::per_hour(max_requests_per_hour),
        }
    }
}

#[derive(Debug, Deserialize)]
struct LatestRatesResponse {
    rates: HashMap<String, f64>,
}

#[async_trait]
impl RateProvider for OpenExchangeProvider {
    fn name(&self) -> &str {
        PROVIDER_NAME
    }

    #[instrument(
        name = "RateTableFetch",
        skip(self),
        fields(base = %base)
    )]
    async fn fetch_rates(&self, base: &str) -> RateResult<HashMap<String, Decimal>> {
        self.limiter.try_acquire()?;

        let base = base.to_uppercase();
        let mut url = format!("{}/v6/latest/{}", self.base_url, base);
        if let Some(key) = &self.api_key {
            url.push_str(&format!("?apikey={key}"));
        }
        debug!("Requesting rate table from {}", url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| RateError::Network(format!("request failed for base {base}: {e}")))?;

        if !response.status().is_success() {
            return Err(RateError::Network(format!(
                "HTTP {} for base {}",
                response.status(),
                base
            )));
        }

        let text = response.text().await?;
        let data: LatestRatesResponse = serde_json::from_str(&text)
            .map_err(|e| RateError::InvalidResponse(format!("base {base}: {e}")))?;

        let rates: HashMap<String, Decimal> = data
            .rates
            .into_iter()
            .filter(|(code, rate)| is_known_currency(code) && *rate > 0.0)
            .filter_map(|(code, rate)| {
                Decimal::from_f64_retain(rate).map(|d| (code.to_uppercase(), d))
            })
            .collect();

        debug!(count = rates.len(), "Parsed rate table");
        Ok(rates)
    }
}
