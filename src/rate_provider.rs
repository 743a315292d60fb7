//! Exchange rate provider abstraction.

use crate::currency::CurrencyPair;
use crate::error::{RateError, RateResult};
use async_trait::async_trait;
use rust_decimal::Decimal;
use std::collections::HashMap;

#[async_trait]
pub trait RateProvider: Send + Sync {
    /// Provider name, recorded as the source of fetched rates.
    fn name(&self) -> &str;

    /// Fetch the full rate table for a base currency. Entries that do not
    /// resolve to a known currency code are dropped.
    async fn fetch_rates(&self, base: &str) -> RateResult<HashMap<String, Decimal>>;

    /// Fetch a single rate. Identical currencies convert at 1.0 without
    /// touching the network.
    async fn fetch_rate(&self, from: &str, to: &str) -> RateResult<Decimal> {
        let pair = CurrencyPair::new(from, to);
        if pair.from == pair.to {
            return Ok(Decimal::ONE);
        }

        let rates = self.fetch_rates(&pair.from).await?;
        rates
            .get(&pair.to)
            .copied()
            .ok_or(RateError::InvalidCurrencyPair(pair))
    }
}
