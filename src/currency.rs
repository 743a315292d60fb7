//! Currency pairs and exchange rates.

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Currency codes the application resolves rates for. Provider responses
/// are filtered down to this set.
pub const KNOWN_CURRENCIES: &[&str] = &[
    "USD", "EUR", "GBP", "JPY", "INR", "AUD", "CAD", "CHF", "CNY", "HKD", "NZD", "SEK", "NOK",
    "DKK", "SGD", "KRW", "MXN", "BRL", "ZAR", "TRY", "AED", "SAR", "PLN", "THB", "IDR", "MYR",
    "PHP", "VND", "ILS", "CZK",
];

pub fn is_known_currency(code: &str) -> bool {
    KNOWN_CURRENCIES.iter().any(|c| c.eq_ignore_ascii_case(code))
}

/// Ordered (from, to) pair of currency codes, used as the cache key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CurrencyPair {
    pub from: String,
    pub to: String,
}

impl CurrencyPair {
    pub fn new(from: &str, to: &str) -> Self {
        Self {
            from: from.to_uppercase(),
            to: to.to_uppercase(),
        }
    }

    pub fn reversed(&self) -> Self {
        Self {
            from: self.to.clone(),
            to: self.from.clone(),
        }
    }

    /// Key used for cache file names, e.g. "USDINR".
    pub fn cache_key(&self) -> String {
        format!("{}{}", self.from, self.to)
    }
}

impl fmt::Display for CurrencyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.from, self.to)
    }
}

/// A fetched exchange rate with its provenance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExchangeRate {
    pub from: String,
    pub to: String,
    pub rate: Decimal,
    pub timestamp: DateTime<Utc>,
    pub source: String,
}

impl ExchangeRate {
    pub fn new(from: &str, to: &str, rate: Decimal, source: &str) -> Self {
        Self {
            from: from.to_uppercase(),
            to: to.to_uppercase(),
            rate,
            timestamp: Utc::now(),
            source: source.to_string(),
        }
    }

    pub fn pair(&self) -> CurrencyPair {
        CurrencyPair::new(&self.from, &self.to)
    }

    pub fn age(&self) -> Duration {
        Utc::now().signed_duration_since(self.timestamp)
    }

    /// Fresh rates are served from cache without a refetch.
    pub fn is_fresh(&self, freshness: Duration) -> bool {
        self.age() < freshness
    }

    /// Stale rates are purged from the disk cache on load.
    pub fn is_stale(&self, staleness: Duration) -> bool {
        self.age() > staleness
    }

    /// Reciprocal rate with the same timestamp and source. `None` for a
    /// zero rate, which a provider should never hand out.
    pub fn inverse(&self) -> Option<ExchangeRate> {
        let rate = Decimal::ONE.checked_div(self.rate)?;
        Some(ExchangeRate {
            from: self.to.clone(),
            to: self.from.clone(),
            rate,
            timestamp: self.timestamp,
            source: self.source.clone(),
        })
    }
}

impl fmt::Display for ExchangeRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{} = {}", self.from, self.to, self.rate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_pair_normalization_and_key() {
        let pair = CurrencyPair::new("usd", "inr");
        assert_eq!(pair.from, "USD");
        assert_eq!(pair.to, "INR");
        assert_eq!(pair.cache_key(), "USDINR");
        assert_eq!(pair.to_string(), "USD/INR");
    }

    #[test]
    fn test_pair_reversed() {
        let pair = CurrencyPair::new("USD", "EUR");
        let rev = pair.reversed();
        assert_eq!(rev, CurrencyPair::new("EUR", "USD"));
        assert_eq!(rev.reversed(), pair);
    }

    #[test]
    fn test_known_currency_lookup() {
        assert!(is_known_currency("USD"));
        assert!(is_known_currency("inr"));
        assert!(!is_known_currency("XXX"));
    }

    #[test]
    fn test_rate_freshness() {
        let mut rate = ExchangeRate::new("USD", "INR", dec!(83.50), "test");
        assert!(rate.is_fresh(Duration::hours(1)));
        assert!(!rate.is_stale(Duration::hours(24)));

        rate.timestamp = Utc::now() - Duration::hours(2);
        assert!(!rate.is_fresh(Duration::hours(1)));
        assert!(!rate.is_stale(Duration::hours(24)));

        rate.timestamp = Utc::now() - Duration::hours(25);
        assert!(rate.is_stale(Duration::hours(24)));
    }

    #[test]
    fn test_rate_inverse() {
        let rate = ExchangeRate::new("USD", "INR", dec!(80), "test");
        let inverse = rate.inverse().unwrap();
        assert_eq!(inverse.from, "INR");
        assert_eq!(inverse.to, "USD");
        assert_eq!(inverse.rate, dec!(0.0125));
        assert_eq!(inverse.timestamp, rate.timestamp);

        let zero = ExchangeRate::new("USD", "INR", Decimal::ZERO, "test");
        assert!(zero.inverse().is_none());
    }

    #[test]
    fn test_rate_serde_round_trip() {
        let rate = ExchangeRate::new("USD", "EUR", dec!(0.85), "open.er-api.com");
        let json = serde_json::to_string(&rate).unwrap();
        let parsed: ExchangeRate = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, rate);
    }
}
