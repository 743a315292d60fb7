use async_trait::async_trait;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::error::{RateError, RateResult};
use crate::rate_provider::RateProvider;

/// Rate provider serving fixed in-memory tables. Used when no network is
/// wanted, and by tests asserting that a lookup was served from cache.
pub struct OfflineRateProvider {
    tables: HashMap<String, HashMap<String, Decimal>>,
    calls: AtomicUsize,
}

impl OfflineRateProvider {
    pub fn new() -> Self {
        Self {
            tables: HashMap::new(),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn with_rate(mut self, base: &str, to: &str, rate: Decimal) -> Self {
        self.tables
            .entry(base.to_uppercase())
            .or_default()
            .insert(to.to_uppercase(), rate);
        self
    }

    /// Number of `fetch_rates` calls made against this provider.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Default for OfflineRateProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RateProvider for OfflineRateProvider {
    fn name(&self) -> &str {
        "offline"
    }

    async fn fetch_rates(&self, base: &str) -> RateResult<HashMap<String, Decimal>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.tables
            .get(&base.to_uppercase())
            .cloned()
            .ok_or_else(|| RateError::NoDataAvailable(base.to_uppercase()))
    }
}
