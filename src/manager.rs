//! Single point of access for currency conversion. Merges the in-memory
//! rate map, the disk cache, and the rate provider.

use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::currency::{CurrencyPair, ExchangeRate};
use crate::error::{RateError, RateResult};
use crate::rate_provider::RateProvider;
use crate::store::{Prefs, RateStore};

/// Tuning knobs for the manager, usually derived from `AppConfig`.
#[derive(Debug, Clone)]
pub struct ManagerOptions {
    pub freshness: Duration,
    pub major_currencies: Vec<String>,
    pub refresh_interval: std::time::Duration,
}

impl Default for ManagerOptions {
    fn default() -> Self {
        Self {
            freshness: Duration::hours(1),
            major_currencies: ["USD", "EUR", "GBP", "JPY", "INR", "AUD", "CAD"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            refresh_interval: std::time::Duration::from_secs(30 * 60),
        }
    }
}

/// Observable refresh state, published through a watch channel so UI
/// layers can subscribe without the manager knowing about them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RefreshStatus {
    pub is_loading: bool,
    pub error_message: Option<String>,
    pub last_updated: Option<DateTime<Utc>>,
}

pub struct CurrencyManager {
    provider: Arc<dyn RateProvider>,
    store: RateStore,
    prefs: Prefs,
    rates: RwLock<HashMap<CurrencyPair, ExchangeRate>>,
    status: watch::Sender<RefreshStatus>,
    options: ManagerOptions,
}

impl CurrencyManager {
    pub fn new(
        provider: Arc<dyn RateProvider>,
        store: RateStore,
        prefs: Prefs,
        options: ManagerOptions,
    ) -> Self {
        let (status, _) = watch::channel(RefreshStatus::default());
        Self {
            provider,
            store,
            prefs,
            rates: RwLock::new(HashMap::new()),
            status,
            options,
        }
    }

    /// Populates the in-memory map from the disk cache. Stale entries were
    /// already purged by the store. Returns the number of entries loaded.
    pub fn load(&self) -> Result<usize> {
        let persisted = self.store.load_all()?;
        let count = persisted.len();

        let mut rates = self.rates.write().unwrap();
        for rate in persisted {
            rates.insert(rate.pair(), rate);
        }
        drop(rates);

        let last_updated = self.prefs.last_updated();
        self.status.send_modify(|s| s.last_updated = last_updated);

        debug!(count, "Loaded persisted rates");
        Ok(count)
    }

    /// Subscribe to refresh state changes.
    pub fn status(&self) -> watch::Receiver<RefreshStatus> {
        self.status.subscribe()
    }

    pub fn current_status(&self) -> RefreshStatus {
        self.status.borrow().clone()
    }

    /// Fresh cached rate for the pair, direct or derived from the fresh
    /// reverse pair. Never touches the network.
    pub fn get_cached_rate(&self, from: &str, to: &str) -> Option<ExchangeRate> {
        let pair = CurrencyPair::new(from, to);
        let rates = self.rates.read().unwrap();

        if let Some(rate) = rates.get(&pair) {
            if rate.is_fresh(self.options.freshness) {
                return Some(rate.clone());
            }
        }

        rates
            .get(&pair.reversed())
            .filter(|rate| rate.is_fresh(self.options.freshness))
            .and_then(|rate| rate.inverse())
    }

    /// Resolve a conversion rate: 1.0 for identical currencies, then the
    /// fresh direct cache, then the fresh inverse cache (caching the
    /// derived forward rate), and only then the provider.
    pub async fn get_rate(&self, from: &str, to: &str) -> RateResult<Decimal> {
        let pair = CurrencyPair::new(from, to);
        if pair.from == pair.to {
            return Ok(Decimal::ONE);
        }

        let derived = {
            let rates = self.rates.read().unwrap();
            if let Some(rate) = rates.get(&pair) {
                if rate.is_fresh(self.options.freshness) {
                    debug!(pair = %pair, "Serving fresh cached rate");
                    return Ok(rate.rate);
                }
            }
            rates
                .get(&pair.reversed())
                .filter(|rate| rate.is_fresh(self.options.freshness))
                .and_then(|rate| rate.inverse())
        };

        if let Some(forward) = derived {
            debug!(pair = %pair, "Derived rate from cached inverse");
            let rate = forward.rate;
            self.remember(forward);
            return Ok(rate);
        }

        let fetched = self.provider.fetch_rate(&pair.from, &pair.to).await?;
        let rate = ExchangeRate::new(&pair.from, &pair.to, fetched, self.provider.name());
        if let Some(inverse) = rate.inverse() {
            self.remember(inverse);
        }
        self.remember(rate);
        Ok(fetched)
    }

    /// Convert an amount between currencies. On any provider failure the
    /// amount is returned unchanged; conversion is a convenience feature
    /// and must not take the caller down with it.
    pub async fn convert(&self, amount: Decimal, from: &str, to: &str) -> Decimal {
        match self.get_rate(from, to).await {
            Ok(rate) => amount * rate,
            Err(e) => {
                warn!(from, to, error = %e, "Conversion failed, returning amount unchanged");
                amount
            }
        }
    }

    /// Non-blocking conversion from the fresh in-memory cache only, for
    /// synchronous rendering paths. `None` when no fresh entry exists.
    pub fn convert_sync(&self, amount: Decimal, from: &str, to: &str) -> Option<Decimal> {
        if from.eq_ignore_ascii_case(to) {
            return Some(amount);
        }
        self.get_cached_rate(from, to)
            .map(|rate| amount * rate.rate)
    }

    /// Refresh the full rate tables for all configured major currencies,
    /// caching every forward and inverse pair. Failures land in the
    /// observable status rather than propagating.
    pub async fn refresh_all(&self) {
        self.status.send_modify(|s| s.is_loading = true);

        let mut first_error: Option<RateError> = None;
        for base in &self.options.major_currencies {
            match self.fetch_and_cache(base).await {
                Ok(count) => debug!(%base, count, "Refreshed rate table"),
                Err(e) => {
                    warn!(%base, error = %e, "Refresh failed");
                    first_error.get_or_insert(e);
                }
            }
        }

        match first_error {
            None => {
                let now = Utc::now();
                if let Err(e) = self.prefs.set_last_updated(now) {
                    debug!(error = %e, "Failed to persist last-updated timestamp");
                }
                self.status.send_modify(|s| {
                    s.is_loading = false;
                    s.error_message = None;
                    s.last_updated = Some(now);
                });
            }
            Some(e) => {
                self.status.send_modify(|s| {
                    s.is_loading = false;
                    s.error_message = Some(e.to_string());
                });
            }
        }
    }

    /// Best-effort cache warm for the given base currencies. Per-currency
    /// failures are logged and skipped.
    pub async fn preload(&self, currencies: &[String]) {
        for base in currencies {
            if let Err(e) = self.fetch_and_cache(base).await {
                warn!(%base, error = %e, "Preload skipped currency");
            }
        }
    }

    /// Snapshot of every cached rate, sorted by pair.
    pub fn cached_rates(&self) -> Vec<ExchangeRate> {
        let mut rates: Vec<_> = self.rates.read().unwrap().values().cloned().collect();
        rates.sort_by_key(|rate| rate.pair().cache_key());
        rates
    }

    /// Clears the in-memory map, the disk cache, and the last-updated
    /// timestamp.
    pub fn clear_cache(&self) -> Result<()> {
        self.rates.write().unwrap().clear();
        self.store.clear()?;
        self.prefs.clear()?;
        self.status.send_modify(|s| {
            s.last_updated = None;
            s.error_message = None;
        });
        Ok(())
    }

    /// Runs `refresh_all` on a fixed interval until the task is aborted.
    pub fn spawn_periodic_refresh(self: &Arc<Self>) -> JoinHandle<()> {
        let manager = Arc::clone(self);
        let period = manager.options.refresh_interval;
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            // Skip the immediate first tick; the initial refresh is the
            // caller's decision.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                manager.refresh_all().await;
            }
        })
    }

    async fn fetch_and_cache(&self, base: &str) -> RateResult<usize> {
        let base = base.to_uppercase();
        let table = self.provider.fetch_rates(&base).await?;
        let count = table.len();

        for (code, value) in table {
            if code == base {
                continue;
            }
            let rate = ExchangeRate::new(&base, &code, value, self.provider.name());
            if let Some(inverse) = rate.inverse() {
                self.remember(inverse);
            }
            self.remember(rate);
        }

        Ok(count)
    }

    /// Write-through insert. Disk persistence is fire-and-forget; a failed
    /// write costs a refetch later, nothing more.
    fn remember(&self, rate: ExchangeRate) {
        if let Err(e) = self.store.put(&rate) {
            debug!(pair = %rate.pair(), error = %e, "Failed to persist rate");
        }
        self.rates.write().unwrap().insert(rate.pair(), rate);
    }
}
