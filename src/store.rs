//! Durable storage for fetched rates, one JSON file per currency pair,
//! plus the persisted last-updated preference.

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::currency::ExchangeRate;

pub struct RateStore {
    dir: PathBuf,
    staleness: Duration,
}

impl RateStore {
    pub fn open(dir: &Path, staleness: Duration) -> Result<Self> {
        fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create cache directory: {}", dir.display()))?;
        Ok(Self {
            dir: dir.to_path_buf(),
            staleness,
        })
    }

    fn entry_path(&self, rate: &ExchangeRate) -> PathBuf {
        self.dir.join(format!("{}.json", rate.pair().cache_key()))
    }

    /// Persist one rate, overwriting any existing entry for the pair.
    pub fn put(&self, rate: &ExchangeRate) -> Result<()> {
        let path = self.entry_path(rate);
        let json = serde_json::to_string_pretty(rate)?;
        fs::write(&path, json)
            .with_context(|| format!("Failed to write cache entry: {}", path.display()))?;
        debug!(pair = %rate.pair(), "Persisted rate");
        Ok(())
    }

    /// Load every persisted entry. Stale entries are deleted and excluded;
    /// entries that fail to deserialize are treated as corrupt and deleted.
    pub fn load_all(&self) -> Result<Vec<ExchangeRate>> {
        let mut rates = Vec::new();

        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }

            let rate = fs::read_to_string(&path)
                .map_err(anyhow::Error::from)
                .and_then(|text| serde_json::from_str::<ExchangeRate>(&text).map_err(Into::into));

            match rate {
                Ok(rate) if rate.is_stale(self.staleness) => {
                    debug!(pair = %rate.pair(), "Purging stale cache entry");
                    let _ = fs::remove_file(&path);
                }
                Ok(rate) => rates.push(rate),
                Err(e) => {
                    debug!(path = %path.display(), error = %e, "Deleting corrupt cache entry");
                    let _ = fs::remove_file(&path);
                }
            }
        }

        Ok(rates)
    }

    /// Delete all persisted entries.
    pub fn clear(&self) -> Result<()> {
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) == Some("json") {
                fs::remove_file(&path)
                    .with_context(|| format!("Failed to remove: {}", path.display()))?;
            }
        }
        debug!("Cleared rate store");
        Ok(())
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct PrefsData {
    last_updated: Option<DateTime<Utc>>,
}

/// Key-value preference file holding the last successful refresh time.
pub struct Prefs {
    path: PathBuf,
}

impl Prefs {
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
        }
    }

    fn read(&self) -> PrefsData {
        fs::read_to_string(&self.path)
            .ok()
            .and_then(|text| serde_json::from_str(&text).ok())
            .unwrap_or_default()
    }

    fn write(&self, data: &PrefsData) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, serde_json::to_string_pretty(data)?)
            .with_context(|| format!("Failed to write prefs: {}", self.path.display()))
    }

    pub fn last_updated(&self) -> Option<DateTime<Utc>> {
        self.read().last_updated
    }

    pub fn set_last_updated(&self, at: DateTime<Utc>) -> Result<()> {
        self.write(&PrefsData {
            last_updated: Some(at),
        })
    }

    pub fn clear(&self) -> Result<()> {
        self.write(&PrefsData::default())
    }
}
