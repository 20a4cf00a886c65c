//! Time-bounded weather cache over the local key-value store.
//!
//! Entries are keyed by the exact coordinate values: two lookups only share
//! an entry when their coordinates are bit-identical. Expired entries are
//! ignored rather than deleted (lazy invalidation); dead entries accumulate,
//! which is acceptable at this scale.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use skyclock_core::store::SharedStore;

use crate::types::{Coordinate, WeatherSnapshot};

/// Freshness window for cached snapshots.
pub const CACHE_DURATION_MS: i64 = 5 * 60 * 1000;

/// One cached snapshot with its write timestamp (ms since epoch).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry {
    pub snapshot: WeatherSnapshot,
    pub captured_at: i64,
}

#[derive(Clone)]
pub struct WeatherCache {
    store: SharedStore,
}

impl WeatherCache {
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }

    /// Derive the storage key for a coordinate pair. Exact float formatting:
    /// no rounding, so coordinate jitter misses the cache by design of the
    /// contract (see DESIGN.md).
    fn key(coord: Coordinate) -> String {
        format!("weather_{}_{}", coord.latitude, coord.longitude)
    }

    /// Return the cached snapshot for `coord` if one exists and is younger
    /// than the freshness window. A malformed entry counts as a miss.
    pub fn get(&self, coord: Coordinate) -> Option<WeatherSnapshot> {
        let json = self.store.lock().get(&Self::key(coord))?;
        let entry: CacheEntry = match serde_json::from_str(&json) {
            Ok(entry) => entry,
            Err(e) => {
                tracing::debug!("Ignoring malformed cache entry: {}", e);
                return None;
            }
        };

        let age = Utc::now().timestamp_millis() - entry.captured_at;
        if age < CACHE_DURATION_MS {
            Some(entry.snapshot)
        } else {
            tracing::debug!(age_ms = age, "Cached weather expired");
            None
        }
    }

    /// Write or overwrite the entry for `coord`, timestamped now. Store
    /// failures are logged and swallowed: a broken cache must never fail a
    /// weather fetch.
    pub fn put(&self, coord: Coordinate, snapshot: &WeatherSnapshot) {
        let entry = CacheEntry {
            snapshot: snapshot.clone(),
            captured_at: Utc::now().timestamp_millis(),
        };

        let json = match serde_json::to_string(&entry) {
            Ok(json) => json,
            Err(e) => {
                tracing::warn!("Failed to serialize cache entry: {}", e);
                return;
            }
        };

        if let Err(e) = self.store.lock().set(&Self::key(coord), &json) {
            tracing::warn!("Failed to write weather cache: {}", e);
        }
    }
}
