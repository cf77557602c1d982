//! Time-to-live memoization of upstream fetches.
//!
//! Entries are keyed by the logical request and live for a TTL chosen per
//! entity kind:
//!
//! | Kind | Default TTL |
//! |------|-------------|
//! | Sensors list | 5 minutes |
//! | Sensor detail | 5 minutes |
//! | Observations | 1 minute |
//!
//! Whatever the fetch function returns is stored, including the empty
//! substitute produced for a failed request. An unreachable server is
//! therefore not retried until the entry expires or the cache is cleared.
//!
//! Liveness is decided against the injected [`Clock`]. The backing moka
//! cache also drops entries on its own once their TTL has passed in real
//! time, and evicts when `CACHE_MAX_ENTRIES` is exceeded, so keys that are
//! never looked up again do not accumulate.
//!
//! # Usage
//!
//! ```text
//! let envelope = cache
//!     .get_or_fetch(request.clone(), policy.for_kind(request.kind()), || async {
//!         fetch_or_empty(&client, &request).await
//!     })
//!     .await;
//! ```

use chrono::{DateTime, Duration, Utc};
use moka::{future::Cache, Expiry};
use std::fmt::Debug;
use std::future::Future;
use std::hash::Hash;
use std::sync::Arc;
use std::time::Instant;

use crate::common::Clock;
use crate::config::Config;
use crate::sta::EntityKind;

/// Longest real-time lifetime handed to moka, whatever the configured TTL.
const MAX_EXPIRY: std::time::Duration = std::time::Duration::from_secs(365 * 24 * 60 * 60);

#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    pub value: V,
    pub inserted_at: DateTime<Utc>,
    pub ttl: Duration,
}

impl<V> CacheEntry<V> {
    /// An entry is live while `now - inserted_at < ttl`.
    pub fn is_live(&self, now: DateTime<Utc>) -> bool {
        now - self.inserted_at < self.ttl
    }

    fn expiry(&self) -> Option<std::time::Duration> {
        self.ttl.to_std().ok().map(|ttl| ttl.min(MAX_EXPIRY))
    }
}

/// Per-entry expiry: each entry carries the TTL of its entity kind.
struct EntryExpiry;

impl<K, V> Expiry<K, CacheEntry<V>> for EntryExpiry {
    fn expire_after_create(
        &self,
        _key: &K,
        value: &CacheEntry<V>,
        _created_at: Instant,
    ) -> Option<std::time::Duration> {
        value.expiry()
    }

    fn expire_after_update(
        &self,
        _key: &K,
        value: &CacheEntry<V>,
        _updated_at: Instant,
        _duration_until_expiry: Option<std::time::Duration>,
    ) -> Option<std::time::Duration> {
        value.expiry()
    }
}

/// TTL per entity kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TtlPolicy {
    pub sensors: Duration,
    pub observations: Duration,
}

impl Default for TtlPolicy {
    fn default() -> Self {
        Self {
            sensors: Duration::minutes(5),
            observations: Duration::minutes(1),
        }
    }
}

impl TtlPolicy {
    pub fn from_config(config: &Config) -> Self {
        Self {
            sensors: seconds(config.cache_sensors_ttl_seconds),
            observations: seconds(config.cache_observations_ttl_seconds),
        }
    }

    /// Sensor metadata changes rarely; observations arrive continuously.
    pub fn for_kind(&self, kind: EntityKind) -> Duration {
        match kind {
            EntityKind::Sensors | EntityKind::SensorDetail => self.sensors,
            EntityKind::Observations => self.observations,
        }
    }
}

fn seconds(secs: u64) -> Duration {
    i64::try_from(secs)
        .ok()
        .and_then(Duration::try_seconds)
        .unwrap_or(Duration::MAX)
}

/// Result cache shared by every request handler.
///
/// No lock is held while a fetch is running, so two concurrent misses on the
/// same key may both fetch; the later insert wins.
pub struct ResultCache<K, V> {
    entries: Cache<K, CacheEntry<V>>,
    clock: Arc<dyn Clock>,
}

impl<K, V> ResultCache<K, V>
where
    K: Eq + Hash + Debug + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    /// A cache holding at most `max_entries` payloads.
    pub fn new(max_entries: u64, clock: Arc<dyn Clock>) -> Self {
        let entries = Cache::builder()
            .max_capacity(max_entries)
            .expire_after(EntryExpiry)
            .build();

        Self { entries, clock }
    }

    /// Return the live value for `key`, evicting it if it has expired.
    pub async fn get(&self, key: &K) -> Option<V> {
        let now = self.clock.now();
        let entry = self.entries.get(key).await?;
        if entry.is_live(now) {
            tracing::debug!(cache_key = ?key, "cache_hit");
            return Some(entry.value);
        }

        self.entries.invalidate(key).await;
        tracing::debug!(cache_key = ?key, "cache_expired");
        None
    }

    /// Store `value` under `key`, replacing any previous entry.
    pub async fn insert(&self, key: K, value: V, ttl: Duration) {
        let inserted_at = self.clock.now();
        tracing::debug!(cache_key = ?key, ttl_secs = ttl.num_seconds(), "cache_stored");
        self.entries
            .insert(
                key,
                CacheEntry {
                    value,
                    inserted_at,
                    ttl,
                },
            )
            .await;
    }

    /// Return the live value for `key`, or run `fetch`, cache its output for
    /// `ttl` and return it.
    pub async fn get_or_fetch<F, Fut>(&self, key: K, ttl: Duration, fetch: F) -> V
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = V>,
    {
        if let Some(value) = self.get(&key).await {
            return value;
        }

        tracing::debug!(cache_key = ?key, "cache_miss");
        let value = fetch().await;
        self.insert(key, value.clone(), ttl).await;
        value
    }

    /// Drop every entry. Returns how many were removed.
    pub async fn invalidate_all(&self) -> usize {
        let keys: Vec<Arc<K>> = self.entries.iter().map(|(key, _)| key).collect();
        for key in &keys {
            self.entries.invalidate(&**key).await;
        }
        let cleared = keys.len();
        tracing::debug!(cleared, "cache_invalidated");
        cleared
    }

    /// Apply pending evictions now instead of on the next maintenance cycle.
    pub async fn run_pending_tasks(&self) {
        self.entries.run_pending_tasks().await;
    }

    /// Number of stored entries, including ones expired by the injected
    /// clock that have not been looked up since.
    pub fn len(&self) -> usize {
        self.entries.iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.iter().next().is_none()
    }
}
