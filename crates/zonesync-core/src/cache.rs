// # Record Cache
//
// Per-zone snapshots of previously fetched records, each tagged with the SOA
// serial it was read at.
//
// ## Validity
//
// An entry is only as good as its serial: the fetcher re-checks the serial
// through the side channel before trusting it. The max lifetime attached on
// `put` is a memory/staleness bound, not a correctness mechanism.
//
// ## Concurrency
//
// Zone tasks read and write concurrently. Each operation takes the lock
// once; a get-then-put sequence is last-writer-wins per zone.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::model::SoaSnapshot;

#[derive(Debug, Clone)]
struct CacheEntry {
    snapshot: SoaSnapshot,
    expires_at: DateTime<Utc>,
}

/// Shared per-zone snapshot cache
///
/// Cloning yields another handle on the same cache.
///
/// # Example
///
/// ```rust,no_run
/// use zonesync_core::cache::RecordCache;
/// use zonesync_core::model::{SoaSnapshot, ZoneSoa};
///
/// #[tokio::main]
/// async fn main() {
///     let cache = RecordCache::new();
///     let soa = ZoneSoa { server: "ns1.example.net.".into(), serial: 42 };
///
///     cache.put("example.com", SoaSnapshot::new(soa, vec![]), chrono::Duration::hours(1)).await;
///     assert!(cache.get("example.com").await.is_some());
///
///     cache.invalidate("example.com").await;
///     assert!(cache.get("example.com").await.is_none());
/// }
/// ```
#[derive(Debug, Clone, Default)]
pub struct RecordCache {
    inner: Arc<RwLock<HashMap<String, CacheEntry>>>,
}

impl RecordCache {
    /// Create a new empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot for `zone`, if present and within its lifetime
    pub async fn get(&self, zone: &str) -> Option<SoaSnapshot> {
        let guard = self.inner.read().await;
        guard
            .get(zone)
            .filter(|entry| Utc::now() < entry.expires_at)
            .map(|entry| entry.snapshot.clone())
    }

    /// Store a snapshot for `zone`, replacing any previous one
    pub async fn put(&self, zone: &str, snapshot: SoaSnapshot, max_lifetime: chrono::Duration) {
        let expires_at = Utc::now()
            .checked_add_signed(max_lifetime)
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        let mut guard = self.inner.write().await;
        guard.insert(
            zone.to_string(),
            CacheEntry {
                snapshot,
                expires_at,
            },
        );
    }

    /// Drop the snapshot for `zone`; absent zones are a no-op
    pub async fn invalidate(&self, zone: &str) {
        let mut guard = self.inner.write().await;
        if guard.remove(zone).is_some() {
            tracing::debug!("Invalidated cached snapshot for {}", zone);
        }
    }

    /// Get the number of cached zones, expired entries included
    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    /// Check if the cache is empty
    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.is_empty()
    }

    /// Drop every snapshot
    pub async fn clear(&self) {
        self.inner.write().await.clear();
    }
}
