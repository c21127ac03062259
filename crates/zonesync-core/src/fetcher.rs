//! Record fetching for one zone
//!
//! The fetcher returns the authoritative record set of a zone:
//!
//! 1. On a cache hit, validate the snapshot's serial over the side channel
//!    and return it untouched if it is still current.
//! 2. Otherwise drop the snapshot, read the zone SOA, list the zone's record
//!    ids, fetch every record by id concurrently, and keep supported types.
//! 3. Store the result, tagged with the SOA serial, in the cache.
//!
//! Every store call takes one rate-limiter token. A single failed record
//! fetch fails the whole zone and nothing is cached for it; the other record
//! fetches of the zone still run to completion.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::cache::RecordCache;
use crate::error::{Error, Result};
use crate::limiter::RateLimiter;
use crate::model::{Record, SoaSnapshot};
use crate::scope::TaskScope;
use crate::traits::RecordStore;
use crate::validator::{StalenessValidator, Validation};

/// Fetches zone records through the cache
#[derive(Clone)]
pub struct RecordFetcher {
    store: Arc<dyn RecordStore>,
    limiter: Arc<RateLimiter>,
    cache: RecordCache,
    validator: StalenessValidator,
    use_cache: bool,
    max_lifetime: chrono::Duration,
}

impl RecordFetcher {
    pub fn new(
        store: Arc<dyn RecordStore>,
        limiter: Arc<RateLimiter>,
        cache: RecordCache,
        validator: StalenessValidator,
    ) -> Self {
        Self {
            store,
            limiter,
            cache,
            validator,
            use_cache: true,
            max_lifetime: chrono::Duration::hours(1),
        }
    }

    /// Enable or disable snapshot caching
    pub fn with_cache(mut self, use_cache: bool) -> Self {
        self.use_cache = use_cache;
        self
    }

    /// Bound how long a snapshot may stay cached
    pub fn with_max_lifetime(mut self, max_lifetime: chrono::Duration) -> Self {
        self.max_lifetime = max_lifetime;
        self
    }

    /// Current supported records of `zone`
    pub async fn fetch(&self, zone: &str, cancel: &CancellationToken) -> Result<Vec<Record>> {
        if self.use_cache {
            if let Some(records) = self.cached(zone, cancel).await? {
                return Ok(records);
            }
        }

        debug!("Getting records for {} from {}", zone, self.store.store_name());

        // SOA first: an edit racing the fetch can only make the cached serial
        // older than the records, which the next validation catches.
        let soa = if self.use_cache {
            Some(self.limiter.call(cancel, self.store.get_soa(zone)).await?)
        } else {
            None
        };

        let ids = self
            .limiter
            .call(cancel, self.store.list_record_ids(zone))
            .await?;

        let mut scope = TaskScope::new(cancel);
        for (position, id) in ids.into_iter().enumerate() {
            let store = Arc::clone(&self.store);
            let limiter = Arc::clone(&self.limiter);
            let token = scope.token();
            let zone = zone.to_string();
            scope.spawn(async move {
                debug!("Getting record {} for {}", id, zone);
                let mut record = limiter.call(&token, store.get_record(&zone, id)).await?;
                if record.id == 0 {
                    record.id = id;
                }
                if record.zone.is_empty() {
                    record.zone = zone;
                }
                Ok((position, record))
            });
        }
        let mut fetched = scope.join().await?;

        // keep the store's listing order, whatever order the fetches finished in
        fetched.sort_by_key(|(position, _)| *position);
        let records: Vec<Record> = fetched
            .into_iter()
            .map(|(_, record)| record)
            .filter(|record| {
                let supported = record.field_type.is_supported();
                if !supported {
                    debug!("Skipping record {} of unsupported type {}", record.id, record.field_type);
                }
                supported
            })
            .collect();

        if let Some(soa) = soa {
            self.cache
                .put(zone, SoaSnapshot::new(soa, records.clone()), self.max_lifetime)
                .await;
        }

        Ok(records)
    }

    /// Validated cached records, or `None` when a full fetch is needed
    async fn cached(&self, zone: &str, cancel: &CancellationToken) -> Result<Option<Vec<Record>>> {
        let Some(snapshot) = self.cache.get(zone).await else {
            return Ok(None);
        };

        match self.validator.validate(zone, &snapshot, cancel).await {
            Validation::Fresh => Ok(Some(snapshot.records)),
            Validation::Stale { .. } | Validation::Unverified(_) => {
                if cancel.is_cancelled() {
                    return Err(Error::Cancelled);
                }
                self.cache.invalidate(zone).await;
                Ok(None)
            }
        }
    }
}
