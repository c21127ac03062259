//! Zone reconciler
//!
//! The Reconciler is responsible for:
//! - Enumerating the store's zones through the zone filter
//! - Reading each zone's records, through the serial-validated cache
//! - Splitting a global change request by zone
//! - Applying each zone's changes independently and publishing it
//!
//! ## Architecture
//!
//! ```text
//!                  ┌──────────────┐
//!   Changes ──────▶│  Reconciler  │
//!                  └──────────────┘
//!                         │ partition by zone
//!         ┌───────────────┼───────────────┐
//!         ▼               ▼               ▼
//!   ┌──────────┐    ┌──────────┐    ┌──────────┐
//!   │ zone a   │    │ zone b   │    │ zone c   │   one task per zone
//!   │ plan     │    │ plan     │    │ plan     │
//!   │ execute  │    │ execute  │    │ execute  │   one task per change
//!   │ publish  │    │ publish  │    │ publish  │
//!   └──────────┘    └──────────┘    └──────────┘
//!         │               │               │
//!         └──── RateLimiter (shared) ─────┘
//! ```
//!
//! ## Failure Model
//!
//! Zones never affect each other. A zone's records are read inside its own
//! task, so a zone that cannot be read fails alone. A failed zone is reported
//! in the aggregate error while the others still publish. Every error returned
//! from this module is soft: the caller retries at its next cycle.

use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::cache::RecordCache;
use crate::config::ReconcilerConfig;
use crate::error::{Error, Result};
use crate::executor::{ZoneExecutor, ZoneReport};
use crate::fetcher::RecordFetcher;
use crate::limiter::RateLimiter;
use crate::model::{Changes, Endpoint, Record};
use crate::partition::{ZoneIndex, partition_changes};
use crate::planner::group_by_name_and_type;
use crate::scope::TaskScope;
use crate::traits::{RecordStore, SerialQuery, ZoneFilter};
use crate::validator::StalenessValidator;

/// Summary of one successful `apply_changes` call
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ApplySummary {
    /// One report per zone that was applied and published
    pub zones: Vec<ZoneReport>,
    /// Endpoints owned by no managed zone, never attempted
    pub unassigned: Changes,
}

impl ApplySummary {
    pub fn total_changes(&self) -> usize {
        self.zones.iter().map(|z| z.counts.total()).sum()
    }
}

/// Zones and records seen by the last `records()` call
struct LastRun {
    zones: Vec<String>,
    records: HashMap<String, Vec<Record>>,
}

/// Reconciles desired endpoints against a remote record store
///
/// ## Lifecycle
///
/// 1. Create with [`Reconciler::new()`]
/// 2. Call [`Reconciler::records()`] to read the current state
/// 3. Call [`Reconciler::apply_changes()`] with the computed delta
///
/// The rate limiter and the cache live as long as the reconciler and are
/// shared by every call made through it.
pub struct Reconciler {
    store: Arc<dyn RecordStore>,
    limiter: Arc<RateLimiter>,
    cache: RecordCache,
    fetcher: RecordFetcher,
    executor: ZoneExecutor,
    zone_filter: Arc<dyn ZoneFilter>,
    last_run: Mutex<Option<LastRun>>,
}

impl Reconciler {
    /// Create a new reconciler
    ///
    /// # Parameters
    ///
    /// - `store`: Remote record store
    /// - `serial_query`: Side channel used to validate cached snapshots
    /// - `config`: Reconciler configuration
    ///
    /// Fails with [`Error::DryRunNotSupported`] when `config.dry_run` is set,
    /// before any remote call.
    pub fn new(
        store: Arc<dyn RecordStore>,
        serial_query: Arc<dyn SerialQuery>,
        config: ReconcilerConfig,
    ) -> Result<Self> {
        config.validate()?;

        let limiter = Arc::new(RateLimiter::new(config.api_rate_limit));
        let cache = RecordCache::new();
        let fetcher = RecordFetcher::new(
            Arc::clone(&store),
            Arc::clone(&limiter),
            cache.clone(),
            StalenessValidator::new(serial_query),
        )
        .with_cache(config.use_cache)
        .with_max_lifetime(config.cache_max_lifetime());
        let executor = ZoneExecutor::new(Arc::clone(&store), Arc::clone(&limiter), cache.clone());

        info!(
            "Reconciler for {} created (rate limit {}/s, cache {})",
            store.store_name(),
            config.api_rate_limit,
            if config.use_cache { "on" } else { "off" }
        );

        Ok(Self {
            store,
            limiter,
            cache,
            fetcher,
            executor,
            zone_filter: Arc::new(config.zone_filter()),
            last_run: Mutex::new(None),
        })
    }

    /// Replace the zone filter built from the configuration
    pub fn with_zone_filter(mut self, filter: Arc<dyn ZoneFilter>) -> Self {
        self.zone_filter = filter;
        self
    }

    pub fn cache(&self) -> &RecordCache {
        &self.cache
    }

    pub fn limiter(&self) -> &RateLimiter {
        &self.limiter
    }

    /// Managed zones of the store
    pub async fn zones(&self, cancel: &CancellationToken) -> Result<Vec<String>> {
        let listed = self
            .limiter
            .call(cancel, self.store.list_zones())
            .await
            .map_err(Error::soft)?;

        let zones: Vec<String> = listed
            .into_iter()
            .filter(|zone| self.zone_filter.matches(zone))
            .collect();

        info!("{}: {} zones found", self.store.store_name(), zones.len());
        Ok(zones)
    }

    /// Current records of one zone
    pub async fn fetch_zone(&self, zone: &str, cancel: &CancellationToken) -> Result<Vec<Record>> {
        self.fetcher
            .fetch(zone, cancel)
            .await
            .map_err(|e| Error::soft(Error::zone(zone, e)))
    }

    /// Current state of every managed zone, grouped into endpoints
    ///
    /// The zones and records read here are reused by the next
    /// `apply_changes` call.
    pub async fn records(&self, cancel: &CancellationToken) -> Result<Vec<Endpoint>> {
        let zones = self.zones(cancel).await?;
        let records = self.zones_records(&zones, cancel).await?;

        let flat: Vec<Record> = zones
            .iter()
            .filter_map(|zone| records.get(zone))
            .flatten()
            .cloned()
            .collect();
        let endpoints = group_by_name_and_type(&flat);

        *self.last_run.lock().await = Some(LastRun { zones, records });

        info!("{}: {} endpoints found", self.store.store_name(), endpoints.len());
        Ok(endpoints)
    }

    /// Fetch every zone concurrently; one failed zone fails the call once
    /// all fetches have ended
    async fn zones_records(
        &self,
        zones: &[String],
        cancel: &CancellationToken,
    ) -> Result<HashMap<String, Vec<Record>>> {
        let mut scope = TaskScope::new(cancel);
        for zone in zones {
            let fetcher = self.fetcher.clone();
            let token = scope.token();
            let zone = zone.clone();
            scope.spawn(async move {
                match fetcher.fetch(&zone, &token).await {
                    Ok(records) => Ok((zone, records)),
                    Err(e) => Err(Error::zone(zone, e)),
                }
            });
        }

        let fetched = scope.join().await.map_err(Error::soft)?;
        Ok(fetched.into_iter().collect())
    }

    /// Apply a desired-state delta, zone by zone
    ///
    /// Zones are applied concurrently and independently. When any zone
    /// fails, the others are still applied and published and the call
    /// returns a soft [`Error::ZonesFailed`] naming every failed zone.
    pub async fn apply_changes(&self, changes: &Changes, cancel: &CancellationToken) -> Result<ApplySummary> {
        if changes.is_empty() {
            debug!("No changes to apply");
            return Ok(ApplySummary::default());
        }

        for (kind, endpoint) in changes.iter_tagged() {
            debug!(
                "{}: {} {} {} targets={:?}",
                kind, endpoint.dns_name, endpoint.record_type, endpoint.ttl.0, endpoint.targets
            );
        }

        // zones read by the last records() call; a zone it read keeps its records
        let last_run = self.last_run.lock().await.take();
        let (zones, mut remembered) = match last_run {
            Some(LastRun { zones, records }) => (zones, records),
            None => (self.zones(cancel).await?, HashMap::new()),
        };

        let index = ZoneIndex::new(zones);
        let partition = partition_changes(&index, changes);

        let mut launched = Vec::with_capacity(partition.zones.len());
        let mut scope = TaskScope::new(cancel);
        for (zone, zone_changes) in partition.zones {
            let existing = remembered.remove(&zone);
            let fetcher = self.fetcher.clone();
            let executor = self.executor.clone();
            let token = scope.token();
            launched.push(zone.clone());
            scope.spawn(async move {
                let existing = match existing {
                    Some(records) => records,
                    None => match fetcher.fetch(&zone, &token).await {
                        Ok(records) => records,
                        Err(e) => return Err(Error::zone(zone, e)),
                    },
                };
                executor.apply_zone(zone, existing, zone_changes, token).await
            });
        }

        let mut summary = ApplySummary {
            zones: Vec::new(),
            unassigned: partition.unassigned,
        };
        let mut first_error = None;
        for result in scope.join_all().await {
            match result {
                Ok(report) => summary.zones.push(report),
                Err(e) if first_error.is_none() => first_error = Some(e),
                Err(_) => {}
            }
        }

        match first_error {
            None => {
                summary.zones.sort_by(|a, b| a.zone.cmp(&b.zone));
                info!(
                    "{}: {} changes applied over {} zones",
                    self.store.store_name(),
                    summary.total_changes(),
                    summary.zones.len()
                );
                Ok(summary)
            }
            Some(first) => {
                let failed: Vec<String> = launched
                    .into_iter()
                    .filter(|zone| !summary.zones.iter().any(|r| &r.zone == zone))
                    .collect();
                Err(Error::soft(Error::ZonesFailed {
                    zones: failed,
                    first: Box::new(first),
                }))
            }
        }
    }
}
