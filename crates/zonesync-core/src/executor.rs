//! Rate-limited change execution for one zone
//!
//! Every planned change runs as its own task and takes one limiter token
//! before touching the store. The zone is published only once every change
//! has succeeded; any failure leaves whatever already applied in place and
//! skips publishing. The zone's cached snapshot is dropped either way.

use std::sync::Arc;

use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::cache::RecordCache;
use crate::error::{Error, Result};
use crate::limiter::RateLimiter;
use crate::model::{Change, ChangeAction, ChangeCounts, Changes, Record};
use crate::planner::plan_zone;
use crate::scope::TaskScope;
use crate::traits::RecordStore;

/// Outcome of a successful zone apply
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ZoneReport {
    pub zone: String,
    pub counts: ChangeCounts,
}

/// Applies planned changes to one zone at a time
#[derive(Clone)]
pub struct ZoneExecutor {
    store: Arc<dyn RecordStore>,
    limiter: Arc<RateLimiter>,
    cache: RecordCache,
}

impl ZoneExecutor {
    pub fn new(store: Arc<dyn RecordStore>, limiter: Arc<RateLimiter>, cache: RecordCache) -> Self {
        Self {
            store,
            limiter,
            cache,
        }
    }

    /// Plan `changes` against `existing`, run every change, then publish
    ///
    /// Errors come back wrapped as [`Error::Zone`].
    pub async fn apply_zone(
        &self,
        zone: String,
        existing: Vec<Record>,
        changes: Changes,
        cancel: CancellationToken,
    ) -> Result<ZoneReport> {
        let planned = plan_zone(&zone, &existing, &changes);
        let counts = ChangeCounts::of(&planned);
        info!("{}: {} changes will be done", zone, planned.len());

        let mut scope = TaskScope::new(&cancel);
        for change in planned {
            let executor = self.clone();
            let token = scope.token();
            scope.spawn(async move { executor.execute(change, &token).await });
        }

        if let Err(e) = scope.join().await {
            self.cache.invalidate(&zone).await;
            error!("{}: apply failed, zone not published: {}", zone, e);
            return Err(Error::zone(zone, e));
        }

        self.cache.invalidate(&zone).await;
        if let Err(e) = self.publish(&zone, &cancel).await {
            error!("{}: publish failed: {}", zone, e);
            return Err(Error::zone(zone, e));
        }

        Ok(ZoneReport { zone, counts })
    }

    /// Ask the store to regenerate the zone
    async fn publish(&self, zone: &str, cancel: &CancellationToken) -> Result<()> {
        debug!("Refreshing zone {}", zone);
        self.limiter.call(cancel, self.store.refresh_zone(zone)).await
    }

    async fn execute(&self, change: Change, cancel: &CancellationToken) -> Result<()> {
        if !change.is_matched() {
            return Err(Error::RecordToMutateNotFound(change.to_string()));
        }

        let zone = change.record.zone.as_str();
        let id = change.record.id;
        match change.action {
            ChangeAction::Create => {
                let fields = change.record.fields();
                debug!("Create {}", change);
                self.limiter.call(cancel, self.store.create_record(zone, &fields)).await
            }
            ChangeAction::Update => {
                let update = change.record.update_fields();
                debug!("Update {}", change);
                self.limiter
                    .call(cancel, self.store.update_record(zone, id, &update))
                    .await
            }
            ChangeAction::Delete => {
                debug!("Delete {}", change);
                self.limiter.call(cancel, self.store.delete_record(zone, id)).await
            }
        }
    }
}
