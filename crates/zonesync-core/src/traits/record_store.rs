// # Record Store Trait
//
// Defines the narrow interface to the remote authoritative record store.
//
// ## Implementations
//
// Transport and authentication live entirely in the implementation. The
// reconciler only needs the eight calls below, and every call is independent
// and fallible.
//
// ## Usage
//
// ```rust,ignore
// use zonesync_core::RecordStore;
//
// async fn dump(store: &dyn RecordStore) -> zonesync_core::Result<()> {
//     for zone in store.list_zones().await? {
//         for id in store.list_record_ids(&zone).await? {
//             let record = store.get_record(&zone, id).await?;
//             println!("{}", record.dns_name());
//         }
//     }
//     Ok(())
// }
// ```

use async_trait::async_trait;

use crate::model::{Record, RecordFields, RecordUpdate, ZoneSoa};

/// Trait for remote record store implementations
///
/// # Thread Safety
///
/// Implementations must be thread-safe: the reconciler issues calls for many
/// zones and many records concurrently from spawned tasks.
///
/// # Rate Limiting
///
/// Implementations must not throttle on their own. The reconciler owns a
/// single limiter and takes one token before every call.
///
/// # Retries
///
/// Implementations must not retry. A failed call is reported and the whole
/// reconciliation is retried at the caller's next cycle.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// List every zone the account can manage
    async fn list_zones(&self) -> Result<Vec<String>, crate::Error>;

    /// List the ids of every record in `zone`
    async fn list_record_ids(&self, zone: &str) -> Result<Vec<u64>, crate::Error>;

    /// Fetch one record by id
    async fn get_record(&self, zone: &str, id: u64) -> Result<Record, crate::Error>;

    /// Insert a new record
    async fn create_record(&self, zone: &str, fields: &RecordFields) -> Result<(), crate::Error>;

    /// Replace subdomain, ttl and target of an existing record
    async fn update_record(
        &self,
        zone: &str,
        id: u64,
        update: &RecordUpdate,
    ) -> Result<(), crate::Error>;

    /// Remove a record by id
    async fn delete_record(&self, zone: &str, id: u64) -> Result<(), crate::Error>;

    /// Authoritative server and current serial of `zone`
    async fn get_soa(&self, zone: &str) -> Result<ZoneSoa, crate::Error>;

    /// Ask the store to regenerate (publish) `zone` after mutations
    async fn refresh_zone(&self, zone: &str) -> Result<(), crate::Error>;

    /// Store name (for logging/debugging)
    fn store_name(&self) -> &'static str;
}
