// # zonesync-core
//
// Core library for reconciling desired DNS endpoints against a remote,
// zone-based record store.
//
// ## Architecture Overview
//
// - **RecordStore**: Trait for the remote store (list, get, mutate, publish)
// - **SerialQuery**: Trait for the side-channel SOA serial lookup
// - **RecordCache**: Per-zone snapshots, trusted while their serial holds
// - **RecordFetcher**: Cache-first zone reads, concurrent fetch-by-id on miss
// - **Planner**: Desired-vs-current diff into Create/Update/Delete changes
// - **ZoneExecutor**: Rate-limited concurrent apply, then zone publish
// - **Reconciler**: Partitions a change request by zone and drives the rest
//
// ## Design Principles
//
// 1. **Zone Isolation**: A zone succeeds or fails as a unit; siblings never notice
// 2. **Soft Errors**: Every remote failure is retryable at the next cycle
// 3. **Injected Resources**: The limiter and cache belong to one reconciler
// 4. **Structured Concurrency**: Every spawned task is joined by its scope

pub mod cache;
pub mod config;
pub mod error;
pub mod executor;
pub mod fetcher;
pub mod limiter;
pub mod model;
pub mod partition;
pub mod planner;
pub mod reconciler;
pub mod traits;
pub mod validator;

mod scope;

// Re-export core types for convenience
pub use cache::RecordCache;
pub use config::ReconcilerConfig;
pub use error::{Error, Result};
pub use executor::{ZoneExecutor, ZoneReport};
pub use fetcher::RecordFetcher;
pub use limiter::RateLimiter;
pub use model::{Change, ChangeAction, Changes, Endpoint, Record, RecordType, ZoneSoa};
pub use reconciler::{ApplySummary, Reconciler};
pub use traits::{DomainFilter, RecordStore, SerialQuery, ZoneFilter};
pub use validator::{StalenessValidator, Validation};
