//! Collaborator traits for zone reconciliation
//!
//! This module defines the narrow interfaces the reconciler depends on.
//!
//! - [`RecordStore`]: Remote record store (list, get, mutate, publish)
//! - [`SerialQuery`]: Side-channel SOA serial lookup
//! - [`ZoneFilter`]: Which zones are managed

pub mod record_store;
pub mod serial_query;
pub mod zone_filter;

pub use record_store::RecordStore;
pub use serial_query::SerialQuery;
pub use zone_filter::{DomainFilter, ZoneFilter};
