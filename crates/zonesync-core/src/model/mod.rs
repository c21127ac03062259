// # Data Model
//
// Records as the store holds them, endpoints as the caller desires them, and
// the typed changes that move one toward the other.

pub mod change;
pub mod endpoint;
pub mod record;

pub use change::{Change, ChangeAction, ChangeCounts};
pub use endpoint::{Changes, Endpoint, Ttl};
pub use record::{DEFAULT_TTL, Record, RecordFields, RecordType, RecordUpdate, subdomain_of};

/// SOA data returned by the store for a zone
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ZoneSoa {
    /// Authoritative name server, possibly with a trailing dot
    pub server: String,
    pub serial: u32,
}

/// Cached view of a zone, valid while its serial is current
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SoaSnapshot {
    pub server: String,
    pub serial: u32,
    pub records: Vec<Record>,
}

impl SoaSnapshot {
    pub fn new(soa: ZoneSoa, records: Vec<Record>) -> Self {
        Self {
            server: soa.server,
            serial: soa.serial,
            records,
        }
    }
}
