// # Serial Query Trait
//
// Side channel used to check whether a cached zone snapshot is still current.
// It asks the zone's authoritative server directly, over DNS, instead of
// going through the record store API.
//
// ## Implementations
//
// - UDP SOA query: `zonesync-soa-udp` crate
//
// Failures of this channel are never fatal: the reconciler treats any error
// as "snapshot unverified" and falls back to a full fetch.

use async_trait::async_trait;

/// Trait for authoritative SOA serial lookups
#[async_trait]
pub trait SerialQuery: Send + Sync {
    /// Current SOA serial of `zone` as served by `server`
    ///
    /// `server` is a host name or address, possibly with a trailing dot and
    /// without a port.
    async fn query_serial(&self, zone: &str, server: &str) -> Result<u32, crate::Error>;
}
