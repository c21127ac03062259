//! Configuration types for the reconciler
//!
//! This module defines the configuration consumed by [`crate::Reconciler`].

use serde::{Deserialize, Serialize};

use crate::traits::DomainFilter;

/// Reconciler configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconcilerConfig {
    /// Maximum number of store API calls per second
    ///
    /// Shared by every zone and every call kind of one reconciler.
    #[serde(default = "default_api_rate_limit")]
    pub api_rate_limit: u32,

    /// Keep zone snapshots between cycles, validated by SOA serial
    ///
    /// When disabled, every cycle lists and fetches every record of every
    /// zone, which may run into the store's own API quotas.
    #[serde(default = "default_use_cache")]
    pub use_cache: bool,

    /// Upper bound on how long a snapshot may be kept (in seconds)
    ///
    /// This only caps memory and staleness; validity is decided by the
    /// serial check.
    #[serde(default = "default_cache_max_lifetime_secs")]
    pub cache_max_lifetime_secs: u64,

    /// Speculative execution; not supported, must stay false
    #[serde(default)]
    pub dry_run: bool,

    /// Zone suffixes to manage; empty manages every zone
    #[serde(default)]
    pub domain_filter: Vec<String>,
}

impl ReconcilerConfig {
    /// Create a new configuration with defaults
    pub fn new() -> Self {
        Self {
            api_rate_limit: default_api_rate_limit(),
            use_cache: default_use_cache(),
            cache_max_lifetime_secs: default_cache_max_lifetime_secs(),
            dry_run: false,
            domain_filter: Vec::new(),
        }
    }

    /// Parse a configuration from JSON, applying defaults for missing fields
    pub fn from_json(json: &str) -> Result<Self, crate::Error> {
        Ok(serde_json::from_str(json)?)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.dry_run {
            return Err(crate::Error::DryRunNotSupported);
        }
        if self.api_rate_limit == 0 {
            return Err(crate::Error::config("api_rate_limit must be > 0"));
        }
        if self.cache_max_lifetime_secs == 0 {
            return Err(crate::Error::config("cache_max_lifetime_secs must be > 0"));
        }
        if self.domain_filter.iter().any(|d| d.trim().is_empty()) {
            return Err(crate::Error::config("domain_filter entries cannot be empty"));
        }
        Ok(())
    }

    /// Zone filter built from `domain_filter`
    pub fn zone_filter(&self) -> DomainFilter {
        DomainFilter::new(&self.domain_filter)
    }

    pub fn cache_max_lifetime(&self) -> chrono::Duration {
        i64::try_from(self.cache_max_lifetime_secs)
            .ok()
            .and_then(chrono::Duration::try_seconds)
            .unwrap_or(chrono::Duration::MAX)
    }
}

impl Default for ReconcilerConfig {
    fn default() -> Self {
        Self::new()
    }
}

fn default_api_rate_limit() -> u32 {
    20
}

fn default_use_cache() -> bool {
    true
}

fn default_cache_max_lifetime_secs() -> u64 {
    3600
}
