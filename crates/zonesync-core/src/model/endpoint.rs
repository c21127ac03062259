// # Endpoints
//
// Desired-state units handed over by the caller. One endpoint aggregates all
// targets that share a host name and record type.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::record::RecordType;

/// Record TTL in seconds; zero means "not configured"
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Ttl(pub u32);

impl Ttl {
    pub fn is_configured(self) -> bool {
        self.0 > 0
    }

    /// Configured value, or `default` when unset
    pub fn or(self, default: u32) -> u32 {
        if self.is_configured() { self.0 } else { default }
    }
}

/// Desired DNS state for one name and type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoint {
    /// Fully qualified name, trailing dot optional
    pub dns_name: String,
    pub record_type: RecordType,
    #[serde(default)]
    pub ttl: Ttl,
    pub targets: Vec<String>,
    /// Identifying metadata (owner, originating resource, ...)
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
}

impl Endpoint {
    pub fn new<I, S>(dns_name: impl Into<String>, record_type: RecordType, targets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            dns_name: dns_name.into(),
            record_type,
            ttl: Ttl::default(),
            targets: targets.into_iter().map(Into::into).collect(),
            labels: BTreeMap::new(),
        }
    }

    pub fn with_ttl(mut self, ttl: u32) -> Self {
        self.ttl = Ttl(ttl);
        self
    }

    pub fn with_label(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.labels.insert(key.into(), value.into());
        self
    }
}

/// Desired-state delta for one reconciliation
///
/// `update_old[i]` and `update_new[j]` are paired by name and type, not by
/// position.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Changes {
    #[serde(default)]
    pub create: Vec<Endpoint>,
    #[serde(default)]
    pub update_old: Vec<Endpoint>,
    #[serde(default)]
    pub update_new: Vec<Endpoint>,
    #[serde(default)]
    pub delete: Vec<Endpoint>,
}

impl Changes {
    pub fn is_empty(&self) -> bool {
        self.create.is_empty()
            && self.update_old.is_empty()
            && self.update_new.is_empty()
            && self.delete.is_empty()
    }

    /// Iterate every endpoint with a label naming the list it came from
    pub fn iter_tagged(&self) -> impl Iterator<Item = (&'static str, &Endpoint)> {
        self.create
            .iter()
            .map(|e| ("CREATE", e))
            .chain(self.update_old.iter().map(|e| ("UPDATEOLD", e)))
            .chain(self.update_new.iter().map(|e| ("UPDATENEW", e)))
            .chain(self.delete.iter().map(|e| ("DELETE", e)))
    }
}
