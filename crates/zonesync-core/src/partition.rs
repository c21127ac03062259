// # Zone Partitioning
//
// Splits a global change request into one independent request per zone.
// Every endpoint goes to the longest zone name that is a dot-bounded suffix
// of its host name. Endpoints that match no zone are set aside so the caller
// can report them.

use std::collections::BTreeMap;

use tracing::warn;

use crate::model::{Changes, Endpoint};

/// Zone lookup by longest dot-bounded suffix
#[derive(Debug, Clone, Default)]
pub struct ZoneIndex {
    // normalized (lowercase, no trailing dot) -> zone name as listed
    zones: Vec<(String, String)>,
}

impl ZoneIndex {
    pub fn new<I, S>(zones: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut zones: Vec<(String, String)> = zones
            .into_iter()
            .map(Into::into)
            .map(|zone| (normalize(&zone), zone))
            .filter(|(normalized, _)| !normalized.is_empty())
            .collect();
        // longest first, so the first hit is the most specific zone
        zones.sort_by(|a, b| b.0.len().cmp(&a.0.len()).then_with(|| a.0.cmp(&b.0)));
        Self { zones }
    }

    /// Zone owning `dns_name`, if any
    pub fn find_zone(&self, dns_name: &str) -> Option<&str> {
        let name = normalize(dns_name);
        self.zones
            .iter()
            .find(|(zone, _)| {
                name == *zone
                    || (name.len() > zone.len()
                        && name.ends_with(zone.as_str())
                        && name.as_bytes()[name.len() - zone.len() - 1] == b'.')
            })
            .map(|(_, zone)| zone.as_str())
    }

    pub fn len(&self) -> usize {
        self.zones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.zones.is_empty()
    }
}

fn normalize(name: &str) -> String {
    name.trim_end_matches('.').to_ascii_lowercase()
}

/// A change request split by owning zone
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Partition {
    /// Changes per zone; zones that receive no endpoint are absent
    pub zones: BTreeMap<String, Changes>,
    /// Endpoints no managed zone owns, in their original lists
    pub unassigned: Changes,
}

/// Bucket `changes` by owning zone
pub fn partition_changes(index: &ZoneIndex, changes: &Changes) -> Partition {
    let mut partition = Partition::default();

    assign(index, &mut partition, &changes.create, |c| &mut c.create);
    assign(index, &mut partition, &changes.update_old, |c| &mut c.update_old);
    assign(index, &mut partition, &changes.update_new, |c| &mut c.update_new);
    assign(index, &mut partition, &changes.delete, |c| &mut c.delete);

    partition
}

fn assign(
    index: &ZoneIndex,
    partition: &mut Partition,
    endpoints: &[Endpoint],
    list: fn(&mut Changes) -> &mut Vec<Endpoint>,
) {
    for endpoint in endpoints {
        let changes = match index.find_zone(&endpoint.dns_name) {
            Some(zone) => partition.zones.entry(zone.to_string()).or_default(),
            None => {
                warn!("No managed zone found for {}, skipping", endpoint.dns_name);
                &mut partition.unassigned
            }
        };
        list(changes).push(endpoint.clone());
    }
}
