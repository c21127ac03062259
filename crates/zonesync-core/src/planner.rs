//! Change planning for one zone
//!
//! Turns a desired-state delta and the zone's current records into the list
//! of store mutations to perform.
//!
//! ## Matching
//!
//! Existing records are matched from a working pool and consumed on match,
//! so no two changes ever act on the same stored record. When several stored
//! records carry identical `(subdomain, type, target)` values, the first one
//! in pool order wins. Pool order is the order the store listed the records
//! in; two fetches that list them differently may pick different physical
//! records. Zone and subdomain names match regardless of ASCII case.
//!
//! ## Update path
//!
//! For each `(type, subdomain)` group present in both the old and new
//! endpoint sets, with M stored records and N desired targets none of which
//! already match: min(M, N) records are rewritten in place (keeping their id),
//! max(N - M, 0) are created, and max(M - N, 0) are deleted.

use std::collections::{BTreeMap, HashMap, HashSet};

use tracing::{debug, warn};

use crate::model::{Change, Changes, DEFAULT_TTL, Endpoint, Record, RecordType, subdomain_of};

type GroupKey = (RecordType, String);

/// Plan every change of `changes` against the records of `zone`
///
/// Creates are planned first, then deletes (which consume matched records),
/// then updates against what the deletes left.
pub fn plan_zone(zone: &str, existing: &[Record], changes: &Changes) -> Vec<Change> {
    let mut pool: Vec<Record> = existing
        .iter()
        .filter(|r| r.zone.eq_ignore_ascii_case(zone))
        .cloned()
        .collect();

    let mut planned = plan_creates(zone, &changes.create);
    planned.extend(plan_deletes(zone, &changes.delete, &mut pool));
    planned.extend(plan_updates(zone, &changes.update_old, &changes.update_new, &pool));
    planned
}

/// One Create per target; creates never reference a stored record
pub fn plan_creates(zone: &str, endpoints: &[Endpoint]) -> Vec<Change> {
    endpoints
        .iter()
        .flat_map(|endpoint| {
            let sub_domain = subdomain_of(&endpoint.dns_name, zone);
            let ttl = endpoint.ttl.or(DEFAULT_TTL);
            endpoint.targets.iter().map(move |target| {
                Change::create(Record::new(
                    zone,
                    sub_domain.clone(),
                    endpoint.record_type.clone(),
                    target.clone(),
                    ttl,
                ))
            })
        })
        .collect()
}

/// One Delete per target, each consuming its matched record from `pool`
///
/// A target with no stored match yields a Delete with id 0, which fails
/// when executed.
pub fn plan_deletes(zone: &str, endpoints: &[Endpoint], pool: &mut Vec<Record>) -> Vec<Change> {
    let mut changes = Vec::new();

    for endpoint in endpoints {
        let sub_domain = subdomain_of(&endpoint.dns_name, zone);
        let ttl = endpoint.ttl.or(DEFAULT_TTL);

        for target in &endpoint.targets {
            let wanted = Record::new(
                zone,
                sub_domain.clone(),
                endpoint.record_type.clone(),
                target.clone(),
                ttl,
            );
            let change = match pool.iter().position(|r| r.same_value(&wanted)) {
                Some(index) => Change::delete(pool.remove(index)),
                None => {
                    warn!("No stored record to delete for {} {} {}", endpoint.dns_name, endpoint.record_type, target);
                    Change::delete(wanted)
                }
            };
            changes.push(change);
        }
    }

    changes
}

/// Rewrite records in place for every group present in both `old` and `new`
pub fn plan_updates(zone: &str, old: &[Endpoint], new: &[Endpoint], existing: &[Record]) -> Vec<Change> {
    let key = |endpoint: &Endpoint| -> GroupKey {
        let sub_domain = subdomain_of(&endpoint.dns_name, zone).to_ascii_lowercase();
        (endpoint.record_type.clone(), sub_domain)
    };

    let desired: HashMap<GroupKey, &Endpoint> = new.iter().map(|e| (key(e), e)).collect();
    let mut seen: HashSet<GroupKey> = HashSet::new();
    let mut changes = Vec::new();

    for endpoint in old {
        let group = key(endpoint);
        if !seen.insert(group.clone()) {
            continue;
        }

        let Some(target_state) = desired.get(&group) else {
            warn!("Update of {} {} has no new state, skipping", endpoint.dns_name, endpoint.record_type);
            continue;
        };

        let candidates: Vec<Record> = existing
            .iter()
            .filter(|r| {
                r.zone.eq_ignore_ascii_case(zone)
                    && r.field_type == group.0
                    && r.sub_domain.eq_ignore_ascii_case(&group.1)
            })
            .cloned()
            .collect();

        let sub_domain = subdomain_of(&target_state.dns_name, zone);
        changes.extend(reconcile_group(zone, &sub_domain, target_state, candidates));
    }

    for endpoint in new {
        if !seen.contains(&key(endpoint)) {
            warn!("Update of {} {} has no old state, skipping", endpoint.dns_name, endpoint.record_type);
        }
    }

    changes
}

/// Diff one `(type, subdomain)` group against its desired targets
fn reconcile_group(zone: &str, sub_domain: &str, desired: &Endpoint, mut candidates: Vec<Record>) -> Vec<Change> {
    let ttl = desired.ttl.or(DEFAULT_TTL);

    let mut to_insert: Vec<&String> = Vec::new();
    for target in &desired.targets {
        match candidates.iter().position(|r| &r.target == target) {
            Some(index) => {
                candidates.remove(index);
            }
            None => to_insert.push(target),
        }
    }

    let paired = to_insert.len().min(candidates.len());
    let extra_targets = to_insert.split_off(paired);
    let extra_records = candidates.split_off(paired);

    debug!(
        "{}: {} {} -> {} update(s), {} create(s), {} delete(s)",
        zone,
        desired.dns_name,
        desired.record_type,
        paired,
        extra_targets.len(),
        extra_records.len()
    );

    let mut changes = Vec::with_capacity(paired + extra_targets.len() + extra_records.len());

    for (mut record, target) in candidates.into_iter().zip(to_insert) {
        record.target = target.clone();
        record.ttl = ttl;
        changes.push(Change::update(record));
    }

    for target in extra_targets {
        changes.push(Change::create(Record::new(
            zone,
            sub_domain,
            desired.record_type.clone(),
            target.clone(),
            ttl,
        )));
    }

    changes.extend(extra_records.into_iter().map(Change::delete));
    changes
}

/// Group records into one endpoint per `(zone, subdomain, type)`
///
/// Each endpoint carries every member's target and the ttl of the first
/// member.
pub fn group_by_name_and_type(records: &[Record]) -> Vec<Endpoint> {
    let mut groups: BTreeMap<(&str, &str, &RecordType), Vec<&Record>> = BTreeMap::new();
    for record in records {
        groups
            .entry((record.zone.as_str(), record.sub_domain.as_str(), &record.field_type))
            .or_default()
            .push(record);
    }

    groups
        .into_values()
        .map(|members| {
            let first = members[0];
            Endpoint::new(
                first.dns_name(),
                first.field_type.clone(),
                members.iter().map(|r| r.target.clone()),
            )
            .with_ttl(first.ttl)
        })
        .collect()
}
